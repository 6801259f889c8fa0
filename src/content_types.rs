//! Content-type registry and the `[Content_Types].xml` part
//!
//! A package is only recognized as a spreadsheet when every extension and
//! part present in the archive is declared here. The registry is computed
//! once from the prepared model before any part is appended, so the
//! declarations are exact: conditionally-omitted parts (styles under the
//! no-op manager, shared strings when the table stays empty) never get a
//! dangling override.

use std::collections::BTreeMap;

use crate::error::{Result, XlPackError};
use crate::xml::escape;

/// Content type strings for spreadsheet package parts
pub mod content_type {
    pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
    pub const XML: &str = "application/xml";
    pub const WORKBOOK: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
    pub const WORKSHEET: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
    pub const STYLES: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
    pub const SHARED_STRINGS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
    pub const TABLE: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.table+xml";
    pub const COMMENTS: &str =
        "application/vnd.openxmlformats-officedocument.spreadsheetml.comments+xml";
    pub const THEME: &str = "application/vnd.openxmlformats-officedocument.theme+xml";
    pub const DRAWING: &str = "application/vnd.openxmlformats-officedocument.drawing+xml";
    pub const VML_DRAWING: &str = "application/vnd.openxmlformats-officedocument.vmlDrawing";
    pub const CORE_PROPERTIES: &str =
        "application/vnd.openxmlformats-package.core-properties+xml";
    pub const EXTENDED_PROPERTIES: &str =
        "application/vnd.openxmlformats-officedocument.extended-properties+xml";
}

/// Content type for an image extension
pub fn image_content_type(extension: &str) -> String {
    match extension {
        "png" => "image/png".to_string(),
        "jpg" | "jpeg" => "image/jpeg".to_string(),
        "gif" => "image/gif".to_string(),
        "bmp" => "image/bmp".to_string(),
        "tif" | "tiff" => "image/tiff".to_string(),
        "emf" => "image/x-emf".to_string(),
        "wmf" => "image/x-wmf".to_string(),
        other => format!("image/{}", other),
    }
}

/// Declarations backing `[Content_Types].xml`
///
/// Extension defaults collapse on duplicate registration; a part override
/// registered twice is an assembler ordering defect and fails the write.
#[derive(Debug)]
pub struct ContentTypeRegistry {
    defaults: BTreeMap<String, String>,
    overrides: BTreeMap<String, String>,
}

impl ContentTypeRegistry {
    /// New registry pre-seeded with the `rels`/`xml` defaults every package
    /// carries
    pub fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), content_type::RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), content_type::XML.to_string());
        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    /// Declare a default content type for an extension; duplicates collapse
    pub fn default_for(&mut self, extension: impl Into<String>, content_type: impl Into<String>) {
        self.defaults.entry(extension.into()).or_insert_with(|| content_type.into());
    }

    /// Declare an override for one part path (leading slash added if missing)
    pub fn override_for(&mut self, part: impl Into<String>, content_type: impl Into<String>) -> Result<()> {
        let part = part.into();
        let part = if part.starts_with('/') {
            part
        } else {
            format!("/{}", part)
        };
        if self.overrides.contains_key(&part) {
            return Err(XlPackError::DuplicatePart(part));
        }
        self.overrides.insert(part, content_type.into());
        Ok(())
    }

    pub fn has_default(&self, extension: &str) -> bool {
        self.defaults.contains_key(extension)
    }

    /// Serialize to `[Content_Types].xml`: sorted defaults, then sorted
    /// overrides
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
        );
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape(ext),
                escape(ct)
            ));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape(part),
                escape(ct)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

impl Default for ContentTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
