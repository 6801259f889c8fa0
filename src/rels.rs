//! Relationship lists and the `.rels` part format
//!
//! Every part that refers to other parts (the package root, the workbook,
//! each worksheet, each drawing) owns one [`Relationships`] list. Ids are
//! `rId1`, `rId2`, ... contiguous within that list and independent of every
//! other list's counter, which is exactly the scope rule the package format
//! requires.

use crate::xml::escape;

/// Relationship type URIs used by spreadsheet packages
pub mod rel_type {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const CORE_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
    pub const EXTENDED_PROPERTIES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const THEME: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const TABLE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/table";
    pub const DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/drawing";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const COMMENTS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/comments";
    pub const VML_DRAWING: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/vmlDrawing";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
}

/// A single relationship from a source part to a target
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    pub id: String,
    /// Relationship type URI
    pub rel_type: &'static str,
    /// Target reference, relative to the owning part's directory
    pub target: String,
    /// External targets (hyperlinks) carry `TargetMode="External"`
    pub external: bool,
}

/// Relationship list for one scope, with its own `rId` counter
#[derive(Debug, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an internal relationship and return its freshly allocated id
    pub fn add(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        self.push(rel_type, target, false)
    }

    /// Add an external relationship (e.g. a hyperlink URL)
    pub fn add_external(&mut self, rel_type: &'static str, target: impl Into<String>) -> String {
        self.push(rel_type, target, true)
    }

    fn push(&mut self, rel_type: &'static str, target: impl Into<String>, external: bool) -> String {
        let id = format!("rId{}", self.rels.len() + 1);
        self.rels.push(Relationship {
            id: id.clone(),
            rel_type,
            target: target.into(),
            external,
        });
        id
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    pub fn len(&self) -> usize {
        self.rels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to the `.rels` part format, entries in allocation order
    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.rels.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.rels {
            let target_mode = if rel.external {
                r#" TargetMode="External""#
            } else {
                ""
            };
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape(&rel.id),
                escape(rel.rel_type),
                escape(&rel.target),
                target_mode
            ));
        }
        xml.push_str("</Relationships>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_contiguous_per_scope() {
        let mut a = Relationships::new();
        let mut b = Relationships::new();

        assert_eq!(a.add(rel_type::STYLES, "styles.xml"), "rId1");
        assert_eq!(a.add(rel_type::THEME, "theme/theme1.xml"), "rId2");
        // Independent scope restarts at rId1
        assert_eq!(b.add(rel_type::IMAGE, "../media/image1.png"), "rId1");
        assert_eq!(a.add(rel_type::WORKSHEET, "worksheets/sheet1.xml"), "rId3");
    }

    #[test]
    fn rels_xml_shape() {
        let mut rels = Relationships::new();
        rels.add(rel_type::WORKSHEET, "worksheets/sheet1.xml");
        rels.add_external(rel_type::HYPERLINK, "https://example.com/?q=a&b");

        let xml = rels.to_xml();
        assert!(xml.contains(
            r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#
        ));
        assert!(xml.contains(r#"Target="https://example.com/?q=a&amp;b" TargetMode="External"/>"#));
    }
}
