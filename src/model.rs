//! In-memory workbook model
//!
//! The caller authors a [`Workbook`] (sheets, tables, drawings, media) and
//! hands it to the package writer. Identifier and target bookkeeping (sheet
//! ids, table ids/targets, relationship ids) is filled in by model
//! preparation; fields documented as "assigned at preparation" should be left
//! at their defaults.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::rels::Relationships;
use crate::xml::escape;

/// Root aggregate for one spreadsheet package
#[derive(Debug, Default)]
pub struct Workbook {
    /// Document creator, defaults to the program name when absent
    pub creator: Option<String>,
    /// Last-modified-by, defaults to the program name when absent
    pub last_modified_by: Option<String>,
    /// Creation timestamp, defaults to now when absent
    pub created: Option<DateTime<Utc>>,
    /// Modification timestamp, defaults to now when absent
    pub modified: Option<DateTime<Utc>>,
    /// Use the 1904 date system
    pub date1904: bool,
    pub worksheets: Vec<Worksheet>,
    pub media: Vec<MediaItem>,
    /// Theme name to theme XML; empty map gets the built-in `theme1`
    pub themes: BTreeMap<String, String>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a worksheet and return a handle to fill it in
    pub fn add_worksheet(&mut self, name: impl Into<String>) -> &mut Worksheet {
        self.worksheets.push(Worksheet::new(name));
        self.worksheets.last_mut().unwrap()
    }

    /// Register a media item, returning its index for drawings to reference
    pub fn add_media(&mut self, media: MediaItem) -> usize {
        self.media.push(media);
        self.media.len() - 1
    }
}

/// One sheet in the workbook
#[derive(Debug, Default)]
pub struct Worksheet {
    /// Stable numeric id; 0 means "assign at preparation"
    pub id: u32,
    pub name: String,
    /// Workbook-scope relationship id, assigned at preparation
    pub rel_id: String,
    /// This sheet's own relationship list (tables, drawings, comments)
    pub rels: Relationships,
    pub tables: Vec<Table>,
    pub drawings: Vec<Drawing>,
    pub comments: Vec<Comment>,
    /// Sheet-scope rel id of the comments part, assigned at preparation
    pub comments_rel_id: Option<String>,
    /// Sheet-scope rel id of the legacy VML notes part, assigned at preparation
    pub vml_rel_id: Option<String>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn add_table(&mut self, table: Table) -> &mut Table {
        self.tables.push(table);
        self.tables.last_mut().unwrap()
    }

    pub fn add_drawing(&mut self, drawing: Drawing) -> &mut Drawing {
        self.drawings.push(drawing);
        self.drawings.last_mut().unwrap()
    }

    pub fn add_comment(&mut self, cell: impl Into<String>, author: impl Into<String>, text: impl Into<String>) {
        self.comments.push(Comment {
            cell: cell.into(),
            author: author.into(),
            text: text.into(),
        });
    }
}

/// A worksheet table, numbered globally across the whole document
#[derive(Debug, Default)]
pub struct Table {
    pub name: String,
    pub display_name: String,
    /// Cell range reference, e.g. `A1:C4`
    pub range: String,
    pub columns: Vec<String>,
    pub header_row: bool,
    pub totals_row: bool,
    pub style: Option<String>,
    /// Globally unique sequential id, assigned at preparation
    pub id: u32,
    /// File target `table{N}.xml`, assigned at preparation
    pub target: String,
    /// Sheet-scope relationship id, assigned at preparation
    pub rel_id: String,
}

impl Table {
    pub fn new(name: impl Into<String>, range: impl Into<String>, columns: Vec<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            range: range.into(),
            columns,
            header_row: true,
            ..Self::default()
        }
    }
}

/// A drawing part anchored on a worksheet, with its own relationship list
/// pointing at media
#[derive(Debug, Default)]
pub struct Drawing {
    /// Part name `drawing{N}`, assigned at preparation
    pub name: String,
    pub pictures: Vec<Picture>,
    pub rels: Relationships,
    /// Sheet-scope relationship id, assigned at preparation
    pub rel_id: String,
}

impl Drawing {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_picture(&mut self, media_index: usize, from: Anchor, to: Anchor) {
        self.pictures.push(Picture {
            media_index,
            from,
            to,
            rel_id: String::new(),
        });
    }
}

/// One anchored picture inside a drawing
#[derive(Debug)]
pub struct Picture {
    /// Index into the workbook's media list
    pub media_index: usize,
    pub from: Anchor,
    pub to: Anchor,
    /// Drawing-scope relationship id, assigned at preparation
    pub rel_id: String,
}

/// Zero-based cell anchor
#[derive(Debug, Clone, Copy, Default)]
pub struct Anchor {
    pub col: u32,
    pub row: u32,
}

impl Anchor {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// A cell note
#[derive(Debug)]
pub struct Comment {
    /// Cell reference, e.g. `B2`
    pub cell: String,
    pub author: String,
    pub text: String,
}

/// An image resource, sourced from exactly one of: file path, byte buffer,
/// or base64 string. Anything else fails the write with `UnsupportedMedia`.
#[derive(Debug, Default)]
pub struct MediaItem {
    pub name: String,
    pub extension: String,
    pub filename: Option<PathBuf>,
    pub buffer: Option<Vec<u8>>,
    pub base64: Option<String>,
}

impl MediaItem {
    pub fn from_file(name: impl Into<String>, extension: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            filename: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn from_buffer(name: impl Into<String>, extension: impl Into<String>, buffer: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            buffer: Some(buffer),
            ..Self::default()
        }
    }

    /// From a base64 string; a `data:...;base64,` prefix is tolerated and
    /// stripped at resolution time
    pub fn from_base64(name: impl Into<String>, extension: impl Into<String>, base64: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: extension.into(),
            base64: Some(base64.into()),
            ..Self::default()
        }
    }

    /// In-archive entry name for this item
    pub fn target(&self) -> String {
        format!("xl/media/{}.{}", self.name, self.extension)
    }
}

/// Interned strings shared across worksheets, populated during worksheet
/// preparation. `count` tracks total references, `unique` the distinct set.
#[derive(Debug, Default)]
pub struct SharedStringTable {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    total: usize,
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a string, returning its stable index
    pub fn add(&mut self, s: &str) -> usize {
        self.total += 1;
        if let Some(&i) = self.index.get(s) {
            return i;
        }
        let i = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), i);
        i
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn unique_count(&self) -> usize {
        self.strings.len()
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(128 + self.strings.iter().map(|s| s.len() + 16).sum::<usize>());
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(
            r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.total,
            self.strings.len()
        ));
        for s in &self.strings {
            xml.push_str("<si><t>");
            xml.push_str(&escape(s));
            xml.push_str("</t></si>");
        }
        xml.push_str("</sst>");
        xml
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_strings_intern() {
        let mut sst = SharedStringTable::new();
        assert_eq!(sst.add("alpha"), 0);
        assert_eq!(sst.add("beta"), 1);
        assert_eq!(sst.add("alpha"), 0);
        assert_eq!(sst.unique_count(), 2);

        let xml = sst.to_xml();
        assert!(xml.contains(r#"count="3" uniqueCount="2""#));
        assert!(xml.contains("<si><t>alpha</t></si>"));
    }

    #[test]
    fn media_target_name() {
        let m = MediaItem::from_buffer("logo", "png", vec![1, 2, 3]);
        assert_eq!(m.target(), "xl/media/logo.png");
    }
}
