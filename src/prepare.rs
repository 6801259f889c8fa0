//! Model preparation
//!
//! Turns a caller-supplied [`Workbook`] into a [`PreparedWorkbook`] ready for
//! assembly: fills defaults, resolves feature flags, selects the style
//! strategy, numbers sheets and tables, builds the workbook-scope
//! relationship list, and runs sheet-level preparation through the worksheet
//! renderer. Preparation is the only phase that mutates bookkeeping; the
//! assembler reads the prepared model and never writes it.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{MediaItem, SharedStringTable, Workbook, Worksheet};
use crate::rels::{rel_type, Relationships};
use crate::transform::Transformers;
use crate::xml;

/// Default creator / last-modified-by when the model leaves them unset.
/// Override per write via [`WriteOptions::program_name`].
pub const PROGRAM_NAME: &str = "xlpack";

/// Zip-encoding backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Collect raw entries, deflate everything in one pass at finalize
    #[default]
    Buffered,
    /// Deflate each entry as it is appended
    Streaming,
}

/// Options for one write invocation
#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    /// Emit a shared-strings part when the table is populated (default true)
    pub use_shared_strings: Option<bool>,
    /// Write a real style sheet (default true); false selects the no-op
    /// style manager and no `xl/styles.xml` entry is produced
    pub use_styles: Option<bool>,
    /// Overrides [`PROGRAM_NAME`] as the default creator
    pub program_name: Option<String>,
    pub backend: Backend,
}

impl WriteOptions {
    pub fn streaming() -> Self {
        Self {
            backend: Backend::Streaming,
            ..Self::default()
        }
    }
}

/// Style-handling strategy, fixed at preparation so no later step branches
/// on the styles flag
pub trait StyleManager: Send + Sync {
    /// Style sheet XML, or `None` when no styles part should be written
    fn render(&self) -> Option<String>;
}

/// Default manager; renders the built-in minimal style sheet
#[derive(Debug, Default)]
pub struct StylesPart;

impl StyleManager for StylesPart {
    fn render(&self) -> Option<String> {
        Some(xml::MINIMAL_STYLESHEET.to_string())
    }
}

/// No-op manager selected by `use_styles: false`; satisfies the same
/// contract but yields no part
#[derive(Debug, Default)]
pub struct NullStyles;

impl StyleManager for NullStyles {
    fn render(&self) -> Option<String> {
        None
    }
}

/// Shared context handed to worksheet-level preparation
pub struct SheetContext<'a> {
    pub styles: &'a dyn StyleManager,
    pub date1904: bool,
    /// Document-wide drawing counter backing `drawing{N}` names
    pub drawing_count: &'a mut u32,
    pub media: &'a [MediaItem],
    pub shared_strings: &'a mut SharedStringTable,
}

/// A workbook after preparation, ready for assembly
///
/// Distinct from [`Workbook`] so assembly code cannot accidentally depend on
/// unprepared fields.
pub struct PreparedWorkbook {
    pub creator: String,
    pub last_modified_by: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub date1904: bool,
    pub use_shared_strings: bool,
    pub worksheets: Vec<Worksheet>,
    pub media: Vec<MediaItem>,
    pub themes: BTreeMap<String, String>,
    pub styles: Box<dyn StyleManager>,
    /// Workbook-scope relationships: styles, theme, one per sheet, then the
    /// shared-strings entry when one is emitted
    pub workbook_rels: Relationships,
    pub shared_strings: SharedStringTable,
    /// Workbook-scope rel id of the shared-strings part, when emitted
    pub shared_strings_rel: Option<String>,
    /// Flattened non-owning `(sheet, table)` indices in global id order
    pub tables: Vec<(usize, usize)>,
    /// Flattened non-owning `(sheet, drawing)` indices
    pub drawings: Vec<(usize, usize)>,
}

impl PreparedWorkbook {
    /// Whether a styles part will be written for this model
    pub fn has_styles_part(&self) -> bool {
        self.styles.render().is_some()
    }
}

/// Run preparation once for a write invocation
pub(crate) fn prepare(
    workbook: Workbook,
    options: &WriteOptions,
    transformers: &Transformers,
) -> Result<PreparedWorkbook> {
    let program = options
        .program_name
        .clone()
        .unwrap_or_else(|| PROGRAM_NAME.to_string());
    let now = Utc::now();

    let use_shared_strings = options.use_shared_strings.unwrap_or(true);
    let use_styles = options.use_styles.unwrap_or(true);
    let styles: Box<dyn StyleManager> = if use_styles {
        Box::new(StylesPart)
    } else {
        Box::new(NullStyles)
    };

    let mut themes = workbook.themes;
    if themes.is_empty() {
        themes.insert("theme1".to_string(), xml::THEME1.to_string());
    }

    let mut worksheets = workbook.worksheets;
    assign_sheet_ids(&mut worksheets);

    // Global table numbering: sheet-major, one monotonically increasing
    // counter across the whole document
    let mut tables = Vec::new();
    let mut table_count = 0u32;
    for (s_idx, ws) in worksheets.iter_mut().enumerate() {
        for (t_idx, table) in ws.tables.iter_mut().enumerate() {
            table_count += 1;
            table.id = table_count;
            table.target = format!("table{}.xml", table_count);
            tables.push((s_idx, t_idx));
        }
    }

    // Workbook-scope relationships: styles and theme first, then one entry
    // per worksheet in declaration order. Each sheet's id is stored on the
    // sheet here, before assembly begins.
    let mut workbook_rels = Relationships::new();
    workbook_rels.add(rel_type::STYLES, "styles.xml");
    workbook_rels.add(rel_type::THEME, "theme/theme1.xml");
    for ws in worksheets.iter_mut() {
        ws.rel_id = workbook_rels.add(
            rel_type::WORKSHEET,
            format!("worksheets/sheet{}.xml", ws.id),
        );
    }

    // Sheet-level preparation through the worksheet renderer
    let mut shared_strings = SharedStringTable::new();
    let mut drawing_count = 0u32;
    for ws in worksheets.iter_mut() {
        let mut ctx = SheetContext {
            styles: styles.as_ref(),
            date1904: workbook.date1904,
            drawing_count: &mut drawing_count,
            media: &workbook.media,
            shared_strings: &mut shared_strings,
        };
        transformers.worksheet.prepare(ws, &mut ctx)?;
    }

    let mut drawings = Vec::new();
    for (s_idx, ws) in worksheets.iter().enumerate() {
        for d_idx in 0..ws.drawings.len() {
            drawings.push((s_idx, d_idx));
        }
    }

    // The shared-strings relationship comes after the worksheet entries so
    // the rId1..rId(N+2) prefix stays styles, theme, sheets
    let shared_strings_rel = if use_shared_strings && !shared_strings.is_empty() {
        Some(workbook_rels.add(rel_type::SHARED_STRINGS, "sharedStrings.xml"))
    } else {
        None
    };

    Ok(PreparedWorkbook {
        creator: workbook.creator.unwrap_or_else(|| program.clone()),
        last_modified_by: workbook.last_modified_by.unwrap_or(program),
        created: workbook.created.unwrap_or(now),
        modified: workbook.modified.unwrap_or(now),
        date1904: workbook.date1904,
        use_shared_strings,
        worksheets,
        media: workbook.media,
        themes,
        styles,
        workbook_rels,
        shared_strings,
        shared_strings_rel,
        tables,
        drawings,
    })
}

/// Sheets with id 0 get the next id above the highest explicit one
fn assign_sheet_ids(worksheets: &mut [Worksheet]) {
    let mut next = worksheets.iter().map(|ws| ws.id).max().unwrap_or(0) + 1;
    for ws in worksheets.iter_mut() {
        if ws.id == 0 {
            ws.id = next;
            next += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Table;

    fn prepare_default(workbook: Workbook) -> PreparedWorkbook {
        prepare(workbook, &WriteOptions::default(), &Transformers::default()).unwrap()
    }

    #[test]
    fn defaults_are_filled() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet("Sheet1");

        let prepared = prepare_default(workbook);
        assert_eq!(prepared.creator, PROGRAM_NAME);
        assert_eq!(prepared.last_modified_by, PROGRAM_NAME);
        assert!(prepared.has_styles_part());
        assert_eq!(prepared.themes.len(), 1);
        assert!(prepared.themes.contains_key("theme1"));
    }

    #[test]
    fn null_styles_yields_no_part() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet("Sheet1");

        let options = WriteOptions {
            use_styles: Some(false),
            ..WriteOptions::default()
        };
        let prepared = prepare(workbook, &options, &Transformers::default()).unwrap();
        assert!(!prepared.has_styles_part());
    }

    #[test]
    fn table_numbering_is_global_and_sheet_major() {
        let mut workbook = Workbook::new();
        {
            let ws = workbook.add_worksheet("A");
            ws.add_table(Table::new("t1", "A1:B2", vec!["x".into(), "y".into()]));
            ws.add_table(Table::new("t2", "D1:E2", vec!["x".into(), "y".into()]));
        }
        {
            let ws = workbook.add_worksheet("B");
            ws.add_table(Table::new("t3", "A1:B2", vec!["x".into(), "y".into()]));
        }

        let prepared = prepare_default(workbook);
        let targets: Vec<_> = prepared
            .tables
            .iter()
            .map(|&(s, t)| prepared.worksheets[s].tables[t].target.clone())
            .collect();
        assert_eq!(targets, vec!["table1.xml", "table2.xml", "table3.xml"]);
        assert_eq!(prepared.worksheets[1].tables[0].id, 3);
    }

    #[test]
    fn workbook_rels_order() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet("One");
        workbook.add_worksheet("Two");

        let prepared = prepare_default(workbook);
        let rels: Vec<_> = prepared.workbook_rels.iter().collect();
        assert_eq!(rels.len(), 4);
        assert_eq!(rels[0].target, "styles.xml");
        assert_eq!(rels[1].target, "theme/theme1.xml");
        assert_eq!(rels[2].id, "rId3");
        assert_eq!(rels[2].target, "worksheets/sheet1.xml");
        assert_eq!(prepared.worksheets[1].rel_id, "rId4");
    }

    #[test]
    fn explicit_sheet_ids_are_kept() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet("A").id = 7;
        workbook.add_worksheet("B");

        let prepared = prepare_default(workbook);
        assert_eq!(prepared.worksheets[0].id, 7);
        assert_eq!(prepared.worksheets[1].id, 8);
    }
}
