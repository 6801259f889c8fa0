//! Custom renderer tests
//!
//! The assembler treats part rendering as opaque; swapping in a custom
//! worksheet renderer must change the emitted XML and may populate the
//! shared string table during sheet preparation.

use std::io::{Cursor, Read};

use xlpack::prepare::SheetContext;
use xlpack::transform::{DefaultWorksheetRenderer, WorksheetRenderer};
use xlpack::{PackageWriter, Transformers, Workbook, Worksheet, WriteOptions};

fn read_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap_or_else(|_| panic!("missing entry {}", name));
    let mut out = String::new();
    file.read_to_string(&mut out).unwrap();
    out
}

fn has_entry(bytes: &[u8], name: &str) -> bool {
    zip::ZipArchive::new(Cursor::new(bytes))
        .unwrap()
        .by_name(name)
        .is_ok()
}

/// Renderer that interns one header string per sheet and emits a cell
/// referencing it
struct SharedStringRenderer;

impl WorksheetRenderer for SharedStringRenderer {
    fn prepare(&self, sheet: &mut Worksheet, ctx: &mut SheetContext<'_>) -> xlpack::Result<()> {
        ctx.shared_strings.add(&format!("header for {}", sheet.name));
        DefaultWorksheetRenderer.prepare(sheet, ctx)
    }

    fn render(&self, sheet: &Worksheet) -> xlpack::Result<String> {
        Ok(format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
             <sheetData><row r=\"1\"><c r=\"A1\" t=\"s\"><v>{}</v></c></row></sheetData>\
             </worksheet>",
            sheet.id - 1
        ))
    }
}

fn transformers_with_shared_strings() -> Transformers {
    Transformers {
        worksheet: Box::new(SharedStringRenderer),
        ..Transformers::default()
    }
}

#[tokio::test]
async fn populated_shared_strings_emit_a_part_and_relationship() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("One");
    workbook.add_worksheet("Two");

    let bytes = PackageWriter::with_transformers(workbook, transformers_with_shared_strings())
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();

    let sst = read_entry(&bytes, "xl/sharedStrings.xml");
    assert!(sst.contains(r#"count="2" uniqueCount="2""#));
    assert!(sst.contains("<si><t>header for One</t></si>"));

    // The relationship comes after the worksheet entries, so the
    // styles/theme/sheets prefix keeps its fixed ids
    let rels = read_entry(&bytes, "xl/_rels/workbook.xml.rels");
    assert_eq!(rels.matches("<Relationship ").count(), 5);
    assert!(rels.contains(r#"Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml""#));

    let content_types = read_entry(&bytes, "[Content_Types].xml");
    assert!(content_types.contains("/xl/sharedStrings.xml"));
}

#[tokio::test]
async fn use_shared_strings_false_suppresses_the_part() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("One");

    let options = WriteOptions {
        use_shared_strings: Some(false),
        ..WriteOptions::default()
    };
    let bytes = PackageWriter::with_transformers(workbook, transformers_with_shared_strings())
        .write_buffer(options)
        .await
        .unwrap();

    assert!(!has_entry(&bytes, "xl/sharedStrings.xml"));
    assert!(!read_entry(&bytes, "[Content_Types].xml").contains("/xl/sharedStrings.xml"));
    let rels = read_entry(&bytes, "xl/_rels/workbook.xml.rels");
    assert!(!rels.contains("sharedStrings"));
}

#[tokio::test]
async fn default_renderer_emits_no_shared_strings() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("One");

    let bytes = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();
    assert!(!has_entry(&bytes, "xl/sharedStrings.xml"));
}

#[tokio::test]
async fn custom_worksheet_xml_is_used_verbatim() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("One");

    let bytes = PackageWriter::with_transformers(workbook, transformers_with_shared_strings())
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();
    let sheet = read_entry(&bytes, "xl/worksheets/sheet1.xml");
    assert!(sheet.contains(r#"<c r="A1" t="s"><v>0</v></c>"#));
}
