//! Media resolution tests
//!
//! A media item may come from a file path, an in-memory buffer, or a base64
//! string; all three must land in the archive byte-for-byte identical. An
//! item with none of the three aborts the whole write.

use std::io::{Cursor, Read};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use xlpack::{Anchor, Drawing, MediaItem, PackageWriter, Workbook, WriteOptions, XlPackError};

const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01,
];

fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    let mut file = archive.by_name(name).unwrap_or_else(|_| panic!("missing entry {}", name));
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

#[tokio::test]
async fn media_round_trips_from_all_three_sources() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixel.png");
    std::fs::write(&path, PNG_BYTES).unwrap();

    let mut workbook = Workbook::new();
    workbook.add_worksheet("Sheet1");
    workbook.add_media(MediaItem::from_file("from_file", "png", &path));
    workbook.add_media(MediaItem::from_buffer("from_buffer", "png", PNG_BYTES.to_vec()));
    workbook.add_media(MediaItem::from_base64(
        "from_base64",
        "png",
        format!("data:image/png;base64,{}", BASE64.encode(PNG_BYTES)),
    ));

    let bytes = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();

    assert_eq!(read_entry(&bytes, "xl/media/from_file.png"), PNG_BYTES);
    assert_eq!(read_entry(&bytes, "xl/media/from_buffer.png"), PNG_BYTES);
    assert_eq!(read_entry(&bytes, "xl/media/from_base64.png"), PNG_BYTES);
}

#[tokio::test]
async fn bare_base64_without_data_url_prefix_also_works() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("Sheet1");
    workbook.add_media(MediaItem::from_base64("bare", "png", BASE64.encode(PNG_BYTES)));

    let bytes = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();
    assert_eq!(read_entry(&bytes, "xl/media/bare.png"), PNG_BYTES);
}

#[tokio::test]
async fn media_extensions_get_content_type_defaults() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("Sheet1");
    workbook.add_media(MediaItem::from_buffer("a", "png", PNG_BYTES.to_vec()));
    workbook.add_media(MediaItem::from_buffer("b", "jpeg", vec![0xff, 0xd8]));

    let bytes = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();
    let content_types = String::from_utf8(read_entry(&bytes, "[Content_Types].xml")).unwrap();
    assert!(content_types.contains(r#"<Default Extension="png" ContentType="image/png"/>"#));
    assert!(content_types.contains(r#"<Default Extension="jpeg" ContentType="image/jpeg"/>"#));
}

#[tokio::test]
async fn unsupported_media_aborts_the_write() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("Sheet1");
    workbook.add_media(MediaItem {
        name: "empty".into(),
        extension: "png".into(),
        ..MediaItem::default()
    });

    let err = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, XlPackError::UnsupportedMedia(name) if name == "empty"));
}

#[tokio::test]
async fn one_bad_item_fails_even_among_good_ones() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("Sheet1");
    workbook.add_media(MediaItem::from_buffer("good", "png", PNG_BYTES.to_vec()));
    workbook.add_media(MediaItem {
        name: "bad".into(),
        extension: "png".into(),
        ..MediaItem::default()
    });

    let result = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await;
    assert!(matches!(result, Err(XlPackError::UnsupportedMedia(_))));
}

#[tokio::test]
async fn missing_media_file_surfaces_the_io_error() {
    let mut workbook = Workbook::new();
    workbook.add_worksheet("Sheet1");
    workbook.add_media(MediaItem::from_file("gone", "png", "/no/such/file.png"));

    let err = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, XlPackError::Io(_)));
}

#[tokio::test]
async fn drawings_reference_media_through_their_own_rels() {
    let mut workbook = Workbook::new();
    let logo = workbook.add_media(MediaItem::from_buffer("logo", "png", PNG_BYTES.to_vec()));
    {
        let ws = workbook.add_worksheet("Pictures");
        let drawing = ws.add_drawing(Drawing::new());
        drawing.add_picture(logo, Anchor::new(1, 1), Anchor::new(5, 10));
    }

    let bytes = PackageWriter::new(workbook)
        .write_buffer(WriteOptions::default())
        .await
        .unwrap();

    let drawing = String::from_utf8(read_entry(&bytes, "xl/drawings/drawing1.xml")).unwrap();
    assert!(drawing.contains(r#"r:embed="rId1""#));

    let drawing_rels =
        String::from_utf8(read_entry(&bytes, "xl/drawings/_rels/drawing1.xml.rels")).unwrap();
    assert!(drawing_rels.contains(r#"Id="rId1""#));
    assert!(drawing_rels.contains(r#"Target="../media/logo.png""#));

    let sheet = String::from_utf8(read_entry(&bytes, "xl/worksheets/sheet1.xml")).unwrap();
    assert!(sheet.contains(r#"<drawing r:id="rId1"/>"#));
}
