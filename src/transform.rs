//! Part renderers
//!
//! The assembler treats worksheet/drawing/table/comment XML generation as
//! opaque: it hands a prepared model fragment to a renderer and appends
//! whatever text comes back. The default renderers here produce minimal
//! valid parts; callers with richer cell models swap in their own via
//! [`Transformers`].

use crate::error::{Result, XlPackError};
use crate::model::{Drawing, MediaItem, Table, Worksheet};
use crate::prepare::SheetContext;
use crate::rels::rel_type;
use crate::xml::escape;

/// Renders worksheet parts and runs sheet-level preparation
pub trait WorksheetRenderer: Send + Sync {
    /// Sheet-level preparation: build the sheet's relationship list and any
    /// derived bookkeeping. Runs exactly once per sheet, before assembly.
    fn prepare(&self, sheet: &mut Worksheet, ctx: &mut SheetContext<'_>) -> Result<()>;

    /// Render `xl/worksheets/sheet{id}.xml`
    fn render(&self, sheet: &Worksheet) -> Result<String>;
}

/// Renders `xl/drawings/{name}.xml`
pub trait DrawingRenderer: Send + Sync {
    fn render(&self, drawing: &Drawing, media: &[MediaItem]) -> Result<String>;
}

/// Renders `xl/tables/{target}`
pub trait TableRenderer: Send + Sync {
    fn render(&self, table: &Table) -> Result<String>;
}

/// Renders the comments part and its legacy VML notes companion
pub trait CommentsRenderer: Send + Sync {
    fn render_comments(&self, sheet: &Worksheet) -> Result<String>;
    fn render_vml(&self, sheet: &Worksheet) -> Result<String>;
}

/// The renderer set used for one write
pub struct Transformers {
    pub worksheet: Box<dyn WorksheetRenderer>,
    pub drawing: Box<dyn DrawingRenderer>,
    pub table: Box<dyn TableRenderer>,
    pub comments: Box<dyn CommentsRenderer>,
}

impl Default for Transformers {
    fn default() -> Self {
        Self {
            worksheet: Box::new(DefaultWorksheetRenderer),
            drawing: Box::new(DefaultDrawingRenderer),
            table: Box::new(DefaultTableRenderer),
            comments: Box::new(DefaultCommentsRenderer),
        }
    }
}

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Default worksheet renderer: empty sheet data plus references to the
/// sheet's drawings, legacy notes, and tables
#[derive(Debug, Default)]
pub struct DefaultWorksheetRenderer;

impl WorksheetRenderer for DefaultWorksheetRenderer {
    fn prepare(&self, sheet: &mut Worksheet, ctx: &mut SheetContext<'_>) -> Result<()> {
        // Table relationships; targets were assigned by model preparation
        for t_idx in 0..sheet.tables.len() {
            let target = format!("../tables/{}", sheet.tables[t_idx].target);
            let rel_id = sheet.rels.add(rel_type::TABLE, target);
            sheet.tables[t_idx].rel_id = rel_id;
        }

        // Drawings: document-wide names, then each drawing's own rels into
        // the media list
        for d_idx in 0..sheet.drawings.len() {
            *ctx.drawing_count += 1;
            let name = format!("drawing{}", ctx.drawing_count);
            {
                let drawing = &mut sheet.drawings[d_idx];
                drawing.name = name.clone();
                for p_idx in 0..drawing.pictures.len() {
                    let media_index = drawing.pictures[p_idx].media_index;
                    let media = ctx.media.get(media_index).ok_or_else(|| {
                        XlPackError::Encoding(format!(
                            "drawing {} references unknown media index {}",
                            name, media_index
                        ))
                    })?;
                    let target = format!("../media/{}.{}", media.name, media.extension);
                    let rel_id = drawing.rels.add(rel_type::IMAGE, target);
                    drawing.pictures[p_idx].rel_id = rel_id;
                }
            }
            let rel_id = sheet
                .rels
                .add(rel_type::DRAWING, format!("../drawings/{}.xml", name));
            sheet.drawings[d_idx].rel_id = rel_id;
        }

        if !sheet.comments.is_empty() {
            sheet.comments_rel_id = Some(
                sheet
                    .rels
                    .add(rel_type::COMMENTS, format!("../comments{}.xml", sheet.id)),
            );
            sheet.vml_rel_id = Some(sheet.rels.add(
                rel_type::VML_DRAWING,
                format!("../drawings/vmlDrawing{}.vml", sheet.id),
            ));
        }

        Ok(())
    }

    fn render(&self, sheet: &Worksheet) -> Result<String> {
        let mut xml = String::with_capacity(512);
        xml.push_str(XML_DECL);
        xml.push('\n');
        xml.push_str(
            "<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
        );
        xml.push_str(r#"<sheetViews><sheetView workbookViewId="0"/></sheetViews>"#);
        xml.push_str("<sheetData/>");
        for drawing in &sheet.drawings {
            xml.push_str(&format!(r#"<drawing r:id="{}"/>"#, drawing.rel_id));
        }
        if let Some(vml_rel) = &sheet.vml_rel_id {
            xml.push_str(&format!(r#"<legacyDrawing r:id="{}"/>"#, vml_rel));
        }
        if !sheet.tables.is_empty() {
            xml.push_str(&format!(r#"<tableParts count="{}">"#, sheet.tables.len()));
            for table in &sheet.tables {
                xml.push_str(&format!(r#"<tablePart r:id="{}"/>"#, table.rel_id));
            }
            xml.push_str("</tableParts>");
        }
        xml.push_str("</worksheet>");
        Ok(xml)
    }
}

/// Default drawing renderer: one two-cell picture anchor per media reference
#[derive(Debug, Default)]
pub struct DefaultDrawingRenderer;

impl DrawingRenderer for DefaultDrawingRenderer {
    fn render(&self, drawing: &Drawing, media: &[MediaItem]) -> Result<String> {
        let mut xml = String::with_capacity(512 + drawing.pictures.len() * 640);
        xml.push_str(XML_DECL);
        xml.push('\n');
        xml.push_str(
            "<xdr:wsDr xmlns:xdr=\"http://schemas.openxmlformats.org/drawingml/2006/spreadsheetDrawing\" \
             xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
        );
        for (idx, pic) in drawing.pictures.iter().enumerate() {
            let name = media
                .get(pic.media_index)
                .map(|m| m.name.as_str())
                .unwrap_or("image");
            xml.push_str("<xdr:twoCellAnchor editAs=\"oneCell\">");
            xml.push_str(&format!(
                "<xdr:from><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:from>",
                pic.from.col, pic.from.row
            ));
            xml.push_str(&format!(
                "<xdr:to><xdr:col>{}</xdr:col><xdr:colOff>0</xdr:colOff><xdr:row>{}</xdr:row><xdr:rowOff>0</xdr:rowOff></xdr:to>",
                pic.to.col, pic.to.row
            ));
            xml.push_str("<xdr:pic>");
            xml.push_str(&format!(
                "<xdr:nvPicPr><xdr:cNvPr id=\"{}\" name=\"{}\"/><xdr:cNvPicPr><a:picLocks noChangeAspect=\"1\"/></xdr:cNvPicPr></xdr:nvPicPr>",
                idx + 1,
                escape(name)
            ));
            xml.push_str(&format!(
                "<xdr:blipFill><a:blip r:embed=\"{}\"/><a:stretch><a:fillRect/></a:stretch></xdr:blipFill>",
                pic.rel_id
            ));
            xml.push_str(
                "<xdr:spPr><a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></xdr:spPr>",
            );
            xml.push_str("</xdr:pic><xdr:clientData/></xdr:twoCellAnchor>");
        }
        xml.push_str("</xdr:wsDr>");
        Ok(xml)
    }
}

/// Default table renderer
#[derive(Debug, Default)]
pub struct DefaultTableRenderer;

impl TableRenderer for DefaultTableRenderer {
    fn render(&self, table: &Table) -> Result<String> {
        let mut xml = String::with_capacity(512 + table.columns.len() * 64);
        xml.push_str(XML_DECL);
        xml.push('\n');
        xml.push_str(&format!(
            "<table xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             id=\"{}\" name=\"{}\" displayName=\"{}\" ref=\"{}\" totalsRowShown=\"{}\">",
            table.id,
            escape(&table.name),
            escape(&table.display_name),
            escape(&table.range),
            if table.totals_row { 1 } else { 0 }
        ));
        if table.header_row {
            xml.push_str(&format!(r#"<autoFilter ref="{}"/>"#, escape(&table.range)));
        }
        xml.push_str(&format!(r#"<tableColumns count="{}">"#, table.columns.len()));
        for (idx, column) in table.columns.iter().enumerate() {
            xml.push_str(&format!(
                r#"<tableColumn id="{}" name="{}"/>"#,
                idx + 1,
                escape(column)
            ));
        }
        xml.push_str("</tableColumns>");
        if let Some(style) = &table.style {
            xml.push_str(&format!(
                "<tableStyleInfo name=\"{}\" showFirstColumn=\"0\" showLastColumn=\"0\" \
                 showRowStripes=\"1\" showColumnStripes=\"0\"/>",
                escape(style)
            ));
        }
        xml.push_str("</table>");
        Ok(xml)
    }
}

/// Default comments renderer: authors deduplicated in first-seen order, one
/// hidden VML note shape per comment
#[derive(Debug, Default)]
pub struct DefaultCommentsRenderer;

impl CommentsRenderer for DefaultCommentsRenderer {
    fn render_comments(&self, sheet: &Worksheet) -> Result<String> {
        let mut authors: Vec<&str> = Vec::new();
        for comment in &sheet.comments {
            if !authors.contains(&comment.author.as_str()) {
                authors.push(&comment.author);
            }
        }

        let mut xml = String::with_capacity(256 + sheet.comments.len() * 128);
        xml.push_str(XML_DECL);
        xml.push('\n');
        xml.push_str(
            "<comments xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
        );
        xml.push_str("<authors>");
        for author in &authors {
            xml.push_str(&format!("<author>{}</author>", escape(author)));
        }
        xml.push_str("</authors><commentList>");
        for comment in &sheet.comments {
            let author_id = authors
                .iter()
                .position(|a| *a == comment.author)
                .unwrap_or(0);
            xml.push_str(&format!(
                r#"<comment ref="{}" authorId="{}"><text><r><t>{}</t></r></text></comment>"#,
                escape(&comment.cell),
                author_id,
                escape(&comment.text)
            ));
        }
        xml.push_str("</commentList></comments>");
        Ok(xml)
    }

    fn render_vml(&self, sheet: &Worksheet) -> Result<String> {
        let mut xml = String::with_capacity(512 + sheet.comments.len() * 512);
        xml.push_str(
            "<xml xmlns:v=\"urn:schemas-microsoft-com:vml\" \
             xmlns:o=\"urn:schemas-microsoft-com:office:office\" \
             xmlns:x=\"urn:schemas-microsoft-com:office:excel\">",
        );
        xml.push_str(
            "<o:shapelayout v:ext=\"edit\"><o:idmap v:ext=\"edit\" data=\"1\"/></o:shapelayout>",
        );
        xml.push_str(
            "<v:shapetype id=\"_x0000_t202\" coordsize=\"21600,21600\" o:spt=\"202\" \
             path=\"m,l,21600r21600,l21600,xe\">\
             <v:stroke joinstyle=\"miter\"/>\
             <v:path gradientshapeok=\"t\" o:connecttype=\"rect\"/>\
             </v:shapetype>",
        );
        for (idx, comment) in sheet.comments.iter().enumerate() {
            let (col, row) = parse_cell_ref(&comment.cell);
            xml.push_str(&format!(
                "<v:shape id=\"_x0000_s{}\" type=\"#_x0000_t202\" \
                 style=\"position:absolute;margin-left:105pt;margin-top:10pt;width:108pt;height:59pt;z-index:{};visibility:hidden\" \
                 fillcolor=\"#ffffe1\" o:insetmode=\"auto\">\
                 <v:fill color2=\"#ffffe1\"/>\
                 <v:shadow on=\"t\" color=\"black\" obscured=\"t\"/>\
                 <x:ClientData ObjectType=\"Note\">\
                 <x:MoveWithCells/><x:SizeWithCells/>\
                 <x:AutoFill>False</x:AutoFill>\
                 <x:Row>{}</x:Row><x:Column>{}</x:Column>\
                 </x:ClientData></v:shape>",
                1025 + idx,
                idx + 1,
                row,
                col
            ));
        }
        xml.push_str("</xml>");
        Ok(xml)
    }
}

/// Parse `B2` into zero-based (col, row); malformed refs fall back to (0, 0)
fn parse_cell_ref(cell: &str) -> (u32, u32) {
    let mut col = 0u32;
    let mut row = 0u32;
    let mut saw_letter = false;
    for ch in cell.chars() {
        if ch.is_ascii_alphabetic() {
            saw_letter = true;
            col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if ch.is_ascii_digit() {
            row = row * 10 + (ch as u32 - '0' as u32);
        } else {
            return (0, 0);
        }
    }
    if !saw_letter || row == 0 {
        return (0, 0);
    }
    (col - 1, row - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Anchor, Comment, Drawing};

    #[test]
    fn cell_ref_parsing() {
        assert_eq!(parse_cell_ref("A1"), (0, 0));
        assert_eq!(parse_cell_ref("B2"), (1, 1));
        assert_eq!(parse_cell_ref("AA10"), (26, 9));
        assert_eq!(parse_cell_ref(""), (0, 0));
        assert_eq!(parse_cell_ref("$B$2"), (0, 0));
    }

    #[test]
    fn table_xml_columns_and_filter() {
        let mut table = Table::new("Sales", "A1:B4", vec!["Region".into(), "Total".into()]);
        table.id = 3;
        table.target = "table3.xml".to_string();

        let xml = DefaultTableRenderer.render(&table).unwrap();
        assert!(xml.contains(r#"id="3""#));
        assert!(xml.contains(r#"<autoFilter ref="A1:B4"/>"#));
        assert!(xml.contains(r#"<tableColumn id="2" name="Total"/>"#));
    }

    #[test]
    fn comments_xml_dedups_authors() {
        let mut sheet = Worksheet::new("S");
        sheet.comments.push(Comment {
            cell: "A1".into(),
            author: "kim".into(),
            text: "first".into(),
        });
        sheet.comments.push(Comment {
            cell: "B2".into(),
            author: "kim".into(),
            text: "second".into(),
        });

        let xml = DefaultCommentsRenderer.render_comments(&sheet).unwrap();
        assert_eq!(xml.matches("<author>kim</author>").count(), 1);
        assert!(xml.contains(r#"<comment ref="B2" authorId="0">"#));
    }

    #[test]
    fn drawing_xml_embeds_rel_ids() {
        let media = vec![crate::model::MediaItem::from_buffer("logo", "png", vec![0])];
        let mut drawing = Drawing::new();
        drawing.add_picture(0, Anchor::new(1, 1), Anchor::new(4, 8));
        drawing.pictures[0].rel_id = "rId1".to_string();

        let xml = DefaultDrawingRenderer.render(&drawing, &media).unwrap();
        assert!(xml.contains(r#"<a:blip r:embed="rId1"/>"#));
        assert!(xml.contains("<xdr:col>1</xdr:col>"));
    }
}
