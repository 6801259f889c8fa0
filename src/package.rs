//! Package assembler
//!
//! Drives part generation for one write invocation in dependency order:
//! content types first (computed from the prepared model, so declarations
//! are exact), then relationships, worksheets and their satellite parts,
//! drawings, tables, themes and styles, media, document properties, and the
//! workbook part last — it enumerates the final sheet list. The zip sink is
//! finalized once at the end; any failure before that aborts the write and
//! no completion signal fires.

use futures_util::future::try_join_all;
use std::path::Path;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::content_types::{content_type, image_content_type, ContentTypeRegistry};
use crate::error::{Result, XlPackError};
use crate::model::{MediaItem, Workbook};
use crate::prepare::{prepare, Backend, PreparedWorkbook, WriteOptions};
use crate::rels::{rel_type, Relationships};
use crate::sink::{ArchiveEntry, EntryContent, ZipSink};
use crate::transform::Transformers;
use crate::xml;
use crate::zip_buffered::BufferedZipSink;
use crate::zip_streaming::StreamingZipSink;

/// Assembles one workbook into one package
///
/// A writer is consumed by the write call, so exactly one write happens per
/// target and the model cannot be reused afterwards.
///
/// # Example
///
/// ```no_run
/// use xlpack::{PackageWriter, Workbook, WriteOptions};
///
/// # async fn demo() -> xlpack::Result<()> {
/// let mut workbook = Workbook::new();
/// workbook.add_worksheet("Sheet1");
///
/// let bytes = PackageWriter::new(workbook)
///     .write_buffer(WriteOptions::default())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct PackageWriter {
    workbook: Workbook,
    transformers: Transformers,
}

impl PackageWriter {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            workbook,
            transformers: Transformers::default(),
        }
    }

    /// Use custom part renderers instead of the built-in defaults
    pub fn with_transformers(workbook: Workbook, transformers: Transformers) -> Self {
        Self {
            workbook,
            transformers,
        }
    }

    /// Stream the archive into a caller-supplied sink
    pub async fn write<W: AsyncWrite + Unpin + Send>(
        self,
        dest: &mut W,
        options: WriteOptions,
    ) -> Result<()> {
        let bytes = self.write_buffer(options).await?;
        dest.write_all(&bytes).await?;
        dest.flush().await?;
        Ok(())
    }

    /// Write the archive to a file; the file is closed on completion or
    /// failure and a failed write surfaces the first error
    pub async fn write_file(self, path: impl AsRef<Path>, options: WriteOptions) -> Result<()> {
        let file = tokio::fs::File::create(path).await?;
        match options.backend {
            Backend::Buffered => {
                let mut sink = BufferedZipSink::new();
                sink.pipe(Box::pin(file));
                self.assemble(sink, options).await?;
            }
            Backend::Streaming => {
                let mut sink = StreamingZipSink::new();
                sink.pipe(Box::pin(file));
                self.assemble(sink, options).await?;
            }
        }
        Ok(())
    }

    /// Assemble in memory and return the complete archive bytes
    pub async fn write_buffer(self, options: WriteOptions) -> Result<Vec<u8>> {
        match options.backend {
            Backend::Buffered => self.assemble(BufferedZipSink::new(), options).await,
            Backend::Streaming => self.assemble(StreamingZipSink::new(), options).await,
        }
    }

    /// Assemble through a caller-supplied sink implementation
    pub async fn write_with_sink<S: ZipSink>(
        self,
        sink: S,
        options: WriteOptions,
    ) -> Result<Vec<u8>> {
        self.assemble(sink, options).await
    }

    async fn assemble<S: ZipSink>(self, mut zip: S, options: WriteOptions) -> Result<Vec<u8>> {
        let Self {
            workbook,
            transformers,
        } = self;
        let model = prepare(workbook, &options, &transformers)?;

        // 1. Content types, from the prepared model's expected structure
        let registry = content_types_for(&model)?;
        zip.append(ArchiveEntry::new("[Content_Types].xml", registry.to_xml()))
            .await?;

        // 2. Office-level relationships: fixed three entries
        let mut office_rels = Relationships::new();
        office_rels.add(rel_type::OFFICE_DOCUMENT, "xl/workbook.xml");
        office_rels.add(rel_type::CORE_PROPERTIES, "docProps/core.xml");
        office_rels.add(rel_type::EXTENDED_PROPERTIES, "docProps/app.xml");
        zip.append(ArchiveEntry::new("_rels/.rels", office_rels.to_xml()))
            .await?;

        // 3. Workbook-level relationships, built at preparation
        zip.append(ArchiveEntry::new(
            "xl/_rels/workbook.xml.rels",
            model.workbook_rels.to_xml(),
        ))
        .await?;

        // 4. Worksheets and their satellite parts
        for ws in &model.worksheets {
            let sheet_xml = transformers.worksheet.render(ws)?;
            zip.append(ArchiveEntry::new(
                format!("xl/worksheets/sheet{}.xml", ws.id),
                sheet_xml,
            ))
            .await?;

            if !ws.rels.is_empty() {
                zip.append(ArchiveEntry::new(
                    format!("xl/worksheets/_rels/sheet{}.xml.rels", ws.id),
                    ws.rels.to_xml(),
                ))
                .await?;
            }

            if !ws.comments.is_empty() {
                let comments_xml = transformers.comments.render_comments(ws)?;
                zip.append(ArchiveEntry::new(
                    format!("xl/comments{}.xml", ws.id),
                    comments_xml,
                ))
                .await?;

                let vml_xml = transformers.comments.render_vml(ws)?;
                zip.append(ArchiveEntry::new(
                    format!("xl/drawings/vmlDrawing{}.vml", ws.id),
                    vml_xml,
                ))
                .await?;
            }
        }

        // 4b. Shared strings, always after the worksheets
        if model.shared_strings_rel.is_some() {
            zip.append(ArchiveEntry::new(
                "xl/sharedStrings.xml",
                model.shared_strings.to_xml(),
            ))
            .await?;
        }

        // 5. Drawings and their relationship parts
        for &(s_idx, d_idx) in &model.drawings {
            let drawing = &model.worksheets[s_idx].drawings[d_idx];
            let drawing_xml = transformers.drawing.render(drawing, &model.media)?;
            zip.append(ArchiveEntry::new(
                format!("xl/drawings/{}.xml", drawing.name),
                drawing_xml,
            ))
            .await?;
            zip.append(ArchiveEntry::new(
                format!("xl/drawings/_rels/{}.xml.rels", drawing.name),
                drawing.rels.to_xml(),
            ))
            .await?;
        }

        // 6. Tables, in global id order
        for &(s_idx, t_idx) in &model.tables {
            let table = &model.worksheets[s_idx].tables[t_idx];
            let table_xml = transformers.table.render(table)?;
            zip.append(ArchiveEntry::new(
                format!("xl/tables/{}", table.target),
                table_xml,
            ))
            .await?;
        }

        // 7. Themes and styles: independent, rendered jointly
        let (themes, styles) = futures_util::try_join!(
            async {
                let parts: Vec<(String, String)> = model
                    .themes
                    .iter()
                    .map(|(name, xml)| (format!("xl/theme/{}.xml", name), xml.clone()))
                    .collect();
                Ok::<_, XlPackError>(parts)
            },
            async { Ok::<_, XlPackError>(model.styles.render()) },
        )?;
        for (name, theme_xml) in themes {
            zip.append(ArchiveEntry::new(name, theme_xml)).await?;
        }
        if let Some(styles_xml) = styles {
            zip.append(ArchiveEntry::new("xl/styles.xml", styles_xml))
                .await?;
        }

        // 8. Media: resolve concurrently, append serially
        let resolved = try_join_all(model.media.iter().map(resolve_media)).await?;
        for (media, content) in model.media.iter().zip(resolved) {
            zip.append(ArchiveEntry::new(media.target(), content)).await?;
        }

        // 9. App and core properties: independent, rendered jointly
        let (app, core) = futures_util::try_join!(
            async { Ok::<_, XlPackError>(xml::app_xml(&model)) },
            async { Ok::<_, XlPackError>(xml::core_xml(&model)) },
        )?;
        zip.append(ArchiveEntry::new("docProps/app.xml", app)).await?;
        zip.append(ArchiveEntry::new("docProps/core.xml", core)).await?;

        // 10. The workbook part last: it enumerates the final sheet list
        zip.append(ArchiveEntry::new("xl/workbook.xml", xml::workbook_xml(&model)))
            .await?;

        // 11. Finalize; completion resolves exactly once
        zip.finalize().await
    }
}

/// Exact content-type declarations for everything the prepared model will
/// put in the archive
fn content_types_for(model: &PreparedWorkbook) -> Result<ContentTypeRegistry> {
    let mut registry = ContentTypeRegistry::new();

    registry.override_for("xl/workbook.xml", content_type::WORKBOOK)?;
    for ws in &model.worksheets {
        registry.override_for(
            format!("xl/worksheets/sheet{}.xml", ws.id),
            content_type::WORKSHEET,
        )?;
        if !ws.comments.is_empty() {
            registry.override_for(
                format!("xl/comments{}.xml", ws.id),
                content_type::COMMENTS,
            )?;
            registry.default_for("vml", content_type::VML_DRAWING);
        }
    }
    for &(s_idx, d_idx) in &model.drawings {
        let drawing = &model.worksheets[s_idx].drawings[d_idx];
        registry.override_for(
            format!("xl/drawings/{}.xml", drawing.name),
            content_type::DRAWING,
        )?;
    }
    for &(s_idx, t_idx) in &model.tables {
        let table = &model.worksheets[s_idx].tables[t_idx];
        registry.override_for(format!("xl/tables/{}", table.target), content_type::TABLE)?;
    }
    for name in model.themes.keys() {
        registry.override_for(format!("xl/theme/{}.xml", name), content_type::THEME)?;
    }
    if model.has_styles_part() {
        registry.override_for("xl/styles.xml", content_type::STYLES)?;
    }
    if model.shared_strings_rel.is_some() {
        registry.override_for("xl/sharedStrings.xml", content_type::SHARED_STRINGS)?;
    }
    for media in &model.media {
        registry.default_for(media.extension.clone(), image_content_type(&media.extension));
    }
    registry.override_for("docProps/core.xml", content_type::CORE_PROPERTIES)?;
    registry.override_for("docProps/app.xml", content_type::EXTENDED_PROPERTIES)?;

    Ok(registry)
}

/// Resolve one media item to appendable content. Exactly one source must be
/// set; file reads may block and run concurrently across items.
async fn resolve_media(media: &MediaItem) -> Result<EntryContent> {
    if let Some(path) = &media.filename {
        let data = tokio::fs::read(path).await?;
        return Ok(EntryContent::Binary(data));
    }
    if let Some(buffer) = &media.buffer {
        return Ok(EntryContent::Binary(buffer.clone()));
    }
    if let Some(base64) = &media.base64 {
        // Data-URL prefixes end at the first comma; everything before it is
        // dropped
        let encoded = match base64.find(',') {
            Some(i) => &base64[i + 1..],
            None => base64.as_str(),
        };
        return Ok(EntryContent::Base64(encoded.to_string()));
    }
    Err(XlPackError::UnsupportedMedia(media.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::prepare;

    #[test]
    fn content_types_skip_styles_under_null_manager() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet("Sheet1");
        let options = WriteOptions {
            use_styles: Some(false),
            ..WriteOptions::default()
        };
        let model = prepare(workbook, &options, &Transformers::default()).unwrap();

        let xml = content_types_for(&model).unwrap().to_xml();
        assert!(!xml.contains("/xl/styles.xml"));
        assert!(xml.contains("/xl/workbook.xml"));
    }

    #[tokio::test]
    async fn unsupported_media_is_fatal() {
        let empty = MediaItem {
            name: "ghost".into(),
            extension: "png".into(),
            ..MediaItem::default()
        };
        let err = resolve_media(&empty).await.unwrap_err();
        assert!(matches!(err, XlPackError::UnsupportedMedia(name) if name == "ghost"));
    }

    #[tokio::test]
    async fn base64_prefix_is_stripped() {
        let item = MediaItem::from_base64("dot", "png", "data:image/png;base64,aGk=");
        let content = resolve_media(&item).await.unwrap();
        assert_eq!(content.into_bytes().unwrap(), b"hi");
    }
}
