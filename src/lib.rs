//! # xlpack: Streaming XLSX Package Assembler
//!
//! `xlpack` assembles Office Open XML spreadsheet packages: zip archives of
//! interdependent XML parts bound together by a relationship graph and a
//! content-type registry. It focuses on getting the cross-file contract
//! right — every part referenced in a relationship or content-type
//! declaration exists, under the exact name, with the exact extension — so
//! the produced file actually opens in consuming applications.
//!
//! ## Features
//!
//! - **Dependency-ordered assembly**: content types, relationships,
//!   worksheets, drawings, tables, themes/styles, media, properties, workbook
//! - **Stable identifiers**: scope-local `rId` counters, globally numbered
//!   table targets, document-wide drawing names
//! - **Pluggable zip backends**: whole-buffer (`flate2`) or per-entry
//!   streaming (`async-compression`) behind one sink trait
//! - **Async completion**: `finalize` resolves exactly once; the sink is
//!   consumed so nothing can be appended afterwards
//!
//! ## Quick Start
//!
//! ### Writing a workbook to a file
//!
//! ```no_run
//! use xlpack::{PackageWriter, Workbook, WriteOptions};
//!
//! # async fn demo() -> xlpack::Result<()> {
//! let mut workbook = Workbook::new();
//! workbook.add_worksheet("Report");
//!
//! PackageWriter::new(workbook)
//!     .write_file("report.xlsx", WriteOptions::default())
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Writing to an in-memory buffer with the streaming backend
//!
//! ```no_run
//! use xlpack::{PackageWriter, Workbook, WriteOptions};
//!
//! # async fn demo() -> xlpack::Result<()> {
//! let mut workbook = Workbook::new();
//! workbook.add_worksheet("Data");
//!
//! let bytes = PackageWriter::new(workbook)
//!     .write_buffer(WriteOptions::streaming())
//!     .await?;
//! println!("package is {} bytes", bytes.len());
//! # Ok(())
//! # }
//! ```

pub mod content_types;
pub mod error;
pub mod model;
pub mod package;
pub mod prepare;
pub mod rels;
pub mod sink;
pub mod transform;
pub mod xml;
pub mod zip_buffered;
pub mod zip_streaming;

pub use error::{Result, XlPackError};
pub use model::{
    Anchor, Comment, Drawing, MediaItem, Picture, SharedStringTable, Table, Workbook, Worksheet,
};
pub use package::PackageWriter;
pub use prepare::{
    Backend, NullStyles, PreparedWorkbook, StyleManager, StylesPart, WriteOptions, PROGRAM_NAME,
};
pub use rels::{Relationship, Relationships};
pub use sink::{ArchiveEntry, EntryContent, ZipSink};
pub use transform::Transformers;
pub use zip_buffered::BufferedZipSink;
pub use zip_streaming::StreamingZipSink;
