//! Streaming zip backend
//!
//! Compresses each entry at the moment it is appended, using the async
//! deflate encoder, so finalize only has to assemble the container. Same
//! contract as the whole-buffer backend; the assembler cannot tell them
//! apart.

use async_compression::tokio::write::DeflateEncoder;
use std::io::Cursor;
use tokio::io::AsyncWriteExt;

use crate::error::{Result, XlPackError};
use crate::sink::{
    dos_datetime, flush_piped, write_container, ArchiveEntry, EncodedEntry, PipedDest, ZipSink,
};

/// Streaming strategy: per-entry compression at append time
pub struct StreamingZipSink {
    entries: Vec<EncodedEntry>,
    piped: Option<PipedDest>,
}

impl StreamingZipSink {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            piped: None,
        }
    }

    /// Number of entries compressed so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for StreamingZipSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipSink for StreamingZipSink {
    fn pipe(&mut self, dest: PipedDest) {
        self.piped = Some(dest);
    }

    async fn append(&mut self, entry: ArchiveEntry) -> Result<()> {
        let (dos_time, dos_date) = dos_datetime(&entry.modified);
        let name = entry.name;
        let data = entry.content.into_bytes()?;
        let crc32 = crc32fast::hash(&data);

        let mut encoder = DeflateEncoder::new(Cursor::new(Vec::with_capacity(data.len() / 2)));
        encoder
            .write_all(&data)
            .await
            .map_err(|e| XlPackError::Encoding(format!("deflate {}: {}", name, e)))?;
        encoder
            .shutdown()
            .await
            .map_err(|e| XlPackError::Encoding(format!("deflate {}: {}", name, e)))?;
        let compressed = encoder.into_inner().into_inner();

        self.entries.push(EncodedEntry {
            name,
            crc32,
            compressed,
            uncompressed_size: data.len() as u64,
            dos_time,
            dos_date,
        });
        Ok(())
    }

    async fn finalize(self) -> Result<Vec<u8>> {
        let bytes = write_container(&self.entries)?;
        flush_piped(self.piped, &bytes).await?;
        Ok(bytes)
    }
}
