//! Whole-buffer zip backend
//!
//! Collects raw entries as they are appended, then compresses and assembles
//! the archive in one pass at finalize. Simple and allocation-friendly for
//! the small, many-entry archives a spreadsheet package is.

use flate2::write::DeflateEncoder;
use flate2::Compression;
use std::io::Write;

use crate::error::{Result, XlPackError};
use crate::sink::{
    dos_datetime, flush_piped, write_container, ArchiveEntry, EncodedEntry, PipedDest, ZipSink,
};

struct PendingEntry {
    name: String,
    data: Vec<u8>,
    dos_time: u16,
    dos_date: u16,
}

/// Whole-buffer strategy: store raw bytes, encode everything at finalize
pub struct BufferedZipSink {
    entries: Vec<PendingEntry>,
    compression_level: u32,
    piped: Option<PipedDest>,
}

impl BufferedZipSink {
    /// New sink with the default compression level (6)
    pub fn new() -> Self {
        Self::with_compression(6)
    }

    /// New sink with a custom compression level (0-9)
    pub fn with_compression(compression_level: u32) -> Self {
        Self {
            entries: Vec::new(),
            compression_level,
            piped: None,
        }
    }

    /// Number of entries buffered so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for BufferedZipSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipSink for BufferedZipSink {
    fn pipe(&mut self, dest: PipedDest) {
        self.piped = Some(dest);
    }

    async fn append(&mut self, entry: ArchiveEntry) -> Result<()> {
        let (dos_time, dos_date) = dos_datetime(&entry.modified);
        self.entries.push(PendingEntry {
            name: entry.name,
            data: entry.content.into_bytes()?,
            dos_time,
            dos_date,
        });
        Ok(())
    }

    async fn finalize(self) -> Result<Vec<u8>> {
        let mut encoded = Vec::with_capacity(self.entries.len());
        for entry in self.entries {
            let crc32 = crc32fast::hash(&entry.data);
            let mut encoder = DeflateEncoder::new(
                Vec::with_capacity(entry.data.len() / 2),
                Compression::new(self.compression_level),
            );
            encoder
                .write_all(&entry.data)
                .map_err(|e| XlPackError::Encoding(format!("deflate {}: {}", entry.name, e)))?;
            let compressed = encoder
                .finish()
                .map_err(|e| XlPackError::Encoding(format!("deflate {}: {}", entry.name, e)))?;
            encoded.push(EncodedEntry {
                name: entry.name,
                crc32,
                compressed,
                uncompressed_size: entry.data.len() as u64,
                dos_time: entry.dos_time,
                dos_date: entry.dos_date,
            });
        }

        let bytes = write_container(&encoded)?;
        flush_piped(self.piped, &bytes).await?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn append_then_finalize() {
        let mut sink = BufferedZipSink::new();
        sink.append(ArchiveEntry::new("a.txt", "alpha")).await.unwrap();
        sink.append(ArchiveEntry::new("b/c.txt", vec![1u8, 2, 3]))
            .await
            .unwrap();
        assert_eq!(sink.len(), 2);

        let bytes = sink.finalize().await.unwrap();
        assert_eq!(&bytes[0..2], b"PK");
    }
}
