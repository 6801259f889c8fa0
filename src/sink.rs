//! Zip streaming adapter contract
//!
//! A [`ZipSink`] buffers named entries and produces the encoded archive.
//! Entries may be appended in any order; `finalize` consumes the sink by
//! value, so appending after completion is unrepresentable. Completion is
//! the resolution of the `finalize` future, exactly once: the encoded bytes
//! are flushed to the piped destination (when one is attached) and returned.
//!
//! Two backends implement the contract: [`crate::zip_buffered::BufferedZipSink`]
//! (whole-buffer, one-pass deflate at finalize) and
//! [`crate::zip_streaming::StreamingZipSink`] (per-entry deflate at append).
//! Callers must not depend on which is active.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Datelike, Timelike, Utc};
use std::pin::Pin;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Result, XlPackError};

/// Destination attached with [`ZipSink::pipe`]
pub type PipedDest = Pin<Box<dyn AsyncWrite + Send>>;

/// Content handed to `append`: UTF-8 text, raw bytes, or base64 text that
/// the adapter decodes first
#[derive(Debug, Clone)]
pub enum EntryContent {
    Text(String),
    Binary(Vec<u8>),
    Base64(String),
}

impl EntryContent {
    /// Resolve to raw bytes, decoding base64 when flagged
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            EntryContent::Text(text) => Ok(text.into_bytes()),
            EntryContent::Binary(bytes) => Ok(bytes),
            EntryContent::Base64(text) => BASE64
                .decode(text.as_bytes())
                .map_err(|e| XlPackError::Encoding(format!("base64 decode: {}", e))),
        }
    }
}

impl From<String> for EntryContent {
    fn from(text: String) -> Self {
        EntryContent::Text(text)
    }
}

impl From<&str> for EntryContent {
    fn from(text: &str) -> Self {
        EntryContent::Text(text.to_string())
    }
}

impl From<Vec<u8>> for EntryContent {
    fn from(bytes: Vec<u8>) -> Self {
        EntryContent::Binary(bytes)
    }
}

/// One named entry in the archive; content is immutable once appended
#[derive(Debug)]
pub struct ArchiveEntry {
    /// Full in-archive path, e.g. `xl/workbook.xml`
    pub name: String,
    pub content: EntryContent,
    pub modified: DateTime<Utc>,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, content: impl Into<EntryContent>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            modified: Utc::now(),
        }
    }
}

/// Pluggable zip-encoding backend
#[allow(async_fn_in_trait)]
pub trait ZipSink: Send {
    /// Attach a destination; the encoded archive is flushed to it when
    /// `finalize` completes
    fn pipe(&mut self, dest: PipedDest);

    /// Buffer one entry. Must not be called concurrently on one sink; the
    /// assembler serializes appends by awaiting each one.
    async fn append(&mut self, entry: ArchiveEntry) -> Result<()>;

    /// Encode the archive, flush it to the piped destination, and return
    /// the bytes. Consuming `self` forbids any further append.
    async fn finalize(self) -> Result<Vec<u8>>;
}

/// An entry already compressed with DEFLATE, ready for the container
pub(crate) struct EncodedEntry {
    pub name: String,
    pub crc32: u32,
    pub compressed: Vec<u8>,
    pub uncompressed_size: u64,
    pub dos_time: u16,
    pub dos_date: u16,
}

/// MS-DOS time/date pair for zip headers; dates before 1980 clamp to the
/// epoch the format can express
pub(crate) fn dos_datetime(ts: &DateTime<Utc>) -> (u16, u16) {
    let year = ts.year().clamp(1980, 2107) as u16;
    let date = ((year - 1980) << 9) | ((ts.month() as u16) << 5) | ts.day() as u16;
    let time =
        ((ts.hour() as u16) << 11) | ((ts.minute() as u16) << 5) | (ts.second() as u16 / 2);
    (time, date)
}

/// Assemble the classic zip container: local headers with known sizes, the
/// central directory, and the end-of-central-directory record. Archives
/// that would need zip64 fields are an encoding error.
pub(crate) fn write_container(entries: &[EncodedEntry]) -> Result<Vec<u8>> {
    const METHOD_DEFLATE: u16 = 8;

    if entries.len() > u16::MAX as usize {
        return Err(XlPackError::Encoding(format!(
            "too many entries for a classic archive: {}",
            entries.len()
        )));
    }

    let total: usize = entries
        .iter()
        .map(|e| 30 + e.name.len() + e.compressed.len() + 46 + e.name.len())
        .sum();
    let mut out = Vec::with_capacity(total + 22);
    let mut offsets = Vec::with_capacity(entries.len());

    for entry in entries {
        let compressed_size = check_u32(entry.compressed.len() as u64, &entry.name)?;
        let uncompressed_size = check_u32(entry.uncompressed_size, &entry.name)?;
        offsets.push(check_u32(out.len() as u64, &entry.name)?);

        out.extend_from_slice(&[0x50, 0x4b, 0x03, 0x04]); // local header signature
        out.extend_from_slice(&20u16.to_le_bytes()); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // general purpose bit flag
        out.extend_from_slice(&METHOD_DEFLATE.to_le_bytes());
        out.extend_from_slice(&entry.dos_time.to_le_bytes());
        out.extend_from_slice(&entry.dos_date.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&compressed_size.to_le_bytes());
        out.extend_from_slice(&uncompressed_size.to_le_bytes());
        out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra len
        out.extend_from_slice(entry.name.as_bytes());
        out.extend_from_slice(&entry.compressed);
    }

    let central_dir_offset = check_u32(out.len() as u64, "central directory")?;

    for (entry, offset) in entries.iter().zip(&offsets) {
        out.extend_from_slice(&[0x50, 0x4b, 0x01, 0x02]); // central dir signature
        out.extend_from_slice(&[20, 0]); // version made by
        out.extend_from_slice(&[20, 0]); // version needed
        out.extend_from_slice(&0u16.to_le_bytes()); // general purpose bit flag
        out.extend_from_slice(&METHOD_DEFLATE.to_le_bytes());
        out.extend_from_slice(&entry.dos_time.to_le_bytes());
        out.extend_from_slice(&entry.dos_date.to_le_bytes());
        out.extend_from_slice(&entry.crc32.to_le_bytes());
        out.extend_from_slice(&(entry.compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(entry.uncompressed_size as u32).to_le_bytes());
        out.extend_from_slice(&(entry.name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // extra len
        out.extend_from_slice(&0u16.to_le_bytes()); // file comment len
        out.extend_from_slice(&0u16.to_le_bytes()); // disk number start
        out.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        out.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(entry.name.as_bytes());
    }

    let central_dir_size = check_u32(out.len() as u64 - central_dir_offset as u64, "central directory")?;

    out.extend_from_slice(&[0x50, 0x4b, 0x05, 0x06]); // end of central directory
    out.extend_from_slice(&0u16.to_le_bytes()); // disk number
    out.extend_from_slice(&0u16.to_le_bytes()); // disk with central dir
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
    out.extend_from_slice(&central_dir_size.to_le_bytes());
    out.extend_from_slice(&central_dir_offset.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // comment len

    Ok(out)
}

fn check_u32(value: u64, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| XlPackError::Encoding(format!("{}: size exceeds classic zip limits", what)))
}

/// Flush the encoded archive to a piped destination
pub(crate) async fn flush_piped(piped: Option<PipedDest>, bytes: &[u8]) -> Result<()> {
    if let Some(mut dest) = piped {
        dest.write_all(bytes).await?;
        dest.flush().await?;
        dest.shutdown().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn entry_content_resolution() {
        assert_eq!(
            EntryContent::Text("abc".into()).into_bytes().unwrap(),
            b"abc"
        );
        assert_eq!(
            EntryContent::Base64("aGVsbG8=".into()).into_bytes().unwrap(),
            b"hello"
        );
        assert!(EntryContent::Base64("!!".into()).into_bytes().is_err());
    }

    #[test]
    fn dos_datetime_packs_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 15, 10, 30, 44).unwrap();
        let (time, date) = dos_datetime(&ts);
        assert_eq!(date, ((2024 - 1980) << 9) | (6 << 5) | 15);
        assert_eq!(time, (10 << 11) | (30 << 5) | 22);

        // Pre-epoch dates clamp instead of underflowing
        let old = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        let (_, date) = dos_datetime(&old);
        assert_eq!(date >> 9, 0);
    }

    #[test]
    fn empty_container_is_just_eocd() {
        let bytes = write_container(&[]).unwrap();
        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[0..4], &[0x50, 0x4b, 0x05, 0x06]);
    }
}
