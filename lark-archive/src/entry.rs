//! Archive entry metadata and lifecycle state.

use crate::format::DirectoryRecord;
use lark_core::{Level, Method};
use std::borrow::Cow;

/// One named byte stream stored in the archive.
///
/// Names are kept as the raw bytes read from or written to the directory;
/// the engine guarantees byte-for-byte round-trip and only interprets them
/// for display and for case-insensitive lookup. Entries added since the
/// last save carry their compressed payload in memory; entries read from
/// disk are range-copied from the backing file on save.
#[derive(Debug, Clone)]
pub struct Entry {
    name: Vec<u8>,
    /// Uncompressed size in bytes.
    pub original_size: i64,
    /// Stored payload size in bytes.
    pub compressed_size: u32,
    /// CRC-32 of the uncompressed bytes.
    pub crc32: u32,
    /// Source modification time as FILETIME.
    pub mtime: i64,
    /// Absolute payload offset in the backing file; assigned on save.
    pub offset: i64,
    /// Compression method.
    pub method: Method,
    /// Compression level the payload was produced with.
    pub level: Level,
    /// Opaque attribute bits captured at add time; held in memory only.
    pub attributes: u32,
    /// Transient compressed payload, present until the next save.
    pub(crate) data: Option<Vec<u8>>,
}

impl Entry {
    /// Build an entry for a freshly compressed payload.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn pending(
        name: Vec<u8>,
        original_size: i64,
        compressed_size: u32,
        crc32: u32,
        mtime: i64,
        method: Method,
        level: Level,
        attributes: u32,
        data: Vec<u8>,
    ) -> Self {
        Self {
            name,
            original_size,
            compressed_size,
            crc32,
            mtime,
            offset: 0,
            method,
            level,
            attributes,
            data: Some(data),
        }
    }

    /// Build an entry from a validated directory record.
    pub(crate) fn from_record(record: DirectoryRecord, method: Method) -> Self {
        Self {
            name: record.name,
            original_size: record.original_size,
            compressed_size: record.compressed_size,
            crc32: record.crc32,
            mtime: record.mtime,
            offset: record.offset,
            method,
            level: Level::new(record.level),
            attributes: 0,
            data: None,
        }
    }

    /// The raw name bytes as stored in the directory.
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// The name for display; lossy if the stored bytes are not UTF-8.
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.name)
    }

    /// ASCII-case-insensitive name comparison, the rule used by lookup,
    /// delete and update.
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name.as_bytes())
    }

    /// Whether this entry still holds its compressed payload in memory.
    pub fn is_pending(&self) -> bool {
        self.data.is_some()
    }

    /// Compression ratio as compressed/original (1.0 for empty entries).
    pub fn ratio(&self) -> f64 {
        if self.original_size <= 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        Entry::pending(
            b"Docs/Readme.TXT".to_vec(),
            1000,
            250,
            7,
            0,
            Method::Lzss,
            Level::new(6),
            0,
            vec![0; 250],
        )
    }

    #[test]
    fn test_name_matching_is_case_insensitive() {
        let entry = sample();
        assert!(entry.matches_name("docs/readme.txt"));
        assert!(entry.matches_name("DOCS/README.TXT"));
        assert!(!entry.matches_name("docs/readme"));
    }

    #[test]
    fn test_ratio() {
        let entry = sample();
        assert!((entry.ratio() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_of_empty_entry() {
        let mut entry = sample();
        entry.original_size = 0;
        assert_eq!(entry.ratio(), 1.0);
    }

    #[test]
    fn test_pending_state() {
        let mut entry = sample();
        assert!(entry.is_pending());
        entry.data = None;
        assert!(!entry.is_pending());
    }

    #[test]
    fn test_non_utf8_name_displays_lossily() {
        let mut entry = sample();
        entry.name = vec![0x66, 0x6F, 0x80, 0x6F];
        assert_eq!(entry.name(), "fo\u{FFFD}o");
        assert_eq!(entry.name_bytes(), &[0x66, 0x6F, 0x80, 0x6F]);
    }
}
