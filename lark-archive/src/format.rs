//! On-disk layout: the 60-byte archive header and the central directory.
//!
//! All multi-byte integers are little-endian. The container is:
//!
//! ```text
//! offset 0    header, 60 bytes
//! offset 60   entry payloads, concatenated in directory order
//! tail        central directory: signature, count, records, to EOF
//! ```
//!
//! Each directory record is 36 fixed bytes followed by the name:
//! file offset i64, original size i64, compressed size u32, CRC-32 u32,
//! modification time i64 (FILETIME), method u8, level u8, name length u16,
//! name bytes.

use crate::entry::Entry;
use lark_core::{LarkError, Result};

/// Primary archive signature (`LARK` read as a little-endian u32).
pub const SIGNATURE: u32 = 0x4B52_414C;
/// Legacy archive signature, accepted on read, never written.
pub const SIGNATURE_LEGACY: u32 = 0x4352_414C;
/// Primary central directory signature.
pub const DIRECTORY_SIGNATURE: u32 = 0x444B_524C;
/// Legacy central directory signature, accepted on read, never written.
pub const DIRECTORY_SIGNATURE_LEGACY: u32 = 0x4C41_5244;

/// The only supported format version.
pub const FORMAT_VERSION: u16 = 0x0200;
/// Fixed header size in bytes; payloads start here.
pub const HEADER_SIZE: usize = 60;
/// Advisory block size written into new headers.
pub const DEFAULT_BLOCK_SIZE: u32 = 262_144;
/// Maximum encoded entry name length in bytes.
pub const MAX_NAME_BYTES: usize = 260;
/// Entries whose original/compressed ratio exceeds this are rejected, both
/// when adding and when opening.
pub const MAX_EXPANSION_RATIO: i64 = 1000;

/// The byte-aligned region scanned first when locating the directory.
pub const DIRECTORY_SCAN_FAST: u64 = 4096;
/// The widest backward scan for the directory signature.
pub const DIRECTORY_SCAN_LIMIT: u64 = 64 * 1024;

/// Fixed portion of a directory record, before the name bytes.
pub const DIRECTORY_RECORD_FIXED: usize = 36;
/// Smallest possible directory: signature and a zero count.
pub const DIRECTORY_MIN_SIZE: usize = 8;

/// Parsed archive header.
#[derive(Debug, Clone)]
pub struct Header {
    /// Signature as found on disk (primary or legacy).
    pub signature: u32,
    /// Format version; must equal [`FORMAT_VERSION`].
    pub format_version: u16,
    /// Informational minimum unpacker version.
    pub min_unpack_version: u16,
    /// Flag bits; read and ignored, written as zero.
    pub flags: u32,
    /// Advisory block size.
    pub block_size: u32,
    /// Default compression level, 0-9.
    pub default_level: u32,
    /// Creation time as FILETIME.
    pub creation_time: i64,
    /// Last update time as FILETIME.
    pub last_update_time: i64,
    /// Entry count; advisory, the directory count is authoritative.
    pub file_count: u32,
}

impl Header {
    /// Create a header for a new archive, stamped with the current time.
    pub fn new(default_level: u32) -> Self {
        let now = lark_core::filetime::now();
        Self {
            signature: SIGNATURE,
            format_version: FORMAT_VERSION,
            min_unpack_version: FORMAT_VERSION,
            flags: 0,
            block_size: DEFAULT_BLOCK_SIZE,
            default_level,
            creation_time: now,
            last_update_time: now,
            file_count: 0,
        }
    }

    /// Parse and validate the fixed 60-byte header.
    pub fn parse(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let signature = read_u32(bytes, 0);
        if signature != SIGNATURE && signature != SIGNATURE_LEGACY {
            return Err(LarkError::InvalidSignature { found: signature });
        }
        let format_version = read_u16(bytes, 4);
        if format_version != FORMAT_VERSION {
            return Err(LarkError::UnsupportedVersion {
                found: format_version,
            });
        }
        Ok(Self {
            signature,
            format_version,
            min_unpack_version: read_u16(bytes, 6),
            flags: read_u32(bytes, 8),
            block_size: read_u32(bytes, 12),
            default_level: read_u32(bytes, 16),
            creation_time: read_i64(bytes, 24),
            last_update_time: read_i64(bytes, 32),
            file_count: read_u32(bytes, 56),
        })
    }

    /// Serialize to the fixed 60-byte layout.
    ///
    /// The primary signature is always written, flag bits and the reserved
    /// regions are zeroed.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&SIGNATURE.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.min_unpack_version.to_le_bytes());
        // flags at 8..12 and reserved1 at 20..24 stay zero
        bytes[12..16].copy_from_slice(&self.block_size.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.default_level.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.creation_time.to_le_bytes());
        bytes[32..40].copy_from_slice(&self.last_update_time.to_le_bytes());
        // 16 reserved bytes at 40..56 stay zero
        bytes[56..60].copy_from_slice(&self.file_count.to_le_bytes());
        bytes
    }
}

/// One central directory record as read from disk, before validation.
#[derive(Debug, Clone)]
pub struct DirectoryRecord {
    /// Absolute payload offset.
    pub offset: i64,
    /// Uncompressed size.
    pub original_size: i64,
    /// Stored payload size.
    pub compressed_size: u32,
    /// CRC-32 of the uncompressed bytes.
    pub crc32: u32,
    /// Modification time as FILETIME.
    pub mtime: i64,
    /// Raw method tag.
    pub method: u8,
    /// Compression level.
    pub level: u8,
    /// Raw name bytes.
    pub name: Vec<u8>,
}

/// Parse a central directory that must span `buf` exactly.
///
/// Structural failures (bad signature, counts or lengths that run past the
/// buffer, trailing bytes) are reported as [`LarkError::DirectoryNotFound`]
/// so the tail scan can dismiss false-positive signature hits and keep
/// looking. Per-entry semantic validation happens in the engine, where the
/// entry index is known.
pub fn parse_directory(buf: &[u8]) -> Result<Vec<DirectoryRecord>> {
    if buf.len() < DIRECTORY_MIN_SIZE {
        return Err(LarkError::DirectoryNotFound);
    }
    let signature = read_u32(buf, 0);
    if signature != DIRECTORY_SIGNATURE && signature != DIRECTORY_SIGNATURE_LEGACY {
        return Err(LarkError::DirectoryNotFound);
    }
    let count = read_u32(buf, 4);
    let body = &buf[DIRECTORY_MIN_SIZE..];
    let maximum = (body.len() / DIRECTORY_RECORD_FIXED) as u32;
    if count > maximum {
        return Err(LarkError::InvalidFileCount {
            declared: count,
            maximum,
        });
    }

    let mut records = Vec::with_capacity(count as usize);
    let mut pos = 0usize;
    for _ in 0..count {
        if pos + DIRECTORY_RECORD_FIXED > body.len() {
            return Err(LarkError::DirectoryNotFound);
        }
        let name_len = read_u16(body, pos + 34) as usize;
        let end = pos + DIRECTORY_RECORD_FIXED + name_len;
        if end > body.len() {
            return Err(LarkError::DirectoryNotFound);
        }
        records.push(DirectoryRecord {
            offset: read_i64(body, pos),
            original_size: read_i64(body, pos + 8),
            compressed_size: read_u32(body, pos + 16),
            crc32: read_u32(body, pos + 20),
            mtime: read_i64(body, pos + 24),
            method: body[pos + 32],
            level: body[pos + 33],
            name: body[pos + DIRECTORY_RECORD_FIXED..end].to_vec(),
        });
        pos = end;
    }
    if pos != body.len() {
        return Err(LarkError::DirectoryNotFound);
    }
    Ok(records)
}

/// Serialize the central directory for the given entries, using the offsets
/// assigned by the current save pass.
pub fn write_directory(entries: &[Entry], offsets: &[i64]) -> Vec<u8> {
    debug_assert_eq!(entries.len(), offsets.len());
    let names: usize = entries.iter().map(|e| e.name_bytes().len()).sum();
    let mut buf =
        Vec::with_capacity(DIRECTORY_MIN_SIZE + entries.len() * DIRECTORY_RECORD_FIXED + names);
    buf.extend_from_slice(&DIRECTORY_SIGNATURE.to_le_bytes());
    buf.extend_from_slice(&(entries.len() as u32).to_le_bytes());
    for (entry, &offset) in entries.iter().zip(offsets) {
        buf.extend_from_slice(&offset.to_le_bytes());
        buf.extend_from_slice(&entry.original_size.to_le_bytes());
        buf.extend_from_slice(&entry.compressed_size.to_le_bytes());
        buf.extend_from_slice(&entry.crc32.to_le_bytes());
        buf.extend_from_slice(&entry.mtime.to_le_bytes());
        buf.push(entry.method.tag());
        buf.push(entry.level.value());
        buf.extend_from_slice(&(entry.name_bytes().len() as u16).to_le_bytes());
        buf.extend_from_slice(entry.name_bytes());
    }
    buf
}

#[inline]
fn read_u16(buf: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([buf[at], buf[at + 1]])
}

#[inline]
fn read_u32(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]])
}

#[inline]
fn read_i64(buf: &[u8], at: usize) -> i64 {
    i64::from_le_bytes([
        buf[at],
        buf[at + 1],
        buf[at + 2],
        buf[at + 3],
        buf[at + 4],
        buf[at + 5],
        buf[at + 6],
        buf[at + 7],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use lark_core::{Level, Method};

    #[test]
    fn test_header_roundtrip() {
        let header = Header::new(6);
        let bytes = header.to_bytes();
        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed.signature, SIGNATURE);
        assert_eq!(parsed.format_version, FORMAT_VERSION);
        assert_eq!(parsed.block_size, DEFAULT_BLOCK_SIZE);
        assert_eq!(parsed.default_level, 6);
        assert_eq!(parsed.creation_time, header.creation_time);
        assert_eq!(parsed.file_count, 0);
    }

    #[test]
    fn test_header_is_sixty_bytes() {
        assert_eq!(Header::new(0).to_bytes().len(), 60);
    }

    #[test]
    fn test_header_rejects_bad_signature() {
        let mut bytes = Header::new(0).to_bytes();
        bytes[0..4].copy_from_slice(&0x12345678u32.to_le_bytes());
        let err = Header::parse(&bytes).unwrap_err();
        assert!(matches!(err, LarkError::InvalidSignature { .. }));
    }

    #[test]
    fn test_header_accepts_legacy_signature() {
        let mut bytes = Header::new(0).to_bytes();
        bytes[0..4].copy_from_slice(&SIGNATURE_LEGACY.to_le_bytes());
        let parsed = Header::parse(&bytes).unwrap();
        assert_eq!(parsed.signature, SIGNATURE_LEGACY);
    }

    #[test]
    fn test_header_rejects_bad_version() {
        let mut bytes = Header::new(0).to_bytes();
        bytes[4..6].copy_from_slice(&0x0100u16.to_le_bytes());
        let err = Header::parse(&bytes).unwrap_err();
        assert!(matches!(err, LarkError::UnsupportedVersion { found: 0x0100 }));
    }

    #[test]
    fn test_header_zeroes_flags_on_write() {
        let mut header = Header::new(0);
        header.flags = 0xFFFF_FFFF;
        let bytes = header.to_bytes();
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_directory_roundtrip() {
        let entries = vec![
            Entry::pending(
                b"alpha.txt".to_vec(),
                100,
                42,
                0xDEADBEEF,
                12345,
                Method::Deflate,
                Level::new(5),
                0,
                vec![0; 42],
            ),
            Entry::pending(
                b"beta/gamma.bin".to_vec(),
                0,
                0,
                0,
                0,
                Method::Store,
                Level::NONE,
                0,
                Vec::new(),
            ),
        ];
        let offsets = vec![60, 102];
        let buf = write_directory(&entries, &offsets);
        let records = parse_directory(&buf).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].offset, 60);
        assert_eq!(records[0].original_size, 100);
        assert_eq!(records[0].compressed_size, 42);
        assert_eq!(records[0].crc32, 0xDEADBEEF);
        assert_eq!(records[0].name, b"alpha.txt");
        assert_eq!(records[1].offset, 102);
        assert_eq!(records[1].name, b"beta/gamma.bin");
    }

    #[test]
    fn test_directory_rejects_trailing_bytes() {
        let buf = write_directory(&[], &[]);
        let mut with_tail = buf.clone();
        with_tail.push(0);
        assert!(parse_directory(&buf).is_ok());
        assert!(parse_directory(&with_tail).is_err());
    }

    #[test]
    fn test_directory_rejects_absurd_count() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&DIRECTORY_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&1000u32.to_le_bytes());
        let err = parse_directory(&buf).unwrap_err();
        assert!(matches!(err, LarkError::InvalidFileCount { declared: 1000, .. }));
    }

    #[test]
    fn test_directory_accepts_legacy_signature() {
        let mut buf = write_directory(&[], &[]);
        buf[0..4].copy_from_slice(&DIRECTORY_SIGNATURE_LEGACY.to_le_bytes());
        assert!(parse_directory(&buf).is_ok());
    }
}
