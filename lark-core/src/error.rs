//! Error types for lark operations.
//!
//! All errors carry a stable numeric code for programmatic handling:
//!
//! | Range | Family |
//! |---|---|
//! | 1001-1007 | container format violations detected on open |
//! | 2001-2004 | I/O and lookup failures |
//! | 3001-3004 | entry payload violations |
//! | 4001      | application state errors |
//! | 5001      | codec failures during compress or decompress |

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for lark operations.
#[derive(Debug, Error)]
pub enum LarkError {
    /// I/O error from an underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive header signature is not one of the accepted values.
    #[error("invalid archive signature: {found:#010x}")]
    InvalidSignature {
        /// The signature value found in the header.
        found: u32,
    },

    /// The archive format version is not supported.
    #[error("unsupported format version: {found:#06x}")]
    UnsupportedVersion {
        /// The version value found in the header.
        found: u16,
    },

    /// The file is too small to hold a header and a directory.
    #[error("archive too small: {size} bytes")]
    ArchiveTooSmall {
        /// Actual file size in bytes.
        size: u64,
    },

    /// No central directory signature was found in the tail scan.
    #[error("central directory not found")]
    DirectoryNotFound,

    /// The directory entry count cannot fit in the directory bytes.
    #[error("invalid file count: {declared} entries declared, at most {maximum} possible")]
    InvalidFileCount {
        /// Entry count declared by the directory.
        declared: u32,
        /// Upper bound derived from the directory length.
        maximum: u32,
    },

    /// An entry name is empty or longer than the 260-byte limit.
    #[error("invalid file name: {length} bytes")]
    InvalidFileName {
        /// Encoded name length in bytes.
        length: usize,
    },

    /// An entry payload range falls outside the data area or overlaps another.
    #[error("invalid file offset for entry {index}")]
    InvalidFileOffset {
        /// Index of the offending directory entry.
        index: usize,
    },

    /// CRC-32 of the decompressed bytes does not match the stored value.
    #[error("CRC-32 mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    Crc32Mismatch {
        /// CRC stored in the directory.
        expected: u32,
        /// CRC computed over the extracted bytes.
        computed: u32,
    },

    /// An entry has neither an in-memory payload nor a source file to copy from.
    #[error("no compressed data for entry \"{name}\"")]
    NoCompressedData {
        /// Name of the entry.
        name: String,
    },

    /// The compression method tag is outside the known range.
    #[error("invalid compression method: {method}")]
    InvalidCompressionMethod {
        /// The unknown method tag.
        method: u8,
    },

    /// Entry sizes are negative or violate the expansion guard.
    #[error("invalid sizes for entry {index}: original {original}, compressed {compressed}")]
    InvalidSizes {
        /// Index of the offending entry.
        index: usize,
        /// Declared uncompressed size.
        original: i64,
        /// Declared compressed size.
        compressed: u32,
    },

    /// A named entry does not exist in the archive.
    #[error("file not found in archive: {name}")]
    FileNotFound {
        /// The requested entry name.
        name: String,
    },

    /// The archive file itself does not exist or cannot be replaced.
    #[error("archive not found: {path}")]
    ArchiveNotFound {
        /// Path of the archive file.
        path: PathBuf,
    },

    /// A source file to be added does not exist.
    #[error("source not found: {path}")]
    SourceNotFound {
        /// Path of the missing source.
        path: PathBuf,
    },

    /// Enumerating a directory for recursive add failed.
    #[error("enumeration failed: {path}")]
    EnumerationFailed {
        /// Path of the directory that could not be enumerated.
        path: PathBuf,
    },

    /// No archive path has been set for a save operation.
    #[error("archive name not set")]
    ArchiveNameNotSet,

    /// Codec-specific failure during compress or decompress.
    #[error("compression failure: {message}")]
    Compression {
        /// Description of the failure.
        message: String,
    },

    /// An LZ back-reference points before the start of the window history.
    #[error("invalid back-reference distance {distance}, only {available} bytes of history")]
    InvalidDistance {
        /// The offending distance.
        distance: usize,
        /// Bytes of history currently available.
        available: usize,
    },

    /// A decoder tried to produce more output than the declared size allows.
    #[error("decompressed output exceeds the declared size of {limit} bytes")]
    OutputOverrun {
        /// The enforced output limit in bytes.
        limit: usize,
    },
}

/// Result type alias for lark operations.
pub type Result<T> = std::result::Result<T, LarkError>;

impl LarkError {
    /// Stable numeric code for this error, preserved across the core.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidSignature { .. } => 1001,
            Self::UnsupportedVersion { .. } => 1002,
            Self::ArchiveTooSmall { .. } => 1003,
            Self::DirectoryNotFound => 1004,
            Self::InvalidFileCount { .. } => 1005,
            Self::InvalidFileName { .. } => 1006,
            Self::InvalidFileOffset { .. } => 1007,
            Self::Io(_) | Self::FileNotFound { .. } => 2001,
            Self::ArchiveNotFound { .. } => 2002,
            Self::SourceNotFound { .. } => 2003,
            Self::EnumerationFailed { .. } => 2004,
            Self::Crc32Mismatch { .. } => 3001,
            Self::NoCompressedData { .. } => 3002,
            Self::InvalidCompressionMethod { .. } => 3003,
            Self::InvalidSizes { .. } => 3004,
            Self::ArchiveNameNotSet => 4001,
            Self::Compression { .. }
            | Self::InvalidDistance { .. }
            | Self::OutputOverrun { .. } => 5001,
        }
    }

    /// Create a codec failure error.
    pub fn compression(message: impl Into<String>) -> Self {
        Self::Compression {
            message: message.into(),
        }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, available: usize) -> Self {
        Self::InvalidDistance {
            distance,
            available,
        }
    }

    /// Create a CRC mismatch error.
    pub fn crc_mismatch(expected: u32, computed: u32) -> Self {
        Self::Crc32Mismatch { expected, computed }
    }

    /// Create a file-not-found error for a named entry.
    pub fn file_not_found(name: impl Into<String>) -> Self {
        Self::FileNotFound { name: name.into() }
    }
}
