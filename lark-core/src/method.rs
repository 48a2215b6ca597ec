//! Compression method tags and levels.

use std::fmt;

/// Compression method of an archive entry.
///
/// The discriminant is the on-disk tag stored in the central directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Method {
    /// No compression, payload stored verbatim.
    Store = 0,
    /// LZSS with a 4 KiB window and byte-flag framing.
    Lzss = 1,
    /// LZSS front-end with adaptive Huffman entropy coding.
    Lzhuf = 2,
    /// DEFLATE in a zlib wrapper.
    #[default]
    Deflate = 3,
    /// LZW with 9-16 bit variable-width codes.
    Lzw = 4,
    /// LZ77 with a 32 KiB window and bit-flag framing.
    Lz77 = 5,
}

impl Method {
    /// All methods in tag order.
    pub const ALL: [Method; 6] = [
        Method::Store,
        Method::Lzss,
        Method::Lzhuf,
        Method::Deflate,
        Method::Lzw,
        Method::Lz77,
    ];

    /// Decode an on-disk tag, if known.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Store),
            1 => Some(Self::Lzss),
            2 => Some(Self::Lzhuf),
            3 => Some(Self::Deflate),
            4 => Some(Self::Lzw),
            5 => Some(Self::Lz77),
            _ => None,
        }
    }

    /// The on-disk tag for this method.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Human-readable method name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "Store",
            Self::Lzss => "LZSS",
            Self::Lzhuf => "LZHUF",
            Self::Deflate => "DEFLATE",
            Self::Lzw => "LZW",
            Self::Lz77 => "LZ77",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Compression level, clamped to 0-9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Level(u8);

impl Level {
    /// No compression effort.
    pub const NONE: Self = Self(0);
    /// Fastest compression.
    pub const FAST: Self = Self(1);
    /// Balanced default.
    pub const DEFAULT: Self = Self(6);
    /// Best compression, slowest.
    pub const BEST: Self = Self(9);

    /// Create a level, clamping to the 0-9 range.
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    /// The numeric level value.
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<u8> for Level {
    fn from(level: u8) -> Self {
        Self::new(level)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for method in Method::ALL {
            assert_eq!(Method::from_tag(method.tag()), Some(method));
        }
        assert_eq!(Method::from_tag(6), None);
        assert_eq!(Method::from_tag(255), None);
    }

    #[test]
    fn test_tags_are_stable() {
        assert_eq!(Method::Store.tag(), 0);
        assert_eq!(Method::Lzss.tag(), 1);
        assert_eq!(Method::Lzhuf.tag(), 2);
        assert_eq!(Method::Deflate.tag(), 3);
        assert_eq!(Method::Lzw.tag(), 4);
        assert_eq!(Method::Lz77.tag(), 5);
    }

    #[test]
    fn test_level_clamps() {
        assert_eq!(Level::new(100).value(), 9);
        assert_eq!(Level::from(4).value(), 4);
        assert_eq!(Level::default().value(), 6);
    }

    #[test]
    fn test_display() {
        assert_eq!(Method::Lzhuf.to_string(), "LZHUF");
        assert_eq!(Level::BEST.to_string(), "9");
    }
}
