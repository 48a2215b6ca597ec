//! DEFLATE codec (method 3): thin binding over a zlib stream.
//!
//! The payload is an RFC 1950 zlib stream (2-byte header, RFC 1951 deflate
//! body, Adler-32 trailer) produced and consumed by `flate2`. The 0-9
//! archive level maps onto the encoder's effort settings: 0 stores, 1 is
//! fastest, 2-6 use the balanced default and 7-9 the maximum.

use flate2::write::ZlibEncoder;
use flate2::{read::ZlibDecoder, Compression};
use lark_core::{Codec, LarkError, Level, Method, Result};
use std::io::{Read, Write};

/// DEFLATE codec carrying its compression level.
#[derive(Debug)]
pub struct DeflateCodec {
    level: Level,
}

impl DeflateCodec {
    /// Create a codec for the given archive level.
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    fn effort(&self) -> Compression {
        match self.level.value() {
            0 => Compression::none(),
            1 => Compression::new(1),
            2..=6 => Compression::new(6),
            _ => Compression::new(9),
        }
    }
}

impl Default for DeflateCodec {
    fn default() -> Self {
        Self::new(Level::DEFAULT)
    }
}

impl Codec for DeflateCodec {
    fn method(&self) -> Method {
        Method::Deflate
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(input.len() / 2 + 64),
            self.effort(),
        );
        encoder.write_all(input)?;
        Ok(encoder.finish()?)
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(input);
        let mut output = Vec::with_capacity(expected_len.min(1 << 20));
        (&mut decoder)
            .take(expected_len as u64)
            .read_to_end(&mut output)
            .map_err(|e| LarkError::compression(format!("zlib stream: {}", e)))?;

        // Anything left in the stream means the declared size was a lie
        let mut probe = [0u8; 1];
        match decoder.read(&mut probe) {
            Ok(0) => Ok(output),
            Ok(_) => Err(LarkError::OutputOverrun {
                limit: expected_len,
            }),
            Err(e) => Err(LarkError::compression(format!("zlib stream: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(level: Level, data: &[u8]) {
        let codec = DeflateCodec::new(level);
        let packed = codec.compress(data).unwrap();
        let unpacked = codec.decompress(&packed, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn test_roundtrip_all_levels() {
        let data = b"deflate deflate deflate, a stream with some repetition in it";
        for level in 0..=9 {
            roundtrip(Level::new(level), data);
        }
    }

    #[test]
    fn test_empty() {
        roundtrip(Level::DEFAULT, b"");
    }

    #[test]
    fn test_zlib_wrapper_present() {
        // 0x78 is the zlib CMF byte for deflate with a 32 KiB window
        let codec = DeflateCodec::default();
        let packed = codec.compress(b"wrapped").unwrap();
        assert_eq!(packed[0], 0x78);
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(DeflateCodec::new(Level::new(0)).effort(), Compression::none());
        assert_eq!(DeflateCodec::new(Level::new(1)).effort(), Compression::new(1));
        assert_eq!(DeflateCodec::new(Level::new(4)).effort(), Compression::new(6));
        assert_eq!(DeflateCodec::new(Level::new(9)).effort(), Compression::new(9));
    }

    #[test]
    fn test_overrun_rejected() {
        let codec = DeflateCodec::default();
        let packed = codec.compress(&[b'd'; 4096]).unwrap();
        let err = codec.decompress(&packed, 100).unwrap_err();
        assert!(matches!(err, LarkError::OutputOverrun { .. }));
    }

    #[test]
    fn test_corrupt_stream_rejected() {
        let codec = DeflateCodec::default();
        assert!(codec.decompress(&[0x00, 0x11, 0x22, 0x33], 64).is_err());
    }
}
