//! The codec trait implemented by every compression algorithm.

use crate::error::Result;
use crate::method::Method;

/// A whole-buffer compressor/decompressor.
///
/// Codecs are stateless across invocations: each call starts from a fresh
/// dictionary and window, so entries never share compression state.
/// `decompress(compress(input), input.len())` must reproduce `input` exactly
/// for every byte sequence.
pub trait Codec {
    /// The method tag this codec implements.
    fn method(&self) -> Method;

    /// Compress `input` into a new buffer.
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Decompress `input`, producing at most `expected_len` bytes.
    ///
    /// `expected_len` is the uncompressed size declared by the archive
    /// entry. A stream that tries to produce more than this fails with an
    /// error rather than inflating without bound.
    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>>;
}
