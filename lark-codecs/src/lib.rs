//! # Lark Codecs
//!
//! The six streaming codecs of the lark container, behind the
//! [`Codec`](lark_core::Codec) trait:
//!
//! | Tag | Codec | Shape |
//! |---|---|---|
//! | 0 | [`StoreCodec`] | identity copy |
//! | 1 | [`LzssCodec`] | 4 KiB window, byte-flag framing, length-prefixed blocks |
//! | 2 | [`LzhufCodec`] | 4 KiB LZSS front-end + adaptive Huffman entropy stage |
//! | 3 | [`DeflateCodec`] | zlib stream (RFC 1950) via `flate2` |
//! | 4 | [`LzwCodec`] | 9-16 bit variable-width codes, MSB-first |
//! | 5 | [`Lz77Codec`] | 32 KiB window, bit-flag framing per 8 tokens |
//!
//! Every codec is stateless across entries and satisfies the round-trip law
//! `decompress(compress(s), s.len()) == s` for arbitrary byte sequences.
//! Decompression is bounded by the declared uncompressed size; streams that
//! try to produce more fail instead of inflating without limit.
//!
//! ## Example
//!
//! ```rust
//! use lark_codecs::for_method;
//! use lark_core::{Level, Method};
//!
//! let codec = for_method(Method::Lzss, Level::DEFAULT);
//! let data = b"abracadabra abracadabra abracadabra";
//! let packed = codec.compress(data).unwrap();
//! let unpacked = codec.decompress(&packed, data.len()).unwrap();
//! assert_eq!(unpacked, data);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod adaptive;
mod chain;
mod deflate;
mod lz77;
mod lzhuf;
mod lzss;
mod lzw;
mod store;

pub use deflate::DeflateCodec;
pub use lz77::Lz77Codec;
pub use lzhuf::LzhufCodec;
pub use lzss::LzssCodec;
pub use lzw::LzwCodec;
pub use store::StoreCodec;

use lark_core::{Codec, Level, Method};

/// Look up the codec for a method tag.
///
/// This is the plug-board between the on-disk method byte and the codec
/// implementations; `level` only influences methods that expose an effort
/// knob (DEFLATE).
pub fn for_method(method: Method, level: Level) -> Box<dyn Codec> {
    match method {
        Method::Store => Box::new(StoreCodec),
        Method::Lzss => Box::new(LzssCodec),
        Method::Lzhuf => Box::new(LzhufCodec),
        Method::Deflate => Box::new(DeflateCodec::new(level)),
        Method::Lzw => Box::new(LzwCodec),
        Method::Lz77 => Box::new(Lz77Codec),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_method_covers_all_tags() {
        for method in Method::ALL {
            let codec = for_method(method, Level::DEFAULT);
            assert_eq!(codec.method(), method);
        }
    }
}
