//! # Lark Core
//!
//! Core components for the lark archive library.
//!
//! This crate provides the fundamental building blocks the container and the
//! codecs are built on:
//!
//! - [`bitstream`]: MSB-first bit-level I/O for variable-length codes
//! - [`window`]: sliding-window buffers for LZ back-references
//! - [`crc`]: CRC-32 and Adler-32 checksums
//! - [`filetime`]: Windows FILETIME timestamp conversion
//! - [`method`]: compression method tags and levels
//! - [`codec`]: the codec trait every compressor implements
//! - [`error`]: error types with the numeric code taxonomy
//!
//! ## Architecture
//!
//! Lark is a layered stack:
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │ L4: lark-cli                                   │
//! │     command surface over the public API        │
//! ├────────────────────────────────────────────────┤
//! │ L3: lark-archive                               │
//! │     container header, central directory,       │
//! │     entry lifecycle, atomic save               │
//! ├────────────────────────────────────────────────┤
//! │ L2: lark-codecs                                │
//! │     Store, LZSS, LZHUF, DEFLATE, LZW, LZ77     │
//! ├────────────────────────────────────────────────┤
//! │ L1: lark-core (this crate)                     │
//! │     BitReader/BitWriter, Window, CRC, errors   │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use lark_core::bitstream::{BitReader, BitWriter};
//! use lark_core::crc::Crc32;
//! use std::io::Cursor;
//!
//! let mut out = Vec::new();
//! {
//!     let mut writer = BitWriter::new(&mut out);
//!     writer.write_bits(0b1011, 4).unwrap();
//!     writer.flush().unwrap();
//! }
//! let mut reader = BitReader::new(Cursor::new(&out));
//! assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
//!
//! assert_eq!(Crc32::compute(b"Hello, World!"), 0xEC4AC3D0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod bitstream;
pub mod codec;
pub mod crc;
pub mod error;
pub mod filetime;
pub mod method;
pub mod window;

// Re-exports for convenience
pub use bitstream::{BitReader, BitWriter};
pub use codec::Codec;
pub use crc::{Adler32, Crc32};
pub use error::{LarkError, Result};
pub use method::{Level, Method};
pub use window::{OutputWindow, Window};
