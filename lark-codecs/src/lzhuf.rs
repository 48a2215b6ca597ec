//! LZHUF codec (method 2).
//!
//! Two stages: an LZSS dictionary pass over a 4 KiB window feeding the
//! adaptive Huffman coder of [`crate::adaptive`]. Literals are coded as
//! their own symbols; a match is the [`SYM_MATCH`] symbol followed by 12
//! raw bits of backward distance (1..=4095) and 4 raw bits of
//! `length - 3` (matches span 3..=18 bytes). [`SYM_END`] closes the
//! stream and the bit writer flushes with zero padding.
//!
//! The dictionary search is a bounded backward scan over the last
//! `min(position, 512)` bytes. Any search strategy works as long as the
//! emitted pair satisfies the window contract; the decoder only ever sees
//! distance and length.

use crate::adaptive::{AdaptiveHuffman, SYM_END, SYM_MATCH};
use lark_core::{BitReader, BitWriter, Codec, Method, OutputWindow, Result};

const WINDOW_SIZE: usize = 4096;
const MAX_DISTANCE: usize = 4095;
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 18;
const SEARCH_LIMIT: usize = 512;

const DISTANCE_BITS: u8 = 12;
const LENGTH_BITS: u8 = 4;

/// LZSS-plus-adaptive-Huffman codec.
#[derive(Debug, Default)]
pub struct LzhufCodec;

impl Codec for LzhufCodec {
    fn method(&self) -> Method {
        Method::Lzhuf
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut coder = AdaptiveHuffman::new();
        let mut writer = BitWriter::new(Vec::with_capacity(input.len() / 2 + 16));

        let mut pos = 0;
        while pos < input.len() {
            match find_match(input, pos) {
                Some((distance, length)) => {
                    coder.encode_symbol(SYM_MATCH, &mut writer)?;
                    writer.write_bits(distance as u32, DISTANCE_BITS)?;
                    writer.write_bits((length - MIN_MATCH) as u32, LENGTH_BITS)?;
                    coder.update(SYM_MATCH);
                    pos += length;
                }
                None => {
                    let symbol = input[pos] as u16;
                    coder.encode_symbol(symbol, &mut writer)?;
                    coder.update(symbol);
                    pos += 1;
                }
            }
        }
        coder.encode_symbol(SYM_END, &mut writer)?;
        writer.into_inner()
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut coder = AdaptiveHuffman::new();
        let mut reader = BitReader::new(input);
        let mut window = OutputWindow::new(WINDOW_SIZE, expected_len);

        loop {
            let symbol = coder.decode_symbol(&mut reader)?;
            if symbol == SYM_END {
                break;
            }
            if symbol == SYM_MATCH {
                let distance = reader.read_bits(DISTANCE_BITS)? as usize;
                let length = reader.read_bits(LENGTH_BITS)? as usize + MIN_MATCH;
                window.copy_match(distance, length)?;
            } else {
                window.push_literal(symbol as u8)?;
            }
            coder.update(symbol);
        }
        Ok(window.into_output())
    }
}

/// Bounded brute-force search for the longest match ending before `pos`.
fn find_match(data: &[u8], pos: usize) -> Option<(usize, usize)> {
    let remaining = data.len() - pos;
    if remaining < MIN_MATCH {
        return None;
    }
    let max_len = remaining.min(MAX_MATCH);
    let start = pos.saturating_sub(SEARCH_LIMIT.min(MAX_DISTANCE));

    let mut best_len = 0;
    let mut best_dist = 0;
    for cand in (start..pos).rev() {
        if data[cand] != data[pos] {
            continue;
        }
        let mut len = 1;
        while len < max_len && data[cand + len] == data[pos + len] {
            len += 1;
        }
        if len > best_len {
            best_len = len;
            best_dist = pos - cand;
            if len == max_len {
                break;
            }
        }
    }

    if best_len >= MIN_MATCH {
        Some((best_dist, best_len))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lark_core::LarkError;

    fn roundtrip(data: &[u8]) {
        let codec = LzhufCodec;
        let packed = codec.compress(data).unwrap();
        let unpacked = codec.decompress(&packed, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn test_empty() {
        let codec = LzhufCodec;
        let packed = codec.compress(b"").unwrap();
        // Just the end symbol, padded to whole bytes
        assert!(!packed.is_empty() && packed.len() <= 2);
        assert!(codec.decompress(&packed, 0).unwrap().is_empty());
    }

    #[test]
    fn test_single_byte() {
        roundtrip(b"Z");
    }

    #[test]
    fn test_roundtrip_sentence() {
        roundtrip(b"I am Sam. Sam I am. I do not like this Sam I am.\n");
    }

    #[test]
    fn test_roundtrip_high_bytes() {
        // 254 and 255 are ordinary literal symbols in the widened alphabet
        roundtrip(&[0xFE, 0xFF, 0xFE, 0xFF, 0xFD, 0xFF, 0xFE]);
        let data: Vec<u8> = (0..=255u8).rev().cycle().take(2000).collect();
        roundtrip(&data);
    }

    #[test]
    fn test_roundtrip_repetitive_compresses() {
        let data = b"squeamish ossifrage ".repeat(400);
        let codec = LzhufCodec;
        let packed = codec.compress(&data).unwrap();
        assert!(packed.len() < data.len() / 2);
        assert_eq!(codec.decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_crosses_rebuild_boundary() {
        // More than 4096 literals forces at least one tree rebuild on both
        // sides of the stream
        let data: Vec<u8> = (0..12_000u32).map(|i| (i * 17 % 256) as u8).collect();
        roundtrip(&data);
    }

    #[test]
    fn test_match_fields_roundtrip() {
        // Repeats at distances near the search horizon
        let mut data = vec![0u8; 512];
        for (i, b) in data.iter_mut().enumerate() {
            *b = (i % 13) as u8;
        }
        let mut doubled = data.clone();
        doubled.extend_from_slice(&data);
        roundtrip(&doubled);
    }

    #[test]
    fn test_overrun_rejected() {
        let codec = LzhufCodec;
        let packed = codec.compress(&[b'h'; 256]).unwrap();
        let err = codec.decompress(&packed, 16).unwrap_err();
        assert!(matches!(
            err,
            LarkError::OutputOverrun { .. } | LarkError::InvalidDistance { .. }
        ));
    }

    #[test]
    fn test_zero_distance_is_invalid() {
        // A decoder fed a match with distance 0 must error, not loop
        let mut coder = AdaptiveHuffman::new();
        let mut writer = lark_core::BitWriter::new(Vec::new());
        coder.encode_symbol(SYM_MATCH, &mut writer).unwrap();
        writer.write_bits(0, DISTANCE_BITS).unwrap();
        writer.write_bits(0, LENGTH_BITS).unwrap();
        coder.encode_symbol(SYM_END, &mut writer).unwrap();
        let stream = writer.into_inner().unwrap();

        let codec = LzhufCodec;
        let err = codec.decompress(&stream, 64).unwrap_err();
        assert!(matches!(err, LarkError::InvalidDistance { .. }));
    }
}
