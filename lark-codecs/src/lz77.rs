//! LZ77 codec (method 5).
//!
//! 32 KiB window with bit-flag framing: a flag byte precedes every group of
//! up to 8 tokens, bit *i* (LSB-first) marking token *i* as a match. A match
//! token is 3 bytes: the backward distance as a little-endian u16
//! (1..=32768) followed by `length - 2` in one byte, bounding match lengths
//! to 2..=257. A trailing partial group keeps its flag byte only when at
//! least one token follows.
//!
//! The decoder tolerates out-of-range distances by clamping them to
//! `min(1, history)`; forward progress is preserved and the entry CRC
//! catches any real damage.

use crate::chain::ChainFinder;
use lark_core::{Codec, LarkError, Method, OutputWindow, Result};
use log::warn;

const WINDOW_SIZE: usize = 32768;
const MIN_MATCH: usize = 2;
/// Shortest match worth a 3-byte token plus a flag bit.
const EMIT_MIN: usize = 3;
const MAX_MATCH: usize = 257;
const MAX_CHAIN: usize = 512;

/// LZ77 codec with per-8-token flag bytes.
#[derive(Debug, Default)]
pub struct Lz77Codec;

impl Codec for Lz77Codec {
    fn method(&self) -> Method {
        Method::Lz77
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2 + 16);
        let mut finder = ChainFinder::new(input.len(), WINDOW_SIZE, EMIT_MIN, MAX_MATCH, MAX_CHAIN);

        fn flush_group(flags: &mut u8, ntokens: &mut u8, group: &mut Vec<u8>, out: &mut Vec<u8>) {
            if *ntokens > 0 {
                out.push(*flags);
                out.extend_from_slice(group);
            }
            *flags = 0;
            *ntokens = 0;
            group.clear();
        }

        let mut flags = 0u8;
        let mut ntokens = 0u8;
        let mut group: Vec<u8> = Vec::with_capacity(8 * 3);

        let mut pos = 0;
        while pos < input.len() {
            if let Some(m) = finder.find(input, pos) {
                flags |= 1 << ntokens;
                group.extend_from_slice(&(m.distance as u16).to_le_bytes());
                group.push((m.length - MIN_MATCH) as u8);
                for i in 0..m.length {
                    finder.insert(input, pos + i);
                }
                pos += m.length;
            } else {
                group.push(input[pos]);
                finder.insert(input, pos);
                pos += 1;
            }
            ntokens += 1;
            if ntokens == 8 {
                flush_group(&mut flags, &mut ntokens, &mut group, &mut output);
            }
        }
        flush_group(&mut flags, &mut ntokens, &mut group, &mut output);

        Ok(output)
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut window = OutputWindow::new(WINDOW_SIZE, expected_len);
        let mut i = 0usize;
        while i < input.len() {
            let flags = input[i];
            i += 1;
            for bit in 0..8 {
                if i >= input.len() {
                    break;
                }
                if flags >> bit & 1 == 1 {
                    if i + 3 > input.len() {
                        return Err(LarkError::compression("truncated LZ77 match token"));
                    }
                    let distance = u16::from_le_bytes([input[i], input[i + 1]]) as usize;
                    let length = input[i + 2] as usize + MIN_MATCH;
                    i += 3;

                    let history = window.history_len();
                    let clamped = if distance == 0 || distance > history {
                        warn!(
                            "clamping out-of-range LZ77 distance {} with {} bytes of history",
                            distance, history
                        );
                        history.min(1)
                    } else {
                        distance
                    };
                    if clamped == 0 {
                        for _ in 0..length {
                            window.push_literal(0)?;
                        }
                    } else {
                        window.copy_match(clamped, length)?;
                    }
                } else {
                    window.push_literal(input[i])?;
                    i += 1;
                }
            }
        }
        Ok(window.into_output())
    }
}
