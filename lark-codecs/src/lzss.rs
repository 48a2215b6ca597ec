//! LZSS codec (method 1).
//!
//! Byte-oriented LZSS over a 4 KiB window. The compressed stream is a
//! sequence of blocks, each covering up to 64 KiB of input and preceded by
//! its compressed byte length as a little-endian u32. Blocks are
//! self-contained: the window and the match index restart at each block
//! boundary.
//!
//! Inside a block every token starts with a dispatch byte:
//!
//! - any byte other than `0xFF` is a literal;
//! - `0xFF 0xFE` is the escape for a literal `0xFF`;
//! - `0xFF lo hi` is a match, where `lo` holds the low 8 bits of the
//!   backward distance and `hi` packs the high 4 distance bits in its low
//!   nibble and `length - 3` in its high nibble.
//!
//! The 4-bit length field limits matches to 3..=18 bytes; the 12-bit
//! distance field limits distances to 1..=4095 (zero is invalid). The
//! encoder never emits a distance whose low byte is `0xFE`, since such a
//! token would read back as the escape pair.

use crate::chain::ChainFinder;
use lark_core::{Codec, LarkError, Method, OutputWindow, Result};

const WINDOW_SIZE: usize = 4096;
const MAX_DISTANCE: usize = 4095;
const MIN_MATCH: usize = 3;
const MAX_MATCH: usize = 18;
const MAX_CHAIN: usize = 512;
const BLOCK_SIZE: usize = 64 * 1024;

const FLAG: u8 = 0xFF;
const ESCAPE: u8 = 0xFE;

/// LZSS codec with byte-flag framing and length-prefixed blocks.
#[derive(Debug, Default)]
pub struct LzssCodec;

impl Codec for LzssCodec {
    fn method(&self) -> Method {
        Method::Lzss
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2 + 16);
        for block in input.chunks(BLOCK_SIZE) {
            let encoded = encode_block(block);
            output.extend_from_slice(&(encoded.len() as u32).to_le_bytes());
            output.extend_from_slice(&encoded);
        }
        Ok(output)
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut window = OutputWindow::new(WINDOW_SIZE, expected_len);
        let mut pos = 0usize;
        while pos < input.len() {
            if pos + 4 > input.len() {
                return Err(LarkError::compression("truncated LZSS block header"));
            }
            let len = u32::from_le_bytes([
                input[pos],
                input[pos + 1],
                input[pos + 2],
                input[pos + 3],
            ]) as usize;
            pos += 4;
            if pos + len > input.len() {
                return Err(LarkError::compression("LZSS block exceeds input"));
            }
            decode_block(&input[pos..pos + len], &mut window)?;
            window.reset_history();
            pos += len;
        }
        Ok(window.into_output())
    }
}

fn encode_block(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    let mut finder = ChainFinder::new(data.len(), MAX_DISTANCE, MIN_MATCH, MAX_MATCH, MAX_CHAIN)
        .forbid_distance_low_byte(ESCAPE);

    let mut pos = 0;
    while pos < data.len() {
        if let Some(m) = finder.find(data, pos) {
            out.push(FLAG);
            out.push((m.distance & 0xFF) as u8);
            out.push(((m.distance >> 8) as u8 & 0x0F) | (((m.length - MIN_MATCH) as u8) << 4));
            for i in 0..m.length {
                finder.insert(data, pos + i);
            }
            pos += m.length;
        } else {
            let byte = data[pos];
            out.push(byte);
            if byte == FLAG {
                out.push(ESCAPE);
            }
            finder.insert(data, pos);
            pos += 1;
        }
    }
    out
}

fn decode_block(block: &[u8], window: &mut OutputWindow) -> Result<()> {
    let mut i = 0usize;
    while i < block.len() {
        let byte = block[i];
        if byte != FLAG {
            window.push_literal(byte)?;
            i += 1;
            continue;
        }
        if i + 1 >= block.len() {
            return Err(LarkError::compression("truncated LZSS token"));
        }
        if block[i + 1] == ESCAPE {
            window.push_literal(FLAG)?;
            i += 2;
            continue;
        }
        if i + 2 >= block.len() {
            return Err(LarkError::compression("truncated LZSS match token"));
        }
        let distance = block[i + 1] as usize | ((block[i + 2] & 0x0F) as usize) << 8;
        let length = (block[i + 2] >> 4) as usize + MIN_MATCH;
        window.copy_match(distance, length)?;
        i += 3;
    }
    Ok(())
}
