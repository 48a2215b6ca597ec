//! LZW codec (method 4).
//!
//! Variable-width codes, 9 to 16 bits, MSB-first. The dictionary is seeded
//! with the 256 single-byte strings; code 256 is CLEAR (reset dictionary
//! and width) and 257 is END. The encoder widens after an insertion once
//! `next_code` no longer fits the current width; the decoder, which inserts
//! one entry behind the encoder, widens one insertion earlier so both sides
//! switch width at the same position in the code stream. When the 16-bit
//! code space fills, the encoder emits CLEAR and restarts.
//!
//! Before writing END the encoder advances its code counter once without
//! storing an entry; the decoder has performed exactly that many insertions
//! by the time it reads END, so the closing code is read at the width it
//! was written.

use lark_core::{BitReader, BitWriter, Codec, LarkError, Method, Result};
use std::collections::HashMap;

const MIN_WIDTH: u8 = 9;
const MAX_WIDTH: u8 = 16;
const CODE_CLEAR: u16 = 256;
const CODE_END: u16 = 257;
const FIRST_CODE: u32 = 258;
const MAX_CODE: u32 = u16::MAX as u32;

/// LZW codec with 9-16 bit variable-width codes.
#[derive(Debug, Default)]
pub struct LzwCodec;

impl Codec for LzwCodec {
    fn method(&self) -> Method {
        Method::Lzw
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut writer = BitWriter::new(Vec::with_capacity(input.len() / 2 + 16));
        // (prefix code, extension byte) -> code
        let mut table: HashMap<(u16, u8), u16> = HashMap::new();
        let mut next_code: u32 = FIRST_CODE;
        let mut width: u8 = MIN_WIDTH;
        let mut current: Option<u16> = None;

        for &byte in input {
            current = match current {
                None => Some(byte as u16),
                Some(prefix) => {
                    if let Some(&code) = table.get(&(prefix, byte)) {
                        Some(code)
                    } else {
                        writer.write_bits(prefix as u32, width)?;
                        if next_code <= MAX_CODE {
                            table.insert((prefix, byte), next_code as u16);
                            next_code += 1;
                            if next_code > (1u32 << width) - 1 && width < MAX_WIDTH {
                                width += 1;
                            }
                        } else {
                            writer.write_bits(CODE_CLEAR as u32, width)?;
                            table.clear();
                            next_code = FIRST_CODE;
                            width = MIN_WIDTH;
                        }
                        Some(byte as u16)
                    }
                }
            };
        }

        if let Some(prefix) = current {
            writer.write_bits(prefix as u32, width)?;
            // Counter-only insertion: the decoder inserts an entry for this
            // final code, so the END width must follow the same schedule.
            if next_code <= MAX_CODE {
                next_code += 1;
                if next_code > (1u32 << width) - 1 && width < MAX_WIDTH {
                    width += 1;
                }
            }
        }
        writer.write_bits(CODE_END as u32, width)?;
        writer.into_inner()
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut reader = BitReader::new(input);
        let mut output = Vec::with_capacity(expected_len.min(1 << 20));

        let mut table: Vec<Vec<u8>> = seed_table();
        let mut next_code: u32 = FIRST_CODE;
        let mut width: u8 = MIN_WIDTH;
        let mut prev: Option<u16> = None;

        loop {
            let code = reader.read_bits(width)?;
            if code == CODE_CLEAR as u32 {
                table = seed_table();
                next_code = FIRST_CODE;
                width = MIN_WIDTH;
                prev = None;
                continue;
            }
            if code == CODE_END as u32 {
                break;
            }

            let entry: Vec<u8> = if code < 256 {
                vec![code as u8]
            } else if code >= FIRST_CODE && code < next_code {
                table[code as usize].clone()
            } else if code == next_code && next_code <= MAX_CODE {
                // The one-code-ahead case: the entry is prev + prev[0]
                let p = prev.ok_or_else(|| {
                    LarkError::compression("LZW stream opens with an unassigned code")
                })?;
                let prev_string = &table[p as usize];
                let mut string = prev_string.clone();
                string.push(prev_string[0]);
                string
            } else {
                return Err(LarkError::compression(format!("invalid LZW code {}", code)));
            };

            if output.len() + entry.len() > expected_len {
                return Err(LarkError::OutputOverrun {
                    limit: expected_len,
                });
            }
            output.extend_from_slice(&entry);

            if let Some(p) = prev {
                if next_code <= MAX_CODE {
                    let mut string = table[p as usize].clone();
                    string.push(entry[0]);
                    table.push(string);
                    next_code += 1;
                    // One insertion earlier than the encoder, compensating
                    // for the decoder's one-entry lag
                    if next_code >= (1u32 << width) - 1 && width < MAX_WIDTH {
                        width += 1;
                    }
                }
            }
            prev = Some(code as u16);
        }

        Ok(output)
    }
}

fn seed_table() -> Vec<Vec<u8>> {
    let mut table: Vec<Vec<u8>> = (0..=255u8).map(|b| vec![b]).collect();
    table.push(Vec::new()); // CLEAR
    table.push(Vec::new()); // END
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(data: &[u8]) {
        let codec = LzwCodec;
        let packed = codec.compress(data).unwrap();
        let unpacked = codec.decompress(&packed, data.len()).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn test_empty() {
        let codec = LzwCodec;
        let packed = codec.compress(b"").unwrap();
        // Just the END code
        assert_eq!(packed.len(), 2);
        assert!(codec.decompress(&packed, 0).unwrap().is_empty());
    }

    #[test]
    fn test_single_byte() {
        roundtrip(b"A");
    }

    #[test]
    fn test_classic_sequence() {
        roundtrip(b"TOBEORNOTTOBEORTOBEORNOT");
    }

    #[test]
    fn test_kwk_special_case() {
        // "ababab..." exercises the code == next_code path immediately
        roundtrip(b"abababababababababab");
        roundtrip(&[b'x'; 300]);
    }

    #[test]
    fn test_all_byte_values() {
        let data: Vec<u8> = (0..=255).collect();
        roundtrip(&data);
    }

    #[test]
    fn test_width_boundary_sizes() {
        // Sweep input sizes so the closing END code lands on every side of
        // the 9->10 bit width switch
        let mut state = 0x0BADF00Du32;
        let pool: Vec<u8> = (0..2048)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        for len in (240..=1200).step_by(8) {
            roundtrip(&pool[..len]);
        }
    }

    #[test]
    fn test_zero_run_crosses_widths() {
        roundtrip(&vec![0u8; 100_000]);
    }

    #[test]
    fn test_dictionary_full_triggers_clear() {
        // Pseudo-random bytes create roughly one entry per input byte, so
        // 200 KiB comfortably exhausts the 16-bit code space
        let mut state = 0x12345678u32;
        let data: Vec<u8> = (0..200_000)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        roundtrip(&data);
    }

    #[test]
    fn test_overrun_rejected() {
        let codec = LzwCodec;
        let packed = codec.compress(&[b'k'; 1000]).unwrap();
        let err = codec.decompress(&packed, 10).unwrap_err();
        assert!(matches!(err, LarkError::OutputOverrun { .. }));
    }

    #[test]
    fn test_garbage_code_rejected() {
        // A stream starting far beyond next_code is invalid
        let mut writer = BitWriter::new(Vec::new());
        writer.write_bits(400, MIN_WIDTH).unwrap();
        let stream = writer.into_inner().unwrap();
        let codec = LzwCodec;
        assert!(codec.decompress(&stream, 64).is_err());
    }
}
