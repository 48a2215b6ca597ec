//! Store codec (method 0): identity copy.

use lark_core::{Codec, LarkError, Method, Result};

/// Working buffer granularity for the copy loop.
const CHUNK_SIZE: usize = 64 * 1024;

/// Pass-through codec; the payload is the input, byte for byte.
#[derive(Debug, Default)]
pub struct StoreCodec;

impl Codec for StoreCodec {
    fn method(&self) -> Method {
        Method::Store
    }

    fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len());
        for chunk in input.chunks(CHUNK_SIZE) {
            output.extend_from_slice(chunk);
        }
        Ok(output)
    }

    fn decompress(&self, input: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        if input.len() > expected_len {
            return Err(LarkError::OutputOverrun {
                limit: expected_len,
            });
        }
        let mut output = Vec::with_capacity(input.len());
        for chunk in input.chunks(CHUNK_SIZE) {
            output.extend_from_slice(chunk);
        }
        Ok(output)
    }
}
