//! Sliding-window buffers for LZ back-references.
//!
//! LZ decoders reproduce matches by copying from their own recent output.
//! [`Window`] keeps that history in a power-of-two ring; [`OutputWindow`]
//! couples the ring with a growable, bounded output buffer so decoders can
//! write literals and matches through one interface while the declared
//! output size is enforced.
//!
//! Window sizes used by the lark codecs: 4096 (LZSS, LZHUF) and 32768
//! (LZ77).

use crate::error::{LarkError, Result};

/// A ring buffer holding the most recent output bytes of a decoder.
///
/// Distance 1 refers to the most recently written byte. Copies where
/// `length > distance` are valid and reproduce a repeating pattern.
#[derive(Debug, Clone)]
pub struct Window {
    buffer: Vec<u8>,
    /// Next write position.
    position: usize,
    /// Bytes written so far, saturating at capacity.
    filled: usize,
    /// Capacity mask (capacity is a power of two).
    mask: usize,
}

impl Window {
    /// Create a window with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or not a power of two.
    pub fn new(capacity: usize) -> Self {
        assert!(
            capacity > 0 && capacity.is_power_of_two(),
            "window capacity must be a power of two, got {}",
            capacity
        );
        Self {
            buffer: vec![0; capacity],
            position: 0,
            filled: 0,
            mask: capacity - 1,
        }
    }

    /// Capacity of the window.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of history bytes available (up to capacity).
    pub fn filled(&self) -> usize {
        self.filled
    }

    /// Reset the window to empty.
    pub fn clear(&mut self) {
        self.position = 0;
        self.filled = 0;
        self.buffer.fill(0);
    }

    /// Append one byte of output history.
    #[inline]
    pub fn push(&mut self, byte: u8) {
        self.buffer[self.position] = byte;
        self.position = (self.position + 1) & self.mask;
        if self.filled < self.buffer.len() {
            self.filled += 1;
        }
    }

    /// Byte at the given backward distance (1 = most recent).
    #[inline]
    pub fn byte_at_distance(&self, distance: usize) -> Result<u8> {
        if distance == 0 || distance > self.filled {
            return Err(LarkError::invalid_distance(distance, self.filled));
        }
        let index = self.position.wrapping_sub(distance) & self.mask;
        Ok(self.buffer[index])
    }
}

/// A decoder output buffer backed by a sliding window and capped at the
/// declared uncompressed size.
///
/// Every byte written lands in both the history ring (for later matches)
/// and the output vector. Writing past `limit` fails with
/// [`LarkError::OutputOverrun`], which is how a corrupt stream that tries
/// to inflate beyond its declared size is stopped.
#[derive(Debug)]
pub struct OutputWindow {
    ring: Window,
    output: Vec<u8>,
    limit: usize,
}

impl OutputWindow {
    /// Create an output window with the given ring capacity and output cap.
    pub fn new(window_size: usize, limit: usize) -> Self {
        Self {
            ring: Window::new(window_size),
            output: Vec::with_capacity(limit.min(1 << 20)),
            limit,
        }
    }

    /// Write a literal byte.
    #[inline]
    pub fn push_literal(&mut self, byte: u8) -> Result<()> {
        if self.output.len() >= self.limit {
            return Err(LarkError::OutputOverrun { limit: self.limit });
        }
        self.ring.push(byte);
        self.output.push(byte);
        Ok(())
    }

    /// Copy `length` bytes from the history at the given backward distance.
    ///
    /// Overlapping copies (`length > distance`) repeat the pattern, matching
    /// the byte-at-a-time semantics every LZ decoder expects.
    pub fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        if distance == 0 || distance > self.ring.filled() {
            return Err(LarkError::invalid_distance(distance, self.ring.filled()));
        }
        if self.output.len() + length > self.limit {
            return Err(LarkError::OutputOverrun { limit: self.limit });
        }
        for _ in 0..length {
            let byte = self.ring.byte_at_distance(distance)?;
            self.ring.push(byte);
            self.output.push(byte);
        }
        Ok(())
    }

    /// Bytes of history currently available for matches.
    pub fn history_len(&self) -> usize {
        self.ring.filled()
    }

    /// Length of the accumulated output.
    pub fn len(&self) -> usize {
        self.output.len()
    }

    /// Whether no output has been produced yet.
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Reset the ring while keeping the accumulated output.
    ///
    /// Used at block boundaries by codecs whose blocks are self-contained.
    pub fn reset_history(&mut self) {
        self.ring.clear();
    }

    /// Consume and return the output bytes.
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_push_and_read() {
        let mut win = Window::new(8);
        for &b in b"Hello" {
            win.push(b);
        }
        assert_eq!(win.filled(), 5);
        assert_eq!(win.byte_at_distance(1).unwrap(), b'o');
        assert_eq!(win.byte_at_distance(5).unwrap(), b'H');
    }

    #[test]
    fn test_window_wraps() {
        let mut win = Window::new(4);
        for &b in b"ABCDEF" {
            win.push(b);
        }
        assert_eq!(win.filled(), 4);
        assert_eq!(win.byte_at_distance(1).unwrap(), b'F');
        assert_eq!(win.byte_at_distance(4).unwrap(), b'C');
    }

    #[test]
    fn test_window_invalid_distance() {
        let win = Window::new(8);
        assert!(win.byte_at_distance(0).is_err());
        assert!(win.byte_at_distance(1).is_err());
    }

    #[test]
    fn test_output_window_literals_and_match() {
        let mut out = OutputWindow::new(32, 64);
        for &b in b"Hello" {
            out.push_literal(b).unwrap();
        }
        out.copy_match(5, 5).unwrap();
        assert_eq!(out.into_output(), b"HelloHello");
    }

    #[test]
    fn test_output_window_overlapping_copy() {
        let mut out = OutputWindow::new(32, 64);
        out.push_literal(b'A').unwrap();
        out.push_literal(b'B').unwrap();
        out.copy_match(2, 6).unwrap();
        assert_eq!(out.into_output(), b"ABABABAB");
    }

    #[test]
    fn test_output_window_limit() {
        let mut out = OutputWindow::new(32, 3);
        out.push_literal(b'x').unwrap();
        out.push_literal(b'y').unwrap();
        out.push_literal(b'z').unwrap();
        let err = out.push_literal(b'!').unwrap_err();
        assert!(matches!(err, LarkError::OutputOverrun { limit: 3 }));
    }

    #[test]
    fn test_output_window_match_limit() {
        let mut out = OutputWindow::new(32, 4);
        out.push_literal(b'A').unwrap();
        let err = out.copy_match(1, 10).unwrap_err();
        assert!(matches!(err, LarkError::OutputOverrun { .. }));
    }

    #[test]
    fn test_reset_history_keeps_output() {
        let mut out = OutputWindow::new(32, 64);
        out.push_literal(b'A').unwrap();
        out.reset_history();
        assert_eq!(out.history_len(), 0);
        assert_eq!(out.len(), 1);
        assert!(out.copy_match(1, 1).is_err());
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn test_non_power_of_two_panics() {
        let _ = Window::new(100);
    }
}
