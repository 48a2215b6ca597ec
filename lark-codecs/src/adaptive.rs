//! Adaptive Huffman coder for the LZHUF entropy stage.
//!
//! One coder instance serves a whole entry. The alphabet has 258 symbols:
//! byte values 0..=255 as literals, [`SYM_END`] closing the stream and
//! [`SYM_MATCH`] announcing a distance/length pair in raw bits.
//!
//! Every symbol starts with frequency 1. Coding a literal increments its
//! frequency and a running counter; each time the counter reaches a
//! multiple of 4096 the code tree is rebuilt from the current frequencies.
//! The two marker symbols never update frequencies or the counter. Encoder
//! and decoder run this identical schedule, so their trees stay isomorphic;
//! any divergence garbles the rest of the entry.
//!
//! Tree construction is a two-queue Huffman merge over leaves stably sorted
//! by frequency (symbol order breaks ties), with ties between the queues
//! resolved toward the leaf queue. Left edges are 0, right edges are 1, and
//! codes travel MSB-first.

use lark_core::{BitReader, BitWriter, Result};
use std::collections::VecDeque;
use std::io::{Read, Write};

/// Number of symbols in the coder alphabet.
pub const SYMBOL_COUNT: usize = 258;
/// End-of-stream marker symbol.
pub const SYM_END: u16 = 256;
/// Match-follows marker symbol.
pub const SYM_MATCH: u16 = 257;

/// Literal count between tree rebuilds.
const REBUILD_INTERVAL: u32 = 4096;

const NO_CHILD: u16 = u16::MAX;

#[derive(Debug, Clone, Copy)]
struct Node {
    left: u16,
    right: u16,
    /// Leaf symbol, or `NO_CHILD` for internal nodes.
    symbol: u16,
}

/// Adaptive Huffman encoder/decoder state.
#[derive(Debug)]
pub struct AdaptiveHuffman {
    freq: [u32; SYMBOL_COUNT],
    counter: u32,
    codes: [u64; SYMBOL_COUNT],
    lengths: [u8; SYMBOL_COUNT],
    nodes: Vec<Node>,
    root: u16,
}

impl AdaptiveHuffman {
    /// Create a coder with all frequencies at 1.
    pub fn new() -> Self {
        let mut coder = Self {
            freq: [1; SYMBOL_COUNT],
            counter: 0,
            codes: [0; SYMBOL_COUNT],
            lengths: [0; SYMBOL_COUNT],
            nodes: Vec::new(),
            root: 0,
        };
        coder.rebuild();
        coder
    }

    /// Reset frequencies and the rebuild counter, then rebuild.
    pub fn reset(&mut self) {
        self.freq = [1; SYMBOL_COUNT];
        self.counter = 0;
        self.rebuild();
    }

    /// Emit the code for `symbol`.
    pub fn encode_symbol<W: Write>(&self, symbol: u16, writer: &mut BitWriter<W>) -> Result<()> {
        let code = self.codes[symbol as usize];
        let length = self.lengths[symbol as usize];
        for shift in (0..length).rev() {
            writer.write_bit((code >> shift) & 1 != 0)?;
        }
        Ok(())
    }

    /// Decode one symbol by walking the tree.
    pub fn decode_symbol<R: Read>(&self, reader: &mut BitReader<R>) -> Result<u16> {
        let mut index = self.root;
        loop {
            let node = self.nodes[index as usize];
            if node.symbol != NO_CHILD {
                return Ok(node.symbol);
            }
            index = if reader.read_bit()? {
                node.right
            } else {
                node.left
            };
        }
    }

    /// Account for a coded symbol. Literals bump their frequency and may
    /// trigger a rebuild; the marker symbols are ignored.
    pub fn update(&mut self, symbol: u16) {
        if symbol >= 256 {
            return;
        }
        self.freq[symbol as usize] += 1;
        self.counter += 1;
        if self.counter % REBUILD_INTERVAL == 0 {
            self.rebuild();
        }
    }

    fn rebuild(&mut self) {
        self.nodes.clear();
        self.nodes.reserve(2 * SYMBOL_COUNT - 1);

        // Leaves in symbol order, then stably sorted by frequency so equal
        // weights keep symbol order.
        let mut leaves: Vec<u16> = (0..SYMBOL_COUNT as u16).collect();
        for symbol in &leaves {
            self.nodes.push(Node {
                left: NO_CHILD,
                right: NO_CHILD,
                symbol: *symbol,
            });
        }
        leaves.sort_by_key(|&s| self.freq[s as usize]);

        fn pop_min(
            leaf_queue: &mut VecDeque<u16>,
            merge_queue: &mut VecDeque<u16>,
            weights: &[u64],
        ) -> u16 {
            match (leaf_queue.front(), merge_queue.front()) {
                (Some(&l), Some(&m)) => {
                    if weights[l as usize] <= weights[m as usize] {
                        leaf_queue.pop_front().unwrap()
                    } else {
                        merge_queue.pop_front().unwrap()
                    }
                }
                (Some(_), None) => leaf_queue.pop_front().unwrap(),
                (None, Some(_)) => merge_queue.pop_front().unwrap(),
                (None, None) => unreachable!("huffman merge ran out of nodes"),
            }
        }

        let mut weights: Vec<u64> = self.freq.iter().map(|&f| f as u64).collect();
        let mut leaf_queue: VecDeque<u16> = leaves.into();
        let mut merge_queue: VecDeque<u16> = VecDeque::new();

        while leaf_queue.len() + merge_queue.len() > 1 {
            let first = pop_min(&mut leaf_queue, &mut merge_queue, &weights);
            let second = pop_min(&mut leaf_queue, &mut merge_queue, &weights);
            let parent = self.nodes.len() as u16;
            self.nodes.push(Node {
                left: first,
                right: second,
                symbol: NO_CHILD,
            });
            weights.push(weights[first as usize] + weights[second as usize]);
            merge_queue.push_back(parent);
        }

        self.root = pop_min(&mut leaf_queue, &mut merge_queue, &weights);
        self.assign_codes();
    }

    fn assign_codes(&mut self) {
        let mut stack: Vec<(u16, u64, u8)> = vec![(self.root, 0, 0)];
        while let Some((index, code, length)) = stack.pop() {
            let node = self.nodes[index as usize];
            if node.symbol != NO_CHILD {
                self.codes[node.symbol as usize] = code;
                self.lengths[node.symbol as usize] = length.max(1);
                continue;
            }
            stack.push((node.left, code << 1, length + 1));
            stack.push((node.right, (code << 1) | 1, length + 1));
        }
    }

    /// Frequency of a symbol (for tests).
    #[cfg(test)]
    fn frequency(&self, symbol: u16) -> u32 {
        self.freq[symbol as usize]
    }
}

impl Default for AdaptiveHuffman {
    fn default() -> Self {
        Self::new()
    }
}
