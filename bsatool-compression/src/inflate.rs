//! Reference DEFLATE decompression (inflate).
//!
//! A from-scratch implementation of RFC 1951 kept next to the
//! [`flate2`]-backed decoder in [`crate::flate`] so the two can be checked
//! against each other. All three block types are supported:
//! - Type 0: Stored (uncompressed)
//! - Type 1: Fixed Huffman codes
//! - Type 2: Dynamic Huffman codes

use crate::huffman::HuffmanTree;
use crate::tables::{
    CODE_LENGTH_ORDER, DISTANCE_EXTRA_BITS, LENGTH_EXTRA_BITS, decode_distance, decode_length,
    fixed_distance_tree, fixed_litlen_tree,
};
use bsatool_core::error::{BsaError, Result};
use bsatool_core::window::{SlidingWindow, sizes};
use bsatool_core::BitReader;
use tracing::warn;

/// DEFLATE history window.
type History = SlidingWindow<u8, { sizes::DEFLATE }>;

/// DEFLATE decompressor.
#[derive(Debug)]
pub struct Inflater {
    /// Last 32 KB of output, for back-references.
    history: History,
    /// Decompressed output.
    output: Vec<u8>,
    /// Whether we've seen the final block.
    final_block: bool,
}

impl Inflater {
    /// Create a new DEFLATE decompressor.
    pub fn new() -> Self {
        Self {
            history: History::new(0),
            output: Vec::new(),
            final_block: false,
        }
    }

    /// Reset the decompressor.
    pub fn reset(&mut self) {
        self.history = History::new(0);
        self.output.clear();
        self.final_block = false;
    }

    /// Decompress a complete raw DEFLATE stream.
    pub fn decompress(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.inflate(&mut BitReader::new(data))
    }

    /// Decompress blocks until the final one, starting at the reader's cursor.
    pub fn inflate(&mut self, reader: &mut BitReader<'_>) -> Result<Vec<u8>> {
        while !self.final_block {
            self.inflate_block(reader)?;
        }

        Ok(std::mem::take(&mut self.output))
    }

    /// Decompress a single block.
    fn inflate_block(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        let bfinal = reader.read_bit()?;
        let btype = reader.read_bits(2)?;

        self.final_block = bfinal;

        match btype {
            0 => self.inflate_stored(reader),
            1 => self.inflate_huffman(reader, fixed_litlen_tree()?, fixed_distance_tree()?),
            2 => self.inflate_dynamic(reader),
            _ => Err(BsaError::invalid_format("Reserved block type 3")),
        }
    }

    /// Write one output byte.
    #[inline]
    fn emit(&mut self, byte: u8) {
        self.history.insert(byte);
        self.output.push(byte);
    }

    /// Copy `length` bytes from `distance` bytes back.
    fn copy_match(&mut self, distance: usize, length: usize) -> Result<()> {
        let available = self.output.len().min(History::CAPACITY);
        if distance == 0 || distance > available {
            return Err(BsaError::invalid_distance(distance, available));
        }

        self.output.reserve(length);
        for _ in 0..length {
            let byte = *self
                .history
                .read_at(self.history.cursor() + History::CAPACITY - distance);
            self.emit(byte);
        }

        Ok(())
    }

    /// Decompress a stored (uncompressed) block.
    fn inflate_stored(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        reader.align_to_byte();

        let len = reader.read_bits(16)? as u16;
        let nlen = reader.read_bits(16)? as u16;

        if len != !nlen {
            return Err(BsaError::corrupted(
                reader.bit_position() / 8,
                format!("LEN/NLEN mismatch: {} vs {}", len, !nlen),
            ));
        }

        for &byte in reader.read_bytes(usize::from(len))? {
            self.emit(byte);
        }

        Ok(())
    }

    /// Decompress a block with dynamic Huffman codes.
    fn inflate_dynamic(&mut self, reader: &mut BitReader<'_>) -> Result<()> {
        let hlit = reader.read_bits(5)? as usize + 257;
        let hdist = reader.read_bits(5)? as usize + 1;
        let hclen = reader.read_bits(4)? as usize + 4;

        let mut code_length_lengths = [0u8; 19];
        for &slot in CODE_LENGTH_ORDER.iter().take(hclen) {
            code_length_lengths[slot] = reader.read_bits(3)? as u8;
        }

        let code_length_tree = HuffmanTree::from_code_lengths(&code_length_lengths)?;

        let mut all_lengths = vec![0u8; hlit + hdist];
        let mut i = 0;

        while i < all_lengths.len() {
            let code = code_length_tree.decode(reader)?;

            let (value, repeat) = match code {
                0..=15 => (code as u8, 1),
                16 => {
                    if i == 0 {
                        return Err(BsaError::corrupted(
                            reader.bit_position() / 8,
                            "Code 16 at start of lengths",
                        ));
                    }
                    (all_lengths[i - 1], reader.read_bits(2)? as usize + 3)
                }
                17 => (0, reader.read_bits(3)? as usize + 3),
                18 => (0, reader.read_bits(7)? as usize + 11),
                _ => return Err(BsaError::invalid_huffman(reader.bit_position())),
            };

            if i + repeat > all_lengths.len() {
                return Err(BsaError::corrupted(
                    reader.bit_position() / 8,
                    "Code length overflow",
                ));
            }
            all_lengths[i..i + repeat].fill(value);
            i += repeat;
        }

        let litlen_tree = HuffmanTree::from_code_lengths(&all_lengths[..hlit])?;
        let dist_tree = HuffmanTree::from_code_lengths(&all_lengths[hlit..])?;

        self.inflate_huffman(reader, &litlen_tree, &dist_tree)
    }

    /// Decompress using Huffman codes.
    fn inflate_huffman(
        &mut self,
        reader: &mut BitReader<'_>,
        litlen_tree: &HuffmanTree,
        dist_tree: &HuffmanTree,
    ) -> Result<()> {
        loop {
            let code = litlen_tree.decode(reader)?;

            if code < 256 {
                self.emit(code as u8);
            } else if code == 256 {
                break;
            } else if code <= 285 {
                let extra_bits = LENGTH_EXTRA_BITS[(code - 257) as usize];
                let extra = reader.read_bits(extra_bits)? as u16;
                let length = decode_length(code, extra);

                let dist_code = dist_tree.decode(reader)?;
                if dist_code >= 30 {
                    return Err(BsaError::corrupted(
                        reader.bit_position() / 8,
                        format!("Invalid distance code: {}", dist_code),
                    ));
                }

                let dist_extra = reader.read_bits(DISTANCE_EXTRA_BITS[dist_code as usize])? as u16;
                let distance = decode_distance(dist_code, dist_extra);

                self.copy_match(distance as usize, length as usize)?;
            } else {
                return Err(BsaError::corrupted(
                    reader.bit_position() / 8,
                    format!("Invalid literal/length code: {}", code),
                ));
            }
        }

        Ok(())
    }
}

impl Default for Inflater {
    fn default() -> Self {
        Self::new()
    }
}

/// Decompress raw DEFLATE data, reporting why it failed.
pub fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    Inflater::new().decompress(data)
}

/// Decompress raw DEFLATE data with the reference decoder.
///
/// Returns an empty vector if the stream is invalid or truncated.
pub fn uncompress_deflate_native(data: &[u8]) -> Vec<u8> {
    inflate(data).unwrap_or_else(|err| {
        warn!(input_len = data.len(), %err, "reference inflate failed");
        Vec::new()
    })
}
