//! Canonical Huffman decoding for DEFLATE (RFC 1951).
//!
//! Codes of one length are consecutive integers, assigned in symbol order,
//! and each length's block starts where the previous one left off, shifted
//! left by one. A code is therefore fully described by its length's first
//! code and the symbol's rank within that length.
//!
//! Codes are sent most significant bit first inside the LSB-first stream,
//! so a lookup keyed on peeked stream bits is keyed on bit-reversed codes.

use bsatool_core::BitReader;
use bsatool_core::error::{BsaError, Result};

/// Maximum code length in DEFLATE.
pub const MAX_CODE_LENGTH: usize = 15;

/// End of block symbol.
pub const END_OF_BLOCK: u16 = 256;

/// Peek width of the lookup table.
const LOOKUP_BITS: u8 = 9;

/// Codes of one length.
#[derive(Debug, Clone, Copy, Default)]
struct LengthRange {
    first_code: u32,
    /// Position of the first of these symbols in `HuffmanTree::sorted`.
    first_index: u16,
    count: u16,
}

/// Decoder for one canonical code.
///
/// Short codes resolve with a single table lookup; codes longer than the
/// table width are matched against [`LengthRange`]s one bit at a time.
#[derive(Debug, Clone)]
pub struct HuffmanTree {
    /// `(symbol, length)` per reversed `lookup_bits` prefix; length 0 misses.
    lookup: Vec<(u16, u8)>,
    lookup_bits: u8,
    ranges: [LengthRange; MAX_CODE_LENGTH + 1],
    /// Symbols ordered by code.
    sorted: Vec<u16>,
    longest: u8,
}

/// Reverse the low `len` bits of `code`.
fn reverse_code(code: u32, len: u8) -> u32 {
    debug_assert!((1..=32).contains(&len));
    code.reverse_bits() >> (32 - u32::from(len))
}

impl HuffmanTree {
    /// Build the decoder for a code given each symbol's bit length.
    ///
    /// Length 0 marks an unused symbol. Incomplete codes are accepted
    /// (DEFLATE allows a single distance code); over-subscribed ones are not.
    pub fn from_code_lengths(code_lengths: &[u8]) -> Result<Self> {
        if code_lengths.is_empty() {
            return Err(BsaError::invalid_format("no code lengths"));
        }

        let mut counts = [0u16; MAX_CODE_LENGTH + 1];
        for &len in code_lengths {
            if usize::from(len) > MAX_CODE_LENGTH {
                return Err(BsaError::invalid_format(format!(
                    "code length {len} exceeds {MAX_CODE_LENGTH}"
                )));
            }
            counts[usize::from(len)] += 1;
        }
        counts[0] = 0;

        // Unclaimed codes at each length; negative means more codes than fit.
        let mut left = 1i32;
        for &count in &counts[1..] {
            left = (left << 1) - i32::from(count);
            if left < 0 {
                return Err(BsaError::invalid_format("over-subscribed Huffman code"));
            }
        }

        let longest = counts.iter().rposition(|&count| count > 0).unwrap_or(0) as u8;

        let mut ranges = [LengthRange::default(); MAX_CODE_LENGTH + 1];
        let mut code = 0u32;
        let mut index = 0u16;
        for len in 1..=usize::from(longest) {
            ranges[len] = LengthRange {
                first_code: code,
                first_index: index,
                count: counts[len],
            };
            index += counts[len];
            code = (code + u32::from(counts[len])) << 1;
        }

        let mut sorted = vec![0u16; usize::from(index)];
        let mut slot = ranges.map(|range| usize::from(range.first_index));
        for (symbol, &len) in code_lengths.iter().enumerate() {
            if len > 0 {
                sorted[slot[usize::from(len)]] = symbol as u16;
                slot[usize::from(len)] += 1;
            }
        }

        let lookup_bits = LOOKUP_BITS.min(longest);
        let mut lookup = vec![(0u16, 0u8); 1 << lookup_bits];
        for len in 1..=lookup_bits {
            let range = ranges[usize::from(len)];
            for rank in 0..range.count {
                let symbol = sorted[usize::from(range.first_index + rank)];
                let reversed = reverse_code(range.first_code + u32::from(rank), len) as usize;
                // Every table index whose low `len` bits spell this code.
                for entry in (reversed..lookup.len()).step_by(1 << len) {
                    lookup[entry] = (symbol, len);
                }
            }
        }

        Ok(Self {
            lookup,
            lookup_bits,
            ranges,
            sorted,
            longest,
        })
    }

    /// Read one symbol.
    #[inline]
    pub fn decode(&self, reader: &mut BitReader<'_>) -> Result<u16> {
        if self.longest == 0 {
            return Err(BsaError::invalid_huffman(reader.bit_position()));
        }

        // The peek fails within `lookup_bits` of the end of input.
        if let Ok(prefix) = reader.peek_bits(self.lookup_bits) {
            let (symbol, len) = self.lookup[prefix as usize];
            if len > 0 {
                reader.skip_bits(len)?;
                return Ok(symbol);
            }
        }

        let mut code = 0u32;
        for len in 1..=usize::from(self.longest) {
            code = (code << 1) | reader.read_bits(1)?;
            let range = self.ranges[len];
            let rank = code.wrapping_sub(range.first_code);
            if rank < u32::from(range.count) {
                return Ok(self.sorted[usize::from(range.first_index) + rank as usize]);
            }
        }

        Err(BsaError::invalid_huffman(reader.bit_position()))
    }
}
