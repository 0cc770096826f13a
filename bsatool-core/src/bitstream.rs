//! Bit-level input for Huffman-coded streams.
//!
//! DEFLATE packs bits LSB-first within each byte: the first bit of the
//! stream is the least significant bit of the first byte.
//!
//! [`BitReader`] borrows the whole input and tracks a bit cursor into it, so
//! byte-aligned runs (stored blocks) are handed out as subslices without
//! copying.
//!
//! # Example
//!
//! ```
//! use bsatool_core::bitstream::BitReader;
//!
//! let mut reader = BitReader::new(&[0b1100_0101]);
//! assert_eq!(reader.read_bits(3).unwrap(), 0b101);
//! assert_eq!(reader.read_bits(5).unwrap(), 0b11000);
//! ```

use crate::error::{BsaError, Result};

/// Widest field a single call may read.
pub const MAX_FIELD_BITS: u8 = 32;

/// LSB-first bit cursor over a byte slice.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Bits consumed from the start of `data`.
    position: u64,
}

impl<'a> BitReader<'a> {
    /// Start reading at the first bit of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Bits consumed so far.
    pub fn bit_position(&self) -> u64 {
        self.position
    }

    /// Bits left in the input.
    pub fn remaining_bits(&self) -> u64 {
        self.data.len() as u64 * 8 - self.position
    }

    /// Whether the cursor sits on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.position % 8 == 0
    }

    fn require(&self, count: u8) -> Result<()> {
        let remaining = self.remaining_bits();
        if u64::from(count) > remaining {
            let missing = (u64::from(count) - remaining).div_ceil(8);
            return Err(BsaError::unexpected_eof(missing as usize));
        }
        Ok(())
    }

    /// The next `count` bits, without bounds checks beyond slice access.
    ///
    /// Five bytes cover any 32-bit field at any bit offset.
    #[inline]
    fn gather(&self, count: u8) -> u32 {
        let start = (self.position / 8) as usize;
        let shift = self.position % 8;

        let word = self
            .data
            .get(start..)
            .unwrap_or_default()
            .iter()
            .take(5)
            .enumerate()
            .fold(0u64, |word, (i, &byte)| word | u64::from(byte) << (8 * i));

        ((word >> shift) & ((1u64 << count) - 1)) as u32
    }

    /// Read a field of up to 32 bits; the first stream bit lands in bit 0.
    #[inline]
    pub fn read_bits(&mut self, count: u8) -> Result<u32> {
        let value = self.peek_bits(count)?;
        self.position += u64::from(count);
        Ok(value)
    }

    /// Look at the next field of up to 32 bits without consuming it.
    ///
    /// Fails if fewer than `count` bits remain.
    #[inline]
    pub fn peek_bits(&self, count: u8) -> Result<u32> {
        debug_assert!(count <= MAX_FIELD_BITS);
        self.require(count)?;
        Ok(self.gather(count))
    }

    /// Consume `count` bits.
    pub fn skip_bits(&mut self, count: u8) -> Result<()> {
        self.require(count)?;
        self.position += u64::from(count);
        Ok(())
    }

    /// Read one bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Drop the rest of the current byte.
    pub fn align_to_byte(&mut self) {
        self.position = self.position.next_multiple_of(8);
    }

    /// Take `len` whole bytes. The cursor must be byte-aligned.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if !self.is_aligned() {
            return Err(BsaError::invalid_state(format!(
                "byte read at unaligned bit position {}",
                self.position
            )));
        }

        let start = (self.position / 8) as usize;
        let available = self.data.len() - start;
        if len > available {
            return Err(BsaError::unexpected_eof(len - available));
        }

        self.position += len as u64 * 8;
        Ok(&self.data[start..start + len])
    }
}
