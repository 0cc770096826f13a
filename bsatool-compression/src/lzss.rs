//! LZSS codec in the format used by The Elder Scrolls: Arena.
//!
//! LZSS (Lempel-Ziv-Storer-Szymanski) is a derivative of LZ77 that uses
//! a flag bit to distinguish between literals and matches.
//!
//! # Stream layout
//!
//! The stream is a sequence of groups. Each group starts with a flag byte
//! whose bits, read LSB-first, describe up to eight tokens:
//!
//! - `1`: a literal byte follows
//! - `0`: a two-byte reference `b0 b1` follows, pointing at window position
//!   `b0 | (b1 & 0xF0) << 4` and copying `(b1 & 0x0F) + 3` bytes
//!
//! Positions are absolute slots of a 4096-byte window prefilled with spaces,
//! whose write cursor starts at `0xFEE`. A reference may run past the end of
//! the window; the window read aliases back to its start.

use bsatool_core::error::{BsaError, Result};
use bsatool_core::window::{SlidingWindow, sizes};
use tracing::warn;

/// Window size of the format.
pub const WINDOW_SIZE: usize = sizes::LZSS;

/// Dictionary used by both directions.
pub type LzssWindow = SlidingWindow<u8, WINDOW_SIZE>;

/// LZSS stream parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LzssParams {
    /// Shortest match encoded as a reference.
    pub min_match: usize,
    /// Longest match a single reference can carry.
    pub max_match: usize,
    /// Initial value of every window slot.
    pub fill: u8,
    /// Initial write cursor.
    pub start: usize,
}

impl LzssParams {
    /// Parameters of the Arena asset format.
    ///
    /// - 4096-byte window prefilled with `0x20`
    /// - cursor starts at `0xFEE` (`4096 - 18`)
    /// - match lengths 3..=18 (4-bit length field)
    pub const ARENA: Self = Self {
        min_match: 3,
        max_match: 18,
        fill: 0x20,
        start: WINDOW_SIZE - 18,
    };

    /// Create a fresh window for these parameters.
    pub fn window(&self) -> LzssWindow {
        SlidingWindow::with_cursor(self.fill, self.start)
    }
}

impl Default for LzssParams {
    fn default() -> Self {
        Self::ARENA
    }
}

/// LZSS token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LzssToken {
    /// A literal byte.
    Literal(u8),
    /// A reference to window content.
    Match {
        /// Absolute window position the copy starts at.
        position: u16,
        /// Number of bytes to copy.
        length: u8,
    },
}

/// LZSS decoder backed by a sliding window.
#[derive(Debug)]
pub struct LzssDecoder {
    /// Dictionary of recently produced bytes.
    window: LzssWindow,
    /// Decoded bytes.
    output: Vec<u8>,
    /// Stream parameters.
    params: LzssParams,
}

impl LzssDecoder {
    /// Create a decoder for the given parameters.
    pub fn new(params: LzssParams) -> Self {
        Self {
            window: params.window(),
            output: Vec::new(),
            params,
        }
    }

    /// Create a decoder for Arena streams.
    pub fn arena() -> Self {
        Self::new(LzssParams::ARENA)
    }

    /// Reset the decoder.
    pub fn reset(&mut self) {
        self.window = self.params.window();
        self.output.clear();
    }

    /// Decode a literal byte.
    pub fn decode_literal(&mut self, byte: u8) {
        self.window.insert(byte);
        self.output.push(byte);
    }

    /// Decode a reference to `length` bytes starting at window `position`.
    pub fn decode_match(&mut self, position: u16, length: u8) {
        let position = position as usize;
        for step in 0..length as usize {
            let byte = *self.window.read_at(position + step);
            self.window.insert(byte);
            self.output.push(byte);
        }
    }

    /// Decode a whole stream.
    ///
    /// Returns an error if the stream is truncated inside a token or ends
    /// right after a flag byte.
    pub fn decode(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        let mut pos = 0;

        while pos < data.len() {
            let flags = data[pos];
            pos += 1;

            if pos == data.len() {
                return Err(BsaError::unexpected_eof(1));
            }

            for bit in 0..8 {
                if pos == data.len() {
                    break;
                }

                if (flags >> bit) & 1 == 1 {
                    self.decode_literal(data[pos]);
                    pos += 1;
                } else {
                    let remaining = data.len() - pos;
                    if remaining < 2 {
                        return Err(BsaError::unexpected_eof(2 - remaining));
                    }
                    let low = data[pos];
                    let high = data[pos + 1];
                    pos += 2;

                    let position = u16::from(low) | (u16::from(high & 0xF0) << 4);
                    let length = (high & 0x0F) + self.params.min_match as u8;
                    self.decode_match(position, length);
                }
            }
        }

        Ok(std::mem::take(&mut self.output))
    }

    /// Get the decoded output.
    pub fn output(&self) -> &[u8] {
        &self.output
    }
}

/// Greedy LZSS encoder.
#[derive(Debug)]
pub struct LzssEncoder {
    /// Mirror of the decoder's dictionary.
    window: LzssWindow,
    /// Stream parameters.
    params: LzssParams,
}

impl LzssEncoder {
    /// Create an encoder for the given parameters.
    pub fn new(params: LzssParams) -> Self {
        Self {
            window: params.window(),
            params,
        }
    }

    /// Create an encoder for Arena streams.
    pub fn arena() -> Self {
        Self::new(LzssParams::ARENA)
    }

    /// Reset the encoder.
    pub fn reset(&mut self) {
        self.window = self.params.window();
    }

    /// Find the longest window match for the start of `lookahead`.
    ///
    /// Slots the decoder overwrites while copying the match are compared
    /// against the bytes the match itself produces, so overlapping copies
    /// are found too.
    fn find_match(&self, lookahead: &[u8]) -> Option<(u16, u8)> {
        let max_len = lookahead.len().min(self.params.max_match);
        if max_len < self.params.min_match {
            return None;
        }

        let cursor = self.window.cursor();
        let mut best_len = 0;
        let mut best_pos = 0;

        for start in 0..WINDOW_SIZE {
            if *self.window.read_at(start) != lookahead[0] {
                continue;
            }

            let mut len = 1;
            while len < max_len {
                let slot = start + len;
                let ahead = (slot + WINDOW_SIZE - cursor) % WINDOW_SIZE;
                let byte = if ahead < len {
                    lookahead[ahead]
                } else {
                    *self.window.read_at(slot)
                };
                if byte != lookahead[len] {
                    break;
                }
                len += 1;
            }

            if len > best_len {
                best_len = len;
                best_pos = start;
                if len == max_len {
                    break;
                }
            }
        }

        (best_len >= self.params.min_match).then_some((best_pos as u16, best_len as u8))
    }

    /// Encode data to LZSS tokens.
    pub fn encode(&mut self, data: &[u8]) -> Vec<LzssToken> {
        let mut tokens = Vec::new();
        let mut pos = 0;

        while pos < data.len() {
            let lookahead = &data[pos..];

            let consumed = match self.find_match(lookahead) {
                Some((position, length)) => {
                    tokens.push(LzssToken::Match { position, length });
                    length as usize
                }
                None => {
                    tokens.push(LzssToken::Literal(data[pos]));
                    1
                }
            };

            self.window.insert_all(&data[pos..pos + consumed]);
            pos += consumed;
        }

        tokens
    }

    /// Pack tokens into the flag-prefixed byte stream.
    pub fn pack(&self, tokens: &[LzssToken]) -> Vec<u8> {
        let mut out = Vec::with_capacity(tokens.len() * 2);

        for group in tokens.chunks(8) {
            let flag_index = out.len();
            out.push(0u8);

            for (bit, token) in group.iter().enumerate() {
                match *token {
                    LzssToken::Literal(byte) => {
                        out[flag_index] |= 1 << bit;
                        out.push(byte);
                    }
                    LzssToken::Match { position, length } => {
                        let length_code = length - self.params.min_match as u8;
                        out.push((position & 0xFF) as u8);
                        out.push((((position >> 4) & 0xF0) as u8) | (length_code & 0x0F));
                    }
                }
            }
        }

        out
    }
}

/// Decompress an Arena LZSS stream, reporting why it failed.
pub fn decode_lzss(data: &[u8]) -> Result<Vec<u8>> {
    LzssDecoder::arena().decode(data)
}

/// Compress data into an Arena LZSS stream.
pub fn compress_lzss(data: &[u8]) -> Vec<u8> {
    let mut encoder = LzssEncoder::arena();
    let tokens = encoder.encode(data);
    encoder.pack(&tokens)
}

/// Decompress an Arena LZSS stream.
///
/// Returns an empty vector if the stream is truncated.
pub fn uncompress_lzss(data: &[u8]) -> Vec<u8> {
    decode_lzss(data).unwrap_or_else(|err| {
        warn!(input_len = data.len(), %err, "LZSS decompression failed");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lzss_decoder_literal() {
        let mut decoder = LzssDecoder::arena();

        decoder.decode_literal(b'H');
        decoder.decode_literal(b'i');

        assert_eq!(decoder.output(), b"Hi");
    }

    #[test]
    fn test_lzss_decoder_match_at_cursor() {
        let mut decoder = LzssDecoder::arena();

        // "AB" lands at 0xFEE, 0xFEF
        decoder.decode_literal(b'A');
        decoder.decode_literal(b'B');
        decoder.decode_match(0xFEE, 4);

        assert_eq!(decoder.output(), b"ABABAB");
    }

    #[test]
    fn test_lzss_decoder_prefilled_spaces() {
        let mut decoder = LzssDecoder::arena();

        decoder.decode_match(0, 3);

        assert_eq!(decoder.output(), b"   ");
    }

    #[test]
    fn test_lzss_decoder_wraps_window() {
        let mut decoder = LzssDecoder::arena();

        // 18 literals fill 0xFEE..=0xFFF, the 19th wraps to slot 0
        let literals: Vec<u8> = (b'a'..=b's').collect();
        for &b in &literals {
            decoder.decode_literal(b);
        }
        // Reference starting at 0xFFE runs over the end of the window
        decoder.decode_match(0xFFE, 3);

        let out = decoder.output();
        assert_eq!(&out[19..], &[b'q', b'r', b's']);
    }

    #[test]
    fn test_decode_stream() {
        // flags 0b0000_0111: three literals then a reference
        let stream = [0x07, b'x', b'y', b'z', 0xEE, 0xF2];
        let out = decode_lzss(&stream).unwrap();

        // reference: position 0xFEE, length 5
        assert_eq!(out, b"xyzxyzxy");
    }

    #[test]
    fn test_decode_truncated_reference() {
        let stream = [0x00, 0xEE];
        assert!(decode_lzss(&stream).is_err());
        assert!(uncompress_lzss(&stream).is_empty());
    }

    #[test]
    fn test_decode_dangling_flag_byte() {
        let mut stream = vec![0xFF];
        stream.extend_from_slice(b"abcdefgh");
        assert_eq!(decode_lzss(&stream).unwrap(), b"abcdefgh");

        stream.push(0xFF);
        assert!(decode_lzss(&stream).is_err());
    }

    #[test]
    fn test_lzss_encoder_literals() {
        let mut encoder = LzssEncoder::arena();

        let tokens = encoder.encode(b"abc");

        assert!(tokens.iter().all(|t| matches!(t, LzssToken::Literal(_))));
    }

    #[test]
    fn test_lzss_encoder_match() {
        let mut encoder = LzssEncoder::arena();

        let tokens = encoder.encode(b"abcabcabc");

        assert!(tokens.iter().any(|t| matches!(t, LzssToken::Match { .. })));
    }

    #[test]
    fn test_lzss_encoder_uses_space_prefill() {
        let mut encoder = LzssEncoder::arena();

        let tokens = encoder.encode(b"          ");

        assert_eq!(tokens.len(), 1);
        assert!(matches!(tokens[0], LzssToken::Match { length: 10, .. }));
    }

    #[test]
    fn test_pack_flag_layout() {
        let encoder = LzssEncoder::arena();
        let tokens = [
            LzssToken::Literal(b'x'),
            LzssToken::Match {
                position: 0xABC,
                length: 18,
            },
        ];

        let packed = encoder.pack(&tokens);

        assert_eq!(packed, vec![0x01, b'x', 0xBC, 0xAF]);
    }

    #[test]
    fn test_lzss_roundtrip() {
        let input = b"Hello Hello Hello World";
        let compressed = compress_lzss(input);
        assert!(compressed.len() < input.len());
        assert_eq!(uncompress_lzss(&compressed), input);
    }

    #[test]
    fn test_lzss_roundtrip_empty() {
        assert!(compress_lzss(b"").is_empty());
        assert!(uncompress_lzss(&compress_lzss(b"")).is_empty());
    }
}
