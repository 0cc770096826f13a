//! INF file cipher.
//!
//! Arena stores most of its `.INF` level descriptions XOR-encrypted with a
//! short repeating key. Byte `i` of the stream is XORed with
//! `KEY[i % 8] + i` (wrapping in 8 bits).
//!
//! XOR with a keystream that depends only on the byte position is its own
//! inverse, so the same transform encrypts and decrypts.
//!
//! ## Example
//!
//! ```rust
//! use bsatool_compression::cipher::encrypt_decrypt;
//!
//! let plaintext = b"#FLOORS";
//! let encrypted = encrypt_decrypt(plaintext);
//! assert_ne!(&encrypted, plaintext);
//! assert_eq!(encrypt_decrypt(&encrypted), plaintext);
//! ```

/// Repeating key of the INF cipher.
pub const INF_KEY: [u8; 8] = [0xEA, 0x7B, 0x4E, 0xBD, 0x19, 0xC9, 0x38, 0x99];

/// Position-dependent keystream state.
#[derive(Debug, Clone, Default)]
pub struct InfCipher {
    /// Number of bytes processed so far.
    position: usize,
}

impl InfCipher {
    /// Create a cipher positioned at the start of a stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keystream byte for the current position.
    #[inline]
    fn key_byte(&self) -> u8 {
        INF_KEY[self.position % INF_KEY.len()].wrapping_add(self.position as u8)
    }

    /// Transform a single byte and advance the keystream.
    #[inline]
    pub fn apply_byte(&mut self, byte: u8) -> u8 {
        let out = byte ^ self.key_byte();
        self.position += 1;
        out
    }

    /// Transform a buffer in place.
    pub fn apply(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte = self.apply_byte(*byte);
        }
    }
}

/// Encrypt or decrypt a whole buffer.
pub fn encrypt_decrypt(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    InfCipher::new().apply(&mut out);
    out
}
