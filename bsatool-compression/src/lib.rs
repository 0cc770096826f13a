//! # BSATool Compression
//!
//! Codecs used by Arena asset files:
//!
//! - **LZSS**: 4 KB window, flag-prefixed literal/reference groups
//!   ([`compress_lzss`], [`uncompress_lzss`])
//! - **DEFLATE**: raw RFC 1951 streams, decoded either by [`flate2`]
//!   ([`uncompress_deflate`]) or by the reference decoder in this crate
//!   ([`uncompress_deflate_native`])
//! - **INF cipher**: self-inverse XOR keystream ([`encrypt_decrypt`])
//!
//! All entry points are pure functions over in-memory buffers. A failed
//! decode returns an empty vector, never a partial result; the `Result`
//! returning variants ([`decode_lzss`], [`inflate`], [`inflate_flate2`])
//! report why.
//!
//! ## Example
//!
//! ```rust
//! use bsatool_compression::{compress_lzss, encrypt_decrypt, uncompress_lzss};
//!
//! let original = b"ARENA ARENA ARENA ARENA";
//! let compressed = compress_lzss(original);
//! assert_eq!(uncompress_lzss(&compressed), original);
//!
//! let encrypted = encrypt_decrypt(original);
//! assert_eq!(encrypt_decrypt(&encrypted), original);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod cipher;
pub mod flate;
pub mod huffman;
pub mod inflate;
pub mod lzss;
pub mod tables;

// Re-exports
pub use cipher::{INF_KEY, InfCipher, encrypt_decrypt};
pub use flate::{inflate_flate2, uncompress_deflate};
pub use huffman::HuffmanTree;
pub use inflate::{Inflater, inflate, uncompress_deflate_native};
pub use lzss::{
    LzssDecoder, LzssEncoder, LzssParams, LzssToken, compress_lzss, decode_lzss, uncompress_lzss,
};
