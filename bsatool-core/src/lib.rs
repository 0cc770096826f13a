//! # BSATool Core
//!
//! Core components shared by the BSATool crates.
//!
//! - [`window`]: Fixed-capacity sliding window used as the LZSS dictionary
//!   and as the DEFLATE history buffer
//! - [`bitstream`]: LSB-first bit reader for Huffman-coded streams
//! - [`error`]: Error type and its classification into error kinds
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ L3: Container / Assets                                  │
//! │     BSA archive, IMG images, palettes                   │
//! ├─────────────────────────────────────────────────────────┤
//! │ L2: Codec                                               │
//! │     LZSS, DEFLATE (reference + flate2), INF cipher      │
//! ├─────────────────────────────────────────────────────────┤
//! │ L1: Plumbing (this crate)                               │
//! │     SlidingWindow, BitReader, BsaError                  │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use bsatool_core::SlidingWindow;
//!
//! let mut window: SlidingWindow<u8, 4> = SlidingWindow::new(0);
//! window.insert_all(b"ABCDEF");
//!
//! // Logical indices alias back into the buffer.
//! assert_eq!(*window.read_at(0), b'E');
//! assert_eq!(*window.read_at(4), b'E');
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bitstream;
pub mod error;
pub mod window;

// Re-exports for convenience
pub use bitstream::BitReader;
pub use error::{BsaError, ErrorKind, Result};
pub use window::SlidingWindow;
