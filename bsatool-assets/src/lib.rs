//! # BSATool Assets
//!
//! Decoders for Arena image assets:
//!
//! - [`Palette`]: 256-color lookup tables, from `.COL` files or raw blocks
//! - [`Img`]: IMG images, with or without the 12-byte header, stored raw,
//!   LZSS or DEFLATE compressed
//!
//! ## Example
//!
//! ```rust
//! use bsatool_assets::{Img, Palette};
//!
//! let img = Img::from_raw(vec![2; 16], 4, 4, Palette::default())?;
//! assert!(img.is_valid());
//! assert_eq!(img.pixels().unwrap().as_slice().len(), 16);
//! # Ok::<(), bsatool_assets::BsaError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod img;
pub mod palette;

// Re-exports
pub use bsatool_core::error::{BsaError, Result};
pub use img::{IMG_HEADER_SIZE, Img, ImgHeader, ImgOptions, PixelGrid};
pub use palette::{Palette, PaletteFormat, Rgb};
