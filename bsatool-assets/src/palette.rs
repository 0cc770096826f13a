//! Indexed color palettes.
//!
//! Arena palettes hold 256 RGB triples. They come in two encodings:
//!
//! - **8-bit** (`.COL` files): each channel is a full byte
//! - **6-bit VGA** (palettes embedded in IMG files): each channel is 0-63
//!   and is scaled up to 0-255 on load

use bsatool_core::error::{BsaError, Result};
use tracing::debug;

/// Number of colors in a palette.
pub const PALETTE_SIZE: usize = 256;

/// Size in bytes of a raw palette block (256 RGB triples).
pub const PALETTE_BLOCK_SIZE: usize = PALETTE_SIZE * 3;

/// Size of the `.COL` file header (file length + version).
pub const COL_HEADER_SIZE: usize = 8;

/// Version tag found in `.COL` headers.
pub const COL_VERSION: u32 = 0xB123;

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Channel encoding of a raw palette block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteFormat {
    /// 8 bits per channel.
    Rgb8,
    /// 6 bits per channel (VGA DAC values).
    #[default]
    Vga6,
}

impl PaletteFormat {
    /// Expand a stored channel value to 8 bits.
    #[inline]
    fn expand(self, value: u8) -> u8 {
        match self {
            Self::Rgb8 => value,
            Self::Vga6 => {
                let v = value & 0x3F;
                (v << 2) | (v >> 4)
            }
        }
    }
}

/// A 256-entry color lookup table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgb; PALETTE_SIZE],
}

impl Palette {
    /// Create a palette from its colors.
    pub fn new(colors: [Rgb; PALETTE_SIZE]) -> Self {
        Self { colors }
    }

    /// Gray ramp where index `i` maps to `(i, i, i)`.
    pub fn grayscale() -> Self {
        Self {
            colors: std::array::from_fn(|i| Rgb::new(i as u8, i as u8, i as u8)),
        }
    }

    /// Read a raw block of 256 RGB triples.
    ///
    /// Bytes past the block are ignored.
    pub fn from_rgb_block(data: &[u8], format: PaletteFormat) -> Result<Self> {
        if data.len() < PALETTE_BLOCK_SIZE {
            return Err(BsaError::unexpected_eof(PALETTE_BLOCK_SIZE - data.len()));
        }

        let colors = std::array::from_fn(|i| {
            let triple = &data[i * 3..i * 3 + 3];
            Rgb::new(
                format.expand(triple[0]),
                format.expand(triple[1]),
                format.expand(triple[2]),
            )
        });

        Ok(Self { colors })
    }

    /// Read a `.COL` palette file.
    ///
    /// Layout: `u32` file length, `u32` version, then 768 bytes of 8-bit RGB.
    pub fn from_col(data: &[u8]) -> Result<Self> {
        if data.len() < COL_HEADER_SIZE {
            return Err(BsaError::unexpected_eof(COL_HEADER_SIZE - data.len()));
        }

        let declared_len = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        if version != COL_VERSION {
            debug!(version = format_args!("{version:#x}"), "unexpected COL version");
        }
        if declared_len as usize > data.len() {
            return Err(BsaError::invalid_format(format!(
                "COL declares {} bytes, file has {}",
                declared_len,
                data.len()
            )));
        }

        Self::from_rgb_block(&data[COL_HEADER_SIZE..], PaletteFormat::Rgb8)
    }

    /// Color for a palette index.
    #[inline]
    pub fn color(&self, index: u8) -> Rgb {
        self.colors[index as usize]
    }

    /// All colors in index order.
    pub fn colors(&self) -> &[Rgb; PALETTE_SIZE] {
        &self.colors
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::grayscale()
    }
}
