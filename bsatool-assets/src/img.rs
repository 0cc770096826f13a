//! IMG indexed-color images.
//!
//! ## Format
//!
//! ```text
//! +----------+----------+-------+--------+------+---------+----------+
//! | offset_x | offset_y | width | height | comp | palflag | data_len |
//! |   u16    |   u16    |  u16  |  u16   |  u8  |   u8    |   u16    |
//! +----------+----------+-------+--------+------+---------+----------+
//! | data_len bytes of pixel payload                                  |
//! +------------------------------------------------------------------+
//! | 768-byte palette block (only when palflag bit 0 is set)          |
//! +------------------------------------------------------------------+
//! ```
//!
//! All fields are little-endian. The payload decodes to one palette index per
//! pixel, row-major. Some images (wall textures, sky tiles) are stored without
//! the header; their dimensions come from the caller.
//!
//! An [`Img`] always keeps its raw fields. The decoded [`PixelGrid`] exists
//! only while the fields describe exactly `width * height` indices.

use crate::palette::{PALETTE_BLOCK_SIZE, Palette, PaletteFormat, Rgb};
use bsatool_compression::{decode_lzss, inflate_flate2};
use bsatool_core::error::{BsaError, Result};
use tracing::{debug, warn};

/// Size of the IMG header in bytes.
pub const IMG_HEADER_SIZE: usize = 12;

/// Values of the header compression flag.
pub mod compression {
    /// Raw palette indices.
    pub const NONE: u8 = 0x00;
    /// Arena LZSS.
    pub const LZSS: u8 = 0x04;
    /// Raw DEFLATE, prefixed by the `u16` uncompressed length.
    pub const DEFLATE: u8 = 0x08;
}

/// Palette flag bit requesting an embedded palette block.
pub const PALETTE_FLAG_EMBEDDED: u8 = 0x01;

/// IMG header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImgHeader {
    /// Horizontal draw offset.
    pub offset_x: u16,
    /// Vertical draw offset.
    pub offset_y: u16,
    /// Width in pixels.
    pub width: u16,
    /// Height in pixels.
    pub height: u16,
    /// Payload compression (see [`compression`]).
    pub compression_flag: u8,
    /// Palette flags (see [`PALETTE_FLAG_EMBEDDED`]).
    pub palette_flag: u8,
    /// Payload length in bytes.
    pub data_size: u16,
}

impl ImgHeader {
    /// Parse the header from the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < IMG_HEADER_SIZE {
            return Err(BsaError::unexpected_eof(IMG_HEADER_SIZE - data.len()));
        }

        let word = |at: usize| u16::from_le_bytes([data[at], data[at + 1]]);
        Ok(Self {
            offset_x: word(0),
            offset_y: word(2),
            width: word(4),
            height: word(6),
            compression_flag: data[8],
            palette_flag: data[9],
            data_size: word(10),
        })
    }

    /// Serialize the header.
    pub fn to_bytes(&self) -> [u8; IMG_HEADER_SIZE] {
        let mut out = [0u8; IMG_HEADER_SIZE];
        out[0..2].copy_from_slice(&self.offset_x.to_le_bytes());
        out[2..4].copy_from_slice(&self.offset_y.to_le_bytes());
        out[4..6].copy_from_slice(&self.width.to_le_bytes());
        out[6..8].copy_from_slice(&self.height.to_le_bytes());
        out[8] = self.compression_flag;
        out[9] = self.palette_flag;
        out[10..12].copy_from_slice(&self.data_size.to_le_bytes());
        out
    }

    /// Whether a palette block follows the payload.
    pub fn has_embedded_palette(&self) -> bool {
        self.palette_flag & PALETTE_FLAG_EMBEDDED != 0
    }

    /// Number of pixels described by the dimensions.
    pub fn pixel_count(&self) -> usize {
        usize::from(self.width) * usize::from(self.height)
    }
}

/// Options for IMG decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImgOptions {
    /// Channel encoding of embedded palette blocks.
    pub embedded_palette_format: PaletteFormat,
}

/// Decoded image: one color per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u16,
    height: u16,
    pixels: Vec<Rgb>,
}

impl PixelGrid {
    /// Width in pixels.
    pub fn width(&self) -> u16 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u16 {
        self.height
    }

    /// Color at `(x, y)`.
    pub fn get(&self, x: u16, y: u16) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(usize::from(y) * usize::from(self.width) + usize::from(x))
            .copied()
    }

    /// One row of pixels.
    pub fn row(&self, y: u16) -> Option<&[Rgb]> {
        if y >= self.height {
            return None;
        }
        let width = usize::from(self.width);
        let start = usize::from(y) * width;
        self.pixels.get(start..start + width)
    }

    /// All pixels, row-major.
    pub fn as_slice(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Packed `RGBRGB...` bytes.
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }
}

#[derive(Debug, Clone)]
struct Decoded {
    indices: Vec<u8>,
    grid: PixelGrid,
}

/// An IMG image.
#[derive(Debug, Clone)]
pub struct Img {
    header: ImgHeader,
    palette: Palette,
    image_data: Vec<u8>,
    decoded: Option<Decoded>,
}

impl Img {
    /// Parse an IMG file with its header.
    ///
    /// `palette` is used unless the image embeds its own. Malformed headers
    /// and short payloads are errors; a payload that does not decode to
    /// `width * height` indices yields an image with no pixel grid.
    pub fn new(data: &[u8], palette: &Palette) -> Result<Self> {
        Self::with_options(data, palette, ImgOptions::default())
    }

    /// Parse an IMG file with explicit options.
    pub fn with_options(data: &[u8], palette: &Palette, options: ImgOptions) -> Result<Self> {
        let header = ImgHeader::parse(data)?;

        let payload_end = IMG_HEADER_SIZE + usize::from(header.data_size);
        let image_data = data.get(IMG_HEADER_SIZE..payload_end).ok_or_else(|| {
            BsaError::invalid_format(format!(
                "IMG declares {} payload bytes, {} available",
                header.data_size,
                data.len() - IMG_HEADER_SIZE
            ))
        })?;

        let palette = if header.has_embedded_palette() {
            let block = data
                .get(payload_end..)
                .filter(|rest| rest.len() >= PALETTE_BLOCK_SIZE)
                .ok_or_else(|| BsaError::invalid_format("IMG embedded palette is truncated"))?;
            Palette::from_rgb_block(block, options.embedded_palette_format)?
        } else {
            palette.clone()
        };

        let mut img = Self {
            header,
            palette,
            image_data: image_data.to_vec(),
            decoded: None,
        };
        img.refresh();
        Ok(img)
    }

    /// Build a headerless image: `data` is the raw pixel payload.
    ///
    /// Fails if the payload is longer than a header can declare.
    pub fn from_raw(data: Vec<u8>, width: u16, height: u16, palette: Palette) -> Result<Self> {
        let header = ImgHeader {
            width,
            height,
            compression_flag: compression::NONE,
            data_size: declared_size(&data)?,
            ..ImgHeader::default()
        };

        let mut img = Self {
            header,
            palette,
            image_data: data,
            decoded: None,
        };
        img.refresh();
        Ok(img)
    }

    /// Re-run decoding and report why it fails, if it does.
    pub fn validate(&self) -> Result<()> {
        self.decode().map(|_| ())
    }

    /// Whether the fields decode to a complete pixel grid.
    pub fn is_valid(&self) -> bool {
        self.decoded.is_some()
    }

    /// Decoded pixel grid, `None` while the image is invalid.
    pub fn pixels(&self) -> Option<&PixelGrid> {
        self.decoded.as_ref().map(|d| &d.grid)
    }

    /// Decoded palette indices, `None` while the image is invalid.
    pub fn indices(&self) -> Option<&[u8]> {
        self.decoded.as_ref().map(|d| d.indices.as_slice())
    }

    /// Header fields.
    pub fn header(&self) -> &ImgHeader {
        &self.header
    }

    /// Raw pixel payload as stored.
    pub fn image_data(&self) -> &[u8] {
        &self.image_data
    }

    /// Palette used to resolve indices.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Horizontal draw offset.
    pub fn offset_x(&self) -> u16 {
        self.header.offset_x
    }

    /// Vertical draw offset.
    pub fn offset_y(&self) -> u16 {
        self.header.offset_y
    }

    /// Width in pixels.
    pub fn width(&self) -> u16 {
        self.header.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u16 {
        self.header.height
    }

    /// Payload compression flag.
    pub fn compression_flag(&self) -> u8 {
        self.header.compression_flag
    }

    /// Palette flag.
    pub fn palette_flag(&self) -> u8 {
        self.header.palette_flag
    }

    /// Declared payload length.
    pub fn data_size(&self) -> u16 {
        self.header.data_size
    }

    /// Set the horizontal draw offset.
    pub fn set_offset_x(&mut self, value: u16) {
        self.header.offset_x = value;
        self.refresh();
    }

    /// Set the vertical draw offset.
    pub fn set_offset_y(&mut self, value: u16) {
        self.header.offset_y = value;
        self.refresh();
    }

    /// Set the width.
    pub fn set_width(&mut self, value: u16) {
        self.header.width = value;
        self.refresh();
    }

    /// Set the height.
    pub fn set_height(&mut self, value: u16) {
        self.header.height = value;
        self.refresh();
    }

    /// Set the compression flag.
    pub fn set_compression_flag(&mut self, value: u8) {
        self.header.compression_flag = value;
        self.refresh();
    }

    /// Set the palette flag.
    pub fn set_palette_flag(&mut self, value: u8) {
        self.header.palette_flag = value;
        self.refresh();
    }

    /// Set the declared payload length.
    pub fn set_data_size(&mut self, value: u16) {
        self.header.data_size = value;
        self.refresh();
    }

    /// Replace the palette.
    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
        self.refresh();
    }

    /// Replace the raw payload. The declared length follows it.
    ///
    /// A payload longer than `u16::MAX` bytes is refused and the image is
    /// left unchanged.
    pub fn set_image_data(&mut self, data: Vec<u8>) -> Result<()> {
        self.header.data_size = declared_size(&data)?;
        self.image_data = data;
        self.refresh();
        Ok(())
    }

    fn refresh(&mut self) {
        self.decoded = match self.decode() {
            Ok(decoded) => {
                debug!(
                    width = self.header.width,
                    height = self.header.height,
                    compression = self.header.compression_flag,
                    "decoded IMG"
                );
                Some(decoded)
            }
            Err(err) => {
                warn!(
                    width = self.header.width,
                    height = self.header.height,
                    compression = self.header.compression_flag,
                    %err,
                    "IMG is invalid"
                );
                None
            }
        };
    }

    fn decode(&self) -> Result<Decoded> {
        let indices = self.decode_indices()?;

        let expected = self.header.pixel_count();
        if indices.len() != expected {
            return Err(BsaError::pixel_count_mismatch(expected, indices.len()));
        }

        let grid = PixelGrid {
            width: self.header.width,
            height: self.header.height,
            pixels: indices.iter().map(|&i| self.palette.color(i)).collect(),
        };
        Ok(Decoded { indices, grid })
    }

    fn decode_indices(&self) -> Result<Vec<u8>> {
        match self.header.compression_flag {
            compression::NONE => Ok(self.image_data.clone()),
            compression::LZSS => decode_lzss(&self.image_data),
            compression::DEFLATE => {
                let (prefix, stream) = self
                    .image_data
                    .split_at_checked(2)
                    .ok_or_else(|| BsaError::unexpected_eof(2 - self.image_data.len()))?;
                let declared = usize::from(u16::from_le_bytes([prefix[0], prefix[1]]));
                let out = inflate_flate2(stream)?;
                if out.len() != declared {
                    return Err(BsaError::invalid_format(format!(
                        "DEFLATE payload declares {} bytes, decoded {}",
                        declared,
                        out.len()
                    )));
                }
                Ok(out)
            }
            other => Err(BsaError::unsupported_compression(other)),
        }
    }
}

/// The header's `data_len` for a payload.
fn declared_size(data: &[u8]) -> Result<u16> {
    u16::try_from(data.len()).map_err(|_| {
        BsaError::invalid_format(format!(
            "IMG payload of {} bytes exceeds the {} byte header limit",
            data.len(),
            u16::MAX
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(width: u16, height: u16, data_size: u16) -> ImgHeader {
        ImgHeader {
            width,
            height,
            data_size,
            ..ImgHeader::default()
        }
    }

    #[test]
    fn test_header_layout() {
        let header = ImgHeader {
            offset_x: 0x0102,
            offset_y: 0x0304,
            width: 0x0506,
            height: 0x0708,
            compression_flag: 0x04,
            palette_flag: 0x01,
            data_size: 0x0A0B,
        };
        let bytes = header.to_bytes();

        assert_eq!(
            bytes,
            [0x02, 0x01, 0x04, 0x03, 0x06, 0x05, 0x08, 0x07, 0x04, 0x01, 0x0B, 0x0A]
        );
        assert_eq!(ImgHeader::parse(&bytes).unwrap(), header);
    }

    #[test]
    fn test_short_header() {
        let err = ImgHeader::parse(&[0u8; 5]).unwrap_err();
        assert!(matches!(err, BsaError::UnexpectedEof { expected: 7 }));
    }

    #[test]
    fn test_payload_shorter_than_declared() {
        let mut data = header(2, 2, 10).to_bytes().to_vec();
        data.extend_from_slice(&[0, 1, 2, 3]);

        assert!(Img::new(&data, &Palette::default()).is_err());
    }

    #[test]
    fn test_pixel_count_mismatch_is_invalid() {
        let mut data = header(3, 3, 4).to_bytes().to_vec();
        data.extend_from_slice(&[0, 1, 2, 3]);

        let img = Img::new(&data, &Palette::default()).unwrap();
        assert!(!img.is_valid());
        assert!(img.pixels().is_none());
        assert!(matches!(
            img.validate(),
            Err(BsaError::PixelCountMismatch { expected: 9, found: 4 })
        ));
    }

    #[test]
    fn test_setter_revalidates() {
        let mut img = Img::from_raw(vec![7; 6], 3, 3, Palette::default()).unwrap();
        assert!(!img.is_valid());

        img.set_height(2);
        assert!(img.is_valid());
        assert_eq!(img.pixels().unwrap().get(2, 1), Some(Rgb::new(7, 7, 7)));

        img.set_width(4);
        assert!(!img.is_valid());
    }

    #[test]
    fn test_unknown_compression_is_invalid() {
        let mut img = Img::from_raw(vec![0; 4], 2, 2, Palette::default()).unwrap();
        assert!(img.is_valid());

        img.set_compression_flag(0x02);
        assert!(!img.is_valid());
        assert!(matches!(
            img.validate(),
            Err(BsaError::UnsupportedCompression { flag: 0x02 })
        ));
    }

    #[test]
    fn test_oversized_payload_is_refused() {
        let mut img = Img::from_raw(vec![3; 4], 2, 2, Palette::default()).unwrap();

        let err = img.set_image_data(vec![0; 65_536]).unwrap_err();
        assert_eq!(err.kind(), bsatool_core::error::ErrorKind::Format);
        assert_eq!(img.header().data_size, 4);
        assert_eq!(img.image_data(), &[3; 4]);
        assert!(img.is_valid());

        assert!(Img::from_raw(vec![0; 65_536], 256, 256, Palette::default()).is_err());

        // The largest declarable payload still round-trips through the header.
        img.set_image_data(vec![1; 65_535]).unwrap();
        assert_eq!(&img.header().to_bytes()[10..], &[0xFF, 0xFF]);
    }

    #[test]
    fn test_grid_rows() {
        let img = Img::from_raw(vec![1, 2, 3, 4, 5, 6], 3, 2, Palette::default()).unwrap();
        let grid = img.pixels().unwrap();

        assert_eq!(grid.row(1).unwrap()[0], Rgb::new(4, 4, 4));
        assert!(grid.row(2).is_none());
        assert!(grid.get(3, 0).is_none());
        assert_eq!(grid.to_rgb_bytes().len(), 18);
    }
}
