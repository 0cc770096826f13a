//! End-to-end IMG decoding.

use bsatool_assets::img::{PALETTE_FLAG_EMBEDDED, compression};
use bsatool_assets::palette::PALETTE_BLOCK_SIZE;
use bsatool_assets::{Img, ImgHeader, ImgOptions, Palette, PaletteFormat, Rgb};
use bsatool_compression::compress_lzss;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::io::Write;

fn palette_with(index: u8, color: Rgb) -> Palette {
    let mut colors = *Palette::grayscale().colors();
    colors[index as usize] = color;
    Palette::new(colors)
}

fn img_bytes(width: u16, height: u16, compression_flag: u8, payload: &[u8]) -> Vec<u8> {
    let header = ImgHeader {
        width,
        height,
        compression_flag,
        data_size: payload.len() as u16,
        ..ImgHeader::default()
    };
    let mut data = header.to_bytes().to_vec();
    data.extend_from_slice(payload);
    data
}

fn checkerboard(width: u16, height: u16) -> Vec<u8> {
    (0..height)
        .flat_map(|y| (0..width).map(move |x| ((x / 4 + y / 4) % 2) as u8 * 9))
        .collect()
}

#[test]
fn test_uniform_4x4() {
    let color = Rgb::new(10, 20, 30);
    let palette = palette_with(2, color);
    let data = img_bytes(4, 4, compression::NONE, &[2; 16]);

    let img = Img::new(&data, &palette).unwrap();
    assert!(img.is_valid());

    let grid = img.pixels().unwrap();
    assert_eq!((grid.width(), grid.height()), (4, 4));
    assert!(grid.as_slice().iter().all(|&c| c == color));
    assert_eq!(img.indices().unwrap(), &[2; 16]);
}

#[test]
fn test_uniform_4x4_headerless() {
    let color = Rgb::new(10, 20, 30);
    let img = Img::from_raw(vec![2; 16], 4, 4, palette_with(2, color)).unwrap();

    let grid = img.pixels().unwrap();
    assert_eq!(grid.get(3, 3), Some(color));
    assert_eq!(grid.as_slice().len(), 16);
}

#[test]
fn test_lzss_payload() {
    let indices = checkerboard(32, 16);
    let data = img_bytes(32, 16, compression::LZSS, &compress_lzss(&indices));

    let img = Img::new(&data, &Palette::default()).unwrap();
    assert_eq!(img.indices().unwrap(), indices.as_slice());
    assert_eq!(img.pixels().unwrap().get(4, 0), Some(Rgb::new(9, 9, 9)));
}

#[test]
fn test_lzss_payload_wrong_dimensions() {
    let indices = checkerboard(32, 16);
    let data = img_bytes(32, 15, compression::LZSS, &compress_lzss(&indices));

    let img = Img::new(&data, &Palette::default()).unwrap();
    assert!(!img.is_valid());
    assert!(img.indices().is_none());
}

#[test]
fn test_deflate_payload() {
    let indices = checkerboard(20, 20);
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&indices).unwrap();

    let mut payload = (indices.len() as u16).to_le_bytes().to_vec();
    payload.extend(encoder.finish().unwrap());
    let data = img_bytes(20, 20, compression::DEFLATE, &payload);

    let img = Img::new(&data, &Palette::default()).unwrap();
    assert_eq!(img.indices().unwrap(), indices.as_slice());
}

#[test]
fn test_embedded_palette_overrides_supplied() {
    let mut data = img_bytes(2, 1, compression::NONE, &[1, 0]);
    data[9] = PALETTE_FLAG_EMBEDDED;
    let mut block = vec![0u8; PALETTE_BLOCK_SIZE];
    block[3..6].copy_from_slice(&[63, 0, 16]);
    data.extend_from_slice(&block);

    let img = Img::new(&data, &Palette::grayscale()).unwrap();
    assert_eq!(img.pixels().unwrap().get(0, 0), Some(Rgb::new(255, 0, 65)));

    let options = ImgOptions {
        embedded_palette_format: PaletteFormat::Rgb8,
    };
    let img = Img::with_options(&data, &Palette::grayscale(), options).unwrap();
    assert_eq!(img.pixels().unwrap().get(0, 0), Some(Rgb::new(63, 0, 16)));
}

#[test]
fn test_embedded_palette_truncated() {
    let mut data = img_bytes(2, 1, compression::NONE, &[1, 0]);
    data[9] = PALETTE_FLAG_EMBEDDED;
    data.extend_from_slice(&[0u8; 100]);

    assert!(Img::new(&data, &Palette::default()).is_err());
}

#[test]
fn test_replace_payload_and_palette() {
    let mut img = Img::from_raw(vec![0; 4], 2, 2, Palette::default()).unwrap();

    img.set_image_data(compress_lzss(&[5, 6, 7, 8])).unwrap();
    assert!(!img.is_valid());

    img.set_compression_flag(compression::LZSS);
    assert_eq!(img.indices().unwrap(), &[5, 6, 7, 8]);

    let red = Rgb::new(200, 0, 0);
    img.set_palette(palette_with(8, red));
    assert_eq!(img.pixels().unwrap().get(1, 1), Some(red));
}
