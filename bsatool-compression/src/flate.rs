//! Library-backed DEFLATE decompression.
//!
//! Raw DEFLATE streams (no zlib or gzip wrapper) decoded with [`flate2`].
//! This is the production path; [`crate::inflate`] holds the reference
//! decoder it is cross-checked against.

use bsatool_core::error::{BsaError, Result};
use flate2::{Decompress, FlushDecompress, Status};
use tracing::warn;

/// Output growth step when the buffer fills up.
const OUTPUT_CHUNK: usize = 32 * 1024;

/// Decompress raw DEFLATE data, reporting why it failed.
///
/// The stream must reach its final block: input that runs out early is an
/// error, not a short result.
pub fn inflate_flate2(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = Decompress::new(false);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).clamp(64, OUTPUT_CHUNK));

    loop {
        let before = (decoder.total_in(), decoder.total_out());
        let status = decoder
            .decompress_vec(&data[before.0 as usize..], &mut out, FlushDecompress::None)
            .map_err(|err| BsaError::corrupted(decoder.total_in(), err.to_string()))?;

        match status {
            Status::StreamEnd => return Ok(out),
            _ if out.len() == out.capacity() => out.reserve(OUTPUT_CHUNK),
            _ if (decoder.total_in(), decoder.total_out()) == before => {
                return Err(BsaError::corrupted(
                    decoder.total_in(),
                    "DEFLATE stream ends before its final block",
                ));
            }
            _ => {}
        }
    }
}

/// Decompress raw DEFLATE data.
///
/// Returns an empty vector if the stream is invalid or truncated.
pub fn uncompress_deflate(data: &[u8]) -> Vec<u8> {
    inflate_flate2(data).unwrap_or_else(|err| {
        warn!(input_len = data.len(), %err, "DEFLATE decompression failed");
        Vec::new()
    })
}
