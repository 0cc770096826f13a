//! BSA file table codec.
//!
//! The table trails the payloads. Each entry is 18 bytes: a 14-byte
//! NUL-padded name in Windows-1252 followed by the payload size as a
//! little-endian `u32`.

use bsatool_core::error::{BsaError, Result};
use encoding_rs::WINDOWS_1252;
use std::io::Write;

/// Size of the leading file count field.
pub const FILE_COUNT_SIZE: u64 = 2;

/// Width of the name field.
pub const NAME_LENGTH: usize = 14;

/// Size of one table entry.
pub const TABLE_ENTRY_SIZE: usize = NAME_LENGTH + 4;

/// One parsed table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Entry name.
    pub name: String,
    /// Payload size in bytes.
    pub size: u32,
}

impl TableEntry {
    /// Parse an entry from its 18 bytes.
    pub fn parse(bytes: &[u8; TABLE_ENTRY_SIZE]) -> Self {
        let size = u32::from_le_bytes([bytes[14], bytes[15], bytes[16], bytes[17]]);
        Self {
            name: decode_name(&bytes[..NAME_LENGTH]),
            size,
        }
    }

    /// Write the entry.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&encode_name(&self.name)?)?;
        writer.write_all(&self.size.to_le_bytes())?;
        Ok(())
    }
}

/// Byte length of a table with `count` entries.
pub fn table_size(count: usize) -> u64 {
    count as u64 * TABLE_ENTRY_SIZE as u64
}

/// Decode a name field, stopping at the first NUL.
pub fn decode_name(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    let (decoded, _) = WINDOWS_1252.decode_without_bom_handling(&field[..end]);
    decoded.into_owned()
}

/// Encode a name into a NUL-padded field.
///
/// Fails for empty names, names containing NUL, characters outside
/// Windows-1252, or names longer than the field.
pub fn encode_name(name: &str) -> Result<[u8; NAME_LENGTH]> {
    if name.is_empty() {
        return Err(BsaError::encoding_error("entry name is empty"));
    }
    if name.contains('\0') {
        return Err(BsaError::encoding_error(format!("entry name {name:?} contains NUL")));
    }

    let (encoded, _, had_errors) = WINDOWS_1252.encode(name);
    if had_errors {
        return Err(BsaError::encoding_error(format!(
            "entry name {name:?} is not representable in Windows-1252"
        )));
    }
    if encoded.len() > NAME_LENGTH {
        return Err(BsaError::encoding_error(format!(
            "entry name {name:?} is {} bytes, limit is {NAME_LENGTH}",
            encoded.len()
        )));
    }

    let mut field = [0u8; NAME_LENGTH];
    field[..encoded.len()].copy_from_slice(&encoded);
    Ok(field)
}

/// Parse a whole table.
pub fn read_table(bytes: &[u8]) -> Result<Vec<TableEntry>> {
    let chunks = bytes.chunks_exact(TABLE_ENTRY_SIZE);
    if !chunks.remainder().is_empty() {
        return Err(BsaError::invalid_format(format!(
            "file table of {} bytes is not a multiple of {TABLE_ENTRY_SIZE}",
            bytes.len()
        )));
    }

    Ok(chunks
        .filter_map(|chunk| <&[u8; TABLE_ENTRY_SIZE]>::try_from(chunk).ok())
        .map(TableEntry::parse)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_layout() {
        let entry = TableEntry {
            name: "ARENA.IMG".to_string(),
            size: 0x0102_0304,
        };
        let mut out = Vec::new();
        entry.write(&mut out).unwrap();

        assert_eq!(out.len(), TABLE_ENTRY_SIZE);
        assert_eq!(&out[..9], b"ARENA.IMG");
        assert!(out[9..14].iter().all(|&b| b == 0));
        assert_eq!(&out[14..], &[0x04, 0x03, 0x02, 0x01]);

        let bytes: [u8; TABLE_ENTRY_SIZE] = out.try_into().unwrap();
        assert_eq!(TableEntry::parse(&bytes), entry);
    }

    #[test]
    fn test_full_width_name() {
        let field = encode_name("ABCDEFGHIJ.IMG").unwrap();
        assert_eq!(decode_name(&field), "ABCDEFGHIJ.IMG");
    }

    #[test]
    fn test_windows_1252_name() {
        let field = encode_name("CAFÉ.TXT").unwrap();
        assert_eq!(field[3], 0xC9);
        assert_eq!(decode_name(&field), "CAFÉ.TXT");
    }

    #[test]
    fn test_rejected_names() {
        assert!(encode_name("").is_err());
        assert!(encode_name("ABCDEFGHIJK.IMG").is_err());
        assert!(encode_name("日本.IMG").is_err());
        assert!(encode_name("A\0B").is_err());
    }

    #[test]
    fn test_read_table() {
        let mut bytes = Vec::new();
        for (name, size) in [("A.IMG", 10u32), ("B.COL", 776)] {
            TableEntry {
                name: name.to_string(),
                size,
            }
            .write(&mut bytes)
            .unwrap();
        }

        let entries = read_table(&bytes).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].name, "B.COL");
        assert_eq!(entries[1].size, 776);

        assert!(read_table(&bytes[..20]).is_err());
    }
}
