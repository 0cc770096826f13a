//! Error types for BSATool operations.
//!
//! Every failure is reported through [`BsaError`]. Callers that only need to
//! know which family an error belongs to can use [`BsaError::kind`].

use std::io;
use thiserror::Error;

/// Broad classification of a [`BsaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Open/seek/read/write failure or a stream that ended too early.
    Io,
    /// Data inconsistent with the declared layout.
    Format,
    /// Decoded content that does not match its declared dimensions.
    Validation,
    /// Operation not legal in the current archive or entry state.
    State,
}

/// The main error type for BSATool operations.
#[derive(Debug, Error)]
pub enum BsaError {
    /// I/O error from underlying reader/writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Unexpected end of input.
    #[error("Unexpected end of data: expected {expected} more bytes")]
    UnexpectedEof {
        /// Number of bytes that were expected but not available.
        expected: usize,
    },

    /// Layout or header inconsistent with the data.
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the inconsistency.
        message: String,
    },

    /// Corrupted compressed data.
    #[error("Corrupted data at offset {offset}: {message}")]
    CorruptedData {
        /// Byte offset where corruption was detected.
        offset: u64,
        /// Description of the corruption.
        message: String,
    },

    /// Invalid Huffman code encountered during decompression.
    #[error("Invalid Huffman code at bit position {bit_position}")]
    InvalidHuffmanCode {
        /// Bit position where the invalid code was found.
        bit_position: u64,
    },

    /// Back-reference pointing before the start of the output.
    #[error("Invalid back-reference distance: {distance} exceeds history size {history_size}")]
    InvalidDistance {
        /// The invalid distance value.
        distance: usize,
        /// Bytes of history available.
        history_size: usize,
    },

    /// Unsupported compression flag in an image header.
    #[error("Unsupported compression flag: {flag:#04x}")]
    UnsupportedCompression {
        /// The flag value found.
        flag: u8,
    },

    /// Decoded pixel count differs from width * height.
    #[error("Pixel count mismatch: expected {expected}, found {found}")]
    PixelCountMismatch {
        /// Pixels implied by the image dimensions.
        expected: usize,
        /// Pixels actually decoded.
        found: usize,
    },

    /// Text that cannot be represented in the archive name encoding.
    #[error("Encoding error: {message}")]
    EncodingError {
        /// Description of the encoding error.
        message: String,
    },

    /// Entry name that would escape the extraction directory.
    #[error("Path traversal detected in entry: {path}")]
    PathTraversal {
        /// The suspicious name.
        path: String,
    },

    /// No archive is opened.
    #[error("No archive opened")]
    NotOpened,

    /// Entry index absent from the file table.
    #[error("Entry not found: index {index}")]
    EntryNotFound {
        /// The missing index.
        index: usize,
    },

    /// Transition not allowed from the entry's current state.
    #[error("Invalid state: {message}")]
    InvalidState {
        /// Description of the refused transition.
        message: String,
    },
}

/// Result type alias for BSATool operations.
pub type Result<T> = std::result::Result<T, BsaError>;

impl BsaError {
    /// Create an unexpected EOF error.
    pub fn unexpected_eof(expected: usize) -> Self {
        Self::UnexpectedEof { expected }
    }

    /// Create an invalid format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }

    /// Create a corrupted data error.
    pub fn corrupted(offset: u64, message: impl Into<String>) -> Self {
        Self::CorruptedData {
            offset,
            message: message.into(),
        }
    }

    /// Create an invalid Huffman code error.
    pub fn invalid_huffman(bit_position: u64) -> Self {
        Self::InvalidHuffmanCode { bit_position }
    }

    /// Create an invalid distance error.
    pub fn invalid_distance(distance: usize, history_size: usize) -> Self {
        Self::InvalidDistance {
            distance,
            history_size,
        }
    }

    /// Create an unsupported compression error.
    pub fn unsupported_compression(flag: u8) -> Self {
        Self::UnsupportedCompression { flag }
    }

    /// Create a pixel count mismatch error.
    pub fn pixel_count_mismatch(expected: usize, found: usize) -> Self {
        Self::PixelCountMismatch { expected, found }
    }

    /// Create an encoding error.
    pub fn encoding_error(message: impl Into<String>) -> Self {
        Self::EncodingError {
            message: message.into(),
        }
    }

    /// Create a path traversal error.
    pub fn path_traversal(path: impl Into<String>) -> Self {
        Self::PathTraversal { path: path.into() }
    }

    /// Create a not-opened error.
    pub fn not_opened() -> Self {
        Self::NotOpened
    }

    /// Create an entry not found error.
    pub fn entry_not_found(index: usize) -> Self {
        Self::EntryNotFound { index }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::UnexpectedEof { .. } => ErrorKind::Io,
            Self::InvalidFormat { .. }
            | Self::CorruptedData { .. }
            | Self::InvalidHuffmanCode { .. }
            | Self::InvalidDistance { .. }
            | Self::UnsupportedCompression { .. }
            | Self::EncodingError { .. }
            | Self::PathTraversal { .. } => ErrorKind::Format,
            Self::PixelCountMismatch { .. } => ErrorKind::Validation,
            Self::NotOpened | Self::EntryNotFound { .. } | Self::InvalidState { .. } => {
                ErrorKind::State
            }
        }
    }
}
