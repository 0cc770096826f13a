//! # BSATool Archive
//!
//! Reading and editing of Arena BSA archives.
//!
//! [`BsaArchive`] opens an archive lazily (only the file table is read),
//! stages additions, updates and deletions in memory, and commits them with
//! an atomic save. Payload bytes are handed out raw; decoding them is up to
//! the caller (see `bsatool-assets` and `bsatool-compression`).
//!
//! ## Example
//!
//! ```rust,no_run
//! use bsatool_archive::BsaArchive;
//!
//! let mut archive = BsaArchive::new();
//! archive.open_archive("GLOBAL.BSA")?;
//!
//! for file in archive.live_files() {
//!     println!("{:14} {:>8}", file.name(), file.size());
//! }
//!
//! let index = archive.add_file("NEWSKY.IMG")?;
//! archive.delete_file(0)?;
//! archive.cancel_delete_file(0)?;
//! archive.save_archive("GLOBAL.BSA")?;
//! assert!(archive.file(index).is_some());
//! # Ok::<(), bsatool_archive::BsaError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod bsa;

// Re-exports
pub use bsa::{BsaArchive, BsaFile, EditState, StagedUpdate};
pub use bsatool_core::error::{BsaError, ErrorKind, Result};
