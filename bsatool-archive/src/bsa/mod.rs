//! Arena BSA container.
//!
//! ## Layout
//!
//! ```text
//! +-------+------------------------------+----------------------------+
//! | count | payloads, in table order     | table: count x 18 bytes    |
//! |  u16  | (sizes from the table)       | name[14] + size u32        |
//! +-------+------------------------------+----------------------------+
//! ```
//!
//! Payload offsets are not stored; each is the sum of the sizes before it,
//! starting right after the count.

mod archive;
mod file;
pub mod table;

pub use archive::BsaArchive;
pub use file::{BsaFile, EditState, StagedUpdate};
