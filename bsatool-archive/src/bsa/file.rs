//! Archive entries and their staged edit state.

use std::path::{Path, PathBuf};

/// Replacement content staged for a committed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedUpdate {
    /// File holding the replacement bytes.
    pub source: PathBuf,
    /// Size of the committed payload being replaced.
    pub original_size: u32,
}

/// Pending edit of an entry, applied on save.
///
/// ```text
/// Unchanged ──update──▶ Updated ──cancel──▶ Unchanged
///     │                    │
///   delete               delete
///     ▼                    ▼
/// Deleted { None }     Deleted { Some(update) } ──cancel──▶ Updated
///
/// New ──delete──▶ (removed from the table)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    /// Committed bytes, untouched.
    #[default]
    Unchanged,
    /// Added since the last save; content lives in `source`.
    New {
        /// File holding the entry bytes.
        source: PathBuf,
    },
    /// Committed entry with replacement content.
    Updated(StagedUpdate),
    /// Committed entry hidden until save.
    Deleted {
        /// Update to restore if the delete is cancelled.
        pending_update: Option<StagedUpdate>,
    },
}

impl EditState {
    /// Whether the entry will be written on save.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Deleted { .. })
    }

    /// Whether the entry was added since the last save.
    pub fn is_new(&self) -> bool {
        matches!(self, Self::New { .. })
    }

    /// Whether the entry carries replacement content.
    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated(_))
    }

    /// Whether the entry is marked for deletion.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted { .. })
    }

    /// File the staged bytes are read from, if not the archive itself.
    pub fn source(&self) -> Option<&Path> {
        match self {
            Self::New { source } | Self::Updated(StagedUpdate { source, .. }) => {
                Some(source.as_path())
            }
            Self::Unchanged | Self::Deleted { .. } => None,
        }
    }
}

/// One entry of a BSA archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BsaFile {
    pub(crate) index: usize,
    pub(crate) name: String,
    pub(crate) size: u32,
    pub(crate) offset: u64,
    pub(crate) state: EditState,
}

impl BsaFile {
    /// Stable identifier of the entry within its archive session.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Entry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the bytes the entry will have after save.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Offset of the committed payload in the archive file.
    ///
    /// Meaningless for [`EditState::New`] entries.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Pending edit.
    pub fn state(&self) -> &EditState {
        &self.state
    }

    /// Whether the entry will be written on save.
    pub fn is_live(&self) -> bool {
        self.state.is_live()
    }

    /// Size of the payload stored in the archive file, `None` for new entries.
    pub fn committed_size(&self) -> Option<u32> {
        match &self.state {
            EditState::Unchanged | EditState::Deleted { pending_update: None } => Some(self.size),
            EditState::Updated(update)
            | EditState::Deleted {
                pending_update: Some(update),
            } => Some(update.original_size),
            EditState::New { .. } => None,
        }
    }
}
