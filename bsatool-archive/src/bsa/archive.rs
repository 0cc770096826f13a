//! BSA archive reading, staged editing and saving.

use super::file::{BsaFile, EditState, StagedUpdate};
use super::table::{FILE_COUNT_SIZE, TABLE_ENTRY_SIZE, TableEntry, encode_name, read_table, table_size};
use bsatool_core::error::{BsaError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

/// An Arena BSA archive.
///
/// Entries are addressed by [`BsaFile::index`], which stays stable while the
/// archive is open. Edits are staged in memory and written by
/// [`save_archive`](Self::save_archive).
#[derive(Debug, Default)]
pub struct BsaArchive {
    path: Option<PathBuf>,
    handle: Option<File>,
    files: Vec<BsaFile>,
    file_number: u16,
    size: u64,
    modified_size: u64,
    opened: bool,
    modified: bool,
    next_index: usize,
}

impl BsaArchive {
    /// Create a closed archive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an archive file, closing any archive already open.
    ///
    /// Payloads are not read until requested.
    pub fn open_archive(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.close_archive();

        let mut handle = File::open(path)?;
        let size = handle.metadata()?.len();

        let mut count_bytes = [0u8; FILE_COUNT_SIZE as usize];
        handle.read_exact(&mut count_bytes).map_err(|err| {
            if err.kind() == std::io::ErrorKind::UnexpectedEof {
                BsaError::unexpected_eof(FILE_COUNT_SIZE as usize)
            } else {
                BsaError::Io(err)
            }
        })?;
        let file_number = u16::from_le_bytes(count_bytes);

        let table_len = table_size(usize::from(file_number));
        if FILE_COUNT_SIZE + table_len > size {
            return Err(BsaError::invalid_format(format!(
                "{file_number} entries need a {table_len}-byte table, archive is {size} bytes"
            )));
        }

        let table_start = size - table_len;
        handle.seek(SeekFrom::Start(table_start))?;
        let mut table = vec![0u8; usize::from(file_number) * TABLE_ENTRY_SIZE];
        handle.read_exact(&mut table)?;
        let entries = read_table(&table)?;

        let payload_len = table_start - FILE_COUNT_SIZE;
        let total: u64 = entries.iter().map(|e| u64::from(e.size)).sum();
        if total > payload_len {
            return Err(BsaError::invalid_format(format!(
                "entries declare {total} payload bytes, archive holds {payload_len}"
            )));
        }
        if total < payload_len {
            warn!(
                path = %path.display(),
                unused = payload_len - total,
                "archive has bytes not covered by the file table"
            );
        }

        let mut offset = FILE_COUNT_SIZE;
        let files = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                trace!(index, name = %entry.name, size = entry.size, offset, "table entry");
                let file = BsaFile {
                    index,
                    name: entry.name,
                    size: entry.size,
                    offset,
                    state: EditState::Unchanged,
                };
                offset += u64::from(entry.size);
                file
            })
            .collect::<Vec<_>>();

        debug!(path = %path.display(), files = file_number, size, "opened archive");

        self.next_index = files.len();
        self.files = files;
        self.file_number = file_number;
        self.size = size;
        self.path = Some(path.to_path_buf());
        self.handle = Some(handle);
        self.opened = true;
        self.recompute_modified_size();
        Ok(())
    }

    /// Close the archive and drop all staged edits.
    pub fn close_archive(&mut self) {
        if self.opened {
            debug!(path = ?self.path, "closed archive");
        }
        *self = Self::default();
    }

    /// Close any open archive and start an empty one with no backing file.
    pub fn create_new_archive(&mut self) {
        self.close_archive();
        self.opened = true;
        self.recompute_modified_size();
        debug!("created empty archive");
    }

    /// Path of the backing file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Number of entries when the archive was opened.
    pub fn file_number(&self) -> u16 {
        self.file_number
    }

    /// On-disk size of the backing file.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Size the archive will have once staged edits are saved.
    pub fn modified_size(&self) -> u64 {
        self.modified_size
    }

    /// All entries in table order, deleted ones included.
    pub fn files(&self) -> &[BsaFile] {
        &self.files
    }

    /// Entries that will be written on save.
    pub fn live_files(&self) -> impl Iterator<Item = &BsaFile> {
        self.files.iter().filter(|f| f.is_live())
    }

    /// Whether an archive is open.
    pub fn is_opened(&self) -> bool {
        self.opened
    }

    /// Whether edits are staged.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Entry with the given index.
    pub fn file(&self, index: usize) -> Option<&BsaFile> {
        self.files.iter().find(|f| f.index == index)
    }

    /// First live entry whose name matches, ignoring ASCII case.
    pub fn find_file(&self, name: &str) -> Option<&BsaFile> {
        self.live_files().find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Committed bytes of an entry.
    ///
    /// Empty for new entries, which have nothing in the archive file yet.
    pub fn get_file_data(&self, index: usize) -> Result<Vec<u8>> {
        self.ensure_opened()?;
        let file = self.lookup(index)?;

        let (Some(size), Some(handle)) = (file.committed_size(), self.handle.as_ref()) else {
            return Ok(Vec::new());
        };

        let mut reader: &File = handle;
        reader.seek(SeekFrom::Start(file.offset))?;
        let mut data = vec![0u8; size as usize];
        reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Bytes a save would write for an entry.
    pub fn get_staged_file_data(&self, index: usize) -> Result<Vec<u8>> {
        self.ensure_opened()?;
        let file = self.lookup(index)?;

        match &file.state {
            EditState::Unchanged => self.get_file_data(index),
            EditState::New { source } | EditState::Updated(StagedUpdate { source, .. }) => {
                Ok(fs::read(source)?)
            }
            EditState::Deleted { .. } => Err(BsaError::invalid_state(format!(
                "entry {index} is marked for deletion"
            ))),
        }
    }

    /// Stage a new entry named after the file at `path`.
    ///
    /// Returns the index of the new entry. Fails if a live entry already
    /// has that name, compared case-insensitively.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.ensure_opened()?;
        let path = path.as_ref();
        let name = entry_name(path)?;
        self.ensure_name_free(&name)?;
        let size = source_size(path)?;

        let index = self.next_index;
        self.next_index += 1;
        self.files.push(BsaFile {
            index,
            name,
            size,
            offset: 0,
            state: EditState::New {
                source: path.to_path_buf(),
            },
        });

        debug!(index, source = %path.display(), size, "staged new entry");
        self.mark_modified();
        Ok(index)
    }

    /// Stage replacement content for an entry.
    pub fn update_file(&mut self, path: impl AsRef<Path>, index: usize) -> Result<()> {
        self.ensure_opened()?;
        let path = path.as_ref();
        let size = source_size(path)?;
        let file = self.lookup_mut(index)?;

        file.state = match std::mem::take(&mut file.state) {
            EditState::Unchanged => EditState::Updated(StagedUpdate {
                source: path.to_path_buf(),
                original_size: file.size,
            }),
            EditState::Updated(update) => EditState::Updated(StagedUpdate {
                source: path.to_path_buf(),
                ..update
            }),
            EditState::New { .. } => EditState::New {
                source: path.to_path_buf(),
            },
            deleted @ EditState::Deleted { .. } => {
                file.state = deleted;
                return Err(BsaError::invalid_state(format!(
                    "entry {index} is marked for deletion"
                )));
            }
        };
        file.size = size;

        debug!(index, source = %path.display(), size, "staged update");
        self.mark_modified();
        Ok(())
    }

    /// Stage deletion of an entry.
    ///
    /// New entries are dropped outright; committed ones are hidden until
    /// save and can be restored with
    /// [`cancel_delete_file`](Self::cancel_delete_file).
    pub fn delete_file(&mut self, index: usize) -> Result<()> {
        self.ensure_opened()?;
        let position = self.position(index)?;
        let file = &mut self.files[position];

        match std::mem::take(&mut file.state) {
            EditState::New { .. } => {
                self.files.remove(position);
            }
            EditState::Unchanged => {
                file.state = EditState::Deleted {
                    pending_update: None,
                };
            }
            EditState::Updated(update) => {
                file.state = EditState::Deleted {
                    pending_update: Some(update),
                };
            }
            deleted @ EditState::Deleted { .. } => file.state = deleted,
        }

        debug!(index, "staged delete");
        self.mark_modified();
        Ok(())
    }

    /// Drop staged replacement content, restoring the committed size.
    ///
    /// No effect on entries without a staged update.
    pub fn cancel_update_file(&mut self, index: usize) -> Result<()> {
        self.ensure_opened()?;
        let file = self.lookup_mut(index)?;

        if let EditState::Updated(update) = &file.state {
            file.size = update.original_size;
            file.state = EditState::Unchanged;
            debug!(index, "cancelled update");
        }

        self.recompute_modified_size();
        Ok(())
    }

    /// Restore an entry marked for deletion, with any update it carried.
    ///
    /// No effect on entries that are not deleted. Fails if an entry added
    /// since the delete has taken the name.
    pub fn cancel_delete_file(&mut self, index: usize) -> Result<()> {
        self.ensure_opened()?;
        let file = self.lookup(index)?;
        if file.state.is_deleted() {
            // A live entry may have taken the name since the delete.
            self.ensure_name_free(&file.name)?;
        }
        let file = self.lookup_mut(index)?;

        if let EditState::Deleted { pending_update } = &mut file.state {
            file.state = match pending_update.take() {
                Some(update) => EditState::Updated(update),
                None => EditState::Unchanged,
            };
            debug!(index, "cancelled delete");
        }

        self.recompute_modified_size();
        Ok(())
    }

    /// Write the archive with all staged edits to `path`, then reopen it.
    ///
    /// The data goes to a temporary file beside `path` first, so saving over
    /// the open archive is safe.
    pub fn save_archive(&mut self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_opened()?;
        let path = path.as_ref();

        let live: Vec<&BsaFile> = self.live_files().collect();
        let count = u16::try_from(live.len()).map_err(|_| {
            BsaError::invalid_format(format!("{} entries exceed the table limit", live.len()))
        })?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = NamedTempFile::new_in(dir)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            writer.write_all(&count.to_le_bytes())?;

            let mut table = Vec::with_capacity(live.len());
            for file in &live {
                let data = self.get_staged_file_data(file.index)?;
                let size = u32::try_from(data.len()).map_err(|_| {
                    BsaError::invalid_format(format!("entry {} exceeds 4 GiB", file.name))
                })?;
                writer.write_all(&data)?;
                table.push(TableEntry {
                    name: file.name.clone(),
                    size,
                });
            }

            for entry in &table {
                entry.write(&mut writer)?;
            }
            writer.flush()?;
        }
        temp.as_file().sync_all()?;

        // Release the old handle so the rename can replace the open file.
        self.handle = None;
        if let Err(err) = temp.persist(path) {
            self.handle = self.path.as_deref().map(File::open).transpose()?;
            return Err(BsaError::Io(err.error));
        }

        debug!(path = %path.display(), files = count, "saved archive");
        self.open_archive(path)
    }

    /// Write an entry's committed bytes to `destination_folder/name`.
    ///
    /// Returns the path written.
    pub fn extract_file(&self, destination_folder: impl AsRef<Path>, index: usize) -> Result<PathBuf> {
        self.ensure_opened()?;
        let file = self.lookup(index)?;

        if file.committed_size().is_none() || self.handle.is_none() {
            return Err(BsaError::invalid_state(format!(
                "entry {index} has no data in the archive file"
            )));
        }
        if !is_safe_name(&file.name) {
            return Err(BsaError::path_traversal(file.name.clone()));
        }

        let data = self.get_file_data(index)?;
        let destination = destination_folder.as_ref().join(&file.name);
        fs::write(&destination, &data)?;

        debug!(index, path = %destination.display(), size = data.len(), "extracted entry");
        Ok(destination)
    }

    fn ensure_opened(&self) -> Result<()> {
        if self.opened {
            Ok(())
        } else {
            Err(BsaError::not_opened())
        }
    }

    fn position(&self, index: usize) -> Result<usize> {
        self.files
            .iter()
            .position(|f| f.index == index)
            .ok_or_else(|| BsaError::entry_not_found(index))
    }

    fn lookup(&self, index: usize) -> Result<&BsaFile> {
        self.file(index).ok_or_else(|| BsaError::entry_not_found(index))
    }

    /// Names compare case-insensitively, as `find_file` does.
    fn ensure_name_free(&self, name: &str) -> Result<()> {
        if self.find_file(name).is_some() {
            return Err(BsaError::invalid_state(format!(
                "an entry named {name} already exists"
            )));
        }
        Ok(())
    }

    fn lookup_mut(&mut self, index: usize) -> Result<&mut BsaFile> {
        self.files
            .iter_mut()
            .find(|f| f.index == index)
            .ok_or_else(|| BsaError::entry_not_found(index))
    }

    fn mark_modified(&mut self) {
        self.modified = true;
        self.recompute_modified_size();
    }

    fn recompute_modified_size(&mut self) {
        let (count, payload) = self
            .live_files()
            .fold((0usize, 0u64), |(count, payload), f| {
                (count + 1, payload + u64::from(f.size))
            });
        self.modified_size = FILE_COUNT_SIZE + payload + table_size(count);
    }
}

/// Archive name for a source file, validated against the table format.
fn entry_name(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BsaError::encoding_error(format!("{} has no usable file name", path.display())))?;
    encode_name(name)?;
    Ok(name.to_string())
}

fn source_size(path: &Path) -> Result<u32> {
    let len = fs::metadata(path)?.len();
    u32::try_from(len)
        .map_err(|_| BsaError::invalid_format(format!("{} exceeds 4 GiB", path.display())))
}

/// Whether a name stays inside the directory it is joined to.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_archive_refuses_operations() {
        let mut archive = BsaArchive::new();

        assert!(!archive.is_opened());
        assert!(matches!(archive.get_file_data(0), Err(BsaError::NotOpened)));
        assert!(matches!(archive.delete_file(0), Err(BsaError::NotOpened)));
        assert!(matches!(archive.add_file("X.IMG"), Err(BsaError::NotOpened)));
        assert!(matches!(archive.save_archive("out.bsa"), Err(BsaError::NotOpened)));
    }

    #[test]
    fn test_new_archive_is_empty() {
        let mut archive = BsaArchive::new();
        archive.create_new_archive();

        assert!(archive.is_opened());
        assert!(!archive.is_modified());
        assert!(archive.files().is_empty());
        assert_eq!(archive.modified_size(), 2);
        assert!(matches!(
            archive.cancel_delete_file(3),
            Err(BsaError::EntryNotFound { index: 3 })
        ));
    }

    #[test]
    fn test_safe_names() {
        assert!(is_safe_name("ARENA.BSA"));
        assert!(is_safe_name("..A"));
        assert!(!is_safe_name(".."));
        assert!(!is_safe_name("A/B"));
        assert!(!is_safe_name("A\\B"));
        assert!(!is_safe_name("C:X"));
        assert!(!is_safe_name(""));
    }
}
