//! Board files on the native file system.
//!
//! Each board is one version-1 JSON document named after its sanitized id.
//! Saves go through a sibling temp file and a rename, so a crash mid-write
//! leaves the previous board intact rather than a truncated document.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::board::{BoardData, BoardError};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BOARD_EXTENSION: &str = "json";
const PARTIAL_EXTENSION: &str = "json.partial";

/// Stores boards as JSON files in a directory.
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory
    /// if needed. Partial files left by an interrupted save are removed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        fs::create_dir_all(&base_path)
            .map_err(|e| StorageError::Io(format!("Failed to create storage directory: {e}")))?;
        let storage = Self { base_path };
        storage.sweep_partials();
        Ok(storage)
    }

    /// File storage in the platform data directory (`inkboard/boards`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("inkboard").join("boards"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_stem(id: &str) -> String {
        id.chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    fn board_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.{BOARD_EXTENSION}", Self::file_stem(id)))
    }

    fn partial_path(&self, id: &str) -> PathBuf {
        self.base_path.join(format!("{}.{PARTIAL_EXTENSION}", Self::file_stem(id)))
    }

    fn sweep_partials(&self) {
        let Ok(entries) = fs::read_dir(&self.base_path) else {
            return;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if is_partial(&path) {
                match fs::remove_file(&path) {
                    Ok(()) => log::warn!("Removed partial board file {}", path.display()),
                    Err(e) => log::warn!("Could not remove partial board file {}: {e}", path.display()),
                }
            }
        }
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(&format!(".{PARTIAL_EXTENSION}")))
}

fn write_atomically(partial: &Path, target: &Path, contents: &str) -> std::io::Result<()> {
    fs::write(partial, contents)?;
    fs::rename(partial, target).inspect_err(|_| {
        let _ = fs::remove_file(partial);
    })
}

impl Storage for FileStorage {
    fn save(&self, id: &str, board: &BoardData) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.board_path(id);
        let partial = self.partial_path(id);
        let json = board.to_json();
        Box::pin(async move {
            let json = json?;
            write_atomically(&partial, &path, &json)
                .map_err(|e| StorageError::Io(format!("Failed to write {}: {e}", path.display())))?;
            log::info!("Saved board to {}", path.display());
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<BoardData>> {
        let path = self.board_path(id);
        let id = id.to_string();
        Box::pin(async move {
            let json = match fs::read_to_string(&path) {
                Ok(json) => json,
                Err(e) if e.kind() == ErrorKind::NotFound => return Err(StorageError::NotFound(id)),
                Err(e) => return Err(StorageError::Io(format!("Failed to read {}: {e}", path.display()))),
            };
            BoardData::from_json(&json).map_err(|e| {
                if let BoardError::UnsupportedVersion(version) = &e {
                    log::warn!("Board {} has unsupported version {version}", path.display());
                }
                StorageError::Serialization(format!("Failed to parse {}: {e}", path.display()))
            })
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.board_path(id);
        Box::pin(async move {
            match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(StorageError::Io(format!("Failed to delete {}: {e}", path.display()))),
            }
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        let base = self.base_path.clone();
        Box::pin(async move {
            let entries = match fs::read_dir(&base) {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
                Err(e) => return Err(StorageError::Io(format!("Failed to read directory: {e}"))),
            };
            let mut ids: Vec<String> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| !is_partial(path))
                .filter(|path| path.extension().is_some_and(|ext| ext == BOARD_EXTENSION))
                .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
                .collect();
            ids.sort();
            Ok(ids)
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let path = self.board_path(id);
        Box::pin(async move { Ok(path.is_file()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;
    use tempfile::tempdir;

    fn storage_in(dir: &Path) -> FileStorage {
        FileStorage::new(dir.to_path_buf()).unwrap()
    }

    #[test]
    fn test_save_load_and_overwrite() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path());
        let mut board = BoardData::default();
        board.offset_x = -40.0;
        block_on(storage.save("test-board", &board)).unwrap();

        board.scale = 3.0;
        block_on(storage.save("test-board", &board)).unwrap();
        assert_eq!(block_on(storage.load("test-board")).unwrap(), board);
        assert!(!dir.path().join("test-board.json.partial").exists());
    }

    #[test]
    fn test_missing_board_is_not_found() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path());
        assert!(matches!(block_on(storage.load("nonexistent")), Err(StorageError::NotFound(id)) if id == "nonexistent"));
        block_on(storage.delete("nonexistent")).unwrap();
    }

    #[test]
    fn test_partial_files_are_swept_and_never_listed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("crashed.json.partial"), "{\"vers").unwrap();
        let storage = storage_in(dir.path());
        assert!(!dir.path().join("crashed.json.partial").exists());

        block_on(storage.save("b2", &BoardData::default())).unwrap();
        block_on(storage.save("b1", &BoardData::default())).unwrap();
        fs::write(dir.path().join("late.json.partial"), "{").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["b1".to_string(), "b2".to_string()]);

        block_on(storage.delete("b1")).unwrap();
        assert!(!block_on(storage.exists("b1")).unwrap());
    }

    #[test]
    fn test_ids_are_sanitized_into_file_names() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path());
        block_on(storage.save("team/board:with*special", &BoardData::default())).unwrap();
        assert!(dir.path().join("team_board_with_special.json").exists());
        assert!(block_on(storage.load("team/board:with*special")).is_ok());
    }

    #[test]
    fn test_foreign_version_and_corrupt_files_are_rejected() {
        let dir = tempdir().unwrap();
        let storage = storage_in(dir.path());
        fs::write(dir.path().join("future.json"), r#"{"version":2}"#).unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let future = block_on(storage.load("future"));
        assert!(matches!(&future, Err(StorageError::Serialization(msg)) if msg.contains("version 2")));
        assert!(matches!(block_on(storage.load("broken")), Err(StorageError::Serialization(_))));
        assert!(block_on(storage.exists("future")).unwrap());
    }
}
