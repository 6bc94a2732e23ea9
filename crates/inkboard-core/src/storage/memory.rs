//! Process-local storage.

use super::{BoxFuture, Storage, StorageError, StorageResult};
use crate::board::BoardData;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

/// Keeps serialized board documents in memory, so a load goes through the
/// same parse and version check as a file or remote load.
#[derive(Default)]
pub struct MemoryStorage {
    documents: RwLock<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a raw document as if a peer had written it.
    pub fn insert_raw(&self, id: &str, json: impl Into<String>) -> StorageResult<()> {
        self.documents
            .write()
            .map_err(poisoned)?
            .insert(id.to_string(), json.into());
        Ok(())
    }

    /// Number of stored boards.
    pub fn len(&self) -> usize {
        self.documents.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: PoisonError<T>) -> StorageError {
    StorageError::Other("memory storage lock poisoned".to_string())
}

impl Storage for MemoryStorage {
    fn save(&self, id: &str, board: &BoardData) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        let json = board.to_json();
        Box::pin(async move {
            let json = json?;
            self.documents.write().map_err(poisoned)?.insert(id, json);
            Ok(())
        })
    }

    fn load(&self, id: &str) -> BoxFuture<'_, StorageResult<BoardData>> {
        let id = id.to_string();
        Box::pin(async move {
            let documents = self.documents.read().map_err(poisoned)?;
            let json = documents.get(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            Ok(BoardData::from_json(json)?)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            self.documents.write().map_err(poisoned)?.remove(&id);
            Ok(())
        })
    }

    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<String>>> {
        Box::pin(async move {
            let documents = self.documents.read().map_err(poisoned)?;
            Ok(documents.keys().cloned().collect())
        })
    }

    fn exists(&self, id: &str) -> BoxFuture<'_, StorageResult<bool>> {
        let id = id.to_string();
        Box::pin(async move {
            let documents = self.documents.read().map_err(poisoned)?;
            Ok(documents.contains_key(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_util::block_on;

    #[test]
    fn test_save_then_load_board() {
        let storage = MemoryStorage::new();
        let mut board = BoardData::default();
        board.scale = 2.5;
        board.next_object_id = 7;

        block_on(storage.save("team", &board)).unwrap();
        assert_eq!(block_on(storage.load("team")).unwrap(), board);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_missing_board() {
        let storage = MemoryStorage::new();
        assert!(matches!(block_on(storage.load("nope")), Err(StorageError::NotFound(id)) if id == "nope"));
    }

    #[test]
    fn test_other_version_is_rejected_on_load() {
        let storage = MemoryStorage::new();
        storage.insert_raw("future", r#"{"version":2}"#).unwrap();
        assert!(matches!(block_on(storage.load("future")), Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_list_exists_delete() {
        let storage = MemoryStorage::new();
        let board = BoardData::default();
        block_on(storage.save("b", &board)).unwrap();
        block_on(storage.save("a", &board)).unwrap();
        assert_eq!(block_on(storage.list()).unwrap(), vec!["a".to_string(), "b".to_string()]);

        assert!(block_on(storage.exists("a")).unwrap());
        block_on(storage.delete("a")).unwrap();
        block_on(storage.delete("a")).unwrap();
        assert!(!block_on(storage.exists("a")).unwrap());
        assert!(!storage.is_empty());
    }
}
