//! Block stores: where repository content lives.
//!
//! Blocks are addressed by the hex SHA-256 digest of their bytes. Storing the
//! same bytes twice yields the same key and a single entry.

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::RwLock;

use super::error::{StorageError, StorageResult};

/// Content addressed block storage.
pub trait BlockStore: Send + Sync {
    /// Stores `data`, returning its content key.
    fn put(&self, data: &[u8]) -> StorageResult<String>;

    /// Fetches the block stored under `key`.
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    fn has(&self, key: &str) -> StorageResult<bool>;

    /// Number of stored blocks.
    fn len(&self) -> StorageResult<usize>;

    fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Hex SHA-256 digest used as a block's key.
pub fn content_key(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// In-process block store for memory-only runs.
#[derive(Debug, Default)]
pub struct MapStore {
    blocks: RwLock<HashMap<String, Vec<u8>>>,
}

impl MapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MapStore {
    fn put(&self, data: &[u8]) -> StorageResult<String> {
        let key = content_key(data);
        let mut blocks = self.blocks.write().map_err(|_| StorageError::Poisoned)?;
        blocks.entry(key.clone()).or_insert_with(|| data.to_vec());
        Ok(key)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let blocks = self.blocks.read().map_err(|_| StorageError::Poisoned)?;
        Ok(blocks.get(key).cloned())
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        let blocks = self.blocks.read().map_err(|_| StorageError::Poisoned)?;
        Ok(blocks.contains_key(key))
    }

    fn len(&self) -> StorageResult<usize> {
        let blocks = self.blocks.read().map_err(|_| StorageError::Poisoned)?;
        Ok(blocks.len())
    }
}

/// Block store backed by a sled tree.
pub struct SledStore {
    // Held so the database stays open as long as the tree is in use.
    _db: sled::Db,
    blocks: sled::Tree,
}

impl SledStore {
    pub const TREE: &'static str = "blocks";

    pub fn new(db: sled::Db) -> StorageResult<Self> {
        let blocks = db.open_tree(Self::TREE)?;
        Ok(Self { _db: db, blocks })
    }
}

impl BlockStore for SledStore {
    fn put(&self, data: &[u8]) -> StorageResult<String> {
        let key = content_key(data);
        if !self.blocks.contains_key(key.as_bytes())? {
            self.blocks.insert(key.as_bytes(), data)?;
            self.blocks.flush()?;
        }
        Ok(key)
    }

    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.blocks.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn has(&self, key: &str) -> StorageResult<bool> {
        Ok(self.blocks.contains_key(key.as_bytes())?)
    }

    fn len(&self) -> StorageResult<usize> {
        Ok(self.blocks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exercise(store: &dyn BlockStore) {
        assert!(store.is_empty().unwrap());
        let key = store.put(b"hello").unwrap();
        assert_eq!(key, content_key(b"hello"));
        assert_eq!(store.put(b"hello").unwrap(), key);
        assert_eq!(store.len().unwrap(), 1);
        assert!(store.has(&key).unwrap());
        assert_eq!(store.get(&key).unwrap(), Some(b"hello".to_vec()));
        assert_eq!(store.get(&content_key(b"other")).unwrap(), None);
    }

    #[test]
    fn map_store() {
        exercise(&MapStore::new());
    }

    #[test]
    fn sled_store() {
        let dir = tempdir().unwrap();
        let db = sled::open(dir.path().join("blocks")).unwrap();
        exercise(&SledStore::new(db).unwrap());
    }

    #[test]
    fn content_key_is_sha256_hex() {
        assert_eq!(
            content_key(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
