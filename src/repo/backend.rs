//! Storage backend selection and on-disk repository layout.
//!
//! A persistent repository is a directory holding a `config` marker and a
//! `blocks` sled database. Initialization only writes the marker; the
//! database is created by the first open, so the marker's presence is what
//! makes a directory a repository.

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use super::error::{StorageError, StorageResult};
use super::store::{BlockStore, MapStore, SledStore};
use crate::config::StoreConfig;

/// Where a bound repository keeps its state. Resolved once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Persistent(PathBuf),
}

impl Backend {
    pub fn is_memory(&self) -> bool {
        matches!(self, Backend::Memory)
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Backend::Memory => None,
            Backend::Persistent(path) => Some(path),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Persistent(_) => "persistent",
        }
    }
}

/// File whose presence marks an initialized repository.
pub const MARKER_FILE: &str = "config";
/// Marker layout version understood by this build.
pub const MARKER_VERSION: u32 = 1;
const BLOCKS_DIR: &str = "blocks";

/// Contents of the repository marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoMarker {
    pub version: u32,
    pub peer_id: String,
    pub store: String,
    pub created_at: DateTime<Utc>,
}

impl RepoMarker {
    /// A marker for a freshly created repository with a new peer id.
    pub fn new(store: &StoreConfig) -> Self {
        Self {
            version: MARKER_VERSION,
            peer_id: uuid::Uuid::new_v4().to_string(),
            store: store.kind.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Result of looking for the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerState {
    Absent,
    Present(RepoMarker),
}

/// The storage capabilities the bootstrapper needs.
pub trait StorageBackend: Send + Sync {
    /// A fresh, empty in-process store. Must not touch the filesystem.
    fn empty(&self) -> Arc<dyn BlockStore>;

    /// Reads the marker under `path` without modifying anything.
    fn marker_state(&self, path: &Path) -> StorageResult<MarkerState>;

    /// Creates the repository directory under `path` and writes `marker`.
    fn initialize(
        &self,
        path: &Path,
        marker: &RepoMarker,
        store: &StoreConfig,
    ) -> StorageResult<()>;

    /// Opens the block store of an initialized repository, creating it on
    /// first use.
    fn open(&self, path: &Path, store: &StoreConfig) -> StorageResult<Arc<dyn BlockStore>>;
}

/// Default backend: sled block database plus a JSON marker file.
#[derive(Debug, Default, Clone, Copy)]
pub struct SledBackend;

impl SledBackend {
    fn sled_config(path: &Path, store: &StoreConfig) -> sled::Config {
        let mut config = sled::Config::new().path(path.join(BLOCKS_DIR));
        if let Some(capacity) = store.cache_capacity() {
            config = config.cache_capacity(capacity);
        }
        if let Some(ms) = store.flush_every_ms() {
            config = config.flush_every_ms(Some(ms));
        }
        config
    }
}

impl StorageBackend for SledBackend {
    fn empty(&self) -> Arc<dyn BlockStore> {
        Arc::new(MapStore::new())
    }

    fn marker_state(&self, path: &Path) -> StorageResult<MarkerState> {
        let marker_path = path.join(MARKER_FILE);
        let bytes = match fs::read(&marker_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MarkerState::Absent),
            Err(e) => {
                return Err(StorageError::MarkerUnreadable {
                    path: marker_path,
                    source: e,
                })
            }
        };

        let marker: RepoMarker =
            serde_json::from_slice(&bytes).map_err(|e| StorageError::CorruptMarker {
                path: marker_path.clone(),
                reason: e.to_string(),
            })?;
        if marker.version != MARKER_VERSION {
            return Err(StorageError::CorruptMarker {
                path: marker_path,
                reason: format!(
                    "unsupported version {} (expected {})",
                    marker.version, MARKER_VERSION
                ),
            });
        }
        Ok(MarkerState::Present(marker))
    }

    fn initialize(
        &self,
        path: &Path,
        marker: &RepoMarker,
        _store: &StoreConfig,
    ) -> StorageResult<()> {
        info!("Initializing repository at {}", path.display());
        fs::create_dir_all(path).map_err(|e| StorageError::init(path, e))?;

        let marker_path = path.join(MARKER_FILE);
        let encoded = serde_json::to_vec_pretty(marker)
            .map_err(|e| StorageError::init(&marker_path, e.into()))?;
        write_atomically(&marker_path, &encoded).map_err(|e| StorageError::init(&marker_path, e))?;
        info!("Repository initialized with peer id {}", marker.peer_id);
        Ok(())
    }

    /// Opens the block database, creating it on first use.
    ///
    /// sled releases its directory lock from a background thread, so a
    /// database closed moments ago may still be locked. Opening waits for it
    /// for a bounded time.
    fn open(&self, path: &Path, store: &StoreConfig) -> StorageResult<Arc<dyn BlockStore>> {
        let config = Self::sled_config(path, store);
        let mut attempt = 1;
        let db = loop {
            match config.open() {
                Ok(db) => break db,
                Err(e) if is_lock_held(&e) && attempt < LOCK_ATTEMPTS => {
                    debug!(
                        "Block database at {} is locked, retrying ({}/{})",
                        path.display(),
                        attempt,
                        LOCK_ATTEMPTS
                    );
                    attempt += 1;
                    thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(e.into()),
            }
        };
        Ok(Arc::new(SledStore::new(db)?))
    }
}

const LOCK_ATTEMPTS: u32 = 40;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(50);

fn is_lock_held(err: &sled::Error) -> bool {
    match err {
        sled::Error::Io(e) => {
            e.kind() == ErrorKind::WouldBlock || e.to_string().contains("could not acquire lock")
        }
        _ => false,
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    let mut tmp = File::create(&tmp_path)?;
    tmp.write_all(bytes)?;
    tmp.sync_all()?;
    fs::rename(&tmp_path, path)
}
