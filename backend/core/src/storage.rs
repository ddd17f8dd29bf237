//! Durable storage for game boards.
//!
//! [`Storage`] is the narrow file-system surface the engine needs;
//! [`GameStore`] maps game names onto it and owns the atomic-replace
//! protocol used by write-back.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info};

use crate::board::Board;
use crate::error::{GridError, StorageError};
use crate::game_name::is_valid_game_name;

/// Abstract interface for the backing file system.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn exists(&self, path: &Path) -> bool;

    async fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Create `path` and write `bytes`, failing if it already exists.
    async fn write_exclusive(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError>;

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    async fn delete(&self, path: &Path) -> Result<(), StorageError>;

    /// File names (not paths) directly inside `dir`.
    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError>;
}

/// [`Storage`] over the local file system.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStorage;

#[async_trait]
impl Storage for FsStorage {
    async fn exists(&self, path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    async fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(path).await?)
    }

    async fn write_exclusive(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        Ok(fs::rename(from, to).await?)
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        Ok(fs::remove_file(path).await?)
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let mut entries = fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}

/// In-memory [`Storage`] for tests and ephemeral servers.
///
/// Writes can be made to fail on demand to exercise recovery paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    failing_writes: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` exclusive writes fail with an I/O error.
    pub fn fail_writes(&self, count: usize) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    /// Number of exclusive writes that succeeded.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn insert(&self, path: impl Into<PathBuf>, bytes: Vec<u8>) {
        self.files.lock().unwrap().insert(path.into(), bytes);
    }

    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    async fn load(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.get(path).ok_or(StorageError::NotFound)
    }

    async fn write_exclusive(&self, path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
        let failing = self
            .failing_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(StorageError::Io(std::io::Error::other("injected write failure")));
        }

        let mut files = self.files.lock().unwrap();
        if files.contains_key(path) {
            return Err(StorageError::AlreadyExists);
        }
        files.insert(path.to_path_buf(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let mut files = self.files.lock().unwrap();
        let bytes = files.remove(from).ok_or(StorageError::NotFound)?;
        files.insert(to.to_path_buf(), bytes);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<(), StorageError> {
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let files = self.files.lock().unwrap();
        let mut names: Vec<String> = files
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Name-addressed board files inside one data directory.
#[derive(Clone)]
pub struct GameStore {
    storage: Arc<dyn Storage>,
    root: PathBuf,
}

impl GameStore {
    pub fn new(storage: Arc<dyn Storage>, root: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Backing file of a game: `<root>/<name>.json`.
    pub fn game_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    /// Sibling file used while replacing a game's board.
    pub fn upload_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json.upload"))
    }

    pub async fn exists(&self, name: &str) -> bool {
        self.storage.exists(&self.game_path(name)).await
    }

    pub async fn load(&self, name: &str) -> Result<Board, GridError> {
        let bytes = self.storage.load(&self.game_path(name)).await?;
        Board::from_slice(&bytes)
    }

    /// Store a brand-new game; fails with `AlreadyExists` if the name is taken.
    pub async fn create(&self, name: &str, board: &Board) -> Result<(), GridError> {
        let bytes = board.to_vec()?;
        self.storage
            .write_exclusive(&self.game_path(name), &bytes)
            .await?;
        info!(game = name, "Created game");
        Ok(())
    }

    /// Atomically replace a game's board.
    ///
    /// The board is written to the upload path (which must not exist) and then
    /// renamed over the game file. On failure the upload file is removed on a
    /// best-effort basis.
    pub async fn replace(&self, name: &str, board: &Board) -> Result<(), GridError> {
        let path = self.game_path(name);
        let upload = self.upload_path(name);
        let bytes = board.to_vec()?;

        debug!(path = %upload.display(), "Creating temporary file");
        let result = match self.storage.write_exclusive(&upload, &bytes).await {
            Ok(()) => {
                debug!(path = %path.display(), "Replacing file");
                self.storage.rename(&upload, &path).await.map_err(|e| {
                    error!(path = %path.display(), error = %e, "Failed to replace original file");
                    e
                })
            }
            Err(e) => {
                error!(path = %upload.display(), error = %e, "Failed to write temporary file");
                Err(e)
            }
        };

        if let Err(e) = result {
            if let Err(cleanup) = self.storage.delete(&upload).await {
                error!(path = %upload.display(), error = %cleanup, "Failed to remove temporary file");
            }
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn delete(&self, name: &str) -> Result<(), GridError> {
        self.storage.delete(&self.game_path(name)).await?;
        info!(game = name, "Deleted game");
        Ok(())
    }

    /// Names of all stored games, sorted.
    pub async fn list(&self) -> Result<Vec<String>, GridError> {
        let mut games: Vec<String> = self
            .storage
            .list(&self.root)
            .await?
            .into_iter()
            .filter_map(|file| file.strip_suffix(".json").map(str::to_string))
            .filter(|name| is_valid_game_name(name))
            .collect();
        games.sort();
        Ok(games)
    }
}
