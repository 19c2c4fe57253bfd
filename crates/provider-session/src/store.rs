//! Key-value storage for session tokens
//!
//! The session manager only needs `get`/`set`/`remove` on string keys, with
//! no multi-key transactions. `MemoryStore` backs tests and short-lived
//! hints; `FileStore` keeps a JSON map on disk. All `FileStore` writes use
//! atomic temp-file + rename of a freshly re-read map, and a tokio Mutex
//! serializes them within a handle.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

pub(crate) type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Persistent string-to-string storage scoped to one application instance.
///
/// Writes are last-write-wins per key and never merged.
pub trait KeyValueStore: Send + Sync {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()>;

    /// Removing an absent key succeeds.
    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        (**self).get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        (**self).set(key, value)
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        (**self).remove(key)
    }
}

/// In-process store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every entry, for inspection.
    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.entries.lock().await.get(key).cloned()) })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.entries
                .lock()
                .await
                .insert(key.to_owned(), value.to_owned());
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.entries.lock().await.remove(key);
            Ok(())
        })
    }
}

/// JSON-file store. The file is the source of truth: every operation
/// re-reads it, so several handles (or processes) on one path see each
/// other's keys. A write changes only its own key before the map is
/// written back.
///
/// The read-modify-write is serialized per handle, not across processes.
/// Two processes writing at the same instant can still drop one write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`.
    ///
    /// A missing file (and missing parent directories) is created as `{}`.
    /// An unreadable or corrupt file is an error.
    pub async fn load(path: PathBuf) -> Result<Self> {
        if path.exists() {
            let entries = read_entries(&path).await?;
            info!(path = %path.display(), keys = entries.len(), "loaded session store");
        } else {
            info!(path = %path.display(), "session file not found, starting empty");
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| Error::Store(format!("creating session directory: {e}")))?;
            }
            write_atomic(&path, &HashMap::new()).await?;
        }

        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for FileStore {
    fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            Ok(read_entries(&self.path).await?.remove(key))
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut entries = read_entries(&self.path).await?;
            entries.insert(key.to_owned(), value.to_owned());
            debug!(key, "stored session key");
            write_atomic(&self.path, &entries).await
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let _guard = self.lock.lock().await;
            let mut entries = read_entries(&self.path).await?;
            if entries.remove(key).is_some() {
                debug!(key, "removed session key");
                write_atomic(&self.path, &entries).await?;
            }
            Ok(())
        })
    }
}

/// Current contents of the session file. A file deleted since `load`
/// reads as empty.
async fn read_entries(path: &Path) -> Result<HashMap<String, String>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
        Err(e) => return Err(Error::Store(format!("reading session file: {e}"))),
    };
    serde_json::from_str(&contents).map_err(|e| Error::Store(format!("parsing session file: {e}")))
}

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Write entries to `path` via a temp file in the same directory and a
/// rename. The file holds bearer tokens, so it is 0600 on unix.
async fn write_atomic(path: &Path, entries: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| Error::Store(format!("serializing session file: {e}")))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Store("session path has no file name".into()))?
        .to_string_lossy();
    let tmp_path = path.with_file_name(format!(
        ".{file_name}.tmp.{}.{}",
        std::process::id(),
        TMP_SEQ.fetch_add(1, Ordering::Relaxed)
    ));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Store(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Store(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Store(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session store");
    Ok(())
}
