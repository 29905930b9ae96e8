//! Content-addressed blob store.
//!
//! Blobs live under `objects/blobs/` with a two-character fanout
//! directory (`ab/cdef...`). A blob is written once per distinct content
//! and never modified afterwards.

use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::hash;
use crate::storage::persist::atomic_write;
use crate::storage::types::BlobId;

/// Immutable byte blobs keyed by the SHA-1 of their content.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    /// Create a store rooted at `root` (created lazily on first write).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store `content` and return its hash.
    ///
    /// Storing the same bytes twice is a no-op.
    pub fn put(&self, content: &[u8]) -> StorageResult<BlobId> {
        let id = hash::blob_id(content);
        let path = self.path(id);
        if path.exists() {
            return Ok(id);
        }

        atomic_write(&path, content)?;
        debug!(blob = %id, size = content.len(), "stored blob");
        Ok(id)
    }

    /// Read a blob's content.
    pub fn get(&self, id: &BlobId) -> StorageResult<Vec<u8>> {
        match fs::read(self.path(*id)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::BlobNotFound(*id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Check if a blob exists.
    pub fn contains(&self, id: &BlobId) -> bool {
        self.path(*id).is_file()
    }

    /// Delete a blob.
    ///
    /// The caller guarantees that no commit refers to it; this is only for
    /// content that was staged and then unstaged before any commit.
    /// Returns whether anything was removed.
    pub fn remove(&self, id: &BlobId) -> StorageResult<bool> {
        let path = self.path(*id);
        match fs::remove_file(&path) {
            Ok(()) => {
                if let Some(parent) = path.parent() {
                    // fails while other blobs share the fanout directory
                    if let Err(e) = fs::remove_dir(parent) {
                        debug!(dir = %parent.display(), error = %e, "kept fanout directory");
                    }
                }
                debug!(blob = %id, "removed blob");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn path(&self, id: BlobId) -> PathBuf {
        let (dir, file) = id.raw().fanout();
        self.root.join(dir).join(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        let store = ObjectStore::new(dir.path().join("blobs"));
        (dir, store)
    }

    #[test]
    fn test_put_and_get() {
        let (_dir, store) = setup();

        let id = store.put(b"hello world").unwrap();
        assert_eq!(id, hash::blob_id(b"hello world"));
        assert_eq!(store.get(&id).unwrap(), b"hello world");
    }

    #[test]
    fn test_put_is_idempotent() {
        let (_dir, store) = setup();

        let first = store.put(b"same content").unwrap();
        let second = store.put(b"same content").unwrap();
        assert_eq!(first, second);

        let fanout: Vec<_> = fs::read_dir(&store.root).unwrap().collect();
        assert_eq!(fanout.len(), 1);
    }

    #[test]
    fn test_get_missing() {
        let (_dir, store) = setup();
        let id = hash::blob_id(b"never stored");

        assert!(!store.contains(&id));
        assert!(matches!(store.get(&id), Err(StorageError::BlobNotFound(missing)) if missing == id));
    }

    #[test]
    fn test_remove() {
        let (_dir, store) = setup();
        let id = store.put(b"scratch").unwrap();

        assert!(store.remove(&id).unwrap());
        assert!(!store.contains(&id));
        assert!(!store.remove(&id).unwrap());
    }

    #[test]
    fn test_remove_prunes_empty_fanout() {
        let (dir, store) = setup();
        let id = store.put(b"scratch").unwrap();
        let (fanout, _) = id.raw().fanout();
        let fanout_dir = dir.path().join("blobs").join(fanout);
        assert!(fanout_dir.is_dir());

        assert!(store.remove(&id).unwrap());
        assert!(!fanout_dir.exists());
    }

    #[test]
    fn test_remove_keeps_shared_fanout() {
        let (dir, store) = setup();
        let id = store.put(b"scratch").unwrap();
        let (fanout, _) = id.raw().fanout();
        let fanout_dir = dir.path().join("blobs").join(fanout);
        fs::write(fanout_dir.join("neighbour"), b"other").unwrap();

        assert!(store.remove(&id).unwrap());
        assert!(fanout_dir.join("neighbour").is_file());
        assert!(!store.contains(&id));
    }

    #[test]
    fn test_empty_blob() {
        let (_dir, store) = setup();
        let id = store.put(b"").unwrap();
        assert!(store.get(&id).unwrap().is_empty());
    }
}
