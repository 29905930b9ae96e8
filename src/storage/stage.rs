//! The staging area: pending changes for the next commit.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::persist::{read_json_or_default, write_json};
use crate::storage::types::{BlobId, FileName, FileTable};

/// Files staged for addition and for removal.
///
/// A name is never in both sets at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingArea {
    additions: BTreeMap<FileName, BlobId>,
    removals: BTreeSet<FileName>,
}

impl StagingArea {
    /// load the stage; a missing record is an empty stage
    pub fn load(path: &Path) -> StorageResult<Self> {
        let stage: Self = read_json_or_default(path)?;
        if let Some(name) = stage.removals.iter().find(|n| stage.additions.contains_key(*n)) {
            return Err(StorageError::CorruptedData {
                path: path.to_path_buf(),
                reason: format!("'{}' is staged for both addition and removal", name),
            });
        }
        Ok(stage)
    }

    pub fn save(&self, path: &Path) -> StorageResult<()> {
        write_json(path, self)
    }

    /// stage `name` with `blob`, returning the blob it replaces
    pub fn stage_add(&mut self, name: FileName, blob: BlobId) -> Option<BlobId> {
        self.removals.remove(&name);
        self.additions.insert(name, blob)
    }

    /// stage `name` for removal, dropping any pending addition
    pub fn stage_remove(&mut self, name: FileName) -> Option<BlobId> {
        let dropped = self.additions.remove(&name);
        self.removals.insert(name);
        dropped
    }

    /// drop a pending addition
    pub fn unstage(&mut self, name: &FileName) -> Option<BlobId> {
        self.additions.remove(name)
    }

    /// drop a pending removal
    pub fn unstage_removal(&mut self, name: &FileName) -> bool {
        self.removals.remove(name)
    }

    pub fn clear(&mut self) {
        self.additions.clear();
        self.removals.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.removals.is_empty()
    }

    pub fn is_staged_for_addition(&self, name: &FileName) -> bool {
        self.additions.contains_key(name)
    }

    pub fn is_staged_for_removal(&self, name: &FileName) -> bool {
        self.removals.contains(name)
    }

    pub fn staged_blob(&self, name: &FileName) -> Option<BlobId> {
        self.additions.get(name).copied()
    }

    /// staged additions, sorted by name
    pub fn additions(&self) -> &BTreeMap<FileName, BlobId> {
        &self.additions
    }

    /// staged removals, sorted by name
    pub fn removals(&self) -> &BTreeSet<FileName> {
        &self.removals
    }

    /// check if a pending addition points at `blob`
    pub fn references(&self, blob: BlobId) -> bool {
        self.additions.values().any(|b| *b == blob)
    }

    /// the snapshot a commit of this stage on top of `base` would record
    pub fn apply_to(&self, base: &FileTable) -> FileTable {
        let mut files = base.clone();
        for (name, blob) in &self.additions {
            files.insert(name.clone(), *blob);
        }
        for name in &self.removals {
            files.remove(name);
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::hash::blob_id;
    use tempfile::TempDir;

    fn name(s: &str) -> FileName {
        FileName::new(s).unwrap()
    }

    #[test]
    fn test_add_and_remove_are_exclusive() {
        let mut stage = StagingArea::default();
        let blob = blob_id(b"one");

        assert_eq!(stage.stage_add(name("a.txt"), blob), None);
        assert_eq!(stage.stage_remove(name("a.txt")), Some(blob));
        assert!(stage.is_staged_for_removal(&name("a.txt")));
        assert!(!stage.is_staged_for_addition(&name("a.txt")));

        stage.stage_add(name("a.txt"), blob);
        assert!(!stage.is_staged_for_removal(&name("a.txt")));
        assert_eq!(stage.staged_blob(&name("a.txt")), Some(blob));
    }

    #[test]
    fn test_restage_returns_previous_blob() {
        let mut stage = StagingArea::default();
        let old = blob_id(b"old");
        let new = blob_id(b"new");

        stage.stage_add(name("a.txt"), old);
        assert_eq!(stage.stage_add(name("a.txt"), new), Some(old));
        assert!(stage.references(new));
        assert!(!stage.references(old));
    }

    #[test]
    fn test_apply_to() {
        let keep = blob_id(b"keep");
        let gone = blob_id(b"gone");
        let fresh = blob_id(b"fresh");
        let base: FileTable = [(name("keep.txt"), keep), (name("gone.txt"), gone)]
            .into_iter()
            .collect();

        let mut stage = StagingArea::default();
        stage.stage_add(name("new.txt"), fresh);
        stage.stage_remove(name("gone.txt"));

        let files = stage.apply_to(&base);
        assert_eq!(files.len(), 2);
        assert_eq!(files.get(&name("keep.txt")), Some(&keep));
        assert_eq!(files.get(&name("new.txt")), Some(&fresh));
        assert!(!files.contains_key(&name("gone.txt")));
    }

    #[test]
    fn test_clear() {
        let mut stage = StagingArea::default();
        stage.stage_add(name("a.txt"), blob_id(b"a"));
        stage.stage_remove(name("b.txt"));
        assert!(!stage.is_empty());

        stage.clear();
        assert!(stage.is_empty());
    }

    #[test]
    fn test_persistence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stage.json");

        assert!(StagingArea::load(&path).unwrap().is_empty());

        let mut stage = StagingArea::default();
        stage.stage_add(name("a.txt"), blob_id(b"a"));
        stage.stage_remove(name("b.txt"));
        stage.save(&path).unwrap();

        assert_eq!(StagingArea::load(&path).unwrap(), stage);
    }

    #[test]
    fn test_load_rejects_overlap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stage.json");
        let blob = blob_id(b"a");
        std::fs::write(
            &path,
            format!(r#"{{"additions":{{"a.txt":"{}"}},"removals":["a.txt"]}}"#, blob),
        )
        .unwrap();

        assert!(matches!(
            StagingArea::load(&path),
            Err(StorageError::CorruptedData { .. })
        ));
    }
}
