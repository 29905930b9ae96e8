//! Working-directory primitives.
//!
//! The working tree is flat: only regular files directly under the root are
//! seen, and the repository directory is never listed.

use std::fs;
use std::io;
use std::path::PathBuf;

use crate::storage::{hash_file, BlobId, FileName};

#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
    repo_dir: String,
}

impl WorkTree {
    pub fn new(root: impl Into<PathBuf>, repo_dir: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            repo_dir: repo_dir.into(),
        }
    }

    /// check if `name` is a regular file in the tree
    pub fn exists(&self, name: &FileName) -> bool {
        !self.is_repo_dir(name.as_str()) && self.path(name).is_file()
    }

    pub fn read(&self, name: &FileName) -> io::Result<Vec<u8>> {
        fs::read(self.path(name))
    }

    /// hash of the file's current content, or `None` if it is absent
    pub fn hash(&self, name: &FileName) -> io::Result<Option<BlobId>> {
        if !self.exists(name) {
            return Ok(None);
        }
        hash_file(&self.path(name)).map(Some)
    }

    pub fn write(&self, name: &FileName, content: &[u8]) -> io::Result<()> {
        fs::write(self.path(name), content)
    }

    /// delete the file, returning whether there was one
    pub fn delete(&self, name: &FileName) -> io::Result<bool> {
        match fs::remove_file(self.path(name)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Plain files in the tree, sorted by name.
    ///
    /// Entries whose names can't be tracked (directories, non-UTF-8 names,
    /// the repository directory) are skipped.
    pub fn files(&self) -> io::Result<Vec<FileName>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Ok(raw) = entry.file_name().into_string() else {
                continue;
            };
            if self.is_repo_dir(&raw) {
                continue;
            }
            if let Ok(name) = FileName::new(raw) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn is_repo_dir(&self, name: &str) -> bool {
        name == self.repo_dir
    }

    fn path(&self, name: &FileName) -> PathBuf {
        self.root.join(name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::blob_id;
    use tempfile::TempDir;

    fn setup() -> (TempDir, WorkTree) {
        let dir = TempDir::new().unwrap();
        let tree = WorkTree::new(dir.path(), ".gitlet");
        (dir, tree)
    }

    fn name(s: &str) -> FileName {
        FileName::new(s).unwrap()
    }

    #[test]
    fn test_write_read_delete() {
        let (_dir, tree) = setup();
        let file = name("a.txt");

        assert_eq!(tree.hash(&file).unwrap(), None);
        tree.write(&file, b"hello").unwrap();
        assert!(tree.exists(&file));
        assert_eq!(tree.read(&file).unwrap(), b"hello");
        assert_eq!(tree.hash(&file).unwrap(), Some(blob_id(b"hello")));

        assert!(tree.delete(&file).unwrap());
        assert!(!tree.delete(&file).unwrap());
        assert!(!tree.exists(&file));
    }

    #[test]
    fn test_files_skips_directories() {
        let (dir, tree) = setup();
        fs::create_dir(dir.path().join(".gitlet")).unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();
        tree.write(&name("b.txt"), b"b").unwrap();
        tree.write(&name("a.txt"), b"a").unwrap();

        assert_eq!(tree.files().unwrap(), vec![name("a.txt"), name("b.txt")]);
    }

    #[test]
    fn test_repo_dir_name_follows_config() {
        let dir = TempDir::new().unwrap();
        let tree = WorkTree::new(dir.path(), ".vcs");
        fs::create_dir(dir.path().join(".vcs")).unwrap();
        tree.write(&name(".gitlet"), b"plain file").unwrap();

        assert!(tree.exists(&name(".gitlet")));
        assert!(!tree.exists(&name(".vcs")));
        assert_eq!(tree.files().unwrap(), vec![name(".gitlet")]);
    }
}
