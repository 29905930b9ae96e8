//! Repository configuration.

use std::path::{Path, PathBuf};

use crate::storage::BranchName;

/// Repository configuration options.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// Directory holding the working files.
    pub work_tree: PathBuf,
    /// Name of the repository directory inside the work tree.
    pub dir_name: String,
    /// Branch created by `init`.
    pub default_branch: BranchName,
    /// Enable verbose logging.
    pub verbose: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            work_tree: PathBuf::from("."),
            dir_name: ".gitlet".to_string(),
            default_branch: BranchName::default_branch(),
            verbose: false,
        }
    }
}

impl RepositoryConfig {
    /// Create a new configuration for the given work tree.
    pub fn new(work_tree: impl Into<PathBuf>) -> Self {
        Self {
            work_tree: work_tree.into(),
            ..Default::default()
        }
    }

    /// Set the repository directory name.
    pub fn dir_name(mut self, name: impl Into<String>) -> Self {
        self.dir_name = name.into();
        self
    }

    /// Set the branch `init` creates.
    pub fn default_branch(mut self, branch: BranchName) -> Self {
        self.default_branch = branch;
        self
    }

    /// Set verbose flag.
    pub fn verbose(mut self, value: bool) -> Self {
        self.verbose = value;
        self
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.work_tree.join(&self.dir_name)
    }

    pub fn blobs_dir(&self) -> PathBuf {
        self.objects_dir().join("blobs")
    }

    pub fn commits_dir(&self) -> PathBuf {
        self.objects_dir().join("commits")
    }

    pub fn branches_path(&self) -> PathBuf {
        self.repo_dir().join("branches.json")
    }

    pub fn stage_path(&self) -> PathBuf {
        self.repo_dir().join("stage.json")
    }

    pub fn work_tree(&self) -> &Path {
        &self.work_tree
    }

    fn objects_dir(&self) -> PathBuf {
        self.repo_dir().join("objects")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let config = RepositoryConfig::new("/tmp/work");

        assert_eq!(config.repo_dir(), PathBuf::from("/tmp/work/.gitlet"));
        assert_eq!(config.blobs_dir(), PathBuf::from("/tmp/work/.gitlet/objects/blobs"));
        assert_eq!(config.commits_dir(), PathBuf::from("/tmp/work/.gitlet/objects/commits"));
        assert_eq!(config.stage_path(), PathBuf::from("/tmp/work/.gitlet/stage.json"));
        assert_eq!(config.default_branch.as_str(), "master");
    }

    #[test]
    fn test_builder() {
        let config = RepositoryConfig::new("w")
            .dir_name(".vcs")
            .default_branch(BranchName::new("main").unwrap())
            .verbose(true);

        assert_eq!(config.branches_path(), PathBuf::from("w/.vcs/branches.json"));
        assert_eq!(config.default_branch.as_str(), "main");
        assert!(config.verbose);
    }
}
