//!  Branch and HEAD management.
//!
//!  Branches are named pointers to commits. This module handles:
//! - which branch is current (HEAD)
//! - branch lifecycle (create, move, delete)
//! - branch resolution
//!
//! The whole table lives in one `branches.json` record so that moving HEAD
//! and switching branches are a single atomic write.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::persist::{read_json, write_json};
use crate::storage::types::{BranchName, CommitId};

/// Every branch and the one HEAD is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchTable {
    current: BranchName,
    branches: BTreeMap<BranchName, CommitId>,
}

impl BranchTable {
    /// a table with a single branch, which is current
    pub fn new(branch: BranchName, head: CommitId) -> Self {
        let mut branches = BTreeMap::new();
        branches.insert(branch.clone(), head);
        Self {
            current: branch,
            branches,
        }
    }

    /// load the table, checking that the current branch exists
    pub fn load(path: &Path) -> StorageResult<Self> {
        let table: Self = read_json(path)?;
        if !table.branches.contains_key(&table.current) {
            return Err(StorageError::CorruptedData {
                path: path.to_path_buf(),
                reason: format!("current branch '{}' has no entry", table.current),
            });
        }
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> StorageResult<()> {
        write_json(path, self)
    }

    /// name of the current branch
    pub fn current(&self) -> &BranchName {
        &self.current
    }

    /// commit the current branch points to
    pub fn head(&self) -> StorageResult<CommitId> {
        self.resolve(&self.current)
    }

    /// Resolve a branch name to its commit ID.
    pub fn resolve(&self, branch: &BranchName) -> StorageResult<CommitId> {
        self.branches
            .get(branch)
            .copied()
            .ok_or_else(|| StorageError::BranchNotFound(branch.clone()))
    }

    /// Check if a branch exists.
    pub fn exists(&self, branch: &BranchName) -> bool {
        self.branches.contains_key(branch)
    }

    /// branch names, sorted
    pub fn names(&self) -> impl Iterator<Item = &BranchName> {
        self.branches.keys()
    }

    /// Create a new branch pointing to the given commit.
    ///
    /// HEAD does not move.
    pub fn create(&mut self, branch: BranchName, target: CommitId) -> StorageResult<()> {
        if self.exists(&branch) {
            return Err(StorageError::BranchAlreadyExists(branch));
        }
        debug!(branch = %branch, target = %target.short(), "created branch");
        self.branches.insert(branch, target);
        Ok(())
    }

    /// Delete a branch pointer. Commits are never touched.
    pub fn remove(&mut self, branch: &BranchName) -> StorageResult<CommitId> {
        if branch == &self.current {
            return Err(StorageError::CurrentBranch(branch.clone()));
        }
        let target = self
            .branches
            .remove(branch)
            .ok_or_else(|| StorageError::BranchNotFound(branch.clone()))?;
        debug!(branch = %branch, "removed branch");
        Ok(target)
    }

    /// move the current branch to `target`
    pub fn set_head(&mut self, target: CommitId) {
        self.branches.insert(self.current.clone(), target);
    }

    /// make `branch` the current branch
    pub fn switch_to(&mut self, branch: &BranchName) -> StorageResult<()> {
        if !self.exists(branch) {
            return Err(StorageError::BranchNotFound(branch.clone()));
        }
        self.current = branch.clone();
        Ok(())
    }
}
