//! Storage layer error types
//!
//! All errors that can occur during storage operations are defined here.
//! We use `thiserror` for ergonomic error definition and better error messages

use std::path::PathBuf;

use thiserror::Error;

use crate::storage::types::{BlobId, BranchName, CommitId, InvalidIdError, InvalidNameError};

/// the main error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// no blob is stored under this hash
    #[error("blob not found: {0}")]
    BlobNotFound(BlobId),

    /// no commit matches this id (or id prefix)
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    /// an abbreviated id matches more than one commit
    #[error("ambiguous commit id '{prefix}': {matches} commits match")]
    AmbiguousCommitId { prefix: String, matches: usize },

    /// the specified branch was not found
    #[error("branch not found: {0}")]
    BranchNotFound(BranchName),

    /// branch already exists
    #[error("branch already exists: {0}")]
    BranchAlreadyExists(BranchName),

    /// the current branch cannot be removed
    #[error("cannot remove the current branch: {0}")]
    CurrentBranch(BranchName),

    /// commits need a message
    #[error("commit message cannot be empty")]
    EmptyCommitMessage,

    /// two commits share no history
    #[error("no common ancestor between {a} and {b}")]
    NoCommonAncestor { a: CommitId, b: CommitId },

    /// invalid file or branch name
    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    /// malformed object id
    #[error(transparent)]
    InvalidId(#[from] InvalidIdError),

    /// JSON serialization or deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// data integrity check failed
    #[error("corrupted data at {path}: {reason}")]
    CorruptedData { path: PathBuf, reason: String },

    /// I/O error (filesystem level)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// internal error that shouldn't happen
    #[error("internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// check if this error indicates the resource doesn't exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::BlobNotFound(_)
                | StorageError::CommitNotFound(_)
                | StorageError::AmbiguousCommitId { .. }
                | StorageError::BranchNotFound(_)
        )
    }

    /// check if this error is a duplicate
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::BranchAlreadyExists(_))
    }

    /// check if the request was refused rather than failed
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            StorageError::CurrentBranch(_) | StorageError::EmptyCommitMessage
        )
    }
}

/// result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let not_found = StorageError::CommitNotFound("abc123".to_string());
        assert!(not_found.is_not_found());
        assert!(!not_found.is_already_exists());

        let exists = StorageError::BranchAlreadyExists(BranchName::new("dev").unwrap());
        assert!(!exists.is_not_found());
        assert!(exists.is_already_exists());

        let current = StorageError::CurrentBranch(BranchName::default_branch());
        assert!(current.is_invalid_operation());
    }
}
