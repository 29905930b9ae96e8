//! Repository-level errors.
//!
//! The `Display` text of every variant is the exact message shown to the
//! user.

use thiserror::Error;

use crate::storage::{InvalidNameError, StorageError};

/// Result type for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// coarse classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// wrong arguments, caught before any command runs
    Usage,
    NotInitialized,
    NotFound,
    AlreadyExists,
    /// the request would change nothing
    NoOpRequested,
    /// the repository is not in a state that allows the operation
    PreconditionFailed,
    /// I/O failure or damaged repository state
    Internal,
}

/// Repository errors.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not in an initialized Gitlet directory.")]
    NotInitialized,

    #[error("A Gitlet version-control system already exists in the current directory.")]
    AlreadyInitialized,

    #[error("File does not exist.")]
    FileNotFound,

    #[error("No reason to remove the file.")]
    NoReasonToRemove,

    #[error("Please enter a commit message.")]
    EmptyMessage,

    #[error("No changes added to the commit.")]
    NothingToCommit,

    #[error("Found no commit with that message.")]
    NoMatchingCommit,

    #[error("No commit with that id exists.")]
    CommitNotFound,

    #[error("File does not exist in that commit.")]
    FileNotInCommit,

    #[error("No such branch exists.")]
    NoSuchBranch,

    #[error("No need to checkout the current branch.")]
    AlreadyOnBranch,

    #[error("A branch with that name already exists.")]
    BranchExists,

    #[error("A branch with that name does not exist.")]
    BranchNotFound,

    #[error("Cannot remove the current branch.")]
    RemoveCurrentBranch,

    #[error("There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedFileInTheWay,

    #[error("You have uncommitted changes.")]
    UncommittedChanges,

    #[error("Cannot merge a branch with itself.")]
    MergeWithSelf,

    #[error("invalid name: {0}")]
    InvalidName(#[from] InvalidNameError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        use RepoError::*;

        match self {
            NotInitialized => ErrorKind::NotInitialized,
            AlreadyInitialized | BranchExists => ErrorKind::AlreadyExists,
            FileNotFound | NoMatchingCommit | CommitNotFound | FileNotInCommit | NoSuchBranch
            | BranchNotFound => ErrorKind::NotFound,
            NoReasonToRemove | AlreadyOnBranch | MergeWithSelf => ErrorKind::NoOpRequested,
            EmptyMessage | NothingToCommit | RemoveCurrentBranch | UntrackedFileInTheWay
            | UncommittedChanges => ErrorKind::PreconditionFailed,
            InvalidName(_) => ErrorKind::NotFound,
            Storage(e) if e.is_not_found() => ErrorKind::NotFound,
            Storage(e) if e.is_already_exists() => ErrorKind::AlreadyExists,
            Storage(e) if e.is_invalid_operation() => ErrorKind::PreconditionFailed,
            Storage(_) | Io(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            RepoError::NotInitialized.to_string(),
            "Not in an initialized Gitlet directory."
        );
        assert_eq!(
            RepoError::UntrackedFileInTheWay.to_string(),
            "There is an untracked file in the way; delete it, or add and commit it first."
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(RepoError::BranchExists.kind(), ErrorKind::AlreadyExists);
        assert_eq!(RepoError::MergeWithSelf.kind(), ErrorKind::NoOpRequested);
        assert_eq!(RepoError::UncommittedChanges.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(
            RepoError::Storage(StorageError::Internal("x".into())).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            RepoError::Storage(StorageError::CommitNotFound("abc".into())).kind(),
            ErrorKind::NotFound
        );
    }
}
