//! storage layer for gitlet
//!
//! everything under the repository directory is owned by this module. The
//! repository layer above composes these pieces and never touches the
//! on-disk layout directly.
//!
//!  # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Repository                           │
//! │   (init, add, commit, rm, checkout, branch, reset, merge)   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!        ┌─────────────────────┼─────────────────────┐
//!        │                     │                     │
//!        ▼                     ▼                     ▼
//!  ┌─────────────┐       ┌─────────────┐       ┌─────────────┐
//!  │    stage    │       │   commit    │       │    refs     │
//!  │  (pending)  │       │  (history)  │       │ (branches)  │
//!  └─────────────┘       └─────────────┘       └─────────────┘
//!         │                     │                     │
//!         └─────────────────────┼─────────────────────┘
//!                               │
//!                               ▼
//!                        ┌─────────────┐
//!                        │   objects   │
//!                        │   (blobs)   │
//!                        └─────────────┘
//!  ```
//!
//! # Usage
//!
//! ```ignore
//! use gitlet::storage::{create_initial_commit, BranchName, BranchTable, CommitGraph, ObjectStore};
//!
//! let objects = ObjectStore::new(".gitlet/objects/blobs");
//! let commits = CommitGraph::new(".gitlet/objects/commits");
//!
//! let root = create_initial_commit(&commits)?;
//! let branches = BranchTable::new(BranchName::default_branch(), root);
//!
//! let blob = objects.put(b"hello")?;
//! ```

mod commit;
mod error;
mod hash;
mod objects;
mod persist;
mod refs;
mod stage;
mod types;

// Re-export public API
pub use commit::{
    create_initial_commit, Commit, CommitBuilder, CommitGraph, HistoryIterator,
    INITIAL_COMMIT_MESSAGE,
};
pub use error::{StorageError, StorageResult};
pub use hash::{blob_id, hash_bytes, hash_file};
pub use objects::ObjectStore;
pub use refs::BranchTable;
pub use stage::StagingArea;
pub use types::{
    BlobId, BranchName, CommitId, FileName, FileTable, InvalidIdError, InvalidNameError, ObjectId,
};
