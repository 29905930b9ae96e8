//! Gitlet - a small local version-control system
//!
//! This crate provides a content-addressed object store, an immutable commit
//! graph, a staging area, named branches and three-way merge. All state lives
//! in a `.gitlet/` directory next to the working files.
//!
//! # Example
//!
//! ```no_run
//! use gitlet::repo::{Repository, RepositoryConfig};
//! use gitlet::storage::FileName;
//!
//! let mut repo = Repository::init(RepositoryConfig::new("./project"))?;
//! repo.add(&FileName::new("notes.txt")?)?;
//! repo.commit("add notes")?;
//!
//! for commit in repo.log()? {
//!     println!("{}", commit?.message);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod merge;
pub mod repo;
pub mod storage;

pub use merge::MergeOutcome;
pub use repo::{RepoError, RepoResult, Repository, RepositoryConfig};
