//!  Commit creation and history traversal
//!
//!  commits are immutable snapshots. In gitlet:
//! - each commit stores the complete file table of tracked files
//! - a commit id is the SHA-1 of its serialized record, so the same message,
//!   timestamp, parents and files always give the same id
//! - merge commits get both parents at creation time
//!
//! this module handles commit creation, lookup, history walking and the
//! split-point search used by merge

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::hash;
use crate::storage::persist::atomic_write;
use crate::storage::types::{BlobId, CommitId, FileName, FileTable, ObjectId};

/// message of the root commit created by `init`
pub const INITIAL_COMMIT_MESSAGE: &str = "initial commit";

/// a stored commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: CommitId,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub parent_ids: Vec<CommitId>,
    pub files: FileTable,
}

impl Commit {
    /// check if this is a merge commit (has multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parent_ids.len() > 1
    }

    /// get the first (or only) parent
    pub fn first_parent(&self) -> Option<CommitId> {
        self.parent_ids.first().copied()
    }

    /// blob tracked under `name`, if any
    pub fn blob(&self, name: &FileName) -> Option<BlobId> {
        self.files.get(name).copied()
    }

    pub fn tracks(&self, name: &FileName) -> bool {
        self.files.contains_key(name)
    }
}

/// serialized form; field order is part of the hash
#[derive(Serialize)]
struct RecordRef<'a> {
    message: &'a str,
    timestamp: &'a DateTime<Utc>,
    parents: &'a [CommitId],
    files: &'a FileTable,
}

#[derive(Deserialize)]
struct Record {
    message: String,
    timestamp: DateTime<Utc>,
    parents: Vec<CommitId>,
    files: FileTable,
}

/// builder for creating commits with a fluent interface
pub struct CommitBuilder<'a> {
    graph: &'a CommitGraph,
    message: String,
    parents: Vec<CommitId>,
    files: FileTable,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a> CommitBuilder<'a> {
    /// create a new CommitBuilder
    pub fn new(graph: &'a CommitGraph) -> Self {
        Self {
            graph,
            message: String::new(),
            parents: Vec::new(),
            files: FileTable::new(),
            timestamp: None,
        }
    }

    /// set the commit message
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// add a parent commit
    pub fn parent(mut self, parent: CommitId) -> Self {
        self.parents.push(parent);
        self
    }

    /// set multiple parents (for merge commits)
    pub fn parents(mut self, parents: Vec<CommitId>) -> Self {
        self.parents = parents;
        self
    }

    /// set the snapshot
    pub fn files(mut self, files: FileTable) -> Self {
        self.files = files;
        self
    }

    /// pin the timestamp instead of using the current time
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// compute the commit and its id without storing it
    pub fn build(self) -> StorageResult<Commit> {
        Ok(self.encode()?.0)
    }

    /// store the commit and return its ID
    pub fn commit(self) -> StorageResult<CommitId> {
        let graph = self.graph;
        let (commit, bytes) = self.encode()?;

        for parent in &commit.parent_ids {
            if !graph.contains(*parent) {
                return Err(StorageError::CommitNotFound(parent.to_string()));
            }
        }

        graph.write(commit.id, &bytes)?;
        debug!(
            commit = %commit.id,
            parents = commit.parent_ids.len(),
            files = commit.files.len(),
            "created commit"
        );
        Ok(commit.id)
    }

    fn encode(self) -> StorageResult<(Commit, Vec<u8>)> {
        if self.message.is_empty() {
            return Err(StorageError::EmptyCommitMessage);
        }

        let timestamp = self.timestamp.unwrap_or_else(Utc::now);
        let bytes = serde_json::to_vec(&RecordRef {
            message: &self.message,
            timestamp: &timestamp,
            parents: &self.parents,
            files: &self.files,
        })?;

        let commit = Commit {
            id: CommitId::new(hash::hash_bytes(&bytes)),
            message: self.message,
            timestamp,
            parent_ids: self.parents,
            files: self.files,
        };
        Ok((commit, bytes))
    }
}

/// The set of all commits, stored under `objects/commits/`.
#[derive(Debug, Clone)]
pub struct CommitGraph {
    root: PathBuf,
}

impl CommitGraph {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// start building a commit in this graph
    pub fn builder(&self) -> CommitBuilder<'_> {
        CommitBuilder::new(self)
    }

    /// create and store a commit stamped with the current time
    pub fn create(
        &self,
        message: &str,
        files: FileTable,
        parents: Vec<CommitId>,
    ) -> StorageResult<CommitId> {
        self.builder().message(message).files(files).parents(parents).commit()
    }

    /// check if a commit is stored
    pub fn contains(&self, id: CommitId) -> bool {
        self.path(id).is_file()
    }

    /// get a commit by its full id
    ///
    /// the stored bytes are re-hashed, so a damaged record is reported
    /// instead of silently returned
    pub fn get(&self, id: CommitId) -> StorageResult<Commit> {
        let path = self.path(id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::CommitNotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        if hash::hash_bytes(&bytes) != id.raw() {
            return Err(StorageError::CorruptedData {
                path,
                reason: "commit record does not match its id".to_string(),
            });
        }

        let record: Record = serde_json::from_slice(&bytes)?;
        Ok(Commit {
            id,
            message: record.message,
            timestamp: record.timestamp,
            parent_ids: record.parents,
            files: record.files,
        })
    }

    /// resolve a full or abbreviated hex id
    pub fn resolve(&self, id: &str) -> StorageResult<CommitId> {
        let prefix = id.to_ascii_lowercase();
        if prefix.is_empty()
            || prefix.len() > ObjectId::HEX_LEN
            || !prefix.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(StorageError::CommitNotFound(id.to_string()));
        }

        if prefix.len() == ObjectId::HEX_LEN {
            let full = CommitId::from_hex(&prefix)?;
            return if self.contains(full) {
                Ok(full)
            } else {
                Err(StorageError::CommitNotFound(id.to_string()))
            };
        }

        let matches: Vec<CommitId> = self
            .ids()?
            .into_iter()
            .filter(|candidate| candidate.to_string().starts_with(&prefix))
            .collect();

        match matches.as_slice() {
            [only] => Ok(*only),
            [] => Err(StorageError::CommitNotFound(id.to_string())),
            _ => Err(StorageError::AmbiguousCommitId {
                prefix: id.to_string(),
                matches: matches.len(),
            }),
        }
    }

    /// every stored commit id, in no particular order
    pub fn ids(&self) -> StorageResult<Vec<CommitId>> {
        let fanout = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for dir in fanout {
            let dir = dir?;
            if !dir.file_type()?.is_dir() {
                continue;
            }
            let prefix = dir.file_name().to_string_lossy().into_owned();
            for entry in fs::read_dir(dir.path())? {
                let name = entry?.file_name();
                // leftover temp files from an interrupted write don't parse
                if let Ok(id) = CommitId::from_hex(&format!("{}{}", prefix, name.to_string_lossy())) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    /// load every commit, in no particular order
    pub fn all_commits(&self) -> StorageResult<Vec<Commit>> {
        self.ids()?.into_iter().map(|id| self.get(id)).collect()
    }

    /// ids of all commits whose message equals `message` exactly
    ///
    /// an empty result means "no match", not an error
    pub fn find_by_message(&self, message: &str) -> StorageResult<Vec<CommitId>> {
        let mut found = Vec::new();
        for commit in self.all_commits()? {
            if commit.message == message {
                found.push(commit.id);
            }
        }
        found.sort();
        Ok(found)
    }

    /// check if any commit's file table refers to `blob`
    pub fn references_blob(&self, blob: BlobId) -> StorageResult<bool> {
        for id in self.ids()? {
            if self.get(id)?.files.values().any(|b| *b == blob) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// first-parent history starting at `start`
    pub fn history(&self, start: CommitId) -> HistoryIterator<'_> {
        HistoryIterator::new(self, start)
    }

    /// find the split point of two commits for a merge
    ///
    /// Both commits are expanded breadth-first into one shared queue; the
    /// first id dequeued a second time is the answer. On linear and simple
    /// fork histories this is the latest common ancestor. With several
    /// criss-crossing merges it is *a* common ancestor, not necessarily the
    /// most recent one.
    pub fn split_point(&self, a: CommitId, b: CommitId) -> StorageResult<CommitId> {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([a, b]);

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                debug!(split = %current, "found split point");
                return Ok(current);
            }
            queue.extend(self.get(current)?.parent_ids);
        }

        Err(StorageError::NoCommonAncestor { a, b })
    }

    /// check if `ancestor` is reachable from `descendant` through any parents
    ///
    /// a commit counts as its own ancestor
    pub fn is_ancestor(&self, ancestor: CommitId, descendant: CommitId) -> StorageResult<bool> {
        let mut visited = HashSet::new();
        let mut stack = vec![descendant];

        while let Some(current) = stack.pop() {
            if current == ancestor {
                return Ok(true);
            }
            if visited.insert(current) {
                stack.extend(self.get(current)?.parent_ids);
            }
        }
        Ok(false)
    }

    pub(crate) fn write(&self, id: CommitId, bytes: &[u8]) -> StorageResult<()> {
        let path = self.path(id);
        if path.exists() {
            return Ok(());
        }
        atomic_write(&path, bytes)
    }

    fn path(&self, id: CommitId) -> PathBuf {
        let (dir, file) = id.raw().fanout();
        self.root.join(dir).join(file)
    }
}

/// create the root commit for a new repository
///
/// it is stamped with the Unix epoch, so every repository starts from the
/// same commit id
pub fn create_initial_commit(graph: &CommitGraph) -> StorageResult<CommitId> {
    graph
        .builder()
        .message(INITIAL_COMMIT_MESSAGE)
        .timestamp(DateTime::<Utc>::UNIX_EPOCH)
        .commit()
}

/// iterate over first-parent history, newest first
///
/// the walk is lazy and stops after the root commit, or after the first
/// error it yields
pub struct HistoryIterator<'g> {
    graph: &'g CommitGraph,
    next: Option<CommitId>,
}

impl<'g> HistoryIterator<'g> {
    pub fn new(graph: &'g CommitGraph, start: CommitId) -> Self {
        Self {
            graph,
            next: Some(start),
        }
    }
}

impl<'g> Iterator for HistoryIterator<'g> {
    type Item = StorageResult<Commit>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        match self.graph.get(id) {
            Ok(commit) => {
                self.next = commit.first_parent();
                Some(Ok(commit))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
