//! The repository handle.
//!
//! [`Repository`] ties the storage pieces to a working directory and is the
//! only thing that reads or writes working files. Each handle loads the
//! branch table and the stage when it is opened and writes them back after
//! every mutating operation.
//!
//! Two processes operating on the same repository at once can corrupt it;
//! there is no locking.

mod config;
mod error;
mod status;
mod worktree;

use tracing::{debug, info, warn};

use crate::merge::{self, conflict_content, MergeAction, MergeOutcome};
use crate::storage::{
    create_initial_commit, BlobId, BranchName, BranchTable, Commit, CommitGraph, CommitId,
    FileName, FileTable, HistoryIterator, ObjectStore, StagingArea, StorageError,
};

pub use config::RepositoryConfig;
pub use error::{ErrorKind, RepoError, RepoResult};
pub use status::{Modification, Status};
pub use worktree::WorkTree;

pub struct Repository {
    config: RepositoryConfig,
    objects: ObjectStore,
    commits: CommitGraph,
    branches: BranchTable,
    stage: StagingArea,
    work_tree: WorkTree,
}

impl Repository {
    /// Create a new repository in the configured work tree.
    ///
    /// The repository starts with the shared root commit and one branch
    /// pointing at it.
    pub fn init(config: RepositoryConfig) -> RepoResult<Self> {
        let repo_dir = config.repo_dir();
        if repo_dir.exists() {
            return Err(RepoError::AlreadyInitialized);
        }

        std::fs::create_dir_all(config.blobs_dir())?;
        std::fs::create_dir_all(config.commits_dir())?;

        let objects = ObjectStore::new(config.blobs_dir());
        let commits = CommitGraph::new(config.commits_dir());
        let root = create_initial_commit(&commits)?;

        let repo = Self {
            branches: BranchTable::new(config.default_branch.clone(), root),
            stage: StagingArea::default(),
            work_tree: WorkTree::new(config.work_tree(), config.dir_name.clone()),
            objects,
            commits,
            config,
        };
        repo.flush()?;

        info!(path = %repo_dir.display(), root = %root.short(), "initialized repository");
        Ok(repo)
    }

    /// Open an existing repository.
    pub fn open(config: RepositoryConfig) -> RepoResult<Self> {
        if !config.repo_dir().is_dir() {
            return Err(RepoError::NotInitialized);
        }

        let branches = BranchTable::load(&config.branches_path())?;
        let stage = StagingArea::load(&config.stage_path())?;
        debug!(branch = %branches.current(), staged = !stage.is_empty(), "opened repository");

        Ok(Self {
            objects: ObjectStore::new(config.blobs_dir()),
            commits: CommitGraph::new(config.commits_dir()),
            work_tree: WorkTree::new(config.work_tree(), config.dir_name.clone()),
            branches,
            stage,
            config,
        })
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    pub fn commits(&self) -> &CommitGraph {
        &self.commits
    }

    pub fn branches(&self) -> &BranchTable {
        &self.branches
    }

    pub fn stage(&self) -> &StagingArea {
        &self.stage
    }

    pub fn work_tree(&self) -> &WorkTree {
        &self.work_tree
    }

    pub fn current_branch(&self) -> &BranchName {
        self.branches.current()
    }

    /// id of the commit the current branch points to
    pub fn head(&self) -> RepoResult<CommitId> {
        Ok(self.branches.head()?)
    }

    pub fn head_commit(&self) -> RepoResult<Commit> {
        Ok(self.commits.get(self.head()?)?)
    }

    // ==================== Staging ====================

    /// Stage the working copy of `name` for the next commit.
    ///
    /// A file identical to head's version is unstaged instead, and any
    /// pending removal of it is cancelled.
    pub fn add(&mut self, name: &FileName) -> RepoResult<()> {
        if !self.work_tree.exists(name) {
            return Err(RepoError::FileNotFound);
        }

        let head = self.head_commit()?;
        self.stage_file(name, &head.files)?;
        self.flush()
    }

    /// Record the stage on top of head and advance the current branch.
    pub fn commit(&mut self, message: &str) -> RepoResult<CommitId> {
        if message.is_empty() {
            return Err(RepoError::EmptyMessage);
        }
        if self.stage.is_empty() {
            return Err(RepoError::NothingToCommit);
        }
        self.record_commit(message, None)
    }

    /// Stop tracking `name`.
    ///
    /// A tracked file is staged for removal and deleted from the working
    /// tree. A file that is only staged is just unstaged.
    pub fn rm(&mut self, name: &FileName) -> RepoResult<()> {
        let head = self.head_commit()?;
        let tracked = head.tracks(name);

        if !tracked && !self.stage.is_staged_for_addition(name) {
            return Err(RepoError::NoReasonToRemove);
        }

        if tracked {
            self.stage_removal(name)?;
            self.work_tree.delete(name)?;
        } else if let Some(blob) = self.stage.unstage(name) {
            self.release_blob(blob)?;
        }

        debug!(file = %name, tracked, "removed file");
        self.flush()
    }

    // ==================== History ====================

    /// first-parent history from head back to the root commit
    pub fn log(&self) -> RepoResult<HistoryIterator<'_>> {
        Ok(self.commits.history(self.head()?))
    }

    /// every commit ever made, in no particular order
    pub fn global_log(&self) -> RepoResult<Vec<Commit>> {
        Ok(self.commits.all_commits()?)
    }

    /// ids of the commits with exactly this message
    pub fn find(&self, message: &str) -> RepoResult<Vec<CommitId>> {
        let found = self.commits.find_by_message(message)?;
        if found.is_empty() {
            return Err(RepoError::NoMatchingCommit);
        }
        Ok(found)
    }

    pub fn status(&self) -> RepoResult<Status> {
        let head = self.head_commit()?;
        Ok(Status::compute(&self.branches, &head.files, &self.stage, &self.work_tree)?)
    }

    // ==================== Checkout ====================

    /// Restore head's version of `name`. The stage is untouched.
    pub fn checkout_file(&mut self, name: &FileName) -> RepoResult<()> {
        let head = self.head_commit()?;
        let blob = head.blob(name).ok_or(RepoError::FileNotInCommit)?;
        self.restore_file(name, blob)
    }

    /// Restore `name` as of the commit `commit_id` (full or abbreviated).
    pub fn checkout_file_at(&mut self, commit_id: &str, name: &FileName) -> RepoResult<()> {
        let id = self.resolve_commit(commit_id)?;
        let commit = self.commits.get(id)?;
        let blob = commit.blob(name).ok_or(RepoError::FileNotInCommit)?;
        self.restore_file(name, blob)
    }

    /// Switch to `branch`, replacing the tracked files with its snapshot.
    pub fn checkout_branch(&mut self, branch: &BranchName) -> RepoResult<()> {
        if !self.branches.exists(branch) {
            return Err(RepoError::NoSuchBranch);
        }
        if branch == self.branches.current() {
            return Err(RepoError::AlreadyOnBranch);
        }

        let target = self.branches.resolve(branch)?;
        self.checkout_commit(target)?;
        self.branches.switch_to(branch)?;
        self.flush()?;

        info!(branch = %branch, commit = %target.short(), "switched branch");
        Ok(())
    }

    // ==================== Branches ====================

    /// Create `name` at head. HEAD stays on the current branch.
    pub fn branch(&mut self, name: &BranchName) -> RepoResult<()> {
        let head = self.head()?;
        self.branches
            .create(name.clone(), head)
            .map_err(|e| match e {
                StorageError::BranchAlreadyExists(_) => RepoError::BranchExists,
                other => other.into(),
            })?;
        self.flush()
    }

    /// Delete the branch pointer `name`. Its commits stay.
    pub fn rm_branch(&mut self, name: &BranchName) -> RepoResult<()> {
        self.branches.remove(name).map_err(|e| match e {
            StorageError::BranchNotFound(_) => RepoError::BranchNotFound,
            StorageError::CurrentBranch(_) => RepoError::RemoveCurrentBranch,
            other => other.into(),
        })?;
        self.flush()
    }

    /// Move the current branch to `commit_id` and check out its files.
    pub fn reset(&mut self, commit_id: &str) -> RepoResult<()> {
        let target = self.resolve_commit(commit_id)?;
        self.checkout_commit(target)?;
        self.branches.set_head(target);
        self.flush()?;

        info!(branch = %self.branches.current(), commit = %target.short(), "reset");
        Ok(())
    }

    // ==================== Merge ====================

    /// Merge `branch` into the current branch.
    ///
    /// Conflicts do not fail the merge: the conflicted files are committed
    /// with markers and listed in the outcome.
    pub fn merge(&mut self, branch: &BranchName) -> RepoResult<MergeOutcome> {
        let given_id = self
            .branches
            .resolve(branch)
            .map_err(|_| RepoError::BranchNotFound)?;
        if branch == self.branches.current() {
            return Err(RepoError::MergeWithSelf);
        }

        let head = self.head_commit()?;
        let given = self.commits.get(given_id)?;
        let split_id = self.commits.split_point(given_id, head.id)?;
        let split = self.commits.get(split_id)?;

        self.check_untracked(&head.files, split.files.keys().chain(given.files.keys()))?;
        if !self.stage.is_empty() {
            return Err(RepoError::UncommittedChanges);
        }

        if split_id == given_id {
            debug!(branch = %branch, "nothing to merge");
            return Ok(MergeOutcome::AlreadyMerged);
        }

        if split_id == head.id {
            self.checkout_commit(given_id)?;
            self.branches.set_head(given_id);
            self.flush()?;
            info!(branch = %branch, commit = %given_id.short(), "fast-forwarded");
            return Ok(MergeOutcome::FastForwarded { commit: given_id });
        }

        let plan = merge::plan(&split.files, &head.files, &given.files);
        if plan.is_empty() {
            debug!(split = %split_id.short(), "merge changes no files");
        } else {
            debug!(split = %split_id.short(), actions = plan.len(), "planned merge");
        }

        for (name, action) in plan.actions() {
            match *action {
                MergeAction::Take(blob) => {
                    self.restore_file(name, blob)?;
                    self.stage_file(name, &head.files)?;
                }
                MergeAction::Remove => {
                    self.stage_removal(name)?;
                    self.work_tree.delete(name)?;
                }
                MergeAction::Conflict { head: ours, given: theirs } => {
                    let ours = ours.map(|b| self.objects.get(&b)).transpose()?;
                    let theirs = theirs.map(|b| self.objects.get(&b)).transpose()?;
                    let content = conflict_content(ours.as_deref(), theirs.as_deref());
                    self.work_tree.write(name, &content)?;
                    self.stage_file(name, &head.files)?;
                }
            }
        }

        let message = format!("Merged {} into {}.", branch, self.branches.current());
        let commit = self.record_commit(&message, Some(given_id))?;

        let conflicts = plan.conflicts();
        if plan.has_conflicts() {
            warn!(commit = %commit.short(), files = conflicts.len(), "merge produced conflicts");
        }
        Ok(MergeOutcome::Merged { commit, conflicts })
    }

    // ==================== Internals ====================

    /// stage the working copy of `name` against the snapshot `head`
    fn stage_file(&mut self, name: &FileName, head: &FileTable) -> RepoResult<()> {
        let content = self.work_tree.read(name)?;
        let blob = crate::storage::blob_id(&content);
        self.stage.unstage_removal(name);

        if head.get(name) == Some(&blob) {
            if let Some(previous) = self.stage.unstage(name) {
                self.release_blob(previous)?;
            }
            debug!(file = %name, "matches head, nothing to stage");
            return Ok(());
        }

        self.objects.put(&content)?;
        if let Some(previous) = self.stage.stage_add(name.clone(), blob) {
            if previous != blob {
                self.release_blob(previous)?;
            }
        }
        debug!(file = %name, blob = %blob, "staged file");
        Ok(())
    }

    fn stage_removal(&mut self, name: &FileName) -> RepoResult<()> {
        if let Some(dropped) = self.stage.stage_remove(name.clone()) {
            self.release_blob(dropped)?;
        }
        Ok(())
    }

    /// delete a blob that only an abandoned staged entry referred to
    fn release_blob(&self, blob: BlobId) -> RepoResult<()> {
        if self.stage.references(blob) || self.commits.references_blob(blob)? {
            return Ok(());
        }
        self.objects.remove(&blob)?;
        Ok(())
    }

    /// fold the stage into a new commit on head; `merged` becomes the second parent
    fn record_commit(&mut self, message: &str, merged: Option<CommitId>) -> RepoResult<CommitId> {
        let head = self.head_commit()?;
        let files = self.stage.apply_to(&head.files);

        let mut parents = vec![head.id];
        parents.extend(merged);

        let id = self
            .commits
            .builder()
            .message(message)
            .parents(parents)
            .files(files)
            .commit()?;

        self.branches.set_head(id);
        self.stage.clear();
        self.flush()?;

        info!(branch = %self.branches.current(), commit = %id.short(), "committed");
        Ok(id)
    }

    /// make the working tree match `target`, without moving any branch
    fn checkout_commit(&mut self, target: CommitId) -> RepoResult<()> {
        let head = self.head_commit()?;
        let target = self.commits.get(target)?;
        self.check_untracked(&head.files, target.files.keys())?;

        for (name, blob) in &target.files {
            self.restore_file(name, *blob)?;
        }
        for name in head.files.keys() {
            if !target.tracks(name) {
                self.work_tree.delete(name)?;
            }
        }

        let abandoned: Vec<BlobId> = self.stage.additions().values().copied().collect();
        self.stage.clear();
        for blob in abandoned {
            self.release_blob(blob)?;
        }
        Ok(())
    }

    /// fail if an untracked working file has a name in `incoming`
    fn check_untracked<'a>(
        &self,
        head: &FileTable,
        incoming: impl IntoIterator<Item = &'a FileName>,
    ) -> RepoResult<()> {
        let untracked = status::untracked_files(head, &self.stage, &self.work_tree)?;
        if untracked.is_empty() {
            return Ok(());
        }

        for name in incoming {
            if untracked.binary_search(name).is_ok() {
                warn!(file = %name, "untracked file would be overwritten");
                return Err(RepoError::UntrackedFileInTheWay);
            }
        }
        Ok(())
    }

    /// write `blob` to `name` unless the working copy already matches
    fn restore_file(&self, name: &FileName, blob: BlobId) -> RepoResult<()> {
        if self.work_tree.hash(name)? == Some(blob) {
            return Ok(());
        }
        let content = self.objects.get(&blob)?;
        self.work_tree.write(name, &content)?;
        Ok(())
    }

    fn resolve_commit(&self, id: &str) -> RepoResult<CommitId> {
        self.commits.resolve(id).map_err(|e| {
            if e.is_not_found() {
                RepoError::CommitNotFound
            } else {
                e.into()
            }
        })
    }

    /// persist the branch table and the stage
    fn flush(&self) -> RepoResult<()> {
        self.branches.save(&self.config.branches_path())?;
        self.stage.save(&self.config.stage_path())?;
        Ok(())
    }
}
