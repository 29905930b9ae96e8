//! Status report: how the stage and working tree differ from head.

use std::collections::BTreeMap;

use crate::repo::worktree::WorkTree;
use crate::storage::{BranchName, BranchTable, FileName, FileTable, StagingArea};

/// why a file shows up as modified but not staged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modification {
    Modified,
    Deleted,
}

/// everything `status` reports; every list is sorted by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// branch names, with the current one flagged
    pub branches: Vec<(BranchName, bool)>,
    pub staged: Vec<FileName>,
    pub removed: Vec<FileName>,
    pub modified: Vec<(FileName, Modification)>,
    pub untracked: Vec<FileName>,
}

impl Status {
    pub(crate) fn compute(
        branches: &BranchTable,
        head: &FileTable,
        stage: &StagingArea,
        tree: &WorkTree,
    ) -> std::io::Result<Self> {
        let branch_list = branches
            .names()
            .map(|b| (b.clone(), b == branches.current()))
            .collect();

        let mut modified = BTreeMap::new();

        // tracked in head, not staged, and changed or gone on disk
        for (name, blob) in head {
            if stage.is_staged_for_addition(name) || stage.is_staged_for_removal(name) {
                continue;
            }
            match tree.hash(name)? {
                None => {
                    modified.insert(name.clone(), Modification::Deleted);
                }
                Some(current) if current != *blob => {
                    modified.insert(name.clone(), Modification::Modified);
                }
                Some(_) => {}
            }
        }

        // staged for addition but changed or gone since
        for (name, blob) in stage.additions() {
            match tree.hash(name)? {
                None => {
                    modified.insert(name.clone(), Modification::Deleted);
                }
                Some(current) if current != *blob => {
                    modified.insert(name.clone(), Modification::Modified);
                }
                Some(_) => {}
            }
        }

        Ok(Self {
            branches: branch_list,
            staged: stage.additions().keys().cloned().collect(),
            removed: stage.removals().iter().cloned().collect(),
            modified: modified.into_iter().collect(),
            untracked: untracked_files(head, stage, tree)?,
        })
    }
}

/// Files in the working tree that head does not account for.
///
/// A file counts when head doesn't track it and it isn't staged for
/// addition, or when it is staged for removal but was put back on disk.
pub(crate) fn untracked_files(
    head: &FileTable,
    stage: &StagingArea,
    tree: &WorkTree,
) -> std::io::Result<Vec<FileName>> {
    Ok(tree
        .files()?
        .into_iter()
        .filter(|name| {
            (!head.contains_key(name) && !stage.is_staged_for_addition(name))
                || stage.is_staged_for_removal(name)
        })
        .collect())
}
