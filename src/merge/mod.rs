//! three-way merge planning
//!
//! Given the file tables at the split point, the current head and the tip of
//! the branch being merged, [`plan`] decides what happens to every file. The
//! plan is pure data; applying it to the working tree and the stage is the
//! repository's job.
//!
//! | split   | head              | given             | action              |
//! |---------|-------------------|-------------------|---------------------|
//! | present | absent            | any               | keep                |
//! | present | unchanged         | absent            | remove              |
//! | present | changed           | absent            | conflict            |
//! | present | unchanged         | unchanged         | keep                |
//! | present | unchanged         | changed           | take given          |
//! | present | changed           | unchanged         | keep                |
//! | present | changed           | changed, same     | keep                |
//! | present | changed           | changed, differs  | conflict            |
//! | absent  | absent            | present           | take given          |
//! | absent  | present           | absent            | keep                |
//! | absent  | present           | present, same     | keep                |
//! | absent  | present           | present, differs  | conflict            |

mod conflict;

use std::collections::{BTreeMap, BTreeSet};

use crate::storage::{BlobId, CommitId, FileName, FileTable};

pub use conflict::{conflict_content, has_conflict_markers, END_MARKER, HEAD_MARKER, SEPARATOR};

/// what a merge does to one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeAction {
    /// write the given side's blob and stage it
    Take(BlobId),
    /// delete the file and stage its removal
    Remove,
    /// write conflict markers around both sides and stage the result
    Conflict {
        head: Option<BlobId>,
        given: Option<BlobId>,
    },
}

impl MergeAction {
    pub fn is_conflict(&self) -> bool {
        matches!(self, MergeAction::Conflict { .. })
    }
}

/// Per-file actions for one merge.
///
/// Files the merge leaves alone are not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergePlan {
    actions: BTreeMap<FileName, MergeAction>,
}

impl MergePlan {
    /// actions in file-name order
    pub fn actions(&self) -> impl Iterator<Item = (&FileName, &MergeAction)> {
        self.actions.iter()
    }

    /// names of the conflicted files, sorted
    pub fn conflicts(&self) -> Vec<FileName> {
        self.actions
            .iter()
            .filter(|(_, action)| action.is_conflict())
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_conflicts(&self) -> bool {
        self.actions.values().any(MergeAction::is_conflict)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }
}

/// classify every file named in any of the three tables
pub fn plan(split: &FileTable, head: &FileTable, given: &FileTable) -> MergePlan {
    let names: BTreeSet<&FileName> = split.keys().chain(head.keys()).chain(given.keys()).collect();

    let actions = names
        .into_iter()
        .filter_map(|name| {
            let action = classify(
                split.get(name).copied(),
                head.get(name).copied(),
                given.get(name).copied(),
            )?;
            Some((name.clone(), action))
        })
        .collect();

    MergePlan { actions }
}

/// decide the fate of one file; `None` leaves the head version in place
pub fn classify(
    split: Option<BlobId>,
    head: Option<BlobId>,
    given: Option<BlobId>,
) -> Option<MergeAction> {
    match (split, head, given) {
        // both sides agree, including both deleting it
        (_, h, g) if h == g => None,

        // only the given side moved away from the split point
        (s, h, g) if s == h => match g {
            Some(blob) => Some(MergeAction::Take(blob)),
            None => Some(MergeAction::Remove),
        },

        // only head moved, or head already deleted it
        (s, _, g) if s == g => None,
        (Some(_), None, _) => None,

        (_, h, g) => Some(MergeAction::Conflict { head: h, given: g }),
    }
}

/// How a merge ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// the given branch is already contained in the current one
    AlreadyMerged,
    /// the current branch moved to the given tip; no commit was made
    FastForwarded { commit: CommitId },
    /// a merge commit was recorded, possibly with conflicted files
    Merged {
        commit: CommitId,
        conflicts: Vec<FileName>,
    },
}

impl MergeOutcome {
    pub fn has_conflicts(&self) -> bool {
        matches!(self, MergeOutcome::Merged { conflicts, .. } if !conflicts.is_empty())
    }

    /// the line printed for the user, if any
    pub fn message(&self) -> Option<&'static str> {
        match self {
            MergeOutcome::AlreadyMerged => Some("Given branch is an ancestor of the current branch."),
            MergeOutcome::FastForwarded { .. } => Some("Current branch fast-forwarded."),
            MergeOutcome::Merged { .. } if self.has_conflicts() => {
                Some("Encountered a merge conflict.")
            }
            MergeOutcome::Merged { .. } => None,
        }
    }
}
