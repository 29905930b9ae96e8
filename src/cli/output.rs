//! Text rendering for `log` and `status`.

use std::fmt;
use std::io::{self, Write};

use chrono::Local;

use crate::repo::{Modification, Status};
use crate::storage::Commit;

const DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y %z";

/// write one log entry
pub fn write_commit<W: Write>(out: &mut W, commit: &Commit) -> io::Result<()> {
    writeln!(out, "===")?;
    writeln!(out, "commit {}", commit.id)?;
    if let [first, second, ..] = commit.parent_ids.as_slice() {
        writeln!(out, "Merge: {} {}", first.short(), second.short())?;
    }
    writeln!(
        out,
        "Date: {}",
        commit.timestamp.with_timezone(&Local).format(DATE_FORMAT)
    )?;
    writeln!(out, "{}", commit.message)?;
    writeln!(out)
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Branches ===")?;
        for (branch, current) in &self.branches {
            if *current {
                writeln!(f, "*{}", branch)?;
            } else {
                writeln!(f, "{}", branch)?;
            }
        }
        writeln!(f)?;

        writeln!(f, "=== Staged Files ===")?;
        for name in &self.staged {
            writeln!(f, "{}", name)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Removed Files ===")?;
        for name in &self.removed {
            writeln!(f, "{}", name)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Modifications Not Staged For Commit ===")?;
        for (name, change) in &self.modified {
            let label = match change {
                Modification::Modified => "modified",
                Modification::Deleted => "deleted",
            };
            writeln!(f, "{} ({})", name, label)?;
        }
        writeln!(f)?;

        writeln!(f, "=== Untracked Files ===")?;
        for name in &self.untracked {
            writeln!(f, "{}", name)?;
        }
        writeln!(f)
    }
}
