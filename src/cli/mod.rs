//! Command-line interface.
//!
//! Parses arguments with clap, maps argument errors onto the three usage
//! messages, and dispatches each command to [`Repository`].

mod output;

use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::error::ErrorKind as ClapErrorKind;
use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::debug;

use crate::repo::{ErrorKind, RepoError, Repository, RepositoryConfig};
use crate::storage::{BranchName, FileName, StorageError};

pub use output::write_commit;

/// Gitlet - a tiny local version-control system
#[derive(Debug, Parser)]
#[command(name = "gitlet")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Run as if started in DIR
    #[arg(short = 'C', long = "work-tree", value_name = "DIR", global = true)]
    pub work_tree: Option<PathBuf>,

    /// Log repository operations to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Create a new repository in the current directory
    Init,
    /// Stage a file for the next commit
    Add {
        #[arg(allow_hyphen_values = true)]
        file: String,
    },
    /// Record the staged changes
    Commit {
        #[arg(allow_hyphen_values = true)]
        message: String,
    },
    /// Unstage a file, or stage the removal of a tracked one
    Rm {
        #[arg(allow_hyphen_values = true)]
        file: String,
    },
    /// Show the history of the current branch
    Log,
    /// Show every commit ever made
    #[command(name = "global-log")]
    GlobalLog,
    /// Print the ids of the commits with the given message
    Find {
        #[arg(allow_hyphen_values = true)]
        message: String,
    },
    /// Show branches, staged files and working-tree changes
    Status,
    /// Restore a file, or switch branches
    ///
    /// `checkout -- FILE`, `checkout COMMIT -- FILE` or `checkout BRANCH`
    Checkout {
        /// commit id or branch name (no leading `-`)
        target: Option<String>,
        /// file to restore
        #[arg(last = true)]
        file: Option<String>,
    },
    /// Create a branch at the current commit
    Branch {
        #[arg(allow_hyphen_values = true)]
        name: String,
    },
    /// Delete a branch pointer
    #[command(name = "rm-branch")]
    RmBranch {
        #[arg(allow_hyphen_values = true)]
        name: String,
    },
    /// Move the current branch to a commit
    Reset {
        #[arg(allow_hyphen_values = true)]
        commit: String,
    },
    /// Merge a branch into the current one
    Merge {
        #[arg(allow_hyphen_values = true)]
        branch: String,
    },
}

/// the three forms of `checkout`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// `checkout -- FILE`
    HeadFile(String),
    /// `checkout COMMIT -- FILE`
    CommitFile { commit: String, file: String },
    /// `checkout BRANCH`
    Branch(String),
}

impl CheckoutTarget {
    pub fn from_operands(target: Option<String>, file: Option<String>) -> Result<Self, UsageError> {
        match (target, file) {
            (None, Some(file)) => Ok(CheckoutTarget::HeadFile(file)),
            (Some(commit), Some(file)) => Ok(CheckoutTarget::CommitFile { commit, file }),
            (Some(branch), None) => Ok(CheckoutTarget::Branch(branch)),
            (None, None) => Err(UsageError::IncorrectOperands),
        }
    }
}

/// argument problems caught before any command runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("Please enter a command.")]
    MissingCommand,

    #[error("No command with that name exists.")]
    UnknownCommand,

    #[error("Incorrect operands.")]
    IncorrectOperands,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// help or version output requested; not a failure
    #[error("{0}")]
    Display(clap::Error),

    #[error(transparent)]
    Repo(#[from] RepoError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl From<StorageError> for CliError {
    fn from(e: StorageError) -> Self {
        CliError::Repo(RepoError::Storage(e))
    }
}

impl CliError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CliError::Usage(_) | CliError::Display(_) => ErrorKind::Usage,
            CliError::Repo(e) => e.kind(),
            CliError::Io(_) => ErrorKind::Internal,
        }
    }
}

impl Cli {
    /// Parse arguments, classifying failures as usage errors.
    pub fn from_args<I, T>(args: I) -> Result<Self, CliError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(|e| match e.kind() {
            ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion => CliError::Display(e),
            ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            | ClapErrorKind::MissingSubcommand => UsageError::MissingCommand.into(),
            ClapErrorKind::InvalidSubcommand => UsageError::UnknownCommand.into(),
            _ => UsageError::IncorrectOperands.into(),
        })
    }

    pub fn config(&self) -> RepositoryConfig {
        let work_tree = self.work_tree.clone().unwrap_or_else(|| PathBuf::from("."));
        RepositoryConfig::new(work_tree).verbose(self.verbose)
    }
}

/// Run one command, writing user-facing output to `out`.
pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<(), CliError> {
    let config = cli.config();
    debug!(command = ?cli.command, work_tree = %config.work_tree.display(), "running command");

    match cli.command {
        Command::Init => {
            Repository::init(config)?;
            Ok(())
        }
        command => {
            let mut repo = Repository::open(config)?;
            execute(&mut repo, command, out)
        }
    }
}

fn execute<W: Write>(repo: &mut Repository, command: Command, out: &mut W) -> Result<(), CliError> {
    match command {
        Command::Init => return Err(RepoError::AlreadyInitialized.into()),
        Command::Add { file } => repo.add(&file_name(file)?)?,
        Command::Commit { message } => {
            repo.commit(&message)?;
        }
        Command::Rm { file } => repo.rm(&file_name(file)?)?,
        Command::Log => {
            for commit in repo.log()? {
                write_commit(out, &commit?)?;
            }
        }
        Command::GlobalLog => {
            let mut commits = repo.global_log()?;
            commits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.id.cmp(&b.id)));
            for commit in &commits {
                write_commit(out, commit)?;
            }
        }
        Command::Find { message } => {
            for id in repo.find(&message)? {
                writeln!(out, "{}", id)?;
            }
        }
        Command::Status => write!(out, "{}", repo.status()?)?,
        Command::Checkout { target, file } => match CheckoutTarget::from_operands(target, file)? {
            CheckoutTarget::HeadFile(file) => repo.checkout_file(&file_name(file)?)?,
            CheckoutTarget::CommitFile { commit, file } => {
                repo.checkout_file_at(&commit, &file_name(file)?)?
            }
            CheckoutTarget::Branch(branch) => {
                let branch = BranchName::new(branch).map_err(|_| RepoError::NoSuchBranch)?;
                repo.checkout_branch(&branch)?
            }
        },
        Command::Branch { name } => repo.branch(&BranchName::new(name).map_err(RepoError::from)?)?,
        Command::RmBranch { name } => {
            let name = BranchName::new(name).map_err(|_| RepoError::BranchNotFound)?;
            repo.rm_branch(&name)?
        }
        Command::Reset { commit } => repo.reset(&commit)?,
        Command::Merge { branch } => {
            let branch = BranchName::new(branch).map_err(|_| RepoError::BranchNotFound)?;
            if let Some(message) = repo.merge(&branch)?.message() {
                writeln!(out, "{}", message)?;
            }
        }
    }
    Ok(())
}

fn file_name(name: String) -> Result<FileName, CliError> {
    Ok(FileName::new(name).map_err(RepoError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn parse(args: &[&str]) -> Result<Cli, CliError> {
        Cli::from_args(std::iter::once("gitlet").chain(args.iter().copied()))
    }

    fn gitlet(dir: &TempDir, args: &[&str]) -> Result<String, CliError> {
        let mut argv = vec!["-C", dir.path().to_str().unwrap()];
        argv.extend_from_slice(args);
        let mut out = Vec::new();
        run(parse(&argv)?, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_usage_errors() {
        assert!(matches!(parse(&[]), Err(CliError::Usage(UsageError::MissingCommand))));
        assert!(matches!(
            parse(&["frobnicate"]),
            Err(CliError::Usage(UsageError::UnknownCommand))
        ));
        assert!(matches!(
            parse(&["add"]),
            Err(CliError::Usage(UsageError::IncorrectOperands))
        ));
        assert!(matches!(
            parse(&["log", "extra"]),
            Err(CliError::Usage(UsageError::IncorrectOperands))
        ));
        assert!(matches!(parse(&["--help"]), Err(CliError::Display(_))));
    }

    #[test]
    fn test_global_flags_reach_config() {
        let config = parse(&["-v", "-C", "/tmp/wt", "status"]).unwrap().config();
        assert!(config.verbose);
        assert_eq!(config.work_tree, PathBuf::from("/tmp/wt"));

        let config = parse(&["status"]).unwrap().config();
        assert!(!config.verbose);
        assert_eq!(config.work_tree, PathBuf::from("."));
    }

    #[test]
    fn test_operands_starting_with_hyphen() {
        let dir = TempDir::new().unwrap();
        gitlet(&dir, &["init"]).unwrap();

        fs::write(dir.path().join("-notes"), "n").unwrap();
        gitlet(&dir, &["add", "-notes"]).unwrap();
        gitlet(&dir, &["commit", "-fix typo"]).unwrap();

        fs::write(dir.path().join("-notes"), "m").unwrap();
        gitlet(&dir, &["add", "-notes"]).unwrap();
        gitlet(&dir, &["commit", "--amend"]).unwrap();

        assert_eq!(gitlet(&dir, &["find", "-fix typo"]).unwrap().lines().count(), 1);
        assert_eq!(gitlet(&dir, &["find", "--amend"]).unwrap().lines().count(), 1);
        assert_eq!(
            gitlet(&dir, &["find", "-x"]).unwrap_err().to_string(),
            "Found no commit with that message."
        );

        gitlet(&dir, &["rm", "-notes"]).unwrap();
        assert!(!dir.path().join("-notes").exists());
    }

    #[test]
    fn test_checkout_forms() {
        let forms = [
            (vec!["checkout", "--", "f.txt"], CheckoutTarget::HeadFile("f.txt".into())),
            (
                vec!["checkout", "abc123", "--", "f.txt"],
                CheckoutTarget::CommitFile { commit: "abc123".into(), file: "f.txt".into() },
            ),
            (vec!["checkout", "dev"], CheckoutTarget::Branch("dev".into())),
        ];

        for (args, expected) in forms {
            let Command::Checkout { target, file } = parse(&args).unwrap().command else {
                panic!("expected checkout");
            };
            assert_eq!(CheckoutTarget::from_operands(target, file).unwrap(), expected);
        }

        assert_eq!(
            CheckoutTarget::from_operands(None, None),
            Err(UsageError::IncorrectOperands)
        );
    }

    #[test]
    fn test_not_initialized() {
        let dir = TempDir::new().unwrap();
        let err = gitlet(&dir, &["status"]).unwrap_err();
        assert_eq!(err.to_string(), "Not in an initialized Gitlet directory.");
        assert_eq!(err.kind(), ErrorKind::NotInitialized);
    }

    #[test]
    fn test_session() {
        let dir = TempDir::new().unwrap();
        gitlet(&dir, &["init"]).unwrap();
        assert_eq!(
            gitlet(&dir, &["init"]).unwrap_err().to_string(),
            "A Gitlet version-control system already exists in the current directory."
        );

        fs::write(dir.path().join("wug.txt"), "wug\n").unwrap();
        gitlet(&dir, &["add", "wug.txt"]).unwrap();
        gitlet(&dir, &["commit", "added wug"]).unwrap();

        let log = gitlet(&dir, &["log"]).unwrap();
        assert_eq!(log.matches("===\n").count(), 2);
        assert!(log.contains("\nadded wug\n\n"));
        assert!(log.ends_with("initial commit\n\n"));

        let found = gitlet(&dir, &["find", "added wug"]).unwrap();
        assert_eq!(found.lines().count(), 1);
        assert_eq!(found.trim().len(), 40);
        assert_eq!(
            gitlet(&dir, &["find", "nope"]).unwrap_err().to_string(),
            "Found no commit with that message."
        );

        assert_eq!(gitlet(&dir, &["global-log"]).unwrap().matches("commit ").count(), 2);

        fs::write(dir.path().join("wug.txt"), "changed\n").unwrap();
        gitlet(&dir, &["checkout", "--", "wug.txt"]).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("wug.txt")).unwrap(), "wug\n");

        assert_eq!(
            gitlet(&dir, &["checkout", "ghost"]).unwrap_err().to_string(),
            "No such branch exists."
        );
        assert_eq!(
            gitlet(&dir, &["rm", "nothing.txt"]).unwrap_err().to_string(),
            "No reason to remove the file."
        );
    }

    #[test]
    fn test_merge_messages() {
        let dir = TempDir::new().unwrap();
        gitlet(&dir, &["init"]).unwrap();
        gitlet(&dir, &["branch", "other"]).unwrap();

        fs::write(dir.path().join("f.txt"), "f").unwrap();
        gitlet(&dir, &["add", "f.txt"]).unwrap();
        gitlet(&dir, &["commit", "f"]).unwrap();

        assert_eq!(
            gitlet(&dir, &["merge", "other"]).unwrap(),
            "Given branch is an ancestor of the current branch.\n"
        );

        gitlet(&dir, &["checkout", "other"]).unwrap();
        assert_eq!(
            gitlet(&dir, &["merge", "master"]).unwrap(),
            "Current branch fast-forwarded.\n"
        );
        assert!(dir.path().join("f.txt").exists());
    }
}
