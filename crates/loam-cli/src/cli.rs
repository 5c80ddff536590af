use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "loam", about = "Loam: local version control", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a repository
    Init(InitArgs),
    /// Stage files or directories
    Add(AddArgs),
    /// Unstage a path, or everything
    Reset(ResetArgs),
    /// Show staged, modified, untracked, and deleted files
    Status,
    /// Record the staged snapshot
    Commit(CommitArgs),
    /// Show commit history
    Log(LogArgs),
    /// Show one commit
    Show(ShowArgs),
    /// List, create, or delete branches
    Branch(BranchArgs),
    /// Switch to another branch
    Switch(SwitchArgs),
    /// Merge a branch into the current branch
    Merge(MergeArgs),
    /// List pending merge conflicts
    Conflicts,
    /// Resolve one conflicting path
    Resolve(ResolveArgs),
    /// Drop a pending merge
    MergeAbort,
    /// Show changes between commits or against the working tree
    Diff(DiffArgs),
    /// Copy a repository directory
    Clone(CloneArgs),
    /// Add ignore patterns, or list them
    Ignore(IgnoreArgs),
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct ResetArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    #[arg(short, long)]
    pub message: String,
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct LogArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
    #[arg(long)]
    pub branch: Option<String>,
    #[arg(long)]
    pub oneline: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Commit hash, prefix, branch name, or HEAD
    pub commit: String,
}

#[derive(Args)]
pub struct BranchArgs {
    pub name: Option<String>,
    /// List branches
    #[arg(short, long)]
    pub list: bool,
    /// Branch to copy the head from
    #[arg(long, value_name = "BASE")]
    pub from: Option<String>,
    /// Delete the named branch
    #[arg(short, long, requires = "name")]
    pub delete: bool,
}

#[derive(Args)]
pub struct SwitchArgs {
    pub branch: String,
    /// Restore the branch head's files into the working tree
    #[arg(long)]
    pub checkout: bool,
}

#[derive(Args)]
pub struct MergeArgs {
    pub branch: String,
    /// Merge into this branch instead of the current one
    #[arg(long, value_name = "TARGET")]
    pub into: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub path: PathBuf,
    /// Take the resolution from this file instead of the working tree
    #[arg(long, value_name = "FILE")]
    pub with: Option<PathBuf>,
}

#[derive(Args)]
pub struct DiffArgs {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Args)]
pub struct CloneArgs {
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
}

#[derive(Args)]
pub struct IgnoreArgs {
    pub patterns: Vec<String>,
}
