use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use colored::Colorize;
use loam_sdk::{
    ChangeStatus, Conflict, DiffView, EngineConfig, ErrorKind, FileChange, MergeOutcome,
    MergeSummary, Repository, ResolveOutcome,
};

use crate::cli::*;

/// Where and how a command runs.
struct Session {
    cwd: PathBuf,
    config: Option<PathBuf>,
}

impl Session {
    fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        match &self.config {
            Some(path) => Ok(EngineConfig::load(path)?),
            None => Ok(EngineConfig::default()),
        }
    }

    fn open(&self) -> anyhow::Result<Repository> {
        match &self.config {
            Some(_) => Ok(Repository::open(&self.cwd, self.engine_config()?)?),
            None => Ok(Repository::discover(&self.cwd)?),
        }
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.cwd.join(path)
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<ExitCode> {
    let session = Session {
        cwd: env::current_dir().context("cannot read the current directory")?,
        config: cli.config,
    };
    match cli.command {
        Command::Init(args) => cmd_init(&session, args),
        Command::Add(args) => cmd_add(&session, args),
        Command::Reset(args) => cmd_reset(&session, args),
        Command::Status => cmd_status(&session),
        Command::Commit(args) => cmd_commit(&session, args),
        Command::Log(args) => cmd_log(&session, args),
        Command::Show(args) => cmd_show(&session, args),
        Command::Branch(args) => cmd_branch(&session, args),
        Command::Switch(args) => cmd_switch(&session, args),
        Command::Merge(args) => return cmd_merge(&session, args),
        Command::Conflicts => cmd_conflicts(&session),
        Command::Resolve(args) => return cmd_resolve(&session, args),
        Command::MergeAbort => cmd_merge_abort(&session),
        Command::Diff(args) => cmd_diff(&session, args),
        Command::Clone(args) => cmd_clone(&session, args),
        Command::Ignore(args) => cmd_ignore(&session, args),
    }?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_init(session: &Session, args: InitArgs) -> anyhow::Result<()> {
    let path = args.path.map_or_else(|| session.cwd.clone(), |p| session.absolute(&p));
    let repo = Repository::init(&path, session.engine_config()?)?;
    println!(
        "{} Initialized empty Loam repository in {}",
        "✓".green().bold(),
        repo.meta_dir().display().to_string().bold()
    );
    println!("  Branch: {}", repo.config().default_branch.yellow());
    Ok(())
}

fn cmd_add(session: &Session, args: AddArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let paths: Vec<PathBuf> = args.paths.iter().map(|p| session.absolute(p)).collect();
    let staged = repo.add(&paths)?;
    for path in &staged {
        println!("  {} {}", "staged:".green(), path);
    }
    if staged.is_empty() {
        println!("Nothing to stage.");
    }
    Ok(())
}

fn cmd_reset(session: &Session, args: ResetArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let path = args.path.map(|p| session.absolute(&p));
    let removed = repo.reset(path.as_deref())?;
    for path in &removed {
        println!("  {} {}", "unstaged:".yellow(), path);
    }
    if removed.is_empty() {
        println!("Nothing to unstage.");
    }
    Ok(())
}

fn cmd_status(session: &Session) -> anyhow::Result<()> {
    let repo = session.open()?;
    println!("On branch {}", repo.current_branch()?.yellow().bold());
    if let Some(state) = repo.pending_merge()? {
        println!(
            "{} merging {} into {}: {} unresolved",
            "!".red().bold(),
            state.source_branch.yellow(),
            state.target_branch.yellow(),
            state.pending_paths().len()
        );
    }

    let status = repo.status()?;
    if status.is_clean() {
        println!("\nNothing to commit, working tree clean.");
        return Ok(());
    }
    print_section("Changes to be committed:", &status.staged, |p| p.green());
    print_section("Changes not staged:", &status.modified, |p| p.yellow());
    print_section("Deleted:", &status.deleted, |p| p.red());
    print_section("Untracked files:", &status.untracked, |p| p.dimmed());
    Ok(())
}

fn print_section(title: &str, paths: &[String], paint: impl Fn(&str) -> colored::ColoredString) {
    if paths.is_empty() {
        return;
    }
    println!("\n{}", title.bold());
    for path in paths {
        println!("    {}", paint(path));
    }
}

fn cmd_commit(session: &Session, args: CommitArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let commit = repo.commit(&args.message, args.author.as_deref())?;
    println!(
        "{} [{} {}] {}",
        "✓".green().bold(),
        repo.current_branch()?.yellow(),
        commit.hash.short_hex().cyan(),
        commit.message
    );
    println!("  {} file(s) recorded", commit.files.len());
    Ok(())
}

fn cmd_log(session: &Session, args: LogArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let records = repo.log(args.branch.as_deref(), args.limit)?;
    if records.is_empty() {
        println!("No commits yet.");
        return Ok(());
    }
    for record in records {
        if args.oneline {
            println!("{} {}", record.hash.short_hex().yellow(), record.message);
            continue;
        }
        println!("{} {}  ({})", "commit".yellow(), record.hash.to_hex().yellow(), record.branch.green());
        println!("Date:   {}", record.timestamp.to_rfc3339());
        println!("\n    {}\n", record.message);
        for path in &record.files_changed {
            println!("    {}", path.dimmed());
        }
        if !record.files_changed.is_empty() {
            println!();
        }
    }
    Ok(())
}

fn cmd_show(session: &Session, args: ShowArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let commit = repo.show(&args.commit)?;
    println!("{} {}", "commit".yellow(), commit.hash.to_hex().yellow().bold());
    let parents: Vec<String> = commit.parents().map(|p| p.short_hex()).collect();
    if !parents.is_empty() {
        let label = if commit.is_merge() { "Merge:" } else { "Parent:" };
        println!("{label} {}", parents.join(" "));
    }
    println!("Author: {}", commit.author);
    println!("Date:   {}", commit.timestamp.to_rfc3339());
    println!("\n    {}\n", commit.message);
    for file in &commit.files {
        println!("    {}  {}", file.hash.short_hex().dimmed(), file.path);
    }
    Ok(())
}

fn cmd_branch(session: &Session, args: BranchArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    match args.name {
        Some(name) if args.delete => {
            repo.delete_branch(&name)?;
            println!("{} Deleted branch {}", "✓".green(), name.yellow());
        }
        Some(name) if !args.list => {
            let branch = repo.create_branch(&name, args.from.as_deref())?;
            let head = branch.head_commit.map_or_else(|| "(no commits)".into(), |h| h.short_hex());
            println!("{} Created branch {} at {}", "✓".green(), name.yellow(), head.cyan());
        }
        _ => {
            let current = repo.current_branch()?;
            for branch in repo.branches()? {
                let head = branch.head_commit.map_or_else(String::new, |h| h.short_hex());
                if branch.name == current {
                    println!("* {} {}", branch.name.green().bold(), head.dimmed());
                } else {
                    println!("  {} {}", branch.name, head.dimmed());
                }
            }
        }
    }
    Ok(())
}

fn cmd_switch(session: &Session, args: SwitchArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let branch = repo.switch(&args.branch, args.checkout)?;
    println!("Switched to branch {}", branch.name.yellow().bold());
    if args.checkout {
        match branch.head_commit {
            Some(head) => println!("  Restored files from {}", head.short_hex().cyan()),
            None => println!("  Branch has no commits; working tree unchanged"),
        }
    }
    Ok(())
}

fn cmd_merge(session: &Session, args: MergeArgs) -> anyhow::Result<ExitCode> {
    let repo = session.open()?;
    match repo.merge(&args.branch, args.into.as_deref())? {
        MergeOutcome::UpToDate => {
            println!("Already up to date.");
            Ok(ExitCode::SUCCESS)
        }
        MergeOutcome::Applied(summary) => {
            print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        MergeOutcome::Conflicted { conflicts } => {
            println!("{} Merge stopped with {} conflict(s):", "✗".red().bold(), conflicts.len());
            for conflict in &conflicts {
                print_conflict(conflict);
            }
            println!("Resolve with `loam resolve <path>` or drop with `loam merge-abort`.");
            Ok(ExitCode::from(ErrorKind::Conflict.exit_code()))
        }
    }
}

fn print_summary(summary: &MergeSummary) {
    println!(
        "{} Merged {} into {} as {}",
        "✓".green().bold(),
        summary.source_branch.yellow(),
        summary.target_branch.yellow(),
        summary.commit.short_hex().cyan()
    );
    for path in &summary.added {
        println!("    {} {}", "added:".green(), path);
    }
    for path in &summary.modified {
        println!("    {} {}", "modified:".yellow(), path);
    }
    for path in &summary.deleted {
        println!("    {} {}", "deleted:".red(), path);
    }
    for path in &summary.resolved {
        println!("    {} {}", "resolved:".cyan(), path);
    }
}

fn print_conflict(conflict: &Conflict) {
    println!("    {} ({})", conflict.path.red(), conflict.kind);
}

fn cmd_conflicts(session: &Session) -> anyhow::Result<()> {
    let repo = session.open()?;
    let Some(state) = repo.pending_merge()? else {
        println!("No merge in progress.");
        return Ok(());
    };
    println!(
        "Merging {} into {}",
        state.source_branch.yellow(),
        state.target_branch.yellow()
    );
    for conflict in &state.conflicts {
        print_conflict(conflict);
    }
    for path in state.resolved.keys() {
        println!("    {} (resolved)", path.green());
    }
    Ok(())
}

fn cmd_resolve(session: &Session, args: ResolveArgs) -> anyhow::Result<ExitCode> {
    let repo = session.open()?;
    let target = session.absolute(&args.path);
    let rel = repo.relative_path(&target)?;
    let source = args.with.map_or(target, |p| session.absolute(&p));
    let content = fs::read_to_string(&source)
        .with_context(|| format!("cannot read resolution from {}", source.display()))?;

    let resolutions = BTreeMap::from([(rel, content)]);
    match repo.resolve(&resolutions)? {
        ResolveOutcome::Pending { resolved, remaining, unknown } => {
            report_unknown(&unknown);
            for path in &resolved {
                println!("  {} {}", "resolved:".green(), path);
            }
            println!("{} conflict(s) remaining.", remaining.len());
            Ok(ExitCode::from(ErrorKind::Conflict.exit_code()))
        }
        ResolveOutcome::Completed { summary, unknown } => {
            report_unknown(&unknown);
            print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn report_unknown(unknown: &[String]) {
    for path in unknown {
        println!("  {} {} is not in conflict", "skipped:".yellow(), path);
    }
}

fn cmd_merge_abort(session: &Session) -> anyhow::Result<()> {
    let repo = session.open()?;
    match repo.abort_merge()? {
        Some(state) => println!(
            "{} Aborted merge of {} into {}",
            "✓".green(),
            state.source_branch.yellow(),
            state.target_branch.yellow()
        ),
        None => println!("No merge in progress."),
    }
    Ok(())
}

fn cmd_diff(session: &Session, args: DiffArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    let files = match repo.diff(args.from.as_deref(), args.to.as_deref())? {
        DiffView::Commits { from, to, diff } => {
            println!("{} {}..{}", "diff".bold(), from.short_hex().cyan(), to.short_hex().cyan());
            diff.files
        }
        DiffView::WorkingTree(diff) => diff.files,
    };
    if files.is_empty() {
        println!("No changes.");
    }
    for change in &files {
        print_change(change);
    }
    Ok(())
}

fn print_change(change: &FileChange) {
    let (old, new) = match change.status {
        ChangeStatus::Added => ("/dev/null".to_string(), format!("b/{}", change.path)),
        ChangeStatus::Deleted => (format!("a/{}", change.path), "/dev/null".to_string()),
        ChangeStatus::Modified => (format!("a/{}", change.path), format!("b/{}", change.path)),
    };
    println!("{} {} ({})", "●".bold(), change.path.bold(), change.status);
    for line in change.diff.unified(&old, &new) {
        let painted = if line.starts_with("+++") || line.starts_with("---") {
            line.bold()
        } else if line.starts_with("@@") {
            line.cyan()
        } else if line.starts_with('+') {
            line.green()
        } else if line.starts_with('-') {
            line.red()
        } else {
            line.normal()
        };
        println!("{painted}");
    }
}

fn cmd_clone(session: &Session, args: CloneArgs) -> anyhow::Result<()> {
    let source = session.absolute(&args.source);
    let destination = match args.destination {
        Some(dest) => session.absolute(&dest),
        None => {
            let name = fs::canonicalize(&source)?
                .file_name()
                .map(|n| format!("{}-clone", n.to_string_lossy()))
                .context("cannot derive a destination name from the source")?;
            session.cwd.join(name)
        }
    };
    let repo = match &session.config {
        Some(_) => Repository::open(&source, session.engine_config()?)?,
        None => Repository::discover(&source)?,
    };
    let copy = repo.clone_to(&destination)?;
    println!(
        "{} Cloned {} into {}",
        "✓".green().bold(),
        repo.root().display(),
        copy.root().display().to_string().bold()
    );
    Ok(())
}

fn cmd_ignore(session: &Session, args: IgnoreArgs) -> anyhow::Result<()> {
    let repo = session.open()?;
    if args.patterns.is_empty() {
        for pattern in repo.ignore_patterns()? {
            println!("{pattern}");
        }
        let ignored = repo.ignored_files()?;
        if !ignored.is_empty() {
            println!("\n{}", "Ignored files:".bold());
            for path in ignored {
                println!("    {}", path.dimmed());
            }
        }
        return Ok(());
    }
    let added = repo.ignore(&args.patterns)?;
    for pattern in &args.patterns {
        if added.iter().any(|a| a == pattern.trim()) {
            println!("  {} {}", "ignoring:".green(), pattern.trim());
        } else {
            println!("  {} {} (already present)", "skipped:".dimmed(), pattern.trim());
        }
    }
    Ok(())
}
