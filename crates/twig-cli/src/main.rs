//! twig CLI — the command-line interface to a twig repository.

mod telemetry;

use std::path::Path;
use std::process;

use chrono::Local;
use clap::{Parser, Subcommand};
use twig_core::merge::{MergeOutcome, MergeReport};
use twig_core::repo::LogEntry;
use twig_core::state::Modification;
use twig_core::store::STORE_DIR;
use twig_core::{Repository, TwigError};

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "twig", about = "twig — a small content-addressed version control system", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new twig repository in the current directory.
    Init,

    /// Stage a file's current content for the next commit.
    Add {
        /// File path relative to the repository root.
        file: String,
    },

    /// Commit the staged changes.
    Commit {
        /// Commit message.
        message: String,
    },

    /// Unstage a file, and delete it if the current commit tracks it.
    Rm {
        file: String,
    },

    /// Show the history of the current branch.
    Log {
        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Show every commit ever made.
    GlobalLog {
        /// Output format: "human" (default) or "json".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Print the ids of all commits with the given message.
    Find {
        message: String,
    },

    /// Show branches, staged files and working tree changes.
    Status {
        /// Output format: "human" (default), "json", or "brief".
        #[arg(long, default_value = "human")]
        format: String,
    },

    /// Switch branches, or restore a file.
    ///
    /// `checkout <branch>`, `checkout -- <file>` or
    /// `checkout <commit> -- <file>`.
    Checkout {
        /// Branch name, or commit id when a file follows `--`.
        target: Option<String>,

        /// File to restore.
        #[arg(last = true)]
        file: Option<String>,
    },

    /// Create a branch at the current commit.
    Branch {
        name: String,
    },

    /// Delete a branch pointer.
    RmBranch {
        name: String,
    },

    /// Move the current branch to a commit and check it out.
    Reset {
        /// Commit id (supports short prefix).
        commit: String,
    },

    /// Merge a branch into the current branch.
    Merge {
        branch: String,
    },

    /// Register a remote repository by path.
    AddRemote {
        name: String,
        path: String,
    },

    /// Forget a remote.
    RmRemote {
        name: String,
    },

    /// Copy the current branch to a remote branch.
    Push {
        remote: String,
        branch: String,
    },

    /// Copy a remote branch into the local tracking branch `<remote>-<branch>`.
    Fetch {
        remote: String,
        branch: String,
    },

    /// Fetch a remote branch and merge it into the current branch.
    Pull {
        remote: String,
        branch: String,
    },
}

fn main() {
    let cli = Cli::parse();
    telemetry::init();

    let cwd = std::env::current_dir().unwrap_or_else(|e| {
        eprintln!("error: cannot determine current directory: {e}");
        process::exit(1);
    });

    let result = match cli.command {
        Commands::Init => cmd_init(&cwd),
        command => match discover(&cwd) {
            Ok(repo) => run(&repo, command),
            Err(e) => Err(e.into()),
        },
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

/// Open the repository containing `start`, searching parent directories.
fn discover(start: &Path) -> Result<Repository, TwigError> {
    start
        .ancestors()
        .find(|dir| dir.join(STORE_DIR).is_dir())
        .ok_or(TwigError::NotARepo)
        .and_then(Repository::open)
}

fn run(repo: &Repository, command: Commands) -> CliResult {
    match command {
        Commands::Init => unreachable!("handled before discovery"),
        Commands::Add { file } => Ok(repo.stage_add(&file)?),
        Commands::Commit { message } => cmd_commit(repo, &message),
        Commands::Rm { file } => Ok(repo.stage_remove(&file)?),
        Commands::Log { format } => print_log(&repo.log()?, &format),
        Commands::GlobalLog { format } => print_log(&repo.global_log()?, &format),
        Commands::Find { message } => {
            for id in repo.find(&message)? {
                println!("{id}");
            }
            Ok(())
        }
        Commands::Status { format } => cmd_status(repo, &format),
        Commands::Checkout { target, file } => cmd_checkout(repo, target, file),
        Commands::Branch { name } => Ok(repo.create_branch(&name)?),
        Commands::RmBranch { name } => Ok(repo.delete_branch(&name)?),
        Commands::Reset { commit } => Ok(repo.reset(&commit)?),
        Commands::Merge { branch } => {
            print_merge(&repo.merge(&branch)?);
            Ok(())
        }
        Commands::AddRemote { name, path } => Ok(repo.add_remote(&name, &path)?),
        Commands::RmRemote { name } => Ok(repo.remove_remote(&name)?),
        Commands::Push { remote, branch } => {
            let pushed = repo.push(&remote, &branch)?;
            if pushed.branch_updated {
                println!(
                    "pushed {} to {}/{} ({} commit(s), {} blob(s))",
                    pushed.tip.short(),
                    pushed.remote,
                    pushed.branch,
                    pushed.copied.commits,
                    pushed.copied.blobs
                );
            } else {
                println!("{}/{} already up to date", pushed.remote, pushed.branch);
            }
            Ok(())
        }
        Commands::Fetch { remote, branch } => {
            let fetched = repo.fetch(&remote, &branch)?;
            println!(
                "fetched {} into {} ({} commit(s), {} blob(s))",
                fetched.tip.short(),
                fetched.tracking_branch,
                fetched.copied.commits,
                fetched.copied.blobs
            );
            Ok(())
        }
        Commands::Pull { remote, branch } => {
            let pulled = repo.pull(&remote, &branch)?;
            println!(
                "fetched {} into {}",
                pulled.fetch.tip.short(),
                pulled.fetch.tracking_branch
            );
            print_merge(&pulled.merge);
            Ok(())
        }
    }
}

fn cmd_init(cwd: &Path) -> CliResult {
    Repository::init(cwd)?;
    println!("initialized twig repository in {STORE_DIR}/");
    Ok(())
}

fn cmd_commit(repo: &Repository, message: &str) -> CliResult {
    let id = repo.commit(message)?;
    println!("[{} {}] {message}", repo.active_branch()?, id.short());
    Ok(())
}

fn cmd_checkout(repo: &Repository, target: Option<String>, file: Option<String>) -> CliResult {
    match (target, file) {
        (Some(branch), None) => repo.checkout_branch(&branch)?,
        (None, Some(file)) => repo.checkout_file(&file)?,
        (Some(commit), Some(file)) => repo.checkout_file_at(&commit, &file)?,
        (None, None) => return Err("usage: checkout <branch> | -- <file> | <commit> -- <file>".into()),
    }
    Ok(())
}

fn print_log(entries: &[LogEntry], format: &str) -> CliResult {
    if format == "json" {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    for entry in entries {
        println!("===");
        println!("commit {}", entry.id);
        if let (Some(first), Some(second)) = (&entry.commit.parent, &entry.commit.second_parent) {
            println!("Merge: {} {}", first.short(), second.short());
        }
        println!(
            "Date: {}",
            entry
                .commit
                .timestamp
                .with_timezone(&Local)
                .format("%a %b %d %H:%M:%S %Y %z")
        );
        println!("{}", entry.commit.message);
        println!();
    }
    Ok(())
}

fn cmd_status(repo: &Repository, format: &str) -> CliResult {
    let status = repo.status()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&status)?),
        "brief" => println!("{}", status.brief()),
        _ => {
            println!("=== Branches ===");
            for branch in &status.branches {
                let marker = if *branch == status.active_branch { "*" } else { "" };
                println!("{marker}{branch}");
            }
            println!();

            println!("=== Staged Files ===");
            for name in &status.staged {
                println!("{name}");
            }
            println!();

            println!("=== Removed Files ===");
            for name in &status.removed {
                println!("{name}");
            }
            println!();

            println!("=== Modifications Not Staged For Commit ===");
            for change in &status.unstaged {
                let kind = match change.kind {
                    Modification::Modified => "modified",
                    Modification::Deleted => "deleted",
                };
                println!("{} ({kind})", change.path);
            }
            println!();

            println!("=== Untracked Files ===");
            for name in &status.untracked {
                println!("{name}");
            }
            println!();
        }
    }

    Ok(())
}

fn print_merge(report: &MergeReport) {
    match &report.outcome {
        MergeOutcome::AlreadyMerged => {
            println!("Given branch is an ancestor of the current branch.");
        }
        MergeOutcome::FastForward { .. } => println!("Current branch fast-forwarded."),
        MergeOutcome::Merged { commit, conflicts } => {
            if conflicts.is_empty() {
                println!(
                    "merged {} into {} as {}",
                    report.given_branch,
                    report.current_branch,
                    commit.short()
                );
            } else {
                println!("Encountered a merge conflict.");
                for name in conflicts {
                    println!("  conflict: {name}");
                }
            }
        }
    }
}
