//! `alp` — thin CLI front-end over the `alp` library core.
//!
//! Argument parsing and exit-code mapping only: every command delegates to
//! a `lib.rs`-exported function, per spec.md §1's framing of the CLI as a
//! collaborator rather than part of the core.

use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use alp::config::AlpConfig;
use alp::installer::{AlpContext, RemovalOutcome, install, remove};
use alp::resolver::can_remove;
use alp::types::TransactionStatus;

/// A Linux-style package manager core, exposed as a command-line tool.
#[derive(Parser)]
#[command(name = "alp", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve dependencies and install one or more packages.
    Install {
        /// Package names to install.
        packages: Vec<String>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
        /// Install exactly the requested names, skipping dependency resolution.
        #[arg(long)]
        no_deps: bool,
    },
    /// Remove one or more installed packages.
    Remove {
        /// Package names to remove.
        packages: Vec<String>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Search the repository index for packages matching a substring.
    Search {
        /// Substring to match against package name or description.
        query: String,
    },
    /// List packages.
    List {
        /// List every package published by an enabled repository, instead
        /// of just the installed set.
        #[arg(long)]
        all: bool,
    },
    /// Refresh every registered repository's index.
    Update,
    /// Show the transaction log.
    History {
        /// Maximum number of transactions to show, most recent last.
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Register a repository and fetch its index for the first time.
    AddRepo {
        /// Repository name.
        name: String,
        /// Repository base URL (`file://` or `http(s)://`).
        url: String,
        /// Preference ordering; higher wins when a package name collides
        /// across repositories.
        #[arg(long, default_value_t = 0)]
        priority: i64,
    },
    /// List enabled repositories.
    ListRepos,
    /// Remove all files from the cache directory.
    Clean,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> alp::Result<()> {
    let mut ctx = AlpContext::open(AlpConfig::from_env())?;

    match command {
        Command::Install { packages, yes, no_deps } => run_install(&mut ctx, &packages, yes, no_deps),
        Command::Remove { packages, yes } => run_remove(&mut ctx, &packages, yes),
        Command::Search { query } => run_search(&ctx, &query),
        Command::List { all } => run_list(&ctx, all),
        Command::Update => run_update(&ctx),
        Command::History { limit } => run_history(&ctx, limit),
        Command::AddRepo { name, url, priority } => run_add_repo(&mut ctx, &name, &url, priority),
        Command::ListRepos => run_list_repos(&ctx),
        Command::Clean => run_clean(&ctx),
    }
}

fn run_install(
    ctx: &mut AlpContext,
    packages: &[String],
    yes: bool,
    no_deps: bool,
) -> alp::Result<()> {
    if packages.is_empty() {
        println!("no packages specified");
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let record = install(
        ctx,
        packages,
        no_deps,
        |plan| {
            if yes {
                return true;
            }
            println!("The following packages will be installed:");
            for entry in plan {
                println!("  {} {}", entry.metadata.name, entry.metadata.version);
            }
            confirm("Proceed?")
        },
        &|name, downloaded, total| {
            bar.set_length(total);
            bar.set_position(downloaded);
            bar.set_message(name.to_string());
        },
    )?;
    bar.finish_and_clear();

    match record.status {
        TransactionStatus::Completed => {
            println!("transaction {} completed", record.id);
            Ok(())
        }
        _ => {
            let reason = record.error.as_deref().unwrap_or("unknown failure");
            eprintln!("transaction {} failed: {reason}", record.id);
            Err(alp::Error::DownloadFailed {
                package: packages.join(", "),
                reason: reason.to_string(),
            })
        }
    }
}

fn run_remove(ctx: &mut AlpContext, packages: &[String], yes: bool) -> alp::Result<()> {
    if packages.is_empty() {
        println!("no packages specified");
        return Ok(());
    }

    if !yes {
        for name in packages {
            if ctx.database.is_installed(name)? {
                let (allowed, _) = can_remove(&ctx.database, name)?;
                if allowed {
                    println!("will remove: {name}");
                }
            }
        }
        if !confirm("Proceed?") {
            println!("cancelled");
            return Ok(());
        }
    }

    let (_record, reports) = remove(ctx, packages)?;
    let mut blocked: Option<(String, Vec<String>)> = None;
    for report in reports {
        match report.outcome {
            RemovalOutcome::Removed => println!("removed {}", report.package),
            RemovalOutcome::NotInstalled => println!("{} is not installed", report.package),
            RemovalOutcome::Blocked(dependents) => {
                println!(
                    "cannot remove {}: required by {}",
                    report.package,
                    dependents.join(", ")
                );
                if blocked.is_none() {
                    blocked = Some((report.package, dependents));
                }
            }
        }
    }
    if let Some((name, dependents)) = blocked {
        return Err(alp::Error::ReverseDependencyBlock { name, dependents });
    }
    Ok(())
}

fn run_search(ctx: &AlpContext, query: &str) -> alp::Result<()> {
    let hits = ctx.index.search_package(&ctx.database, query)?;
    if hits.is_empty() {
        println!("no matches for {query:?}");
        return Ok(());
    }
    for hit in hits {
        println!(
            "{}/{} {} — {}",
            hit.repository, hit.metadata.name, hit.metadata.version, hit.metadata.description
        );
    }
    Ok(())
}

fn run_list(ctx: &AlpContext, all: bool) -> alp::Result<()> {
    if all {
        for entry in ctx.index.list_available_packages(&ctx.database)? {
            println!("{}/{} {}", entry.repository, entry.metadata.name, entry.metadata.version);
        }
    } else {
        for pkg in ctx.database.list_packages()? {
            println!("{} {}", pkg.name, pkg.version);
        }
    }
    Ok(())
}

fn run_update(ctx: &AlpContext) -> alp::Result<()> {
    let results = ctx.index.update_all_indexes(&ctx.database)?;
    for (name, ok) in results {
        if ok {
            println!("{name}: updated");
        } else {
            println!("{name}: failed");
        }
    }
    Ok(())
}

fn run_history(ctx: &AlpContext, limit: usize) -> alp::Result<()> {
    for record in ctx.transaction_log.tail(limit)? {
        println!("{} {:?} {:?} {}", record.id, record.kind, record.status, record.packages.join(", "));
        if let Some(error) = &record.error {
            println!("    error: {error}");
        }
    }
    Ok(())
}

fn run_add_repo(ctx: &mut AlpContext, name: &str, url: &str, priority: i64) -> alp::Result<()> {
    ctx.database.add_repository(name, url, priority)?;
    if ctx.index.update_index(url)? {
        println!("added {name} and fetched its index");
    } else {
        println!("added {name} but failed to fetch its index");
    }
    Ok(())
}

fn run_list_repos(ctx: &AlpContext) -> alp::Result<()> {
    for repo in ctx.database.list_repositories()? {
        println!("{} {} (priority {})", repo.name, repo.url, repo.priority);
    }
    Ok(())
}

fn run_clean(ctx: &AlpContext) -> alp::Result<()> {
    let mut removed = 0u64;
    for entry in std::fs::read_dir(&ctx.config.cache_dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            std::fs::remove_dir_all(&path)?;
        } else {
            std::fs::remove_file(&path)?;
        }
        removed += 1;
    }
    println!("removed {removed} cache entries");
    Ok(())
}

fn confirm(prompt: &str) -> bool {
    if !io::stdin().is_terminal() {
        return false;
    }
    print!("{prompt} [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}
