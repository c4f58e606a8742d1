//! # triage - Task Prioritisation CLI
//!
//! A command-line client that keeps a local task list, sends it to a remote
//! analysis service and presents the ranked result, with an optional terminal
//! user interface (TUI) for browsing it.
//!
//! ## Key Features
//!
//! - **Local Task List**: Add tasks one by one or import a JSON array; stored in `tasks.json`
//! - **Four Strategies**: Smart Balance, Fastest Wins, High Impact and Deadline Driven
//! - **Explained Ranking**: Score, priority tier, component bars and a one-line reason per task
//! - **Dependency Graph**: Circular layout with every reported cycle highlighted
//! - **Eisenhower Matrix**: Tasks bucketed by urgency and importance
//! - **Feedback**: Mark a ranking helpful or unhelpful; tallies persist in `feedback.json`
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a couple of tasks
//! triage add "Fix login bug" --priority 8 --effort 2 --due tomorrow
//! triage add "Write release notes" --deps task_1700000000000
//!
//! # Rank them and print the report
//! triage analyze --strategy urgency
//!
//! # Or browse the result interactively
//! triage ui
//! ```
//!
//! ## Configuration
//!
//! Data lives in `~/.triage/` unless `--data-dir` is given. An optional
//! `config.toml` there sets the service URL, request timeout, canvas size,
//! error dismissal delay and default strategy. `TRIAGE_API_URL` and
//! `--api-url` override the configured URL in that order. Log verbosity is
//! controlled with `RUST_LOG`.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod analysis;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod fields;
pub mod graph;
pub mod quadrant;
pub mod render;
pub mod task;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod run;
    pub mod utils;
}

use cli::Cli;
use cmd::*;
use config::{Config, API_URL_ENV};
use context::Context;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    // Completions need neither storage nor config
    if let Commands::Completions { shell } = cli.command {
        cmd_completions(shell);
        return;
    }

    // Determine data directory
    let data_dir = match cli.data_dir.clone() {
        Some(dir) => dir,
        None => {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".triage")
        }
    };
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("Failed to create data directory {}: {}", data_dir.display(), e);
        std::process::exit(1);
    }

    let config = match Config::load(&data_dir) {
        Ok(config) => config.with_overrides(std::env::var(API_URL_ENV).ok(), cli.api_url.clone()),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    tracing::debug!(data_dir = %data_dir.display(), api_url = %config.api_url, "starting");

    let mut ctx = Context::open(&data_dir, config);

    let result = match cli.command {
        Commands::Add { title, priority, effort, due, deps } =>
            cmd_add(&mut ctx, title, priority, effort, due, deps),

        Commands::Import { input } => cmd_import(&mut ctx, input),

        Commands::List => {
            cmd_list(&ctx);
            Ok(())
        },

        Commands::Remove { index } => cmd_remove(&mut ctx, index),

        Commands::Clear { yes } => cmd_clear(&mut ctx, yes),

        Commands::Analyze { strategy, json } => cmd_analyze(&mut ctx, strategy, json),

        Commands::Suggest { strategy } => cmd_suggest(&ctx, strategy),

        Commands::Feedback { task_id, verdict } => cmd_feedback(&mut ctx, task_id, verdict),

        Commands::Strategies => {
            cmd_strategies(&ctx);
            Ok(())
        },

        Commands::Ui { strategy } => cmd_ui(&mut ctx, strategy),

        Commands::Completions { .. } => unreachable!("completions handled above"),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
