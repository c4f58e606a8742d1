//! Command implementations for the CLI interface.
//!
//! Each subcommand has one `cmd_*` handler. Handlers borrow what they need
//! from the [`Context`] and return errors to `main`, which prints them.

use std::fs;
use std::io::{self, Read};

use chrono::Local;
use clap::{Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use serde_json::json;

use crate::context::Context;
use crate::db::{format_due, parse_due_input, truncate};
use crate::error::{Result, TriageError};
use crate::fields::{LinkStyle, Quadrant, Strategy};
use crate::render::{percent, ResultView};
use crate::task::{parse_dependencies, TaskInput};
use crate::tui::run::run_tui;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Priority from 1 (low) to 10 (high).
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
        priority: u8,
        /// Effort from 1 (quick) to 10 (large).
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=10))]
        effort: u8,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd" or "in Nw".
        #[arg(long)]
        due: Option<String>,
        /// Comma-separated ids of tasks this one depends on.
        #[arg(long)]
        deps: Option<String>,
    },

    /// Import tasks from a JSON array (use "-" for stdin).
    Import {
        /// Input JSON file path.
        input: String,
    },

    /// List the current tasks.
    List,

    /// Remove the task at a list index.
    Remove {
        /// Index as shown by `list`.
        index: usize,
    },

    /// Remove every task.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Send the tasks for analysis and print the ranking.
    Analyze {
        /// Scoring strategy (defaults to the configured one).
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
        /// Print the rendered result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Ask the service for its top picks.
    Suggest {
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },

    /// Rate whether a task's ranking was helpful.
    Feedback {
        /// Task id.
        task_id: String,
        #[arg(value_enum)]
        verdict: Verdict,
    },

    /// Describe the available strategies.
    Strategies,

    /// Analyze and open the interactive results viewer.
    Ui {
        #[arg(long, value_enum)]
        strategy: Option<Strategy>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Verdict {
    Helpful,
    Unhelpful,
}

/// Add a new task to the store.
pub fn cmd_add(
    ctx: &mut Context,
    title: String,
    priority: u8,
    effort: u8,
    due: Option<String>,
    deps: Option<String>,
) -> Result<()> {
    let due_date = match due.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(
            parse_due_input(raw, Local::now().date_naive())
                .ok_or_else(|| TriageError::Validation(format!("Unrecognised due date '{raw}'")))?,
        ),
        None => None,
    };
    let input = TaskInput {
        title,
        priority,
        effort,
        due_date,
        dependencies: deps.as_deref().map(parse_dependencies).unwrap_or_default(),
    };
    let task = ctx.tasks.add(input)?;
    println!("Task added successfully! ({})", task.id);
    Ok(())
}

/// Import a JSON array of tasks from a file or stdin.
pub fn cmd_import(ctx: &mut Context, input: String) -> Result<()> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(&input)?
    };
    let count = ctx.tasks.import_json(&text)?;
    println!("Successfully imported {count} tasks!");
    Ok(())
}

/// Print the task list in store order.
pub fn cmd_list(ctx: &Context) {
    if ctx.tasks.is_empty() {
        println!("No tasks added yet");
        return;
    }
    println!(
        "{:<4} {:<22} {:<4} {:<4} {:<13} {:<16} {}",
        "#", "ID", "Pri", "Eff", "Due", "Depends on", "Title"
    );
    for (i, t) in ctx.tasks.tasks().iter().enumerate() {
        let deps = if t.dependencies.is_empty() {
            "-".to_string()
        } else {
            t.dependencies.join(",")
        };
        println!(
            "{:<4} {:<22} {:<4} {:<4} {:<13} {:<16} {}",
            i,
            truncate(&t.id, 22),
            t.priority,
            t.effort,
            format_due(t.due_date),
            truncate(&deps, 16),
            t.title
        );
    }
}

pub fn cmd_remove(ctx: &mut Context, index: usize) -> Result<()> {
    let task = ctx.tasks.remove(index)?;
    println!("Removed '{}'", task.title);
    Ok(())
}

pub fn cmd_clear(ctx: &mut Context, yes: bool) -> Result<()> {
    if !yes {
        use std::io::Write;
        print!("Are you sure you want to clear all tasks? (y/N): ");
        io::stdout().flush()?;
        let mut response = String::new();
        if io::stdin().read_line(&mut response).is_err()
            || !response.trim().to_lowercase().starts_with('y')
        {
            println!("Clear cancelled.");
            return Ok(());
        }
    }
    ctx.clear_tasks()?;
    println!("All tasks cleared");
    Ok(())
}

/// Run an analysis and print the rendered result.
pub fn cmd_analyze(ctx: &mut Context, strategy: Option<Strategy>, as_json: bool) -> Result<()> {
    let strategy = strategy.unwrap_or(ctx.config.default_strategy);
    ctx.analyze(strategy)?;
    let Some(view) = ctx.view() else {
        return Ok(());
    };
    if as_json {
        print_json(&view)
    } else {
        print_report(&view);
        Ok(())
    }
}

fn print_json(view: &ResultView) -> Result<()> {
    let edges: Vec<_> = view
        .graph
        .iter()
        .flat_map(|g| g.edges.iter())
        .map(|e| json!({"from": e.from, "to": e.to, "style": e.style}))
        .collect();
    let matrix: Vec<_> = Quadrant::ALL
        .iter()
        .map(|&q| {
            let ids: Vec<&str> = view.quadrant_rows(q).map(|r| r.id.as_str()).collect();
            json!({"quadrant": q, "ids": ids})
        })
        .collect();
    let out = json!({
        "summary": view.summary,
        "cycle_detected": view.cycle_detected,
        "cycles": view.cycles,
        "rows": view.rows,
        "edges": edges,
        "matrix": matrix,
    });
    let text = serde_json::to_string_pretty(&out).map_err(|e| TriageError::Format(e.to_string()))?;
    println!("{text}");
    Ok(())
}

fn print_report(view: &ResultView) {
    let s = &view.summary;
    println!("{}", s.strategy_line());
    println!(
        "Tasks: {} | High priority: {} | Cycles: {}",
        s.total, s.high_priority, s.cycle_count
    );

    if view.cycle_detected {
        println!();
        println!("Circular dependencies detected:");
        for cycle in &view.cycles {
            println!("  🔄 {cycle}");
        }
    }

    println!();
    println!(
        "{:<4} {:<6} {:<7} {:<6} {:<6} {:<13} {}",
        "Rank", "Score", "Tier", "Pri", "Eff", "Due", "Title"
    );
    for row in &view.rows {
        let badge = row.feedback.as_deref().map(|b| format!(" [{b}]")).unwrap_or_default();
        println!(
            "{:<4} {:<6.2} {:<7} {:<6} {:<6} {:<13} {}{}",
            row.rank,
            row.score,
            row.tier.as_str(),
            format!("{}/10", row.priority),
            format!("{}/10", row.effort),
            row.due_display,
            row.title,
            badge
        );
        println!(
            "     U {:>3}%  I {:>3}%  E {:>3}%  | {}",
            percent(row.components.urgency),
            percent(row.components.importance_norm),
            percent(row.components.effort),
            row.quadrant.title()
        );
        println!("     Why: {}", row.explanation);
    }

    if let Some(graph) = &view.graph {
        if !graph.edges.is_empty() {
            println!();
            println!("Dependencies:");
            for edge in &graph.edges {
                let marker = match edge.style {
                    LinkStyle::Cycle => " (cycle)",
                    LinkStyle::Normal => "",
                };
                println!("  {} -> {}{}", edge.from, edge.to, marker);
            }
        }
    }

    println!();
    for q in Quadrant::ALL {
        let titles: Vec<&str> = view.quadrant_rows(q).map(|r| r.title.as_str()).collect();
        let listed = if titles.is_empty() { "-".to_string() } else { titles.join(", ") };
        println!("{:<34} {}", q.title(), listed);
    }
}

pub fn cmd_suggest(ctx: &Context, strategy: Option<Strategy>) -> Result<()> {
    let strategy = strategy.unwrap_or(ctx.config.default_strategy);
    let picks = ctx.suggest(strategy)?;
    if picks.is_empty() {
        println!("No suggestions.");
    }
    for (i, pick) in picks.iter().enumerate() {
        println!("{}. {} (score {:.2}, due {})", i + 1, pick.title, pick.score, format_due(pick.due_date));
        println!("   {}", pick.why);
    }
    Ok(())
}

pub fn cmd_feedback(ctx: &mut Context, task_id: String, verdict: Verdict) -> Result<()> {
    ctx.feedback.record(&task_id, matches!(verdict, Verdict::Helpful))?;
    if let Some(badge) = ctx.feedback.badge(&task_id) {
        println!("Feedback recorded for {task_id}: {badge}");
    }
    Ok(())
}

pub fn cmd_strategies(ctx: &Context) {
    for strategy in Strategy::ALL {
        let marker = if strategy == ctx.config.default_strategy { "*" } else { " " };
        println!(
            "{} {:<11} {:<16} {}",
            marker,
            strategy.as_str(),
            strategy.label(),
            strategy.description()
        );
    }
}

/// Launch the terminal results viewer.
pub fn cmd_ui(ctx: &mut Context, strategy: Option<Strategy>) -> Result<()> {
    let strategy = strategy.unwrap_or(ctx.config.default_strategy);
    run_tui(ctx, strategy)?;
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
