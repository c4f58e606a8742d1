use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Build a task list, send it for analysis and explore the ranking.
/// Storage defaults to ~/.triage or a directory passed via --data-dir.
#[derive(Parser)]
#[command(name = "triage", version, about = "Task prioritisation client")]
pub struct Cli {
    /// Directory holding tasks.json, feedback.json and config.toml.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Base URL of the analysis service (overrides config and TRIAGE_API_URL).
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn quick_start_commands_parse() {
        for args in [
            vec!["triage", "add", "Fix login bug", "--priority", "8", "--effort", "2", "--due", "tomorrow"],
            vec!["triage", "add", "Write release notes", "--deps", "task_1700000000000"],
            vec!["triage", "analyze", "--strategy", "urgency"],
            vec!["triage", "ui"],
        ] {
            assert!(Cli::try_parse_from(args.iter().copied()).is_ok(), "{args:?}");
        }
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(Cli::try_parse_from(["triage", "analyze", "--strategy", "deadline"]).is_err());
    }

    #[test]
    fn priority_outside_scale_is_rejected() {
        assert!(Cli::try_parse_from(["triage", "add", "X", "--priority", "11"]).is_err());
    }
}
