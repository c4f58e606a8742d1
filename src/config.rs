//! Client configuration.
//!
//! Read from `config.toml` inside the data directory. Every key is optional.
//! The service URL can also come from `TRIAGE_API_URL` or `--api-url`, the
//! flag taking precedence.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, TriageError};
use crate::fields::Strategy;
use crate::graph::Canvas;

pub const CONFIG_FILE: &str = "config.toml";
pub const API_URL_ENV: &str = "TRIAGE_API_URL";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000/api/tasks";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    /// Seconds before an analysis request is abandoned. Unset waits forever.
    pub timeout_secs: Option<u64>,
    pub canvas_width: f64,
    pub canvas_height: f64,
    /// How long transient messages stay on screen in the viewer.
    pub error_dismiss_secs: u64,
    pub default_strategy: Strategy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: DEFAULT_API_URL.into(),
            timeout_secs: None,
            canvas_width: 600.0,
            canvas_height: 400.0,
            error_dismiss_secs: 5,
            default_strategy: Strategy::Smart,
        }
    }
}

impl Config {
    /// Load `config.toml` from `data_dir`, falling back to defaults if absent.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(&path)?;
        Config::parse(&text).map_err(|e| TriageError::Config(format!("{}: {e}", path.display())))
    }

    pub fn parse(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Apply the env var and then the CLI flag on top of the file.
    pub fn with_overrides(mut self, env_url: Option<String>, flag_url: Option<String>) -> Self {
        if let Some(url) = flag_url.or(env_url).filter(|u| !u.trim().is_empty()) {
            self.api_url = url;
        }
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn canvas(&self) -> Canvas {
        Canvas { width: self.canvas_width, height: self.canvas_height }
    }

    pub fn dismiss_after(&self) -> Duration {
        Duration::from_secs(self.error_dismiss_secs)
    }
}
