//! Configuration management with TOML, environment variables, and CLI overrides.

use crate::monitor::Target;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// File listing the targets to watch, one per line
    #[serde(default = "default_targets_path")]
    pub targets_path: PathBuf,

    /// Targets listed directly in the config file
    #[serde(default)]
    pub targets: Vec<Target>,

    /// Directory the fetch side drops page captures into
    #[serde(default = "default_captures_dir")]
    pub captures_dir: PathBuf,

    /// Snapshot file carried between runs
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// List current prices instead of "new" entries on a target's first run
    #[serde(default)]
    pub quiet_first_run: bool,

    /// Extraction tuning
    #[serde(default)]
    pub extraction: ExtractionConfig,
}

fn default_targets_path() -> PathBuf {
    PathBuf::from("urls.txt")
}

fn default_captures_dir() -> PathBuf {
    PathBuf::from("captures")
}

fn default_state_path() -> PathBuf {
    PathBuf::from("prices.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            targets_path: default_targets_path(),
            targets: Vec::new(),
            captures_dir: default_captures_dir(),
            state_path: default_state_path(),
            format: OutputFormat::Text,
            quiet_first_run: false,
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("ticket-watch.toml");
        if local_config.exists() {
            debug!("Found ticket-watch.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("ticket-watch").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(path) = std::env::var("TICKET_WATCH_TARGETS") {
            self.targets_path = PathBuf::from(path);
        }

        if let Ok(dir) = std::env::var("TICKET_WATCH_CAPTURES") {
            self.captures_dir = PathBuf::from(dir);
        }

        if let Ok(path) = std::env::var("TICKET_WATCH_STATE") {
            self.state_path = PathBuf::from(path);
        }

        if let Ok(format) = std::env::var("TICKET_WATCH_FORMAT") {
            if let Ok(f) = format.parse() {
                self.format = f;
            }
        }

        self
    }
}

/// When the markup pass runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkupPolicy {
    /// Only when the text passes found no sections
    #[default]
    Fallback,
    /// Always, merged with the text passes
    Always,
    /// Never
    Never,
}

/// Tuning knobs for the section-price extractor and availability classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lines searched after a section label for its price
    pub lookahead_lines: usize,

    /// Bytes of markup searched after a section text node
    pub markup_window: usize,

    /// Longest implicit or markup label accepted as a section name
    pub max_label_chars: usize,

    /// When the markup pass runs
    pub markup: MarkupPolicy,

    /// Additional leading words that mark a section label
    pub extra_prefixes: Vec<String>,

    /// Additional phrases meaning "nothing on sale"
    pub extra_unavailable_phrases: Vec<String>,

    /// Price spread between passes above which a disagreement is reported
    pub disagreement_tolerance: f64,

    /// Look for availability evidence in rendered text only, ignoring
    /// script payloads and attributes in the raw markup
    pub visible_text_only: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lookahead_lines: 4,
            markup_window: 400,
            max_label_chars: 48,
            markup: MarkupPolicy::Fallback,
            extra_prefixes: Vec::new(),
            extra_unavailable_phrases: Vec::new(),
            disagreement_tolerance: 0.01,
            visible_text_only: false,
        }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use: text, markdown, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}
