//! Target list parsing.

use crate::snapshot::ObservationMode;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

/// A listing URL and what it is watched for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub url: String,
    #[serde(default)]
    pub mode: ObservationMode,
}

impl Target {
    pub fn new(url: impl Into<String>, mode: ObservationMode) -> Self {
        Self { url: url.into(), mode }
    }

    /// A price-mode target.
    pub fn price(url: impl Into<String>) -> Self {
        Self::new(url, ObservationMode::Price)
    }
}

impl FromStr for Target {
    type Err = String;

    /// Parses "url", "mode url", or "mode|url".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let line = s.trim();
        if line.is_empty() {
            return Err("Empty target".to_string());
        }

        // "mode|url" only when the part before the pipe is a mode; URLs may
        // carry pipes of their own
        let piped = line.split_once('|').and_then(|(mode, url)| {
            mode.trim().parse::<ObservationMode>().ok().map(|mode| (mode, url.trim()))
        });

        let (mode, url) = match piped {
            Some(pair) => pair,
            None => match line.split_once(char::is_whitespace) {
                Some((mode, url)) => (mode.parse::<ObservationMode>()?, url.trim()),
                None => (ObservationMode::Price, line),
            },
        };

        if url.is_empty() || url.contains(char::is_whitespace) {
            return Err(format!("Invalid target URL: {}", s.trim()));
        }

        Ok(Self::new(url, mode))
    }
}

/// Parses a target list, one per line.
///
/// Blank lines and `#` comments are skipped. Malformed lines are logged and
/// skipped so one typo does not stop the rest of the list.
pub fn parse_targets(content: &str) -> Vec<Target> {
    content
        .lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            match line.parse::<Target>() {
                Ok(target) => Some(target),
                Err(e) => {
                    warn!("Skipping target on line {}: {}", idx + 1, e);
                    None
                }
            }
        })
        .collect()
}

/// Reads and parses a targets file.
pub fn load_targets(path: impl AsRef<Path>) -> Result<Vec<Target>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read targets file: {}", path.display()))?;

    let targets = parse_targets(&content);
    debug!("Loaded {} targets from {}", targets.len(), path.display());
    Ok(targets)
}
