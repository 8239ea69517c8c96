//! Page capture sources.

use crate::extract::PageCapture;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Errors returned by a page source.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no capture for {url} (looked for {slug}.txt and {slug}.html)")]
    Missing { url: String, slug: String },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Supplies captured page content per target - enables mocking for tests.
pub trait PageSource {
    /// Returns the capture for a target URL.
    fn capture(&self, url: &str) -> Result<PageCapture, CaptureError>;
}

/// Reads captures written by an external fetcher into a directory.
///
/// Each target maps to `<slug>.txt` (visible text) and `<slug>.html` (markup).
/// Either file may be missing; both missing is an error.
#[derive(Debug, Clone)]
pub struct CaptureDir {
    root: PathBuf,
}

impl CaptureDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths of the text and markup files for a target.
    pub fn paths_for(&self, url: &str) -> (PathBuf, PathBuf) {
        let slug = capture_slug(url);
        (self.root.join(format!("{}.txt", slug)), self.root.join(format!("{}.html", slug)))
    }
}

impl PageSource for CaptureDir {
    fn capture(&self, url: &str) -> Result<PageCapture, CaptureError> {
        let (text_path, markup_path) = self.paths_for(url);
        debug!("Reading capture for {} from {}", url, self.root.display());

        let text = read_optional(&text_path)?;
        let markup = read_optional(&markup_path)?;

        match (text, markup) {
            (None, None) => Err(CaptureError::Missing { url: url.to_string(), slug: capture_slug(url) }),
            (text, markup) => Ok(PageCapture::new(text.unwrap_or_default(), markup.unwrap_or_default())),
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, CaptureError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            trace!("Read {} bytes from {}", bytes.len(), path.display());
            Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(CaptureError::Read { path: path.to_path_buf(), source: e }),
    }
}

/// File-name slug for a URL: scheme dropped, non-alphanumeric runs become `-`.
///
/// `https://tickets.example/show/42?day=1` becomes `tickets-example-show-42-day-1`.
pub fn capture_slug(url: &str) -> String {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);

    let mut slug = String::with_capacity(rest.len());
    for c in rest.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_matches('-').to_string()
}
