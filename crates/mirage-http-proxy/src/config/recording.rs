//! Recording storage configuration.

use crate::recording::{Fingerprinter, DEFAULT_IGNORED_HEADERS};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where recorded interactions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecordingBackend {
    /// One JSON file per interaction under `path`
    #[default]
    File,
    /// Process memory only
    Memory,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RecordingConfig {
    /// Base directory for the file backend
    #[serde(default = "default_recordings_path")]
    pub path: PathBuf,

    #[serde(default)]
    pub backend: RecordingBackend,

    /// Header names left out of request fingerprints (case-insensitive).
    /// An explicit empty list fingerprints every header.
    #[serde(default = "default_ignored_headers")]
    pub ignored_headers: Vec<String>,
}

impl RecordingConfig {
    pub fn fingerprinter(&self) -> Fingerprinter {
        Fingerprinter::new(&self.ignored_headers)
    }
}

fn default_recordings_path() -> PathBuf {
    PathBuf::from("recordings")
}

fn default_ignored_headers() -> Vec<String> {
    DEFAULT_IGNORED_HEADERS
        .iter()
        .map(|h| h.to_string())
        .collect()
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            path: default_recordings_path(),
            backend: RecordingBackend::default(),
            ignored_headers: default_ignored_headers(),
        }
    }
}
