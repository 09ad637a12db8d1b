//! Layered settings: the versioned defaults shipped in `config/default.toml`,
//! an optional operator file, then `ORGAN_STOPS__*` environment variables.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

const DEFAULTS: &str = include_str!("../config/default.toml");
const ENV_PREFIX: &str = "ORGAN_STOPS";

/// What the batch converter does when one document fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Record the failure, keep converting, report at the end.
    Skip,
    /// Stop at the first failure.
    Abort,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkipEntry {
    pub document: String,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClipLabelEntry {
    pub label: String,
    pub matches: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub version: u32,
    pub on_error: ErrorPolicy,
    pub hidden_leaders: Vec<String>,
    #[serde(default)]
    pub skip: Vec<SkipEntry>,
    #[serde(default)]
    pub clip_labels: Vec<ClipLabelEntry>,
}

impl Settings {
    pub fn load(path: Option<&Path>) -> Result<Settings> {
        let mut builder = Config::builder().add_source(File::from_str(DEFAULTS, FileFormat::Toml));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .context("Failed to load settings")?
            .try_deserialize::<Settings>()
            .context("Invalid settings")?;
        Ok(settings)
    }

    /// The shipped defaults with no operator overrides.
    pub fn defaults() -> Result<Settings> {
        let settings = Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;
        Ok(settings)
    }

    /// Matches either the legacy file stem or the converted slug.
    pub fn is_skipped(&self, legacy_stem: &str, slug: &str) -> bool {
        self.skip
            .iter()
            .any(|s| s.document == legacy_stem || s.document == slug)
    }

    pub fn is_hidden(&self, file_name: &str) -> bool {
        self.hidden_leaders
            .iter()
            .any(|leader| !leader.is_empty() && file_name.starts_with(leader.as_str()))
    }

    pub fn clip_labels(&self) -> ClipLabels {
        ClipLabels::new(&self.clip_labels)
    }
}

/// Closed set of sound clip labels, keyed by normalized cell text.
#[derive(Debug, Clone, Default)]
pub struct ClipLabels {
    by_text: HashMap<String, String>,
}

impl ClipLabels {
    pub fn new(entries: &[ClipLabelEntry]) -> Self {
        let mut by_text = HashMap::new();
        for entry in entries {
            for text in &entry.matches {
                by_text.insert(normalize_label(text), entry.label.clone());
            }
        }
        ClipLabels { by_text }
    }

    pub fn resolve(&self, text: &str) -> Option<&str> {
        self.by_text.get(&normalize_label(text)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_text.is_empty()
    }
}

fn normalize_label(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
