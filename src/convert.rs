//! Batch conversion of the legacy tree into normalized JSON records.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::config::{ClipLabels, ErrorPolicy, Settings};
use crate::error::ExtractResult;
use crate::model::StopRecord;
use crate::parser;
use crate::slug::{legacy_to_slug, name_to_slug, SlugKey};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

const CHUNK: usize = 200;

/// One legacy document selected for conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyStop {
    pub key: SlugKey,
    pub legacy_stem: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConvertFailure {
    pub key: SlugKey,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct ConvertReport {
    pub found: usize,
    pub selected: usize,
    pub converted: Vec<SlugKey>,
    pub failed: Vec<ConvertFailure>,
    pub dry_run: bool,
}

impl ConvertReport {
    pub fn print(&self) {
        let verb = if self.dry_run { "Parsed" } else { "Converted" };
        println!(
            "{} {} of {} selected stops ({} legacy documents found), {} failed.",
            verb,
            self.converted.len(),
            self.selected,
            self.found,
            self.failed.len()
        );
        for failure in &self.failed {
            println!("  FAILED {} ({}): {}", failure.key, failure.path.display(), failure.error);
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Convert every legacy document under `old_root` that has no record under
/// `new_root` yet (or all of them with `rewrite_all`). With `dry_run` the
/// documents are parsed but nothing is written.
pub fn convert_all(
    old_root: &Path,
    new_root: &Path,
    rewrite_all: bool,
    dry_run: bool,
    settings: &Settings,
) -> Result<ConvertReport> {
    if !old_root.is_dir() {
        bail!("Path {} does not exist", old_root.display());
    }
    if !dry_run {
        fs::create_dir_all(new_root)
            .with_context(|| format!("Failed to create {}", new_root.display()))?;
    }

    let legacy = collect_legacy_stops(old_root, settings)?;
    info!(count = legacy.len(), "found legacy stops");

    let converted = if rewrite_all {
        info!("rewrite requested, will rewrite all files");
        BTreeSet::new()
    } else {
        collect_converted_stops(new_root, settings)?
    };
    let selected = select_for_conversion(&legacy, &converted, rewrite_all);
    info!(count = selected.len(), "need to convert stops");

    let mut report = ConvertReport {
        found: legacy.len(),
        selected: selected.len(),
        dry_run,
        ..Default::default()
    };
    if selected.is_empty() {
        return Ok(report);
    }

    let labels = settings.clip_labels();
    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    for chunk in selected.chunks(CHUNK) {
        let results = extract_chunk(chunk, &labels);

        for (stop, result) in chunk.iter().zip(results) {
            let outcome = result
                .map_err(anyhow::Error::from)
                .and_then(|record| {
                    check_primary_slug(stop, &record);
                    write_record(&record, new_root, &stop.key, dry_run)
                });

            match outcome {
                Ok(_) => report.converted.push(stop.key.clone()),
                Err(e) => {
                    let message = format!("{:#}", e);
                    warn!(doc = %stop.key, error = %message, "conversion failed");
                    if settings.on_error == ErrorPolicy::Abort {
                        pb.finish_and_clear();
                        return Err(e.context(format!(
                            "Aborted after {} converted stops: {} failed",
                            report.converted.len(),
                            stop.path.display()
                        )));
                    }
                    report.failed.push(ConvertFailure {
                        key: stop.key.clone(),
                        path: stop.path.clone(),
                        error: message,
                    });
                }
            }
        }
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    Ok(report)
}

#[cfg(feature = "rayon")]
fn extract_chunk(chunk: &[LegacyStop], labels: &ClipLabels) -> Vec<ExtractResult<StopRecord>> {
    chunk
        .par_iter()
        .map(|stop| parser::parse_file(&stop.path, labels))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn extract_chunk(chunk: &[LegacyStop], labels: &ClipLabels) -> Vec<ExtractResult<StopRecord>> {
    chunk
        .iter()
        .map(|stop| parser::parse_file(&stop.path, labels))
        .collect()
}

/// Records are stored under the legacy-derived slug so re-runs can diff
/// against them; a primary name that disagrees is worth a look by hand.
fn check_primary_slug(stop: &LegacyStop, record: &StopRecord) {
    if let Some(primary) = record.primary_name() {
        let from_name = name_to_slug(&primary.name);
        if from_name != stop.key.slug {
            warn!(
                doc = %stop.key,
                primary = %primary.name,
                "primary name does not match the file name"
            );
        }
    }
}

/// Every non-hidden, non-skipped `*.html` file in a bucket directory.
pub fn collect_legacy_stops(old_root: &Path, settings: &Settings) -> Result<BTreeMap<SlugKey, LegacyStop>> {
    let mut stops = BTreeMap::new();
    for path in collect_bucketed_files(old_root, "html", settings)? {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().into_owned()) else {
            continue;
        };
        let slug = legacy_to_slug(&stem);
        if settings.is_skipped(&stem, &slug) {
            debug!(doc = %stem, "on the skip list");
            continue;
        }
        let key = SlugKey::from_slug(&slug);
        if let Some(previous) = stops.get(&key).map(|s: &LegacyStop| s.path.clone()) {
            warn!(doc = %key, first = %previous.display(), second = %path.display(), "two legacy documents share a slug");
        }
        stops.insert(
            key.clone(),
            LegacyStop {
                key,
                legacy_stem: stem,
                path,
            },
        );
    }
    Ok(stops)
}

/// Slugs that already have a record under `new_root`.
pub fn collect_converted_stops(new_root: &Path, settings: &Settings) -> Result<BTreeSet<SlugKey>> {
    if !new_root.is_dir() {
        return Ok(BTreeSet::new());
    }
    Ok(collect_bucketed_files(new_root, "json", settings)?
        .iter()
        .filter_map(|p| p.file_stem())
        .map(|stem| SlugKey::from_slug(&stem.to_string_lossy()))
        .collect())
}

/// Set difference in slug order, or everything with `rewrite_all`.
pub fn select_for_conversion(
    legacy: &BTreeMap<SlugKey, LegacyStop>,
    converted: &BTreeSet<SlugKey>,
    rewrite_all: bool,
) -> Vec<LegacyStop> {
    legacy
        .values()
        .filter(|stop| rewrite_all || !converted.contains(&stop.key))
        .cloned()
        .collect()
}

/// Write `record` to `<new_root>/<bucket>/<slug>.json`, creating the bucket.
pub fn write_record(record: &StopRecord, new_root: &Path, key: &SlugKey, dry_run: bool) -> Result<PathBuf> {
    let path = new_root.join(&key.bucket).join(format!("{}.json", key.slug));
    if dry_run {
        debug!(path = %path.display(), "would write new file");
        return Ok(path);
    }

    let parent = path
        .parent()
        .ok_or_else(|| anyhow!("No parent directory for {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;

    let mut json = serde_json::to_string_pretty(record)?;
    json.push('\n');
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote new file");
    Ok(path)
}

/// Files in the single-letter bucket directories directly under `root`.
/// Anything nested deeper (backups, asset folders) is not part of the tree.
fn collect_bucketed_files(root: &Path, ext: &str, settings: &Settings) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("Failed to list {}", root.display()))? {
        let path = entry?.path();
        let is_bucket_dir = path.is_dir()
            && path
                .file_name()
                .is_some_and(|name| is_bucket(&name.to_string_lossy()));
        if is_bucket_dir {
            files.extend(bucket_files(&path, ext, settings)?);
        }
    }
    files.sort();
    Ok(files)
}

fn bucket_files(dir: &Path, ext: &str, settings: &Settings) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if settings.is_hidden(&name) {
            continue;
        }
        if path.extension().and_then(|s| s.to_str()).unwrap_or("") == ext {
            files.push(path);
        }
    }
    Ok(files)
}

fn is_bucket(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_lowercase())
}
