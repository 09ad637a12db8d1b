//! Static site assembly from normalized records.

pub mod index;
pub mod render;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, info, warn};

use crate::model::StopRecord;
use crate::slug::SlugKey;
use index::{build_name_index, group_by_letter, missing_slugs, RecordSet};
use render::Renderer;

/// Asset directories copied verbatim into the site root.
pub const ASSET_DIRS: &[&str] = &["images", "audio"];

#[derive(Debug, Clone)]
pub struct SiteLayout {
    /// Root of the normalized `<bucket>/<slug>.json` tree.
    pub definitions: PathBuf,
    /// Output directory; cleared before every build.
    pub site_root: PathBuf,
    /// Directory holding `images/` and `audio/`.
    pub assets: PathBuf,
}

#[derive(Debug, Default)]
pub struct SiteReport {
    pub pages: usize,
    pub missing: Vec<SlugKey>,
    pub names: usize,
    pub assets_copied: usize,
}

impl SiteReport {
    pub fn print(&self) {
        println!(
            "Rendered {} stop pages, {} missing stubs and an index of {} names ({} asset files).",
            self.pages,
            self.missing.len(),
            self.names,
            self.assets_copied
        );
        for key in &self.missing {
            println!("  MISSING {}", key);
        }
    }
}

/// Full rebuild of the site from the records under `layout.definitions`.
pub fn build_site(layout: &SiteLayout) -> Result<SiteReport> {
    if !layout.definitions.is_dir() {
        bail!("Path {} does not exist", layout.definitions.display());
    }

    let records = load_records(&layout.definitions)?;
    info!(count = records.len(), "loaded records");

    // Rendering setup fails before the old site is thrown away.
    let renderer = Renderer::new()?;

    if layout.site_root.exists() {
        fs::remove_dir_all(&layout.site_root)
            .with_context(|| format!("Failed to clear {}", layout.site_root.display()))?;
    }
    fs::create_dir_all(&layout.site_root)
        .with_context(|| format!("Failed to create {}", layout.site_root.display()))?;

    let mut report = SiteReport::default();

    for dir in ASSET_DIRS {
        let from = layout.assets.join(dir);
        if !from.is_dir() {
            warn!(path = %from.display(), "asset directory not found, skipping");
            continue;
        }
        report.assets_copied += copy_dir(&from, &layout.site_root.join(dir))?;
    }

    for (key, record) in &records {
        write_page(&layout.site_root, key, &renderer.stop_page(key, record)?)?;
        report.pages += 1;
    }

    for key in missing_slugs(&records) {
        debug!(slug = %key, "writing missing stub");
        write_page(&layout.site_root, &key, &renderer.missing_page(&key)?)?;
        report.missing.push(key);
    }

    let names = build_name_index(&records);
    report.names = names.len();
    let html = renderer.index_page(&group_by_letter(&names))?;
    let index_path = layout.site_root.join("index.html");
    fs::write(&index_path, html).with_context(|| format!("Failed to write {}", index_path.display()))?;

    info!(pages = report.pages, missing = report.missing.len(), "site written");
    Ok(report)
}

/// Every `*.json` record under `root`, keyed by its primary name.
pub fn load_records(root: &Path) -> Result<RecordSet> {
    let mut files = Vec::new();
    collect_files(root, "json", &mut files)?;
    files.sort();

    let mut records = RecordSet::new();
    for path in files {
        let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let record: StopRecord =
            serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
        let primary = record
            .primary_name()
            .ok_or_else(|| anyhow!("{} has no primary name", path.display()))?;
        let key = SlugKey::from_name(&primary.name);
        if records.contains_key(&key) {
            warn!(slug = %key, path = %path.display(), "duplicate primary name, keeping the later record");
        }
        records.insert(key, record);
    }
    Ok(records)
}

fn collect_files(dir: &Path, ext: &str, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if hidden {
            continue;
        }
        if path.is_dir() {
            collect_files(&path, ext, files)?;
        } else if path.extension().and_then(|s| s.to_str()) == Some(ext) {
            files.push(path);
        }
    }
    Ok(())
}

/// Recursive copy; returns the number of files copied.
fn copy_dir(from: &Path, to: &Path) -> Result<usize> {
    fs::create_dir_all(to).with_context(|| format!("Failed to create {}", to.display()))?;
    let mut copied = 0;
    for entry in fs::read_dir(from).with_context(|| format!("Failed to list {}", from.display()))? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copied += copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn write_page(site_root: &Path, key: &SlugKey, html: &str) -> Result<()> {
    let dir = site_root.join(&key.bucket);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{}.html", key.slug));
    fs::write(&path, html).with_context(|| format!("Failed to write {}", path.display()))
}
