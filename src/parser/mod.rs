pub mod dom;
pub mod extract;

use std::path::Path;

use tracing::debug;

use crate::config::ClipLabels;
use crate::error::{ExtractError, ExtractResult};
use crate::model::StopRecord;
use dom::Document;
use extract::{clips, comparisons, examples, images, names, previous_comment, summary, variants, NAMES};

/// Legacy HTML → `StopRecord`. `doc_id` only labels log lines and errors.
pub fn parse_document(doc_id: &str, html: &str, labels: &ClipLabels) -> ExtractResult<StopRecord> {
    let doc = Document::parse(html).map_err(|e| ExtractError::Markup {
        doc: doc_id.to_string(),
        position: e.position,
        message: e.message,
    })?;

    let table = doc
        .find_all("table")
        .find(|t| previous_comment(*t) == Some(NAMES))
        .ok_or_else(|| ExtractError::structural(doc_id, "no table follows a NAMES marker"))?;

    let names = names::extract(doc_id, table)?;
    debug!(doc = doc_id, count = names.len(), "found names");

    let summary = summary::extract(table);

    let images = images::extract(&doc);
    debug!(doc = doc_id, count = images.len(), "found images");

    let variants = variants::extract(doc_id, &doc)?;
    debug!(doc = doc_id, count = variants.len(), "found variants");

    let comparisons = comparisons::extract_comparisons(&doc);

    let example_data = examples::extract(&doc);
    if example_data.description.is_empty() {
        debug!(doc = doc_id, "didn't find example description text");
    }
    debug!(doc = doc_id, count = example_data.examples.len(), "found examples");

    let sound_clips = clips::extract(doc_id, &doc, labels)?;
    for division in &sound_clips {
        debug!(
            doc = doc_id,
            division = %division.division_name,
            count = division.clips.len(),
            "found sound clips"
        );
    }

    let bibliography = comparisons::extract_bibliography(&doc);

    Ok(StopRecord {
        names,
        description: summary.description,
        construction: summary.construction,
        usage: summary.usage,
        images,
        variants,
        comparisons,
        examples_description: example_data.description,
        examples: example_data.examples,
        sound_clips,
        bibliography,
    })
}

/// Read and parse one legacy file; the file stem becomes the document id.
pub fn parse_file(path: &Path, labels: &ClipLabels) -> ExtractResult<StopRecord> {
    debug!(path = %path.display(), "reading legacy document");
    let html = std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_document(&doc_id, &html, labels)
}

// ── Tests ──
