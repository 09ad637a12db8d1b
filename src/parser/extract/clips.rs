use crate::config::ClipLabels;
use crate::error::{ExtractError, ExtractResult};
use crate::model::{ClipFile, Division, SoundClip};
use crate::parser::dom::{Document, NodeRef};
use crate::slug::href_segment;

use super::{descendant_href, finalize, SAMPLES};

const DIVISIONS: &[&str] = &["Manual", "Pedal"];

/// Sound clips from the `samples` table, grouped by division.
///
/// Rows with the `samples` class are clips; any other row opens a new
/// division. A division only makes it into the output once it has a clip.
pub fn extract(doc_id: &str, doc: &Document, labels: &ClipLabels) -> ExtractResult<Vec<Division>> {
    let Some(table) = doc.find_all("table").find(|t| t.has_class(SAMPLES)) else {
        return Ok(Vec::new());
    };

    let mut divisions = Vec::new();
    let mut current = division("");

    for row in table.find_all("tr") {
        if row.has_class(SAMPLES) {
            current.clips.push(clip_from_row(doc_id, row, labels)?);
            continue;
        }

        let text = row.text();
        let name = text
            .split_whitespace()
            .next()
            .filter(|name| DIVISIONS.contains(name))
            .ok_or_else(|| {
                ExtractError::structural(doc_id, format!("unknown division row: {:?}", finalize(&text)))
            })?;
        let finished = std::mem::replace(&mut current, division(name));
        if !finished.clips.is_empty() {
            divisions.push(finished);
        }
    }

    if !current.clips.is_empty() {
        divisions.push(current);
    }
    Ok(divisions)
}

fn division(name: &str) -> Division {
    Division {
        division_name: name.to_string(),
        clips: Vec::new(),
    }
}

/// Columns: stop name, organ (optionally linked), builder, then one labelled
/// audio file per remaining cell.
fn clip_from_row(doc_id: &str, row: NodeRef, labels: &ClipLabels) -> ExtractResult<SoundClip> {
    let mut clip = SoundClip::default();

    for (ix, col) in row.find_all("td").enumerate() {
        let text = col.text();
        match ix {
            0 => clip.name = finalize(&text),
            1 => {
                clip.organ_link = descendant_href(col)
                    .and_then(|href| href_segment(href, 2))
                    .unwrap_or_default()
                    .to_string();
                clip.organ_name = finalize(&text);
            }
            2 => clip.organ_builder_name = finalize(&text),
            _ => {
                if text.trim().is_empty() {
                    continue;
                }
                let name = match labels.resolve(&text) {
                    Some(label) => label,
                    // Points at another entry's clips.
                    None if text.to_lowercase().contains("see") => continue,
                    None => {
                        return Err(ExtractError::UnknownClipLabel {
                            doc: doc_id.to_string(),
                            label: finalize(&text),
                        })
                    }
                };
                let file = descendant_href(col)
                    .and_then(|href| href_segment(href, 1))
                    .ok_or_else(|| {
                        ExtractError::structural(doc_id, format!("clip {:?} has no file link", name))
                    })?;
                clip.files.push(ClipFile {
                    name: name.to_string(),
                    file: file.to_string(),
                });
            }
        }
    }

    Ok(clip)
}
