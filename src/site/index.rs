use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::Serialize;

use crate::model::StopRecord;
use crate::slug::SlugKey;

/// All records of one build, keyed by the slug of their primary name.
pub type RecordSet = BTreeMap<SlugKey, StopRecord>;

/// One line of the alphabetical index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct NameIndexEntry {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub link: String,
    pub exists: bool,
}

/// Names sharing a first letter, for the index page.
#[derive(Debug, Clone, Serialize)]
pub struct IndexGroup {
    pub initial: String,
    pub entries: Vec<NameIndexEntry>,
}

/// Every primary, alternate, variant and comparison name, de-duplicated on
/// (name, origin, link) and sorted by name.
pub fn build_name_index(records: &RecordSet) -> Vec<NameIndexEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut push = |name: &str, origin: Option<&str>, link: &str| {
        let key = (name.to_string(), origin.map(str::to_string), link.to_string());
        if !seen.insert(key) {
            return;
        }
        entries.push(NameIndexEntry {
            name: name.to_string(),
            origin: origin.map(str::to_string),
            link: link.to_string(),
            exists: records.contains_key(&SlugKey::from_slug(link)),
        });
    };

    for (key, record) in records {
        for entry in &record.names {
            // An unlinked alternate name points at the page it appears on.
            let link = if entry.link.is_empty() { &key.slug } else { &entry.link };
            push(&entry.name, Some(entry.origin.as_str()), link.as_str());
        }
        for other in record.variants.iter().chain(&record.comparisons) {
            if !other.link.is_empty() {
                push(&other.name, None, &other.link);
            }
        }
    }

    entries.sort_by(|a, b| {
        (a.name.to_lowercase(), &a.name, &a.origin, &a.link)
            .cmp(&(b.name.to_lowercase(), &b.name, &b.origin, &b.link))
    });
    entries
}

/// Every slug some record links to (by name, variant, comparison or
/// example) that has no record of its own.
pub fn missing_slugs(records: &RecordSet) -> BTreeSet<SlugKey> {
    let mut missing = BTreeSet::new();
    for record in records.values() {
        let links = record
            .names
            .iter()
            .map(|n| n.link.as_str())
            .chain(record.variants.iter().map(|v| v.link.as_str()))
            .chain(record.comparisons.iter().map(|c| c.link.as_str()))
            .chain(record.examples.iter().map(|e| e.link.as_str()));
        for link in links.filter(|l| !l.is_empty()) {
            let key = SlugKey::from_slug(link);
            if !records.contains_key(&key) {
                missing.insert(key);
            }
        }
    }
    missing
}

/// Group an already sorted index by uppercased first letter.
pub fn group_by_letter(entries: &[NameIndexEntry]) -> Vec<IndexGroup> {
    let mut groups: Vec<IndexGroup> = Vec::new();
    for entry in entries {
        let initial: String = entry
            .name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();
        match groups.last_mut() {
            Some(group) if group.initial == initial => group.entries.push(entry.clone()),
            _ => groups.push(IndexGroup {
                initial,
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}
