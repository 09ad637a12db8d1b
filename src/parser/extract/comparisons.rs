//! Comparison and bibliography extraction.
//!
//! Both are intentionally empty for now: the legacy pages mix real
//! cross-references ("See Gamba, Viole.", "Compare with Salicional.") with
//! prose that merely starts the same way ("See photos", "See the Sound Files
//! appendix", "See above"), and the bibliography markup varies per page.
//! The record fields exist so the site templates and the JSON layout are
//! stable once these are filled in.

use crate::model::{BibliographyEntry, StopLink};
use crate::parser::dom::Document;

pub fn extract_comparisons(_doc: &Document) -> Vec<StopLink> {
    Vec::new()
}

pub fn extract_bibliography(_doc: &Document) -> Vec<BibliographyEntry> {
    Vec::new()
}
