use crate::error::{ExtractError, ExtractResult};
use crate::model::StopLink;
use crate::parser::dom::{Document, NodeRef};
use crate::slug::href_to_slug;

use super::{finalize, VARIANTS};

/// Links listed under the "Variants" header.
///
/// The element right after the header is a table of anchors, a single
/// anchor, or a prose paragraph (no variants). Anything else means the page
/// is laid out in a way this converter does not know.
pub fn extract(doc_id: &str, doc: &Document) -> ExtractResult<Vec<StopLink>> {
    let mut variants = Vec::new();

    for h2 in doc.find_all("h2").filter(|h| h.text() == VARIANTS) {
        let next = h2.next_element().ok_or_else(|| {
            ExtractError::structural(doc_id, "nothing follows the Variants header")
        })?;
        match next.name() {
            Some("table") => {
                for a in next.find_all("a") {
                    variants.push(anchor_link(doc_id, a)?);
                }
            }
            Some("a") => variants.push(anchor_link(doc_id, next)?),
            Some("p") => {}
            _ => {
                return Err(ExtractError::structural(
                    doc_id,
                    format!("unknown variants element: {:?}", next),
                ))
            }
        }
    }

    Ok(variants)
}

fn anchor_link(doc_id: &str, a: NodeRef) -> ExtractResult<StopLink> {
    let href = a.attr("href").ok_or_else(|| {
        ExtractError::structural(doc_id, format!("variant anchor {:?} has no href", a.text()))
    })?;
    Ok(StopLink {
        name: finalize(&a.text()),
        link: href_to_slug(href),
    })
}
