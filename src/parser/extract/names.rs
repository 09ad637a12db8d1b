use crate::error::{ExtractError, ExtractResult};
use crate::model::NameEntry;
use crate::parser::dom::NodeRef;
use crate::slug::href_to_slug;

use super::{next_comment, IGNORE, PRIMARY, UNKNOWN_ORIGIN};

const UNKNOWN_SENTINEL: &str = "(unknown)";

/// Extract the alternate-name table.
///
/// Each entry ends in a `<br>`: the text node right before it is the origin,
/// the node before that holds the name. A `PRIMARY` comment after the `<br>`
/// marks the canonical name, an `IGNORE` comment drops the entry.
pub fn extract(doc: &str, table: NodeRef) -> ExtractResult<Vec<NameEntry>> {
    let mut names = Vec::new();

    for br in table.find_all("br") {
        let marker = next_comment(br);
        if marker == Some(IGNORE) {
            continue;
        }

        let before = br.prev_sibling();
        let (name_node, origin) = match before.and_then(|n| n.as_text().map(|t| (n, t))) {
            Some((origin_node, origin)) => (origin_node.prev_sibling(), origin),
            None => (before, ""),
        };
        let name_node = name_node.ok_or_else(|| {
            ExtractError::structural(doc, format!("name entry ending in {:?} has no name", before))
        })?;

        let raw_name = trailing_text(name_node);
        if raw_name.trim().is_empty() {
            return Err(ExtractError::structural(
                doc,
                format!("no name text in {:?}", name_node),
            ));
        }
        let name = raw_name.trim();
        let name = name.strip_prefix('\'').map(str::trim).unwrap_or(name);

        names.push(NameEntry {
            name: name.to_string(),
            origin: normalize_origin(origin),
            link: link_of(name_node),
            primary: marker == Some(PRIMARY),
        });
    }

    if names.is_empty() {
        return Err(ExtractError::structural(doc, "name table yields no names"));
    }
    let primaries = names.iter().filter(|n| n.primary).count();
    if primaries != 1 {
        return Err(ExtractError::structural(
            doc,
            format!("expected exactly one PRIMARY name, found {}", primaries),
        ));
    }
    Ok(names)
}

/// The trailing run of text nodes below `node`, e.g. `<b>x<img> Name</b>`
/// yields `" Name"`. Comments inside the run are stepped over.
fn trailing_text(node: NodeRef) -> String {
    if let Some(text) = node.as_text() {
        return text.to_string();
    }
    let descendants: Vec<_> = node.descendants().collect();
    let mut parts = Vec::new();
    for n in descendants.iter().rev() {
        if let Some(text) = n.as_text() {
            parts.push(text);
        } else if n.name().is_some() {
            break;
        }
    }
    parts.reverse();
    parts.concat()
}

/// Slug of the last anchor in (or being) the name node.
fn link_of(node: NodeRef) -> String {
    std::iter::once(node)
        .chain(node.descendants())
        .filter(|n| n.is("a"))
        .filter_map(|a| a.attr("href"))
        .last()
        .map(href_to_slug)
        .unwrap_or_default()
}

fn normalize_origin(origin: &str) -> String {
    let origin = origin.trim();
    if origin.is_empty() || origin == UNKNOWN_SENTINEL {
        UNKNOWN_ORIGIN.to_string()
    } else {
        origin.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::Document;

    fn table_names(html: &str) -> ExtractResult<Vec<NameEntry>> {
        let doc = Document::parse(html).unwrap();
        let table = doc.find_all("table").next().unwrap();
        extract("test", table)
    }

    #[test]
    fn names_origins_and_primary() {
        let names = table_names(
            "<table><tr><td>\
             <b>Open Diapason</b> English<br><!--PRIMARY-->\n\
             <b>Principal</b> (unknown)<br>\n\
             <b><a href=\"../p/Prinzipal.html\">Prinzipal</a></b> German<br>\n\
             <b>'Diapason</b><br>\n\
             <b>Junk</b> Latin<br><!--IGNORE-->\n\
             </td></tr></table>",
        )
        .unwrap();

        assert_eq!(names.len(), 4);
        assert_eq!(
            names[0],
            NameEntry {
                name: "Open Diapason".into(),
                origin: "English".into(),
                link: String::new(),
                primary: true,
            }
        );
        assert_eq!(names[1].origin, UNKNOWN_ORIGIN);
        assert_eq!(names[2].link, "Prinzipal");
        assert!(!names[2].primary);
        assert_eq!(names[3].name, "Diapason");
        assert_eq!(names[3].origin, UNKNOWN_ORIGIN);
    }

    #[test]
    fn bare_anchor_name_carries_link() {
        let names = table_names(
            "<table><tr><td><b>Trumpet</b> English<br><!--PRIMARY-->\
             <a href=\"../t/TubaMirabilis.html\">Tuba</a> Italian<br></td></tr></table>",
        )
        .unwrap();
        assert_eq!(names[1].name, "Tuba");
        assert_eq!(names[1].link, "Tuba_Mirabilis");
    }

    #[test]
    fn name_text_stops_at_elements_and_skips_comments() {
        let names = table_names(
            "<table><tr><td>\
             <b>Open<!-- was Diapason --> Diapason</b> English<br><!--PRIMARY-->\
             <b>x<img src=\"a.png\"> Principal</b> German<br>\
             </td></tr></table>",
        )
        .unwrap();
        assert_eq!(names[0].name, "Open Diapason");
        assert_eq!(names[1].name, "Principal");
    }

    #[test]
    fn missing_primary_is_an_error() {
        let err = table_names("<table><tr><td><b>A</b> English<br></td></tr></table>").unwrap_err();
        assert!(err.to_string().contains("exactly one PRIMARY"));
    }

    #[test]
    fn multiple_primaries_are_an_error() {
        let err = table_names(
            "<table><tr><td><b>A</b> English<br><!--PRIMARY--><b>B</b> French<br><!--PRIMARY--></td></tr></table>",
        )
        .unwrap_err();
        assert!(matches!(err, ExtractError::StructuralMismatch { .. }));
    }

    #[test]
    fn empty_table_is_an_error() {
        let err = table_names("<table><tr><td>nothing here</td></tr></table>").unwrap_err();
        assert!(err.to_string().contains("no names"));
    }

    #[test]
    fn entry_without_name_text_is_an_error() {
        let err = table_names("<table><tr><td><b> </b> English<br><!--PRIMARY--></td></tr></table>").unwrap_err();
        assert!(err.to_string().contains("no name text"));
    }
}
