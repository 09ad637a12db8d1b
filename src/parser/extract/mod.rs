pub mod clips;
pub mod comparisons;
pub mod examples;
pub mod images;
pub mod names;
pub mod summary;
pub mod variants;

use super::dom::NodeRef;

// Markers authored into the legacy pages.
pub const BIBLIOGRAPHY: &str = "Bibliography";
pub const EXAMPLES: &str = "Examples";
pub const EXAMPLE_CLASS: &str = "example";
pub const FOOTER: &str = "Footer";
pub const FOOTER_CHILD: &str = "FOOTER";
pub const IGNORE: &str = "IGNORE";
pub const NAMES: &str = "NAMES";
pub const NOT_DONE: &str = "NotDone";
pub const PRIMARY: &str = "PRIMARY";
pub const SAMPLES: &str = "samples";
pub const SPONSOR_IMG_CLASS: &str = "Sponsor";
pub const TONAL_ATTRIBUTES: &str = "Tonal Attributes";
pub const UNKNOWN_ORIGIN: &str = "Unknown";
pub const VARIANTS: &str = "Variants";

/// Collapse runs of whitespace and trim.
pub fn finalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First comment among the text/comment siblings after `node`. Stops at the
/// next element.
pub fn next_comment<'a>(node: NodeRef<'a>) -> Option<&'a str> {
    node.following_siblings()
        .take_while(|n| n.is_string())
        .find_map(|n| n.as_comment())
        .map(str::trim)
}

pub fn previous_comment<'a>(node: NodeRef<'a>) -> Option<&'a str> {
    node.preceding_siblings()
        .take_while(|n| n.is_string())
        .find_map(|n| n.as_comment())
        .map(str::trim)
}

/// `href` of the first anchor below `node`.
pub fn descendant_href<'a>(node: NodeRef<'a>) -> Option<&'a str> {
    node.find_all("a").next().and_then(|a| a.attr("href"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::Document;

    #[test]
    fn finalize_collapses_whitespace() {
        assert_eq!(finalize("  Open\n  Diapason\u{a0}8' "), "Open Diapason 8'");
        assert_eq!(finalize("\n\t"), "");
    }

    #[test]
    fn comments_are_found_across_text_but_not_elements() {
        let doc = Document::parse("<td>A<br> <!-- PRIMARY -->B<br><b>x</b><!--IGNORE--></td>").unwrap();
        let brs: Vec<_> = doc.find_all("br").collect();
        assert_eq!(next_comment(brs[0]), Some("PRIMARY"));
        assert_eq!(next_comment(brs[1]), None);
    }

    #[test]
    fn previous_comment_marks_tables() {
        let doc = Document::parse("<!--NAMES-->\n<table></table><table></table>").unwrap();
        let tables: Vec<_> = doc.find_all("table").collect();
        assert_eq!(previous_comment(tables[0]), Some("NAMES"));
        assert_eq!(previous_comment(tables[1]), None);
    }
}
