use std::ops::ControlFlow;

use crate::parser::dom::NodeRef;

use super::{finalize, FOOTER, FOOTER_CHILD, NOT_DONE, TONAL_ATTRIBUTES, VARIANTS};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub description: String,
    pub construction: String,
    pub usage: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Description,
    Construction,
    Usage,
}

/// Routes prose fragments into the field named by the last heading token seen.
#[derive(Debug)]
struct SummaryMachine {
    field: Field,
    description: String,
    construction: String,
    usage: String,
}

impl SummaryMachine {
    fn new() -> Self {
        SummaryMachine {
            field: Field::Description,
            description: String::new(),
            construction: String::new(),
            usage: String::new(),
        }
    }

    fn feed(&mut self, fragment: NodeRef) -> ControlFlow<()> {
        if let Some(comment) = fragment.as_comment() {
            return if comment.contains(FOOTER) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            };
        }
        let Some(text) = fragment.as_text() else {
            return ControlFlow::Continue(());
        };

        if text.contains(FOOTER) {
            return ControlFlow::Break(());
        }
        // "See ..." / "Compare with ..." open the comparison list.
        let trimmed = text.trim();
        if trimmed.starts_with("See") || trimmed.starts_with("Compare with") {
            return ControlFlow::Break(());
        }

        match text {
            VARIANTS => return ControlFlow::Break(()),
            "Construction" => self.field = Field::Construction,
            "Usage" => self.field = Field::Usage,
            TONAL_ATTRIBUTES => self.field = Field::Description,
            _ => {
                let target = match self.field {
                    Field::Description => &mut self.description,
                    Field::Construction => &mut self.construction,
                    Field::Usage => &mut self.usage,
                };
                target.push_str(&text.replace('\n', " "));
            }
        }
        ControlFlow::Continue(())
    }

    fn finish(self) -> Summary {
        Summary {
            description: finalize(&self.description),
            construction: finalize(&self.construction),
            usage: finalize(&self.usage),
        }
    }
}

/// Description, construction and usage prose following the name table.
pub fn extract(names_table: NodeRef) -> Summary {
    let Some(start) = first_prose_paragraph(names_table) else {
        return Summary::default();
    };

    // The opening paragraph is usually left unclosed, so it may already hold
    // most of the page; keep reading sibling paragraphs until something else.
    let mut fragments: Vec<NodeRef> = start.strings().collect();
    let mut element = start;
    while let Some(next) = element
        .next_element()
        .filter(|n| n.is("p") || n.is("blockquote"))
    {
        element = next;
        if has_footer_child(next) {
            break;
        }
        fragments.extend(next.strings());
    }

    let mut machine = SummaryMachine::new();
    for fragment in fragments {
        if machine.feed(fragment).is_break() {
            break;
        }
    }
    machine.finish()
}

fn first_prose_paragraph<'a>(table: NodeRef<'a>) -> Option<NodeRef<'a>> {
    let mut candidate = table.next_sibling_tag("p");
    while let Some(p) = candidate {
        if p.has_class(NOT_DONE) || is_image_wrapper(p) {
            candidate = p.next_sibling_tag("p");
            continue;
        }
        return Some(p);
    }
    None
}

/// A paragraph that only exists to close an inline image.
fn is_image_wrapper(p: NodeRef) -> bool {
    let descendants: Vec<_> = p.descendants().collect();
    descendants.iter().take(5).any(|n| n.is("img")) && descendants.len() < 10
}

fn has_footer_child(element: NodeRef) -> bool {
    element.children().any(|c| {
        c.as_text()
            .or_else(|| c.as_comment())
            .is_some_and(|s| s.trim() == FOOTER_CHILD)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::dom::Document;

    fn summary_of(body: &str) -> Summary {
        let html = format!("<body><!--NAMES--><table><tr><td>x</td></tr></table>\n{}</body>", body);
        let doc = Document::parse(&html).unwrap();
        let table = doc.find_all("table").next().unwrap();
        extract(table)
    }

    #[test]
    fn keywords_switch_fields() {
        let s = summary_of(
            "<p>A bright reed.\n<h3>Construction</h3>Capped\n   resonators.\
             <h3>Usage</h3>Solo work.<h3>Tonal Attributes</h3>Brilliant.",
        );
        assert_eq!(s.description, "A bright reed. Brilliant.");
        assert_eq!(s.construction, "Capped resonators.");
        assert_eq!(s.usage, "Solo work.");
    }

    #[test]
    fn skips_under_construction_and_image_paragraphs() {
        let s = summary_of(
            "<p class=\"NotDone\">Under construction</p>\n\
             <p><img src=\"a.jpg\"></p>\n\
             <p>Real text.</p>\n<p>More text.</p>",
        );
        assert_eq!(s.description, "Real text.More text.");
    }

    #[test]
    fn see_line_stops_description() {
        let s = summary_of("<p>Soft flute.</p>\n<p>See <a href=\"x.html\">Flute</a></p>");
        assert_eq!(s.description, "Soft flute.");
    }

    #[test]
    fn compare_with_line_stops_description() {
        let s = summary_of(
            "<p>Soft string.</p>\n<p>Compare with <a href=\"../s/Salicional.html\">Salicional</a>.</p>",
        );
        assert_eq!(s.description, "Soft string.");
    }

    #[test]
    fn less_than_in_prose_is_kept() {
        let s = summary_of("<p>The 16' rank < 8' rank in power.</p>");
        assert_eq!(s.description, "The 16' rank < 8' rank in power.");
    }

    #[test]
    fn image_paragraph_threshold() {
        // img is the 5th of 9 descendants: still just an image holder.
        let s = summary_of(
            "<p><b>a</b><b>b</b><img src=\"x.jpg\"><i>c</i><i>d</i></p>\n<p>Real.</p>",
        );
        assert_eq!(s.description, "Real.");

        // A 10th descendant makes it prose.
        let s = summary_of(
            "<p><b>a</b><b>b</b><img src=\"x.jpg\"><i>c</i><i>d</i>e</p>\n<p>Real.</p>",
        );
        assert_eq!(s.description, "abcdeReal.");

        // img as the 6th descendant is too late to count.
        let s = summary_of("<p><b>a</b><b>b</b>c<img src=\"x.jpg\"></p>\n<p>Real.</p>");
        assert_eq!(s.description, "abcReal.");
    }

    #[test]
    fn variants_header_stops_description() {
        let s = summary_of("<p>Soft flute.\n<h2>Variants</h2><a href=\"x.html\">X</a>");
        assert_eq!(s.description, "Soft flute.");
    }

    #[test]
    fn footer_marker_stops_description() {
        let s = summary_of("<p>Soft flute.</p>\n<p>FOOTER</p>\n<p>Never read.</p>");
        assert_eq!(s.description, "Soft flute.");
        let s = summary_of("<p>Soft flute.<!-- Footer -->Never read.</p>");
        assert_eq!(s.description, "Soft flute.");
    }

    #[test]
    fn blockquotes_continue_the_text() {
        let s = summary_of("<p>One.</p>\n<blockquote>Two.</blockquote>\n<div>Three.</div>");
        assert_eq!(s.description, "One.Two.");
    }

    #[test]
    fn no_paragraph_means_empty_summary() {
        assert_eq!(summary_of("<div>nothing</div>"), Summary::default());
    }
}
