use crate::model::StopLink;
use crate::parser::dom::Document;

use super::{finalize, BIBLIOGRAPHY, EXAMPLES, EXAMPLE_CLASS};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExampleData {
    pub description: String,
    pub examples: Vec<StopLink>,
}

/// The "Examples" section: an introductory paragraph followed by
/// `<p class="example">` entries. Sections this cannot read yield nothing.
pub fn extract(doc: &Document) -> ExampleData {
    let Some(header) = doc.find_all("h2").find(|h| h.text() == EXAMPLES) else {
        return ExampleData::default();
    };

    let description = match header.next_element() {
        Some(p) if p.is("p") => finalize(&p.text()),
        Some(node) => match node.as_text() {
            Some(text) => finalize(text),
            None => return ExampleData::default(),
        },
        None => return ExampleData::default(),
    };

    let mut examples: Vec<StopLink> = doc
        .find_all("p")
        .filter(|p| p.has_class(EXAMPLE_CLASS))
        .map(|p| StopLink {
            name: finalize(&p.text()),
            link: String::new(),
        })
        .collect();

    // An unclosed last example swallows the rest of the page.
    if examples
        .last()
        .is_some_and(|last| last.name.contains(BIBLIOGRAPHY))
    {
        examples.pop();
    }

    ExampleData {
        description,
        examples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paragraph_description_and_examples() {
        let doc = Document::parse(
            "<h2>Examples</h2>\n<p>Found on these organs:</p>\n\
             <p class=\"example\">Westminster   Abbey</p>\n\
             <p class=\"example\">St. Paul's Cathedral</p>\n",
        )
        .unwrap();
        let data = extract(&doc);
        assert_eq!(data.description, "Found on these organs:");
        let names: Vec<_> = data.examples.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Westminster Abbey", "St. Paul's Cathedral"]);
        assert!(data.examples.iter().all(|e| e.link.is_empty()));
    }

    #[test]
    fn unclosed_last_example_is_dropped() {
        let doc = Document::parse(
            "<body><h2>Examples</h2>\n<p>Organs:</p>\n\
             <p class=\"example\">Westminster Abbey</p>\n\
             <p class=\"example\">St. Paul's Cathedral\n<h2>Bibliography</h2><p>Audsley</p></body>",
        )
        .unwrap();
        let data = extract(&doc);
        assert_eq!(data.examples.len(), 1);
        assert_eq!(data.examples[0].name, "Westminster Abbey");
    }

    #[test]
    fn closed_last_example_is_kept() {
        let doc = Document::parse(
            "<h2>Examples</h2>\n<p>Organs:</p>\n\
             <p class=\"example\">Westminster Abbey</p>\n\
             <p class=\"example\">St. Paul's Cathedral</p>\n<h2>Bibliography</h2>",
        )
        .unwrap();
        assert_eq!(extract(&doc).examples.len(), 2);
    }

    #[test]
    fn bare_text_description() {
        let doc = Document::parse("<div><h2>Examples</h2>Common in England.<p class=\"example\">York</p></div>").unwrap();
        let data = extract(&doc);
        assert_eq!(data.description, "Common in England.");
        assert_eq!(data.examples.len(), 1);
    }

    #[test]
    fn malformed_section_yields_nothing() {
        let doc = Document::parse("<h2>Examples</h2><ul><li>x</li></ul><p class=\"example\">York</p>").unwrap();
        assert_eq!(extract(&doc), ExampleData::default());
        let doc = Document::parse("<h2>Other</h2><p class=\"example\">York</p>").unwrap();
        assert_eq!(extract(&doc), ExampleData::default());
    }
}
