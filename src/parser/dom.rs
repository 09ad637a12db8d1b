//! A small, forgiving document tree for hand-authored legacy pages.
//!
//! Tokens come from `quick-xml` with end-name checks switched off; the tree
//! is built the way a lenient HTML parser builds it:
//! - void elements (`br`, `img`, ...) never take children,
//! - an end tag closes back to the most recent open element of that name,
//!   and is dropped when no such element is open,
//! - nothing is ever auto-closed, so an unterminated `<p>` keeps everything
//!   after it until its parent closes.

use std::borrow::Cow;
use std::sync::LazyLock;

use quick_xml::escape::resolve_html5_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::{Captures, Regex};

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").unwrap());
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").unwrap());
static ENTITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[A-Za-z][A-Za-z0-9]*);").unwrap());

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Element {
        name: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    /// Position among the parent's children.
    index: usize,
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct ParseError {
    pub position: u64,
    pub message: String,
}

impl Document {
    pub fn parse(html: &str) -> Result<Document, ParseError> {
        let source = normalize_source(html);
        let mut reader = Reader::from_str(&source);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.check_comments = false;
        config.allow_unmatched_ends = true;
        config.expand_empty_elements = false;

        let mut builder = TreeBuilder::new();
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => builder.open(&e),
                Ok(Event::Empty(e)) => builder.leaf(&e),
                Ok(Event::End(e)) => {
                    builder.close(&String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase())
                }
                Ok(Event::Text(e)) => builder.text(&decode_entities(&String::from_utf8_lossy(&e))),
                Ok(Event::CData(e)) => builder.text(&String::from_utf8_lossy(&e)),
                Ok(Event::Comment(e)) => builder.comment(String::from_utf8_lossy(&e).into_owned()),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(ParseError {
                        position: reader.error_position(),
                        message: e.to_string(),
                    })
                }
            }
        }
        Ok(builder.finish())
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { doc: self, id: 0 }
    }

    pub fn find_all<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.root().find_all(tag)
    }
}

/// Universal newlines, and no script or style bodies to trip the tokenizer.
fn normalize_source(html: &str) -> String {
    let text = html.replace("\r\n", "\n").replace('\r', "\n");
    let text = SCRIPT_RE.replace_all(&text, "");
    let text = STYLE_RE.replace_all(&text, "");
    escape_stray_lt(&text)
}

/// A `<` that cannot open a tag, comment or declaration is prose
/// (`16' rank < 8' rank`). It goes through as `&lt;` and comes back out of
/// entity decoding as text.
fn escape_stray_lt(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let opens_markup = chars
            .peek()
            .is_some_and(|&n| n.is_ascii_alphabetic() || matches!(n, '/' | '!' | '?'));
        if c == '<' && !opens_markup {
            out.push_str("&lt;");
        } else {
            out.push(c);
        }
    }
    out
}

/// HTML5 named and numeric references, one at a time. Unknown references
/// and stray `&` are kept as written.
fn decode_entities(raw: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(raw, |caps: &Captures| {
        resolve_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    })
}

fn resolve_entity(entity: &str) -> Option<String> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    resolve_html5_entity(entity).map(str::to_string)
}

struct TreeBuilder {
    nodes: Vec<Node>,
    open: Vec<NodeId>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            nodes: vec![Node {
                data: NodeData::Document,
                parent: None,
                children: Vec::new(),
                index: 0,
            }],
            open: vec![0],
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(0)
    }

    fn append(&mut self, data: NodeData) -> NodeId {
        let parent = self.current();
        let id = self.nodes.len();
        let index = self.nodes[parent].children.len();
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
            index,
        });
        self.nodes[parent].children.push(id);
        id
    }

    fn open(&mut self, e: &BytesStart) {
        let data = element_data(e);
        let is_void = matches!(&data, NodeData::Element { name, .. } if VOID_ELEMENTS.contains(&name.as_str()));
        let id = self.append(data);
        if !is_void {
            self.open.push(id);
        }
    }

    fn leaf(&mut self, e: &BytesStart) {
        self.append(element_data(e));
    }

    fn close(&mut self, name: &str) {
        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        let found = self.open.iter().rposition(|&id| {
            id != 0 && matches!(&self.nodes[id].data, NodeData::Element { name: n, .. } if n == name)
        });
        if let Some(pos) = found {
            self.open.truncate(pos);
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(&last) = self.nodes[parent].children.last() {
            if let NodeData::Text(existing) = &mut self.nodes[last].data {
                existing.push_str(text);
                return;
            }
        }
        self.append(NodeData::Text(text.to_string()));
    }

    fn comment(&mut self, text: String) {
        self.append(NodeData::Comment(text));
    }

    fn finish(self) -> Document {
        Document { nodes: self.nodes }
    }
}

fn element_data(e: &BytesStart) -> NodeData {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
    let attrs = e
        .html_attributes()
        .flatten()
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).to_ascii_lowercase();
            let value = decode_entities(&String::from_utf8_lossy(&a.value)).into_owned();
            (key, value)
        })
        .collect();
    NodeData::Element { name, attrs }
}

/// Borrowed handle to one node of a [`Document`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.data() {
            NodeData::Document => write!(f, "#document"),
            NodeData::Element { name, .. } => write!(f, "<{}>#{}", name, self.id),
            NodeData::Text(t) => write!(f, "{:?}", t),
            NodeData::Comment(c) => write!(f, "<!--{}-->", c),
        }
    }
}

impl<'a> NodeRef<'a> {
    fn node(&self) -> &'a Node {
        &self.doc.nodes[self.id]
    }

    fn at(&self, id: NodeId) -> NodeRef<'a> {
        NodeRef { doc: self.doc, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn data(&self) -> &'a NodeData {
        &self.node().data
    }

    /// Tag name for elements, `None` for text, comments and the document.
    pub fn name(&self) -> Option<&'a str> {
        match self.data() {
            NodeData::Element { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is(&self, tag: &str) -> bool {
        self.name() == Some(tag)
    }

    pub fn attr(&self, key: &str) -> Option<&'a str> {
        match self.data() {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self.data() {
            NodeData::Text(t) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&'a str> {
        match self.data() {
            NodeData::Comment(c) => Some(c.as_str()),
            _ => None,
        }
    }

    /// Text or comment.
    pub fn is_string(&self) -> bool {
        matches!(self.data(), NodeData::Text(_) | NodeData::Comment(_))
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|id| self.at(id))
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        self.node()
            .children
            .iter()
            .map(move |&id| NodeRef { doc, id })
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.parent()?;
        parent
            .node()
            .children
            .get(self.node().index + 1)
            .map(|&id| self.at(id))
    }

    pub fn prev_sibling(&self) -> Option<NodeRef<'a>> {
        let parent = self.parent()?;
        let index = self.node().index.checked_sub(1)?;
        parent.node().children.get(index).map(|&id| self.at(id))
    }

    /// Following siblings in document order.
    pub fn following_siblings(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.next_sibling(), |n| n.next_sibling())
    }

    pub fn preceding_siblings(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        std::iter::successors(self.prev_sibling(), |n| n.prev_sibling())
    }

    /// The next sibling, stepping over text nodes that are a bare newline.
    pub fn next_element(&self) -> Option<NodeRef<'a>> {
        self.following_siblings().find(|n| n.as_text() != Some("\n"))
    }

    /// First following sibling element with the given tag.
    pub fn next_sibling_tag(&self, tag: &str) -> Option<NodeRef<'a>> {
        self.following_siblings().find(|n| n.is(tag))
    }

    /// All nodes below this one in document order, excluding itself.
    pub fn descendants(&self) -> Descendants<'a> {
        Descendants {
            doc: self.doc,
            stack: self.node().children.iter().rev().copied().collect(),
        }
    }

    pub fn find_all(self, tag: &'a str) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.descendants().filter(move |n| n.is(tag))
    }

    /// Text and comment descendants in document order.
    pub fn strings(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        self.descendants().filter(|n| n.is_string())
    }

    /// Concatenated text content, comments excluded.
    pub fn text(&self) -> String {
        if let Some(t) = self.as_text() {
            return t.to_string();
        }
        self.descendants().filter_map(|n| n.as_text()).collect()
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[id].children.iter().rev().copied());
        Some(NodeRef { doc: self.doc, id })
    }
}
