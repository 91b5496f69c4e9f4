//! HTML parser – converts an HTML fragment into a simple DOM tree.
//!
//! The parser is lenient in the way table markup found in the wild needs:
//! - implied end tags (`<td>` closes an open `<td>`, `<tr>` closes an open row)
//! - unmatched close tags are ignored
//! - `<script>`, `<style>` and `<title>` content is skipped entirely
//! - comments, doctypes and processing instructions are dropped
//!
//! It never fails; whether a usable `<table>` exists is decided later by
//! [`crate::grid`].

use std::collections::HashMap;

/// Largest `colspan` honoured; larger values are clamped, as browsers do.
pub const MAX_COLSPAN: usize = 1000;

/// Deepest element nesting kept in the tree. Tags opened below this depth
/// are dropped while their text is kept, so later tree walks stay shallow.
pub const MAX_DEPTH: usize = 256;

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Table,
    Thead,
    Tbody,
    Tfoot,
    Tr,
    Td,
    Th,
    B,
    Strong,
    I,
    Em,
    Br,
    Script,
    Style,
    Title,
    Html,
    Head,
    Body,
    /// Catch-all for other tags – kept in the tree, flattened to text.
    Unknown(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tfoot" => Tag::Tfoot,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "b" => Tag::B,
            "strong" => Tag::Strong,
            "i" => Tag::I,
            "em" => Tag::Em,
            "br" => Tag::Br,
            "script" => Tag::Script,
            "style" => Tag::Style,
            "title" => Tag::Title,
            "html" => Tag::Html,
            "head" => Tag::Head,
            "body" => Tag::Body,
            other => Tag::Unknown(other.to_string()),
        }
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(&self) -> bool {
        match self {
            Tag::Br => true,
            Tag::Unknown(name) => matches!(
                name.as_str(),
                "img" | "hr" | "meta" | "link" | "input" | "col" | "wbr" | "area" | "base"
                    | "source"
            ),
            _ => false,
        }
    }

    /// Elements whose content is not rendered at all.
    pub fn is_skipped(&self) -> bool {
        matches!(self, Tag::Script | Tag::Style | Tag::Title)
    }

    /// Inline elements flow into the surrounding text without a separator.
    pub fn is_inline(&self) -> bool {
        match self {
            Tag::B | Tag::Strong | Tag::I | Tag::Em => true,
            Tag::Unknown(name) => matches!(
                name.as_str(),
                "span" | "a" | "u" | "small" | "sub" | "sup" | "code" | "font" | "abbr"
                    | "mark" | "label" | "s" | "del" | "ins"
            ),
            _ => false,
        }
    }

    pub fn is_cell(&self) -> bool {
        matches!(self, Tag::Td | Tag::Th)
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: HashMap<String, String>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: HashMap::new(),
            children: Vec::new(),
        }
    }

    /// `colspan` attribute, defaulting to 1 for absent or unusable values
    /// and clamped to [`MAX_COLSPAN`].
    pub fn colspan(&self) -> usize {
        self.attributes
            .get("colspan")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|n| *n > 0)
            .map_or(1, |n| n.min(MAX_COLSPAN as u64) as usize)
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(|c| match c {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tree builder – a stack of open elements with table-aware implied closes
// ---------------------------------------------------------------------------

#[derive(Default)]
struct TreeBuilder {
    root: Vec<DomNode>,
    open: Vec<ElementNode>,
}

impl TreeBuilder {
    fn append(&mut self, node: DomNode) {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root.push(node),
        }
    }

    fn pop(&mut self) {
        if let Some(elem) = self.open.pop() {
            self.append(DomNode::Element(elem));
        }
    }

    /// Close the innermost open element matching `targets`, unless one of
    /// `boundaries` is reached first. Returns whether anything was closed.
    fn close_until(&mut self, targets: &[Tag], boundaries: &[Tag]) -> bool {
        let found = self
            .open
            .iter()
            .rposition(|e| targets.contains(&e.tag) || boundaries.contains(&e.tag))
            .filter(|&i| targets.contains(&self.open[i].tag));
        match found {
            Some(index) => {
                while self.open.len() > index {
                    self.pop();
                }
                true
            }
            None => false,
        }
    }

    fn open_element(&mut self, elem: ElementNode) {
        match elem.tag {
            Tag::Td | Tag::Th => {
                self.close_until(&[Tag::Td, Tag::Th], &[Tag::Tr, Tag::Table]);
            }
            Tag::Tr => {
                self.close_until(&[Tag::Tr], &[Tag::Table]);
            }
            Tag::Thead | Tag::Tbody | Tag::Tfoot => {
                self.close_until(&[Tag::Thead, Tag::Tbody, Tag::Tfoot], &[Tag::Table]);
            }
            _ => {}
        }

        if elem.tag.is_void() {
            self.append(DomNode::Element(elem));
        } else if self.open.len() >= MAX_DEPTH {
            log::debug!("dropping <{:?}> nested deeper than {MAX_DEPTH}", elem.tag);
        } else {
            self.open.push(elem);
        }
    }

    fn close_element(&mut self, tag: &Tag) {
        // A stray close tag must not reach past the table it appears in.
        let boundaries: &[Tag] = if *tag == Tag::Table { &[] } else { &[Tag::Table] };
        if !self.close_until(std::slice::from_ref(tag), boundaries) {
            log::debug!("ignoring unmatched </{tag:?}>");
        }
    }

    fn text(&mut self, text: String) {
        if !text.is_empty() {
            self.append(DomNode::Text(text));
        }
    }

    fn finish(mut self) -> Vec<DomNode> {
        while !self.open.is_empty() {
            self.pop();
        }
        self.root
    }
}

// ---------------------------------------------------------------------------
// Parser – a single forward scan over the input
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of DOM nodes.
///
/// We use a hand-written parser that handles the table subset. Anything it
/// does not understand is either kept as an [`Tag::Unknown`] element or
/// treated as text.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    let mut builder = TreeBuilder::default();
    parser.run(&mut builder);
    builder.finish()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn run(&mut self, builder: &mut TreeBuilder) {
        while !self.eof() {
            if self.starts_with("<!--") {
                self.skip_comment();
            } else if self.starts_with("<!") || self.starts_with("<?") {
                self.skip_declaration();
            } else if self.starts_with("</") && self.peek_nth(2).is_some_and(|c| c.is_ascii_alphabetic()) {
                let tag = self.parse_close_tag();
                builder.close_element(&tag);
            } else if self.starts_with("<") && self.peek_nth(1).is_some_and(|c| c.is_ascii_alphabetic()) {
                self.parse_open_tag(builder);
            } else {
                let text = self.parse_text();
                builder.text(text);
            }
        }
    }

    fn parse_text(&mut self) -> String {
        let start = self.pos;
        // A lone '<' that does not open a tag is ordinary text.
        self.advance(1);
        while !self.eof() && !self.at_markup() {
            self.advance(1);
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn at_markup(&self) -> bool {
        if !self.starts_with("<") {
            return false;
        }
        match self.peek_nth(1) {
            Some('!') | Some('?') => true,
            Some('/') => self.peek_nth(2).is_some_and(|c| c.is_ascii_alphabetic()),
            Some(c) => c.is_ascii_alphabetic(),
            None => false,
        }
    }

    fn parse_open_tag(&mut self, builder: &mut TreeBuilder) {
        self.advance(1); // skip '<'
        let tag = Tag::from_name(&self.parse_name());
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            match self.parse_attribute() {
                Some((key, value)) => {
                    elem.attributes.insert(key, value);
                }
                // Junk inside the tag: step over it.
                None => self.advance(1),
            }
        }

        if self.starts_with("/>") {
            self.advance(2);
        } else if self.starts_with(">") {
            self.advance(1);
        }

        if elem.tag.is_skipped() {
            self.skip_raw_text(&elem.tag);
            return;
        }
        builder.open_element(elem);
    }

    fn parse_close_tag(&mut self) -> Tag {
        self.advance(2); // skip '</'
        let tag = Tag::from_name(&self.parse_name());
        while !self.eof() && !self.starts_with(">") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(1);
        }
        tag
    }

    /// Skip everything up to and including the close tag of a raw-text element.
    fn skip_raw_text(&mut self, tag: &Tag) {
        let name = match tag {
            Tag::Script => "script",
            Tag::Style => "style",
            Tag::Title => "title",
            _ => return,
        };
        let closing = format!("</{name}");
        while !self.eof() && !self.starts_with_ignore_case(&closing) {
            self.advance(1);
        }
        if !self.eof() {
            self.parse_close_tag();
        }
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn parse_attribute(&mut self) -> Option<(String, String)> {
        let key = self.parse_name();
        if key.is_empty() {
            return None;
        }
        self.skip_whitespace();
        if !self.starts_with("=") {
            return Some((key, String::new()));
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        Some((key, value))
    }

    fn parse_attr_value(&mut self) -> String {
        if let Some(quote) = self.peek().filter(|c| *c == '"' || *c == '\'') {
            self.advance(1);
            let start = self.pos;
            while self.peek().is_some_and(|c| c != quote) {
                self.advance(1);
            }
            let val = decode_entities(&self.input[start..self.pos]);
            if !self.eof() {
                self.advance(1);
            }
            val
        } else {
            let start = self.pos;
            while let Some(c) = self.peek() {
                if c.is_whitespace() || c == '>' {
                    break;
                }
                if c == '/' && self.starts_with("/>") {
                    break;
                }
                self.advance(1);
            }
            decode_entities(&self.input[start..self.pos])
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance(1);
        }
    }

    fn skip_comment(&mut self) {
        self.advance(4); // skip <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(3);
        }
    }

    fn skip_declaration(&mut self) {
        while !self.eof() && !self.starts_with(">") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn starts_with_ignore_case(&self, s: &str) -> bool {
        self.input
            .get(self.pos..self.pos + s.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(s))
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

/// Decode the named entities table markup commonly carries, plus numeric
/// character references. Unknown entities are left as written.
pub fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_element(nodes: &[DomNode]) -> &ElementNode {
        let elems: Vec<&ElementNode> = nodes
            .iter()
            .filter_map(|n| match n {
                DomNode::Element(e) => Some(e),
                DomNode::Text(_) => None,
            })
            .collect();
        assert_eq!(elems.len(), 1, "expected one element, got {nodes:?}");
        elems[0]
    }

    #[test]
    fn parse_table() {
        let html = r#"<table><tr><th>Name</th><th>Age</th></tr><tr><td>Alice</td><td>30</td></tr></table>"#;
        let nodes = parse_html(html);
        let table = only_element(&nodes);
        assert_eq!(table.tag, Tag::Table);
        assert_eq!(table.child_elements().count(), 2); // 2 rows
    }

    #[test]
    fn implied_cell_and_row_ends() {
        let html = "<table><tr><td>a<td>b<tr><td>c</table>";
        let nodes = parse_html(html);
        let table = only_element(&nodes);
        let rows: Vec<&ElementNode> = table.child_elements().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].child_elements().count(), 2);
        assert_eq!(rows[1].child_elements().count(), 1);
    }

    #[test]
    fn stray_close_tags_are_ignored() {
        let html = "<table><tr><td>a</span></td></tr></div></table>";
        let nodes = parse_html(html);
        let table = only_element(&nodes);
        let row = table.child_elements().next().unwrap();
        assert_eq!(row.child_elements().count(), 1);
    }

    #[test]
    fn script_and_style_content_is_skipped() {
        let html = "<style>td { color: red }</style><script>if (a < b) {}</script><table></table>";
        let nodes = parse_html(html);
        let table = only_element(&nodes);
        assert_eq!(table.tag, Tag::Table);
    }

    #[test]
    fn comments_and_doctype_are_dropped() {
        let nodes = parse_html("<!DOCTYPE html><!-- <table> --><p>x</p>");
        let p = only_element(&nodes);
        assert_eq!(p.tag, Tag::Unknown("p".into()));
    }

    #[test]
    fn attributes_and_colspan() {
        let nodes = parse_html(r#"<td colspan="3" class='x' nowrap>v</td>"#);
        let td = only_element(&nodes);
        assert_eq!(td.colspan(), 3);
        assert_eq!(td.attributes.get("class").map(String::as_str), Some("x"));
        assert!(td.attributes.contains_key("nowrap"));
    }

    #[test]
    fn colspan_is_clamped() {
        let nodes = parse_html(r#"<td colspan="3000000">v</td><td colspan="99999999999999999999">w</td>"#);
        for node in &nodes {
            if let DomNode::Element(td) = node {
                assert!(td.colspan() <= MAX_COLSPAN);
            }
        }
        let DomNode::Element(first) = &nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(first.colspan(), MAX_COLSPAN);
    }

    fn depth(nodes: &[DomNode]) -> usize {
        nodes
            .iter()
            .map(|n| match n {
                DomNode::Element(e) => 1 + depth(&e.children),
                DomNode::Text(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }

    #[test]
    fn nesting_depth_is_capped() {
        let html = format!("<table><tr><td>{}x</td></tr></table>", "<b>".repeat(5000));
        let nodes = parse_html(&html);
        assert!(depth(&nodes) <= MAX_DEPTH);

        let mut texts = Vec::new();
        fn collect<'a>(nodes: &'a [DomNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                match node {
                    DomNode::Element(e) => collect(&e.children, out),
                    DomNode::Text(t) => out.push(t),
                }
            }
        }
        collect(&nodes, &mut texts);
        assert_eq!(texts, ["x"]);
    }

    #[test]
    fn colspan_falls_back_to_one() {
        let nodes = parse_html(r#"<td colspan="zero">v</td>"#);
        assert_eq!(only_element(&nodes).colspan(), 1);
    }

    #[test]
    fn less_than_in_text_is_kept() {
        let nodes = parse_html("<td>1 < 2</td>");
        let td = only_element(&nodes);
        match &td.children[0] {
            DomNode::Text(t) => assert_eq!(t, "1 < 2"),
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn entities_are_decoded_once() {
        assert_eq!(decode_entities("a &amp;lt; b"), "a &lt; b");
        assert_eq!(decode_entities("&#65;&#x42;&quot;"), "AB\"");
        assert_eq!(decode_entities("AT&T R&D;"), "AT&T R&D;");
    }
}
