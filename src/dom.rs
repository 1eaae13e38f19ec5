//! Markup model – parses editor HTML into a small mutable element tree and
//! serializes it back.
//!
//! The parser is lenient and aimed at the markup rich-text editors emit:
//! - Any tag name is accepted; the common editor tags get their own [`Tag`]
//! - Void elements (`img`, `br`, `hr`, ...) never take children
//! - Attributes keep their source order so serialization is stable
//! - Comments, doctypes and processing instructions are skipped

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// The tag name of an element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Tag {
    Div,
    P,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Ul,
    Ol,
    Li,
    Blockquote,
    Pre,
    Table,
    Thead,
    Tbody,
    Tr,
    Td,
    Th,
    Span,
    Strong,
    B,
    Em,
    I,
    U,
    S,
    A,
    Code,
    Mark,
    Br,
    Hr,
    Img,
    Body,
    Html,
    Head,
    /// Any other element, kept under its lower-cased name.
    Other(String),
}

impl Tag {
    pub fn from_name(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "div" => Tag::Div,
            "p" => Tag::P,
            "h1" => Tag::H1,
            "h2" => Tag::H2,
            "h3" => Tag::H3,
            "h4" => Tag::H4,
            "h5" => Tag::H5,
            "h6" => Tag::H6,
            "ul" => Tag::Ul,
            "ol" => Tag::Ol,
            "li" => Tag::Li,
            "blockquote" => Tag::Blockquote,
            "pre" => Tag::Pre,
            "table" => Tag::Table,
            "thead" => Tag::Thead,
            "tbody" => Tag::Tbody,
            "tr" => Tag::Tr,
            "td" => Tag::Td,
            "th" => Tag::Th,
            "span" => Tag::Span,
            "strong" => Tag::Strong,
            "b" => Tag::B,
            "em" => Tag::Em,
            "i" => Tag::I,
            "u" => Tag::U,
            "s" => Tag::S,
            "a" => Tag::A,
            "code" => Tag::Code,
            "mark" => Tag::Mark,
            "br" => Tag::Br,
            "hr" => Tag::Hr,
            "img" => Tag::Img,
            "body" => Tag::Body,
            "html" => Tag::Html,
            "head" => Tag::Head,
            other => Tag::Other(other.to_string()),
        }
    }

    /// Lower-case tag name as written in markup.
    pub fn name(&self) -> &str {
        match self {
            Tag::Div => "div",
            Tag::P => "p",
            Tag::H1 => "h1",
            Tag::H2 => "h2",
            Tag::H3 => "h3",
            Tag::H4 => "h4",
            Tag::H5 => "h5",
            Tag::H6 => "h6",
            Tag::Ul => "ul",
            Tag::Ol => "ol",
            Tag::Li => "li",
            Tag::Blockquote => "blockquote",
            Tag::Pre => "pre",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Td => "td",
            Tag::Th => "th",
            Tag::Span => "span",
            Tag::Strong => "strong",
            Tag::B => "b",
            Tag::Em => "em",
            Tag::I => "i",
            Tag::U => "u",
            Tag::S => "s",
            Tag::A => "a",
            Tag::Code => "code",
            Tag::Mark => "mark",
            Tag::Br => "br",
            Tag::Hr => "hr",
            Tag::Img => "img",
            Tag::Body => "body",
            Tag::Html => "html",
            Tag::Head => "head",
            Tag::Other(name) => name.as_str(),
        }
    }

    /// Elements that never have children or a closing tag.
    pub fn is_void(&self) -> bool {
        match self {
            Tag::Br | Tag::Hr | Tag::Img => true,
            Tag::Other(name) => matches!(
                name.as_str(),
                "area" | "base" | "col" | "embed" | "input" | "link" | "meta" | "source" | "wbr"
            ),
            _ => false,
        }
    }

    /// Phrasing elements that flow inside a line of text.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Tag::Span
                | Tag::Strong
                | Tag::B
                | Tag::Em
                | Tag::I
                | Tag::U
                | Tag::S
                | Tag::A
                | Tag::Code
                | Tag::Mark
                | Tag::Br
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Tag::Ul | Tag::Ol)
    }

    pub fn heading_level(&self) -> Option<u8> {
        match self {
            Tag::H1 => Some(1),
            Tag::H2 => Some(2),
            Tag::H3 => Some(3),
            Tag::H4 => Some(4),
            Tag::H5 => Some(5),
            Tag::H6 => Some(6),
            _ => None,
        }
    }
}

/// A node in our DOM tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    Text(String),
}

impl DomNode {
    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            DomNode::Element(e) => Some(e),
            DomNode::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            DomNode::Text(t) => t.clone(),
            DomNode::Element(e) => e.text_content(),
        }
    }
}

/// An element node carrying tag, attributes (in source order) and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    pub tag: Tag,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<DomNode>,
}

impl ElementNode {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style constructor for elements with a class attribute.
    pub fn with_class(tag: Tag, class: &str) -> Self {
        let mut e = Self::new(tag);
        e.set_attr("class", class);
        e
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self
                .attributes
                .push((name.to_string(), value.to_string())),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.attr("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().contains(&class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let mut list: Vec<String> = self.classes().iter().map(|c| c.to_string()).collect();
        list.push(class.to_string());
        self.set_attr("class", &list.join(" "));
    }

    /// Remove a class. Returns `true` if it was present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        if !self.has_class(class) {
            return false;
        }
        let list: Vec<String> = self
            .classes()
            .iter()
            .filter(|c| **c != class)
            .map(|c| c.to_string())
            .collect();
        self.set_attr("class", &list.join(" "));
        true
    }

    pub fn inline_style(&self) -> Option<&str> {
        self.attr("style")
    }

    /// Value of one declaration in the `style` attribute.
    pub fn style_property(&self, prop: &str) -> Option<String> {
        self.inline_style().and_then(|s| {
            parse_declarations(s)
                .into_iter()
                .find(|(k, _)| k == prop)
                .map(|(_, v)| v)
        })
    }

    /// Set one declaration in the `style` attribute. An empty value removes
    /// the declaration.
    pub fn set_style_property(&mut self, prop: &str, value: &str) {
        let mut decls = self.inline_style().map(parse_declarations).unwrap_or_default();
        let existing = decls.iter().position(|(k, _)| k == prop);
        match (existing, value.trim().is_empty()) {
            (Some(i), true) => {
                decls.remove(i);
            }
            (Some(i), false) => decls[i].1 = value.trim().to_string(),
            (None, false) => decls.push((prop.to_string(), value.trim().to_string())),
            (None, true) => return,
        }
        let serialized = decls
            .iter()
            .map(|(k, v)| format!("{k}: {v};"))
            .collect::<Vec<_>>()
            .join(" ");
        self.set_attr("style", &serialized);
    }

    pub fn src(&self) -> Option<&str> {
        self.attr("src")
    }

    pub fn text_content(&self) -> String {
        self.children.iter().map(DomNode::text_content).collect()
    }

    /// Element children only, skipping text nodes.
    pub fn element_children(&self) -> impl Iterator<Item = &ElementNode> {
        self.children.iter().filter_map(DomNode::as_element)
    }
}

/// Split a CSS declaration block into `(property, value)` pairs.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, val) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            if prop.is_empty() {
                return None;
            }
            Some((prop, val.trim().to_string()))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Parser – simple recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML fragment into a list of DOM nodes.
///
/// Whitespace-only text runs that contain a line break are formatting and
/// are dropped; a bare space between two inline elements is kept.
///
/// A closing tag that matches no open element is dropped. Elements opened
/// deeper than [`MAX_DEPTH`] are kept empty and their content continues at
/// the deepest level.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes()
}

/// Deepest element nesting the parser builds.
pub const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    /// Names of the elements currently open, outermost first.
    open: Vec<String>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            open: Vec::new(),
        }
    }

    fn parse_nodes(&mut self) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.eof() {
            if self.starts_with("</") {
                // A closing tag for an open element ends this run; one that
                // closes nothing open is dropped.
                let name = self.peek_closing_name();
                if self.open.iter().any(|open| *open == name) {
                    break;
                }
                log::debug!("Dropping stray closing tag </{name}>");
                self.skip_closing_tag();
                continue;
            }
            if let Some(node) = self.parse_node() {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self) -> Option<DomNode> {
        if self.starts_with("<!--") {
            self.skip_comment();
            return None;
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            // Skip doctype / processing instructions
            while !self.eof() && !self.starts_with(">") {
                self.advance();
            }
            if !self.eof() {
                self.advance(); // skip '>'
            }
            return None;
        }
        if self.at_element_start() {
            Some(self.parse_element())
        } else {
            self.parse_text()
        }
    }

    fn parse_text(&mut self) -> Option<DomNode> {
        let start = self.pos;
        // Always consume at least one char so a lone '<' cannot stall us.
        self.advance();
        while !self.eof() && !self.at_markup() {
            self.advance();
        }
        let raw = &self.input[start..self.pos];
        if raw.trim().is_empty() && raw.contains('\n') {
            return None;
        }
        Some(DomNode::Text(decode_entities(raw)))
    }

    fn parse_element(&mut self) -> DomNode {
        self.advance(); // '<'
        let tag_name = self.parse_name();
        let tag = Tag::from_name(&tag_name);
        let mut elem = ElementNode::new(tag);

        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let (key, value) = self.parse_attribute();
            if key.is_empty() {
                // Unparseable byte inside the tag – skip it.
                self.advance();
                continue;
            }
            if elem.attr(&key).is_none() {
                elem.attributes.push((key, value));
            }
        }

        if self.starts_with("/>") {
            self.advance_by(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance();
        }
        if elem.tag.is_void() {
            return DomNode::Element(elem);
        }
        if self.open.len() >= MAX_DEPTH {
            log::debug!("Nesting deeper than {MAX_DEPTH}, flattening <{tag_name}>");
            return DomNode::Element(elem);
        }

        let own_name = elem.tag.name().to_string();
        self.open.push(own_name.clone());
        elem.children = self.parse_nodes();
        self.open.pop();

        // Consume our closing tag; a mismatched one is left for the ancestor
        // that owns it.
        if self.starts_with("</") && self.peek_closing_name() == own_name {
            self.skip_closing_tag();
        }

        DomNode::Element(elem)
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' {
                self.advance();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_ascii_lowercase()
    }

    fn parse_attribute(&mut self) -> (String, String) {
        let key = self.parse_name();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, String::new());
        }
        self.advance(); // '='
        self.skip_whitespace();
        let value = self.parse_attr_value();
        (key, value)
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance();
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance();
                }
                let val = decode_entities(&self.input[start..self.pos]);
                if !self.eof() {
                    self.advance();
                }
                return val;
            }
        }
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' {
                break;
            }
            if c == '/' && self.input[self.pos..].starts_with("/>") {
                break;
            }
            self.advance();
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn peek_closing_name(&self) -> String {
        let rest = &self.input[self.pos + 2..];
        rest.chars()
            .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_' || *c == ':')
            .collect::<String>()
            .to_ascii_lowercase()
    }

    fn skip_closing_tag(&mut self) {
        while !self.eof() && !self.starts_with(">") {
            self.advance();
        }
        if !self.eof() {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn skip_comment(&mut self) {
        self.advance_by(4); // <!--
        while !self.eof() && !self.starts_with("-->") {
            self.advance();
        }
        if !self.eof() {
            self.advance_by(3);
        }
    }

    /// `<` followed by a letter.
    fn at_element_start(&self) -> bool {
        let mut chars = self.input[self.pos..].chars();
        chars.next() == Some('<') && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// Anything that ends a text run: an element, a closing tag, a comment
    /// or a declaration.
    fn at_markup(&self) -> bool {
        self.at_element_start()
            || self.starts_with("</")
            || self.starts_with("<!")
            || self.starts_with("<?")
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(c) = self.input[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }
}

/// Decode named and numeric character references.
fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest[1..].find(';').filter(|&end| end <= 10).and_then(|end| {
            let entity = &rest[1..1 + end];
            decode_entity(entity).map(|c| (c, end + 2))
        });
        match decoded {
            Some((c, consumed)) => {
                out.push(c);
                rest = &rest[consumed..];
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

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(num) = entity.strip_prefix('#') {
        let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "copy" => '\u{00A9}',
        "reg" => '\u{00AE}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "bull" => '\u{2022}',
        _ => return None,
    })
}

// ---------------------------------------------------------------------------
// Serializer
// ---------------------------------------------------------------------------

/// Serialize nodes back to markup.
pub fn to_html(nodes: &[DomNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        write_node(&mut out, node);
    }
    out
}

/// Serialize a single element including its own tag.
pub fn element_to_html(element: &ElementNode) -> String {
    let mut out = String::new();
    write_element(&mut out, element);
    out
}

/// Serialize only the children of an element (its "inner HTML").
pub fn inner_html(element: &ElementNode) -> String {
    to_html(&element.children)
}

fn write_node(out: &mut String, node: &DomNode) {
    match node {
        DomNode::Text(t) => escape_into(out, t, false),
        DomNode::Element(e) => write_element(out, e),
    }
}

fn write_element(out: &mut String, e: &ElementNode) {
    out.push('<');
    out.push_str(e.tag.name());
    for (k, v) in &e.attributes {
        out.push(' ');
        out.push_str(k);
        out.push_str("=\"");
        escape_into(out, v, true);
        out.push('"');
    }
    out.push('>');
    if e.tag.is_void() {
        return;
    }
    for child in &e.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(e.tag.name());
    out.push('>');
}

fn escape_into(out: &mut String, s: &str, attribute: bool) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

// ---------------------------------------------------------------------------
// Tree queries
// ---------------------------------------------------------------------------

/// Child-index path from a root element to a descendant (empty = the root).
pub type NodePath = Vec<usize>;

/// Pre-order paths of every element (root included) matching `pred`.
pub fn find_paths<F>(root: &ElementNode, pred: F) -> Vec<NodePath>
where
    F: Fn(&ElementNode) -> bool,
{
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_paths(root, &pred, &mut path, &mut out);
    out
}

fn collect_paths<F>(node: &ElementNode, pred: &F, path: &mut NodePath, out: &mut Vec<NodePath>)
where
    F: Fn(&ElementNode) -> bool,
{
    if pred(node) {
        out.push(path.clone());
    }
    for (i, child) in node.children.iter().enumerate() {
        if let DomNode::Element(e) = child {
            path.push(i);
            collect_paths(e, pred, path, out);
            path.pop();
        }
    }
}

pub fn find_by_class(root: &ElementNode, class: &str) -> Vec<NodePath> {
    find_paths(root, |e| e.has_class(class))
}

pub fn find_by_attr(root: &ElementNode, name: &str, value: &str) -> Vec<NodePath> {
    find_paths(root, |e| e.attr(name) == Some(value))
}

pub fn element_at<'a>(root: &'a ElementNode, path: &[usize]) -> Option<&'a ElementNode> {
    let mut node = root;
    for &i in path {
        node = node.children.get(i)?.as_element()?;
    }
    Some(node)
}

pub fn element_at_mut<'a>(root: &'a mut ElementNode, path: &[usize]) -> Option<&'a mut ElementNode> {
    let mut node = root;
    for &i in path {
        node = node.children.get_mut(i)?.as_element_mut()?;
    }
    Some(node)
}

// ---------------------------------------------------------------------------
// Convenience helpers
// ---------------------------------------------------------------------------

/// Find the `<body>` element and return its children, or return all nodes if
/// no `<body>` is present.
pub fn body_children(nodes: &[DomNode]) -> Vec<DomNode> {
    for node in nodes {
        if let DomNode::Element(e) = node {
            if e.tag == Tag::Body {
                return e.children.clone();
            }
            if e.tag == Tag::Html {
                let inner = body_children(&e.children);
                if !inner.is_empty() {
                    return inner;
                }
            }
        }
    }
    nodes
        .iter()
        .filter(|n| !matches!(n, DomNode::Element(e) if e.tag == Tag::Head))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_div() {
        let html = r#"<div class="ql-editor p-8"><p>Hello</p></div>"#;
        let nodes = parse_html(html);
        assert_eq!(nodes.len(), 1);
        if let DomNode::Element(e) = &nodes[0] {
            assert_eq!(e.tag, Tag::Div);
            assert_eq!(e.classes(), vec!["ql-editor", "p-8"]);
            assert_eq!(e.children.len(), 1);
        } else {
            panic!("Expected element");
        }
    }

    #[test]
    fn parse_void_elements() {
        let nodes = parse_html(r#"<p>a<br>b</p><img src="logo.png"><hr/>"#);
        assert_eq!(nodes.len(), 3);
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.children.len(), 3);
        assert_eq!(nodes[1].as_element().unwrap().src(), Some("logo.png"));
        assert_eq!(nodes[2].as_element().unwrap().tag, Tag::Hr);
    }

    #[test]
    fn keeps_space_between_inline_elements() {
        let nodes = parse_html("<p><strong>a</strong> <em>b</em></p>");
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.children.len(), 3);
        assert_eq!(p.text_content(), "a b");
    }

    #[test]
    fn drops_formatting_whitespace() {
        let nodes = parse_html("<p>one</p>\n  <p>two</p>\n");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse_html("<p>1 < 2</p>");
        assert_eq!(nodes[0].text_content(), "1 < 2");
    }

    #[test]
    fn mismatched_closing_tag_is_left_to_ancestor() {
        let nodes = parse_html("<div><p>open</div><p>after</p>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].text_content(), "after");
    }

    #[test]
    fn stray_inline_closing_tag_keeps_paragraph_open() {
        let nodes = parse_html("<p>Hello <b>bold</i> tail</b> more</p><p>next</p>");
        assert_eq!(nodes.len(), 2);
        let p = nodes[0].as_element().unwrap();
        assert_eq!(p.text_content(), "Hello bold tail more");
        assert_eq!(p.children[1].text_content(), "bold tail");
        assert_eq!(nodes[1].text_content(), "next");
    }

    #[test]
    fn deep_nesting_is_capped() {
        fn depth(nodes: &[DomNode]) -> usize {
            nodes
                .iter()
                .filter_map(DomNode::as_element)
                .map(|e| 1 + depth(&e.children))
                .max()
                .unwrap_or(0)
        }
        let html = "<div>".repeat(5_000) + "deep" + &"</div>".repeat(5_000);
        let nodes = parse_html(&html);
        assert_eq!(depth(&nodes), MAX_DEPTH + 1);
        let text: String = nodes.iter().map(DomNode::text_content).collect();
        assert_eq!(text, "deep");
    }

    #[test]
    fn decodes_entities() {
        let nodes = parse_html("<p>&lt;a&gt; &amp; &#65;&#x42; &unknown; &nbsp;</p>");
        assert_eq!(nodes[0].text_content(), "<a> & AB &unknown; \u{00A0}");
    }

    #[test]
    fn serializes_normalized_markup() {
        let html = r#"<p class='x' data-k=v>Tom &amp; "Jerry"</p><img src="a.png"/>"#;
        let out = to_html(&parse_html(html));
        assert_eq!(
            out,
            r#"<p class="x" data-k="v">Tom &amp; "Jerry"</p><img src="a.png">"#
        );
        assert_eq!(to_html(&parse_html(&out)), out);
    }

    #[test]
    fn class_helpers() {
        let mut e = ElementNode::with_class(Tag::Div, "a preview-highlight b");
        assert!(e.remove_class("preview-highlight"));
        assert!(!e.remove_class("preview-highlight"));
        assert_eq!(e.attr("class"), Some("a b"));
        e.add_class("pdf-preview");
        e.add_class("pdf-preview");
        assert_eq!(e.attr("class"), Some("a b pdf-preview"));
    }

    #[test]
    fn style_property_helpers() {
        let mut e = ElementNode::new(Tag::Div);
        e.set_attr("style", "column-count: 2; color: #333");
        assert_eq!(e.style_property("column-count").as_deref(), Some("2"));
        e.set_style_property("column-count", "");
        e.set_style_property("column-gap", "12px");
        assert_eq!(e.inline_style(), Some("color: #333; column-gap: 12px;"));
    }

    #[test]
    fn paths_resolve_back_to_elements() {
        let nodes = parse_html(r#"<div><p>x</p><ul><li class="hit">y</li></ul></div>"#);
        let root = nodes[0].as_element().unwrap().clone();
        let paths = find_by_class(&root, "hit");
        assert_eq!(paths, vec![vec![1, 0]]);
        assert_eq!(element_at(&root, &paths[0]).unwrap().text_content(), "y");
    }
}
