//! Attributed element tree
//!
//! A minimal, order-preserving model of a markup document: elements keep
//! their attributes and children in authored order, and comments, text,
//! CDATA and processing instructions survive untouched so that anything the
//! patcher does not address is written back as it was read.

use crate::path::{ElementPath, Selector};

/// A single attribute, in authored order
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    /// Attribute name (including any namespace prefix)
    pub name: String,
    /// Unescaped value
    pub value: String,
}

/// Child node of an element (or of the document prolog/epilog)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Nested element
    Element(Element),
    /// Character data (unescaped)
    Text(String),
    /// `<![CDATA[...]]>` section
    CData(String),
    /// `<!--...-->`
    Comment(String),
    /// `<?target data?>`
    ProcessingInstruction(String),
    /// `<!DOCTYPE ...>`
    DocType(String),
}

impl Node {
    /// Element view of this node
    #[inline]
    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Mutable element view of this node
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Is this a comment with exactly `text`?
    #[inline]
    #[must_use]
    pub fn is_comment(&self, text: &str) -> bool {
        matches!(self, Self::Comment(c) if c.trim() == text.trim())
    }
}

/// Element node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Tag name
    pub name: String,
    /// Attributes in authored order
    pub attributes: Vec<Attribute>,
    /// Children in authored order
    pub children: Vec<Node>,
    /// Start-tag text as read, between `<` and `>` (or `/>`)
    ///
    /// Writers reuse it while it still spells `name` and `attributes`, so
    /// quoting and spacing of untouched tags survive a round trip.
    pub source_tag: Option<String>,
    /// Read as `<x></x>`; written back that way while childless
    pub expanded_empty: bool,
}

impl Element {
    /// Create an element with no attributes or children
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: add an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Builder: set scalar text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Builder: append a child element
    #[must_use]
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    /// Attribute value by name
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }

    /// Set an attribute, keeping its position when it already exists
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|attr| attr.name == name) {
            Some(attr) => attr.value = value,
            None => self.attributes.push(Attribute {
                name: name.to_string(),
                value,
            }),
        }
    }

    /// Concatenated text and CDATA children, `None` when there are none
    #[must_use]
    pub fn text(&self) -> Option<String> {
        let mut out: Option<String> = None;
        for child in &self.children {
            if let Node::Text(t) | Node::CData(t) = child {
                out.get_or_insert_with(String::new).push_str(t);
            }
        }
        out
    }

    /// Replace all text/CDATA children with a single leading text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children
            .retain(|child| !matches!(child, Node::Text(_) | Node::CData(_)));
        let text = text.into();
        if !text.is_empty() {
            self.children.insert(0, Node::Text(text));
        }
    }

    /// Child elements in order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// First child element matching `selector`
    #[must_use]
    pub fn find(&self, selector: &Selector) -> Option<&Element> {
        self.elements().find(|child| selector.matches(child))
    }

    /// Append a child element
    #[inline]
    pub fn push_element(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// Remove every child
    #[inline]
    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Does a direct comment child carry `text`?
    #[must_use]
    pub fn has_comment(&self, text: &str) -> bool {
        self.children.iter().any(|child| child.is_comment(text))
    }

    /// Locate the first element reached by `path`, in document order
    ///
    /// Returns the child indices leading to it. Every branch matching a
    /// segment is explored before moving to the next sibling, so
    /// `drivers/driver/marker` finds a marker under the second driver when
    /// the first has none.
    #[must_use]
    pub fn locate(&self, path: &ElementPath) -> Option<Vec<usize>> {
        let mut trail = Vec::with_capacity(path.len());
        if self.locate_from(path.segments(), &mut trail) {
            Some(trail)
        } else {
            None
        }
    }

    fn locate_from(&self, segments: &[Selector], trail: &mut Vec<usize>) -> bool {
        let Some((head, rest)) = segments.split_first() else {
            return true;
        };
        for (idx, child) in self.children.iter().enumerate() {
            let Some(element) = child.as_element() else {
                continue;
            };
            if !head.matches(element) {
                continue;
            }
            trail.push(idx);
            if element.locate_from(rest, trail) {
                return true;
            }
            trail.pop();
        }
        false
    }

    /// First element reached by `path`
    #[must_use]
    pub fn find_path(&self, path: &ElementPath) -> Option<&Element> {
        let trail = self.locate(path)?;
        self.descend(&trail)
    }

    /// Follow child indices produced by [`Element::locate`]
    #[must_use]
    pub fn descend(&self, trail: &[usize]) -> Option<&Element> {
        let mut current = self;
        for &idx in trail {
            current = current.children.get(idx)?.as_element()?;
        }
        Some(current)
    }

    /// Mutable variant of [`Element::descend`]
    pub fn descend_mut(&mut self, trail: &[usize]) -> Option<&mut Element> {
        let mut current = self;
        for &idx in trail {
            current = current.children.get_mut(idx)?.as_element_mut()?;
        }
        Some(current)
    }
}

/// `<?xml ...?>` declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDeclaration {
    /// `version` pseudo-attribute
    pub version: String,
    /// `encoding` pseudo-attribute
    pub encoding: Option<String>,
    /// `standalone` pseudo-attribute
    pub standalone: Option<String>,
}

impl Default for XmlDeclaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: None,
            standalone: None,
        }
    }
}

/// A parsed markup document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    /// Declaration, if the source had one
    pub declaration: Option<XmlDeclaration>,
    /// Nodes between the declaration and the root element
    pub prolog: Vec<Node>,
    /// Document element
    pub root: Element,
    /// Nodes after the root element
    pub epilog: Vec<Node>,
}

impl XmlDocument {
    /// Document with only a root element
    #[inline]
    #[must_use]
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    /// Shortcut for `self.root.find_path(path)`
    #[inline]
    #[must_use]
    pub fn find(&self, path: &ElementPath) -> Option<&Element> {
        self.root.find_path(path)
    }

    /// Every element reached by `path`, in document order
    #[must_use]
    pub fn find_all(&self, path: &ElementPath) -> Vec<&Element> {
        let mut out = Vec::new();
        collect_all(&self.root, path.segments(), &mut out);
        out
    }
}

fn collect_all<'a>(element: &'a Element, segments: &[Selector], out: &mut Vec<&'a Element>) {
    let Some((head, rest)) = segments.split_first() else {
        out.push(element);
        return;
    };
    for child in element.elements().filter(|child| head.matches(child)) {
        collect_all(child, rest, out);
    }
}
