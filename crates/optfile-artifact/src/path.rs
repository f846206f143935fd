//! Element paths for addressing nodes inside a markup tree
//!
//! An [`ElementPath`] is a sequence of [`Selector`]s evaluated from the
//! document root (the root element itself is not part of the path). Each
//! selector names a child tag and optionally constrains attributes.
//!
//! The textual form follows a tiny XPath subset:
//!
//! - `global/parameter[@name='LCIOInputFiles']`
//! - `drivers/driver[@type='org.lcsim.util.OverlayDriver']/overlayFiles`
//! - `processor[@name~='overlaytiming']` (case-insensitive substring)

use crate::tree::Element;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How an attribute value is compared
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrMatch {
    /// Exact string equality
    Equals(String),
    /// Case-insensitive substring
    ContainsIgnoreCase(String),
}

impl AttrMatch {
    /// Check a concrete attribute value
    #[must_use]
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::ContainsIgnoreCase(needle) => {
                value.to_lowercase().contains(&needle.to_lowercase())
            }
        }
    }
}

/// Attribute constraint of a selector
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttrCondition {
    /// Attribute name
    pub name: String,
    /// Comparison
    pub matcher: AttrMatch,
}

/// One step of an [`ElementPath`]
///
/// Matching uses `tag` and `conditions`. When the patcher has to synthesize a
/// missing element, the new element gets the tag, every `Equals` condition as
/// an attribute, and then `create_attributes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selector {
    tag: String,
    conditions: Vec<AttrCondition>,
    create_attributes: Vec<(String, String)>,
}

impl Selector {
    /// Selector matching any child with the given tag
    #[inline]
    #[must_use]
    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            conditions: Vec::new(),
            create_attributes: Vec::new(),
        }
    }

    /// Require `name == value`
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(AttrCondition {
            name: name.into(),
            matcher: AttrMatch::Equals(value.into()),
        });
        self
    }

    /// Require `name` to contain `needle`, ignoring case
    #[must_use]
    pub fn with_attr_containing(
        mut self,
        name: impl Into<String>,
        needle: impl Into<String>,
    ) -> Self {
        self.conditions.push(AttrCondition {
            name: name.into(),
            matcher: AttrMatch::ContainsIgnoreCase(needle.into()),
        });
        self
    }

    /// Extra attribute set only on synthesized elements
    #[must_use]
    pub fn creating_with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.create_attributes.push((name.into(), value.into()));
        self
    }

    /// Tag name
    #[inline]
    #[must_use]
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Attribute constraints
    #[inline]
    #[must_use]
    pub fn conditions(&self) -> &[AttrCondition] {
        &self.conditions
    }

    /// Does `element` satisfy this selector?
    #[must_use]
    pub fn matches(&self, element: &Element) -> bool {
        element.name == self.tag
            && self.conditions.iter().all(|cond| {
                element
                    .attribute(&cond.name)
                    .is_some_and(|value| cond.matcher.matches(value))
            })
    }

    /// Build the element that would satisfy this selector
    ///
    /// # Errors
    /// Returns [`PathError::NotSynthesizable`] when a condition is not an
    /// exact match, since no concrete attribute value can be derived from it.
    pub fn synthesize(&self) -> Result<Element, PathError> {
        let mut element = Element::new(self.tag.clone());
        for cond in &self.conditions {
            match &cond.matcher {
                AttrMatch::Equals(value) => element.set_attribute(&cond.name, value.clone()),
                AttrMatch::ContainsIgnoreCase(_) => {
                    return Err(PathError::NotSynthesizable(self.to_string()));
                }
            }
        }
        for (name, value) in &self.create_attributes {
            element.set_attribute(name, value.clone());
        }
        Ok(element)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        for cond in &self.conditions {
            match &cond.matcher {
                AttrMatch::Equals(value) => write!(f, "[@{}='{}']", cond.name, value)?,
                AttrMatch::ContainsIgnoreCase(value) => {
                    write!(f, "[@{}~='{}']", cond.name, value)?;
                }
            }
        }
        Ok(())
    }
}

impl FromStr for Selector {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (tag, mut rest) = match s.find('[') {
            Some(idx) => (&s[..idx], &s[idx..]),
            None => (s, ""),
        };
        if tag.is_empty() {
            return Err(PathError::EmptySegment);
        }
        let mut selector = Self::tag(tag);
        while !rest.is_empty() {
            let body = rest
                .strip_prefix("[@")
                .ok_or_else(|| PathError::InvalidSegment(s.to_string()))?;
            let close = body
                .find(']')
                .ok_or_else(|| PathError::InvalidSegment(s.to_string()))?;
            let condition = &body[..close];
            rest = &body[close + 1..];

            let (name, value, contains) = if let Some((name, value)) = condition.split_once("~=") {
                (name, value, true)
            } else if let Some((name, value)) = condition.split_once('=') {
                (name, value, false)
            } else {
                return Err(PathError::InvalidSegment(s.to_string()));
            };
            let value = unquote(value);
            selector = if contains {
                selector.with_attr_containing(name, value)
            } else {
                selector.with_attr(name, value)
            };
        }
        Ok(selector)
    }
}

fn unquote(value: &str) -> &str {
    let trimmed = value.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    trimmed
}

/// Path of selectors below the document root
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ElementPath(Vec<Selector>);

impl ElementPath {
    /// Create new path from selectors
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<Selector>) -> Self {
        Self(segments)
    }

    /// Empty path (the root element itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Parse a path literal
    ///
    /// # Errors
    /// Returns error on malformed selectors
    pub fn parse(s: &str) -> Result<Self, PathError> {
        s.parse()
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[Selector] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if path is empty (root)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get parent path (if not root)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// First `len` segments
    #[inline]
    #[must_use]
    pub fn prefix(&self, len: usize) -> Self {
        Self(self.0[..len.min(self.0.len())].to_vec())
    }
}

impl Display for ElementPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, ".");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for ElementPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || s == "." {
            return Ok(Self::root());
        }

        // Split on '/' outside of brackets; attribute values may hold anything else.
        let mut segments = Vec::new();
        let mut depth = 0usize;
        let mut start = 0usize;
        for (idx, ch) in s.char_indices() {
            match ch {
                '[' => depth += 1,
                ']' => depth = depth.saturating_sub(1),
                '/' if depth == 0 => {
                    segments.push(s[start..idx].parse::<Selector>()?);
                    start = idx + 1;
                }
                _ => {}
            }
        }
        segments.push(s[start..].parse::<Selector>()?);
        Ok(Self(segments))
    }
}

impl From<Selector> for ElementPath {
    fn from(selector: Selector) -> Self {
        Self(vec![selector])
    }
}

/// Errors related to element paths
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("path contains empty segment")]
    EmptySegment,

    /// Malformed selector
    #[error("invalid selector: {0}")]
    InvalidSegment(String),

    /// Selector cannot produce a concrete element
    #[error("cannot synthesize an element for selector {0}")]
    NotSynthesizable(String),
}
