//! Line-Template Rewriter
//!
//! Evaluates a table of [`LineRule`]s against every line of a
//! [`LineDocument`]. The first enabled rule whose marker matches decides what
//! happens to the line: it is replaced, rendered from a parameter, dropped,
//! or passed through while raising a named flag. Lines no rule matches are
//! copied verbatim. Optional header lines are written before the body and
//! trailer lines after it, unconditionally.

use crate::error::PatchError;
use optfile_artifact::{line_content, LineDocument};
use std::collections::{BTreeMap, HashMap};

/// Read-only access to run parameters by key
pub trait ParameterLookup {
    /// Rendered value of `key`, if supplied
    fn lookup(&self, key: &str) -> Option<String>;

    /// Supplied and not empty, `0` or `false`
    fn is_truthy(&self, key: &str) -> bool {
        self.lookup(key).is_some_and(|value| {
            let value = value.trim();
            !(value.is_empty() || value == "0" || value.eq_ignore_ascii_case("false"))
        })
    }
}

impl ParameterLookup for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ParameterLookup for HashMap<String, String> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// How a marker is compared with a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerMatch {
    /// Marker occurs anywhere in the line
    #[default]
    Substring,
    /// Line, trimmed, equals the marker
    Exact,
}

/// Whether a rule takes part in matching
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Guard {
    /// Rule always participates
    #[default]
    Always,
    /// Rule never participates
    Never,
    /// Rule participates when the parameter is truthy
    Truthy(String),
}

/// Condition for raising a flag on a passed-through line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlagCheck {
    /// Any matching line raises the flag
    #[default]
    Always,
    /// The text between the first pair of double quotes is not empty
    QuotedValueNonEmpty,
}

impl FlagCheck {
    fn holds(self, line: &str) -> bool {
        match self {
            Self::Always => true,
            Self::QuotedValueNonEmpty => line.split('"').nth(1).is_some_and(|v| !v.is_empty()),
        }
    }
}

/// What happens to a matched line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineAction {
    /// Emit this line instead
    Replace(String),
    /// Emit `template` with `{}` replaced by the value of `param`
    Render {
        /// Parameter key
        param: String,
        /// Line template
        template: String,
    },
    /// Omit the line
    Drop,
    /// Keep the line and raise `flag` when `check` holds
    Flag {
        /// Flag name
        flag: String,
        /// Raising condition
        check: FlagCheck,
    },
}

/// One row of a rewriter table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRule {
    marker: String,
    matching: MarkerMatch,
    guard: Guard,
    action: LineAction,
}

impl LineRule {
    /// Rule matching `marker` as a substring
    #[must_use]
    pub fn new(marker: impl Into<String>, action: LineAction) -> Self {
        Self {
            marker: marker.into(),
            matching: MarkerMatch::Substring,
            guard: Guard::Always,
            action,
        }
    }

    /// Replace matching lines with `line`
    #[must_use]
    pub fn replace(marker: impl Into<String>, line: impl Into<String>) -> Self {
        Self::new(marker, LineAction::Replace(line.into()))
    }

    /// Render matching lines from a parameter
    #[must_use]
    pub fn render(
        marker: impl Into<String>,
        param: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self::new(
            marker,
            LineAction::Render {
                param: param.into(),
                template: template.into(),
            },
        )
    }

    /// Drop matching lines
    #[must_use]
    pub fn drop_line(marker: impl Into<String>) -> Self {
        Self::new(marker, LineAction::Drop)
    }

    /// Keep matching lines, raising `flag`
    #[must_use]
    pub fn flag(marker: impl Into<String>, flag: impl Into<String>, check: FlagCheck) -> Self {
        Self::new(
            marker,
            LineAction::Flag {
                flag: flag.into(),
                check,
            },
        )
    }

    /// Match the whole trimmed line instead of a substring
    #[inline]
    #[must_use]
    pub fn exact(mut self) -> Self {
        self.matching = MarkerMatch::Exact;
        self
    }

    /// Enable the rule only when `enabled` is true
    #[inline]
    #[must_use]
    pub fn when(mut self, enabled: bool) -> Self {
        self.guard = if enabled { Guard::Always } else { Guard::Never };
        self
    }

    /// Enable the rule only when `param` is truthy
    #[inline]
    #[must_use]
    pub fn when_truthy(mut self, param: impl Into<String>) -> Self {
        self.guard = Guard::Truthy(param.into());
        self
    }

    /// Marker text
    #[inline]
    #[must_use]
    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Action
    #[inline]
    #[must_use]
    pub fn action(&self) -> &LineAction {
        &self.action
    }

    fn applies(&self, line: &str, params: &dyn ParameterLookup) -> bool {
        let enabled = match &self.guard {
            Guard::Always => true,
            Guard::Never => false,
            Guard::Truthy(param) => params.is_truthy(param),
        };
        enabled
            && match self.matching {
                MarkerMatch::Substring => line.contains(&self.marker),
                MarkerMatch::Exact => line.trim() == self.marker,
            }
    }
}

/// Rewritten document plus the flags raised while rewriting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    /// Output document
    pub document: LineDocument,
    /// Every flag named by the table, false unless raised
    pub flags: BTreeMap<String, bool>,
}

impl Rewritten {
    /// Value of a flag (false when unknown)
    #[must_use]
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }
}

/// Table-driven line rewriter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineRewriter {
    rules: Vec<LineRule>,
    header: Vec<String>,
    trailer: Vec<String>,
}

impl LineRewriter {
    /// Rewriter with a rule table in priority order
    #[must_use]
    pub fn new(rules: Vec<LineRule>) -> Self {
        Self {
            rules,
            header: Vec::new(),
            trailer: Vec::new(),
        }
    }

    /// Lines written before the body
    #[must_use]
    pub fn with_header(mut self, lines: Vec<String>) -> Self {
        self.header = lines;
        self
    }

    /// Lines appended after the body
    #[must_use]
    pub fn with_trailer(mut self, lines: Vec<String>) -> Self {
        self.trailer = lines;
        self
    }

    /// Rule table
    #[inline]
    #[must_use]
    pub fn rules(&self) -> &[LineRule] {
        &self.rules
    }

    /// Rewrite `template`
    ///
    /// # Errors
    /// Returns [`PatchError::FieldMissing`] when a matched `Render` rule names
    /// a parameter that is not supplied
    pub fn rewrite(
        &self,
        template: &LineDocument,
        params: &dyn ParameterLookup,
    ) -> Result<Rewritten, PatchError> {
        let mut flags: BTreeMap<String, bool> = self
            .rules
            .iter()
            .filter_map(|rule| match &rule.action {
                LineAction::Flag { flag, .. } => Some((flag.clone(), false)),
                _ => None,
            })
            .collect();

        let mut document = LineDocument::new();
        for line in &self.header {
            document.push_line(line);
        }

        let mut replaced = 0usize;
        let mut dropped = 0usize;
        for line in template.lines() {
            let content = line_content(line);
            let Some(rule) = self.rules.iter().find(|rule| rule.applies(content, params)) else {
                document.push_raw(line.clone());
                continue;
            };
            match &rule.action {
                LineAction::Replace(text) => {
                    document.push_line(text);
                    replaced += 1;
                }
                LineAction::Render { param, template } => {
                    let value = params
                        .lookup(param)
                        .ok_or_else(|| PatchError::field_missing(param.clone()))?;
                    document.push_line(&template.replace("{}", &value));
                    replaced += 1;
                }
                LineAction::Drop => dropped += 1,
                LineAction::Flag { flag, check } => {
                    if check.holds(content) {
                        flags.insert(flag.clone(), true);
                    }
                    document.push_raw(line.clone());
                }
            }
        }

        for line in &self.trailer {
            document.push_line(line);
        }

        tracing::debug!(
            lines_in = template.len(),
            lines_out = document.len(),
            replaced,
            dropped,
            ?flags,
            "line template rewritten"
        );

        Ok(Rewritten { document, flags })
    }
}
