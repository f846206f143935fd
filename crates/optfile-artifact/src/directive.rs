//! Patch directives for structured templates
//!
//! A [`PatchDirective`] pairs a semantic target (an [`ElementPath`]) with the
//! action to take when the target is found and the rule to follow when it is
//! absent. Synthesizers describe a whole job-descriptor format as an ordered
//! table of directives; the patcher evaluates them in order.

use crate::path::ElementPath;
use std::fmt::{self, Display, Formatter};

/// Value written into a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchValue {
    /// Literal text
    Text(String),
    /// Background file list from the overlay provider, joined by the
    /// patcher's separator
    Overlay,
}

impl From<&str> for PatchValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PatchValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Guard on the existing scalar text of a found node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCondition {
    /// Always overwrite
    Always,
    /// Overwrite when the existing text is an integer below the bound, or
    /// is not an integer at all
    IntegerBelow(i64),
}

impl TextCondition {
    /// Evaluate against existing text (`None` when the node has no text)
    #[must_use]
    pub fn holds(&self, current: Option<&str>) -> bool {
        match self {
            Self::Always => true,
            Self::IntegerBelow(bound) => current
                .and_then(|text| text.trim().parse::<i64>().ok())
                .map_or(true, |value| value < *bound),
        }
    }
}

/// What to do with the target node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchAction {
    /// Replace the scalar text
    SetText(PatchValue),

    /// Overwrite the `value` attribute when the node has one, otherwise the
    /// scalar text
    SetValueOrText(String),

    /// Replace the scalar text only when `condition` holds
    SetTextIf {
        /// New text
        value: String,
        /// Guard on the existing text
        condition: TextCondition,
    },

    /// Clear every child and append one `item_tag` element per item
    FillList {
        /// Tag of each list entry
        item_tag: String,
        /// Entries, in order
        items: Vec<String>,
    },

    /// Keep an existing node as is; a synthesized node gets `default` text
    Preserve {
        /// Text for a synthesized node
        default: String,
    },
}

impl PatchAction {
    /// Does this action need the overlay provider?
    #[inline]
    #[must_use]
    pub fn needs_overlay(&self) -> bool {
        matches!(self, Self::SetText(PatchValue::Overlay))
    }
}

/// Insertion rule for an absent target
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WhenAbsent {
    /// Leave the document untouched
    #[default]
    Skip,
    /// Synthesize only the last segment, and only if its parent exists
    CreateLeaf,
    /// Synthesize every missing segment below the deepest existing prefix
    Create,
    /// Look up (and if needed synthesize) this alternate path instead
    CreateAt(ElementPath),
}

/// Execution-order bookkeeping for synthesized components
///
/// When the patcher synthesizes an element tagged `entry_tag` carrying a
/// `key` attribute, it appends `<entry_tag key="..."/>` to the `list`
/// section (creating the section if needed) unless an identical entry is
/// already there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Execution-order section
    pub list: ElementPath,
    /// Tag of synthesized elements to register and of the reference entry
    pub entry_tag: String,
    /// Attribute carrying the component name
    pub key: String,
}

impl Registration {
    /// `<execute><driver name="..."/></execute>` convention
    #[must_use]
    pub fn execute_drivers() -> Self {
        Self {
            list: ElementPath::new(vec![crate::path::Selector::tag("execute")]),
            entry_tag: "driver".to_string(),
            key: "name".to_string(),
        }
    }
}

/// A single patch rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDirective {
    label: String,
    target: ElementPath,
    action: PatchAction,
    when_absent: WhenAbsent,
    registration: Option<Registration>,
    note: String,
}

impl PatchDirective {
    /// Directive that skips absent targets and annotates with
    /// `"<label> changed"`
    #[must_use]
    pub fn new(label: impl Into<String>, target: ElementPath, action: PatchAction) -> Self {
        let label = label.into();
        let note = format!("{label} changed");
        Self {
            label,
            target,
            action,
            when_absent: WhenAbsent::Skip,
            registration: None,
            note,
        }
    }

    /// Set the insertion rule
    #[inline]
    #[must_use]
    pub fn when_absent(mut self, rule: WhenAbsent) -> Self {
        self.when_absent = rule;
        self
    }

    /// Register synthesized components for execution
    #[inline]
    #[must_use]
    pub fn registering(mut self, registration: Registration) -> Self {
        self.registration = Some(registration);
        self
    }

    /// Short name used in logs and reports
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Target path
    #[inline]
    #[must_use]
    pub fn target(&self) -> &ElementPath {
        &self.target
    }

    /// Action
    #[inline]
    #[must_use]
    pub fn action(&self) -> &PatchAction {
        &self.action
    }

    /// Insertion rule
    #[inline]
    #[must_use]
    pub fn absent_rule(&self) -> &WhenAbsent {
        &self.when_absent
    }

    /// Registration, if any
    #[inline]
    #[must_use]
    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }

    /// Annotation comment text
    #[inline]
    #[must_use]
    pub fn note(&self) -> &str {
        &self.note
    }
}

impl Display for PatchDirective {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.label, self.target)
    }
}

/// What happened to a directive's target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatchStatus {
    /// Existing node modified
    Updated,
    /// Node synthesized
    Created,
    /// Node found and left as is
    Unchanged,
    /// Node absent and not synthesized
    Skipped,
}

impl PatchStatus {
    /// Did the document change?
    #[inline]
    #[must_use]
    pub fn changed(self) -> bool {
        matches!(self, Self::Updated | Self::Created)
    }
}

/// Per-directive result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveOutcome {
    /// Directive label
    pub label: String,
    /// What happened
    pub status: PatchStatus,
    /// Scalar text of the target after patching
    pub text: Option<String>,
}

/// Results of a patch run, in directive order
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatchReport {
    outcomes: Vec<DirectiveOutcome>,
}

impl PatchReport {
    /// Empty report
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome
    pub fn push(&mut self, outcome: DirectiveOutcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes
    #[inline]
    #[must_use]
    pub fn outcomes(&self) -> &[DirectiveOutcome] {
        &self.outcomes
    }

    /// Outcome by label
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&DirectiveOutcome> {
        self.outcomes.iter().find(|o| o.label == label)
    }

    /// Number of directives that changed the document
    #[must_use]
    pub fn changed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.status.changed()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_below_condition() {
        let cond = TextCondition::IntegerBelow(10);
        assert!(cond.holds(Some("1")));
        assert!(cond.holds(Some(" 9 ")));
        assert!(!cond.holds(Some("10")));
        assert!(!cond.holds(Some("250")));
        assert!(cond.holds(Some("often")));
        assert!(cond.holds(None));
        assert!(TextCondition::Always.holds(Some("anything")));
    }

    #[test]
    fn default_note_uses_label() {
        let directive = PatchDirective::new(
            "verbosity",
            ElementPath::parse("global/parameter[@name='Verbosity']").unwrap(),
            PatchAction::SetText("SILENT".into()),
        );
        assert_eq!(directive.note(), "verbosity changed");
        assert_eq!(directive.absent_rule(), &WhenAbsent::Skip);
        assert_eq!(
            directive.to_string(),
            "verbosity at global/parameter[@name='Verbosity']"
        );
    }

    #[test]
    fn builder_methods() {
        let directive = PatchDirective::new(
            "writer",
            ElementPath::parse("drivers/driver[@name='Writer']/outputFilePath").unwrap(),
            PatchAction::SetText("out.slcio".into()),
        )
        .when_absent(WhenAbsent::Create)
        .registering(Registration::execute_drivers());
        assert_eq!(directive.absent_rule(), &WhenAbsent::Create);
        assert_eq!(directive.registration().unwrap().key, "name");
        assert_eq!(directive.note(), "writer changed");
    }

    #[test]
    fn only_overlay_text_needs_provider() {
        assert!(PatchAction::SetText(PatchValue::Overlay).needs_overlay());
        assert!(!PatchAction::SetText("x".into()).needs_overlay());
        assert!(!PatchAction::Preserve { default: "LCSIM".into() }.needs_overlay());
    }

    #[test]
    fn report_lookup() {
        let mut report = PatchReport::new();
        report.push(DirectiveOutcome {
            label: "marker".into(),
            status: PatchStatus::Unchanged,
            text: Some("MARK".into()),
        });
        report.push(DirectiveOutcome {
            label: "inputs".into(),
            status: PatchStatus::Created,
            text: None,
        });
        assert_eq!(report.get("marker").unwrap().text.as_deref(), Some("MARK"));
        assert_eq!(report.changed_count(), 1);
        assert!(report.get("missing").is_none());
    }
}
