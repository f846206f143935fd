//! Structured-Tree Patcher
//!
//! Applies an ordered table of [`PatchDirective`]s to a copy of an
//! [`XmlDocument`]. For each directive the target is looked up with a
//! first-match traversal; a found node is modified in place, an absent one
//! is skipped or synthesized according to the directive's [`WhenAbsent`]
//! rule. Every change leaves an annotation comment as the first child of the
//! enclosing section. Annotations and execution-order entries are never
//! duplicated, so patching an already patched document is a no-op.
//!
//! The input document is never modified: on any error the partially patched
//! copy is discarded.

use crate::error::PatchError;
use crate::overlay::OverlayProvider;
use optfile_artifact::{
    DirectiveOutcome, Element, ElementPath, Node, PatchAction, PatchDirective, PatchReport,
    PatchStatus, PatchValue, Registration, WhenAbsent, XmlDocument,
};

/// Directive evaluator bound to an overlay provider
pub struct TreePatcher<'a> {
    overlay: &'a dyn OverlayProvider,
    separator: String,
}

impl std::fmt::Debug for TreePatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreePatcher")
            .field("separator", &self.separator)
            .finish_non_exhaustive()
    }
}

impl<'a> TreePatcher<'a> {
    /// Patcher joining overlay files with newlines
    #[must_use]
    pub fn new(overlay: &'a dyn OverlayProvider) -> Self {
        Self {
            overlay,
            separator: "\n".to_string(),
        }
    }

    /// Separator used to join overlay files into node text
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Apply `directives` in order to a copy of `document`
    ///
    /// # Errors
    /// - [`PatchError::ResourceNotFound`] when a directive needs overlay
    ///   files and the provider returns none
    /// - [`PatchError::InvalidTarget`] when a missing node cannot be
    ///   synthesized from its path
    pub fn patch(
        &self,
        document: &XmlDocument,
        directives: &[PatchDirective],
    ) -> Result<(XmlDocument, PatchReport), PatchError> {
        let mut patched = document.clone();
        let mut overlay = OverlayCache::default();
        let mut report = PatchReport::new();

        for directive in directives {
            let outcome = self.apply(&mut patched.root, directive, &mut overlay)?;
            tracing::debug!(
                directive = %directive,
                status = ?outcome.status,
                "directive applied"
            );
            report.push(outcome);
        }

        tracing::info!(
            directives = directives.len(),
            changed = report.changed_count(),
            "document patched"
        );
        Ok((patched, report))
    }

    fn apply(
        &self,
        root: &mut Element,
        directive: &PatchDirective,
        overlay: &mut OverlayCache,
    ) -> Result<DirectiveOutcome, PatchError> {
        if let Some(trail) = root.locate(directive.target()) {
            return self.update(root, &trail, directive, overlay);
        }

        let path = match directive.absent_rule() {
            WhenAbsent::Skip => return Ok(outcome(directive, PatchStatus::Skipped, None)),
            WhenAbsent::CreateLeaf => {
                let has_parent = directive
                    .target()
                    .parent()
                    .is_some_and(|parent| root.locate(&parent).is_some());
                if !has_parent {
                    return Ok(outcome(directive, PatchStatus::Skipped, None));
                }
                directive.target().clone()
            }
            WhenAbsent::Create => directive.target().clone(),
            WhenAbsent::CreateAt(alternate) => {
                if let Some(trail) = root.locate(alternate) {
                    return self.update(root, &trail, directive, overlay);
                }
                alternate.clone()
            }
        };
        self.create(root, &path, directive, overlay)
    }

    fn update(
        &self,
        root: &mut Element,
        trail: &[usize],
        directive: &PatchDirective,
        overlay: &mut OverlayCache,
    ) -> Result<DirectiveOutcome, PatchError> {
        // Resolve before touching the tree.
        let value = self.resolve(directive, overlay)?;

        let element = root
            .descend_mut(trail)
            .ok_or_else(|| lost_target(directive))?;
        let (status, text) = match directive.action() {
            PatchAction::SetText(_) => {
                let value = value.unwrap_or_default();
                element.set_text(value.clone());
                (PatchStatus::Updated, Some(value))
            }
            PatchAction::SetValueOrText(value) => {
                if element.attribute("value").is_some() {
                    element.set_attribute("value", value.clone());
                } else {
                    element.set_text(value.clone());
                }
                (PatchStatus::Updated, Some(value.clone()))
            }
            PatchAction::SetTextIf { value, condition } => {
                if condition.holds(element.text().as_deref()) {
                    element.set_text(value.clone());
                    (PatchStatus::Updated, Some(value.clone()))
                } else {
                    (PatchStatus::Unchanged, element.text())
                }
            }
            PatchAction::FillList { item_tag, items } => {
                fill_list(element, item_tag, items);
                (PatchStatus::Updated, None)
            }
            PatchAction::Preserve { .. } => (PatchStatus::Unchanged, element.text()),
        };

        if status.changed() {
            let section = &trail[..trail.len().saturating_sub(1)];
            annotate(root, section, directive.note());
        }
        Ok(outcome(directive, status, text))
    }

    fn create(
        &self,
        root: &mut Element,
        path: &ElementPath,
        directive: &PatchDirective,
        overlay: &mut OverlayCache,
    ) -> Result<DirectiveOutcome, PatchError> {
        let leaf_text = match directive.action() {
            PatchAction::SetText(_) => self.resolve(directive, overlay)?,
            PatchAction::SetValueOrText(value) | PatchAction::SetTextIf { value, .. } => {
                Some(value.clone())
            }
            PatchAction::Preserve { default } => Some(default.clone()),
            PatchAction::FillList { .. } => None,
        };

        let (anchor, depth) = deepest_existing(root, path);
        let mut chain = path.segments()[depth..]
            .iter()
            .map(|selector| selector.synthesize())
            .collect::<Result<Vec<_>, _>>()?;
        let Some(mut leaf) = chain.pop() else {
            return Err(lost_target(directive));
        };

        match directive.action() {
            PatchAction::FillList { item_tag, items } => fill_list(&mut leaf, item_tag, items),
            _ => {
                if let Some(text) = &leaf_text {
                    leaf.set_text(text.clone());
                }
            }
        }

        let registered: Vec<String> = directive
            .registration()
            .map(|registration| {
                chain
                    .iter()
                    .chain(std::iter::once(&leaf))
                    .filter(|element| element.name == registration.entry_tag)
                    .filter_map(|element| element.attribute(&registration.key))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // Annotation goes to the leaf's parent, where an update would put it.
        let mut leaf_parent = anchor.clone();
        if !chain.is_empty() {
            let section = root
                .descend(&anchor)
                .ok_or_else(|| lost_target(directive))?;
            leaf_parent.push(section.children.len());
            leaf_parent.extend(std::iter::repeat(0).take(chain.len() - 1));
        }

        let top = chain
            .into_iter()
            .rev()
            .fold(leaf, |child, parent| parent.with_child(child));
        let section = root
            .descend_mut(&anchor)
            .ok_or_else(|| lost_target(directive))?;
        section.push_element(top);
        annotate(root, &leaf_parent, directive.note());

        if let Some(registration) = directive.registration() {
            for name in &registered {
                register(root, registration, name)?;
            }
        }

        Ok(outcome(directive, PatchStatus::Created, leaf_text))
    }

    /// Text a `SetText` directive writes; `None` for every other action
    fn resolve(
        &self,
        directive: &PatchDirective,
        overlay: &mut OverlayCache,
    ) -> Result<Option<String>, PatchError> {
        match directive.action() {
            action if action.needs_overlay() => overlay
                .get(self.overlay, &self.separator, directive)
                .map(Some),
            PatchAction::SetText(PatchValue::Text(text)) => Ok(Some(text.clone())),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Default)]
struct OverlayCache(Option<String>);

impl OverlayCache {
    fn get(
        &mut self,
        provider: &dyn OverlayProvider,
        separator: &str,
        directive: &PatchDirective,
    ) -> Result<String, PatchError> {
        if let Some(joined) = &self.0 {
            return Ok(joined.clone());
        }
        let files = provider.overlay_files();
        if files.is_empty() {
            tracing::warn!(directive = %directive, "no overlay files available");
            return Err(PatchError::resource_not_found(
                "overlay files",
                directive.to_string(),
            ));
        }
        tracing::debug!(count = files.len(), "overlay files obtained");
        let joined = files.join(separator);
        self.0 = Some(joined.clone());
        Ok(joined)
    }
}

fn outcome(directive: &PatchDirective, status: PatchStatus, text: Option<String>) -> DirectiveOutcome {
    DirectiveOutcome {
        label: directive.label().to_string(),
        status,
        text,
    }
}

fn lost_target(directive: &PatchDirective) -> PatchError {
    PatchError::InvalidTarget {
        target: directive.target().to_string(),
        reason: "node cannot be reached".to_string(),
    }
}

fn unreachable_list(registration: &Registration) -> PatchError {
    PatchError::InvalidTarget {
        target: registration.list.to_string(),
        reason: "execution list cannot be reached".to_string(),
    }
}

fn fill_list(element: &mut Element, item_tag: &str, items: &[String]) {
    element.clear_children();
    for item in items {
        element.push_element(Element::new(item_tag).with_text(item.clone()));
    }
}

/// Longest prefix of `path` present in the tree: its trail and length
fn deepest_existing(root: &Element, path: &ElementPath) -> (Vec<usize>, usize) {
    for depth in (1..path.len()).rev() {
        if let Some(trail) = root.locate(&path.prefix(depth)) {
            return (trail, depth);
        }
    }
    (Vec::new(), 0)
}

/// Insert `note` as the first child of the section at `trail`, once
fn annotate(root: &mut Element, trail: &[usize], note: &str) {
    if let Some(section) = root.descend_mut(trail) {
        if !section.has_comment(note) {
            section.children.insert(0, Node::Comment(note.to_string()));
        }
    }
}

/// Add an execution-order entry for `name` unless one exists
fn register(root: &mut Element, registration: &Registration, name: &str) -> Result<(), PatchError> {
    let trail = match root.locate(&registration.list) {
        Some(trail) => trail,
        None => {
            let (anchor, depth) = deepest_existing(root, &registration.list);
            let chain = registration.list.segments()[depth..]
                .iter()
                .map(|selector| selector.synthesize())
                .collect::<Result<Vec<_>, _>>()?;
            let depth = chain.len();
            let Some(top) = chain
                .into_iter()
                .rev()
                .reduce(|child, parent| parent.with_child(child))
            else {
                return Err(unreachable_list(registration));
            };
            let section = root
                .descend_mut(&anchor)
                .ok_or_else(|| unreachable_list(registration))?;
            let mut trail = anchor;
            trail.push(section.children.len());
            trail.extend(std::iter::repeat(0).take(depth - 1));
            section.push_element(top);
            trail
        }
    };

    let list = root
        .descend_mut(&trail)
        .ok_or_else(|| unreachable_list(registration))?;
    let present = list.elements().any(|entry| {
        entry.name == registration.entry_tag && entry.attribute(&registration.key) == Some(name)
    });
    if present {
        return Ok(());
    }
    list.push_element(Element::new(registration.entry_tag.clone()).with_attribute(&registration.key, name));
    annotate(root, &trail, &format!("{name} registered for execution"));
    tracing::debug!(component = name, list = %registration.list, "registered for execution");
    Ok(())
}
