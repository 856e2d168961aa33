// SPDX-License-Identifier: PMPL-1.0-or-later
//! Rule catalog.
//!
//! Each rule inspects the whole tree and returns its diagnostics. Rules never
//! mutate the tree, so they can run in any order. The [`RuleRegistry`] holds
//! the rules an auditor evaluates; rules can be added or removed without
//! touching the orchestrator.

pub mod contrast;
pub mod controls;
pub mod focus;
pub mod forms;
pub mod headings;
pub mod links;
pub mod media;
pub mod tab_order;

use crate::diagnostic::{Diagnostic, GuidelineLevel};
use crate::error::Result;
use crate::tree::{InterfaceTree, NodeId};
use serde::{Deserialize, Serialize};

/// Concern a rule covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    MediaDescription,
    HeadingStructure,
    LinkText,
    ControlLabel,
    FormField,
    Contrast,
    TabOrder,
    FocusContainer,
    /// Caller-registered rule outside the built-in catalog
    Custom,
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RuleCategory::MediaDescription => "media-description",
            RuleCategory::HeadingStructure => "heading-structure",
            RuleCategory::LinkText => "link-text",
            RuleCategory::ControlLabel => "control-label",
            RuleCategory::FormField => "form-field",
            RuleCategory::Contrast => "contrast",
            RuleCategory::TabOrder => "tab-order",
            RuleCategory::FocusContainer => "focus-container",
            RuleCategory::Custom => "custom",
        };
        write!(f, "{}", name)
    }
}

/// Trait implemented by all rules
pub trait Rule: Send + Sync {
    /// Unique identifier within a registry
    fn id(&self) -> &str;

    fn category(&self) -> RuleCategory;

    /// Short description of what this rule checks
    fn description(&self) -> &str;

    /// Highest guideline level this rule reports
    fn level(&self) -> GuidelineLevel;

    /// Inspect the tree and return findings
    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>>;

    /// Whether this rule runs when auditing against `target`
    fn applies_to_level(&self, target: GuidelineLevel) -> bool {
        self.level() <= target
    }
}

/// Ordered collection of rules
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn Rule>>,
}

impl RuleRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in catalog
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(media::MediaDescriptionRule));
        registry.register(Box::new(headings::HeadingStructureRule));
        registry.register(Box::new(links::LinkTextRule));
        registry.register(Box::new(controls::ControlLabelRule));
        registry.register(Box::new(forms::FormFieldRule));
        registry.register(Box::new(contrast::ContrastRule));
        registry.register(Box::new(tab_order::TabOrderRule));
        registry.register(Box::new(focus::FocusContainerRule));
        registry
    }

    /// Add a rule, replacing any rule with the same id
    pub fn register(&mut self, rule: Box<dyn Rule>) {
        self.rules.retain(|r| r.id() != rule.id());
        self.rules.push(rule);
    }

    /// Remove a rule by id; `true` when something was removed
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id() != id);
        self.rules.len() != before
    }

    pub fn get(&self, id: &str) -> Option<&dyn Rule> {
        self.rules.iter().find(|r| r.id() == id).map(|r| r.as_ref())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry").field("rules", &self.ids()).finish()
    }
}

/// Explicit (non-visible) accessible name: `aria-label`, then
/// `aria-labelledby` references, then `title`
pub(crate) fn explicit_label(tree: &InterfaceTree, id: NodeId) -> Option<String> {
    let node = tree.get(id)?;
    if let Some(label) = node.non_empty_attr("aria-label") {
        return Some(label.to_string());
    }
    if let Some(refs) = node.non_empty_attr("aria-labelledby") {
        let text = refs
            .split_whitespace()
            .filter_map(|r| tree.find_by_id(r))
            .map(|n| tree.text_content(n))
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            return Some(text);
        }
    }
    node.non_empty_attr("title").map(str::to_string)
}

/// Truncate text for use in messages
pub(crate) fn snippet(text: &str) -> String {
    const MAX: usize = 30;
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.to_string()
    }
}
