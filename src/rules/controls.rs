// SPDX-License-Identifier: PMPL-1.0-or-later
//! Control label rule - WCAG 4.1.2 Name, Role, Value (Level A)
//!
//! Interactive controls need an accessible name, and controls that look
//! disabled must say so in a way assistive technology can read.

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{explicit_label, Rule, RuleCategory};
use crate::tree::{InterfaceTree, Node, NodeId};

/// Elements where the `disabled` attribute is understood natively
const NATIVE_DISABLEABLE: &[&str] = &["button", "input", "select", "textarea", "fieldset", "option"];

/// Class names used to style controls as disabled
const DISABLED_CLASSES: &[&str] = &["disabled", "is-disabled"];

pub struct ControlLabelRule;

impl Rule for ControlLabelRule {
    fn id(&self) -> &str {
        "control-label"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::ControlLabel
    }

    fn description(&self) -> &str {
        "Checks interactive controls for a name and machine-readable disabled state (WCAG 4.1.2)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let mut findings = Vec::new();

        for id in tree.walk() {
            if !tree.is_control(id) {
                continue;
            }
            let Some(node) = tree.get(id) else {
                continue;
            };

            if !has_name(tree, id, node) {
                findings.push(
                    Diagnostic::new(
                        "control-label/missing-name",
                        RuleCategory::ControlLabel,
                        Kind::Error,
                        Severity::High,
                        &format!(
                            "<{}> has neither visible text nor an explicit label.",
                            node.tag()
                        ),
                    )
                    .with_guideline("4.1.2", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion("Add visible text or an aria-label describing the action"),
                );
            }

            if looks_disabled(node) && !has_machine_readable_disabled(node) {
                findings.push(
                    Diagnostic::new(
                        "control-label/disabled-unannounced",
                        RuleCategory::ControlLabel,
                        Kind::Warning,
                        Severity::Medium,
                        "Control appears disabled but does not expose a disabled state.",
                    )
                    .with_guideline("4.1.2", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion("Add aria-disabled=\"true\" (or the native disabled attribute)"),
                );
            }
        }

        Ok(findings)
    }
}

fn has_name(tree: &InterfaceTree, id: NodeId, node: &Node) -> bool {
    if !tree.text_content(id).is_empty() || explicit_label(tree, id).is_some() {
        return true;
    }
    node.tag() == "input" && (node.non_empty_attr("value").is_some() || node.non_empty_attr("alt").is_some())
}

fn looks_disabled(node: &Node) -> bool {
    node.has_attr("disabled") || DISABLED_CLASSES.iter().any(|c| node.has_class(c))
}

fn has_machine_readable_disabled(node: &Node) -> bool {
    node.has_attr("aria-disabled")
        || (node.has_attr("disabled") && NATIVE_DISABLEABLE.contains(&node.tag()))
}
