// SPDX-License-Identifier: PMPL-1.0-or-later
//! Form field rule - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! - Every field has an associated label (`<label for>`, a wrapping
//!   `<label>`, `aria-label` or `aria-labelledby`)
//! - Fields presented as required (asterisk in the label, `required` class)
//!   carry `required` or `aria-required="true"`

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{explicit_label, Rule, RuleCategory};
use crate::tree::{InterfaceTree, Node, NodeId};

pub struct FormFieldRule;

impl Rule for FormFieldRule {
    fn id(&self) -> &str {
        "form-field"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::FormField
    }

    fn description(&self) -> &str {
        "Checks form fields for labels and machine-readable required state (WCAG 1.3.1)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let labels: Vec<NodeId> = tree
            .walk()
            .into_iter()
            .filter(|id| tree.tag(*id) == Some("label"))
            .collect();
        let mut findings = Vec::new();

        for id in tree.walk() {
            if !tree.is_form_field(id) {
                continue;
            }
            let Some(node) = tree.get(id) else {
                continue;
            };
            let label_text = associated_label(tree, &labels, id, node);

            if label_text.is_none() && explicit_label(tree, id).is_none() {
                let message = if node.non_empty_attr("placeholder").is_some() {
                    format!(
                        "<{}> relies on a placeholder and has no associated label.",
                        node.tag()
                    )
                } else {
                    format!("<{}> has no associated label.", node.tag())
                };
                findings.push(
                    Diagnostic::new(
                        "form-field/missing-label",
                        RuleCategory::FormField,
                        Kind::Error,
                        Severity::High,
                        &message,
                    )
                    .with_guideline("1.3.1", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion("Add a <label for=\"field-id\">, wrap the field in a <label>, or use aria-labelledby"),
                );
            }

            let shown_required = node.has_class("required")
                || label_text.as_deref().map(|t| t.contains('*')).unwrap_or(false);
            let announced_required = node.has_attr("required") || node.attr_is_true("aria-required");
            if shown_required && !announced_required {
                findings.push(
                    Diagnostic::new(
                        "form-field/required-unannounced",
                        RuleCategory::FormField,
                        Kind::Warning,
                        Severity::Medium,
                        "Field is marked as required visually but not programmatically.",
                    )
                    .with_guideline("1.3.1", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion("Add the required attribute or aria-required=\"true\""),
                );
            }
        }

        Ok(findings)
    }
}

/// Text of a `<label for=id>` or of a wrapping `<label>`
fn associated_label(
    tree: &InterfaceTree,
    labels: &[NodeId],
    id: NodeId,
    node: &Node,
) -> Option<String> {
    if let Some(html_id) = node.non_empty_attr("id") {
        let explicit = labels.iter().find(|l| {
            tree.get(**l).and_then(|label| label.attr("for")) == Some(html_id)
        });
        if let Some(label) = explicit {
            return Some(tree.text_content(*label));
        }
    }
    tree.ancestors(id)
        .into_iter()
        .find(|a| tree.tag(*a) == Some("label"))
        .map(|label| tree.text_content(label))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    #[test]
    fn test_labelled_fields_pass() {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        tree.append(root, NodeSpec::new("label").attr("for", "batch").text("Batch"))
            .unwrap();
        tree.append(root, NodeSpec::new("input").attr("id", "batch")).unwrap();
        let wrap = tree.append(root, NodeSpec::new("label").text("Notes")).unwrap();
        tree.append(wrap, NodeSpec::new("textarea")).unwrap();
        tree.append(root, NodeSpec::new("select").attr("aria-label", "Status"))
            .unwrap();
        tree.append(root, NodeSpec::new("input").attr("type", "hidden")).unwrap();

        let findings = FormFieldRule.evaluate(&tree).unwrap();
        assert!(findings.is_empty(), "unexpected: {:?}", findings);
    }

    #[test]
    fn test_missing_label() {
        let mut tree = InterfaceTree::new();
        tree.append(tree.root(), NodeSpec::new("input").attr("placeholder", "Search"))
            .unwrap();
        let findings = FormFieldRule.evaluate(&tree).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "form-field/missing-label");
        assert_eq!(findings[0].severity(), Severity::High);
        assert!(findings[0].message.contains("placeholder"));
    }

    #[test]
    fn test_required_without_indicator() {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        tree.append(root, NodeSpec::new("label").attr("for", "analyst").text("Analyst *"))
            .unwrap();
        tree.append(root, NodeSpec::new("input").attr("id", "analyst")).unwrap();
        let findings = FormFieldRule.evaluate(&tree).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "form-field/required-unannounced");
        assert_eq!(findings[0].severity(), Severity::Medium);
    }

    #[test]
    fn test_required_with_aria_passes() {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        tree.append(root, NodeSpec::new("label").attr("for", "analyst").text("Analyst *"))
            .unwrap();
        tree.append(
            root,
            NodeSpec::new("input").attr("id", "analyst").attr("aria-required", "true"),
        )
        .unwrap();
        assert!(FormFieldRule.evaluate(&tree).unwrap().is_empty());
    }
}
