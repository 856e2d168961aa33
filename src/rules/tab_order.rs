// SPDX-License-Identifier: PMPL-1.0-or-later
//! Tab order rule - WCAG 2.4.3 Focus Order (Level A)
//!
//! Keyboard traversal visits positive `tabindex` values first, in ascending
//! order, then everything else in document order. When that sequence differs
//! from document order the page gets one warning.

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{Rule, RuleCategory};
use crate::tree::{InterfaceTree, NodeId};

pub struct TabOrderRule;

impl Rule for TabOrderRule {
    fn id(&self) -> &str {
        "tab-order"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::TabOrder
    }

    fn description(&self) -> &str {
        "Checks that explicit tab indices agree with document order (WCAG 2.4.3)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let natural = tree.focusable_descendants(tree.root());
        let keyboard = keyboard_order(tree, &natural);

        if keyboard == natural {
            return Ok(Vec::new());
        }

        let first_out_of_place = natural
            .iter()
            .zip(&keyboard)
            .find(|(a, b)| a != b)
            .map(|(_, b)| tree.describe(*b))
            .unwrap_or_default();

        Ok(vec![Diagnostic::new(
            "tab-order/mismatch",
            RuleCategory::TabOrder,
            Kind::Warning,
            Severity::Medium,
            &format!(
                "Keyboard focus order differs from document order (first jump to {}).",
                first_out_of_place
            ),
        )
        .with_guideline("2.4.3", GuidelineLevel::A)
        .with_target("document")
        .with_suggestion("Remove positive tabindex values and order the content in the document instead")])
    }
}

/// Order in which the Tab key visits `natural`
fn keyboard_order(tree: &InterfaceTree, natural: &[NodeId]) -> Vec<NodeId> {
    let mut order = natural.to_vec();
    // stable: ties keep document order
    order.sort_by_key(|id| match tree.tab_index(*id) {
        Some(index) if index > 0 => (0, index),
        _ => (1, 0),
    });
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    fn tree_with(indices: &[Option<&str>]) -> InterfaceTree {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        for (i, index) in indices.iter().enumerate() {
            let mut spec = NodeSpec::new("button").text(&format!("Button {}", i));
            if let Some(index) = index {
                spec = spec.attr("tabindex", index);
            }
            tree.append(root, spec).unwrap();
        }
        tree
    }

    #[test]
    fn test_natural_order_passes() {
        let tree = tree_with(&[None, Some("0"), None]);
        assert!(TabOrderRule.evaluate(&tree).unwrap().is_empty());
    }

    #[test]
    fn test_ascending_positive_prefix_passes() {
        let tree = tree_with(&[Some("1"), Some("2"), None]);
        assert!(TabOrderRule.evaluate(&tree).unwrap().is_empty());
    }

    #[test]
    fn test_positive_index_out_of_order() {
        let tree = tree_with(&[None, Some("3"), Some("1")]);
        let findings = TabOrderRule.evaluate(&tree).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Medium);
        assert_eq!(findings[0].guideline_id, "2.4.3");
        assert_eq!(findings[0].target, "document");
    }

    #[test]
    fn test_negative_index_leaves_order() {
        let tree = tree_with(&[None, Some("-1"), None]);
        assert!(TabOrderRule.evaluate(&tree).unwrap().is_empty());
    }
}
