// SPDX-License-Identifier: PMPL-1.0-or-later
//! Focus container rule - WCAG 2.1.2 No Keyboard Trap (Level A)
//!
//! A dialog or modal with nothing focusable inside leaves keyboard users
//! with nowhere to go once it opens.

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{Rule, RuleCategory};
use crate::tree::InterfaceTree;

pub struct FocusContainerRule;

impl Rule for FocusContainerRule {
    fn id(&self) -> &str {
        "focus-container"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::FocusContainer
    }

    fn description(&self) -> &str {
        "Checks that dialogs contain at least one focusable element (WCAG 2.1.2)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        Ok(tree
            .walk()
            .into_iter()
            .filter(|id| tree.is_dialog(*id) && tree.focusable_descendants(*id).is_empty())
            .map(|id| {
                Diagnostic::new(
                    "focus-container/no-focusable",
                    RuleCategory::FocusContainer,
                    Kind::Error,
                    Severity::High,
                    "Dialog contains no focusable elements; keyboard users cannot operate or leave it.",
                )
                .with_guideline("2.1.2", GuidelineLevel::A)
                .at_node(tree, id)
                .with_suggestion("Include at least one focusable control, such as a close button")
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    #[test]
    fn test_dialog_with_button_passes() {
        let mut tree = InterfaceTree::new();
        let dialog = tree
            .append(tree.root(), NodeSpec::new("div").attr("role", "dialog"))
            .unwrap();
        tree.append(dialog, NodeSpec::new("button").text("Close")).unwrap();
        assert!(FocusContainerRule.evaluate(&tree).unwrap().is_empty());
    }

    #[test]
    fn test_empty_modal_flagged() {
        let mut tree = InterfaceTree::new();
        let modal = tree
            .append(tree.root(), NodeSpec::new("div").attr("aria-modal", "true"))
            .unwrap();
        tree.append(modal, NodeSpec::new("p").text("Saving…")).unwrap();
        tree.append(modal, NodeSpec::new("button").attr("disabled", "").text("OK"))
            .unwrap();

        let findings = FocusContainerRule.evaluate(&tree).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::High);
        assert_eq!(findings[0].guideline_id, "2.1.2");
    }
}
