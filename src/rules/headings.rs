// SPDX-License-Identifier: PMPL-1.0-or-later
//! Heading structure rule - WCAG 1.3.1 Info and Relationships (Level A)
//!
//! Walks headings in document order:
//! - A heading more than one level deeper than its predecessor (h2 -> h4)
//! - Headings with no text
//! - No top-level heading on the page
//! - More than one top-level heading

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{explicit_label, Rule, RuleCategory};
use crate::tree::{InterfaceTree, NodeId};

/// Target descriptor for page-level findings
const PAGE_TARGET: &str = "document";

pub struct HeadingStructureRule;

impl Rule for HeadingStructureRule {
    fn id(&self) -> &str {
        "heading-structure"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::HeadingStructure
    }

    fn description(&self) -> &str {
        "Checks heading hierarchy, empty headings and top-level heading count (WCAG 1.3.1)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let headings: Vec<(NodeId, u8)> = tree
            .walk()
            .into_iter()
            .filter_map(|id| tree.heading_level(id).map(|level| (id, level)))
            .collect();
        let mut findings = Vec::new();

        for window in headings.windows(2) {
            let (_, prev) = window[0];
            let (id, curr) = window[1];
            if curr > prev + 1 {
                findings.push(
                    Diagnostic::new(
                        "heading-structure/skipped-level",
                        RuleCategory::HeadingStructure,
                        Kind::Warning,
                        Severity::Medium,
                        &format!(
                            "Heading level skipped from h{} to h{}. Do not skip heading levels.",
                            prev, curr
                        ),
                    )
                    .with_guideline("1.3.1", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion(&format!(
                        "Use h{} instead of h{}, or add the intermediate heading levels",
                        prev + 1,
                        curr
                    )),
                );
            }
        }

        for (id, _) in &headings {
            if tree.text_content(*id).is_empty() && explicit_label(tree, *id).is_none() {
                findings.push(
                    Diagnostic::new(
                        "heading-structure/empty",
                        RuleCategory::HeadingStructure,
                        Kind::Error,
                        Severity::High,
                        "Heading has no text. Empty headings are announced without content.",
                    )
                    .with_guideline("1.3.1", GuidelineLevel::A)
                    .at_node(tree, *id)
                    .with_suggestion("Give the heading descriptive text or remove it"),
                );
            }
        }

        let top_level = headings.iter().filter(|(_, level)| *level == 1).count();
        if top_level == 0 {
            findings.push(
                Diagnostic::new(
                    "heading-structure/missing-top-level",
                    RuleCategory::HeadingStructure,
                    Kind::Error,
                    Severity::High,
                    "Page has no top-level heading (h1).",
                )
                .with_guideline("1.3.1", GuidelineLevel::A)
                .with_target(PAGE_TARGET)
                .with_suggestion("Add a single h1 describing the page"),
            );
        } else if top_level > 1 {
            findings.push(
                Diagnostic::new(
                    "heading-structure/multiple-top-level",
                    RuleCategory::HeadingStructure,
                    Kind::Warning,
                    Severity::Medium,
                    &format!("Page has {} top-level headings (h1); expected one.", top_level),
                )
                .with_guideline("1.3.1", GuidelineLevel::A)
                .with_target(PAGE_TARGET)
                .with_suggestion("Keep one h1 and demote the others to h2"),
            );
        }

        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    fn tree_with(headings: &[(&str, &str)]) -> InterfaceTree {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        for (tag, text) in headings {
            tree.append(root, NodeSpec::new(tag).text(text)).unwrap();
        }
        tree
    }

    fn rules_of(findings: &[Diagnostic]) -> Vec<&str> {
        findings.iter().map(|f| f.rule.as_str()).collect()
    }

    #[test]
    fn test_proper_hierarchy_passes() {
        let tree = tree_with(&[("h1", "Samples"), ("h2", "Pending"), ("h3", "Today"), ("h2", "Done")]);
        let findings = HeadingStructureRule.evaluate(&tree).unwrap();
        assert!(findings.is_empty(), "unexpected: {:?}", rules_of(&findings));
    }

    #[test]
    fn test_skipped_level() {
        let tree = tree_with(&[("h1", "Samples"), ("h3", "Details")]);
        let findings = HeadingStructureRule.evaluate(&tree).unwrap();
        assert_eq!(rules_of(&findings), vec!["heading-structure/skipped-level"]);
        assert_eq!(findings[0].severity(), Severity::Medium);
    }

    #[test]
    fn test_empty_heading() {
        let tree = tree_with(&[("h1", "Samples"), ("h2", "   ")]);
        let findings = HeadingStructureRule.evaluate(&tree).unwrap();
        assert_eq!(rules_of(&findings), vec!["heading-structure/empty"]);
        assert_eq!(findings[0].severity(), Severity::High);
    }

    #[test]
    fn test_missing_top_level() {
        let tree = tree_with(&[("h2", "Section")]);
        let findings = HeadingStructureRule.evaluate(&tree).unwrap();
        assert_eq!(rules_of(&findings), vec!["heading-structure/missing-top-level"]);
        assert_eq!(findings[0].target, "document");
    }

    #[test]
    fn test_multiple_top_level_reported_once() {
        let tree = tree_with(&[("h1", "One"), ("h1", "Two"), ("h1", "Three")]);
        let findings = HeadingStructureRule.evaluate(&tree).unwrap();
        assert_eq!(rules_of(&findings), vec!["heading-structure/multiple-top-level"]);
    }
}
