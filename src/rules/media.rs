// SPDX-License-Identifier: PMPL-1.0-or-later
//! Media description rule - WCAG 1.1.1 Non-text Content (Level A)
//!
//! Every image-like node needs a non-empty description or an explicit
//! decorative marker:
//! - No description at all is an error
//! - An empty `alt` (author treats the image as decorative) without
//!   `role="presentation"`/`role="none"`/`aria-hidden="true"` is a warning

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{explicit_label, Rule, RuleCategory};
use crate::tree::{InterfaceTree, Node};

pub struct MediaDescriptionRule;

impl Rule for MediaDescriptionRule {
    fn id(&self) -> &str {
        "media-description"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::MediaDescription
    }

    fn description(&self) -> &str {
        "Checks image-like nodes for a description or decorative marker (WCAG 1.1.1)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let mut findings = Vec::new();

        for id in tree.walk() {
            if !tree.is_image_like(id) {
                continue;
            }
            let Some(node) = tree.get(id) else {
                continue;
            };
            if is_marked_decorative(node) {
                continue;
            }
            let has_description =
                node.non_empty_attr("alt").is_some() || explicit_label(tree, id).is_some();
            if has_description {
                continue;
            }

            if node.has_attr("alt") {
                findings.push(
                    Diagnostic::new(
                        "media-description/decorative-unmarked",
                        RuleCategory::MediaDescription,
                        Kind::Warning,
                        Severity::Medium,
                        "Decorative image has an empty description but no decorative marker.",
                    )
                    .with_guideline("1.1.1", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion("Add role=\"presentation\" or aria-hidden=\"true\" to decorative images"),
                );
            } else {
                findings.push(
                    Diagnostic::new(
                        "media-description/missing",
                        RuleCategory::MediaDescription,
                        Kind::Error,
                        Severity::High,
                        "Image has no description. Every image needs alternative text or a decorative marker.",
                    )
                    .with_guideline("1.1.1", GuidelineLevel::A)
                    .at_node(tree, id)
                    .with_suggestion(
                        "Add alt=\"description\" for informative images, or alt=\"\" with role=\"presentation\" for decorative ones",
                    ),
                );
            }
        }

        Ok(findings)
    }
}

fn is_marked_decorative(node: &Node) -> bool {
    node.has_role("presentation") || node.has_role("none") || node.attr_is_true("aria-hidden")
}
