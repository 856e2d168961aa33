// SPDX-License-Identifier: PMPL-1.0-or-later
//! Link text rule - WCAG 2.4.4 Link Purpose (Level A)
//!
//! - Link names shorter than two characters
//! - Several links sharing the same name with nothing to tell them apart
//!   (one finding per group)
//! - Off-origin links whose label does not say they lead elsewhere

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{snippet, Rule, RuleCategory};
use crate::tree::{InterfaceTree, NodeId};
use std::collections::HashMap;
use url::Url;

/// Minimum trimmed length of a link name
const MIN_NAME_CHARS: usize = 2;

/// Phrases that tell the user a link leaves the site
const EXTERNAL_MARKERS: &[&str] = &["external", "new window", "new tab", "opens in"];

pub struct LinkTextRule;

impl Rule for LinkTextRule {
    fn id(&self) -> &str {
        "link-text"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::LinkText
    }

    fn description(&self) -> &str {
        "Checks link names for length, ambiguity and external indicators (WCAG 2.4.4)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::A
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let links: Vec<NodeId> = tree.walk().into_iter().filter(|id| tree.is_link(*id)).collect();
        let mut findings = Vec::new();
        let mut groups: Vec<(String, Vec<NodeId>)> = Vec::new();
        let mut group_index: HashMap<(String, String), usize> = HashMap::new();

        for id in &links {
            let name = link_name(tree, *id);

            if name.chars().count() < MIN_NAME_CHARS {
                findings.push(
                    Diagnostic::new(
                        "link-text/too-short",
                        RuleCategory::LinkText,
                        Kind::Error,
                        Severity::High,
                        &format!(
                            "Link text \"{}\" is too short to describe its destination.",
                            name
                        ),
                    )
                    .with_guideline("2.4.4", GuidelineLevel::A)
                    .at_node(tree, *id)
                    .with_suggestion("Give the link text that describes where it leads, or an aria-label"),
                );
                continue;
            }

            let key = (name.to_lowercase(), distinguishing_context(tree, *id));
            match group_index.get(&key) {
                Some(&idx) => groups[idx].1.push(*id),
                None => {
                    group_index.insert(key, groups.len());
                    groups.push((name.clone(), vec![*id]));
                }
            }

            if is_off_origin(tree, *id) && !has_external_marker(&name, tree, *id) {
                findings.push(
                    Diagnostic::new(
                        "link-text/external-unmarked",
                        RuleCategory::LinkText,
                        Kind::Info,
                        Severity::Low,
                        &format!(
                            "Link \"{}\" leads to another site but its label does not say so.",
                            snippet(&name)
                        ),
                    )
                    .with_guideline("2.4.4", GuidelineLevel::A)
                    .at_node(tree, *id)
                    .with_suggestion("Mention that the link is external, e.g. \"(external site)\""),
                );
            }
        }

        for (name, members) in groups.iter().filter(|(_, m)| m.len() > 1) {
            findings.push(
                Diagnostic::new(
                    "link-text/duplicate",
                    RuleCategory::LinkText,
                    Kind::Warning,
                    Severity::Medium,
                    &format!(
                        "{} links share the text \"{}\" with no context to tell them apart.",
                        members.len(),
                        snippet(name)
                    ),
                )
                .with_guideline("2.4.4", GuidelineLevel::A)
                .at_node(tree, members[0])
                .with_target(format!("links \"{}\"", snippet(name)))
                .with_suggestion("Make each link's text unique, or add aria-label/aria-describedby context"),
            );
        }

        Ok(findings)
    }
}

/// `aria-label` when present, otherwise the visible text
fn link_name(tree: &InterfaceTree, id: NodeId) -> String {
    tree.get(id)
        .and_then(|n| n.non_empty_attr("aria-label"))
        .map(str::to_string)
        .unwrap_or_else(|| tree.text_content(id))
}

/// Extra description that disambiguates links sharing a name
fn distinguishing_context(tree: &InterfaceTree, id: NodeId) -> String {
    let Some(node) = tree.get(id) else {
        return String::new();
    };
    [node.non_empty_attr("aria-describedby"), node.non_empty_attr("title")]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("|")
}

fn is_off_origin(tree: &InterfaceTree, id: NodeId) -> bool {
    let Some(href) = tree.get(id).and_then(|n| n.non_empty_attr("href")) else {
        return false;
    };
    let Ok(target) = Url::parse(href) else {
        // relative URL
        return false;
    };
    if !matches!(target.scheme(), "http" | "https") {
        return false;
    }
    match tree.origin().and_then(|o| Url::parse(o).ok()) {
        Some(origin) => origin.host_str() != target.host_str(),
        None => true,
    }
}

fn has_external_marker(name: &str, tree: &InterfaceTree, id: NodeId) -> bool {
    let title = tree
        .get(id)
        .and_then(|n| n.attr("title"))
        .unwrap_or_default();
    let label = format!("{} {}", name, title).to_lowercase();
    EXTERNAL_MARKERS.iter().any(|m| label.contains(m))
}
