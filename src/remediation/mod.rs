// SPDX-License-Identifier: PMPL-1.0-or-later
//! Remediation helpers applied after reviewing a report.
//!
//! All helpers are idempotent attribute or structure writes. A node id that
//! no longer belongs to the tree fails with [`AuditError::StaleTarget`].
//!
//! [`AuditError::StaleTarget`]: crate::error::AuditError::StaleTarget

pub mod focus_trap;

pub use focus_trap::{FocusTrapGuard, FocusTraps, Key, KeyOutcome, KeyPress, TrapState};

use crate::error::Result;
use crate::tree::{InterfaceTree, NodeId, NodeSpec};
use tracing::{debug, warn};

pub const DEFAULT_SKIP_LINK_TEXT: &str = "Skip to main content";

/// Class marking injected skip links
pub const SKIP_LINK_CLASS: &str = "skip-link";

/// Attach an accessible name (`aria-label`)
pub fn annotate(tree: &mut InterfaceTree, node: NodeId, label: &str) -> Result<()> {
    tree.node_mut(node)?.set_attr("aria-label", label);
    Ok(())
}

/// Link a description by id (`aria-describedby`), keeping existing references
pub fn annotate_described_by(tree: &mut InterfaceTree, node: NodeId, ref_id: &str) -> Result<()> {
    let target = tree.node_mut(node)?;
    let existing = target.attr("aria-describedby").unwrap_or_default().to_string();
    if existing.split_whitespace().any(|r| r == ref_id) {
        return Ok(());
    }
    let value = if existing.trim().is_empty() {
        ref_id.to_string()
    } else {
        format!("{} {}", existing.trim(), ref_id)
    };
    target.set_attr("aria-describedby", &value);
    Ok(())
}

pub fn set_expanded(tree: &mut InterfaceTree, node: NodeId, expanded: bool) -> Result<()> {
    tree.node_mut(node)?
        .set_attr("aria-expanded", if expanded { "true" } else { "false" });
    Ok(())
}

pub fn set_hidden(tree: &mut InterfaceTree, node: NodeId, hidden: bool) -> Result<()> {
    tree.node_mut(node)?
        .set_attr("aria-hidden", if hidden { "true" } else { "false" });
    Ok(())
}

/// Insert a skip link to `#target_id` at the start of the page.
///
/// Returns the new link, or `None` when a skip link to that target exists.
pub fn add_skip_link(
    tree: &mut InterfaceTree,
    target_id: &str,
    text: Option<&str>,
) -> Result<Option<NodeId>> {
    let href = format!("#{}", target_id);
    let exists = tree.walk().into_iter().any(|id| {
        tree.get(id)
            .map(|n| n.tag() == "a" && n.has_class(SKIP_LINK_CLASS) && n.attr("href") == Some(href.as_str()))
            .unwrap_or(false)
    });
    if exists {
        debug!("Skip link to {} already present", href);
        return Ok(None);
    }
    if tree.find_by_id(target_id).is_none() {
        warn!("Skip link target {} does not exist in the tree", href);
    }

    let body = tree.body();
    let link = tree.prepend(
        body,
        NodeSpec::new("a")
            .attr("href", &href)
            .attr("class", SKIP_LINK_CLASS)
            .text(text.unwrap_or(DEFAULT_SKIP_LINK_TEXT)),
    )?;
    Ok(Some(link))
}
