// SPDX-License-Identifier: PMPL-1.0-or-later
//! Interface tree model inspected by the audit rules.
//!
//! The tree is an arena of nodes addressed by [`NodeId`]. Removing a node
//! frees its slot, so a stale id held by a caller is detected instead of
//! silently pointing at another node.
//!
//! Besides structural access the tree answers the classification questions
//! the rules ask: is this node image-like, a heading, a link, a control, a
//! form field, focusable, a dialog container.

use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag of the nodes that hold a run of text between elements
pub const TEXT_TAG: &str = "#text";

/// Tags that take keyboard focus without an explicit tabindex
const NATIVE_FOCUSABLE: &[&str] = &["button", "select", "textarea", "summary", "iframe"];

/// Input types that are not data-entry fields
const NON_FIELD_INPUT_TYPES: &[&str] = &["hidden", "submit", "reset", "button", "image"];

/// Input types rendered as push buttons
const BUTTON_INPUT_TYPES: &[&str] = &["submit", "reset", "button", "image"];

const CONTROL_ROLES: &[&str] = &[
    "button", "checkbox", "switch", "tab", "menuitem", "radio", "option", "slider",
];

const FIELD_ROLES: &[&str] = &["textbox", "combobox", "listbox", "searchbox", "spinbutton"];

/// Handle to a node inside an [`InterfaceTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single inspectable node
#[derive(Debug, Clone)]
pub struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Attribute value trimmed, `None` when missing or blank
    pub fn non_empty_attr(&self, name: &str) -> Option<&str> {
        self.attr(name).map(str::trim).filter(|v| !v.is_empty())
    }

    /// Attribute equals `true` (case-insensitive)
    pub fn attr_is_true(&self, name: &str) -> bool {
        self.attr(name)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set_attr(&mut self, name: &str, value: &str) {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        self.attributes.remove(name)
    }

    /// The node's own text, excluding descendants
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn role(&self) -> Option<&str> {
        self.non_empty_attr("role")
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.role()
            .map(|r| r.split_whitespace().any(|r| r.eq_ignore_ascii_case(role)))
            .unwrap_or(false)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Short human-readable descriptor, e.g. `button#save.primary`
    pub fn descriptor(&self) -> String {
        let mut out = self.tag.clone();
        if let Some(id) = self.non_empty_attr("id") {
            out.push('#');
            out.push_str(id);
        }
        if let Some(class) = self.attr("class") {
            for c in class.split_whitespace().take(2) {
                out.push('.');
                out.push_str(c);
            }
        }
        out
    }
}

/// Description of a node to insert into the tree
#[derive(Debug, Clone, Default)]
pub struct NodeSpec {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
}

impl NodeSpec {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }
}

/// Arena-backed tree of inspectable nodes
#[derive(Debug, Clone)]
pub struct InterfaceTree {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    origin: Option<String>,
    focused: Option<NodeId>,
}

impl Default for InterfaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceTree {
    /// Create a tree holding only a `#document` root
    pub fn new() -> Self {
        let root = Node {
            tag: "#document".to_string(),
            attributes: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
        };
        Self {
            nodes: vec![Some(root)],
            root: NodeId(0),
            origin: None,
            focused: None,
        }
    }

    /// Set the page origin used to classify off-origin links
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = Some(origin.to_string());
        self
    }

    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The `body` node when present, otherwise the root
    pub fn body(&self) -> NodeId {
        self.descendants(self.root)
            .into_iter()
            .find(|id| self.tag(*id) == Some("body"))
            .unwrap_or(self.root)
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Like [`get`](Self::get) but fails with [`AuditError::StaleTarget`]
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(AuditError::StaleTarget(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or(AuditError::StaleTarget(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Append a child at the end of `parent`'s children
    pub fn append(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        self.insert(parent, spec, false)
    }

    /// Insert a child before all of `parent`'s existing children
    pub fn prepend(&mut self, parent: NodeId, spec: NodeSpec) -> Result<NodeId> {
        self.insert(parent, spec, true)
    }

    fn insert(&mut self, parent: NodeId, spec: NodeSpec, front: bool) -> Result<NodeId> {
        self.node(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Node {
            tag: spec.tag,
            attributes: spec.attributes,
            text: spec.text,
            children: Vec::new(),
            parent: Some(parent),
        }));
        let parent_node = self.node_mut(parent)?;
        if front {
            parent_node.children.insert(0, id);
        } else {
            parent_node.children.push(id);
        }
        Ok(id)
    }

    /// Remove a node and its subtree. Removing the root empties the tree.
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        let mut doomed = self.descendants(id);
        if id == self.root {
            if let Some(root) = self.get_mut(id) {
                root.children.clear();
            }
        } else {
            doomed.push(id);
            if let Some(parent) = parent.and_then(|p| self.get_mut(p)) {
                parent.children.retain(|c| *c != id);
            }
        }
        for d in doomed {
            self.nodes[d.0] = None;
            if self.focused == Some(d) {
                self.focused = None;
            }
        }
        Ok(())
    }

    /// All nodes below `id` in document order (pre-order), excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.get(id) {
            Some(node) => node.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(next) = stack.pop() {
            if let Some(node) = self.get(next) {
                out.push(next);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Every node in document order, excluding the root
    pub fn walk(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.get(id).and_then(Node::parent);
        while let Some(p) = current {
            out.push(p);
            current = self.get(p).and_then(Node::parent);
        }
        out
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(Node::tag)
    }

    /// Whitespace-normalised text of the node and all its descendants
    pub fn text_content(&self, id: NodeId) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(node) = self.get(id) {
            parts.push(node.text());
        }
        for d in self.descendants(id) {
            if let Some(node) = self.get(d) {
                parts.push(node.text());
            }
        }
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// First node whose `id` attribute equals `html_id`
    pub fn find_by_id(&self, html_id: &str) -> Option<NodeId> {
        self.walk()
            .into_iter()
            .find(|n| self.get(*n).and_then(|node| node.attr("id")) == Some(html_id))
    }

    /// Human-readable descriptor for diagnostics
    pub fn describe(&self, id: NodeId) -> String {
        match self.get(id) {
            Some(node) => node.descriptor(),
            None => format!("<removed {}>", id),
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn focus(&mut self, id: NodeId) -> Result<()> {
        self.node(id)?;
        self.focused = Some(id);
        Ok(())
    }

    pub fn blur(&mut self) {
        self.focused = None;
    }

    pub fn is_image_like(&self, id: NodeId) -> bool {
        self.get(id)
            .map(|n| matches!(n.tag(), "img" | "svg" | "canvas" | "picture") || n.has_role("img"))
            .unwrap_or(false)
    }

    /// Heading level 1..=6 for `h1`-`h6` or `role="heading"` (default level 2)
    pub fn heading_level(&self, id: NodeId) -> Option<u8> {
        let node = self.get(id)?;
        if let Some(level) = node
            .tag()
            .strip_prefix('h')
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|l| (1..=6).contains(l))
        {
            return Some(level);
        }
        if node.has_role("heading") {
            let level = node
                .attr("aria-level")
                .and_then(|l| l.trim().parse::<u8>().ok())
                .unwrap_or(2);
            return Some(level.clamp(1, 6));
        }
        None
    }

    pub fn is_link(&self, id: NodeId) -> bool {
        self.get(id)
            .map(|n| (n.tag() == "a" && n.has_attr("href")) || n.has_role("link"))
            .unwrap_or(false)
    }

    /// Buttons and widgets that need an accessible name
    pub fn is_control(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if node.tag() == "button" {
            return true;
        }
        if node.tag() == "input" {
            let kind = node.attr("type").unwrap_or("text").to_ascii_lowercase();
            return BUTTON_INPUT_TYPES.contains(&kind.as_str());
        }
        CONTROL_ROLES.iter().any(|r| node.has_role(r))
    }

    /// Data-entry fields that need an associated label
    pub fn is_form_field(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        match node.tag() {
            "select" | "textarea" => true,
            "input" => {
                let kind = node.attr("type").unwrap_or("text").to_ascii_lowercase();
                !NON_FIELD_INPUT_TYPES.contains(&kind.as_str())
            }
            _ => FIELD_ROLES.iter().any(|r| node.has_role(r)),
        }
    }

    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.get(id)
            .map(|n| n.has_attr("disabled") || n.attr_is_true("aria-disabled"))
            .unwrap_or(false)
    }

    /// Parsed `tabindex`, if any
    pub fn tab_index(&self, id: NodeId) -> Option<i32> {
        self.get(id)
            .and_then(|n| n.attr("tabindex"))
            .and_then(|v| v.trim().parse::<i32>().ok())
    }

    /// Reachable with the Tab key
    pub fn is_focusable(&self, id: NodeId) -> bool {
        let Some(node) = self.get(id) else {
            return false;
        };
        if self.is_disabled(id) || node.attr_is_true("aria-hidden") {
            return false;
        }
        if let Some(index) = self.tab_index(id) {
            return index >= 0;
        }
        match node.tag() {
            "a" => node.has_attr("href"),
            "input" => node.attr("type").map(|t| !t.eq_ignore_ascii_case("hidden")).unwrap_or(true),
            tag if NATIVE_FOCUSABLE.contains(&tag) => true,
            _ => node.attr_is_true("contenteditable"),
        }
    }

    pub fn focusable_descendants(&self, id: NodeId) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|d| self.is_focusable(*d))
            .collect()
    }

    /// Modal or dialog container
    pub fn is_dialog(&self, id: NodeId) -> bool {
        self.get(id)
            .map(|n| {
                n.tag() == "dialog"
                    || n.has_role("dialog")
                    || n.has_role("alertdialog")
                    || n.attr_is_true("aria-modal")
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (InterfaceTree, NodeId, NodeId, NodeId) {
        let mut tree = InterfaceTree::new();
        let body = tree.append(tree.root(), NodeSpec::new("body")).unwrap();
        let nav = tree.append(body, NodeSpec::new("nav")).unwrap();
        let link = tree
            .append(nav, NodeSpec::new("a").attr("href", "/home").text("Home"))
            .unwrap();
        (tree, body, nav, link)
    }

    #[test]
    fn test_descendants_in_document_order() {
        let (mut tree, body, nav, link) = sample();
        let main = tree.append(body, NodeSpec::new("main")).unwrap();
        assert_eq!(tree.descendants(body), vec![nav, link, main]);
    }

    #[test]
    fn test_prepend_puts_node_first() {
        let (mut tree, body, nav, _) = sample();
        let first = tree.prepend(body, NodeSpec::new("a")).unwrap();
        assert_eq!(tree.node(body).unwrap().children(), &[first, nav]);
    }

    #[test]
    fn test_remove_makes_ids_stale() {
        let (mut tree, _, nav, link) = sample();
        tree.remove(nav).unwrap();
        assert!(!tree.contains(nav));
        assert!(!tree.contains(link));
        assert!(matches!(tree.node(link), Err(AuditError::StaleTarget(id)) if id == link));
    }

    #[test]
    fn test_remove_clears_focus() {
        let (mut tree, _, nav, link) = sample();
        tree.focus(link).unwrap();
        tree.remove(nav).unwrap();
        assert_eq!(tree.focused(), None);
    }

    #[test]
    fn test_text_content_normalises_whitespace() {
        let mut tree = InterfaceTree::new();
        let p = tree
            .append(tree.root(), NodeSpec::new("p").text("  Hello \n"))
            .unwrap();
        tree.append(p, NodeSpec::new("strong").text(" world ")).unwrap();
        assert_eq!(tree.text_content(p), "Hello world");
    }

    #[test]
    fn test_text_nodes_keep_document_order() {
        let mut tree = InterfaceTree::new();
        let a = tree.append(tree.root(), NodeSpec::new("a")).unwrap();
        let b = tree.append(a, NodeSpec::new("b")).unwrap();
        tree.append(b, NodeSpec::new(TEXT_TAG).text("Read")).unwrap();
        let run = tree.append(a, NodeSpec::new(TEXT_TAG).text("more")).unwrap();
        assert_eq!(tree.text_content(a), "Read more");
        assert!(tree.node(run).unwrap().is_text());
        assert!(!tree.node(b).unwrap().is_text());
    }

    #[test]
    fn test_heading_levels() {
        let mut tree = InterfaceTree::new();
        let h3 = tree.append(tree.root(), NodeSpec::new("h3")).unwrap();
        let aria = tree
            .append(tree.root(), NodeSpec::new("div").attr("role", "heading").attr("aria-level", "4"))
            .unwrap();
        let plain = tree.append(tree.root(), NodeSpec::new("div")).unwrap();
        assert_eq!(tree.heading_level(h3), Some(3));
        assert_eq!(tree.heading_level(aria), Some(4));
        assert_eq!(tree.heading_level(plain), None);
    }

    #[test]
    fn test_focusable_rules() {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        let button = tree.append(root, NodeSpec::new("button")).unwrap();
        let disabled = tree.append(root, NodeSpec::new("button").attr("disabled", "")).unwrap();
        let anchor = tree.append(root, NodeSpec::new("a")).unwrap();
        let div = tree.append(root, NodeSpec::new("div").attr("tabindex", "0")).unwrap();
        let negative = tree.append(root, NodeSpec::new("input").attr("tabindex", "-1")).unwrap();
        let hidden = tree.append(root, NodeSpec::new("input").attr("type", "hidden")).unwrap();

        assert!(tree.is_focusable(button));
        assert!(!tree.is_focusable(disabled));
        assert!(!tree.is_focusable(anchor));
        assert!(tree.is_focusable(div));
        assert!(!tree.is_focusable(negative));
        assert!(!tree.is_focusable(hidden));
    }

    #[test]
    fn test_body_falls_back_to_root() {
        let tree = InterfaceTree::new();
        assert_eq!(tree.body(), tree.root());
        let (tree, body, _, _) = sample();
        assert_eq!(tree.body(), body);
    }

    #[test]
    fn test_find_by_id_and_descriptor() {
        let mut tree = InterfaceTree::new();
        let save = tree
            .append(tree.root(), NodeSpec::new("button").attr("id", "save").attr("class", "btn primary"))
            .unwrap();
        assert_eq!(tree.find_by_id("save"), Some(save));
        assert_eq!(tree.describe(save), "button#save.btn.primary");
    }
}
