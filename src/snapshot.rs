// SPDX-License-Identifier: PMPL-1.0-or-later
//! HTML snapshots.
//!
//! Converts a rendered HTML document into an [`InterfaceTree`] and finds
//! snapshot files under a directory.

use crate::error::Result;
use crate::tree::{InterfaceTree, NodeId, NodeSpec, TEXT_TAG};
use scraper::{ElementRef, Html};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Snapshot file extensions
const SNAPSHOT_EXTENSIONS: &[&str] = &["html", "htm"];

/// Directories to skip
const SKIP_DIRS: &[&str] = &["node_modules", ".git", "target", "dist", "build"];

/// Elements whose text is not content
const OPAQUE_ELEMENTS: &[&str] = &["script", "style", "template", "noscript"];

/// Source node waiting to be copied under an already created parent
enum Pending<'a> {
    Element(ElementRef<'a>, NodeId),
    Text(&'a str, NodeId),
}

/// Build a tree from an HTML document.
///
/// Text runs become `#text` children so mixed content keeps its order.
pub fn from_html(html: &str) -> InterfaceTree {
    let document = Html::parse_document(html);
    let mut tree = InterfaceTree::new();
    let root = tree.root();
    // Every parent on the stack was created by this loop and cannot go stale
    if let Err(e) = copy_document(document.root_element(), &mut tree, root) {
        debug!("Snapshot conversion stopped early: {}", e);
    }
    tree
}

fn copy_document(top: ElementRef<'_>, tree: &mut InterfaceTree, root: NodeId) -> Result<()> {
    let mut stack = vec![Pending::Element(top, root)];

    while let Some(pending) = stack.pop() {
        match pending {
            Pending::Text(text, parent) => {
                tree.append(parent, NodeSpec::new(TEXT_TAG).text(text))?;
            }
            Pending::Element(element, parent) => {
                let value = element.value();
                let tag = value.name();
                let mut spec = NodeSpec::new(tag);
                for (name, attr) in value.attrs() {
                    spec = spec.attr(name, attr);
                }
                let id = tree.append(parent, spec)?;

                if OPAQUE_ELEMENTS.contains(&tag) {
                    continue;
                }

                let first_child = stack.len();
                for child in element.children() {
                    if let Some(child_element) = ElementRef::wrap(child) {
                        stack.push(Pending::Element(child_element, id));
                    } else if let Some(text) = child.value().as_text() {
                        let text: &str = text;
                        let text = text.trim();
                        if !text.is_empty() {
                            stack.push(Pending::Text(text, id));
                        }
                    }
                }
                // pop in document order
                stack[first_child..].reverse();
            }
        }
    }
    Ok(())
}

/// Read and convert one snapshot file
pub fn load_snapshot(path: &Path) -> Result<InterfaceTree> {
    let html = std::fs::read_to_string(path)?;
    let tree = from_html(&html);
    debug!("Loaded {} ({} nodes)", path.display(), tree.len());
    Ok(tree)
}

/// Snapshot files under `path`, sorted; a file path yields itself
pub fn snapshot_files(path: &Path) -> Vec<PathBuf> {
    if path.is_file() {
        return vec![path.to_path_buf()];
    }

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 || !e.file_type().is_dir() {
                return true;
            }
            let name = e.file_name().to_str().unwrap_or("");
            !SKIP_DIRS.contains(&name) && !name.starts_with('.')
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| SNAPSHOT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    info!("Found {} snapshot(s) under {}", files.len(), path.display());
    files
}
