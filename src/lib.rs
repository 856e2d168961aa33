// SPDX-License-Identifier: PMPL-1.0-or-later
//! a11y-audit - rule-based accessibility compliance audit engine
//!
//! Inspects an [`InterfaceTree`] against a catalog of WCAG-aligned rules,
//! accumulates findings, computes a 0-100 compliance score and offers small
//! remediation helpers that fix a tree in place.
//!
//! ## Rules
//!
//! - **Media description** (1.1.1): images need a description or a decorative marker
//! - **Heading structure** (1.3.1): no skipped levels, exactly one top-level heading
//! - **Link text** (2.4.4): descriptive, distinct link names
//! - **Control label** (4.1.2): interactive controls need an accessible name
//! - **Form field** (1.3.1): fields need an associated label
//! - **Contrast** (1.4.3): foreground and background must differ
//! - **Tab order** (2.4.3): explicit tab indices must follow document order
//! - **Focus container** (2.1.2): dialogs must contain something focusable
//!
//! ## Example
//!
//! ```
//! use a11y_audit::{Auditor, AuditConfig, InterfaceTree, NodeSpec};
//!
//! let mut tree = InterfaceTree::new();
//! let root = tree.root();
//! tree.append(root, NodeSpec::new("h1").text("Home")).unwrap();
//! tree.append(root, NodeSpec::new("img").attr("src", "hero.png")).unwrap();
//!
//! let auditor = Auditor::new(AuditConfig::default());
//! auditor.run_pass(&tree);
//! assert_eq!(auditor.calculate_score(), 90);
//! ```

pub mod auditor;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod remediation;
pub mod report;
pub mod rules;
pub mod snapshot;
pub mod tree;

pub use auditor::{Auditor, CancellationToken, PassSummary, RuleFailure, ScheduledPass, SharedTree};
pub use config::AuditConfig;
pub use diagnostic::{Diagnostic, GuidelineLevel, IssueStore, Kind, Severity};
pub use error::{AuditError, Result};
pub use report::{OutputFormat, Report};
pub use rules::{Rule, RuleCategory, RuleRegistry};
pub use tree::{InterfaceTree, NodeId, NodeSpec};
