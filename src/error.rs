// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for the audit engine

use crate::tree::NodeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuditError>;

#[derive(Error, Debug)]
pub enum AuditError {
    /// The node was removed from the tree (or never belonged to it).
    #[error("Stale target: node {0} is no longer present in the tree")]
    StaleTarget(NodeId),

    #[error("Focus trap already active on node {0}")]
    TrapAlreadyActive(NodeId),

    #[error("Rule '{rule}' failed: {reason}")]
    RuleFailed { rule: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AuditError {
    /// Shorthand used by rules to report an evaluation failure
    pub fn rule_failed(rule: &str, reason: impl Into<String>) -> Self {
        AuditError::RuleFailed {
            rule: rule.to_string(),
            reason: reason.into(),
        }
    }
}
