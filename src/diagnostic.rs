// SPDX-License-Identifier: PMPL-1.0-or-later
//! Diagnostic model: one audit finding and the store that accumulates them.
//!
//! `severity` drives the score (see [`Severity::weight`]); the guideline
//! level is only used to group findings in reports.

use crate::rules::RuleCategory;
use crate::tree::{InterfaceTree, NodeId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Kind::Error => write!(f, "error"),
            Kind::Warning => write!(f, "warning"),
            Kind::Info => write!(f, "info"),
        }
    }
}

/// Scoring weight of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Points deducted from the score per finding
    pub fn weight(&self) -> u32 {
        match self {
            Severity::High => 10,
            Severity::Medium => 5,
            Severity::Low => 2,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" => Ok(Severity::High),
            "medium" => Ok(Severity::Medium),
            "low" => Ok(Severity::Low),
            other => Err(format!("Unknown severity: {}", other)),
        }
    }
}

/// WCAG conformance level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GuidelineLevel {
    /// Level A - minimum conformance
    A,
    /// Level AA - standard conformance
    AA,
    /// Level AAA - enhanced conformance
    AAA,
}

impl std::fmt::Display for GuidelineLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuidelineLevel::A => write!(f, "A"),
            GuidelineLevel::AA => write!(f, "AA"),
            GuidelineLevel::AAA => write!(f, "AAA"),
        }
    }
}

/// One structured audit finding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub id: Uuid,
    /// Stable check identifier, e.g. `link-text/duplicate`
    pub rule: String,
    pub category: RuleCategory,
    pub kind: Kind,
    /// Human-readable description of the offending node
    pub target: String,
    /// Offending node, absent for page-level findings
    pub node: Option<NodeId>,
    pub message: String,
    pub guideline_level: GuidelineLevel,
    /// WCAG success criterion, e.g. `1.1.1`
    pub guideline_id: String,
    pub suggestion: Option<String>,
    severity: Severity,
    pub created_at: DateTime<Utc>,
}

impl Diagnostic {
    pub fn new(
        rule: &str,
        category: RuleCategory,
        kind: Kind,
        severity: Severity,
        message: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            rule: rule.to_string(),
            category,
            kind,
            target: String::new(),
            node: None,
            message: message.to_string(),
            guideline_level: GuidelineLevel::A,
            guideline_id: String::new(),
            suggestion: None,
            severity,
            created_at: Utc::now(),
        }
    }

    pub fn with_guideline(mut self, id: &str, level: GuidelineLevel) -> Self {
        self.guideline_id = id.to_string();
        self.guideline_level = level;
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Point the finding at a node in `tree`
    pub fn at_node(mut self, tree: &InterfaceTree, id: NodeId) -> Self {
        self.target = tree.describe(id);
        self.node = Some(id);
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }

    /// Set once by the rule that created the finding
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

/// Per-severity tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

/// Per-guideline-level tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCounts {
    #[serde(rename = "A")]
    pub a: usize,
    #[serde(rename = "AA")]
    pub aa: usize,
    #[serde(rename = "AAA")]
    pub aaa: usize,
}

/// Ordered, append-only collection of diagnostics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueStore {
    issues: Vec<Diagnostic>,
}

impl IssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.issues.push(diagnostic);
    }

    /// Append a fully materialised batch
    pub fn extend_batch(&mut self, batch: Vec<Diagnostic>) {
        self.issues.extend(batch);
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.issues.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.issues
    }

    pub fn by_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.issues.iter().filter(|d| d.severity() == severity).collect()
    }

    pub fn by_level(&self, level: GuidelineLevel) -> Vec<&Diagnostic> {
        self.issues.iter().filter(|d| d.guideline_level == level).collect()
    }

    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for d in &self.issues {
            match d.severity() {
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    pub fn level_counts(&self) -> LevelCounts {
        let mut counts = LevelCounts::default();
        for d in &self.issues {
            match d.guideline_level {
                GuidelineLevel::A => counts.a += 1,
                GuidelineLevel::AA => counts.aa += 1,
                GuidelineLevel::AAA => counts.aaa += 1,
            }
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diag(severity: Severity, level: GuidelineLevel) -> Diagnostic {
        Diagnostic::new("test/check", RuleCategory::MediaDescription, Kind::Error, severity, "msg")
            .with_guideline("1.1.1", level)
    }

    #[test]
    fn test_severity_weights() {
        assert_eq!(Severity::High.weight(), 10);
        assert_eq!(Severity::Medium.weight(), 5);
        assert_eq!(Severity::Low.weight(), 2);
    }

    #[test]
    fn test_guideline_level_ordering() {
        assert!(GuidelineLevel::A < GuidelineLevel::AA);
        assert!(GuidelineLevel::AA < GuidelineLevel::AAA);
    }

    #[test]
    fn test_store_counts() {
        let mut store = IssueStore::new();
        store.push(diag(Severity::High, GuidelineLevel::A));
        store.push(diag(Severity::High, GuidelineLevel::AA));
        store.push(diag(Severity::Low, GuidelineLevel::A));

        let sev = store.severity_counts();
        assert_eq!((sev.high, sev.medium, sev.low), (2, 0, 1));
        let lvl = store.level_counts();
        assert_eq!((lvl.a, lvl.aa, lvl.aaa), (2, 1, 0));
        assert_eq!(store.by_severity(Severity::High).len(), 2);
    }

    #[test]
    fn test_store_clear() {
        let mut store = IssueStore::new();
        store.extend_batch(vec![diag(Severity::Medium, GuidelineLevel::A)]);
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_diagnostic_serializes_lowercase() {
        let d = diag(Severity::Medium, GuidelineLevel::AA);
        let json = serde_json::to_value(&d).expect("serializable");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["kind"], "error");
        assert_eq!(json["guideline_level"], "AA");
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("HIGH".parse::<Severity>().unwrap(), Severity::High);
        assert!("urgent".parse::<Severity>().is_err());
    }
}
