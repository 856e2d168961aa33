// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scoring and report generation.
//!
//! The score is `clamp(100 - 10*high - 5*medium - 2*low, 0, 100)`, computed
//! from the current store only. Reports render as:
//! - Text: human-readable summary grouped by severity
//! - JSON: the report plus the diagnostics it was built from
//! - SARIF: Static Analysis Results Interchange Format for IDE/CI integration

use crate::diagnostic::{Diagnostic, IssueStore, LevelCounts, Severity, SeverityCounts};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Scores below this get a general improvement recommendation
pub const RECOMMENDATION_THRESHOLD: u32 = 80;

/// Derived summary of an issue store
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub score: u32,
    pub total_issues: usize,
    pub counts_by_severity: SeverityCounts,
    pub counts_by_guideline_level: LevelCounts,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Score for the given severity counts
pub fn calculate_score(counts: &SeverityCounts) -> u32 {
    let deductions: u64 = Severity::ALL
        .iter()
        .map(|s| counts.get(*s) as u64 * u64::from(s.weight()))
        .sum();
    100u64.saturating_sub(deductions) as u32
}

/// Build a fresh report from the store's current contents
pub fn build_report(store: &IssueStore) -> Report {
    let counts = store.severity_counts();
    let score = calculate_score(&counts);
    Report {
        score,
        total_issues: store.len(),
        counts_by_severity: counts,
        counts_by_guideline_level: store.level_counts(),
        recommendations: recommendations(&counts, score),
        generated_at: Utc::now(),
    }
}

fn recommendations(counts: &SeverityCounts, score: u32) -> Vec<String> {
    let mut out = Vec::new();
    if counts.high > 0 {
        out.push(format!("{} high-severity issues must be fixed", counts.high));
    }
    if counts.medium > 0 {
        out.push(format!("{} medium-severity issues must be fixed", counts.medium));
    }
    if score < RECOMMENDATION_THRESHOLD {
        out.push(format!(
            "Compliance score {} is below {}; review the remaining issues by guideline level",
            score, RECOMMENDATION_THRESHOLD
        ));
    }
    out
}

/// Output format for rendered reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI integration
    Sarif,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Sarif => write!(f, "sarif"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "sarif" => Ok(OutputFormat::Sarif),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

/// Render a report and its diagnostics
pub fn render(report: &Report, issues: &[Diagnostic], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(report, issues),
        OutputFormat::Json => render_json(report, issues),
        OutputFormat::Sarif => render_sarif(issues),
    }
}

fn render_text(report: &Report, issues: &[Diagnostic]) -> String {
    let mut output = String::new();

    output.push_str("=== Accessibility Audit Report ===\n\n");
    output.push_str(&format!("Score: {}/100\n", report.score));

    if issues.is_empty() {
        output.push_str("No accessibility issues found. All checks passed.\n");
        return output;
    }

    let sev = &report.counts_by_severity;
    let lvl = &report.counts_by_guideline_level;
    output.push_str(&format!(
        "Found {} issue(s): {} high, {} medium, {} low\n",
        report.total_issues, sev.high, sev.medium, sev.low
    ));
    output.push_str(&format!(
        "By level: A {}, AA {}, AAA {}\n\n",
        lvl.a, lvl.aa, lvl.aaa
    ));

    for severity in Severity::ALL {
        let group: Vec<&Diagnostic> = issues.iter().filter(|d| d.severity() == severity).collect();
        if group.is_empty() {
            continue;
        }

        output.push_str(&format!("--- {} ({}) ---\n", severity.to_string().to_uppercase(), group.len()));

        for d in group {
            output.push_str(&format!("[{}] {}\n", d.rule, d.message));
            if !d.target.is_empty() {
                output.push_str(&format!("  Target: {}\n", d.target));
            }
            output.push_str(&format!("  WCAG: {} (Level {})\n", d.guideline_id, d.guideline_level));
            if let Some(ref suggestion) = d.suggestion {
                output.push_str(&format!("  Fix: {}\n", suggestion));
            }
            output.push('\n');
        }
    }

    if !report.recommendations.is_empty() {
        output.push_str("Recommendations:\n");
        for r in &report.recommendations {
            output.push_str(&format!("  - {}\n", r));
        }
    }

    output
}

#[derive(Serialize)]
struct JsonReport<'a> {
    report: &'a Report,
    issues: &'a [Diagnostic],
}

fn render_json(report: &Report, issues: &[Diagnostic]) -> String {
    serde_json::to_string_pretty(&JsonReport { report, issues }).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize report: {}\"}}", e)
    })
}

/// SARIF report structure (simplified)
#[derive(Debug, Serialize)]
struct SarifReport {
    #[serde(rename = "$schema")]
    schema: String,
    version: String,
    runs: Vec<SarifRun>,
}

#[derive(Debug, Serialize)]
struct SarifRun {
    tool: SarifTool,
    results: Vec<SarifResult>,
}

#[derive(Debug, Serialize)]
struct SarifTool {
    driver: SarifDriver,
}

#[derive(Debug, Serialize)]
struct SarifDriver {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct SarifResult {
    #[serde(rename = "ruleId")]
    rule_id: String,
    level: String,
    message: SarifMessage,
    locations: Vec<SarifLocation>,
}

#[derive(Debug, Serialize)]
struct SarifMessage {
    text: String,
}

#[derive(Debug, Serialize)]
struct SarifLocation {
    #[serde(rename = "logicalLocations")]
    logical_locations: Vec<SarifLogicalLocation>,
}

#[derive(Debug, Serialize)]
struct SarifLogicalLocation {
    #[serde(rename = "fullyQualifiedName")]
    fully_qualified_name: String,
    kind: String,
}

fn render_sarif(issues: &[Diagnostic]) -> String {
    let results: Vec<SarifResult> = issues
        .iter()
        .map(|d| {
            let level = match d.severity() {
                Severity::High => "error",
                Severity::Medium => "warning",
                Severity::Low => "note",
            };
            SarifResult {
                rule_id: d.rule.clone(),
                level: level.to_string(),
                message: SarifMessage {
                    text: format!("{} (WCAG {} Level {})", d.message, d.guideline_id, d.guideline_level),
                },
                locations: vec![SarifLocation {
                    logical_locations: vec![SarifLogicalLocation {
                        fully_qualified_name: d.target.clone(),
                        kind: "element".to_string(),
                    }],
                }],
            }
        })
        .collect();

    let report = SarifReport {
        schema: "https://json.schemastore.org/sarif-2.1.0.json".to_string(),
        version: "2.1.0".to_string(),
        runs: vec![SarifRun {
            tool: SarifTool {
                driver: SarifDriver {
                    name: "a11y-audit".to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
            results,
        }],
    };

    serde_json::to_string_pretty(&report).unwrap_or_else(|e| {
        format!("{{\"error\": \"Failed to serialize SARIF report: {}\"}}", e)
    })
}
