// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit orchestrator.
//!
//! An [`Auditor`] owns its configuration, rule registry and issue store.
//! A pass evaluates every applicable rule against the tree, isolating each
//! rule so a failing one cannot abort the others, then appends the whole
//! batch to the store under a single write lock.
//!
//! Passes are additive: running the same tree twice without
//! [`Auditor::clear_issues`] in between records every finding twice. Within
//! one pass a `(rule, node, target)` triple is recorded at most once.

use crate::config::AuditConfig;
use crate::diagnostic::{Diagnostic, IssueStore, Severity};
use crate::error::{AuditError, Result};
use crate::remediation::{FocusTrapGuard, FocusTraps, KeyOutcome, KeyPress};
use crate::report::{self, Report};
use crate::rules::RuleRegistry;
use crate::tree::{InterfaceTree, NodeId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Tree shared between the host and a scheduled pass
pub type SharedTree = Arc<RwLock<InterfaceTree>>;

/// A rule that failed during a pass
#[derive(Debug, Clone, Serialize)]
pub struct RuleFailure {
    pub rule: String,
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Outcome of one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub rules_run: usize,
    pub rules_skipped: usize,
    pub rules_failed: usize,
    pub diagnostics_added: usize,
}

/// Cooperative cancellation flag shared with a scheduled pass
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Handle to a pass scheduled by [`Auditor::audit_on_load`].
///
/// Dropping the handle cancels the pass unless it was detached.
#[derive(Debug)]
pub struct ScheduledPass {
    token: CancellationToken,
    handle: Option<JoinHandle<Option<PassSummary>>>,
}

impl ScheduledPass {
    pub fn cancel(&self) {
        self.token.cancel();
        if let Some(handle) = &self.handle {
            handle.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Wait for the pass; `None` if it was cancelled
    pub async fn wait(mut self) -> Option<PassSummary> {
        let handle = self.handle.take()?;
        handle.await.ok().flatten()
    }

    /// Let the pass run without holding the handle
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for ScheduledPass {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.token.cancel();
            handle.abort();
        }
    }
}

/// Audit engine instance
pub struct Auditor {
    config: AuditConfig,
    registry: RuleRegistry,
    store: RwLock<IssueStore>,
    failures: Mutex<Vec<RuleFailure>>,
    traps: FocusTraps,
}

impl Auditor {
    /// Auditor with the built-in rule catalog
    pub fn new(config: AuditConfig) -> Self {
        Self::with_registry(config, RuleRegistry::with_defaults())
    }

    pub fn with_registry(config: AuditConfig, registry: RuleRegistry) -> Self {
        Self {
            config,
            registry,
            store: RwLock::new(IssueStore::new()),
            failures: Mutex::new(Vec::new()),
            traps: FocusTraps::new(),
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    fn read_store(&self) -> RwLockReadGuard<'_, IssueStore> {
        self.store.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_store(&self) -> RwLockWriteGuard<'_, IssueStore> {
        self.store.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Evaluate every applicable rule and append the findings
    pub fn run_pass(&self, tree: &InterfaceTree) -> PassSummary {
        let started = Instant::now();
        let target_level = self.config.target_level;
        let mut summary = PassSummary::default();
        let mut batch: Vec<Diagnostic> = Vec::new();
        let mut seen: HashSet<(String, Option<NodeId>, String)> = HashSet::new();

        for rule in self.registry.iter() {
            if !rule.applies_to_level(target_level) {
                debug!("Skipping rule {} (level {} above target {})", rule.id(), rule.level(), target_level);
                summary.rules_skipped += 1;
                continue;
            }

            let result = panic::catch_unwind(AssertUnwindSafe(|| rule.evaluate(tree)))
                .unwrap_or_else(|payload| Err(AuditError::rule_failed(rule.id(), panic_message(payload.as_ref()))));

            match result {
                Ok(findings) => {
                    summary.rules_run += 1;
                    debug!("Rule {} produced {} finding(s)", rule.id(), findings.len());
                    for d in findings {
                        if d.guideline_level > target_level {
                            continue;
                        }
                        if seen.insert((d.rule.clone(), d.node, d.target.clone())) {
                            batch.push(d);
                        }
                    }
                }
                Err(e) => {
                    summary.rules_failed += 1;
                    warn!("Rule {} failed, skipping its findings: {}", rule.id(), e);
                    self.failures
                        .lock()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push(RuleFailure {
                            rule: rule.id().to_string(),
                            reason: e.to_string(),
                            at: Utc::now(),
                        });
                }
            }
        }

        summary.diagnostics_added = batch.len();
        self.write_store().extend_batch(batch);

        info!(
            "Audit pass: {} rule(s) run, {} skipped, {} failed, {} issue(s) added in {:?}",
            summary.rules_run,
            summary.rules_skipped,
            summary.rules_failed,
            summary.diagnostics_added,
            started.elapsed()
        );

        if self.config.report_enabled {
            let report = self.generate_report();
            info!(
                "Compliance score {}/100 ({} high, {} medium, {} low)",
                report.score,
                report.counts_by_severity.high,
                report.counts_by_severity.medium,
                report.counts_by_severity.low
            );
        }

        summary
    }

    /// Schedule a pass after the settle delay.
    ///
    /// Returns `None` when monitoring or on-load checks are disabled, or when
    /// called outside a tokio runtime. The tree is read when the pass fires.
    pub fn audit_on_load(self: &Arc<Self>, tree: SharedTree) -> Option<ScheduledPass> {
        if !self.config.monitoring_enabled || !self.config.check_on_load {
            debug!("On-load audit disabled by configuration");
            return None;
        }
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cannot schedule on-load audit without a runtime: {}", e);
                return None;
            }
        };

        let token = CancellationToken::new();
        let task_token = token.clone();
        let auditor = Arc::clone(self);
        let delay = Duration::from_millis(self.config.settle_delay_ms);

        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if task_token.is_cancelled() {
                debug!("On-load audit cancelled before it ran");
                return None;
            }
            let snapshot = tree.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            Some(auditor.run_pass(&snapshot))
        });

        Some(ScheduledPass {
            token,
            handle: Some(handle),
        })
    }

    /// Run a pass in response to user interaction, if enabled
    pub fn audit_on_interaction(&self, tree: &InterfaceTree) -> Option<PassSummary> {
        if self.config.monitoring_enabled && self.config.check_on_interaction {
            Some(self.run_pass(tree))
        } else {
            None
        }
    }

    /// Stored findings, optionally restricted to one severity
    pub fn get_issues(&self, severity: Option<Severity>) -> Vec<Diagnostic> {
        self.read_store()
            .iter()
            .filter(|d| severity.map(|s| d.severity() == s).unwrap_or(true))
            .cloned()
            .collect()
    }

    pub fn clear_issues(&self) {
        self.write_store().clear();
    }

    pub fn calculate_score(&self) -> u32 {
        report::calculate_score(&self.read_store().severity_counts())
    }

    pub fn generate_report(&self) -> Report {
        report::build_report(&self.read_store())
    }

    pub fn rule_failures(&self) -> Vec<RuleFailure> {
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// See [`FocusTraps::trap_focus`]
    pub fn trap_focus(&self, tree: &InterfaceTree, container: NodeId) -> Result<FocusTrapGuard> {
        self.traps.trap_focus(tree, container)
    }

    pub fn handle_key(&self, tree: &mut InterfaceTree, press: &KeyPress) -> KeyOutcome {
        self.traps.handle_key(tree, press)
    }

    pub fn focus_traps(&self) -> &FocusTraps {
        &self.traps
    }
}

impl Default for Auditor {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

impl std::fmt::Debug for Auditor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auditor")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("issues", &self.read_store().len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{GuidelineLevel, Kind};
    use crate::rules::{Rule, RuleCategory};
    use crate::tree::NodeSpec;

    struct Exploding;

    impl Rule for Exploding {
        fn id(&self) -> &str {
            "exploding"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Custom
        }
        fn description(&self) -> &str {
            "panics"
        }
        fn level(&self) -> GuidelineLevel {
            GuidelineLevel::A
        }
        fn evaluate(&self, _tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
            panic!("boom")
        }
    }

    struct Failing;

    impl Rule for Failing {
        fn id(&self) -> &str {
            "failing"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Custom
        }
        fn description(&self) -> &str {
            "returns an error"
        }
        fn level(&self) -> GuidelineLevel {
            GuidelineLevel::A
        }
        fn evaluate(&self, _tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
            Err(AuditError::rule_failed("failing", "tree unreadable"))
        }
    }

    /// Emits the same page-level finding twice plus one AAA finding
    struct Repeating;

    impl Rule for Repeating {
        fn id(&self) -> &str {
            "repeating"
        }
        fn category(&self) -> RuleCategory {
            RuleCategory::Custom
        }
        fn description(&self) -> &str {
            "duplicates"
        }
        fn level(&self) -> GuidelineLevel {
            GuidelineLevel::A
        }
        fn evaluate(&self, _tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
            let d = Diagnostic::new("repeating/page", RuleCategory::Custom, Kind::Info, Severity::Low, "again")
                .with_guideline("2.4.1", GuidelineLevel::A)
                .with_target("document");
            let enhanced = Diagnostic::new("repeating/enhanced", RuleCategory::Custom, Kind::Info, Severity::Low, "aaa")
                .with_guideline("2.4.9", GuidelineLevel::AAA)
                .with_target("document");
            Ok(vec![d.clone(), d, enhanced])
        }
    }

    fn registry(rules: Vec<Box<dyn Rule>>) -> RuleRegistry {
        let mut registry = RuleRegistry::new();
        for rule in rules {
            registry.register(rule);
        }
        registry
    }

    fn page_with_unlabelled_image() -> InterfaceTree {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        tree.append(root, NodeSpec::new("h1").text("Instruments")).unwrap();
        tree.append(root, NodeSpec::new("img").attr("src", "balance.png")).unwrap();
        tree
    }

    #[test]
    fn test_failing_rules_do_not_abort_pass() {
        let auditor = Auditor::with_registry(
            AuditConfig::default(),
            registry(vec![
                Box::new(Exploding),
                Box::new(crate::rules::media::MediaDescriptionRule),
                Box::new(Failing),
            ]),
        );
        let summary = auditor.run_pass(&page_with_unlabelled_image());

        assert_eq!(summary.rules_run, 1);
        assert_eq!(summary.rules_failed, 2);
        assert_eq!(auditor.get_issues(None).len(), 1);

        let failures = auditor.rule_failures();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].rule, "exploding");
        assert!(failures[0].reason.contains("boom"));
        assert!(failures[1].reason.contains("tree unreadable"));
    }

    #[test]
    fn test_duplicates_within_pass_recorded_once() {
        let auditor = Auditor::with_registry(AuditConfig::default(), registry(vec![Box::new(Repeating)]));
        let summary = auditor.run_pass(&InterfaceTree::new());
        assert_eq!(summary.diagnostics_added, 1);
    }

    #[test]
    fn test_same_name_link_groups_kept_apart() {
        let mut tree = InterfaceTree::new();
        let root = tree.root();
        tree.append(root, NodeSpec::new("h1").text("Samples")).unwrap();
        for (href, row) in [("/1", "row-1"), ("/2", "row-1"), ("/3", "row-2"), ("/4", "row-2")] {
            tree.append(
                root,
                NodeSpec::new("a").attr("href", href).attr("aria-describedby", row).text("Edit"),
            )
            .unwrap();
        }

        let auditor = Auditor::default();
        let summary = auditor.run_pass(&tree);
        assert_eq!(summary.diagnostics_added, 2);
        assert!(auditor
            .get_issues(None)
            .iter()
            .all(|d| d.rule == "link-text/duplicate"));
    }

    #[test]
    fn test_findings_above_target_level_dropped() {
        let config = AuditConfig {
            target_level: GuidelineLevel::AAA,
            ..AuditConfig::default()
        };
        let auditor = Auditor::with_registry(config, registry(vec![Box::new(Repeating)]));
        auditor.run_pass(&InterfaceTree::new());
        assert_eq!(auditor.get_issues(None).len(), 2);
    }

    #[test]
    fn test_rules_above_target_level_skipped() {
        let config = AuditConfig {
            target_level: GuidelineLevel::A,
            ..AuditConfig::default()
        };
        let auditor = Auditor::new(config);
        let mut tree = page_with_unlabelled_image();
        tree.append(tree.root(), NodeSpec::new("p").attr("style", "color:#000;background-color:#000").text("x"))
            .unwrap();
        let summary = auditor.run_pass(&tree);
        assert_eq!(summary.rules_skipped, 1);
        assert!(auditor.get_issues(None).iter().all(|d| d.rule != "contrast/identical-colors"));
    }

    #[test]
    fn test_passes_are_additive() {
        let auditor = Auditor::default();
        let tree = page_with_unlabelled_image();
        auditor.run_pass(&tree);
        auditor.run_pass(&tree);
        assert_eq!(auditor.get_issues(Some(Severity::High)).len(), 2);
        assert_eq!(auditor.calculate_score(), 80);

        auditor.clear_issues();
        auditor.run_pass(&tree);
        assert_eq!(auditor.get_issues(None).len(), 1);
    }

    #[test]
    fn test_interaction_pass_respects_config() {
        let tree = page_with_unlabelled_image();
        let disabled = Auditor::new(AuditConfig {
            check_on_interaction: false,
            ..AuditConfig::default()
        });
        assert!(disabled.audit_on_interaction(&tree).is_none());
        assert!(disabled.get_issues(None).is_empty());

        let enabled = Auditor::default();
        assert_eq!(enabled.audit_on_interaction(&tree).map(|s| s.diagnostics_added), Some(1));
    }

    #[test]
    fn test_on_load_outside_runtime_is_none() {
        let auditor = Arc::new(Auditor::default());
        let tree = Arc::new(RwLock::new(InterfaceTree::new()));
        assert!(auditor.audit_on_load(tree).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_load_runs_after_settle_delay() {
        let auditor = Arc::new(Auditor::default());
        let tree: SharedTree = Arc::new(RwLock::new(page_with_unlabelled_image()));
        let pending = auditor.audit_on_load(Arc::clone(&tree)).expect("scheduled");

        assert!(auditor.get_issues(None).is_empty());
        let summary = pending.wait().await.expect("pass ran");
        assert_eq!(summary.diagnostics_added, 1);
        assert_eq!(auditor.calculate_score(), 90);
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_load_reads_tree_at_fire_time() {
        let auditor = Arc::new(Auditor::default());
        let tree: SharedTree = Arc::new(RwLock::new(page_with_unlabelled_image()));
        let pending = auditor.audit_on_load(Arc::clone(&tree)).expect("scheduled");

        {
            let mut guard = tree.write().unwrap();
            let root = guard.root();
            guard.append(root, NodeSpec::new("img").attr("src", "late.png")).unwrap();
        }

        pending.wait().await.expect("pass ran");
        assert_eq!(auditor.get_issues(Some(Severity::High)).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_on_load_never_runs() {
        let auditor = Arc::new(Auditor::default());
        let tree: SharedTree = Arc::new(RwLock::new(page_with_unlabelled_image()));
        let pending = auditor.audit_on_load(tree).expect("scheduled");
        pending.cancel();
        assert!(pending.is_cancelled());
        assert!(pending.wait().await.is_none());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(auditor.get_issues(None).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let auditor = Arc::new(Auditor::default());
        let tree: SharedTree = Arc::new(RwLock::new(page_with_unlabelled_image()));
        let token = {
            let pending = auditor.audit_on_load(tree).expect("scheduled");
            pending.token()
        };
        assert!(token.is_cancelled());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(auditor.get_issues(None).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_load_disabled_by_config() {
        let tree: SharedTree = Arc::new(RwLock::new(InterfaceTree::new()));
        let no_monitoring = Arc::new(Auditor::new(AuditConfig {
            monitoring_enabled: false,
            ..AuditConfig::default()
        }));
        assert!(no_monitoring.audit_on_load(Arc::clone(&tree)).is_none());
        let no_load = Arc::new(Auditor::new(AuditConfig {
            check_on_load: false,
            ..AuditConfig::default()
        }));
        assert!(no_load.audit_on_load(tree).is_none());
    }
}
