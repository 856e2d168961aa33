// SPDX-License-Identifier: PMPL-1.0-or-later
//! Auditor configuration

use crate::diagnostic::GuidelineLevel;
use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings fixed for the lifetime of an [`Auditor`](crate::Auditor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Master switch for scheduled and interaction-triggered passes
    pub monitoring_enabled: bool,
    pub check_on_load: bool,
    pub check_on_interaction: bool,
    /// Log a score summary after each pass
    pub report_enabled: bool,
    /// Rules and findings above this level are skipped
    pub target_level: GuidelineLevel,
    /// Delay before the on-load pass runs
    pub settle_delay_ms: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            monitoring_enabled: true,
            check_on_load: true,
            check_on_interaction: true,
            report_enabled: true,
            target_level: GuidelineLevel::AA,
            settle_delay_ms: 1000,
        }
    }
}

/// Load configuration from TOML (`.toml`) or YAML; missing file gives defaults
pub fn load_config(path: &Path) -> Result<AuditConfig> {
    if !path.exists() {
        return Ok(AuditConfig::default());
    }

    let content = std::fs::read_to_string(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::from_str(&content)
            .map_err(|e| AuditError::Config(format!("TOML parse error: {}", e)))
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| AuditError::Config(format!("YAML parse error: {}", e)))
    }
}

pub fn write_default_config(path: &Path) -> Result<()> {
    let config = AuditConfig::default();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = if path.extension().and_then(|s| s.to_str()) == Some("toml") {
        toml::to_string_pretty(&config)
            .map_err(|e| AuditError::Config(format!("TOML serialize error: {}", e)))?
    } else {
        serde_yaml::to_string(&config)?
    };

    std::fs::write(path, content)?;
    Ok(())
}
