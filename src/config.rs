// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Agent configuration loading from environment variables.
//!
//! All configuration values are loaded from `HV_HOSTOPS_*` environment
//! variables with sensible defaults. Invalid values fall back to defaults
//! without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `HV_HOSTOPS_MY_IP` | unset | Management IP reported for the host |
//! | `HV_HOSTOPS_COMPUTE_BINARY` | nova-compute | Service toggled by maintenance mode |
//! | `HV_HOSTOPS_MIGRATION_POLL_MS` | 1000 | Sleep between migration polls (ms) |
//! | `HV_HOSTOPS_MIGRATION_TIMEOUT` | 3600 | Per-VM migration wait bound (secs) |
//! | `HV_HOSTOPS_VARIANT_TABLE` | unset | TOML file replacing the built-in table |
//! | `HV_HOSTOPS_LOG_LEVEL` | info | Log filter directive |
//! | `HV_HOSTOPS_LOG_FORMAT` | json | `json` or `pretty` |

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::capability::{CapabilityError, VariantTable};
use crate::host::{HostOpsConfig, DEFAULT_COMPUTE_BINARY};
use crate::telemetry::{LogConfig, LogFormat};

pub const ENV_MY_IP: &str = "HV_HOSTOPS_MY_IP";
pub const ENV_COMPUTE_BINARY: &str = "HV_HOSTOPS_COMPUTE_BINARY";
pub const ENV_MIGRATION_POLL_MS: &str = "HV_HOSTOPS_MIGRATION_POLL_MS";
pub const ENV_MIGRATION_TIMEOUT: &str = "HV_HOSTOPS_MIGRATION_TIMEOUT";
pub const ENV_VARIANT_TABLE: &str = "HV_HOSTOPS_VARIANT_TABLE";
pub const ENV_LOG_LEVEL: &str = "HV_HOSTOPS_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "HV_HOSTOPS_LOG_FORMAT";

pub const DEFAULT_MIGRATION_POLL_MS: u64 = 1000;
pub const DEFAULT_MIGRATION_TIMEOUT_SECS: u64 = 3600;
pub const DEFAULT_LOG_LEVEL: &str = "info";

const MIN_MIGRATION_POLL_MS: u64 = 10;
const MIN_MIGRATION_TIMEOUT_SECS: u64 = 1;

/// Effective agent configuration summary (serializable).
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub my_ip: Option<String>,
    pub compute_binary: String,
    pub migration_poll_ms: u64,
    pub migration_timeout_secs: u64,
    pub variant_table: Option<String>,
    pub log_level: String,
    pub log_format: String,
}

/// All agent configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub host_ops: HostOpsConfig,
    /// Replacement for the built-in variant table, if configured.
    pub variant_table_path: Option<PathBuf>,
    pub log: LogConfig,
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Read a non-empty string env var.
fn parse_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn load_host_ops_config() -> HostOpsConfig {
    let my_ip = parse_string(ENV_MY_IP).and_then(|raw| match raw.parse::<IpAddr>() {
        Ok(ip) => Some(ip),
        Err(_) => {
            tracing::warn!(value = %raw, "ignoring invalid {}", ENV_MY_IP);
            None
        }
    });
    let compute_binary =
        parse_string(ENV_COMPUTE_BINARY).unwrap_or_else(|| DEFAULT_COMPUTE_BINARY.to_string());
    let poll_ms = parse_u64(ENV_MIGRATION_POLL_MS, DEFAULT_MIGRATION_POLL_MS);
    let timeout_secs = parse_u64(ENV_MIGRATION_TIMEOUT, DEFAULT_MIGRATION_TIMEOUT_SECS);
    let poll_ms = poll_ms.max(MIN_MIGRATION_POLL_MS);
    let timeout_secs = timeout_secs.max(MIN_MIGRATION_TIMEOUT_SECS);

    HostOpsConfig {
        my_ip,
        compute_binary,
        migration_poll_interval: Duration::from_millis(poll_ms),
        migration_timeout: Duration::from_secs(timeout_secs),
    }
}

fn load_log_config() -> LogConfig {
    let level = parse_string(ENV_LOG_LEVEL).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let format = parse_string(ENV_LOG_FORMAT)
        .and_then(|raw| raw.parse::<LogFormat>().ok())
        .unwrap_or_default();
    LogConfig {
        format,
        level,
        output_path: None,
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    EnvConfig {
        host_ops: load_host_ops_config(),
        variant_table_path: parse_string(ENV_VARIANT_TABLE).map(PathBuf::from),
        log: load_log_config(),
    }
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            my_ip: self.host_ops.my_ip.map(|ip| ip.to_string()),
            compute_binary: self.host_ops.compute_binary.clone(),
            migration_poll_ms: self.host_ops.migration_poll_interval.as_millis() as u64,
            migration_timeout_secs: self.host_ops.migration_timeout.as_secs(),
            variant_table: self
                .variant_table_path
                .as_ref()
                .map(|p| p.display().to_string()),
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str().to_string(),
        }
    }

    /// The configured variant table, or the built-in Hyper-V table.
    pub fn variant_table(&self) -> Result<VariantTable, CapabilityError> {
        match &self.variant_table_path {
            Some(path) => VariantTable::from_file(path),
            None => Ok(VariantTable::hyperv()),
        }
    }
}

/// Serializes tests that mutate `HV_HOSTOPS_*` variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
pub(crate) fn clear_env_vars() {
    for k in [
        ENV_MY_IP,
        ENV_COMPUTE_BINARY,
        ENV_MIGRATION_POLL_MS,
        ENV_MIGRATION_TIMEOUT,
        ENV_VARIANT_TABLE,
        ENV_LOG_LEVEL,
        ENV_LOG_FORMAT,
    ] {
        std::env::remove_var(k);
    }
}
