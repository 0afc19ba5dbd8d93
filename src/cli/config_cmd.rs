// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Config CLI subcommands: show, defaults, validate.
//!
//! These commands read configuration directly from environment variables
//! without requiring a running agent.

use super::{EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_OK};
use crate::config::{self, EffectiveConfig, EnvConfig};
use crate::host::DEFAULT_COMPUTE_BINARY;

/// Print effective config as key-value pairs to stdout, or as JSON.
pub fn run_show(json: bool) -> i32 {
    let cfg = config::load().effective_config();
    if json {
        match serde_json::to_string_pretty(&cfg) {
            Ok(out) => println!("{}", out),
            Err(e) => {
                eprintln!("Error: {}", e);
                return EXIT_FAILURE;
            }
        }
    } else {
        print_config(&cfg);
    }
    EXIT_OK
}

/// Print default config values (no env overrides) to stdout.
pub fn run_defaults() {
    println!("{}=", config::ENV_MY_IP);
    println!("{}={}", config::ENV_COMPUTE_BINARY, DEFAULT_COMPUTE_BINARY);
    println!("{}={}", config::ENV_MIGRATION_POLL_MS, config::DEFAULT_MIGRATION_POLL_MS);
    println!("{}={}", config::ENV_MIGRATION_TIMEOUT, config::DEFAULT_MIGRATION_TIMEOUT_SECS);
    println!("{}=", config::ENV_VARIANT_TABLE);
    println!("{}={}", config::ENV_LOG_LEVEL, config::DEFAULT_LOG_LEVEL);
    println!("{}=json", config::ENV_LOG_FORMAT);
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 1 if any warnings are found, 2 if the variant table
/// cannot be loaded.
pub fn run_validate() -> i32 {
    let env = config::load();
    if let Err(e) = env.variant_table() {
        eprintln!("ERROR: variant table: {}", e);
        return EXIT_CONFIG_ERROR;
    }

    let warnings = collect_warnings(&env);
    for warning in &warnings {
        eprintln!("WARNING: {}", warning);
    }

    if warnings.is_empty() {
        println!("Configuration is valid.");
        EXIT_OK
    } else {
        EXIT_FAILURE
    }
}

fn collect_warnings(env: &EnvConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let host_ops = &env.host_ops;

    if host_ops.migration_poll_interval >= host_ops.migration_timeout {
        warnings.push(format!(
            "{} ({} ms) >= {} ({} s); a migration gets a single poll",
            config::ENV_MIGRATION_POLL_MS,
            host_ops.migration_poll_interval.as_millis(),
            config::ENV_MIGRATION_TIMEOUT,
            host_ops.migration_timeout.as_secs()
        ));
    }

    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&env.log.level) {
        warnings.push(format!("{} is not a valid filter: {}", config::ENV_LOG_LEVEL, e));
    }

    warnings
}

fn print_config(cfg: &EffectiveConfig) {
    for line in render_config(cfg) {
        println!("{}", line);
    }
}

fn render_config(cfg: &EffectiveConfig) -> Vec<String> {
    vec![
        format!("{}={}", config::ENV_MY_IP, cfg.my_ip.as_deref().unwrap_or("")),
        format!("{}={}", config::ENV_COMPUTE_BINARY, cfg.compute_binary),
        format!("{}={}", config::ENV_MIGRATION_POLL_MS, cfg.migration_poll_ms),
        format!("{}={}", config::ENV_MIGRATION_TIMEOUT, cfg.migration_timeout_secs),
        format!("{}={}", config::ENV_VARIANT_TABLE, cfg.variant_table.as_deref().unwrap_or("")),
        format!("{}={}", config::ENV_LOG_LEVEL, cfg.log_level),
        format!("{}={}", config::ENV_LOG_FORMAT, cfg.log_format),
    ]
}
