// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Metrics facade for host operations.
//!
//! Only records through the `metrics` macros; installing an exporter is up
//! to the embedding agent.

use std::time::Duration;

/// Count one per-VM migration by outcome
/// (`migrated`, `skipped`, `failed`, `timeout`).
pub fn record_migration(outcome: &'static str) {
    ::metrics::counter!("hostops_migrations_total", "outcome" => outcome).increment(1);
}

pub fn record_migration_duration(elapsed: Duration) {
    ::metrics::histogram!("hostops_migration_seconds").record(elapsed.as_secs_f64());
}

/// Instances still on `host` after a drain pass.
pub fn record_drain_remaining(host: &str, remaining: usize) {
    ::metrics::gauge!("hostops_drain_remaining", "host" => host.to_string()).set(remaining as f64);
}
