// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Telemetry for host operations.
//!
//! Structured logging through `tracing`, maintenance spans, and counters
//! through the `metrics` facade.

mod logging;
mod metrics;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use metrics::{record_drain_remaining, record_migration, record_migration_duration};
pub use spans::{MaintenanceSpan, SpanExt};
