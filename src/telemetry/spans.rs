// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Span utilities for host operations.

use tracing::{info_span, Span};

/// Extension trait for adding context to spans.
pub trait SpanExt {
    /// Record the result of an operation into the span.
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display;
}

impl SpanExt for Span {
    fn record_result<T, E>(&self, result: &Result<T, E>)
    where
        E: std::fmt::Display,
    {
        match result {
            Ok(_) => {
                self.record("status", "ok");
            }
            Err(e) => {
                self.record("status", "error");
                self.record("error.message", e.to_string().as_str());
            }
        }
    }
}

/// Factory for maintenance-mode spans.
pub struct MaintenanceSpan;

impl MaintenanceSpan {
    /// Fields:
    /// - `host`, `enable`: the request
    /// - `remaining`: instances left after a drain
    /// - `status`, `error.message`: filled by `SpanExt::record_result`
    pub fn new(host: &str, enable: bool) -> Span {
        info_span!(
            "host_maintenance",
            host = %host,
            enable,
            remaining = tracing::field::Empty,
            status = tracing::field::Empty,
            error.message = tracing::field::Empty,
        )
    }
}
