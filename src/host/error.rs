// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host operation errors.

use std::time::Duration;

use thiserror::Error;

use crate::capability::ProviderError;

#[derive(Debug, Error)]
pub enum HostOpsError {
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Invalid host power action: {0}")]
    InvalidPowerAction(String),

    #[error("Unable to migrate {vm_name}: {reason}")]
    Migration { vm_name: String, reason: String },

    #[error("Migration of {vm_name} did not settle within {waited:?}")]
    MigrationTimeout { vm_name: String, waited: Duration },

    #[error("Not all vms have been migrated: {remaining} remaining instances")]
    MaintenanceMode { remaining: usize },

    #[error("Invalid hypervisor version: {0:?}")]
    InvalidVersion(String),

    #[error("Host reports no processors")]
    NoProcessors,

    #[error("No local IP address available")]
    NoLocalAddress,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl HostOpsError {
    /// Errors scoped to a single VM; the drain loop logs these and moves on.
    pub fn is_per_vm(&self) -> bool {
        matches!(self, Self::Migration { .. } | Self::MigrationTimeout { .. })
    }
}
