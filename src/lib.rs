// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! hv-hostops
//!
//! Host-level operations for a Hyper-V compute-node agent.
//!
//! # Components
//!
//! - [`capability`]: selects the provider implementation of each platform
//!   capability for the host's OS version, from a validated variant table.
//! - [`host`]: the [`HostOps`] orchestrator. Reports inventory, performs
//!   power actions and drains the host into maintenance mode by live
//!   migrating its VMs.
//! - [`config`]: `HV_HOSTOPS_*` environment configuration.
//! - [`telemetry`]: `tracing` setup, maintenance spans and migration metrics.
//!
//! Platform providers and framework services are traits; the embedding agent
//! binds concrete implementations.

pub mod capability;
pub mod cli;
pub mod config;
pub mod host;
pub mod telemetry;

pub use capability::{
    CapabilityError, CapabilityRegistry, CapabilityResolver, PlatformVersion, ProviderError,
    VariantTable,
};
pub use host::{HostOps, HostOpsConfig, HostOpsError, MaintenanceStatus};
