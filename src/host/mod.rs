// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host operations for the compute-node agent.
//!
//! [`HostOps`] is built once per agent lifetime from resolver-provided
//! providers and the framework's service handles. It reports host
//! inventory, runs power actions and drives maintenance mode.

pub mod constants;
pub mod framework;
pub mod providers;

mod error;
mod inventory;
mod maintenance;
mod power;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::capability::{CapabilityError, CapabilityResolver};

pub use error::HostOpsError;
pub use framework::{
    ComputeApi, FrameworkServices, InstanceRecord, InstanceStore, InstanceTracker,
    LiveMigrationRequest, ReadDeleted, RequestContext, ServiceRecord, ServiceRegistry, TaskState,
    VmState,
};
pub use inventory::{split_drive, CpuInfo, CpuTopology, DiskUsage, MemoryUsage, ResourceReport};
pub use maintenance::{DrainReport, MaintenanceState, MaintenanceStatus, MigrationOutcome, MigrationTask};
pub use power::{format_elapsed, uptime_report, HostPowerAction};
pub use providers::{HostUtils, MemoryInfo, PathUtils, ProcessorInfo, VmUtils, VolumeInfo};

/// Default service binary toggled by maintenance mode.
pub const DEFAULT_COMPUTE_BINARY: &str = "nova-compute";

/// Host operation settings.
#[derive(Debug, Clone)]
pub struct HostOpsConfig {
    /// Management address; when unset the first local address is reported.
    pub my_ip: Option<IpAddr>,
    pub compute_binary: String,
    /// Sleep between task-state polls while a migration is in flight.
    pub migration_poll_interval: Duration,
    /// Upper bound on waiting for one VM's migration to settle.
    pub migration_timeout: Duration,
}

impl Default for HostOpsConfig {
    fn default() -> Self {
        Self {
            my_ip: None,
            compute_binary: DEFAULT_COMPUTE_BINARY.to_string(),
            migration_poll_interval: Duration::from_secs(1),
            migration_timeout: Duration::from_secs(3600),
        }
    }
}

pub struct HostOps {
    hostutils: Arc<dyn HostUtils>,
    pathutils: Arc<dyn PathUtils>,
    vmutils: Arc<dyn VmUtils>,
    framework: FrameworkServices,
    config: HostOpsConfig,
}

impl HostOps {
    /// Resolve the host, path and VM providers for the pinned platform
    /// version. Any resolution failure is fatal to construction.
    pub fn new(
        resolver: &CapabilityResolver,
        framework: FrameworkServices,
        config: HostOpsConfig,
    ) -> Result<Self, CapabilityError> {
        Ok(Self::from_parts(
            resolver.host_utils()?,
            resolver.path_utils()?,
            resolver.vm_utils()?,
            framework,
            config,
        ))
    }

    pub fn from_parts(
        hostutils: Arc<dyn HostUtils>,
        pathutils: Arc<dyn PathUtils>,
        vmutils: Arc<dyn VmUtils>,
        framework: FrameworkServices,
        config: HostOpsConfig,
    ) -> Self {
        Self {
            hostutils,
            pathutils,
            vmutils,
            framework,
            config,
        }
    }

    pub fn config(&self) -> &HostOpsConfig {
        &self.config
    }
}
