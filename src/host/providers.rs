// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Platform provider interfaces.
//!
//! Implementations talk to the hypervisor management API of one platform
//! version and are selected through the capability registry.

use std::net::IpAddr;

use uuid::Uuid;

use super::power::HostPowerAction;
use crate::capability::{ProviderError, VersionSource};

/// One physical processor group as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorInfo {
    /// Platform architecture code (see [`super::constants::processor_architecture`]).
    pub architecture: u16,
    pub name: String,
    pub manufacturer: String,
    pub number_of_cores: u32,
    pub number_of_logical_processors: u32,
}

/// Physical memory in KiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_kb: u64,
    pub free_kb: u64,
}

/// Volume capacity in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeInfo {
    pub size_bytes: u64,
    pub free_bytes: u64,
}

/// Host-level queries and actions (the `hostutils` capability).
pub trait HostUtils: VersionSource + Send + Sync {
    fn get_cpus_info(&self) -> Result<Vec<ProcessorInfo>, ProviderError>;

    /// Whether the processor feature identified by `feature_key` is present.
    fn is_cpu_feature_present(&self, feature_key: u32) -> bool;

    fn get_memory_info(&self) -> Result<MemoryInfo, ProviderError>;

    /// Capacity of the volume identified by `drive` (e.g. `"C:"`).
    fn get_volume_info(&self, drive: &str) -> Result<VolumeInfo, ProviderError>;

    fn host_power_action(&self, action: HostPowerAction) -> Result<(), ProviderError>;

    fn get_local_ips(&self) -> Result<Vec<IpAddr>, ProviderError>;

    /// Milliseconds since boot.
    fn get_host_tick_count64(&self) -> Result<u64, ProviderError>;
}

/// Instance storage layout (the `pathutils` capability).
pub trait PathUtils: Send + Sync {
    /// Root directory holding instance files, as a platform path string.
    fn get_instances_dir(&self) -> Result<String, ProviderError>;
}

/// Low-level VM enumeration (the `vmutils` capability).
pub trait VmUtils: Send + Sync {
    /// Platform-native names of the VMs resident on this host.
    fn list_instances(&self) -> Result<Vec<String>, ProviderError>;

    /// Durable instance UUID recorded for `vm_name`, if the VM is tracked.
    fn get_instance_uuid(&self, vm_name: &str) -> Result<Option<Uuid>, ProviderError>;
}
