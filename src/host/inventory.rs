// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host inventory aggregation.
//!
//! Every call queries the providers afresh; nothing is cached or persisted.

use serde::{Deserialize, Serialize};

use super::constants::{self, HYPERVISOR_TYPE, PROCESSOR_FEATURES, SUPPORTED_INSTANCES};
use super::error::HostOpsError;
use super::HostOps;
use crate::capability::{PlatformVersion, ProviderError};

const KIB_PER_MIB: u64 = 1024;
const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuTopology {
    pub sockets: u32,
    pub cores: u32,
    pub threads: u32,
}

impl CpuTopology {
    pub fn vcpus(&self) -> u32 {
        self.sockets
            .saturating_mul(self.cores)
            .saturating_mul(self.threads)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub vendor: String,
    pub model: String,
    pub arch: String,
    pub features: Vec<String>,
    pub topology: CpuTopology,
}

/// Memory in MiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total_mb: u64,
    pub free_mb: u64,
    pub used_mb: u64,
}

/// Local instance storage in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_gb: u64,
    pub free_gb: u64,
    pub used_gb: u64,
}

/// Resource report consumed by the framework's scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceReport {
    pub vcpus: u32,
    pub memory_mb: u64,
    pub memory_mb_used: u64,
    pub local_gb: u64,
    pub local_gb_used: u64,
    pub hypervisor_type: String,
    /// `major * 1000 + minor`.
    pub hypervisor_version: u64,
    pub hypervisor_hostname: String,
    /// Always 0: per-VM vCPU accounting is not tracked at host level.
    pub vcpus_used: u32,
    /// JSON-encoded [`CpuInfo`].
    pub cpu_info: String,
    /// JSON-encoded list of `[arch, hypervisor_type, vm_mode]`.
    pub supported_instances: String,
    pub numa_topology: Option<String>,
}

/// Drive or UNC share prefix of a Windows path.
///
/// `C:\x` gives `C:`, `\\server\share\x` gives `\\server\share`, any other
/// path gives an empty string. Both separator styles are accepted.
pub fn split_drive(path: &str) -> &str {
    let bytes = path.as_bytes();
    let is_sep = |b: u8| b == b'\\' || b == b'/';

    if bytes.len() < 2 {
        return "";
    }

    if is_sep(bytes[0]) && is_sep(bytes[1]) && !bytes.get(2).copied().is_some_and(is_sep) {
        let Some(server_end) = bytes[2..].iter().position(|b| is_sep(*b)).map(|i| i + 2) else {
            return "";
        };
        let share_end = match bytes[server_end + 1..].iter().position(|b| is_sep(*b)) {
            Some(0) => return "",
            Some(i) => server_end + 1 + i,
            None => bytes.len(),
        };
        return &path[..share_end];
    }

    if bytes[1] == b':' {
        return &path[..2];
    }

    ""
}

impl HostOps {
    /// Vendor, model, architecture, features and topology of the host CPU.
    pub fn get_cpu_info(&self) -> Result<CpuInfo, HostOpsError> {
        let processors = self.hostutils.get_cpus_info()?;
        let first = processors.first().ok_or(HostOpsError::NoProcessors)?;

        if first.number_of_cores == 0 {
            return Err(ProviderError::Query(format!(
                "processor {} reports zero cores",
                first.name
            ))
            .into());
        }

        let topology = CpuTopology {
            sockets: processors.len() as u32,
            cores: first.number_of_cores,
            threads: first.number_of_logical_processors / first.number_of_cores,
        };

        let features = PROCESSOR_FEATURES
            .iter()
            .filter(|(key, _)| self.hostutils.is_cpu_feature_present(*key))
            .map(|(_, name)| name.to_string())
            .collect();

        Ok(CpuInfo {
            vendor: first.manufacturer.clone(),
            model: first.name.clone(),
            arch: constants::processor_architecture(first.architecture).to_string(),
            features,
            topology,
        })
    }

    pub fn get_memory_info(&self) -> Result<MemoryUsage, HostOpsError> {
        let info = self.hostutils.get_memory_info()?;
        let total_mb = info.total_kb / KIB_PER_MIB;
        let free_mb = info.free_kb / KIB_PER_MIB;
        Ok(MemoryUsage {
            total_mb,
            free_mb,
            used_mb: total_mb.saturating_sub(free_mb),
        })
    }

    /// Capacity of the volume holding the instances directory.
    pub fn get_local_hdd_info_gb(&self) -> Result<DiskUsage, HostOpsError> {
        let instances_dir = self.pathutils.get_instances_dir()?;
        let drive = split_drive(&instances_dir);
        let info = self.hostutils.get_volume_info(drive)?;

        let total_gb = info.size_bytes / BYTES_PER_GIB;
        let free_gb = info.free_bytes / BYTES_PER_GIB;
        Ok(DiskUsage {
            total_gb,
            free_gb,
            used_gb: total_gb.saturating_sub(free_gb),
        })
    }

    /// Hypervisor version encoded as `major * 1000 + minor` (6.3.9600 → 6003).
    pub fn get_hypervisor_version(&self) -> Result<u64, HostOpsError> {
        let raw = self.hostutils.windows_version()?;
        let version = PlatformVersion::parse(&raw).map_err(|_| HostOpsError::InvalidVersion(raw))?;
        let encoded = version.encoded();
        tracing::debug!(version = encoded, "windows version");
        Ok(encoded)
    }

    /// Build the resource report for the framework's scheduler.
    pub fn get_available_resource(&self) -> Result<ResourceReport, HostOpsError> {
        tracing::debug!("get_available_resource called");

        let memory = self.get_memory_info()?;
        let disk = self.get_local_hdd_info_gb()?;
        let cpu_info = self.get_cpu_info()?;
        let hostname = hostname::get()
            .map_err(|e| ProviderError::Query(format!("hostname: {}", e)))?
            .to_string_lossy()
            .into_owned();

        Ok(ResourceReport {
            vcpus: cpu_info.topology.vcpus(),
            memory_mb: memory.total_mb,
            memory_mb_used: memory.used_mb,
            local_gb: disk.total_gb,
            local_gb_used: disk.used_gb,
            hypervisor_type: HYPERVISOR_TYPE.to_string(),
            hypervisor_version: self.get_hypervisor_version()?,
            hypervisor_hostname: hostname,
            vcpus_used: 0,
            cpu_info: serde_json::to_string(&cpu_info)?,
            supported_instances: serde_json::to_string(SUPPORTED_INSTANCES)?,
            numa_topology: None,
        })
    }
}
