//! In-memory fakes for the platform providers and framework services.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use hv_hostops::capability::{ProviderError, VersionSource};
use hv_hostops::host::{
    ComputeApi, FrameworkServices, HostOps, HostOpsConfig, HostPowerAction, HostUtils,
    InstanceRecord, InstanceStore, InstanceTracker, LiveMigrationRequest, MemoryInfo, PathUtils,
    ProcessorInfo, RequestContext, ServiceRecord, ServiceRegistry, TaskState, VmState, VmUtils,
    VolumeInfo,
};

pub const SOURCE_HOST: &str = "hv-node-01";
pub const SCHEDULED_HOST: &str = "hv-node-02";
pub const COMPUTE_BINARY: &str = "nova-compute";

// === Platform providers ===

pub struct FakeHost {
    pub version: String,
    pub version_queries: AtomicUsize,
    pub cpus: Vec<ProcessorInfo>,
    pub features: HashSet<u32>,
    pub memory: MemoryInfo,
    pub volume: VolumeInfo,
    pub local_ips: Vec<IpAddr>,
    pub tick_count: u64,
    pub power_actions: Mutex<Vec<HostPowerAction>>,
    pub volume_queries: Mutex<Vec<String>>,
}

impl FakeHost {
    pub fn with_version(version: &str) -> Self {
        Self {
            version: version.to_string(),
            ..Self::default()
        }
    }

    pub fn version_query_count(&self) -> usize {
        self.version_queries.load(Ordering::SeqCst)
    }
}

impl Default for FakeHost {
    fn default() -> Self {
        Self {
            version: "6.3.9600".to_string(),
            version_queries: AtomicUsize::new(0),
            cpus: vec![ProcessorInfo {
                architecture: 9,
                name: "Intel(R) Xeon(R) CPU E5-2670".to_string(),
                manufacturer: "GenuineIntel".to_string(),
                number_of_cores: 8,
                number_of_logical_processors: 16,
            }],
            features: [3, 6, 10, 13].into_iter().collect(),
            memory: MemoryInfo {
                total_kb: 2048,
                free_kb: 1024,
            },
            volume: VolumeInfo {
                size_bytes: 500 * 1024 * 1024 * 1024,
                free_bytes: 200 * 1024 * 1024 * 1024,
            },
            local_ips: vec!["192.168.10.4".parse().unwrap(), "10.0.0.4".parse().unwrap()],
            tick_count: 1_000_000,
            power_actions: Mutex::new(Vec::new()),
            volume_queries: Mutex::new(Vec::new()),
        }
    }
}

impl VersionSource for FakeHost {
    fn windows_version(&self) -> Result<String, ProviderError> {
        self.version_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.version.clone())
    }
}

impl HostUtils for FakeHost {
    fn get_cpus_info(&self) -> Result<Vec<ProcessorInfo>, ProviderError> {
        Ok(self.cpus.clone())
    }

    fn is_cpu_feature_present(&self, feature_key: u32) -> bool {
        self.features.contains(&feature_key)
    }

    fn get_memory_info(&self) -> Result<MemoryInfo, ProviderError> {
        Ok(self.memory)
    }

    fn get_volume_info(&self, drive: &str) -> Result<VolumeInfo, ProviderError> {
        self.volume_queries.lock().push(drive.to_string());
        Ok(self.volume)
    }

    fn host_power_action(&self, action: HostPowerAction) -> Result<(), ProviderError> {
        self.power_actions.lock().push(action);
        Ok(())
    }

    fn get_local_ips(&self) -> Result<Vec<IpAddr>, ProviderError> {
        Ok(self.local_ips.clone())
    }

    fn get_host_tick_count64(&self) -> Result<u64, ProviderError> {
        Ok(self.tick_count)
    }
}

pub struct FakePaths {
    pub instances_dir: String,
}

impl Default for FakePaths {
    fn default() -> Self {
        Self {
            instances_dir: "C:/fake/dir".to_string(),
        }
    }
}

impl PathUtils for FakePaths {
    fn get_instances_dir(&self) -> Result<String, ProviderError> {
        Ok(self.instances_dir.clone())
    }
}

/// VMs resident on the host, by platform name, with their instance UUIDs.
#[derive(Default)]
pub struct FakeVms {
    pub names: Vec<String>,
    pub uuids: HashMap<String, Uuid>,
    /// VM names whose UUID lookup fails.
    pub broken_lookups: HashSet<String>,
}

impl FakeVms {
    pub fn add(&mut self, name: &str, uuid: Option<Uuid>) {
        self.names.push(name.to_string());
        if let Some(uuid) = uuid {
            self.uuids.insert(name.to_string(), uuid);
        }
    }
}

impl VmUtils for FakeVms {
    fn list_instances(&self) -> Result<Vec<String>, ProviderError> {
        Ok(self.names.clone())
    }

    fn get_instance_uuid(&self, vm_name: &str) -> Result<Option<Uuid>, ProviderError> {
        if self.broken_lookups.contains(vm_name) {
            return Err(ProviderError::Query(format!("{} settings unavailable", vm_name)));
        }
        Ok(self.uuids.get(vm_name).copied())
    }
}

// === Framework services ===

#[derive(Default)]
struct FrameworkState {
    services: HashMap<(String, String), ServiceRecord>,
    instances: HashMap<Uuid, InstanceRecord>,
    /// Polls left before an in-flight migration settles (`None` never
    /// settles), then the host and vm state the instance settles into.
    in_flight: HashMap<Uuid, (Option<usize>, String, VmState)>,
    migrations: Vec<(Uuid, LiveMigrationRequest)>,
    service_saves: Vec<ServiceRecord>,
    instance_saves: Vec<InstanceRecord>,
    rejected: HashSet<Uuid>,
    settle_after: Option<usize>,
    /// Where the scheduler lands migrations (`None` leaves them in place).
    scheduled_host: Option<String>,
    /// Migrations settle on the source host with the instance in error.
    fail_in_place: bool,
}

/// Service registry, instance store, tracker and compute API in one.
///
/// The tracker reports every instance whose recorded host is `tracked_host`.
pub struct FakeFramework {
    tracked_host: String,
    state: Mutex<FrameworkState>,
}

impl FakeFramework {
    pub fn new(host: &str) -> Arc<Self> {
        let mut state = FrameworkState {
            settle_after: Some(0),
            scheduled_host: Some(SCHEDULED_HOST.to_string()),
            ..FrameworkState::default()
        };
        state.services.insert(
            (host.to_string(), COMPUTE_BINARY.to_string()),
            ServiceRecord {
                host: host.to_string(),
                binary: COMPUTE_BINARY.to_string(),
                disabled: false,
            },
        );
        Arc::new(Self {
            tracked_host: host.to_string(),
            state: Mutex::new(state),
        })
    }

    pub fn add_instance(&self, uuid: Uuid) {
        self.state.lock().instances.insert(
            uuid,
            InstanceRecord {
                uuid,
                host: Some(self.tracked_host.clone()),
                vm_state: VmState::Active,
                task_state: None,
            },
        );
    }

    /// Number of polls that still see `migrating`; `None` never settles.
    pub fn settle_after(&self, polls: Option<usize>) {
        self.state.lock().settle_after = polls;
    }

    /// Make the scheduler leave migrated instances on the source host.
    pub fn scheduler_keeps_source(&self) {
        self.state.lock().scheduled_host = None;
    }

    /// Accept live migrations, then leave the instance on the source host in
    /// `VmState::Error` once they settle.
    pub fn fail_in_place(&self) {
        self.state.lock().fail_in_place = true;
    }

    pub fn reject_migration(&self, uuid: Uuid) {
        self.state.lock().rejected.insert(uuid);
    }

    pub fn service_disabled(&self, host: &str) -> Option<bool> {
        self.state
            .lock()
            .services
            .get(&(host.to_string(), COMPUTE_BINARY.to_string()))
            .map(|s| s.disabled)
    }

    pub fn migrations(&self) -> Vec<(Uuid, LiveMigrationRequest)> {
        self.state.lock().migrations.clone()
    }

    pub fn instance(&self, uuid: Uuid) -> Option<InstanceRecord> {
        self.state.lock().instances.get(&uuid).cloned()
    }

    pub fn service_saves(&self) -> Vec<ServiceRecord> {
        self.state.lock().service_saves.clone()
    }

    pub fn instance_saves(&self) -> Vec<InstanceRecord> {
        self.state.lock().instance_saves.clone()
    }

    pub fn services(self: &Arc<Self>) -> FrameworkServices {
        FrameworkServices {
            services: self.clone(),
            instances: self.clone(),
            tracker: self.clone(),
            compute: self.clone(),
        }
    }
}

#[async_trait]
impl ServiceRegistry for FakeFramework {
    async fn get_by_args(
        &self,
        _ctx: &RequestContext,
        host: &str,
        binary: &str,
    ) -> Result<ServiceRecord, ProviderError> {
        self.state
            .lock()
            .services
            .get(&(host.to_string(), binary.to_string()))
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("service {} on {}", binary, host)))
    }

    async fn save(&self, _ctx: &RequestContext, service: &ServiceRecord) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        state.service_saves.push(service.clone());
        state
            .services
            .insert((service.host.clone(), service.binary.clone()), service.clone());
        Ok(())
    }
}

#[async_trait]
impl InstanceStore for FakeFramework {
    async fn get_by_uuid(&self, _ctx: &RequestContext, uuid: Uuid) -> Result<InstanceRecord, ProviderError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let settled = match state.in_flight.get_mut(&uuid) {
            Some((Some(0), destination, vm_state)) => Some((destination.clone(), *vm_state)),
            Some((Some(n), _, _)) => {
                *n -= 1;
                None
            }
            _ => None,
        };
        if let Some((destination, vm_state)) = settled {
            state.in_flight.remove(&uuid);
            if let Some(record) = state.instances.get_mut(&uuid) {
                record.task_state = None;
                record.host = Some(destination);
                record.vm_state = vm_state;
            }
        }

        state
            .instances
            .get(&uuid)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("instance {}", uuid)))
    }

    async fn save(&self, _ctx: &RequestContext, instance: &InstanceRecord) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        state.instance_saves.push(instance.clone());
        state.instances.insert(instance.uuid, instance.clone());
        Ok(())
    }
}

#[async_trait]
impl InstanceTracker for FakeFramework {
    async fn list_instance_uuids(&self) -> Result<Vec<Uuid>, ProviderError> {
        Ok(self
            .state
            .lock()
            .instances
            .values()
            .filter(|r| r.host.as_deref() == Some(self.tracked_host.as_str()))
            .map(|r| r.uuid)
            .collect())
    }
}

#[async_trait]
impl ComputeApi for FakeFramework {
    async fn live_migrate(
        &self,
        _ctx: &RequestContext,
        instance: &InstanceRecord,
        request: &LiveMigrationRequest,
    ) -> Result<(), ProviderError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        if state.rejected.contains(&instance.uuid) {
            return Err(ProviderError::Action("No valid host was found".to_string()));
        }

        state.migrations.push((instance.uuid, request.clone()));
        let (destination, vm_state) = if state.fail_in_place {
            (self.tracked_host.clone(), VmState::Error)
        } else {
            let destination = request
                .host_name
                .clone()
                .or_else(|| state.scheduled_host.clone())
                .unwrap_or_else(|| self.tracked_host.clone());
            (destination, VmState::Active)
        };
        if let Some(record) = state.instances.get_mut(&instance.uuid) {
            record.task_state = Some(TaskState::Migrating);
        }
        state
            .in_flight
            .insert(instance.uuid, (state.settle_after, destination, vm_state));
        Ok(())
    }
}

// === Wiring ===

pub fn fast_config() -> HostOpsConfig {
    HostOpsConfig {
        migration_poll_interval: Duration::from_millis(10),
        migration_timeout: Duration::from_millis(200),
        ..HostOpsConfig::default()
    }
}

pub fn host_ops_with(
    host: FakeHost,
    paths: FakePaths,
    vms: FakeVms,
    framework: &Arc<FakeFramework>,
    config: HostOpsConfig,
) -> HostOps {
    HostOps::from_parts(
        Arc::new(host),
        Arc::new(paths),
        Arc::new(vms),
        framework.services(),
        config,
    )
}
