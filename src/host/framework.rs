// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Orchestration-framework collaborators.
//!
//! The framework owns persistence, scheduling and the migration engine;
//! this crate only reads and updates records through these interfaces.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::ProviderError;

/// Visibility of soft-deleted rows for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadDeleted {
    #[default]
    No,
    Yes,
    Only,
}

/// Caller identity passed to every framework call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub is_admin: bool,
    pub read_deleted: ReadDeleted,
}

impl RequestContext {
    pub fn admin() -> Self {
        Self {
            is_admin: true,
            read_deleted: ReadDeleted::No,
        }
    }
}

/// Service registration for one binary on one host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub host: String,
    pub binary: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmState {
    Active,
    Building,
    Paused,
    Stopped,
    Error,
}

/// In-progress lifecycle operation on an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Scheduling,
    Spawning,
    Migrating,
    Rebooting,
    PoweringOff,
    PoweringOn,
    Deleting,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Scheduling => "scheduling",
            Self::Spawning => "spawning",
            Self::Migrating => "migrating",
            Self::Rebooting => "rebooting",
            Self::PoweringOff => "powering-off",
            Self::PoweringOn => "powering-on",
            Self::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

/// Instance record as stored by the framework.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub uuid: Uuid,
    pub host: Option<String>,
    pub vm_state: VmState,
    pub task_state: Option<TaskState>,
}

impl InstanceRecord {
    pub fn is_migrating(&self) -> bool {
        self.task_state == Some(TaskState::Migrating)
    }
}

/// Parameters for a live migration request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LiveMigrationRequest {
    pub block_migration: bool,
    pub disk_over_commit: bool,
    /// Destination host; `None` lets the scheduler pick.
    pub host_name: Option<String>,
}

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn get_by_args(
        &self,
        ctx: &RequestContext,
        host: &str,
        binary: &str,
    ) -> Result<ServiceRecord, ProviderError>;

    async fn save(&self, ctx: &RequestContext, service: &ServiceRecord) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait InstanceStore: Send + Sync {
    async fn get_by_uuid(&self, ctx: &RequestContext, uuid: Uuid) -> Result<InstanceRecord, ProviderError>;

    async fn save(&self, ctx: &RequestContext, instance: &InstanceRecord) -> Result<(), ProviderError>;
}

/// The framework's view of which instances live on this host.
#[async_trait]
pub trait InstanceTracker: Send + Sync {
    async fn list_instance_uuids(&self) -> Result<Vec<Uuid>, ProviderError>;
}

/// Live-migration execution API. Returns once the request is accepted;
/// progress is observed through the instance's task state.
#[async_trait]
pub trait ComputeApi: Send + Sync {
    async fn live_migrate(
        &self,
        ctx: &RequestContext,
        instance: &InstanceRecord,
        request: &LiveMigrationRequest,
    ) -> Result<(), ProviderError>;
}

/// Framework handles used by [`super::HostOps`].
#[derive(Clone)]
pub struct FrameworkServices {
    pub services: Arc<dyn ServiceRegistry>,
    pub instances: Arc<dyn InstanceStore>,
    pub tracker: Arc<dyn InstanceTracker>,
    pub compute: Arc<dyn ComputeApi>,
}
