// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host maintenance mode and VM evacuation.
//!
//! Entering maintenance disables the compute service first, then live
//! migrates every VM the platform lists on the host, one at a time. A
//! failure on one VM is logged and the drain moves on. Success is decided
//! afterwards by asking the framework's instance tracker what is still on
//! the host. The service stays disabled when the drain fails; turning
//! maintenance off is the only way to re-enable it.
//!
//! ```text
//! Active --enable--> Draining --remaining == 0--> Maintenance
//!                            \--remaining  > 0--> DrainFailed
//! any    --disable-> Active
//! ```

use std::fmt;
use std::time::Instant;

use tracing::Instrument;
use uuid::Uuid;

use super::error::HostOpsError;
use super::framework::{InstanceRecord, LiveMigrationRequest, RequestContext, VmState};
use super::HostOps;
use crate::telemetry::{self, MaintenanceSpan, SpanExt};

/// Status token returned to the framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceStatus {
    OnMaintenance,
    OffMaintenance,
}

impl MaintenanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnMaintenance => "on_maintenance",
            Self::OffMaintenance => "off_maintenance",
        }
    }
}

impl fmt::Display for MaintenanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceState {
    Active,
    Draining,
    Maintenance,
    DrainFailed,
}

/// One VM to move off the host. Lives for a single migration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTask {
    pub vm_name: String,
    pub instance_uuid: Uuid,
    pub current_host: String,
    pub target_host: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// The migration settled; `host` is the instance's recorded host afterwards.
    Migrated { instance_uuid: Uuid, host: Option<String> },
    /// The VM has no instance record and was left alone.
    Skipped,
}

/// Result of one evacuation pass.
#[derive(Debug)]
pub struct DrainReport {
    pub host: String,
    pub state: MaintenanceState,
    pub attempted: usize,
    pub migrated: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<(String, HostOpsError)>,
    /// Instances the tracker still places on the host after the pass.
    pub remaining: usize,
}

impl DrainReport {
    pub fn is_complete(&self) -> bool {
        self.remaining == 0
    }
}

impl HostOps {
    /// Enter (`enable = true`) or leave maintenance mode for `host`.
    ///
    /// Leaving always succeeds once the service is re-enabled. Entering
    /// fails with [`HostOpsError::MaintenanceMode`] when instances remain
    /// after the drain; the service is left disabled in that case.
    pub async fn host_maintenance_mode(
        &self,
        host: &str,
        enable: bool,
    ) -> Result<MaintenanceStatus, HostOpsError> {
        let span = MaintenanceSpan::new(host, enable);
        let result = self.run_maintenance(host, enable).instrument(span.clone()).await;
        span.record_result(&result);
        result
    }

    async fn run_maintenance(&self, host: &str, enable: bool) -> Result<MaintenanceStatus, HostOpsError> {
        let ctx = RequestContext::admin();

        if !enable {
            self.set_service_state(&ctx, host, false).await?;
            tracing::info!(host, "Host is off maintenance");
            return Ok(MaintenanceStatus::OffMaintenance);
        }

        let report = self.drain_host(&ctx, host).await?;
        if report.is_complete() {
            tracing::info!(host, migrated = report.migrated.len(), "All vms have been migrated successfully");
            tracing::info!(host, "Host is down for maintenance");
            Ok(MaintenanceStatus::OnMaintenance)
        } else {
            Err(HostOpsError::MaintenanceMode {
                remaining: report.remaining,
            })
        }
    }

    /// Disable the compute service on `host` and migrate every resident VM.
    ///
    /// Only service-registry, VM-listing and tracker failures abort the
    /// pass; per-VM migration errors are collected in the report.
    pub async fn drain_host(&self, ctx: &RequestContext, host: &str) -> Result<DrainReport, HostOpsError> {
        self.set_service_state(ctx, host, true).await?;
        let mut state = MaintenanceState::Active;
        state = transition(host, state, MaintenanceState::Draining);

        let vm_names = self.vmutils.list_instances()?;
        let mut report = DrainReport {
            host: host.to_string(),
            state,
            attempted: vm_names.len(),
            migrated: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
            remaining: 0,
        };

        for vm_name in vm_names {
            match self.migrate_vm(ctx, &vm_name, host, None).await {
                Ok(MigrationOutcome::Migrated { .. }) => report.migrated.push(vm_name),
                Ok(MigrationOutcome::Skipped) => report.skipped.push(vm_name),
                Err(e) => {
                    tracing::warn!(host, vm = %vm_name, error = %e, "migration failed, continuing drain");
                    report.failed.push((vm_name, e));
                }
            }
        }

        report.remaining = self.framework.tracker.list_instance_uuids().await?.len();
        tracing::Span::current().record("remaining", report.remaining);
        telemetry::record_drain_remaining(host, report.remaining);

        let next = if report.is_complete() {
            MaintenanceState::Maintenance
        } else {
            MaintenanceState::DrainFailed
        };
        report.state = transition(host, state, next);
        Ok(report)
    }

    /// Live migrate one VM off `host` and wait for the migration to settle.
    ///
    /// A VM without an instance record is skipped. Every other failure is
    /// reported as [`HostOpsError::Migration`] naming the VM, except an
    /// expired wait, which is [`HostOpsError::MigrationTimeout`].
    pub async fn migrate_vm(
        &self,
        ctx: &RequestContext,
        vm_name: &str,
        host: &str,
        target_host: Option<&str>,
    ) -> Result<MigrationOutcome, HostOpsError> {
        let started = Instant::now();
        let result = self.try_migrate_vm(ctx, vm_name, host, target_host).await;

        match &result {
            Ok(MigrationOutcome::Migrated { .. }) => {
                telemetry::record_migration("migrated");
                telemetry::record_migration_duration(started.elapsed());
            }
            Ok(MigrationOutcome::Skipped) => telemetry::record_migration("skipped"),
            Err(HostOpsError::MigrationTimeout { .. }) => telemetry::record_migration("timeout"),
            Err(_) => telemetry::record_migration("failed"),
        }

        result.map_err(|e| match e {
            HostOpsError::MigrationTimeout { .. } | HostOpsError::Migration { .. } => e,
            other => HostOpsError::Migration {
                vm_name: vm_name.to_string(),
                reason: other.to_string(),
            },
        })
    }

    async fn try_migrate_vm(
        &self,
        ctx: &RequestContext,
        vm_name: &str,
        host: &str,
        target_host: Option<&str>,
    ) -> Result<MigrationOutcome, HostOpsError> {
        let Some(instance_uuid) = self.vmutils.get_instance_uuid(vm_name)? else {
            tracing::info!(
                vm = vm_name,
                host,
                "Instance running on host could not be found in database, skip migrating this vm"
            );
            return Ok(MigrationOutcome::Skipped);
        };

        let task = MigrationTask {
            vm_name: vm_name.to_string(),
            instance_uuid,
            current_host: host.to_string(),
            target_host: target_host.map(str::to_string),
        };

        let instances = &self.framework.instances;
        let instance = instances.get_by_uuid(ctx, task.instance_uuid).await?;
        let request = LiveMigrationRequest {
            block_migration: false,
            disk_over_commit: false,
            host_name: task.target_host.clone(),
        };
        self.framework.compute.live_migrate(ctx, &instance, &request).await?;

        let mut instance = self.wait_for_migration(ctx, &task).await?;
        check_settled(&task, &instance)?;
        match (&task.target_host, &instance.host) {
            (Some(target), None) => instance.host = Some(target.clone()),
            (Some(target), Some(landed)) if landed != target => {
                tracing::warn!(vm = vm_name, target = %target, landed = %landed, "instance landed away from pinned target");
            }
            _ => {}
        }
        instance.vm_state = VmState::Active;
        instances.save(ctx, &instance).await?;

        tracing::info!(vm = vm_name, to = ?instance.host, "VM has been migrated");
        Ok(MigrationOutcome::Migrated {
            instance_uuid: task.instance_uuid,
            host: instance.host,
        })
    }

    /// Poll the instance until its task state leaves `migrating`.
    async fn wait_for_migration(
        &self,
        ctx: &RequestContext,
        task: &MigrationTask,
    ) -> Result<InstanceRecord, HostOpsError> {
        let timeout = self.config.migration_timeout;
        let deadline = tokio::time::Instant::now() + timeout;

        loop {
            let instance = self.framework.instances.get_by_uuid(ctx, task.instance_uuid).await?;
            if !instance.is_migrating() {
                return Ok(instance);
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(HostOpsError::MigrationTimeout {
                    vm_name: task.vm_name.clone(),
                    waited: timeout,
                });
            }

            tokio::time::sleep(self.config.migration_poll_interval).await;
        }
    }

    async fn set_service_state(
        &self,
        ctx: &RequestContext,
        host: &str,
        disabled: bool,
    ) -> Result<(), HostOpsError> {
        let services = &self.framework.services;
        let mut service = services.get_by_args(ctx, host, &self.config.compute_binary).await?;
        service.disabled = disabled;
        services.save(ctx, &service).await?;
        tracing::debug!(host, binary = %service.binary, disabled, "service state updated");
        Ok(())
    }
}

/// A settled migration only counts when the instance left the source host
/// and the framework did not flag it as errored.
fn check_settled(task: &MigrationTask, instance: &InstanceRecord) -> Result<(), HostOpsError> {
    let reason = if instance.vm_state == VmState::Error {
        format!("instance {} is in error state after migration", task.instance_uuid)
    } else if instance.host.as_deref() == Some(task.current_host.as_str()) {
        format!("instance {} is still on {}", task.instance_uuid, task.current_host)
    } else {
        return Ok(());
    };
    Err(HostOpsError::Migration {
        vm_name: task.vm_name.clone(),
        reason,
    })
}

fn transition(host: &str, from: MaintenanceState, to: MaintenanceState) -> MaintenanceState {
    tracing::info!(host, from = ?from, to = ?to, "maintenance state change");
    to
}
