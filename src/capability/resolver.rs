// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Version-gated provider resolution.
//!
//! The platform version is read once when the resolver is created. Every
//! later resolution uses that snapshot, so a running agent keeps the same
//! provider variants even if the host tooling is upgraded underneath it.

use std::sync::Arc;

use super::error::{CapabilityError, ProviderError};
use super::registry::{CapabilityRegistry, ProviderInstance};
use super::table::names;
use super::version::PlatformVersion;
use crate::host::providers::{HostUtils, PathUtils, VmUtils};

/// Reports the raw dotted platform version (e.g. `"6.3.9600"`).
pub trait VersionSource {
    fn windows_version(&self) -> Result<String, ProviderError>;
}

/// Resolves capability names to fresh provider instances.
#[derive(Debug, Clone)]
pub struct CapabilityResolver {
    registry: Arc<CapabilityRegistry>,
    version: PlatformVersion,
}

impl CapabilityResolver {
    /// Query `source` once and pin the parsed version.
    pub fn detect<S>(registry: Arc<CapabilityRegistry>, source: &S) -> Result<Self, CapabilityError>
    where
        S: VersionSource + ?Sized,
    {
        let raw = source
            .windows_version()
            .map_err(|e| CapabilityError::VersionQuery(e.to_string()))?;
        let version = PlatformVersion::parse(&raw)?;
        tracing::debug!(%version, "platform version detected");
        Ok(Self::with_version(registry, version))
    }

    pub fn with_version(registry: Arc<CapabilityRegistry>, version: PlatformVersion) -> Self {
        Self { registry, version }
    }

    pub fn version(&self) -> PlatformVersion {
        self.version
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Create a new provider for `capability`.
    pub fn resolve(&self, capability: &str) -> Result<ProviderInstance, CapabilityError> {
        let instance = self.registry.instantiate(capability, &self.version)?;
        tracing::debug!(
            capability,
            variant = instance.variant(),
            version = %self.version,
            "capability resolved"
        );
        Ok(instance)
    }

    /// Resolve and recover the typed handle in one step.
    pub fn resolve_as<P>(&self, capability: &str) -> Result<Arc<P>, CapabilityError>
    where
        P: ?Sized + Send + Sync + 'static,
    {
        self.resolve(capability)?.into_provider::<P>()
    }

    pub fn host_utils(&self) -> Result<Arc<dyn HostUtils>, CapabilityError> {
        self.resolve_as::<dyn HostUtils>(names::HOST_UTILS)
    }

    pub fn path_utils(&self) -> Result<Arc<dyn PathUtils>, CapabilityError> {
        self.resolve_as::<dyn PathUtils>(names::PATH_UTILS)
    }

    pub fn vm_utils(&self) -> Result<Arc<dyn VmUtils>, CapabilityError> {
        self.resolve_as::<dyn VmUtils>(names::VM_UTILS)
    }
}
