// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability registry: a validated [`VariantTable`] plus one provider
//! factory per variant.
//!
//! The registry is immutable once built. Factories are keyed by the
//! lowercased variant name, so the table and the bindings may differ in
//! letter case.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::CapabilityError;
use super::table::{VariantSpec, VariantTable};
use super::version::PlatformVersion;

type ErasedProvider = Box<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn() -> ErasedProvider + Send + Sync>;

/// A freshly created provider for one capability.
///
/// Holds an `Arc<P>` behind type erasure; use [`ProviderInstance::into_provider`]
/// with the capability's trait object type to get it back.
pub struct ProviderInstance {
    capability: String,
    variant: String,
    provider: ErasedProvider,
}

impl ProviderInstance {
    pub fn capability(&self) -> &str {
        &self.capability
    }

    pub fn variant(&self) -> &str {
        &self.variant
    }

    /// Recover the typed provider handle.
    pub fn into_provider<P>(self) -> Result<Arc<P>, CapabilityError>
    where
        P: ?Sized + Send + Sync + 'static,
    {
        let Self { capability, variant, provider } = self;
        provider
            .downcast::<Arc<P>>()
            .map(|boxed| *boxed)
            .map_err(|_| CapabilityError::ProviderTypeMismatch { capability, variant })
    }
}

impl fmt::Debug for ProviderInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderInstance")
            .field("capability", &self.capability)
            .field("variant", &self.variant)
            .finish_non_exhaustive()
    }
}

/// Immutable capability → variant → factory mapping.
pub struct CapabilityRegistry {
    table: VariantTable,
    factories: HashMap<String, Factory>,
}

impl CapabilityRegistry {
    pub fn builder(table: VariantTable) -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder {
            table,
            factories: HashMap::new(),
        }
    }

    pub fn table(&self) -> &VariantTable {
        &self.table
    }

    /// Select the variant of `capability` matching `version` and create a
    /// new provider from its factory. No instance is cached here.
    pub fn instantiate(
        &self,
        capability: &str,
        version: &PlatformVersion,
    ) -> Result<ProviderInstance, CapabilityError> {
        let spec = self.table.select(capability, version)?;
        let factory = self.factory_for(capability, spec)?;

        Ok(ProviderInstance {
            capability: capability.to_string(),
            variant: spec.name.clone(),
            provider: factory(),
        })
    }

    /// Whether a factory is bound for the variant `name`.
    pub fn is_bound(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    fn factory_for(&self, capability: &str, spec: &VariantSpec) -> Result<&Factory, CapabilityError> {
        self.factories
            .get(&spec.name.to_lowercase())
            .ok_or_else(|| CapabilityError::VariantNotBound {
                capability: capability.to_string(),
                variant: spec.name.clone(),
            })
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut bound: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        bound.sort_unstable();
        f.debug_struct("CapabilityRegistry")
            .field("table", &self.table)
            .field("bound", &bound)
            .finish()
    }
}

/// Collects factory bindings before the registry is frozen.
pub struct CapabilityRegistryBuilder {
    table: VariantTable,
    factories: HashMap<String, Factory>,
}

impl CapabilityRegistryBuilder {
    /// Bind the factory for variant `name`. `P` is the capability's trait
    /// object type, e.g. `dyn HostUtils`.
    pub fn bind<P, F>(mut self, name: &str, factory: F) -> Result<Self, CapabilityError>
    where
        P: ?Sized + Send + Sync + 'static,
        F: Fn() -> Arc<P> + Send + Sync + 'static,
    {
        if self.table.capability_of(name).is_none() {
            return Err(CapabilityError::UnknownVariant(name.to_string()));
        }

        let erased: Factory = Arc::new(move || Box::new(factory()) as ErasedProvider);
        self.factories.insert(name.to_lowercase(), erased);
        Ok(self)
    }

    /// Validate the table and freeze the registry.
    pub fn build(self) -> Result<CapabilityRegistry, CapabilityError> {
        self.table.validate()?;
        Ok(CapabilityRegistry {
            table: self.table,
            factories: self.factories,
        })
    }
}
