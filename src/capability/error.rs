// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability resolution errors.
//!
//! Every variant is fatal to the component being constructed: there is no
//! degraded mode for an agent that cannot resolve a mandatory capability.

use thiserror::Error;

use super::version::PlatformVersion;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("No variant of {capability} matches platform version {version}")]
    NoMatchingVariant {
        capability: String,
        version: PlatformVersion,
    },

    #[error("Invalid platform version: {0:?}")]
    InvalidVersion(String),

    #[error("Invalid variant table for {capability}: {reason}")]
    InvalidTable { capability: String, reason: String },

    #[error("Variant {variant} of {capability} has no bound provider factory")]
    VariantNotBound { capability: String, variant: String },

    #[error("Variant {0} is not present in the variant table")]
    UnknownVariant(String),

    #[error("Provider for {capability} ({variant}) does not have the requested type")]
    ProviderTypeMismatch { capability: String, variant: String },

    #[error("Platform version query failed: {0}")]
    VersionQuery(String),

    #[error("Failed to load variant table: {0}")]
    TableLoad(String),
}

/// Failure reported by a platform or framework collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Action failed: {0}")]
    Action(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
