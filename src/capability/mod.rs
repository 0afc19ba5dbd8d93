// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Capability dispatch for the hypervisor driver.
//!
//! Each capability (host info, VM lifecycle, paths, ...) has several
//! implementation variants, each valid over a platform version range.
//! [`CapabilityResolver`] picks the one matching the detected version.

mod error;
mod registry;
mod resolver;
mod table;
mod version;

pub use error::{CapabilityError, ProviderError};
pub use registry::{CapabilityRegistry, CapabilityRegistryBuilder, ProviderInstance};
pub use resolver::{CapabilityResolver, VersionSource};
pub use table::{names, VariantSpec, VariantTable};
pub use version::{PlatformVersion, VersionRange};
