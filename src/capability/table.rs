// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Variant table: which implementation of each capability is valid for
//! which platform versions.
//!
//! A table is checked before use. Within one capability the ranges must
//! partition version space from the lowest minimum upwards: no overlap, no
//! gap, and only the highest range may be open-ended. Variant names are
//! unique across the whole table because they key the factory lookup.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::CapabilityError;
use super::version::{PlatformVersion, VersionRange};

/// Well-known capability names.
pub mod names {
    pub const HOST_UTILS: &str = "hostutils";
    pub const LIVE_MIGRATION_UTILS: &str = "livemigrationutils";
    pub const NETWORK_UTILS: &str = "networkutils";
    pub const PATH_UTILS: &str = "pathutils";
    pub const VM_UTILS: &str = "vmutils";
    pub const VHD_UTILS: &str = "vhdutils";
    pub const VOLUME_UTILS: &str = "volumeutils";
    pub const RDP_CONSOLE_UTILS: &str = "rdpconsoleutils";
}

const V6_0: PlatformVersion = PlatformVersion::new(6, 0, 0);
const V6_2: PlatformVersion = PlatformVersion::new(6, 2, 0);
const V10_0: PlatformVersion = PlatformVersion::new(10, 0, 0);

/// Built-in Hyper-V variants: (capability, variant, range).
const HYPERV_VARIANTS: &[(&str, &str, VersionRange)] = &[
    (names::HOST_UTILS, "HostUtils", VersionRange::between(V6_0, V6_2)),
    (names::HOST_UTILS, "HostUtilsV2", VersionRange::open(V6_2)),
    (names::LIVE_MIGRATION_UTILS, "LiveMigrationUtils", VersionRange::open(V6_0)),
    (names::NETWORK_UTILS, "NetworkUtils", VersionRange::between(V6_0, V6_2)),
    (names::NETWORK_UTILS, "NetworkUtilsV2", VersionRange::open(V6_2)),
    (names::PATH_UTILS, "PathUtils", VersionRange::open(V6_0)),
    (names::VM_UTILS, "VMUtils", VersionRange::between(V6_0, V6_2)),
    (names::VM_UTILS, "VMUtilsV2", VersionRange::between(V6_2, V10_0)),
    (names::VM_UTILS, "VMUtils10", VersionRange::open(V10_0)),
    (names::VHD_UTILS, "VHDUtils", VersionRange::between(V6_0, V6_2)),
    (names::VHD_UTILS, "VHDUtilsV2", VersionRange::open(V6_2)),
    (names::VOLUME_UTILS, "VolumeUtils", VersionRange::between(V6_0, V6_2)),
    (names::VOLUME_UTILS, "VolumeUtilsV2", VersionRange::open(V6_2)),
    (names::RDP_CONSOLE_UTILS, "RDPConsoleUtils", VersionRange::between(V6_0, V6_2)),
    (names::RDP_CONSOLE_UTILS, "RDPConsoleUtilsV2", VersionRange::open(V6_2)),
];

/// One implementation variant of a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    pub name: String,
    pub range: VersionRange,
}

/// Capability name → variants, in registration order.
#[derive(Debug, Clone, Default)]
pub struct VariantTable {
    capabilities: BTreeMap<String, Vec<VariantSpec>>,
}

impl VariantTable {
    /// Build and validate a table from `(capability, variant)` pairs.
    pub fn new<I>(entries: I) -> Result<Self, CapabilityError>
    where
        I: IntoIterator<Item = (String, VariantSpec)>,
    {
        let table = Self::collect(entries);
        table.validate()?;
        Ok(table)
    }

    /// The built-in Hyper-V table.
    pub fn hyperv() -> Self {
        Self::collect(HYPERV_VARIANTS.iter().map(|(capability, name, range)| {
            (
                capability.to_string(),
                VariantSpec { name: name.to_string(), range: *range },
            )
        }))
    }

    /// Parse and validate a TOML table.
    ///
    /// ```toml
    /// [[capability]]
    /// name = "vmutils"
    ///
    /// [[capability.variant]]
    /// name = "VMUtilsV2"
    /// min_version = "6.2"
    /// max_version = "10.0"
    /// ```
    pub fn from_toml_str(content: &str) -> Result<Self, CapabilityError> {
        let file: TableFile =
            toml::from_str(content).map_err(|e| CapabilityError::TableLoad(e.to_string()))?;
        if let Some(empty) = file.capabilities.iter().find(|c| c.variants.is_empty()) {
            return Err(CapabilityError::InvalidTable {
                capability: empty.name.clone(),
                reason: "no variants registered".into(),
            });
        }
        Self::new(file.capabilities.into_iter().flat_map(|cap| {
            let capability = cap.name;
            cap.variants.into_iter().map(move |v| {
                (
                    capability.clone(),
                    VariantSpec {
                        name: v.name,
                        range: VersionRange::new(v.min_version, v.max_version),
                    },
                )
            })
        }))
    }

    /// Load a TOML table from disk.
    pub fn from_file(path: &Path) -> Result<Self, CapabilityError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CapabilityError::TableLoad(format!("{}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to the TOML form accepted by [`VariantTable::from_toml_str`].
    pub fn to_toml_string(&self) -> Result<String, CapabilityError> {
        let file = TableFile {
            capabilities: self
                .capabilities
                .iter()
                .map(|(name, variants)| CapabilityFile {
                    name: name.clone(),
                    variants: variants
                        .iter()
                        .map(|v| VariantFile {
                            name: v.name.clone(),
                            min_version: v.range.min,
                            max_version: v.range.max,
                        })
                        .collect(),
                })
                .collect(),
        };
        toml::to_string(&file).map_err(|e| CapabilityError::TableLoad(e.to_string()))
    }

    fn collect<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, VariantSpec)>,
    {
        let mut capabilities: BTreeMap<String, Vec<VariantSpec>> = BTreeMap::new();
        for (capability, spec) in entries {
            capabilities.entry(capability).or_default().push(spec);
        }
        Self { capabilities }
    }

    /// Check range well-formedness, partitioning and name uniqueness.
    pub fn validate(&self) -> Result<(), CapabilityError> {
        let mut seen: HashMap<String, &str> = HashMap::new();

        for (capability, variants) in &self.capabilities {
            let invalid = |reason: String| CapabilityError::InvalidTable {
                capability: capability.clone(),
                reason,
            };

            if variants.is_empty() {
                return Err(invalid("no variants registered".into()));
            }

            for v in variants {
                if v.name.is_empty() {
                    return Err(invalid("variant name cannot be empty".into()));
                }
                if let Some(max) = v.range.max {
                    if max <= v.range.min {
                        return Err(invalid(format!("{} has an empty range {}", v.name, v.range)));
                    }
                }
                if let Some(other) = seen.insert(v.name.to_lowercase(), capability.as_str()) {
                    return Err(invalid(format!("variant {} is already registered for {}", v.name, other)));
                }
            }

            let mut ordered: Vec<&VariantSpec> = variants.iter().collect();
            ordered.sort_by_key(|v| v.range.min);

            for pair in ordered.windows(2) {
                let (prev, next) = (pair[0], pair[1]);
                match prev.range.max {
                    None => {
                        return Err(invalid(format!(
                            "open-ended {} overlaps {}",
                            prev.name, next.name
                        )))
                    }
                    Some(max) if max > next.range.min => {
                        return Err(invalid(format!(
                            "{} {} overlaps {} {}",
                            prev.name, prev.range, next.name, next.range
                        )))
                    }
                    Some(max) if max < next.range.min => {
                        return Err(invalid(format!(
                            "gap between {} {} and {} {}",
                            prev.name, prev.range, next.name, next.range
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        Ok(())
    }

    /// Select the first variant of `capability` whose range covers `version`.
    pub fn select(
        &self,
        capability: &str,
        version: &PlatformVersion,
    ) -> Result<&VariantSpec, CapabilityError> {
        let variants = self
            .variants(capability)
            .ok_or_else(|| CapabilityError::UnknownCapability(capability.to_string()))?;

        variants
            .iter()
            .find(|v| v.range.contains(version))
            .ok_or_else(|| CapabilityError::NoMatchingVariant {
                capability: capability.to_string(),
                version: *version,
            })
    }

    pub fn variants(&self, capability: &str) -> Option<&[VariantSpec]> {
        self.capabilities.get(capability).map(Vec::as_slice)
    }

    pub fn capabilities(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    /// Capability owning the variant `name` (case-insensitive).
    pub fn capability_of(&self, name: &str) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|(_, variants)| variants.iter().any(|v| v.name.eq_ignore_ascii_case(name)))
            .map(|(capability, _)| capability.as_str())
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
struct TableFile {
    #[serde(rename = "capability", default)]
    capabilities: Vec<CapabilityFile>,
}

#[derive(Serialize, Deserialize)]
struct CapabilityFile {
    name: String,
    #[serde(rename = "variant", default)]
    variants: Vec<VariantFile>,
}

#[derive(Serialize, Deserialize)]
struct VariantFile {
    name: String,
    min_version: PlatformVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_version: Option<PlatformVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, min: &str, max: Option<&str>) -> VariantSpec {
        VariantSpec {
            name: name.into(),
            range: VersionRange::new(
                PlatformVersion::parse(min).unwrap(),
                max.map(|m| PlatformVersion::parse(m).unwrap()),
            ),
        }
    }

    #[test]
    fn test_builtin_table_is_valid() {
        let table = VariantTable::hyperv();
        table.validate().unwrap();
        assert_eq!(table.len(), 8);
        assert_eq!(table.variants(names::VM_UTILS).unwrap().len(), 3);
    }

    #[test]
    fn test_select_by_version() {
        let table = VariantTable::hyperv();
        let v = |raw| PlatformVersion::parse(raw).unwrap();

        assert_eq!(table.select(names::HOST_UTILS, &v("6.1.7601")).unwrap().name, "HostUtils");
        assert_eq!(table.select(names::HOST_UTILS, &v("6.2")).unwrap().name, "HostUtilsV2");
        assert_eq!(table.select(names::VM_UTILS, &v("6.3.9600")).unwrap().name, "VMUtilsV2");
        assert_eq!(table.select(names::VM_UTILS, &v("10.0.14393")).unwrap().name, "VMUtils10");
    }

    #[test]
    fn test_select_unknown_capability() {
        let table = VariantTable::hyperv();
        let err = table.select("nosuchutils", &PlatformVersion::new(6, 3, 0)).unwrap_err();
        assert!(matches!(err, CapabilityError::UnknownCapability(name) if name == "nosuchutils"));
    }

    #[test]
    fn test_select_below_minimum() {
        let table = VariantTable::hyperv();
        let err = table.select(names::HOST_UTILS, &PlatformVersion::new(5, 2, 0)).unwrap_err();
        assert!(matches!(err, CapabilityError::NoMatchingVariant { .. }));
    }

    #[test]
    fn test_overlap_rejected() {
        let err = VariantTable::new(vec![
            ("hostutils".to_string(), spec("A", "6.0", Some("6.3"))),
            ("hostutils".to_string(), spec("B", "6.2", None)),
        ])
        .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidTable { reason, .. } if reason.contains("overlaps")));
    }

    #[test]
    fn test_gap_rejected() {
        let err = VariantTable::new(vec![
            ("hostutils".to_string(), spec("A", "6.0", Some("6.2"))),
            ("hostutils".to_string(), spec("B", "6.3", None)),
        ])
        .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidTable { reason, .. } if reason.contains("gap")));
    }

    #[test]
    fn test_open_ended_must_be_last() {
        let err = VariantTable::new(vec![
            ("hostutils".to_string(), spec("A", "6.0", None)),
            ("hostutils".to_string(), spec("B", "6.2", None)),
        ])
        .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidTable { .. }));
    }

    #[test]
    fn test_empty_range_rejected() {
        let err = VariantTable::new(vec![("hostutils".to_string(), spec("A", "6.2", Some("6.2")))])
            .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidTable { .. }));
    }

    #[test]
    fn test_duplicate_variant_name_rejected() {
        let err = VariantTable::new(vec![
            ("hostutils".to_string(), spec("Shared", "6.0", None)),
            ("vmutils".to_string(), spec("shared", "6.0", None)),
        ])
        .unwrap_err();
        assert!(matches!(err, CapabilityError::InvalidTable { .. }));
    }

    #[test]
    fn test_registration_order_does_not_matter() {
        let table = VariantTable::new(vec![
            ("vmutils".to_string(), spec("New", "10.0", None)),
            ("vmutils".to_string(), spec("Old", "6.0", Some("10.0"))),
        ])
        .unwrap();
        let selected = table.select("vmutils", &PlatformVersion::new(6, 3, 9600)).unwrap();
        assert_eq!(selected.name, "Old");
    }

    #[test]
    fn test_toml_roundtrip_of_builtin_table() {
        let table = VariantTable::hyperv();
        let text = table.to_toml_string().unwrap();
        let parsed = VariantTable::from_toml_str(&text).unwrap();
        for capability in table.capabilities() {
            assert_eq!(table.variants(capability), parsed.variants(capability));
        }
    }

    #[test]
    fn test_capability_of_is_case_insensitive() {
        let table = VariantTable::hyperv();
        assert_eq!(table.capability_of("vmutils10"), Some(names::VM_UTILS));
        assert_eq!(table.capability_of("Missing"), None);
    }
}
