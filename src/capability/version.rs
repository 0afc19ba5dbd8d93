// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Platform version parsing and range matching.
//!
//! Versions are dotted numeric identifiers (`major.minor[.build]`). Ordering
//! is total over `(major, minor, build)`; a missing build component is 0.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::error::CapabilityError;

/// A platform version as reported by the host, e.g. `6.3.9600`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlatformVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl PlatformVersion {
    pub const fn new(major: u32, minor: u32, build: u32) -> Self {
        Self { major, minor, build }
    }

    /// Parse a dotted version string. At least `major.minor` is required;
    /// any component past the build number is ignored.
    pub fn parse(raw: &str) -> Result<Self, CapabilityError> {
        let invalid = || CapabilityError::InvalidVersion(raw.to_string());

        let mut parts = raw.trim().split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .ok_or_else(invalid)?
            .parse::<u32>()
            .map_err(|_| invalid())?;
        let minor = parts
            .next()
            .ok_or_else(invalid)?
            .parse::<u32>()
            .map_err(|_| invalid())?;
        let build = match parts.next() {
            Some(p) => p.parse::<u32>().map_err(|_| invalid())?,
            None => 0,
        };

        Ok(Self { major, minor, build })
    }

    /// Integer encoding used by the scheduler: `major * 1000 + minor`.
    pub fn encoded(&self) -> u64 {
        u64::from(self.major) * 1000 + u64::from(self.minor)
    }
}

impl fmt::Display for PlatformVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl FromStr for PlatformVersion {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PlatformVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PlatformVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Validity window of a variant: `min <= v` and (`max` open or `v < max`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub min: PlatformVersion,
    pub max: Option<PlatformVersion>,
}

impl VersionRange {
    pub const fn new(min: PlatformVersion, max: Option<PlatformVersion>) -> Self {
        Self { min, max }
    }

    /// Open-ended range starting at `min`.
    pub const fn open(min: PlatformVersion) -> Self {
        Self { min, max: None }
    }

    /// Half-open range `[min, max)`.
    pub const fn between(min: PlatformVersion, max: PlatformVersion) -> Self {
        Self { min, max: Some(max) }
    }

    pub fn contains(&self, version: &PlatformVersion) -> bool {
        self.min <= *version && self.max.map_or(true, |max| *version < max)
    }

    pub fn is_open_ended(&self) -> bool {
        self.max.is_none()
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {})", self.min, max),
            None => write!(f, "[{}, ...)", self.min),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_version() {
        let v = PlatformVersion::parse("6.3.9600").unwrap();
        assert_eq!(v, PlatformVersion::new(6, 3, 9600));
    }

    #[test]
    fn test_parse_without_build() {
        let v = PlatformVersion::parse("6.2").unwrap();
        assert_eq!(v, PlatformVersion::new(6, 2, 0));
    }

    #[test]
    fn test_parse_ignores_trailing_components() {
        let v = PlatformVersion::parse("10.0.14393.0").unwrap();
        assert_eq!(v, PlatformVersion::new(10, 0, 14393));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for raw in ["", "6", "six.two", "6.x", "6.2.b", ".2"] {
            assert!(
                matches!(PlatformVersion::parse(raw), Err(CapabilityError::InvalidVersion(_))),
                "{raw:?} should not parse"
            );
        }
    }

    #[test]
    fn test_ordering_includes_build() {
        let older = PlatformVersion::parse("6.3.9200").unwrap();
        let newer = PlatformVersion::parse("6.3.9600").unwrap();
        assert!(older < newer);
        assert!(PlatformVersion::parse("6.10").unwrap() > PlatformVersion::parse("6.9").unwrap());
    }

    #[test]
    fn test_encoded() {
        assert_eq!(PlatformVersion::parse("6.3.9600").unwrap().encoded(), 6003);
        assert_eq!(PlatformVersion::parse("10.1.0").unwrap().encoded(), 10001);
    }

    #[test]
    fn test_range_is_half_open() {
        let range = VersionRange::between(PlatformVersion::new(6, 2, 0), PlatformVersion::new(10, 0, 0));
        assert!(range.contains(&PlatformVersion::new(6, 2, 0)));
        assert!(range.contains(&PlatformVersion::new(6, 3, 9600)));
        assert!(!range.contains(&PlatformVersion::new(10, 0, 0)));
        assert!(!range.contains(&PlatformVersion::new(6, 1, 7601)));
    }

    #[test]
    fn test_open_range() {
        let range = VersionRange::open(PlatformVersion::new(10, 0, 0));
        assert!(range.is_open_ended());
        assert!(range.contains(&PlatformVersion::new(99, 0, 0)));
    }
}
