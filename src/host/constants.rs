// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fixed lookup tables for host inventory.

pub const HYPERVISOR_TYPE: &str = "hyperv";

/// Reported for architecture codes missing from the table.
pub const UNKNOWN_ARCHITECTURE: &str = "Unknown";

/// `(architecture, hypervisor type, virtualization mode)` tuples this
/// driver can run.
pub const SUPPORTED_INSTANCES: &[(&str, &str, &str)] = &[
    ("i686", HYPERVISOR_TYPE, "hvm"),
    ("x86_64", HYPERVISOR_TYPE, "hvm"),
];

const PROCESSOR_ARCHITECTURES: &[(u16, &str)] = &[
    (0, "i686"),
    (1, "mips"),
    (2, "alpha"),
    (3, "ppc"),
    (5, "armv7"),
    (6, "ia64"),
    (9, "x86_64"),
];

/// Processor feature keys probed for the CPU feature set, in key order.
pub const PROCESSOR_FEATURES: &[(u32, &str)] = &[
    (3, "mmx"),
    (6, "sse"),
    (7, "3dnow"),
    (8, "rdtsc"),
    (9, "pae"),
    (10, "sse2"),
    (12, "nx"),
    (13, "sse3"),
    (17, "xsave"),
    (20, "slat"),
    (21, "vmx"),
];

/// Architecture name for a platform architecture code.
pub fn processor_architecture(code: u16) -> &'static str {
    PROCESSOR_ARCHITECTURES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
        .unwrap_or(UNKNOWN_ARCHITECTURE)
}
