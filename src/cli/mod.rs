// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! CLI module for hv-hostops commands.
//!
//! Operator-facing commands that work without a running agent: inspecting
//! configuration and checking which provider variants a platform version
//! would select.
//!
//! ## Usage
//!
//! ```bash
//! hv-hostops config show                 # Effective configuration
//! hv-hostops config validate             # Exit 0 if valid
//! hv-hostops capabilities --version 6.3  # Variants selected for 6.3
//! ```

pub mod capabilities_cmd;
pub mod config_cmd;

/// Exit code for success.
pub const EXIT_OK: i32 = 0;
/// Exit code for a failed check or command.
pub const EXIT_FAILURE: i32 = 1;
/// Exit code for unusable configuration.
pub const EXIT_CONFIG_ERROR: i32 = 2;

/// Value following `flag` in `args`, if present.
///
/// Returns `Err` with the flag name when the flag is last.
pub fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>, String> {
    match args.iter().position(|a| a == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| format!("Missing value for {}", flag)),
        None => Ok(None),
    }
}
