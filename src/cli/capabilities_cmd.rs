// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! `capabilities` subcommand: show the variant table, or the variant each
//! capability selects for a given platform version.

use std::path::Path;

use super::{flag_value, EXIT_CONFIG_ERROR, EXIT_FAILURE, EXIT_OK};
use crate::capability::{CapabilityError, PlatformVersion, VariantTable};
use crate::config;

/// Run `capabilities [--version X.Y[.Z]] [--table FILE]`.
///
/// `args` are the arguments after the subcommand name. Returns 1 when a
/// capability has no variant for the requested version.
pub fn run(args: &[String]) -> i32 {
    let (version, table_path) = match (flag_value(args, "--version"), flag_value(args, "--table")) {
        (Ok(v), Ok(t)) => (v, t),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("{}", e);
            return EXIT_FAILURE;
        }
    };

    let table = match load_table(table_path) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    match version {
        None => {
            for line in render_table(&table) {
                println!("{}", line);
            }
            EXIT_OK
        }
        Some(raw) => {
            let version = match PlatformVersion::parse(raw) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return EXIT_FAILURE;
                }
            };
            let (lines, unmatched) = render_selection(&table, &version);
            for line in lines {
                println!("{}", line);
            }
            if unmatched == 0 {
                EXIT_OK
            } else {
                EXIT_FAILURE
            }
        }
    }
}

/// `--table FILE` wins over `HV_HOSTOPS_VARIANT_TABLE`, which wins over the
/// built-in table.
fn load_table(path: Option<&str>) -> Result<VariantTable, CapabilityError> {
    match path {
        Some(path) => VariantTable::from_file(Path::new(path)),
        None => config::load().variant_table(),
    }
}

/// One line per variant: `capability  variant  [min, max)`.
pub fn render_table(table: &VariantTable) -> Vec<String> {
    let mut lines = Vec::new();
    for capability in table.capabilities() {
        for variant in table.variants(capability).unwrap_or_default() {
            lines.push(format!("{:<20} {:<20} {}", capability, variant.name, variant.range));
        }
    }
    lines
}

/// One line per capability with the selected variant, and the number of
/// capabilities that had none.
pub fn render_selection(table: &VariantTable, version: &PlatformVersion) -> (Vec<String>, usize) {
    let mut lines = vec![format!("platform version {}", version)];
    let mut unmatched = 0;
    for capability in table.capabilities() {
        match table.select(capability, version) {
            Ok(variant) => lines.push(format!("{:<20} {}", capability, variant.name)),
            Err(e) => {
                unmatched += 1;
                lines.push(format!("{:<20} <none> ({})", capability, e));
            }
        }
    }
    (lines, unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_lists_every_variant() {
        let lines = render_table(&VariantTable::hyperv());
        assert_eq!(lines.len(), 15);
        assert!(lines.iter().any(|l| l.contains("VMUtils10") && l.contains("[10.0.0, ...)")));
    }

    #[test]
    fn test_render_selection_for_2012_r2() {
        let version = PlatformVersion::new(6, 3, 9600);
        let (lines, unmatched) = render_selection(&VariantTable::hyperv(), &version);
        assert_eq!(unmatched, 0);
        assert!(lines.iter().any(|l| l.starts_with("vmutils") && l.ends_with("VMUtilsV2")));
        assert!(lines.iter().any(|l| l.starts_with("hostutils") && l.ends_with("HostUtilsV2")));
    }

    #[test]
    fn test_render_selection_below_minimum() {
        let version = PlatformVersion::new(5, 2, 0);
        let (_, unmatched) = render_selection(&VariantTable::hyperv(), &version);
        assert_eq!(unmatched, 8);
    }

    #[test]
    fn test_run_rejects_missing_table_value() {
        let args = vec!["--version".to_string(), "6.3".to_string(), "--table".to_string()];
        assert_eq!(run(&args), EXIT_FAILURE);
    }
}
