// Copyright 2024-2026 hv-hostops Contributors
// SPDX-License-Identifier: Apache-2.0

//! hv-hostops operator CLI.
//!
//! ## CLI Subcommands
//!
//! - `hv-hostops config show|defaults|validate` - Inspect configuration
//! - `hv-hostops capabilities [--version V] [--table FILE]` - Variant selection
//! - `hv-hostops version` - Show version information

use std::process::ExitCode;

use hv_hostops::cli::{capabilities_cmd, config_cmd, EXIT_CONFIG_ERROR};
use hv_hostops::config;
use hv_hostops::telemetry::init_logging;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "help" | "--help" | "-h" => {
            if let Some(subcommand) = args.get(2) {
                print_command_help(subcommand);
            } else {
                print_usage();
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("hv-hostops {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    let json_output = args.get(3).map(|s| s.as_str()) == Some("--json");
                    exit_code(config_cmd::run_show(json_output))
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => exit_code(config_cmd::run_validate()),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "capabilities" | "caps" => {
            if let Err(e) = init_logging(&config::load().log) {
                eprintln!("Logging setup failed: {}", e);
                return exit_code(EXIT_CONFIG_ERROR);
            }
            exit_code(capabilities_cmd::run(&args[2..]))
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(code as u8)
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "hv-hostops - Hyper-V host operations v{}

USAGE:
    hv-hostops [COMMAND] [OPTIONS]

COMMANDS:
    config         Inspect configuration (show, defaults, validate)
    capabilities   Show provider variants per platform version
    version        Show version information
    help           Show this help message

EXAMPLES:
    hv-hostops config show --json
    hv-hostops config validate
    hv-hostops capabilities
    hv-hostops capabilities --version 6.3.9600
    hv-hostops capabilities --version 10.0 --table /etc/hv-hostops/variants.toml

ENVIRONMENT:
    HV_HOSTOPS_MY_IP               Management IP (default: first local address)
    HV_HOSTOPS_COMPUTE_BINARY      Service toggled by maintenance (default: nova-compute)
    HV_HOSTOPS_MIGRATION_POLL_MS   Migration poll interval (default: 1000)
    HV_HOSTOPS_MIGRATION_TIMEOUT   Per-VM migration timeout in seconds (default: 3600)
    HV_HOSTOPS_VARIANT_TABLE       TOML variant table replacing the built-in one
    HV_HOSTOPS_LOG_LEVEL           Log filter (default: info)
    HV_HOSTOPS_LOG_FORMAT          json or pretty (default: json)

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error
",
        version
    );
}

/// Print detailed help for a specific command.
fn print_command_help(command: &str) {
    match command {
        "config" => {
            eprintln!(
                "hv-hostops config - Inspect configuration

USAGE:
    hv-hostops config <SUBCOMMAND> [OPTIONS]

SUBCOMMANDS:
    show [--json]  Show effective configuration
    validate       Validate configuration and the variant table
    defaults       Show default configuration

EXIT CODES:
    0  Configuration is valid
    1  Warnings found
    2  Variant table cannot be loaded
"
            );
        }
        "capabilities" | "caps" => {
            eprintln!(
                "hv-hostops capabilities - Provider variant selection

USAGE:
    hv-hostops capabilities [--version X.Y[.Z]] [--table FILE]

DESCRIPTION:
    Without --version, lists every variant and its platform version range.
    With --version, prints the variant each capability selects for that
    platform version. --table overrides HV_HOSTOPS_VARIANT_TABLE.

EXIT CODES:
    0  Every capability has a variant
    1  Some capability has no variant, or bad arguments
    2  Variant table cannot be loaded
"
            );
        }
        _ => {
            eprintln!(
                "No detailed help available for '{}'. Use 'hv-hostops help' for general usage.",
                command
            );
        }
    }
}
