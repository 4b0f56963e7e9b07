// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! CLI tests for observer endpoint, logging flags and subcommands
//!
//! These tests verify argument parsing and configuration validation.

use std::path::PathBuf;

use clap::Parser;
use proptest::prelude::*;
use testinprogress::config::{Command, Config, ConfigError};
use tracing::Level;

fn fixture(name: &str) -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
    PathBuf::from(manifest_dir).join("tests/fixtures").join(name)
}

// ============================================================================
// Logging flags
// ============================================================================

#[test]
fn test_verbose_short_flag_v() {
    let config = Config::try_parse_from(["testinprogress", "-v"]).expect("parse should succeed");
    assert!(config.verbose);
    assert!(!config.quiet);
    assert_eq!(config.log_level(), Level::DEBUG);
}

#[test]
fn test_quiet_long_flag() {
    let config =
        Config::try_parse_from(["testinprogress", "--quiet"]).expect("parse should succeed");
    assert!(config.quiet);
    assert_eq!(config.log_level(), Level::WARN);
}

#[test]
fn test_verbose_flag_value_syntax_not_supported() {
    let result = Config::try_parse_from(["testinprogress", "--verbose=true"]);
    assert!(result.is_err(), "Boolean flags don't support =value syntax");
}

// ============================================================================
// Observer endpoint
// ============================================================================

#[test]
fn test_port_and_host_flags() {
    let config = Config::try_parse_from([
        "testinprogress",
        "--host",
        "observer.local",
        "-p",
        "51000",
        "--connect-timeout-ms",
        "750",
    ])
    .expect("parse should succeed");
    assert_eq!(config.host, "observer.local");
    assert_eq!(config.port, Some(51000));
    assert_eq!(config.connect_timeout_ms, 750);
}

#[test]
fn test_port_out_of_range_rejected() {
    let result = Config::try_parse_from(["testinprogress", "--port", "70000"]);
    assert!(result.is_err());
}

proptest! {
    #[test]
    fn any_valid_port_parses(port in 1u16..=u16::MAX) {
        let arg = port.to_string();
        let config = Config::try_parse_from(["testinprogress", "--port", arg.as_str()]);
        prop_assert!(config.is_ok());
        let target = config.ok().and_then(|c| c.socket_target());
        prop_assert_eq!(target.and_then(|t| t.port), Some(port));
    }
}

// ============================================================================
// Subcommands
// ============================================================================

#[test]
fn test_replay_subcommand() {
    let config = Config::try_parse_from(["testinprogress", "replay", "plan.json", "--parallel"])
        .expect("parse should succeed");
    assert_eq!(
        config.command,
        Some(Command::Replay {
            plan: PathBuf::from("plan.json"),
            stdout: false,
            parallel: true,
        })
    );
}

#[test]
fn test_verify_subcommand_requires_stream() {
    assert!(Config::try_parse_from(["testinprogress", "verify"]).is_err());
}

#[test]
fn test_replay_to_socket_needs_port() {
    let plan = fixture("plan.json");
    let config = Config {
        command: Some(Command::Replay {
            plan,
            stdout: false,
            parallel: false,
        }),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::MissingPort)));
}

#[test]
fn test_replay_to_stdout_needs_no_port() {
    let config = Config {
        command: Some(Command::Replay {
            plan: fixture("plan.json"),
            stdout: true,
            parallel: false,
        }),
        ..Default::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_replay_with_empty_host_rejected() {
    let config = Config {
        command: Some(Command::Replay {
            plan: fixture("plan.json"),
            stdout: false,
            parallel: false,
        }),
        host: " ".to_string(),
        port: Some(51000),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::EmptyHost)));
}

#[test]
fn test_verify_missing_stream_rejected() {
    let config = Config {
        command: Some(Command::Verify {
            stream: fixture("missing.jsonl"),
        }),
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InputNotFound(_))));
}
