//! File loading tests for pull-server-config.
// crates/pull-server-config/tests/loading.rs
// =============================================================================
// Module: Config Loading Tests
// Description: Validate size, encoding, and path handling on load.
// Purpose: Ensure config files are read with hard limits and fail closed.
// =============================================================================

use std::fs;

use pull_server_config::ConfigError;
use pull_server_config::PullServerConfig;
use tempfile::TempDir;

mod common;

use crate::common::TestResult;

#[test]
fn load_records_source_directory() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    let path = temp.path().join("pull-server.toml");
    fs::write(&path, "[handler]\naction_dispatch = \"none\"\n").map_err(|err| err.to_string())?;
    let config = PullServerConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.config_dir() != Some(temp.path()) {
        return Err("config_dir should be the file's parent".to_string());
    }
    Ok(())
}

#[test]
fn missing_file_is_io_error() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    match PullServerConfig::load(Some(&temp.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        Err(other) => Err(format!("unexpected error: {other}")),
        Ok(_) => Err("missing file should fail".to_string()),
    }
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    let path = temp.path().join("big.toml");
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    fs::write(&path, padding).map_err(|err| err.to_string())?;
    common::assert_invalid(PullServerConfig::load(Some(&path)).map(|_| ()), "size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    let path = temp.path().join("binary.toml");
    fs::write(&path, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    common::assert_invalid(PullServerConfig::load(Some(&path)).map(|_| ()), "utf-8")
}

#[test]
fn invalid_content_fails_validation_on_load() -> TestResult {
    let temp = TempDir::new().map_err(|err| err.to_string())?;
    let path = temp.path().join("pull-server.toml");
    fs::write(&path, "[events]\nsink = \"file\"\n").map_err(|err| err.to_string())?;
    common::assert_invalid(PullServerConfig::load(Some(&path)).map(|_| ()), "events.path")
}
