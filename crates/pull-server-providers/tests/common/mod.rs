// crates/pull-server-providers/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures for registry and digest tests.
// Purpose: Provide manifest writers and a small capability table.
// Dependencies: pull-server-providers, tempfile
// ============================================================================

//! ## Overview
//! Helpers for laying out manifest directories on disk and building
//! registries with a recording event sink.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use pull_server_core::ChecksumProduct;
use pull_server_core::ChecksumProvider;
use pull_server_core::MemoryEventSink;
use pull_server_providers::CapabilityTable;
use pull_server_providers::DigestKind;
use pull_server_providers::DigestProvider;
use pull_server_providers::ProviderRegistry;
use pull_server_providers::RegistryError;
use pull_server_providers::RegistrySettings;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Creates the `basic` implementation.
fn basic_provider() -> ChecksumProvider {
    Box::new(DigestProvider::new(DigestKind::Sha256))
}

/// Capability table with a single `basic` implementation.
pub fn basic_table() -> CapabilityTable<ChecksumProduct> {
    CapabilityTable::new().with("basic", basic_provider)
}

/// Writes a manifest file and returns its path.
pub fn write_manifest(dir: &Path, file: &str, name: &str, implementation: &str) -> PathBuf {
    let path = dir.join(file);
    fs::write(
        &path,
        format!("name = \"{name}\"\nlabel = \"{name} label\"\nimplementation = \"{implementation}\"\n"),
    )
    .expect("write manifest");
    path
}

/// Settings scanning only the given directories.
pub fn search(paths: &[&Path]) -> RegistrySettings {
    RegistrySettings {
        search_paths: paths.iter().map(|path| path.to_path_buf()).collect(),
        ..RegistrySettings::default()
    }
}

/// Builds a registry, returning the sink that recorded build events.
pub fn build(
    table: &CapabilityTable<ChecksumProduct>,
    settings: &RegistrySettings,
) -> (Result<ProviderRegistry<ChecksumProduct>, RegistryError>, MemoryEventSink) {
    let events = MemoryEventSink::new();
    let registry = ProviderRegistry::build(table, settings, &events);
    (registry, events)
}
