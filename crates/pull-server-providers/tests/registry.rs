// crates/pull-server-providers/tests/registry.rs
// ============================================================================
// Module: Provider Registry Tests
// Description: Validate listing order, discovery, collisions, and resolution.
// Purpose: Ensure the provider set is closed, ordered, and collision-free.
// Dependencies: pull-server-providers, pull-server-core, tempfile
// ============================================================================
//! ## Overview
//! Covers built-in selection, manifest discovery order, replace flags, fatal
//! collisions, non-fatal warnings, and resolve semantics.
//!
//! Security posture: manifests are untrusted input; malformed manifests must
//! never abort startup or register a provider.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod common;

use std::fs;

use pull_server_core::ChecksumProduct;
use pull_server_core::EventOutcome;
use pull_server_core::NoopEventSink;
use pull_server_core::ParameterMap;
use pull_server_core::ProviderError;
use pull_server_core::ProviderSource;
use pull_server_providers::CapabilityTable;
use pull_server_providers::ProviderRegistry;
use pull_server_providers::RegistryError;
use pull_server_providers::RegistrySettings;
use pull_server_providers::checksum_capabilities;

use crate::common::basic_table;
use crate::common::build;
use crate::common::search;
use crate::common::write_manifest;

// ============================================================================
// SECTION: Listing and Resolution
// ============================================================================

#[test]
fn builtins_then_discovered_providers_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "custom.toml", "custom", "basic");
    let (registry, _) = build(&basic_table(), &search(&[dir.path()]));
    let registry = registry.unwrap();
    assert_eq!(registry.names(), vec!["basic".to_string(), "custom".to_string()]);
    assert!(matches!(registry.resolve("missing"), Err(ProviderError::NotFound(_))));
}

#[test]
fn discovered_provider_takes_manifest_identity() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "custom.toml", "custom", "basic");
    let (registry, _) = build(&basic_table(), &search(&[dir.path()]));
    let provider = registry.unwrap().resolve("custom").unwrap();
    assert_eq!(provider.describe().name(), "custom");
    assert_eq!(provider.describe().label(), "custom label");
    assert_eq!(provider.describe_parameters()[0].name(), "chunk_size");
    assert!(!provider.is_configured());
}

#[test]
fn discovery_order_follows_locations_then_file_names() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_manifest(first.path(), "b.toml", "zeta", "basic");
    write_manifest(first.path(), "a.toml", "omega", "basic");
    write_manifest(second.path(), "0.toml", "alpha", "basic");
    let settings = RegistrySettings {
        builtins: Some(Vec::new()),
        ..search(&[first.path(), second.path()])
    };
    let (registry, _) = build(&basic_table(), &settings);
    assert_eq!(registry.unwrap().names(), vec!["omega", "zeta", "alpha"]);
}

#[test]
fn each_resolve_returns_a_fresh_provider() {
    let (registry, _) = build(&checksum_capabilities(), &RegistrySettings::default());
    let registry = registry.unwrap();
    let mut configured = registry.resolve("SHA-256").unwrap();
    configured.set_parameters(ParameterMap::new()).unwrap();
    let fresh = registry.resolve("SHA-256").unwrap();
    assert!(configured.is_configured());
    assert!(!fresh.is_configured());
}

#[test]
fn empty_registry_cannot_resolve() {
    let table: CapabilityTable<ChecksumProduct> = CapabilityTable::new();
    let (registry, _) = build(&table, &RegistrySettings::default());
    let registry = registry.unwrap();
    assert!(registry.is_empty());
    assert!(matches!(registry.resolve("SHA-256"), Err(ProviderError::Resolution(_))));
}

#[test]
fn builtin_subset_keeps_table_order() {
    let settings = RegistrySettings {
        builtins: Some(vec!["SHA-512".to_string(), "SHA-256".to_string()]),
        ..RegistrySettings::default()
    };
    let (registry, _) = build(&checksum_capabilities(), &settings);
    assert_eq!(registry.unwrap().names(), vec!["SHA-256", "SHA-512"]);
}

#[test]
fn unknown_builtin_is_invalid() {
    let settings = RegistrySettings {
        builtins: Some(vec!["MD5".to_string()]),
        ..RegistrySettings::default()
    };
    let (registry, _) = build(&checksum_capabilities(), &settings);
    assert!(matches!(registry, Err(RegistryError::Invalid(_))));
}

// ============================================================================
// SECTION: Replace Flags
// ============================================================================

#[test]
fn replace_builtins_drops_builtins() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "custom.toml", "custom", "basic");
    let settings = RegistrySettings {
        replace_builtins: true,
        ..search(&[dir.path()])
    };
    let (registry, _) = build(&basic_table(), &settings);
    assert_eq!(registry.unwrap().names(), vec!["custom"]);
}

#[test]
fn replace_search_paths_ignores_default_locations() {
    let defaults = tempfile::tempdir().unwrap();
    let configured = tempfile::tempdir().unwrap();
    write_manifest(defaults.path(), "d.toml", "from-defaults", "basic");
    write_manifest(configured.path(), "c.toml", "from-config", "basic");
    let mut settings = RegistrySettings {
        default_search_paths: vec![defaults.path().to_path_buf()],
        search_paths: vec![configured.path().to_path_buf()],
        ..RegistrySettings::default()
    };

    let (merged, _) = build(&basic_table(), &settings);
    assert_eq!(merged.unwrap().names(), vec!["basic", "from-defaults", "from-config"]);

    settings.replace_search_paths = true;
    let (replaced, _) = build(&basic_table(), &settings);
    assert_eq!(replaced.unwrap().names(), vec!["basic", "from-config"]);
}

// ============================================================================
// SECTION: Collisions
// ============================================================================

#[test]
fn duplicate_discovered_names_fail_the_build() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let first_path = write_manifest(first.path(), "sha.toml", "sha", "basic");
    let second_path = write_manifest(second.path(), "sha.toml", "sha", "basic");
    let (registry, _) = build(&basic_table(), &search(&[first.path(), second.path()]));
    match registry {
        Err(RegistryError::Collision {
            name,
            first,
            second,
        }) => {
            assert_eq!(name, "sha");
            assert_eq!(first, first_path.display().to_string());
            assert_eq!(second, second_path.display().to_string());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("collision was not detected"),
    }
}

#[test]
fn discovered_name_matching_builtin_collides() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "basic.toml", "basic", "basic");
    let (registry, _) = build(&basic_table(), &search(&[dir.path()]));
    assert!(matches!(
        registry,
        Err(RegistryError::Collision { ref first, .. }) if first == "built-in"
    ));
}

// ============================================================================
// SECTION: Warnings
// ============================================================================

#[test]
fn bad_locations_and_manifests_are_warnings() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "ghost.toml", "ghost", "no-such-implementation");
    fs::write(dir.path().join("broken.toml"), "name = ").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    write_manifest(dir.path(), "good.toml", "good", "basic");
    let missing = dir.path().join("absent");

    let (registry, events) = build(&basic_table(), &search(&[dir.path(), missing.as_path()]));
    let registry = registry.unwrap();
    assert_eq!(registry.names(), vec!["basic", "good"]);
    assert_eq!(registry.warnings().len(), 3);
    let recorded = events.events();
    assert_eq!(recorded.len(), 3);
    assert!(recorded.iter().all(|event| event.outcome == EventOutcome::Warning));
}

#[test]
fn manifests_with_rejected_presets_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("broken.toml"),
        "name = \"broken\"\nimplementation = \"basic\"\n[parameters]\nchunk_size = \"0\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("typo.toml"),
        "name = \"typo\"\nimplementation = \"basic\"\n[parameters]\nchunk_sise = \"8\"\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("tuned.toml"),
        "name = \"tuned\"\nimplementation = \"basic\"\n[parameters]\nchunk_size = \"8\"\n",
    )
    .unwrap();

    let (registry, events) = build(&basic_table(), &search(&[dir.path()]));
    let registry = registry.unwrap();
    assert_eq!(registry.names(), vec!["basic", "tuned"]);
    assert_eq!(registry.warnings().len(), 2);
    assert!(registry.warnings().iter().any(|warning| warning.contains("broken.toml")));
    assert!(registry.warnings().iter().any(|warning| warning.contains("chunk_sise")));
    assert!(events.events().iter().all(|event| event.outcome == EventOutcome::Warning));
    assert!(registry.resolve("tuned").is_ok());
}

#[test]
fn registry_is_usable_as_a_provider_source() {
    let (registry, _) = build(&checksum_capabilities(), &RegistrySettings::default());
    let source: &dyn ProviderSource<ChecksumProduct> = &registry.unwrap();
    assert_eq!(source.provider_names(), vec!["SHA-256", "SHA-384", "SHA-512"]);
    assert!(source.resolve("SHA-384").is_ok());
}

#[test]
fn default_settings_build_without_recording_events() {
    let registry =
        ProviderRegistry::build(&basic_table(), &RegistrySettings::default(), &NoopEventSink)
            .unwrap();
    assert_eq!(registry.names(), vec!["basic"]);
    assert!(registry.warnings().is_empty());
}
