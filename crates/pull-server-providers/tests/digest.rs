// crates/pull-server-providers/tests/digest.rs
// ============================================================================
// Module: Digest Provider Tests
// Description: Stream/byte agreement and product lifecycle for SHA-2 providers.
// Purpose: Ensure checksums are independent of how content is delivered.
// Dependencies: pull-server-providers, pull-server-core, proptest, tempfile
// ============================================================================

//! ## Overview
//! Property tests compare byte and stream results across random contents and
//! chunk sizes. Lifecycle tests cover disposal, manifest presets, and read
//! failures mid-stream.

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
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::io;
use std::io::Cursor;
use std::io::Read;

use proptest::prelude::*;
use pull_server_core::ChecksumProduct;
use pull_server_core::ChecksumSettings;
use pull_server_core::ChecksumService;
use pull_server_core::ParameterMap;
use pull_server_core::ProviderError;
use pull_server_core::ProviderSource;
use pull_server_providers::DigestKind;
use pull_server_providers::DigestProvider;
use pull_server_providers::ManifestProvider;
use pull_server_providers::ProviderManifest;
use pull_server_providers::RegistrySettings;
use pull_server_providers::checksum_capabilities;

use crate::common::basic_table;
use crate::common::build;
use crate::common::search;
use crate::common::write_manifest;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Produces a product configured with an optional chunk size.
fn product(kind: DigestKind, chunk_size: Option<usize>) -> ChecksumProduct {
    let mut provider: Box<dyn pull_server_core::Provider<Product = ChecksumProduct>> =
        Box::new(DigestProvider::new(kind));
    let mut parameters = ParameterMap::new();
    if let Some(chunk_size) = chunk_size {
        parameters.insert("chunk_size".to_string(), chunk_size.to_string());
    }
    provider.set_parameters(parameters).unwrap();
    provider.produce().unwrap()
}

/// Reader that fails after yielding a prefix.
struct FailingReader {
    /// Bytes yielded before the failure.
    prefix: Cursor<Vec<u8>>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.prefix.read(buf)?;
        if read == 0 {
            return Err(io::Error::other("disk went away"));
        }
        Ok(read)
    }
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    #[test]
    fn stream_and_bytes_agree(
        content in prop::collection::vec(any::<u8>(), 0 .. 4096),
        chunk_size in 1_usize .. 512,
        kind in prop_oneof![
            Just(DigestKind::Sha256),
            Just(DigestKind::Sha384),
            Just(DigestKind::Sha512),
        ],
    ) {
        let mut bytes = product(kind, None);
        let mut stream = product(kind, Some(chunk_size));
        let expected = bytes.compute_bytes(&content).unwrap();
        let actual = stream.compute_reader(&mut Cursor::new(content)).unwrap();
        prop_assert_eq!(expected, actual);
    }
}

// ============================================================================
// SECTION: Lifecycle
// ============================================================================

#[test]
fn disposed_product_reports_usage() {
    let mut algorithm = product(DigestKind::Sha256, None);
    algorithm.dispose();
    assert!(algorithm.is_disposed());
    assert!(matches!(algorithm.compute_bytes(b"abc"), Err(ProviderError::Usage(_))));
    assert!(matches!(
        algorithm.compute_reader(&mut Cursor::new(b"abc".to_vec())),
        Err(ProviderError::Usage(_))
    ));
}

#[test]
fn failed_stream_does_not_poison_the_next_computation() {
    let mut algorithm = product(DigestKind::Sha256, Some(2));
    let mut reader = FailingReader {
        prefix: Cursor::new(b"partial".to_vec()),
    };
    assert!(matches!(algorithm.compute_reader(&mut reader), Err(ProviderError::Io(_))));
    let mut fresh = product(DigestKind::Sha256, None);
    assert_eq!(algorithm.compute_bytes(b"abc").unwrap(), fresh.compute_bytes(b"abc").unwrap());
}

#[test]
fn sha256_known_vector() {
    let mut algorithm = product(DigestKind::Sha256, None);
    assert_eq!(algorithm.algorithm(), "SHA-256");
    assert_eq!(
        algorithm.compute_bytes(b"abc").unwrap(),
        "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
    );
}

// ============================================================================
// SECTION: Manifest Presets
// ============================================================================

#[test]
fn manifest_presets_sit_beneath_caller_parameters() {
    let manifest = ProviderManifest::parse(
        "name = \"tiny\"\nimplementation = \"SHA-256\"\n[parameters]\nchunk_size = \"0\"\n",
    )
    .unwrap();

    let mut preset_only: Box<dyn pull_server_core::Provider<Product = ChecksumProduct>> =
        Box::new(ManifestProvider::new(&manifest, Box::new(DigestProvider::new(DigestKind::Sha256))));
    assert!(matches!(
        preset_only.set_parameters(ParameterMap::new()),
        Err(ProviderError::Validation(_))
    ));
    assert!(!preset_only.is_configured());

    let mut overridden: Box<dyn pull_server_core::Provider<Product = ChecksumProduct>> =
        Box::new(ManifestProvider::new(&manifest, Box::new(DigestProvider::new(DigestKind::Sha256))));
    let mut parameters = ParameterMap::new();
    parameters.insert("chunk_size".to_string(), "8".to_string());
    overridden.set_parameters(parameters).unwrap();
    assert!(overridden.is_configured());
    assert_eq!(overridden.describe().name(), "tiny");
}

#[test]
fn checksum_service_runs_on_discovered_providers() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "alias.toml", "sha-alias", "basic");
    let (registry, _) = build(&basic_table(), &search(&[dir.path()]));
    let registry = registry.unwrap();
    assert!(registry.provider_names().contains(&"sha-alias".to_string()));

    let service = ChecksumService::new(
        std::sync::Arc::new(registry),
        ChecksumSettings {
            algorithm: "sha-alias".to_string(),
            parameters: ParameterMap::new(),
        },
    );
    let checksum = service.compute(b"abc").unwrap();
    assert_eq!(checksum.algorithm, "SHA-256");
    assert_eq!(checksum.value, "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD");
}

#[test]
fn builtin_registry_serves_every_sha2_variant() {
    let (registry, _) = build(&checksum_capabilities(), &RegistrySettings::default());
    let registry = registry.unwrap();
    for name in ["SHA-256", "SHA-384", "SHA-512"] {
        let mut provider = registry.resolve(name).unwrap();
        provider.set_parameters(ParameterMap::new()).unwrap();
        let algorithm = provider.produce().unwrap();
        assert_eq!(algorithm.algorithm(), name);
    }
}
