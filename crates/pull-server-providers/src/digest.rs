// crates/pull-server-providers/src/digest.rs
// ============================================================================
// Module: Digest Providers
// Description: Built-in SHA-2 checksum providers.
// Purpose: Ship SHA-256, SHA-384, and SHA-512 as statically linked providers.
// Dependencies: pull-server-core, sha2
// ============================================================================

//! ## Overview
//! Each [`DigestProvider`] accepts one optional parameter, `chunk_size`, which
//! sets the read buffer used for stream computations. Every product owns its
//! own hasher, and every computation starts from a reset state, so byte and
//! stream results over the same content are identical.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::ErrorKind;
use std::io::Read;

use pull_server_core::ChecksumAlgorithm;
use pull_server_core::ChecksumProduct;
use pull_server_core::ChecksumProvider;
use pull_server_core::ParameterMap;
use pull_server_core::ParameterSlot;
use pull_server_core::Product;
use pull_server_core::Provider;
use pull_server_core::ProviderDescriptor;
use pull_server_core::ProviderError;
use pull_server_core::ProviderParameterDescriptor;
use pull_server_core::hashing::hex_upper;
use sha2::Digest;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;
use sha2::digest::DynDigest;

use crate::registry::CapabilityTable;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Name of the stream buffer parameter.
pub const CHUNK_SIZE_PARAMETER: &str = "chunk_size";
/// Default stream buffer size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
/// Maximum stream buffer size in bytes.
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Algorithms
// ============================================================================

/// SHA-2 variant backing a digest provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestKind {
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
    /// SHA-512.
    Sha512,
}

impl DigestKind {
    /// Returns the provider and algorithm name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-256",
            Self::Sha384 => "SHA-384",
            Self::Sha512 => "SHA-512",
        }
    }

    /// Returns the provider description.
    const fn description(self) -> &'static str {
        match self {
            Self::Sha256 => "SHA-2 digest with a 256-bit output.",
            Self::Sha384 => "SHA-2 digest with a 384-bit output.",
            Self::Sha512 => "SHA-2 digest with a 512-bit output.",
        }
    }

    /// Creates a fresh hasher.
    fn hasher(self) -> Box<dyn DynDigest + Send> {
        match self {
            Self::Sha256 => Box::new(Sha256::new()),
            Self::Sha384 => Box::new(Sha384::new()),
            Self::Sha512 => Box::new(Sha512::new()),
        }
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Built-in SHA-2 checksum provider.
pub struct DigestProvider {
    /// Backing variant.
    kind: DigestKind,
    /// Provider descriptor.
    descriptor: ProviderDescriptor,
    /// Accepted parameters.
    parameters: Vec<ProviderParameterDescriptor>,
    /// Configured-state storage.
    slot: ParameterSlot,
    /// Parsed stream buffer size.
    chunk_size: usize,
}

impl DigestProvider {
    /// Creates an unconfigured provider for a variant.
    #[must_use]
    pub fn new(kind: DigestKind) -> Self {
        Self {
            kind,
            descriptor: ProviderDescriptor::new(kind.name(), kind.name(), kind.description()),
            parameters: vec![ProviderParameterDescriptor::optional(
                CHUNK_SIZE_PARAMETER,
                "Chunk size",
                "Stream read buffer size in bytes (1 to 16777216, default 65536).",
            )],
            slot: ParameterSlot::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl Provider for DigestProvider {
    type Product = ChecksumProduct;

    fn describe(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn describe_parameters(&self) -> &[ProviderParameterDescriptor] {
        &self.parameters
    }

    fn set_parameters(&mut self, parameters: ParameterMap) -> Result<(), ProviderError> {
        let chunk_size = match parameters.get(CHUNK_SIZE_PARAMETER) {
            Some(value) => parse_chunk_size(value),
            None => Ok(DEFAULT_CHUNK_SIZE),
        };
        match chunk_size {
            Ok(chunk_size) => {
                self.slot.configure(&self.parameters, parameters)?;
                self.chunk_size = chunk_size;
                Ok(())
            }
            Err(err) => {
                self.slot = ParameterSlot::new();
                Err(err)
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.slot.is_configured()
    }

    fn produce(&self) -> Result<Self::Product, ProviderError> {
        self.slot.configured(self.descriptor.name())?;
        Ok(Box::new(DigestAlgorithm {
            kind: self.kind,
            hasher: self.kind.hasher(),
            chunk_size: self.chunk_size,
            disposed: false,
        }))
    }
}

/// Parses and bounds-checks a `chunk_size` value.
fn parse_chunk_size(value: &str) -> Result<usize, ProviderError> {
    let parsed = value.trim().parse::<usize>().map_err(|_| {
        ProviderError::Validation(format!("{CHUNK_SIZE_PARAMETER} must be an integer: {value}"))
    })?;
    if parsed == 0 || parsed > MAX_CHUNK_SIZE {
        return Err(ProviderError::Validation(format!(
            "{CHUNK_SIZE_PARAMETER} must be between 1 and {MAX_CHUNK_SIZE}: {parsed}"
        )));
    }
    Ok(parsed)
}

// ============================================================================
// SECTION: Product
// ============================================================================

/// Checksum product backed by a SHA-2 hasher.
pub struct DigestAlgorithm {
    /// Backing variant.
    kind: DigestKind,
    /// Hasher state, reset after every computation.
    hasher: Box<dyn DynDigest + Send>,
    /// Stream read buffer size.
    chunk_size: usize,
    /// Disposal flag.
    disposed: bool,
}

impl DigestAlgorithm {
    /// Fails once the product has been disposed.
    fn ensure_live(&self) -> Result<(), ProviderError> {
        if self.disposed {
            return Err(ProviderError::Usage(format!(
                "{} checksum used after dispose",
                self.kind.name()
            )));
        }
        Ok(())
    }
}

impl Product for DigestAlgorithm {
    fn dispose(&mut self) {
        if !self.disposed {
            self.hasher.reset();
            self.disposed = true;
        }
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl ChecksumAlgorithm for DigestAlgorithm {
    fn algorithm(&self) -> &str {
        self.kind.name()
    }

    fn compute_bytes(&mut self, bytes: &[u8]) -> Result<String, ProviderError> {
        self.ensure_live()?;
        self.hasher.update(bytes);
        Ok(hex_upper(&self.hasher.finalize_reset()))
    }

    fn compute_reader(&mut self, reader: &mut dyn Read) -> Result<String, ProviderError> {
        self.ensure_live()?;
        let mut buffer = vec![0_u8; self.chunk_size];
        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => self.hasher.update(&buffer[.. read]),
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(err) => {
                    self.hasher.reset();
                    return Err(ProviderError::Io(err.to_string()));
                }
            }
        }
        Ok(hex_upper(&self.hasher.finalize_reset()))
    }
}

// ============================================================================
// SECTION: Capability Table
// ============================================================================

/// Creates a SHA-256 provider.
fn sha256_provider() -> ChecksumProvider {
    Box::new(DigestProvider::new(DigestKind::Sha256))
}

/// Creates a SHA-384 provider.
fn sha384_provider() -> ChecksumProvider {
    Box::new(DigestProvider::new(DigestKind::Sha384))
}

/// Creates a SHA-512 provider.
fn sha512_provider() -> ChecksumProvider {
    Box::new(DigestProvider::new(DigestKind::Sha512))
}

/// Returns the statically linked checksum implementations.
#[must_use]
pub fn checksum_capabilities() -> CapabilityTable<ChecksumProduct> {
    CapabilityTable::new()
        .with(DigestKind::Sha256.name(), sha256_provider)
        .with(DigestKind::Sha384.name(), sha384_provider)
        .with(DigestKind::Sha512.name(), sha512_provider)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use pull_server_core::ParameterMap;
    use pull_server_core::Provider;
    use pull_server_core::ProviderError;

    use super::DigestKind;
    use super::DigestProvider;
    use super::checksum_capabilities;

    fn configured(kind: DigestKind) -> DigestProvider {
        let mut provider = DigestProvider::new(kind);
        provider.set_parameters(ParameterMap::new()).unwrap();
        provider
    }

    #[test]
    fn known_vectors_match() {
        let mut sha384 = configured(DigestKind::Sha384).produce().unwrap();
        assert_eq!(
            sha384.compute_bytes(b"abc").unwrap(),
            "CB00753F45A35E8BB5A03D699AC65007272C32AB0EDED1631A8B605A43FF5BED8086072BA1E7CC2358BAECA134C825A7"
        );
        let mut sha512 = configured(DigestKind::Sha512).produce().unwrap();
        assert_eq!(
            sha512.compute_bytes(b"abc").unwrap(),
            "DDAF35A193617ABACC417349AE20413112E6FA4E89A97EA20A9EEEE64B55D39A2192992A274FC1A836BA3C23A3FEEBBD454D4423643CE80E2A9AC94FA54CA49F"
        );
    }

    #[test]
    fn invalid_chunk_size_leaves_provider_unconfigured() {
        let mut provider = configured(DigestKind::Sha256);
        for bad in ["0", "16777217", "large"] {
            let mut parameters = ParameterMap::new();
            parameters.insert("chunk_size".to_string(), bad.to_string());
            assert!(matches!(
                provider.set_parameters(parameters),
                Err(ProviderError::Validation(_))
            ));
            assert!(!provider.is_configured());
        }
    }

    #[test]
    fn capability_table_lists_sha2_family_in_order() {
        assert_eq!(checksum_capabilities().names(), vec!["SHA-256", "SHA-384", "SHA-512"]);
    }
}
