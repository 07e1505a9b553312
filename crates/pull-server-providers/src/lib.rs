// crates/pull-server-providers/src/lib.rs
// ============================================================================
// Module: Pull Server Providers
// Description: Provider registry and built-in checksum providers.
// Purpose: Resolve named, parameterizable algorithms for the pull handler.
// Dependencies: pull-server-core, serde, sha2, toml
// ============================================================================

//! ## Overview
//! This crate ships the SHA-2 checksum providers and the registry that makes
//! them, and any manifest-declared variants, resolvable by name. The provider
//! set is closed once built; there is no runtime loading of native code.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod digest;
pub mod manifest;
pub mod registry;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use digest::DigestAlgorithm;
pub use digest::DigestKind;
pub use digest::DigestProvider;
pub use digest::checksum_capabilities;
pub use manifest::ManifestError;
pub use manifest::ManifestProvider;
pub use manifest::ProviderManifest;
pub use registry::CapabilityTable;
pub use registry::ProviderFactory;
pub use registry::ProviderRegistry;
pub use registry::RegistryError;
pub use registry::RegistrySettings;
