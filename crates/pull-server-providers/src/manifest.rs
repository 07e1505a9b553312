// crates/pull-server-providers/src/manifest.rs
// ============================================================================
// Module: Provider Manifests
// Description: On-disk provider declarations and the provider wrapper they create.
// Purpose: Let operators add named provider variants without recompiling.
// Dependencies: pull-server-core, serde, toml
// ============================================================================

//! ## Overview
//! A manifest names a capability table implementation and gives it a new
//! identity plus preset parameters:
//!
//! ```toml
//! name = "sha256-large-chunks"
//! label = "SHA-256 (1 MiB chunks)"
//! implementation = "SHA-256"
//! [parameters]
//! chunk_size = "1048576"
//! ```
//!
//! Presets sit beneath caller parameters: a caller value for the same name
//! wins. Manifests are untrusted input and are size-limited and strictly
//! parsed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;

use pull_server_core::DynProvider;
use pull_server_core::ParameterMap;
use pull_server_core::Product;
use pull_server_core::Provider;
use pull_server_core::ProviderDescriptor;
use pull_server_core::ProviderError;
use pull_server_core::ProviderParameterDescriptor;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum manifest file size in bytes.
pub const MAX_MANIFEST_BYTES: u64 = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Manifest loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Manifest file could not be read.
    #[error("manifest io error: {0}")]
    Io(String),
    /// Manifest is not valid TOML for the manifest schema.
    #[error("manifest parse error: {0}")]
    Parse(String),
    /// Manifest fields are invalid.
    #[error("invalid manifest: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Manifest
// ============================================================================

/// Provider declaration loaded from a `*.toml` file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderManifest {
    /// Provider name exposed by the registry.
    pub name: String,
    /// Human-readable label; defaults to the name.
    #[serde(default)]
    pub label: Option<String>,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Capability table entry backing the provider.
    pub implementation: String,
    /// Preset parameters applied beneath caller parameters.
    #[serde(default)]
    pub parameters: ParameterMap,
}

impl ProviderManifest {
    /// Parses and validates manifest text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when parsing or validation fails.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let manifest: Self =
            toml::from_str(text).map_err(|err| ManifestError::Parse(err.to_string()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Loads a manifest from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] when the file is unreadable, too large, not
    /// UTF-8, or invalid.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let metadata = fs::metadata(path).map_err(|err| ManifestError::Io(err.to_string()))?;
        if metadata.len() > MAX_MANIFEST_BYTES {
            return Err(ManifestError::Invalid(format!(
                "manifest exceeds {MAX_MANIFEST_BYTES} bytes"
            )));
        }
        let bytes = fs::read(path).map_err(|err| ManifestError::Io(err.to_string()))?;
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| ManifestError::Invalid("manifest must be utf-8".to_string()))?;
        Self::parse(text)
    }

    /// Builds the descriptor this manifest exposes.
    #[must_use]
    pub fn descriptor(&self) -> ProviderDescriptor {
        ProviderDescriptor::new(
            self.name.clone(),
            self.label.clone().unwrap_or_else(|| self.name.clone()),
            self.description.clone(),
        )
    }

    /// Validates manifest fields.
    fn validate(&self) -> Result<(), ManifestError> {
        if self.name.trim().is_empty() || self.name.trim() != self.name {
            return Err(ManifestError::Invalid(
                "name must be non-empty without surrounding whitespace".to_string(),
            ));
        }
        if self.implementation.trim().is_empty() {
            return Err(ManifestError::Invalid("implementation must be non-empty".to_string()));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Manifest Provider
// ============================================================================

/// Provider that re-labels an implementation and applies preset parameters.
pub struct ManifestProvider<P> {
    /// Descriptor taken from the manifest.
    descriptor: ProviderDescriptor,
    /// Preset parameters.
    presets: ParameterMap,
    /// Wrapped implementation.
    inner: DynProvider<P>,
}

impl<P> ManifestProvider<P> {
    /// Wraps a freshly created implementation.
    #[must_use]
    pub fn new(manifest: &ProviderManifest, inner: DynProvider<P>) -> Self {
        Self {
            descriptor: manifest.descriptor(),
            presets: manifest.parameters.clone(),
            inner,
        }
    }
}

impl<P: Product + 'static> Provider for ManifestProvider<P> {
    type Product = P;

    fn describe(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn describe_parameters(&self) -> &[ProviderParameterDescriptor] {
        self.inner.describe_parameters()
    }

    fn set_parameters(&mut self, parameters: ParameterMap) -> Result<(), ProviderError> {
        let mut merged = self.presets.clone();
        merged.extend(parameters);
        self.inner.set_parameters(merged)
    }

    fn is_configured(&self) -> bool {
        self.inner.is_configured()
    }

    fn produce(&self) -> Result<Self::Product, ProviderError> {
        self.inner.produce()
    }
}
