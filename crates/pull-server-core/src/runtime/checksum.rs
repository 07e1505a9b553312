// crates/pull-server-core/src/runtime/checksum.rs
// ============================================================================
// Module: Checksum Service
// Description: Per-request checksum computation through a provider source.
// Purpose: Resolve, configure, produce, compute, and dispose in one scope.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Each computation resolves a fresh provider, applies the configured
//! parameters, produces one product, and disposes it before returning.
//! Products are never cached or shared between requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::sync::Arc;

use crate::core::checksum::Checksum;
use crate::core::checksum::ChecksumProduct;
use crate::core::checksum::ChecksumSettings;
use crate::core::provider::ProviderError;
use crate::core::provider::ProviderSource;
use crate::core::provider::Scoped;

// ============================================================================
// SECTION: Service
// ============================================================================

/// Computes checksums with a configured provider.
#[derive(Clone)]
pub struct ChecksumService {
    /// Provider source used for every computation.
    source: Arc<dyn ProviderSource<ChecksumProduct>>,
    /// Selected provider and its parameters.
    settings: ChecksumSettings,
}

impl ChecksumService {
    /// Creates a checksum service.
    #[must_use]
    pub fn new(source: Arc<dyn ProviderSource<ChecksumProduct>>, settings: ChecksumSettings) -> Self {
        Self {
            source,
            settings,
        }
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn settings(&self) -> &ChecksumSettings {
        &self.settings
    }

    /// Computes the checksum of a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when resolution, configuration, or
    /// computation fails.
    pub fn compute(&self, content: &[u8]) -> Result<Checksum, ProviderError> {
        let mut product = self.acquire()?;
        let value = product.compute_bytes(content)?;
        Ok(Checksum {
            algorithm: product.algorithm().to_string(),
            value,
        })
    }

    /// Computes the checksum of a stream.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when resolution, configuration, reading, or
    /// computation fails.
    pub fn compute_reader(&self, reader: &mut dyn Read) -> Result<Checksum, ProviderError> {
        let mut product = self.acquire()?;
        let value = product.compute_reader(reader)?;
        Ok(Checksum {
            algorithm: product.algorithm().to_string(),
            value,
        })
    }

    /// Resolves and configures a provider, then produces a scoped product.
    fn acquire(&self) -> Result<Scoped<ChecksumProduct>, ProviderError> {
        let mut provider = self.source.resolve(&self.settings.algorithm)?;
        provider.set_parameters(self.settings.parameters.clone())?;
        Ok(Scoped::new(provider.produce()?))
    }
}
