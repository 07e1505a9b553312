// crates/pull-server-core/src/core/checksum.rs
// ============================================================================
// Module: Checksum Contract
// Description: Checksum products, settings, and result values.
// Purpose: Specialize the provider contract for content checksums.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A checksum provider is any [`Provider`] whose product implements
//! [`ChecksumAlgorithm`]. Results are uppercase hexadecimal without
//! separators, and byte-slice and stream computations over the same content
//! must agree.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;

use serde::Deserialize;
use serde::Serialize;

use crate::core::provider::DynProvider;
use crate::core::provider::ParameterMap;
use crate::core::provider::Product;
use crate::core::provider::ProviderError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Algorithm used when configuration does not name one.
pub const DEFAULT_CHECKSUM_ALGORITHM: &str = "SHA-256";

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// Checksum product yielded by a configured checksum provider.
pub trait ChecksumAlgorithm: Product {
    /// Returns the algorithm name reported alongside checksum values.
    fn algorithm(&self) -> &str;

    /// Computes the checksum of a byte slice.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Usage`] after disposal.
    fn compute_bytes(&mut self, bytes: &[u8]) -> Result<String, ProviderError>;

    /// Computes the checksum of a byte stream.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Usage`] after disposal and
    /// [`ProviderError::Io`] when the stream fails.
    fn compute_reader(&mut self, reader: &mut dyn Read) -> Result<String, ProviderError>;
}

/// Boxed checksum product.
pub type ChecksumProduct = Box<dyn ChecksumAlgorithm>;

/// Boxed checksum provider.
pub type ChecksumProvider = DynProvider<ChecksumProduct>;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Checksum value paired with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksum {
    /// Algorithm name.
    pub algorithm: String,
    /// Uppercase hex digest.
    pub value: String,
}

/// Provider selection used by the handler for serve-time checksums.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecksumSettings {
    /// Provider name to resolve.
    pub algorithm: String,
    /// Parameters applied before producing.
    #[serde(default)]
    pub parameters: ParameterMap,
}

impl Default for ChecksumSettings {
    fn default() -> Self {
        Self {
            algorithm: DEFAULT_CHECKSUM_ALGORITHM.to_string(),
            parameters: ParameterMap::new(),
        }
    }
}
