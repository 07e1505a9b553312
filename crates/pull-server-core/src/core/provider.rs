// crates/pull-server-core/src/core/provider.rs
// ============================================================================
// Module: Provider Contract
// Description: Descriptors, parameters, and the provider/product lifecycle.
// Purpose: Define the stable extensibility contract for pluggable algorithms.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! A provider is a named, parameterizable factory for a pluggable capability.
//! Its lifecycle is `Unconfigured -> Configured -> ProductLive -> ProductDisposed`:
//! - [`Provider::describe`] and [`Provider::describe_parameters`] are pure
//!   metadata queries callable in any state.
//! - [`Provider::set_parameters`] validates eagerly and replaces any earlier
//!   parameters. A failed call leaves the provider unconfigured.
//! - [`Provider::produce`] requires a configured provider and yields a fresh,
//!   independent [`Product`] on every call.
//! - [`Product::dispose`] is idempotent; every other product operation after
//!   disposal fails with [`ProviderError::Usage`].
//!
//! Callers hold products through [`Scoped`], which disposes on every exit path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::ops::Deref;
use std::ops::DerefMut;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Descriptors
// ============================================================================

/// Parameter values supplied to [`Provider::set_parameters`].
pub type ParameterMap = BTreeMap<String, String>;

/// Immutable provider metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Unique provider name within a registry.
    name: String,
    /// Human-readable label.
    label: String,
    /// Longer description.
    description: String,
}

impl ProviderDescriptor {
    /// Creates a new provider descriptor.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            description: description.into(),
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Metadata for a single provider parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderParameterDescriptor {
    /// Parameter name.
    name: String,
    /// Whether the parameter must be supplied.
    required: bool,
    /// Human-readable label.
    label: String,
    /// Longer description.
    description: String,
}

impl ProviderParameterDescriptor {
    /// Creates a parameter descriptor; `required` is stored as passed.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        required: bool,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            required,
            label: label.into(),
            description: description.into(),
        }
    }

    /// Creates a required parameter descriptor.
    #[must_use]
    pub fn required(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, true, label, description)
    }

    /// Creates an optional parameter descriptor.
    #[must_use]
    pub fn optional(
        name: impl Into<String>,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self::new(name, false, label, description)
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true when the parameter is required.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    /// Returns the human-readable label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Provider resolution, configuration, and usage errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No provider is registered under the requested name.
    #[error("provider not found: {0}")]
    NotFound(String),
    /// The provider set cannot resolve anything (empty or ambiguous).
    #[error("provider resolution failed: {0}")]
    Resolution(String),
    /// Parameters are missing, unknown, or malformed.
    #[error("invalid provider parameters: {0}")]
    Validation(String),
    /// Invalid call sequence on a provider or product.
    #[error("invalid provider usage: {0}")]
    Usage(String),
    /// I/O failure while a product consumed a stream.
    #[error("provider io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Contracts
// ============================================================================

/// Disposable instance yielded by a configured provider.
pub trait Product: Send {
    /// Releases the product. Calling it again is a no-op.
    fn dispose(&mut self);

    /// Returns true once the product has been disposed.
    fn is_disposed(&self) -> bool;
}

impl<P: Product + ?Sized> Product for Box<P> {
    fn dispose(&mut self) {
        (**self).dispose();
    }

    fn is_disposed(&self) -> bool {
        (**self).is_disposed()
    }
}

/// Named, parameterizable factory for a pluggable capability.
pub trait Provider: Send {
    /// Product type yielded by [`Provider::produce`].
    type Product: Product;

    /// Returns the provider descriptor.
    fn describe(&self) -> &ProviderDescriptor;

    /// Returns the parameters accepted by the provider.
    fn describe_parameters(&self) -> &[ProviderParameterDescriptor];

    /// Replaces the provider parameters, validating them eagerly.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Validation`] when a required parameter is
    /// missing or a value is rejected. The provider is left unconfigured.
    fn set_parameters(&mut self, parameters: ParameterMap) -> Result<(), ProviderError>;

    /// Returns true once parameters have been accepted.
    fn is_configured(&self) -> bool;

    /// Produces a fresh product.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Usage`] when called before a successful
    /// [`Provider::set_parameters`].
    fn produce(&self) -> Result<Self::Product, ProviderError>;
}

/// Boxed provider yielding products of type `P`.
pub type DynProvider<P> = Box<dyn Provider<Product = P>>;

/// Source of freshly resolved providers, implemented by provider registries.
pub trait ProviderSource<P>: Send + Sync {
    /// Returns the names of all resolvable providers in stable order.
    fn provider_names(&self) -> Vec<String>;

    /// Resolves a fresh, unconfigured provider by name.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] for unknown names and
    /// [`ProviderError::Resolution`] when nothing is resolvable.
    fn resolve(&self, name: &str) -> Result<DynProvider<P>, ProviderError>;
}

// ============================================================================
// SECTION: Parameter Handling
// ============================================================================

/// Parameter storage implementing the configured-state rules.
///
/// # Invariants
/// - Parameters are only stored after passing [`validate_parameters`].
/// - A failed configuration clears previously accepted parameters.
#[derive(Debug, Clone, Default)]
pub struct ParameterSlot {
    /// Accepted parameters, `None` while unconfigured.
    parameters: Option<ParameterMap>,
}

impl ParameterSlot {
    /// Creates an unconfigured slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            parameters: None,
        }
    }

    /// Validates and stores parameters, replacing earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Validation`] when validation fails.
    pub fn configure(
        &mut self,
        descriptors: &[ProviderParameterDescriptor],
        parameters: ParameterMap,
    ) -> Result<(), ProviderError> {
        self.parameters = None;
        validate_parameters(descriptors, &parameters)?;
        self.parameters = Some(parameters);
        Ok(())
    }

    /// Returns true when parameters have been accepted.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.parameters.is_some()
    }

    /// Returns the accepted parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Usage`] while the slot is unconfigured.
    pub fn configured(&self, provider: &str) -> Result<&ParameterMap, ProviderError> {
        self.parameters.as_ref().ok_or_else(|| {
            ProviderError::Usage(format!("provider {provider} used before set_parameters"))
        })
    }
}

/// Checks a parameter map against its descriptors.
///
/// # Errors
///
/// Returns [`ProviderError::Validation`] for unknown names or missing/blank
/// required values.
pub fn validate_parameters(
    descriptors: &[ProviderParameterDescriptor],
    parameters: &ParameterMap,
) -> Result<(), ProviderError> {
    for name in parameters.keys() {
        if !descriptors.iter().any(|descriptor| descriptor.name() == name) {
            return Err(ProviderError::Validation(format!("unknown parameter: {name}")));
        }
    }
    for descriptor in descriptors.iter().filter(|descriptor| descriptor.is_required()) {
        let present = parameters
            .get(descriptor.name())
            .is_some_and(|value| !value.trim().is_empty());
        if !present {
            return Err(ProviderError::Validation(format!(
                "missing required parameter: {}",
                descriptor.name()
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Scoped Acquisition
// ============================================================================

/// Owns a product for one operation and disposes it when dropped.
pub struct Scoped<P: Product> {
    /// Product held for the scope.
    product: P,
}

impl<P: Product> Scoped<P> {
    /// Takes ownership of a freshly produced product.
    #[must_use]
    pub const fn new(product: P) -> Self {
        Self {
            product,
        }
    }
}

impl<P: Product> Deref for Scoped<P> {
    type Target = P;

    fn deref(&self) -> &Self::Target {
        &self.product
    }
}

impl<P: Product> DerefMut for Scoped<P> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.product
    }
}

impl<P: Product> Drop for Scoped<P> {
    fn drop(&mut self) {
        self.product.dispose();
    }
}
