// crates/pull-server-core/src/interfaces/mod.rs
// ============================================================================
// Module: Pull Server Interfaces
// Description: Backend-agnostic interfaces for storage and key sources.
// Purpose: Define the contract surfaces used by the Pull Server runtime.
// Dependencies: crate::core
// ============================================================================

//! ## Overview
//! Interfaces define how the pull handler reaches persistence and the
//! authorization key backend without embedding backend-specific details.
//! Implementations must be safe for concurrent use and fail closed on missing
//! or invalid data. Every mutation is a single atomic step.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::identifiers::AgentId;
use crate::core::identifiers::ConfigurationName;
use crate::core::identifiers::ModuleName;
use crate::core::identifiers::ModuleVersion;
use crate::core::protocol::AgentRegistration;
use crate::core::protocol::Configuration;
use crate::core::protocol::Module;
use crate::core::protocol::Report;
use crate::core::protocol::ReportEntry;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Pull store errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("pull store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("pull store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("pull store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("pull store invalid data: {0}")]
    Invalid(String),
    /// A create-once record already exists.
    #[error("pull store conflict: {0}")]
    Conflict(String),
    /// The backend does not support the operation.
    #[error("pull store operation not implemented: {0}")]
    NotImplemented(String),
    /// Store reported an error.
    #[error("pull store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Stores
// ============================================================================

/// Agent registration persistence.
pub trait RegistrationStore: Send + Sync {
    /// Creates a registration if none exists for the agent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the agent is already registered.
    fn create_registration(&self, registration: &AgentRegistration) -> Result<(), StoreError>;

    /// Loads a registration by agent identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_registration(&self, agent_id: &AgentId) -> Result<Option<AgentRegistration>, StoreError>;
}

/// Per-agent configuration persistence.
pub trait ConfigurationStore: Send + Sync {
    /// Inserts or replaces a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when saving fails.
    fn put_configuration(&self, configuration: &Configuration) -> Result<(), StoreError>;

    /// Loads a configuration by (agent, name).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_configuration(
        &self,
        agent_id: &AgentId,
        name: &ConfigurationName,
    ) -> Result<Option<Configuration>, StoreError>;

    /// Lists configuration names stored for an agent, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_configurations(&self, agent_id: &AgentId) -> Result<Vec<ConfigurationName>, StoreError>;
}

/// Module archive persistence keyed by exact (name, version).
pub trait ModuleStore: Send + Sync {
    /// Publishes a module once.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the (name, version) exists.
    fn publish_module(&self, module: &Module) -> Result<(), StoreError>;

    /// Loads a module by exact (name, version).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn load_module(
        &self,
        name: &ModuleName,
        version: &ModuleVersion,
    ) -> Result<Option<Module>, StoreError>;
}

/// Append-only report persistence.
pub trait ReportStore: Send + Sync {
    /// Appends a report and assigns the next per-agent sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append fails; nothing is recorded.
    fn append_report(&self, entry: ReportEntry) -> Result<Report, StoreError>;

    /// Lists reports for an agent in sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_reports(&self, agent_id: &AgentId) -> Result<Vec<Report>, StoreError>;
}

/// Combined store used by the pull handler.
pub trait PullStore: RegistrationStore + ConfigurationStore + ModuleStore + ReportStore {}

impl<T> PullStore for T where T: RegistrationStore + ConfigurationStore + ModuleStore + ReportStore {}

// ============================================================================
// SECTION: Authorization Key Source
// ============================================================================

/// Authorization key source errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    /// The key backend reported an error.
    #[error("authorization key source error: {0}")]
    Source(String),
    /// Key material could not be read.
    #[error("authorization key io error: {0}")]
    Io(String),
}

/// Backend supplying the current set of authorized keys.
pub trait AuthzKeySource: Send + Sync {
    /// Fetches the full key set.
    ///
    /// # Errors
    ///
    /// Returns [`AuthzError`] when the backend cannot be read.
    fn fetch_keys(&self) -> Result<BTreeSet<String>, AuthzError>;
}
