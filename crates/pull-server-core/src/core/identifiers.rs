// crates/pull-server-core/src/core/identifiers.rs
// ============================================================================
// Module: Pull Server Identifiers
// Description: Canonical identifiers for agents, jobs, configurations, and modules.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde, thiserror, uuid
// ============================================================================

//! ## Overview
//! Agents and jobs are addressed by 128-bit UUIDs that serialize in their
//! hyphenated lowercase form. Configuration and module names are opaque string
//! wrappers; their character rules are enforced at the handler boundary by
//! [`crate::core::validation`] rather than inside these wrappers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing identifiers from their string form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The value is not a valid 128-bit UUID.
    #[error("invalid {kind} identifier: {value}")]
    InvalidUuid {
        /// Identifier kind label.
        kind: &'static str,
        /// Offending input value.
        value: String,
    },
}

// ============================================================================
// SECTION: UUID Identifiers
// ============================================================================

/// Agent (node) identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(Uuid);

impl AgentId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a random agent identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses an agent identifier from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidUuid`] when the value is not a UUID.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        Uuid::parse_str(value.trim()).map(Self).map_err(|_| IdentifierError::InvalidUuid {
            kind: "agent",
            value: value.to_string(),
        })
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for AgentId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Job identifier attached to a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// Generates a random job identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parses a job identifier from its string form.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::InvalidUuid`] when the value is not a UUID.
    pub fn parse(value: &str) -> Result<Self, IdentifierError> {
        Uuid::parse_str(value.trim()).map(Self).map_err(|_| IdentifierError::InvalidUuid {
            kind: "job",
            value: value.to_string(),
        })
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for JobId {
    type Err = IdentifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

// ============================================================================
// SECTION: Name Identifiers
// ============================================================================

/// Configuration name assigned to an agent.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationName(String);

impl ConfigurationName {
    /// Creates a new configuration name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConfigurationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ConfigurationName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ConfigurationName {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Module name half of the (name, version) module key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleName(String);

impl ModuleName {
    /// Creates a new module name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModuleName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Module version half of the (name, version) module key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleVersion(String);

impl ModuleVersion {
    /// Creates a new module version.
    #[must_use]
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ModuleVersion {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
