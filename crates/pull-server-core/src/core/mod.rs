// crates/pull-server-core/src/core/mod.rs
// ============================================================================
// Module: Pull Server Core Types
// Description: Canonical identifiers, protocol messages, and provider contracts.
// Purpose: Provide stable, serializable types shared by every Pull Server crate.
// Dependencies: serde, sha2, time, uuid
// ============================================================================

//! ## Overview
//! Core types define agent identifiers, pull protocol messages, the provider
//! and product contract, and the checksum capability. These types are the
//! canonical source of truth for any transport that exposes the protocol.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod checksum;
pub mod hashing;
pub mod identifiers;
pub mod protocol;
pub mod provider;
pub mod time;
pub mod validation;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use checksum::Checksum;
pub use checksum::ChecksumAlgorithm;
pub use checksum::ChecksumProduct;
pub use checksum::ChecksumProvider;
pub use checksum::ChecksumSettings;
pub use checksum::DEFAULT_CHECKSUM_ALGORITHM;
pub use identifiers::AgentId;
pub use identifiers::ConfigurationName;
pub use identifiers::IdentifierError;
pub use identifiers::JobId;
pub use identifiers::ModuleName;
pub use identifiers::ModuleVersion;
pub use protocol::ActionRequest;
pub use protocol::ActionResponse;
pub use protocol::AgentAction;
pub use protocol::AgentInformation;
pub use protocol::AgentRegistration;
pub use protocol::ClientConfigurationStatus;
pub use protocol::Configuration;
pub use protocol::ConfigurationAction;
pub use protocol::ConfigurationPayload;
pub use protocol::Module;
pub use protocol::ModulePayload;
pub use protocol::RegistrationRequest;
pub use protocol::Report;
pub use protocol::ReportEntry;
pub use protocol::ReportRequest;
pub use provider::DynProvider;
pub use provider::ParameterMap;
pub use provider::ParameterSlot;
pub use provider::Product;
pub use provider::Provider;
pub use provider::ProviderDescriptor;
pub use provider::ProviderError;
pub use provider::ProviderParameterDescriptor;
pub use provider::ProviderSource;
pub use provider::Scoped;
pub use time::Timestamp;
pub use validation::ValidationError;
