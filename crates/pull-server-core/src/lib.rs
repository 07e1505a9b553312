// crates/pull-server-core/src/lib.rs
// ============================================================================
// Module: Pull Server Core Library
// Description: Public API surface for the Pull Server core.
// Purpose: Expose protocol types, provider contracts, interfaces, and runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Pull Server core implements the pull protocol used by managed nodes to
//! register, fetch configurations and modules, and submit status reports. It
//! defines the provider contract used to plug in checksum algorithms and
//! integrates with storage and key sources through explicit interfaces rather
//! than embedding a transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use interfaces::AuthzError;
pub use interfaces::AuthzKeySource;
pub use interfaces::ConfigurationStore;
pub use interfaces::ModuleStore;
pub use interfaces::PullStore;
pub use interfaces::RegistrationStore;
pub use interfaces::ReportStore;
pub use interfaces::StoreError;
pub use runtime::ActionContext;
pub use runtime::ActionDispatcher;
pub use runtime::AuthzKeyCache;
pub use runtime::AuthzKeySnapshot;
pub use runtime::AuthzMode;
pub use runtime::ChecksumActionDispatcher;
pub use runtime::ChecksumService;
pub use runtime::EventOutcome;
pub use runtime::FileEventSink;
pub use runtime::FileKeySource;
pub use runtime::HandlerConfig;
pub use runtime::HandlerError;
pub use runtime::InMemoryPullStore;
pub use runtime::MemoryEventSink;
pub use runtime::NoopEventSink;
pub use runtime::PullEvent;
pub use runtime::PullEventSink;
pub use runtime::PullHandler;
pub use runtime::StaticKeySource;
pub use runtime::StderrEventSink;
