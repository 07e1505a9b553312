// crates/pull-server-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared fixtures for pull handler tests.
// Purpose: Provide a minimal checksum provider source and handler builders.
// Dependencies: pull-server-core, sha2
// ============================================================================

//! ## Overview
//! Core tests cannot depend on the providers crate, so this module supplies a
//! single SHA-256 provider implementing the full provider lifecycle, plus
//! helpers that wire a handler around an in-memory store.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Read;
use std::sync::Arc;

use pull_server_core::AgentId;
use pull_server_core::AgentInformation;
use pull_server_core::ChecksumAlgorithm;
use pull_server_core::ChecksumProduct;
use pull_server_core::DynProvider;
use pull_server_core::HandlerConfig;
use pull_server_core::InMemoryPullStore;
use pull_server_core::MemoryEventSink;
use pull_server_core::ParameterMap;
use pull_server_core::ParameterSlot;
use pull_server_core::Product;
use pull_server_core::Provider;
use pull_server_core::ProviderDescriptor;
use pull_server_core::ProviderError;
use pull_server_core::ProviderParameterDescriptor;
use pull_server_core::ProviderSource;
use pull_server_core::PullHandler;
use pull_server_core::RegistrationRequest;
use pull_server_core::hashing::hex_upper;
use sha2::Digest;
use sha2::Sha256;

// ============================================================================
// SECTION: Fixture Provider
// ============================================================================

/// SHA-256 product used by core tests.
pub struct FixtureDigest {
    hasher: Sha256,
    disposed: bool,
}

impl Product for FixtureDigest {
    fn dispose(&mut self) {
        self.disposed = true;
    }

    fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl ChecksumAlgorithm for FixtureDigest {
    fn algorithm(&self) -> &str {
        "SHA-256"
    }

    fn compute_bytes(&mut self, bytes: &[u8]) -> Result<String, ProviderError> {
        if self.disposed {
            return Err(ProviderError::Usage("disposed".to_string()));
        }
        self.hasher.update(bytes);
        Ok(hex_upper(&self.hasher.finalize_reset()))
    }

    fn compute_reader(&mut self, reader: &mut dyn Read) -> Result<String, ProviderError> {
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer).map_err(|err| ProviderError::Io(err.to_string()))?;
        self.compute_bytes(&buffer)
    }
}

/// Provider yielding [`FixtureDigest`] products.
pub struct FixtureProvider {
    descriptor: ProviderDescriptor,
    parameters: Vec<ProviderParameterDescriptor>,
    slot: ParameterSlot,
}

impl FixtureProvider {
    pub fn new() -> Self {
        Self {
            descriptor: ProviderDescriptor::new("SHA-256", "SHA-256", "fixture digest"),
            parameters: vec![ProviderParameterDescriptor::optional("salt", "Salt", "unused")],
            slot: ParameterSlot::new(),
        }
    }
}

impl Provider for FixtureProvider {
    type Product = ChecksumProduct;

    fn describe(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn describe_parameters(&self) -> &[ProviderParameterDescriptor] {
        &self.parameters
    }

    fn set_parameters(&mut self, parameters: ParameterMap) -> Result<(), ProviderError> {
        self.slot.configure(&self.parameters, parameters)
    }

    fn is_configured(&self) -> bool {
        self.slot.is_configured()
    }

    fn produce(&self) -> Result<Self::Product, ProviderError> {
        self.slot.configured(self.descriptor.name())?;
        Ok(Box::new(FixtureDigest {
            hasher: Sha256::new(),
            disposed: false,
        }))
    }
}

/// Provider source exposing only the fixture provider.
pub struct FixtureSource;

impl ProviderSource<ChecksumProduct> for FixtureSource {
    fn provider_names(&self) -> Vec<String> {
        vec!["SHA-256".to_string()]
    }

    fn resolve(&self, name: &str) -> Result<DynProvider<ChecksumProduct>, ProviderError> {
        if name == "SHA-256" {
            Ok(Box::new(FixtureProvider::new()))
        } else {
            Err(ProviderError::NotFound(name.to_string()))
        }
    }
}

/// Provider source with nothing resolvable.
pub struct EmptySource;

impl ProviderSource<ChecksumProduct> for EmptySource {
    fn provider_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn resolve(&self, _name: &str) -> Result<DynProvider<ChecksumProduct>, ProviderError> {
        Err(ProviderError::Resolution("no providers are resolvable".to_string()))
    }
}

// ============================================================================
// SECTION: Handler Builders
// ============================================================================

/// Handler plus the collaborators tests inspect.
pub struct Harness {
    pub handler: PullHandler,
    pub store: Arc<InMemoryPullStore>,
    pub events: Arc<MemoryEventSink>,
}

/// Builds a handler over an in-memory store with the fixture checksum source.
pub fn harness() -> Harness {
    harness_with(HandlerConfig::default())
}

/// Builds a handler with explicit settings.
pub fn harness_with(config: HandlerConfig) -> Harness {
    let store = Arc::new(InMemoryPullStore::new());
    let events = Arc::new(MemoryEventSink::new());
    let handler = PullHandler::new(store.clone(), Arc::new(FixtureSource), events.clone(), config);
    Harness {
        handler,
        store,
        events,
    }
}

/// Registration request naming the given configurations.
pub fn registration(names: &[&str]) -> RegistrationRequest {
    RegistrationRequest {
        agent_information: AgentInformation {
            lcm_version: "2.0".to_string(),
            node_name: "node-01".to_string(),
            ip_addresses: vec!["10.0.0.5".to_string()],
        },
        configuration_names: names.iter().map(ToString::to_string).collect(),
        registration_key: None,
        certificate_thumbprint: None,
    }
}

/// Registers a fresh agent and returns its identifier.
pub fn registered_agent(handler: &PullHandler, names: &[&str]) -> AgentId {
    let agent_id = AgentId::generate();
    handler.register_agent(agent_id, registration(names)).expect("register agent");
    agent_id
}

/// Uppercase hex SHA-256 of bytes.
pub fn sha256(bytes: &[u8]) -> String {
    hex_upper(&Sha256::digest(bytes))
}
