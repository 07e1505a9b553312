// crates/pull-server-core/src/runtime/store.rs
// ============================================================================
// Module: Pull Server In-Memory Store
// Description: Mutex-guarded in-memory implementation of every store interface.
// Purpose: Provide a deterministic store for tests and single-process demos.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryPullStore`] keeps each collection in its own mutex-guarded
//! `BTreeMap`. Create-once checks and sequence assignment happen while the
//! collection lock is held, so concurrent callers observe a linearizable
//! history. It is not intended for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::identifiers::AgentId;
use crate::core::identifiers::ConfigurationName;
use crate::core::identifiers::ModuleName;
use crate::core::identifiers::ModuleVersion;
use crate::core::protocol::AgentRegistration;
use crate::core::protocol::Configuration;
use crate::core::protocol::Module;
use crate::core::protocol::Report;
use crate::core::protocol::ReportEntry;
use crate::interfaces::ConfigurationStore;
use crate::interfaces::ModuleStore;
use crate::interfaces::RegistrationStore;
use crate::interfaces::ReportStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory pull store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryPullStore {
    /// Registrations keyed by agent.
    registrations: Arc<Mutex<BTreeMap<AgentId, AgentRegistration>>>,
    /// Configurations keyed by (agent, name).
    configurations: Arc<Mutex<BTreeMap<(AgentId, ConfigurationName), Configuration>>>,
    /// Modules keyed by (name, version).
    modules: Arc<Mutex<BTreeMap<(ModuleName, ModuleVersion), Module>>>,
    /// Reports per agent in sequence order.
    reports: Arc<Mutex<BTreeMap<AgentId, Vec<Report>>>>,
}

impl InMemoryPullStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Builds the error returned for a poisoned collection lock.
fn poisoned(collection: &str) -> StoreError {
    StoreError::Store(format!("{collection} store mutex poisoned"))
}

impl RegistrationStore for InMemoryPullStore {
    fn create_registration(&self, registration: &AgentRegistration) -> Result<(), StoreError> {
        let mut guard = self.registrations.lock().map_err(|_| poisoned("registration"))?;
        match guard.entry(registration.agent_id) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "agent {} is already registered",
                registration.agent_id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(registration.clone());
                Ok(())
            }
        }
    }

    fn load_registration(&self, agent_id: &AgentId) -> Result<Option<AgentRegistration>, StoreError> {
        let guard = self.registrations.lock().map_err(|_| poisoned("registration"))?;
        Ok(guard.get(agent_id).cloned())
    }
}

impl ConfigurationStore for InMemoryPullStore {
    fn put_configuration(&self, configuration: &Configuration) -> Result<(), StoreError> {
        self.configurations
            .lock()
            .map_err(|_| poisoned("configuration"))?
            .insert((configuration.agent_id, configuration.name.clone()), configuration.clone());
        Ok(())
    }

    fn load_configuration(
        &self,
        agent_id: &AgentId,
        name: &ConfigurationName,
    ) -> Result<Option<Configuration>, StoreError> {
        let guard = self.configurations.lock().map_err(|_| poisoned("configuration"))?;
        Ok(guard.get(&(*agent_id, name.clone())).cloned())
    }

    fn list_configurations(&self, agent_id: &AgentId) -> Result<Vec<ConfigurationName>, StoreError> {
        let guard = self.configurations.lock().map_err(|_| poisoned("configuration"))?;
        Ok(guard.keys().filter(|(owner, _)| owner == agent_id).map(|(_, name)| name.clone()).collect())
    }
}

impl ModuleStore for InMemoryPullStore {
    fn publish_module(&self, module: &Module) -> Result<(), StoreError> {
        let mut guard = self.modules.lock().map_err(|_| poisoned("module"))?;
        match guard.entry((module.name.clone(), module.version.clone())) {
            Entry::Occupied(_) => Err(StoreError::Conflict(format!(
                "module {} {} is already published",
                module.name, module.version
            ))),
            Entry::Vacant(slot) => {
                slot.insert(module.clone());
                Ok(())
            }
        }
    }

    fn load_module(
        &self,
        name: &ModuleName,
        version: &ModuleVersion,
    ) -> Result<Option<Module>, StoreError> {
        let guard = self.modules.lock().map_err(|_| poisoned("module"))?;
        Ok(guard.get(&(name.clone(), version.clone())).cloned())
    }
}

impl ReportStore for InMemoryPullStore {
    fn append_report(&self, entry: ReportEntry) -> Result<Report, StoreError> {
        let mut guard = self.reports.lock().map_err(|_| poisoned("report"))?;
        let reports = guard.entry(entry.agent_id).or_default();
        let sequence = reports.last().map_or(1, |last| last.sequence + 1);
        let report = Report::new(sequence, entry);
        reports.push(report.clone());
        Ok(report)
    }

    fn list_reports(&self, agent_id: &AgentId) -> Result<Vec<Report>, StoreError> {
        let guard = self.reports.lock().map_err(|_| poisoned("report"))?;
        Ok(guard.get(agent_id).cloned().unwrap_or_default())
    }
}
