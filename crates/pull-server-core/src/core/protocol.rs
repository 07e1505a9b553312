// crates/pull-server-core/src/core/protocol.rs
// ============================================================================
// Module: Pull Protocol Types
// Description: Typed requests, responses, and persisted records.
// Purpose: Give the handler and stores one shared vocabulary for the protocol.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Requests arrive already decoded from the transport layer. Records that are
//! persisted (registrations, configurations, modules, reports) are plain serde
//! structs so every store backend can serialize them the same way.
//! Report times stay raw strings on the request and become parsed
//! [`OffsetDateTime`] values only once a report has been accepted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

use crate::core::checksum::Checksum;
use crate::core::identifiers::AgentId;
use crate::core::identifiers::ConfigurationName;
use crate::core::identifiers::JobId;
use crate::core::identifiers::ModuleName;
use crate::core::identifiers::ModuleVersion;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Registration
// ============================================================================

/// Agent self-description sent at registration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentInformation {
    /// Local configuration manager version reported by the agent.
    pub lcm_version: String,
    /// Node host name.
    pub node_name: String,
    /// Node IP addresses.
    #[serde(default)]
    pub ip_addresses: Vec<String>,
}

/// Registration request payload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Agent self-description.
    pub agent_information: AgentInformation,
    /// Configuration names the agent should pull.
    #[serde(default)]
    pub configuration_names: Vec<String>,
    /// Shared registration key, when the server requires one.
    #[serde(default)]
    pub registration_key: Option<String>,
    /// Client certificate thumbprint presented by the agent.
    #[serde(default)]
    pub certificate_thumbprint: Option<String>,
}

/// Persisted registration record. The registration key is never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRegistration {
    /// Registered agent identifier.
    pub agent_id: AgentId,
    /// Agent self-description.
    pub agent_information: AgentInformation,
    /// Assigned configuration names.
    pub configuration_names: Vec<ConfigurationName>,
    /// Client certificate thumbprint.
    pub certificate_thumbprint: Option<String>,
    /// Server-assigned registration time.
    pub registered_at: Timestamp,
}

// ============================================================================
// SECTION: Configurations and Modules
// ============================================================================

/// Stored configuration document for one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    /// Owning agent.
    pub agent_id: AgentId,
    /// Configuration name.
    pub name: ConfigurationName,
    /// Raw configuration content.
    pub content: Vec<u8>,
}

/// Configuration served to an agent with its serve-time checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationPayload {
    /// Configuration name.
    pub name: ConfigurationName,
    /// Raw configuration content.
    pub content: Vec<u8>,
    /// Checksum of `content`.
    pub checksum: Checksum,
}

/// Published module archive addressed by exact (name, version).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module name.
    pub name: ModuleName,
    /// Module version.
    pub version: ModuleVersion,
    /// Raw archive content.
    pub content: Vec<u8>,
}

/// Module served to an agent with its serve-time checksum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModulePayload {
    /// Module name.
    pub name: ModuleName,
    /// Module version.
    pub version: ModuleVersion,
    /// Raw archive content.
    pub content: Vec<u8>,
    /// Checksum of `content`.
    pub checksum: Checksum,
}

// ============================================================================
// SECTION: Reports
// ============================================================================

/// Status report as submitted by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReportRequest {
    /// Job the report belongs to.
    pub job_id: Option<JobId>,
    /// Operation type, e.g. `Consistency` or `Initial`.
    #[serde(default)]
    pub operation_type: String,
    /// RFC 3339 start time.
    #[serde(default)]
    pub start_time: Option<String>,
    /// RFC 3339 end time.
    #[serde(default)]
    pub end_time: Option<String>,
    /// Status entries.
    #[serde(default)]
    pub status_data: Vec<String>,
    /// Error entries.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Free-form additional data.
    #[serde(default)]
    pub additional_data: BTreeMap<String, String>,
}

/// Validated report awaiting a store-assigned sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Reporting agent.
    pub agent_id: AgentId,
    /// Job the report belongs to.
    pub job_id: JobId,
    /// Operation type.
    pub operation_type: String,
    /// Parsed start time.
    #[serde(with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    /// Parsed end time.
    #[serde(with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    /// Status entries.
    pub status_data: Vec<String>,
    /// Error entries.
    pub errors: Vec<String>,
    /// Free-form additional data.
    pub additional_data: BTreeMap<String, String>,
    /// Server receive time.
    pub received_at: Timestamp,
}

/// Stored report with its per-agent submission sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Per-agent submission order, starting at 1.
    pub sequence: u64,
    /// Report body.
    #[serde(flatten)]
    pub entry: ReportEntry,
}

impl Report {
    /// Attaches a sequence to a validated entry.
    #[must_use]
    pub const fn new(sequence: u64, entry: ReportEntry) -> Self {
        Self {
            sequence,
            entry,
        }
    }

    /// Returns the job identifier.
    #[must_use]
    pub const fn job_id(&self) -> JobId {
        self.entry.job_id
    }
}

// ============================================================================
// SECTION: Actions
// ============================================================================

/// Checksum an agent reports for a configuration it currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfigurationStatus {
    /// Configuration name.
    pub name: ConfigurationName,
    /// Agent-side checksum, absent when the agent holds no copy.
    #[serde(default)]
    pub checksum: Option<String>,
}

/// Request for the next action an agent should take.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Configuration state reported by the agent.
    #[serde(default)]
    pub configurations: Vec<ClientConfigurationStatus>,
}

/// Action an agent should take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentAction {
    /// Nothing to do.
    Ok,
    /// Retry later.
    Retry,
    /// Pull a fresh configuration.
    GetConfiguration,
}

/// Action decided for a single configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationAction {
    /// Configuration name.
    pub name: ConfigurationName,
    /// Decided action.
    pub action: AgentAction,
}

/// Aggregate action response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    /// Most urgent action across all details.
    pub overall: AgentAction,
    /// Per-configuration actions.
    pub details: Vec<ConfigurationAction>,
}

impl ActionResponse {
    /// Builds a response whose overall action is the most urgent detail.
    #[must_use]
    pub fn from_details(details: Vec<ConfigurationAction>) -> Self {
        let overall =
            details.iter().map(|detail| detail.action).max().unwrap_or(AgentAction::Ok);
        Self {
            overall,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ActionResponse;
    use super::AgentAction;
    use super::ConfigurationAction;
    use crate::core::identifiers::ConfigurationName;

    fn detail(name: &str, action: AgentAction) -> ConfigurationAction {
        ConfigurationAction {
            name: ConfigurationName::new(name),
            action,
        }
    }

    #[test]
    fn overall_action_prefers_get_configuration() {
        let response = ActionResponse::from_details(vec![
            detail("a", AgentAction::Ok),
            detail("b", AgentAction::GetConfiguration),
            detail("c", AgentAction::Retry),
        ]);
        assert_eq!(response.overall, AgentAction::GetConfiguration);
    }

    #[test]
    fn empty_details_mean_ok() {
        assert_eq!(ActionResponse::from_details(Vec::new()).overall, AgentAction::Ok);
    }
}
