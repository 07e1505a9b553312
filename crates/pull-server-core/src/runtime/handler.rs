// crates/pull-server-core/src/runtime/handler.rs
// ============================================================================
// Module: Pull Protocol Handler
// Description: Registration, configuration, module, report, and action operations.
// Purpose: Enforce pull protocol rules on top of backend-agnostic stores.
// Dependencies: serde_json, crate::{core, interfaces}
// ============================================================================

//! ## Overview
//! [`PullHandler`] is the single entry point for transport layers. It is
//! `Send + Sync` and safe to call concurrently; atomicity of create-once and
//! append operations is delegated to the store.
//!
//! Rules enforced here:
//! - untrusted names and versions are validated before any store access
//! - registrations are create-once; a second registration is a conflict
//! - configurations are served only to registered agents
//! - checksums are computed at serve time with a freshly produced product
//! - reports are validated completely before anything is appended
//!
//! Every operation records one [`PullEvent`] through the injected sink.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use thiserror::Error;

use crate::core::checksum::ChecksumProduct;
use crate::core::checksum::ChecksumSettings;
use crate::core::hashing::fingerprint;
use crate::core::identifiers::AgentId;
use crate::core::identifiers::ConfigurationName;
use crate::core::identifiers::JobId;
use crate::core::identifiers::ModuleName;
use crate::core::identifiers::ModuleVersion;
use crate::core::protocol::ActionRequest;
use crate::core::protocol::ActionResponse;
use crate::core::protocol::AgentRegistration;
use crate::core::protocol::Configuration;
use crate::core::protocol::ConfigurationPayload;
use crate::core::protocol::Module;
use crate::core::protocol::ModulePayload;
use crate::core::protocol::RegistrationRequest;
use crate::core::protocol::Report;
use crate::core::protocol::ReportEntry;
use crate::core::protocol::ReportRequest;
use crate::core::provider::ProviderError;
use crate::core::provider::ProviderSource;
use crate::core::time::Timestamp;
use crate::core::time::parse_report_time;
use crate::core::validation::ValidationError;
use crate::core::validation::validate_configuration_name;
use crate::core::validation::validate_module_key;
use crate::interfaces::PullStore;
use crate::interfaces::StoreError;
use crate::runtime::actions::ActionContext;
use crate::runtime::actions::ActionDispatcher;
use crate::runtime::authz::AuthzKeyCache;
use crate::runtime::checksum::ChecksumService;
use crate::runtime::events::EventOutcome;
use crate::runtime::events::PullEvent;
use crate::runtime::events::PullEventSink;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum serialized report size in bytes.
pub const DEFAULT_MAX_REPORT_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Pull handler errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    /// Agent, configuration, module, or report does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Create-once record already exists.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Request input is malformed.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Registration key missing or unknown.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Configured provider cannot be resolved.
    #[error("provider resolution failed: {0}")]
    PluginResolution(String),
    /// Provider misconfiguration or misuse.
    #[error("provider usage error: {0}")]
    Usage(String),
    /// Operation has no configured backend.
    #[error("not implemented: {0}")]
    NotImplemented(String),
    /// Store failure.
    #[error("store error: {0}")]
    Store(String),
}

impl HandlerError {
    /// Returns true for outcomes caused by the caller rather than the server.
    #[must_use]
    pub const fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Conflict(_)
                | Self::Validation(_)
                | Self::Unauthorized(_)
                | Self::NotImplemented(_)
        )
    }

    /// Returns the event outcome for this error.
    const fn outcome(&self) -> EventOutcome {
        match self {
            Self::NotFound(_) => EventOutcome::NotFound,
            Self::Conflict(_) => EventOutcome::Conflict,
            Self::Validation(_) | Self::Unauthorized(_) | Self::NotImplemented(_) => {
                EventOutcome::Rejected
            }
            Self::PluginResolution(_) | Self::Usage(_) | Self::Store(_) => EventOutcome::Failed,
        }
    }
}

impl From<StoreError> for HandlerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::NotImplemented(message) => Self::NotImplemented(message),
            other => Self::Store(other.to_string()),
        }
    }
}

impl From<ProviderError> for HandlerError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(_) | ProviderError::Resolution(_) => {
                Self::PluginResolution(err.to_string())
            }
            ProviderError::Validation(_) | ProviderError::Usage(_) => Self::Usage(err.to_string()),
            ProviderError::Io(_) => Self::Store(err.to_string()),
        }
    }
}

impl From<ValidationError> for HandlerError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Handler behavior settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    /// Checksum provider selection.
    pub checksum: ChecksumSettings,
    /// Maximum serialized report size in bytes.
    pub max_report_bytes: usize,
    /// Require an authorized registration key when a key cache is attached.
    pub require_registration_key: bool,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            checksum: ChecksumSettings::default(),
            max_report_bytes: DEFAULT_MAX_REPORT_BYTES,
            require_registration_key: true,
        }
    }
}

// ============================================================================
// SECTION: Handler
// ============================================================================

/// Pull protocol handler.
pub struct PullHandler {
    /// Backing store.
    store: Arc<dyn PullStore>,
    /// Serve-time checksum computation.
    checksums: ChecksumService,
    /// Registration key cache.
    authz: Option<Arc<AuthzKeyCache>>,
    /// Optional get-action backend.
    dispatcher: Option<Arc<dyn ActionDispatcher>>,
    /// Event sink.
    events: Arc<dyn PullEventSink>,
    /// Behavior settings.
    config: HandlerConfig,
}

impl PullHandler {
    /// Creates a handler without authorization or action dispatch.
    #[must_use]
    pub fn new(
        store: Arc<dyn PullStore>,
        checksum_source: Arc<dyn ProviderSource<ChecksumProduct>>,
        events: Arc<dyn PullEventSink>,
        config: HandlerConfig,
    ) -> Self {
        Self {
            store,
            checksums: ChecksumService::new(checksum_source, config.checksum.clone()),
            authz: None,
            dispatcher: None,
            events,
            config,
        }
    }

    /// Attaches a registration key cache.
    #[must_use]
    pub fn with_authz(mut self, authz: Arc<AuthzKeyCache>) -> Self {
        self.authz = Some(authz);
        self
    }

    /// Attaches an action dispatcher.
    #[must_use]
    pub fn with_action_dispatcher(mut self, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Returns the handler settings.
    #[must_use]
    pub const fn config(&self) -> &HandlerConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Registers an agent once.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Unauthorized`] for a missing or unknown key,
    /// [`HandlerError::Validation`] for malformed names, and
    /// [`HandlerError::Conflict`] when the agent is already registered.
    pub fn register_agent(
        &self,
        agent_id: AgentId,
        request: RegistrationRequest,
    ) -> Result<AgentRegistration, HandlerError> {
        let result = self.register_agent_inner(agent_id, request);
        self.finish("register_agent", Some(agent_id), result)
    }

    /// Registration body.
    fn register_agent_inner(
        &self,
        agent_id: AgentId,
        request: RegistrationRequest,
    ) -> Result<AgentRegistration, HandlerError> {
        self.check_registration_key(request.registration_key.as_deref())?;
        let configuration_names = request
            .configuration_names
            .into_iter()
            .map(ConfigurationName::new)
            .collect::<Vec<_>>();
        for name in &configuration_names {
            validate_configuration_name(name)?;
        }
        let registration = AgentRegistration {
            agent_id,
            agent_information: request.agent_information,
            configuration_names,
            certificate_thumbprint: request.certificate_thumbprint,
            registered_at: Timestamp::now(),
        };
        self.store.create_registration(&registration)?;
        Ok(registration)
    }

    /// Enforces the registration key policy.
    fn check_registration_key(&self, key: Option<&str>) -> Result<(), HandlerError> {
        if !self.config.require_registration_key {
            return Ok(());
        }
        let Some(cache) = &self.authz else {
            return Ok(());
        };
        if !cache.mode().is_enabled() {
            return Ok(());
        }
        match key.map(str::trim).filter(|key| !key.is_empty()) {
            None => Err(HandlerError::Unauthorized("registration key required".to_string())),
            Some(key) if cache.is_authorized(key) => Ok(()),
            Some(key) => Err(HandlerError::Unauthorized(format!(
                "registration key {} is not authorized",
                fingerprint(key)
            ))),
        }
    }

    /// Loads a registration or reports the agent as unknown.
    fn require_registration(&self, agent_id: &AgentId) -> Result<AgentRegistration, HandlerError> {
        self.store
            .load_registration(agent_id)?
            .ok_or_else(|| HandlerError::NotFound(format!("agent {agent_id} is not registered")))
    }

    // ------------------------------------------------------------------------
    // Configurations and Modules
    // ------------------------------------------------------------------------

    /// Serves a configuration with its serve-time checksum.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotFound`] for unregistered agents or absent
    /// configurations.
    pub fn get_configuration(
        &self,
        agent_id: AgentId,
        name: &ConfigurationName,
    ) -> Result<ConfigurationPayload, HandlerError> {
        let result = self.get_configuration_inner(agent_id, name);
        self.finish("get_configuration", Some(agent_id), result)
    }

    /// Configuration lookup body.
    fn get_configuration_inner(
        &self,
        agent_id: AgentId,
        name: &ConfigurationName,
    ) -> Result<ConfigurationPayload, HandlerError> {
        validate_configuration_name(name)?;
        self.require_registration(&agent_id)?;
        let configuration = self.store.load_configuration(&agent_id, name)?.ok_or_else(|| {
            HandlerError::NotFound(format!("configuration {name} for agent {agent_id}"))
        })?;
        let checksum = self.checksums.compute(&configuration.content)?;
        Ok(ConfigurationPayload {
            name: configuration.name,
            content: configuration.content,
            checksum,
        })
    }

    /// Serves a module by exact (name, version) with its checksum.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Validation`] for malformed keys and
    /// [`HandlerError::NotFound`] when the module is absent.
    pub fn get_module(
        &self,
        name: &ModuleName,
        version: &ModuleVersion,
    ) -> Result<ModulePayload, HandlerError> {
        let result = self.get_module_inner(name, version);
        self.finish("get_module", None, result)
    }

    /// Module lookup body.
    fn get_module_inner(
        &self,
        name: &ModuleName,
        version: &ModuleVersion,
    ) -> Result<ModulePayload, HandlerError> {
        validate_module_key(name, version)?;
        let module = self
            .store
            .load_module(name, version)?
            .ok_or_else(|| HandlerError::NotFound(format!("module {name} {version}")))?;
        let checksum = self.checksums.compute(&module.content)?;
        Ok(ModulePayload {
            name: module.name,
            version: module.version,
            content: module.content,
            checksum,
        })
    }

    /// Stores or replaces a configuration for an agent.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Validation`] for malformed names.
    pub fn publish_configuration(
        &self,
        agent_id: AgentId,
        name: ConfigurationName,
        content: Vec<u8>,
    ) -> Result<(), HandlerError> {
        let result = validate_configuration_name(&name)
            .map_err(HandlerError::from)
            .and_then(|()| {
                self.store
                    .put_configuration(&Configuration {
                        agent_id,
                        name,
                        content,
                    })
                    .map_err(HandlerError::from)
            });
        self.finish("publish_configuration", Some(agent_id), result)
    }

    /// Publishes a module once.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Validation`] for malformed keys and
    /// [`HandlerError::Conflict`] when the (name, version) exists.
    pub fn publish_module(&self, module: &Module) -> Result<(), HandlerError> {
        let result = validate_module_key(&module.name, &module.version)
            .map_err(HandlerError::from)
            .and_then(|()| self.store.publish_module(module).map_err(HandlerError::from));
        self.finish("publish_module", None, result)
    }

    // ------------------------------------------------------------------------
    // Reports
    // ------------------------------------------------------------------------

    /// Validates and appends a status report.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotFound`] for unregistered agents and
    /// [`HandlerError::Validation`] for malformed reports; nothing is
    /// recorded on error.
    pub fn send_report(
        &self,
        agent_id: AgentId,
        request: ReportRequest,
    ) -> Result<Report, HandlerError> {
        let result = self
            .require_registration(&agent_id)
            .and_then(|_| self.validate_report(agent_id, request))
            .and_then(|entry| self.store.append_report(entry).map_err(HandlerError::from));
        self.finish("send_report", Some(agent_id), result)
    }

    /// Turns a report request into an entry ready to append.
    fn validate_report(
        &self,
        agent_id: AgentId,
        request: ReportRequest,
    ) -> Result<ReportEntry, HandlerError> {
        let size = serde_json::to_vec(&request)
            .map_err(|err| HandlerError::Validation(format!("report is not serializable: {err}")))?
            .len();
        if size > self.config.max_report_bytes {
            return Err(HandlerError::Validation(format!(
                "report exceeds size limit: {size} bytes (max {})",
                self.config.max_report_bytes
            )));
        }
        let job_id = request
            .job_id
            .ok_or_else(|| HandlerError::Validation("report job_id is required".to_string()))?;
        let start_time = request
            .start_time
            .as_deref()
            .map(|value| parse_report_time("start_time", value))
            .transpose()?;
        let end_time = request
            .end_time
            .as_deref()
            .map(|value| parse_report_time("end_time", value))
            .transpose()?;
        if let (Some(start), Some(end)) = (start_time, end_time)
            && end < start
        {
            return Err(HandlerError::Validation("end_time precedes start_time".to_string()));
        }
        Ok(ReportEntry {
            agent_id,
            job_id,
            operation_type: request.operation_type,
            start_time,
            end_time,
            status_data: request.status_data,
            errors: request.errors,
            additional_data: request.additional_data,
            received_at: Timestamp::now(),
        })
    }

    /// Returns the most recently appended report for a job.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotFound`] when no report carries the job id.
    pub fn get_report(&self, agent_id: AgentId, job_id: JobId) -> Result<Report, HandlerError> {
        let result = self.store.list_reports(&agent_id).map_err(HandlerError::from).and_then(
            |reports| {
                reports
                    .into_iter()
                    .rev()
                    .find(|report| report.job_id() == job_id)
                    .ok_or_else(|| HandlerError::NotFound(format!("report for job {job_id}")))
            },
        );
        self.finish("get_report", Some(agent_id), result)
    }

    /// Returns every report for an agent in submission order.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Store`] when listing fails.
    pub fn get_reports(&self, agent_id: AgentId) -> Result<Vec<Report>, HandlerError> {
        let result = self.store.list_reports(&agent_id).map_err(HandlerError::from);
        self.finish("get_reports", Some(agent_id), result)
    }

    // ------------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------------

    /// Decides the next action for an agent.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::NotImplemented`] when no dispatcher is attached,
    /// [`HandlerError::Validation`] for malformed configuration names, and
    /// [`HandlerError::NotFound`] for unregistered agents.
    pub fn get_action(
        &self,
        agent_id: AgentId,
        request: &ActionRequest,
    ) -> Result<ActionResponse, HandlerError> {
        let result = self.get_action_inner(agent_id, request);
        self.finish("get_action", Some(agent_id), result)
    }

    /// Action dispatch body.
    fn get_action_inner(
        &self,
        agent_id: AgentId,
        request: &ActionRequest,
    ) -> Result<ActionResponse, HandlerError> {
        let Some(dispatcher) = &self.dispatcher else {
            return Err(HandlerError::NotImplemented("get_action".to_string()));
        };
        for status in &request.configurations {
            validate_configuration_name(&status.name)?;
        }
        let registration = self.require_registration(&agent_id)?;
        let ctx = ActionContext {
            registration: &registration,
            store: self.store.as_ref(),
            checksums: &self.checksums,
        };
        dispatcher.dispatch(&ctx, request)
    }

    // ------------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------------

    /// Records the outcome of an operation and passes the result through.
    fn finish<T>(
        &self,
        operation: &'static str,
        agent_id: Option<AgentId>,
        result: Result<T, HandlerError>,
    ) -> Result<T, HandlerError> {
        let (outcome, detail) = match &result {
            Ok(_) => (EventOutcome::Success, None),
            Err(err) => (err.outcome(), Some(err.to_string())),
        };
        self.events.record(&PullEvent::new("pull_request", operation, outcome, agent_id, detail));
        result
    }
}
