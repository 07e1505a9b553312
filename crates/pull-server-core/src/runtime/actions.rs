// crates/pull-server-core/src/runtime/actions.rs
// ============================================================================
// Module: Agent Action Dispatch
// Description: Decides what an agent should do next.
// Purpose: Provide the pluggable get-action seam and a checksum-based default.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`ActionDispatcher`] is optional on the handler; without one the get-action
//! operation reports `NotImplemented`. [`ChecksumActionDispatcher`] compares
//! the checksums an agent reports with serve-time checksums of the server
//! copies:
//! - server copy missing: `Retry`
//! - agent copy missing or different: `GetConfiguration`
//! - otherwise: `Ok`

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::identifiers::ConfigurationName;
use crate::core::protocol::ActionRequest;
use crate::core::protocol::ActionResponse;
use crate::core::protocol::AgentAction;
use crate::core::protocol::AgentRegistration;
use crate::core::protocol::ConfigurationAction;
use crate::interfaces::PullStore;
use crate::runtime::checksum::ChecksumService;
use crate::runtime::handler::HandlerError;

// ============================================================================
// SECTION: Contract
// ============================================================================

/// Inputs available to an action dispatcher for one request.
pub struct ActionContext<'a> {
    /// Registration of the requesting agent.
    pub registration: &'a AgentRegistration,
    /// Store holding configurations.
    pub store: &'a dyn PullStore,
    /// Serve-time checksum computation.
    pub checksums: &'a ChecksumService,
}

/// Decides the next action for an agent.
pub trait ActionDispatcher: Send + Sync {
    /// Produces an action response.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError`] when configurations cannot be loaded or
    /// checksummed.
    fn dispatch(
        &self,
        ctx: &ActionContext<'_>,
        request: &ActionRequest,
    ) -> Result<ActionResponse, HandlerError>;
}

// ============================================================================
// SECTION: Checksum Dispatcher
// ============================================================================

/// Dispatcher comparing agent-reported checksums with server copies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChecksumActionDispatcher;

impl ActionDispatcher for ChecksumActionDispatcher {
    fn dispatch(
        &self,
        ctx: &ActionContext<'_>,
        request: &ActionRequest,
    ) -> Result<ActionResponse, HandlerError> {
        let reported: BTreeMap<&ConfigurationName, Option<&str>> = request
            .configurations
            .iter()
            .map(|status| (&status.name, status.checksum.as_deref()))
            .collect();
        // Agents registered without names are judged on what they report.
        let names: Vec<ConfigurationName> = if ctx.registration.configuration_names.is_empty() {
            reported.keys().map(|name| (*name).clone()).collect()
        } else {
            ctx.registration.configuration_names.clone()
        };

        let mut details = Vec::with_capacity(names.len());
        for name in names {
            let action =
                match ctx.store.load_configuration(&ctx.registration.agent_id, &name)? {
                    None => AgentAction::Retry,
                    Some(configuration) => {
                        let server = ctx.checksums.compute(&configuration.content)?;
                        match reported.get(&name).copied().flatten() {
                            Some(value) if value.eq_ignore_ascii_case(&server.value) => {
                                AgentAction::Ok
                            }
                            _ => AgentAction::GetConfiguration,
                        }
                    }
                };
            details.push(ConfigurationAction {
                name,
                action,
            });
        }
        Ok(ActionResponse::from_details(details))
    }
}
