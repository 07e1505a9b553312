// crates/pull-server-cli/tests/bootstrap.rs
// ============================================================================
// Module: Bootstrap Tests
// Description: Validate configuration to handler wiring.
// Purpose: Ensure every config section reaches the component it controls.
// Dependencies: pull-server-cli, pull-server-config, pull-server-core, tempfile, tokio
// ============================================================================

//! ## Overview
//! Builds [`PullServer`] instances from temp-directory configs and drives the
//! resulting handler through registration, serving, and action dispatch.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;

use pull_server_cli::BootstrapError;
use pull_server_cli::PullServer;
use pull_server_config::PullServerConfig;
use pull_server_core::ActionRequest;
use pull_server_core::AgentAction;
use pull_server_core::AgentId;
use pull_server_core::AgentInformation;
use pull_server_core::ClientConfigurationStatus;
use pull_server_core::ConfigurationName;
use pull_server_core::HandlerError;
use pull_server_core::RegistrationRequest;
use pull_server_core::hashing::sha256_hex;
use tempfile::TempDir;

mod common;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn server(body: &str) -> PullServer {
    PullServer::from_config(&PullServerConfig::parse(body).unwrap()).unwrap()
}

fn request(key: Option<&str>) -> RegistrationRequest {
    RegistrationRequest {
        agent_information: AgentInformation {
            lcm_version: "2.0".to_string(),
            node_name: "web-01".to_string(),
            ip_addresses: vec!["10.0.0.5".to_string()],
        },
        configuration_names: vec!["web".to_string()],
        registration_key: key.map(str::to_string),
        certificate_thumbprint: None,
    }
}

// ============================================================================
// SECTION: Wiring
// ============================================================================

#[test]
fn keyed_registration_uses_the_key_file() {
    let temp = TempDir::new().unwrap();
    let keys = common::write_keys(temp.path(), &["alpha"]);
    let server = server(&common::keyed_config(&keys));
    assert_eq!(server.key_cache().snapshot().len(), 1);

    let handler = server.handler();
    assert!(matches!(
        handler.register_agent(AgentId::generate(), request(None)),
        Err(HandlerError::Unauthorized(_))
    ));
    assert!(matches!(
        handler.register_agent(AgentId::generate(), request(Some("beta"))),
        Err(HandlerError::Unauthorized(_))
    ));
    handler.register_agent(AgentId::generate(), request(Some("alpha"))).unwrap();
}

#[test]
fn missing_keys_path_refuses_keyed_registration() {
    let server = server(common::QUIET);
    assert!(server.key_cache().snapshot().is_empty());
    assert!(matches!(
        server.handler().register_agent(AgentId::generate(), request(Some("alpha"))),
        Err(HandlerError::Unauthorized(_))
    ));
}

#[test]
fn disabled_authz_skips_the_key_file() {
    let temp = TempDir::new().unwrap();
    let body = format!(
        "{}[authz]\nrefresh_interval_minutes = 0\nkeys_path = '{}'\n",
        common::QUIET,
        temp.path().join("absent").display()
    );
    let server = server(&body);
    server.handler().register_agent(AgentId::generate(), request(None)).unwrap();
}

#[test]
fn unreadable_key_file_fails_bootstrap() {
    let temp = TempDir::new().unwrap();
    let config =
        PullServerConfig::parse(&common::keyed_config(&temp.path().join("absent"))).unwrap();
    assert!(matches!(PullServer::from_config(&config), Err(BootstrapError::Authz(_))));
}

#[test]
fn served_configuration_carries_default_checksum() {
    let server = server(&format!(
        "{}[checksum]\ndefault_algorithm = \"SHA-256\"\n[authz]\nrequire_registration_key = false\n",
        common::QUIET
    ));
    let handler = server.handler();
    let agent = AgentId::generate();
    handler.register_agent(agent, request(None)).unwrap();
    handler.publish_configuration(agent, ConfigurationName::new("web"), b"web-v1".to_vec()).unwrap();

    let payload = handler.get_configuration(agent, &ConfigurationName::new("web")).unwrap();
    assert_eq!(payload.checksum.algorithm, "SHA-256");
    assert_eq!(payload.checksum.value, sha256_hex(b"web-v1"));

    let response = handler
        .get_action(
            agent,
            &ActionRequest {
                configurations: vec![ClientConfigurationStatus {
                    name: ConfigurationName::new("web"),
                    checksum: Some(payload.checksum.value),
                }],
            },
        )
        .unwrap();
    assert_eq!(response.overall, AgentAction::Ok);
}

#[test]
fn action_dispatch_none_leaves_get_action_unimplemented() {
    let server = server(&format!(
        "{}[authz]\nrequire_registration_key = false\n[handler]\naction_dispatch = \"none\"\n",
        common::QUIET
    ));
    let agent = AgentId::generate();
    server.handler().register_agent(agent, request(None)).unwrap();
    assert!(matches!(
        server.handler().get_action(agent, &ActionRequest::default()),
        Err(HandlerError::NotImplemented(_))
    ));
}

#[test]
fn unusable_default_algorithm_fails_bootstrap() {
    let config = PullServerConfig::parse(&format!(
        "{}[checksum]\ndefault_algorithm = \"MD5\"\n",
        common::QUIET
    ))
    .unwrap();
    assert!(matches!(PullServer::from_config(&config), Err(BootstrapError::Providers(_))));

    let config = PullServerConfig::parse(&format!(
        "{}[checksum.parameters]\nchunk_size = \"0\"\n",
        common::QUIET
    ))
    .unwrap();
    assert!(matches!(PullServer::from_config(&config), Err(BootstrapError::Providers(_))));
}

// ============================================================================
// SECTION: Stores and Sinks
// ============================================================================

#[test]
fn sqlite_store_persists_between_servers() {
    let temp = TempDir::new().unwrap();
    let body = format!(
        "{}[authz]\nrequire_registration_key = false\n[store]\ntype = \"sqlite\"\n[store.sqlite]\npath \
         = '{}'\n",
        common::QUIET,
        temp.path().join("state").join("pull.db").display()
    );
    let agent = AgentId::generate();
    server(&body).handler().register_agent(agent, request(None)).unwrap();
    assert!(matches!(
        server(&body).handler().register_agent(agent, request(None)),
        Err(HandlerError::Conflict(_))
    ));
}

#[test]
fn file_sink_records_handler_events() {
    let temp = TempDir::new().unwrap();
    let log = temp.path().join("events.jsonl");
    let body = format!(
        "[events]\nsink = \"file\"\npath = '{}'\n[authz]\nrequire_registration_key = false\n",
        log.display()
    );
    let agent = AgentId::generate();
    server(&body).handler().register_agent(agent, request(None)).unwrap();
    let contents = fs::read_to_string(&log).unwrap();
    assert!(contents.contains("register_agent"));
    assert!(contents.contains(&agent.to_string()));
}

// ============================================================================
// SECTION: Providers
// ============================================================================

#[test]
fn providers_dir_next_to_config_is_scanned() {
    let temp = TempDir::new().unwrap();
    common::write_manifest(temp.path(), "sha-fast", "SHA-256");
    let path = common::write_config(temp.path(), common::QUIET);
    let server = PullServer::from_config(&PullServerConfig::load(Some(&path)).unwrap()).unwrap();
    assert_eq!(server.registry().names(), vec!["SHA-256", "SHA-384", "SHA-512", "sha-fast"]);
    assert!(server.warnings().is_empty());
}

#[test]
fn configured_builtins_limit_the_registry() {
    let server = server(&format!(
        "{}[providers]\nbuiltins = [\"SHA-512\", \"SHA-256\"]\n",
        common::QUIET
    ));
    assert_eq!(server.registry().names(), vec!["SHA-256", "SHA-512"]);
}

#[test]
fn colliding_manifests_fail_bootstrap() {
    let temp = TempDir::new().unwrap();
    common::write_manifest(temp.path(), "SHA-256", "SHA-512");
    let path = common::write_config(temp.path(), common::QUIET);
    let config = PullServerConfig::load(Some(&path)).unwrap();
    assert!(matches!(PullServer::from_config(&config), Err(BootstrapError::Providers(_))));
}

// ============================================================================
// SECTION: Refresher
// ============================================================================

#[tokio::test]
async fn refresher_runs_only_when_authz_is_enabled() {
    let temp = TempDir::new().unwrap();
    let keys = common::write_keys(temp.path(), &["alpha"]);
    let enabled = server(&common::keyed_config(&keys));
    let handle = enabled.spawn_key_refresher().unwrap().expect("refresher handle");
    handle.abort();

    let disabled = server(&format!("{}[authz]\nrefresh_interval_minutes = 0\n", common::QUIET));
    assert!(disabled.spawn_key_refresher().unwrap().is_none());
}

#[test]
fn refresher_requires_a_runtime() {
    let server = server(common::QUIET);
    assert!(matches!(server.spawn_key_refresher(), Err(BootstrapError::Authz(_))));
}
