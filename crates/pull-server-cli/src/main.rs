// crates/pull-server-cli/src/main.rs
// ============================================================================
// Module: Pull Server CLI Entry Point
// Description: Operator commands for the pull server.
// Purpose: Validate configuration, inspect providers, compute checksums, and
//          check registration keys without starting a transport.
// Dependencies: clap, pull-server-cli, pull-server-config, pull-server-core,
//               thiserror
// ============================================================================

//! ## Overview
//! `pull-server [--config PATH] <command>` loads `pull-server.toml` (or the
//! file named by `PULL_SERVER_CONFIG`) and runs one operator command.
//! Results go to stdout; failures go to stderr with a non-zero exit code.
//! Security posture: inputs are untrusted and must be validated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use pull_server_cli::bootstrap;
use pull_server_config::EventSinkType;
use pull_server_config::PullServerConfig;
use pull_server_config::StoreType;
use pull_server_core::AuthzMode;
use pull_server_core::ChecksumProduct;
use pull_server_core::ChecksumService;
use pull_server_core::ChecksumSettings;
use pull_server_core::ParameterMap;
use pull_server_core::ProviderSource;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "pull-server", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to pull-server.toml or `PULL_SERVER_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Checksum provider utilities.
    Providers {
        /// Selected providers subcommand.
        #[command(subcommand)]
        command: ProvidersCommand,
    },
    /// Compute the checksum of a file.
    Checksum(ChecksumCommand),
    /// Registration key utilities.
    Authz {
        /// Selected authz subcommand.
        #[command(subcommand)]
        command: AuthzCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate the configuration file.
    Validate,
}

/// Providers subcommands.
#[derive(Subcommand, Debug)]
enum ProvidersCommand {
    /// List resolvable checksum providers and their parameters.
    List,
}

/// Arguments for `checksum`.
#[derive(Args, Debug)]
struct ChecksumCommand {
    /// Provider name (defaults to `checksum.default_algorithm` and its parameters).
    #[arg(long, value_name = "NAME")]
    algorithm: Option<String>,
    /// File to stream through the provider.
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

/// Authz subcommands.
#[derive(Subcommand, Debug)]
enum AuthzCommand {
    /// Load the key set once and check a registration key.
    Check(AuthzCheckCommand),
}

/// Arguments for `authz check`.
#[derive(Args, Debug)]
struct AuthzCheckCommand {
    /// Registration key to check.
    #[arg(long, value_name = "KEY")]
    key: String,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for operator-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };
    let config_path = cli.config.as_deref();
    match command {
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(config_path),
        Commands::Providers {
            command: ProvidersCommand::List,
        } => command_providers_list(config_path),
        Commands::Checksum(command) => command_checksum(config_path, &command),
        Commands::Authz {
            command: AuthzCommand::Check(command),
        } => command_authz_check(config_path, &command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

/// Loads and validates the configuration.
fn load_config(path: Option<&Path>) -> CliResult<PullServerConfig> {
    PullServerConfig::load(path)
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Executes `config validate`.
fn command_config_validate(path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    let source = config
        .source_path
        .as_ref()
        .map_or_else(|| "<defaults>".to_string(), |path| path.display().to_string());
    let store = match config.store.store_type {
        StoreType::Memory => "memory",
        StoreType::Sqlite => "sqlite",
    };
    let authz = match config.authz.mode() {
        AuthzMode::Disabled => "disabled".to_string(),
        AuthzMode::Enabled(_) => {
            format!("enabled, refresh every {} minutes", config.authz.refresh_interval_minutes)
        }
    };
    let events = match config.events.sink {
        EventSinkType::Stderr => "stderr",
        EventSinkType::File => "file",
        EventSinkType::None => "none",
    };
    let lines = [
        format!("config ok: {source}"),
        format!("checksum: {}", config.checksum.default_algorithm),
        format!("store: {store}"),
        format!("authz: {authz}"),
        format!("events: {events}"),
    ];
    for line in &lines {
        write_stdout_line(line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Provider Commands
// ============================================================================

/// Executes `providers list`.
fn command_providers_list(path: Option<&Path>) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    let events = bootstrap::build_event_sink(&config)
        .map_err(|err| CliError::new(err.to_string()))?;
    let registry = bootstrap::build_registry(&config, events.as_ref())
        .map_err(|err| CliError::new(err.to_string()))?;
    for warning in registry.warnings() {
        write_stderr_line(&format!("warning: {warning}"))
            .map_err(|err| CliError::new(output_error("stderr", &err)))?;
    }
    for name in registry.names() {
        let provider = registry
            .resolve(&name)
            .map_err(|err| CliError::new(format!("provider {name}: {err}")))?;
        let descriptor = provider.describe();
        write_stdout_line(&format!(
            "{}\t{}\t{}",
            descriptor.name(),
            descriptor.label(),
            descriptor.description()
        ))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        for parameter in provider.describe_parameters() {
            let presence = if parameter.is_required() { "required" } else { "optional" };
            write_stdout_line(&format!(
                "  {}\t{presence}\t{}",
                parameter.name(),
                parameter.label()
            ))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Checksum Command
// ============================================================================

/// Executes `checksum`.
fn command_checksum(path: Option<&Path>, command: &ChecksumCommand) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    let events = bootstrap::build_event_sink(&config)
        .map_err(|err| CliError::new(err.to_string()))?;
    let registry = bootstrap::build_registry(&config, events.as_ref())
        .map_err(|err| CliError::new(err.to_string()))?;
    let settings = command.algorithm.as_ref().map_or_else(
        || config.checksum.settings(),
        |algorithm| ChecksumSettings {
            algorithm: algorithm.clone(),
            parameters: ParameterMap::new(),
        },
    );
    let source: Arc<dyn ProviderSource<ChecksumProduct>> = Arc::new(registry);
    let service = ChecksumService::new(source, settings);
    let mut file = File::open(&command.file)
        .map_err(|err| CliError::new(format!("{}: {err}", command.file.display())))?;
    let checksum = service
        .compute_reader(&mut file)
        .map_err(|err| CliError::new(format!("checksum failed: {err}")))?;
    write_stdout_line(&checksum.value).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Authz Commands
// ============================================================================

/// Executes `authz check`; an unknown key exits with failure.
fn command_authz_check(path: Option<&Path>, command: &AuthzCheckCommand) -> CliResult<ExitCode> {
    let config = load_config(path)?;
    let events = bootstrap::build_event_sink(&config)
        .map_err(|err| CliError::new(err.to_string()))?;
    let cache = bootstrap::build_key_cache(&config, events);
    if !cache.mode().is_enabled() {
        write_stdout_line("authorization disabled: every key is accepted")
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }
    let snapshot =
        cache.refresh().map_err(|err| CliError::new(format!("key refresh failed: {err}")))?;
    let (verdict, code) = if cache.is_authorized(command.key.trim()) {
        ("authorized", ExitCode::SUCCESS)
    } else {
        ("not authorized", ExitCode::FAILURE)
    };
    write_stdout_line(&format!("key {verdict} ({} keys loaded)", snapshot.len()))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(code)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
