// # meshping-dash - Terminal dashboard for meshping
//
// This binary is a thin integration layer: all synchronization, ordering
// and filtering logic lives in meshping-core, the REST client lives in
// meshping-http.
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring engine, gateway, persistence and view model
// 4. Rendering the view and prompting for confirmations
//
// ## Configuration
//
// All settings come from environment variables:
//
// - `MESHPING_URL`: Base URL of the meshping instance (default http://127.0.0.1:9922)
// - `MESHPING_TIMEOUT_SECS`: Per-request timeout (default 10)
// - `MESHPING_TICK_MS`: Staleness check cadence (default 1000)
// - `MESHPING_STALE_MS`: Refetch threshold (default 29500)
// - `MESHPING_STATE_TYPE`: Search persistence (memory, file; default memory)
// - `MESHPING_STATE_PATH`: Path of the state file (for file)
// - `MESHPING_LOG_LEVEL`: trace, debug, info, warn, error (default warn)
//
// ## Example
//
// ```bash
// export MESHPING_URL=http://monitor.lan:9922
// export MESHPING_STATE_TYPE=file
// export MESHPING_STATE_PATH=$HOME/.local/state/meshping-dash.json
//
// meshping-dash watch --search core
// meshping-dash add gateway 192.168.1.1
// meshping-dash delete gateway@192.168.1.1
// ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use meshping_core::config::{DashboardConfig, PersistenceConfig, ServiceConfig, SyncConfig};
use meshping_core::persistence::open_store;
use meshping_core::pipeline::derive;
use meshping_core::{
    DeleteOutcome, MutationGateway, PollOutcome, SearchPersistence, SyncEngine,
    SyncEvent, Target, ViewModel,
};
use meshping_http::HttpTargetService;
use std::env;
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean exit
/// - 1: Configuration or startup error
/// - 2: Runtime error (service unreachable, request rejected)
#[derive(Debug, Clone, Copy)]
enum DashExitCode {
    /// Clean exit
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DashExitCode> for ExitCode {
    fn from(code: DashExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

#[derive(Parser, Debug)]
#[command(name = "meshping-dash")]
#[command(about = "Watch and manage the targets of a meshping instance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the target list in sync and print it whenever it changes
    Watch {
        /// Search string (defaults to the one saved by the last session)
        #[arg(short, long)]
        search: Option<String>,
    },
    /// Fetch the targets once and print them
    List {
        /// Only show targets whose name or address contains this text
        search: Option<String>,
    },
    /// Add a target; a bare name is resolved by the service
    Add {
        /// Target name
        name: String,
        /// Target address (optional)
        addr: Option<String>,
    },
    /// Delete a target by its name@addr identity
    Delete {
        /// Target identity, e.g. gateway@192.168.1.1
        identity: String,
        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
}

/// Application configuration
struct Config {
    url: String,
    timeout_secs: u64,
    tick_ms: u64,
    stale_ms: u64,
    state_type: String,
    state_path: Option<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = DashboardConfig::default();

        Ok(Self {
            url: lookup("MESHPING_URL").unwrap_or(defaults.service.base_url),
            timeout_secs: parse_var(&lookup, "MESHPING_TIMEOUT_SECS")?
                .unwrap_or(defaults.service.request_timeout_secs),
            tick_ms: parse_var(&lookup, "MESHPING_TICK_MS")?
                .unwrap_or(defaults.sync.tick_interval_ms),
            stale_ms: parse_var(&lookup, "MESHPING_STALE_MS")?
                .unwrap_or(defaults.sync.stale_threshold_ms),
            state_type: lookup("MESHPING_STATE_TYPE").unwrap_or_else(|| "memory".to_string()),
            state_path: lookup("MESHPING_STATE_PATH"),
            log_level: lookup("MESHPING_LOG_LEVEL").unwrap_or_else(|| "warn".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.state_type.as_str() {
            "file" | "memory" => {}
            _ => anyhow::bail!(
                "MESHPING_STATE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                self.state_type
            ),
        }

        if self.state_type == "file" {
            let Some(ref path) = self.state_path else {
                anyhow::bail!(
                    "MESHPING_STATE_PATH is required when MESHPING_STATE_TYPE=file. \
                    Set it via: export MESHPING_STATE_PATH=$HOME/.local/state/meshping-dash.json"
                );
            };

            if path.is_empty() {
                anyhow::bail!("MESHPING_STATE_PATH cannot be empty when MESHPING_STATE_TYPE=file");
            }

            if let Some(parent) = std::path::Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                anyhow::bail!(
                    "MESHPING_STATE_PATH parent directory does not exist: {}. \
                    Create it first: mkdir -p {}",
                    parent.display(),
                    parent.display()
                );
            }
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "MESHPING_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.dashboard_config()
            .validate()
            .context("Invalid dashboard configuration")?;

        Ok(())
    }

    /// Build the library configuration
    fn dashboard_config(&self) -> DashboardConfig {
        let persistence = match (self.state_type.as_str(), &self.state_path) {
            ("file", Some(path)) => PersistenceConfig::File { path: path.clone() },
            _ => PersistenceConfig::Memory,
        };

        DashboardConfig {
            service: ServiceConfig {
                base_url: self.url.clone(),
                request_timeout_secs: self.timeout_secs,
            },
            sync: SyncConfig {
                tick_interval_ms: self.tick_ms,
                stale_threshold_ms: self.stale_ms,
                ..SyncConfig::default()
            },
            persistence,
        }
    }

    fn log_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "error" => Level::ERROR,
            _ => Level::WARN,
        }
    }
}

/// Parse an optional numeric variable, rejecting garbage instead of
/// silently falling back to the default
fn parse_var(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<u64>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} must be a positive integer. Got: '{}'", key, raw)),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DashExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DashExitCode::ConfigError.into();
    }

    // Logs go to stderr so the rendered view stays clean on stdout
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level())
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DashExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DashExitCode::RuntimeError.into();
        }
    };

    let dashboard = config.dashboard_config();
    let result = rt.block_on(async {
        match run(cli.command, dashboard).await {
            Ok(()) => DashExitCode::CleanShutdown,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                DashExitCode::RuntimeError
            }
        }
    });

    result.into()
}

/// Dispatch a subcommand
async fn run(command: Command, config: DashboardConfig) -> Result<()> {
    let service = Arc::new(HttpTargetService::new(&config.service)?);
    info!("Using meshping service at {}", service.targets_url());

    match command {
        Command::Watch { search } => watch(service, &config, search).await,
        Command::List { search } => list(service, &config, search.unwrap_or_default()).await,
        Command::Add { name, addr } => add(service, &name, addr.as_deref()).await,
        Command::Delete { identity, yes } => delete(service, &identity, yes).await,
    }
}

/// Run the engine and re-render the view on every change until a signal
async fn watch(
    service: Arc<HttpTargetService>,
    config: &DashboardConfig,
    search: Option<String>,
) -> Result<()> {
    let store = open_store(&config.persistence).await?;
    let persistence = SearchPersistence::new(store);

    let (engine, events) = SyncEngine::new(service.clone(), &config.sync)?;
    let engine = Arc::new(engine);
    let gateway = MutationGateway::new(service);
    let mut view = ViewModel::new(engine.clone(), gateway, persistence.clone()).await;

    if let Some(search) = search
        && let Err(e) = view.set_search(search).await
    {
        warn!("Failed to save search: {}", e);
    }

    tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let runner = engine.clone();
    let engine_task = tokio::spawn(async move { runner.run_with_shutdown(shutdown_rx).await });

    render(&view).await;

    let signal_name = tokio::select! {
        name = wait_for_shutdown() => name?,
        _ = async {
            while view.changed().await {
                render(&view).await;
            }
        } => "engine stopped",
    };
    info!("Received shutdown signal: {}", signal_name);

    // The engine may already be gone; the send result does not matter
    let _ = shutdown_tx.send(());
    match engine_task.await {
        Ok(result) => result?,
        Err(e) => anyhow::bail!("Sync engine task failed: {}", e),
    }

    persistence.flush().await?;
    Ok(())
}

/// Poll once and print the derived view
async fn list(service: Arc<HttpTargetService>, config: &DashboardConfig, search: String) -> Result<()> {
    let (engine, _events) = SyncEngine::new(service, &config.sync)?;

    match engine.poll().await {
        PollOutcome::Synced { targets_count } => debug!("Fetched {} target(s)", targets_count),
        _ => {
            let reason = engine
                .last_error()
                .await
                .unwrap_or_else(|| "unknown error".to_string());
            anyhow::bail!("Failed to fetch targets: {}", reason);
        }
    }

    print_targets(&derive(&engine.collection(), &search));
    Ok(())
}

async fn add(service: Arc<HttpTargetService>, name: &str, addr: Option<&str>) -> Result<()> {
    let outcome = MutationGateway::new(service).create_target(name, addr).await?;
    println!("{}", outcome.message());
    Ok(())
}

async fn delete(service: Arc<HttpTargetService>, identity: &str, yes: bool) -> Result<()> {
    let confirmed = yes || ask_confirmation(identity).await?;

    match MutationGateway::new(service)
        .delete_target(identity, &move |_: &str| confirmed)
        .await?
    {
        DeleteOutcome::Declined => println!("Aborted."),
        outcome @ DeleteOutcome::Deleted { .. } => {
            if let Some(message) = outcome.message() {
                println!("{}", message);
            }
        }
    }
    Ok(())
}

/// Ask on the terminal before deleting
///
/// The prompt blocks on stdin, so it runs on the blocking pool.
async fn ask_confirmation(identity: &str) -> Result<bool> {
    let identity = identity.to_string();
    let answer = tokio::task::spawn_blocking(move || {
        prompt_delete(&mut std::io::stdin().lock(), &mut std::io::stdout(), &identity)
    })
    .await
    .context("Confirmation prompt task failed")?;

    answer.context("Failed to read confirmation")
}

/// Print the delete prompt and read a yes/no answer (default no)
fn prompt_delete(
    input: &mut impl BufRead,
    output: &mut impl Write,
    identity: &str,
) -> std::io::Result<bool> {
    write!(output, "Really delete target {}? [y/N] ", identity)?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

async fn render(view: &ViewModel) {
    let updated = match view.last_update().await {
        Some(at) => at.with_timezone(&chrono::Local).format("%H:%M:%S").to_string(),
        None => "never".to_string(),
    };
    let filtered = view.filtered();

    println!();
    println!(
        "Targets: {} of {} (search: '{}', updated: {})",
        filtered.len(),
        view.collection().len(),
        view.search(),
        updated
    );
    print_targets(&filtered);
    if let Some(message) = view.status_message() {
        println!("{}", message);
    }
}

fn print_targets(targets: &[Target]) {
    let width = targets.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for target in targets {
        println!("  {:width$}  {}", target.name, target.addr, width = width);
    }
}

/// Surface engine events in the log
async fn log_events(mut events: mpsc::Receiver<SyncEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            SyncEvent::PollFailed { error } => warn!("Target list is stale: {}", error),
            other => debug!("Sync event: {:?}", other),
        }
    }
}

/// Wait for SIGTERM or SIGINT
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for Ctrl-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config_from(&[]).unwrap();
        assert!(config.validate().is_ok());

        let dashboard = config.dashboard_config();
        assert_eq!(dashboard.service.base_url, "http://127.0.0.1:9922");
        assert_eq!(dashboard.sync.stale_threshold_ms, 29_500);
        assert!(matches!(dashboard.persistence, PersistenceConfig::Memory));
    }

    #[test]
    fn test_numeric_garbage_is_rejected() {
        assert!(config_from(&[("MESHPING_TICK_MS", "soon")]).is_err());
    }

    #[test]
    fn test_file_state_requires_path() {
        let config = config_from(&[("MESHPING_STATE_TYPE", "file")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[
            ("MESHPING_STATE_TYPE", "file"),
            ("MESHPING_STATE_PATH", "dash-state.json"),
        ])
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.dashboard_config().persistence,
            PersistenceConfig::File { .. }
        ));
    }

    #[test]
    fn test_rejects_unknown_state_type_and_level() {
        let config = config_from(&[("MESHPING_STATE_TYPE", "redis")]).unwrap();
        assert!(config.validate().is_err());

        let config = config_from(&[("MESHPING_LOG_LEVEL", "loud")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_library_validation_applies() {
        let config = config_from(&[("MESHPING_URL", "ftp://monitor.lan")]).unwrap();
        assert!(config.validate().is_err());

        // Threshold below the tick cadence
        let config = config_from(&[("MESHPING_TICK_MS", "5000"), ("MESHPING_STALE_MS", "1000")])
            .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["meshping-dash", "delete", "gw@10.0.0.1", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Delete { ref identity, yes: true } if identity == "gw@10.0.0.1"
        ));

        let cli = Cli::try_parse_from(["meshping-dash", "add", "gw"]).unwrap();
        assert!(matches!(cli.command, Command::Add { addr: None, .. }));
    }

    #[test]
    fn test_delete_prompt_answers() {
        let mut output = Vec::new();
        let confirmed =
            prompt_delete(&mut std::io::Cursor::new("Yes\n"), &mut output, "gw@10.0.0.1").unwrap();
        assert!(confirmed);
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Really delete target gw@10.0.0.1? [y/N] "
        );

        for answer in ["n\n", "\n", "", "maybe\n"] {
            let declined =
                prompt_delete(&mut std::io::Cursor::new(answer), &mut Vec::new(), "gw@10.0.0.1")
                    .unwrap();
            assert!(!declined, "answer {:?}", answer);
        }
    }
}
