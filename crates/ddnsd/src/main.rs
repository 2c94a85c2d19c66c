// # ddnsd - DDNS Daemon
//
// Keeps one Route 53 A record pointed at this host's public IPv4 address.
//
// This is a thin integration layer. All DDNS logic (zone resolution,
// reconciliation, the poll loop) lives in ddns-core. The daemon is
// responsible for:
// 1. Parsing the command line and reading environment configuration
// 2. Initializing logging and the runtime
// 3. Registering the provider and IP source, then building them from config
// 4. Wiring SIGINT/SIGTERM to the engine's shutdown handle
// 5. Mapping the result to an exit code
//
// ## Usage
//
// ```bash
// ddnsd host.example.com                 # poll every 30 minutes
// ddnsd host.example.com --onetime       # one update, then exit
// ddnsd host.example.com --hosted-zone Z0123456789ABC
// ```
//
// ## Environment
//
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
// - `DDNS_IP_SOURCE_URL`: IP lookup endpoint (same as `--ip-url`)
// - `DDNS_POLL_INTERVAL_SECS`: seconds between polls, 10..=86400 (default: 1800)
// - `DDNS_HOSTED_ZONE_ID`: hosted zone id (same as `--hosted-zone`)
//
// Command-line flags take precedence over the environment. AWS credentials
// come from the usual AWS variables or profile.

use anyhow::{Context, Result};
use clap::Parser;
use ddns_core::{
    DdnsConfig, DdnsEngine, DomainName, IpSourceConfig, ProviderRegistry, RecordConfig, Shutdown,
};
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Accepted range for `DDNS_POLL_INTERVAL_SECS`
const POLL_INTERVAL_RANGE: std::ops::RangeInclusive<u64> = 10..=86400;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error, or no hosted zone for the record
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Update a Route 53 A record with this host's public IP address
#[derive(Debug, Parser)]
#[command(name = "ddnsd", version, about)]
struct Args {
    /// Fully-qualified domain name of the A record (e.g. host.example.com)
    fqdn: String,

    /// Update the record once and exit
    #[arg(long)]
    onetime: bool,

    /// Hosted zone id to use instead of looking it up
    #[arg(long = "hosted-zone", value_name = "ID", env = "DDNS_HOSTED_ZONE_ID")]
    hosted_zone: Option<String>,

    /// JSON endpoint that reports the public IP in an `ip` field
    #[arg(long = "ip-url", value_name = "URL", env = "DDNS_IP_SOURCE_URL")]
    ip_url: Option<String>,
}

/// Settings that only come from the environment
#[derive(Debug)]
struct EnvSettings {
    log_level: String,
    poll_interval_secs: Option<u64>,
}

impl EnvSettings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let poll_interval_secs = lookup("DDNS_POLL_INTERVAL_SECS")
            .map(|raw| {
                raw.trim().parse::<u64>().with_context(|| {
                    format!("DDNS_POLL_INTERVAL_SECS must be a number of seconds. Got: {}", raw)
                })
            })
            .transpose()?;

        Ok(Self {
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            poll_interval_secs,
        })
    }

    /// Validate the settings
    fn validate(&self) -> Result<()> {
        if let Some(interval) = self.poll_interval_secs
            && !POLL_INTERVAL_RANGE.contains(&interval)
        {
            anyhow::bail!(
                "DDNS_POLL_INTERVAL_SECS must be between {} and {} seconds. Got: {}",
                POLL_INTERVAL_RANGE.start(),
                POLL_INTERVAL_RANGE.end(),
                interval
            );
        }

        parse_log_level(&self.log_level)?;
        Ok(())
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

/// Combine command line and environment into the engine configuration
fn build_config(args: &Args, settings: &EnvSettings) -> Result<DdnsConfig> {
    let name = DomainName::new(&args.fqdn)
        .with_context(|| format!("'{}' is not a valid domain name", args.fqdn))?;

    let mut record = RecordConfig::new(name);
    if let Some(zone_id) = &args.hosted_zone {
        record = record.with_hosted_zone_id(zone_id.clone());
    }

    let mut config = DdnsConfig::new(record);
    config.engine.onetime = args.onetime;
    if let Some(interval) = settings.poll_interval_secs {
        config.engine.poll_interval_secs = interval;
    }

    if let Some(url) = &args.ip_url
        && let IpSourceConfig::Http { url: configured, .. } = &mut config.ip_source
    {
        *configured = url.clone();
    }

    config.validate()?;
    Ok(config)
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version also land here
            let _ = e.print();
            return if e.use_stderr() {
                DdnsExitCode::ConfigError.into()
            } else {
                DdnsExitCode::CleanShutdown.into()
            };
        }
    };

    let settings = match EnvSettings::from_env().and_then(|s| s.validate().map(|()| s)) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let config = match build_config(&args, &settings) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration validation error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    // Validated above
    let log_level = parse_log_level(&settings.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd for {}", config.record.name);

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run the daemon until the engine stops
async fn run_daemon(config: DdnsConfig) -> DdnsExitCode {
    let registry = ProviderRegistry::new();
    ddns_provider_route53::register(&registry);
    ddns_ip_http::register(&registry);

    let components = async {
        let ip_source = registry.create_ip_source(&config.ip_source)?;
        let provider = registry.create_provider(&config.provider).await?;
        DdnsEngine::new(ip_source, provider, config.clone())
    };

    let engine = match components.await {
        Ok((engine, events)) => {
            // Every phase is already logged by the engine
            drop(events);
            engine
        }
        Err(e) => {
            error!("Failed to initialize: {}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let shutdown = Shutdown::new();
    if let Err(e) = spawn_signal_handler(shutdown.clone()) {
        error!("{:#}", e);
        return DdnsExitCode::RuntimeError;
    }

    match engine.run(&shutdown).await {
        Ok(reason) => {
            info!("Stopped: {:?}", reason);
            DdnsExitCode::CleanShutdown
        }
        // Only raised before the poll loop starts
        Err(_) => DdnsExitCode::ConfigError,
    }
}

/// Trigger `shutdown` on the first SIGTERM or SIGINT
///
/// The handlers are installed before this returns, so a signal arriving
/// right after startup is not lost.
#[cfg(unix)]
fn spawn_signal_handler(shutdown: Shutdown) -> Result<()> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received shutdown signal: {}", name);
        shutdown.trigger();
    });

    Ok(())
}

/// Trigger `shutdown` on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn spawn_signal_handler(shutdown: Shutdown) -> Result<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal: SIGINT");
                shutdown.trigger();
            }
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
    });

    Ok(())
}
