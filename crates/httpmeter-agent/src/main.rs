//! # httpmeter — agent binary
//!
//! Bootstrap for the httpmeter plugin: resolves host identity, starts
//! the periodic sampler and the unix-socket plugin endpoint, and tears
//! the socket down again on SIGINT/SIGTERM.
//!
//! The kernel-side instrumentation that fills the request counters is a
//! separate collaborator; this process owns the [`CounterTable`] handle
//! that collaborator feeds.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use httpmeter_common::config::PluginConfig;
use httpmeter_common::constants;
use httpmeter_common::error::HttpmeterError;
use httpmeter_plugin::server::PluginServer;
use httpmeter_probe::sampler::Sampler;
use httpmeter_probe::source::CounterTable;
use httpmeter_probe::store::RateStore;
use tokio::task::JoinError;

/// httpmeter — per-process HTTP request rates as a topology plugin.
#[derive(Parser, Debug)]
#[command(name = constants::BIN_NAME, version, about, long_about = None)]
struct Cli {
    /// Unix socket path the plugin endpoint binds to.
    #[arg(long, default_value = constants::DEFAULT_SOCKET_PATH)]
    socket_path: PathBuf,

    /// Seconds between two sampling ticks.
    #[arg(long, default_value_t = constants::DEFAULT_SAMPLE_PERIOD_SECS)]
    sample_period_secs: u64,

    /// Host name used in report node keys (default: the system hostname).
    #[arg(long)]
    hostname: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let hostname = match cli.hostname {
        Some(name) => name,
        None => resolve_hostname()?,
    };
    let config = PluginConfig {
        socket_path: cli.socket_path,
        sample_period: Duration::from_secs(cli.sample_period_secs),
        hostname,
    };
    config.validate()?;

    run(config).await
}

/// Returns the local host name as the consumer knows this host.
fn resolve_hostname() -> anyhow::Result<String> {
    let name = nix::unistd::gethostname().context("failed to resolve hostname")?;
    Ok(name.to_string_lossy().into_owned())
}

/// Wires the tasks together and runs until one fails or a signal lands.
async fn run(config: PluginConfig) -> anyhow::Result<()> {
    let counters = CounterTable::new();
    let store = Arc::new(RateStore::new());

    let listener = PluginServer::bind(&config.socket_path)?;
    tracing::info!(
        socket = %config.socket_path.display(),
        period_secs = config.sample_period.as_secs(),
        hostname = %config.hostname,
        "plugin listening"
    );

    let sampler = Sampler::new(counters.clone(), Arc::clone(&store), config.sample_period);
    let server = PluginServer::new(store, config.hostname.clone());

    let mut sampler_task = tokio::spawn(sampler.run());
    let mut server_task = tokio::spawn(server.serve(listener));

    let result = tokio::select! {
        res = &mut sampler_task => flatten(res).context("sampler task failed"),
        res = &mut server_task => flatten(res).context("server task failed"),
        () = shutdown_signal() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    };

    sampler_task.abort();
    server_task.abort();
    if let Err(err) = std::fs::remove_file(&config.socket_path) {
        tracing::debug!(error = %err, "could not remove plugin socket on shutdown");
    }

    result
}

/// Collapses a spawned task's join and run results into one.
fn flatten(joined: Result<Result<(), HttpmeterError>, JoinError>) -> anyhow::Result<()> {
    match joined {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(err.into()),
        Err(err) => Err(err.into()),
    }
}

/// Resolves when SIGINT or SIGTERM is delivered.
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate()).ok();
    let sigterm = async {
        match sigterm.as_mut() {
            Some(stream) => {
                let _ = stream.recv().await;
            }
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        () = sigterm => {}
    }
}
