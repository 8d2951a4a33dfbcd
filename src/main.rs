//! Vigil: health aggregation probe.
//!
//! This is the application entry point. It loads configuration, initializes
//! tracing, builds the service probes and the cluster client, spawns the
//! polling loop and starts the HTTP server.

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vigil::config::{AppConfig, DEFAULT_CONFIG_PATH, DEFAULT_LOG_FILTER};
use vigil::http::start_server;
use vigil::kube::{ClusterClient, TopologySource};
use vigil::poller::Poller;
use vigil::probe::probes_from_config;
use vigil::routes::create_router;
use vigil::state::{snapshot_channel, AppState, Snapshot};

/// Vigil: aggregated health of backing services and Kubernetes workloads
#[derive(Parser, Debug)]
#[command(name = "vigil", version, about)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Log level filter (e.g., "vigil=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,

    /// Listen address, overrides http.host/http.port (e.g. ":9000")
    #[arg(short, long)]
    serve: Option<String>,

    /// Seconds between cycles, overrides probe.interval_seconds
    #[arg(short, long)]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Optional .env in the working directory or a parent, before env overrides
    let dotenv = dotenvy::dotenv().ok();

    // Load configuration before tracing so the log format can come from it
    let mut config = AppConfig::load(&args.config)?;
    config.apply_cli(args.serve.as_deref(), args.interval)?;
    config.validate()?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(path = %args.config, "Loaded configuration");
    if let Some(path) = dotenv {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }

    // Build probes and log what is being watched
    let probes = probes_from_config(&config)?;
    for probe in &probes {
        tracing::info!(
            service = %probe.name(),
            kind = probe.kind(),
            endpoint = %probe.endpoint(),
            "Service probe configured"
        );
    }

    let timeout = Duration::from_secs(config.probe.timeout_seconds);
    let cluster: Option<Box<dyn TopologySource>> = match &config.kubernetes {
        Some(kube) => {
            let client = ClusterClient::new(kube, timeout)?;
            tracing::info!(
                host = %client.host(),
                namespace = %client.namespace(),
                "Kubernetes roll-up configured"
            );
            Some(Box::new(client) as Box<dyn TopologySource>)
        }
        None => {
            tracing::info!("No [kubernetes] section, workload roll-up disabled");
            None
        }
    };

    // Snapshot channel: the poller writes, handlers read
    let (publisher, snapshot) = snapshot_channel(Snapshot::initial(config.service_names()));
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);

    let poller = Poller::new(
        probes,
        cluster,
        Duration::from_secs(config.probe.interval_seconds),
        publisher,
    );
    let poller_task = tokio::spawn(poller.run(stop_rx));

    let state = AppState::new(snapshot, config.http.unhealthy_status_code()?);
    let app = create_router(state);

    start_server(app, &config.http, stop_tx).await?;

    // The server only returns after shutdown was signalled
    if let Err(e) = poller_task.await {
        tracing::error!(error = %e, "Poller task failed");
    }

    Ok(())
}
