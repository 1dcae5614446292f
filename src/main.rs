//! JanSahayak - Civic Complaint Intelligence Service
//!
//! Complaint intake, deterministic triage, and lifecycle tracking for a
//! municipal civic-issue portal.
//!
//! # Usage
//!
//! ```bash
//! # Run with defaults (./data, 0.0.0.0:8080)
//! cargo run --release
//!
//! # Override the bind address and data directory
//! cargo run --release -- --addr 127.0.0.1:9090 --data-dir /var/lib/jansahayak
//! ```
//!
//! # Environment Variables
//!
//! - `JANSAHAYAK_CONFIG`: Path to a TOML config file
//! - `JANSAHAYAK_CORS_ORIGINS`: Comma-separated CORS origins for development
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use jansahayak::api::{create_app, ApiState};
use jansahayak::collaborators::{
    spawn_notifier, HttpPlanningCollaborator, HttpVisionCollaborator, LogNotificationSink,
    NotificationSink, WebhookNotificationSink,
};
use jansahayak::config::{self, PortalConfig};
use jansahayak::memory::MemoryIndex;
use jansahayak::pipeline::Orchestrator;
use jansahayak::store::ComplaintStore;
use jansahayak::background;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "jansahayak")]
#[command(about = "JanSahayak Civic Complaint Intelligence Service")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default from config: "0.0.0.0:8080")
    #[arg(short, long)]
    addr: Option<String>,

    /// Override the data directory holding the complaint database
    #[arg(long)]
    data_dir: Option<String>,

    /// Path to a TOML config file (overrides JANSAHAYAK_CONFIG)
    #[arg(long)]
    config: Option<String>,

    /// Wipe all persistent data on startup (for testing)
    #[arg(long)]
    reset_db: bool,
}

// ============================================================================
// Startup
// ============================================================================

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();
}

fn load_config(args: &CliArgs) -> PortalConfig {
    let mut cfg = match &args.config {
        Some(path) => match PortalConfig::load_from_file(path) {
            Ok(cfg) => {
                info!(path = %path, "loaded config from --config");
                cfg
            }
            Err(e) => {
                warn!(path = %path, error = %e, "failed to load --config file, using search order");
                PortalConfig::load()
            }
        },
        None => PortalConfig::load(),
    };

    if let Some(addr) = &args.addr {
        cfg.server.addr = addr.clone();
    }
    if let Some(data_dir) = &args.data_dir {
        cfg.storage.data_dir = data_dir.clone();
    }
    cfg
}

fn build_notification_sink(cfg: &PortalConfig) -> Arc<dyn NotificationSink> {
    match &cfg.collaborators.notification_url {
        Some(url) => {
            info!(url = %url, "notifications: webhook sink");
            Arc::new(WebhookNotificationSink::new(url.clone()))
        }
        None => {
            info!("notifications: log-only sink");
            Arc::new(LogNotificationSink)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    info!("🏛️  Starting JanSahayak Civic Complaint Intelligence");

    let cfg = load_config(&args);
    config::init(cfg);
    let cfg = config::get();

    // Storage
    let db_path = std::path::Path::new(&cfg.storage.data_dir).join("jansahayak_db");
    if args.reset_db && db_path.exists() {
        warn!(path = %db_path.display(), "--reset-db: wiping persistent data");
        std::fs::remove_dir_all(&db_path).context("Failed to wipe database directory")?;
    }
    let db = sled::open(&db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    let memory = MemoryIndex::open(&db).context("Failed to open recurrence index")?;

    // Notification channel: store emits, notifier task drains
    let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();
    let sink = build_notification_sink(cfg);

    let store = Arc::new(
        ComplaintStore::open(&db, memory.clone(), event_tx).context("Failed to open complaint store")?,
    );
    info!(complaints = store.count(), "✓ Complaint store opened");

    // Collaborators
    let vision = Arc::new(HttpVisionCollaborator::new(
        cfg.collaborators.vision_url.clone(),
    ));
    let planner = Arc::new(HttpPlanningCollaborator::new(
        cfg.collaborators.planning_url.clone(),
    ));
    info!(
        vision = %cfg.collaborators.vision_url,
        planning = %cfg.collaborators.planning_url,
        "✓ Collaborator endpoints configured"
    );

    let orchestrator = Arc::new(Orchestrator::new(
        vision,
        planner.clone(),
        store.clone(),
        memory,
        cfg.intake_settings(),
    ));

    // Supervisor
    let cancel_token = CancellationToken::new();
    let mut task_set: JoinSet<Result<&'static str>> = JoinSet::new();

    // Task 1: notifier (fire-and-forget event drain)
    let mut notifier = spawn_notifier(event_rx, sink);
    let notifier_cancel = cancel_token.clone();
    task_set.spawn(async move {
        tokio::select! {
            _ = notifier_cancel.cancelled() => notifier.abort(),
            result = &mut notifier => { let _ = result; }
        }
        Ok("Notifier")
    });

    // Task 2: plan backfill
    if cfg.backfill.enabled {
        let backfill_store = store.clone();
        let backfill_cancel = cancel_token.clone();
        let retry = cfg.retry_policy();
        let interval = std::time::Duration::from_secs(cfg.backfill.interval_secs);
        task_set.spawn(async move {
            background::run_plan_backfill(backfill_store, planner, retry, interval, backfill_cancel)
                .await;
            Ok("PlanBackfill")
        });
    }

    // Task 3: HTTP server
    let mut api_state = ApiState::new(orchestrator, store);
    api_state.cancel = cancel_token.clone();
    let app = create_app(api_state);

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", cfg.server.addr))?;
    info!("✓ HTTP server listening on {}", cfg.server.addr);

    let server_cancel = cancel_token.clone();
    task_set.spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_cancel.cancelled().await;
                info!("[HttpServer] Received shutdown signal");
            })
            .await
            .context("HTTP server error")?;
        Ok("HttpServer")
    });

    // Shutdown on ctrl-c or first task failure
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received ctrl-c, shutting down");
            cancel_token.cancel();
        }
        Some(result) = task_set.join_next() => {
            match result {
                Ok(Ok(name)) => warn!("[{}] exited early, shutting down", name),
                Ok(Err(e)) => error!("task failed: {:#}", e),
                Err(e) => error!("task panicked: {}", e),
            }
            cancel_token.cancel();
        }
    }

    while let Some(result) = task_set.join_next().await {
        match result {
            Ok(Ok(name)) => info!("[{}] stopped", name),
            Ok(Err(e)) => error!("task error during shutdown: {:#}", e),
            Err(e) => error!("task panicked during shutdown: {}", e),
        }
    }

    info!("Shutdown complete");
    Ok(())
}
