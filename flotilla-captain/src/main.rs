//! Flotilla Captain
//!
//! The singleton controller of the flotilla: it tracks the crew of
//! sailor hosts, accepts chore submissions, matches chores to sailors
//! under per-user and per-sailor constraints, and records every
//! lifecycle step in three JSON documents.
//!
//! Architecture:
//! - Store: atomic JSON documents (crew, chores, users)
//! - Repositories: data access over the documents
//! - Services: business logic (quotas, lifecycle, heartbeat folding)
//! - Scheduler: the periodic control loop (liveness, limits, matching)
//! - API: axum HTTP ingress for users, admins, and sailors

pub mod api;
pub mod config;
pub mod discovery;
pub mod repository;
pub mod scheduler;
pub mod service;
pub mod store;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flotilla_client::{SailorApi, SailorClient};

use crate::api::AppState;
use crate::config::Config;
use crate::discovery::ServeFlag;
use crate::scheduler::ControlLoop;
use crate::store::Store;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "flotilla_captain=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Flotilla Captain...");

    let config = Config::from_env();
    config.validate()?;
    info!(
        "Loaded configuration: bind_addr={}, data_dir={}",
        config.bind_addr,
        config.data_dir.display()
    );

    // Load the three documents; a fresh directory starts empty.
    let store = Arc::new(Store::open(&config.data_dir).context("Failed to open document store")?);
    info!("Document store loaded");

    let client: Arc<dyn SailorApi> = Arc::new(SailorClient::new(config.rpc_timeout));

    // The control loop shares the store with the HTTP handlers and runs
    // until the process exits.
    let control = ControlLoop::new(config.clone(), Arc::clone(&store), Arc::clone(&client));
    tokio::spawn(async move { control.run().await });

    let state = AppState {
        store,
        client,
        config: Arc::new(config.clone()),
    };
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on {}", config.bind_addr);

    // Flag file so local CLIs can discover the captain.
    let flag = ServeFlag::for_bind_addr(&config.bind_addr)?;
    discovery::write(&config.discovery_file, &flag).await?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    discovery::remove(&config.discovery_file).await;

    served.context("Server error")?;
    info!("Captain stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}
