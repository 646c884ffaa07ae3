//! Trackside API
//!
//! Read-only listing API for races and sporting events, backed by SQLite.

mod cli;
mod config;
mod routes;
mod storage;
mod types;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::routes::AppState;
use crate::storage::{open_database, Events, Races, Repository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { host, port } => run_server(host, port).await,
        Commands::Seed { database } => cli::run_seed(database),
    }
}

/// Run the API server.
async fn run_server(host: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackside_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = AppConfig::load()?;

    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded");
    tracing::info!("Database path: {}", config.database.path);

    // Open the database and seed both families
    let conn = Arc::new(Mutex::new(open_database(&config.database.path)?));
    let races = Repository::<Races>::new(Arc::clone(&conn));
    let events = Repository::<Events>::new(conn);

    races.init()?;
    events.init()?;
    tracing::info!("Repositories initialized");

    // Create application state
    let state = Arc::new(AppState { races, events });

    // Build router
    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/v1/list-races", post(routes::list_races))
        .route("/v1/races/:id", get(routes::get_race))
        .route("/v1/list-events", post(routes::list_events))
        .route("/v1/events/:id", get(routes::get_event))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    // Start server
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
