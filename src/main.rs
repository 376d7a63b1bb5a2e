//! dispatch-gateway server entry point.
//!
//! Starts the Axum HTTP server for job dispatch, assignment lifecycle,
//! and payout settlement.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use dispatch_gateway::api;
use dispatch_gateway::app_state::AppState;
use dispatch_gateway::config::DispatchConfig;
use dispatch_gateway::domain::EventBus;
use dispatch_gateway::notify::{LogNotifier, spawn_listener};
use dispatch_gateway::persistence::{MemoryStore, PostgresStore, RetryPolicy, Store};
use dispatch_gateway::service::{
    AlwaysReady, DispatchService, LedgerReconciler, NoopGeocoder,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = DispatchConfig::from_env()?;
    tracing::info!(addr = %config.listen_addr, "starting dispatch-gateway");

    // Build persistence layer
    let store: Arc<dyn Store> = if config.persistence_enabled {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await?;
        tracing::info!("connected to PostgreSQL");
        Arc::new(PostgresStore::new(pool, RetryPolicy::new(config.retry)))
    } else {
        tracing::warn!("persistence disabled; using in-memory store");
        Arc::new(MemoryStore::new())
    };

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let dispatch = Arc::new(DispatchService::new(
        Arc::clone(&store),
        Arc::new(NoopGeocoder),
        Arc::new(AlwaysReady),
        event_bus.clone(),
        config.ranking,
        config.payout,
    ));
    let reconciler = Arc::new(LedgerReconciler::new(
        store,
        event_bus.clone(),
        config.payout,
    ));

    // Forward domain events to the notification bridge
    let _listener = spawn_listener(&event_bus, Arc::new(LogNotifier));

    // Build application state
    let app_state = AppState {
        dispatch,
        reconciler,
        event_bus,
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
