//! Veil API server entry point.

use std::error::Error;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use veil_api::config::Config;
use veil_api::session::SessionSigner;
use veil_api::state::AppState;
use veil_api::telemetry;
use veil_core::repository::Store;
use veil_game::application::presence::SnapshotOnConnect;
use veil_store::PgStore;
use veil_stream::EventHub;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // A missing .env is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    let telemetry = telemetry::init(config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting Veil API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));

    // Start the event hub.
    let (shutdown, shutdown_signal) = watch::channel(false);
    let (hub, handle) = EventHub::new();
    let hub_task = hub
        .with_listener(Arc::new(SnapshotOnConnect::new(store.clone(), handle.clone())))
        .spawn(shutdown_signal);

    let sessions = SessionSigner::new(config.session_secret.as_bytes())?;
    let app_state = AppState::new(store, handle, sessions, config.admin_key.as_str());

    // TODO: Replace CorsLayer::permissive() with the frontend origin once it is configurable.
    let app = veil_api::app(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = config.bind_address()?;
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown requested");
            let _ = shutdown.send(true);
        })
        .await?;

    let _ = hub_task.await;
    telemetry.shutdown();
    Ok(())
}
