//! Fieldbook HTTP server.
//!
//! Wires the reservation engine onto `PostgreSQL` and serves the HTTP API.

mod config;

use config::Config;
use fieldbook_core::{AvailabilityResolver, ReservationLedger, SettingsStore, SystemClock};
use fieldbook_postgres::{
    migrate, PostgresReservationRepository, PostgresSettingsRepository, PostgresVenueCatalog,
};
use fieldbook_web::{build_router, AppState, TokenVerifier};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment still applies.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fieldbook=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Fieldbook server");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = Config::from_env();
    info!(
        max_connections = config.postgres.max_connections,
        run_migrations = config.postgres.run_migrations,
        address = %config.server.address(),
        "Configuration loaded"
    );
    if config.auth.uses_default_secret() {
        warn!("JWT_SECRET is not set; using the development secret. Do not run like this in production");
    }

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(config.postgres.connect_timeout())
        .connect(&config.postgres.url)
        .await?;
    info!("Database connected");

    if config.postgres.run_migrations {
        migrate(&pool).await?;
        info!("Migrations applied");
    }

    let clock = Arc::new(SystemClock);
    let venues = Arc::new(PostgresVenueCatalog::new(pool.clone()));
    let settings = SettingsStore::new(
        Arc::new(PostgresSettingsRepository::new(pool.clone())),
        clock.clone(),
    );
    let ledger = ReservationLedger::new(
        Arc::new(PostgresReservationRepository::new(pool)),
        venues.clone(),
        settings.clone(),
        clock,
    );
    let availability = AvailabilityResolver::new(venues, settings.clone(), ledger.clone());

    let state = AppState::new(
        ledger,
        availability,
        settings,
        TokenVerifier::new(config.auth.jwt_secret.as_bytes()),
    );
    let app = build_router(state);

    let addr = config.server.address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
