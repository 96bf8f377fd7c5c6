//! gamerlink server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderValue, Method, header};
use gamerlink_api::AppState;
use gamerlink_common::{Config, SessionKeys, config::ServerConfig};
use gamerlink_core::{FollowingService, ProfileService, UserService};
use gamerlink_db::repositories::{
    FollowRequestRepository, FollowingRepository, UserGameRepository, UserProfileRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// CORS for the configured browser origins. Unparseable origins are skipped.
fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gamerlink=debug,tower_http=debug".into()),
        )
        .init();

    if let Err(e) = dotenv {
        info!(reason = %e, "No .env file loaded");
    }

    info!("Starting gamerlink server...");

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    config.validate()?;

    // Connect to database
    let db = gamerlink_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    gamerlink_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let user_profile_repo = UserProfileRepository::new(Arc::clone(&db));
    let user_game_repo = UserGameRepository::new(Arc::clone(&db));
    let following_repo = FollowingRepository::new();
    let follow_request_repo = FollowRequestRepository::new();

    // Initialize services
    let session_keys = SessionKeys::from_config(&config.auth);
    let user_service = UserService::new(
        Arc::clone(&db),
        user_repo.clone(),
        user_profile_repo.clone(),
        session_keys,
    );
    let following_service = FollowingService::new(
        Arc::clone(&db),
        following_repo,
        follow_request_repo,
        user_repo.clone(),
    );
    let profile_service = ProfileService::new(
        Arc::clone(&db),
        user_repo,
        user_profile_repo,
        user_game_repo,
        following_repo,
        following_service.clone(),
    );

    let state = AppState {
        user_service,
        profile_service,
        following_service,
    };

    let app = gamerlink_api::app(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.server));

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router and its services are gone once serve returns
    match Arc::try_unwrap(db) {
        Ok(db) => {
            if let Err(e) = db.close().await {
                warn!(error = %e, "Failed to close database pool");
            }
        }
        Err(db) => warn!(
            references = Arc::strong_count(&db),
            "Database pool still shared at shutdown"
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}
