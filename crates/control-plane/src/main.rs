// Meetup API server
// Decision: Without DATABASE_URL the server runs on the in-memory store (dev mode)

use anyhow::{Context, Result};
use meetup_control_plane::auth::{AuthConfig, AuthState};
use meetup_control_plane::build_app;
use meetup_control_plane::config::{SeedAccountsConfig, ServerConfig};
use meetup_control_plane::storage::StorageBackend;
use meetup_core::telemetry::{init_telemetry, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    // Configure via environment variables:
    // - SERVICE_NAME: Service name (default: "meetup-control-plane")
    // - RUST_LOG: Log filter (default: "meetup_control_plane=debug,tower_http=debug")
    // - LOG_FORMAT: "json" for structured output
    let mut telemetry_config = TelemetryConfig::from_env();
    if telemetry_config.service_name == "meetup" {
        telemetry_config.service_name = "meetup-control-plane".to_string();
    }
    if telemetry_config.log_filter.is_none() {
        telemetry_config.log_filter =
            Some("meetup_control_plane=debug,tower_http=debug".to_string());
    }
    telemetry_config.service_version = Some(env!("CARGO_PKG_VERSION").to_string());
    init_telemetry(telemetry_config);

    tracing::info!("meetup-control-plane starting...");

    let server_config = ServerConfig::from_env();

    let db = match &server_config.database_url {
        Some(url) => {
            let db = StorageBackend::postgres(url)
                .await
                .context("Failed to initialize PostgreSQL storage")?;
            tracing::info!("Connected to database, migrations applied");
            db
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };

    let auth_config = AuthConfig::from_env();
    tracing::info!(
        client_id = %auth_config.client.client_id,
        access_token_lifetime = auth_config.jwt.access_token_lifetime.as_secs(),
        refresh_token_lifetime = auth_config.jwt.refresh_token_lifetime.as_secs(),
        "Authentication configured"
    );
    let auth_state = AuthState::new(auth_config, db.clone());

    auth_state
        .accounts
        .seed_accounts(&SeedAccountsConfig::from_env())
        .await
        .context("Failed to seed accounts")?;

    let purged = db
        .delete_expired_refresh_tokens()
        .await
        .context("Failed to purge expired refresh tokens")?;
    if purged > 0 {
        tracing::info!(count = purged, "Purged expired refresh tokens");
    }

    if server_config.cors_allowed_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?server_config.cors_allowed_origins, "CORS origins configured");
    }
    tracing::info!(base_url = %server_config.base_url, "Hypermedia links use this base URL");

    let app = build_app(&server_config, auth_state);

    let listener = tokio::net::TcpListener::bind(&server_config.http_addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", server_config.http_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
