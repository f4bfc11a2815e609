// Meetup Control Plane Library
// Decision: Shared library for binaries (API server, OpenAPI export) and router-level tests

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication module
pub mod auth;

// Environment configuration
pub mod config;

// Services layer
pub mod services;
pub use services::{AccountService, EventService};

// Storage layer
pub mod storage;

// OpenAPI spec generation
pub mod openapi;

use axum::http::{header, Method};
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::LinkBuilder;
use crate::auth::AuthState;
use crate::config::ServerConfig;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        storage: state.storage,
    })
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

/// Build the full HTTP application: API routes, token endpoint, docs, CORS and tracing
pub fn build_app(server: &ServerConfig, auth_state: AuthState) -> Router {
    let links = LinkBuilder::new(server.base_url.clone());
    let db = auth_state.db.clone();

    let health_state = HealthState {
        storage: if db.is_dev_mode() { "memory" } else { "postgres" },
    };
    let events_state = api::events::EventsState::new(db, links.clone(), auth_state.clone());
    let accounts_state = api::accounts::AccountsState::new(links.clone(), auth_state.clone());

    let app = Router::new()
        .route("/health", get(health).with_state(health_state))
        .merge(api::index::routes(links))
        .merge(api::events::routes(events_state))
        .merge(api::accounts::routes(accounts_state))
        .merge(auth::routes(auth_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", openapi::ApiDoc::openapi()));

    // Add CORS layer only if origins are configured
    let cors_origins = server.cors_origin_headers();
    let app = if cors_origins.is_empty() {
        app
    } else {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .expose_headers([header::LOCATION]),
        )
    };

    app.layer(TraceLayer::new_for_http())
}
