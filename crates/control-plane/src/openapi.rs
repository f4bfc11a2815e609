// OpenAPI specification generation
//
// This module defines the OpenAPI spec for the Meetup API.
// It can be used by both the main API server (for Swagger UI)
// and the export-openapi binary (for static spec generation).

use crate::api;
use crate::auth;
use meetup_core::{
    Account, AccountRole, Event, EventRequest, EventStatus, FieldError, Manager, ValidationErrors,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// OpenAPI documentation for the Meetup API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::index::index,
        api::events::list_events,
        api::events::get_event,
        api::events::create_event,
        api::events::update_event,
        api::accounts::register_account,
        api::accounts::get_current_account,
        api::accounts::get_account,
        auth::routes::token,
    ),
    components(
        schemas(
            Event, EventStatus, Manager, EventRequest,
            Account, AccountRole,
            FieldError, ValidationErrors,
            api::Link, api::Links, api::PageMetadata,
            api::ErrorResponse, api::ErrorsResource,
            api::events::EventResource, api::events::EventsPage, api::events::EmbeddedEvents,
            api::accounts::AccountResource, api::accounts::RegisterAccountRequest,
            api::index::IndexResource,
            auth::routes::TokenRequest, auth::routes::OAuthError, auth::jwt::TokenPair,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "index", description = "API entry point"),
        (name = "events", description = "Event management endpoints"),
        (name = "accounts", description = "Account registration endpoints"),
        (name = "auth", description = "OAuth2 token endpoint")
    ),
    info(
        title = "Meetup API",
        version = "0.1.0",
        description = "API for publishing and managing meetup events",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

/// Registers the bearer (JWT) and client Basic security schemes
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
            components.add_security_scheme(
                "client_basic",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
            );
        }
    }
}

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}
