// API index: entry point linking to the top-level resources

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use utoipa::ToSchema;

use super::common::{LinkBuilder, Links};

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IndexResource {
    #[serde(rename = "_links")]
    pub links: Links,
}

pub fn routes(links: LinkBuilder) -> Router {
    Router::new().route("/api", get(index)).with_state(links)
}

/// GET /api - API index
#[utoipa::path(
    get,
    path = "/api",
    responses(
        (status = 200, description = "Links to the top-level resources", body = IndexResource)
    ),
    tag = "index"
)]
pub async fn index(State(links): State<LinkBuilder>) -> Json<IndexResource> {
    Json(IndexResource {
        links: Links::new()
            .with("events", links.href("/api/events"))
            .with("accounts", links.href("/api/accounts")),
    })
}
