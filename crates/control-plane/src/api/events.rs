// Event HTTP routes (HAL resources)
// Decision: Reads are public, writes need a bearer token
// Decision: Affordance links (create-event, update-event) only appear for callers allowed to follow them

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meetup_core::{Event, EventRequest, ValidationErrors};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{
    page_query_string, ErrorsResource, LinkBuilder, Links, PageMetadata, PageQuery,
};
use crate::auth::config::SCOPE_WRITE;
use crate::auth::{AuthState, AuthUser, FromRef, OptionalAuthUser};
use crate::services::{EventPage, EventService, EventServiceError};
use crate::storage::StorageBackend;

const PROFILE_LIST: &str = "/docs/index.html#resources-events-list";
const PROFILE_GET: &str = "/docs/index.html#resources-events-get";
const PROFILE_CREATE: &str = "/docs/index.html#resources-events-create";
const PROFILE_UPDATE: &str = "/docs/index.html#resources-events-update";

/// Event with its hypermedia links
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventResource {
    #[serde(flatten)]
    pub event: Event,
    #[serde(rename = "_links")]
    pub links: Links,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EmbeddedEvents {
    #[serde(rename = "eventList")]
    pub event_list: Vec<EventResource>,
}

/// One page of events as a HAL collection
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EventsPage {
    /// Omitted when the page is empty
    #[serde(rename = "_embedded", skip_serializing_if = "Option::is_none")]
    pub embedded: Option<EmbeddedEvents>,
    #[serde(rename = "_links")]
    pub links: Links,
    pub page: PageMetadata,
}

/// App state for event routes
#[derive(Clone)]
pub struct EventsState {
    pub service: Arc<EventService>,
    pub links: LinkBuilder,
    pub auth: AuthState,
}

impl EventsState {
    pub fn new(db: StorageBackend, links: LinkBuilder, auth: AuthState) -> Self {
        Self {
            service: Arc::new(EventService::new(db)),
            links,
            auth,
        }
    }

    fn event_href(&self, id: Uuid) -> String {
        self.links.href(&format!("/api/events/{id}"))
    }

    fn resource(&self, event: Event) -> EventResource {
        let links = Links::new().with("self", self.event_href(event.id));
        EventResource { event, links }
    }

    fn page_resource(&self, page: EventPage, caller: Option<&AuthUser>) -> EventsPage {
        let request = page.request;
        let meta = PageMetadata::new(request.size, page.total, request.page);
        let page_href = |number: i64| {
            self.links
                .href(&format!("/api/events?{}", page_query_string(&request, number)))
        };

        let mut links = Links::new()
            .with("self", page_href(request.page))
            .with("first", page_href(0))
            .with("last", page_href((meta.total_pages - 1).max(0)))
            .with("profile", self.links.href(PROFILE_LIST));
        if request.page > 0 {
            links.add("prev", page_href(request.page - 1));
        }
        let next = request.page.saturating_add(1);
        if next < meta.total_pages {
            links.add("next", page_href(next));
        }
        if caller.is_some() {
            links.add("create-event", self.links.href("/api/events"));
        }

        let embedded = (!page.events.is_empty()).then(|| EmbeddedEvents {
            event_list: page
                .events
                .into_iter()
                .map(|event| self.resource(event))
                .collect(),
        });

        EventsPage {
            embedded,
            links,
            page: meta,
        }
    }

    /// Bind a request body, answering unreadable or mistyped input with the 400 error resource
    fn bind_request(
        &self,
        payload: Result<Json<serde_json::Value>, JsonRejection>,
    ) -> Result<EventRequest, Response> {
        let Json(value) = payload.map_err(|rejection| match rejection {
            JsonRejection::JsonSyntaxError(_) | JsonRejection::JsonDataError(_) => {
                self.error_response(EventServiceError::Validation(ValidationErrors::unreadable(
                    rejection.body_text(),
                )))
            }
            other => other.into_response(),
        })?;
        EventRequest::from_json(&value)
            .map_err(|errors| self.error_response(EventServiceError::Validation(errors)))
    }

    fn error_response(&self, err: EventServiceError) -> Response {
        match err {
            EventServiceError::NotFound => StatusCode::NOT_FOUND.into_response(),
            EventServiceError::Validation(errors) => {
                tracing::warn!("Rejected event: {}", errors);
                ErrorsResource::new(errors.errors, &self.links).into_response()
            }
            EventServiceError::NotManager => StatusCode::UNAUTHORIZED.into_response(),
            EventServiceError::Internal(e) => {
                tracing::error!("Event operation failed: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl FromRef<EventsState> for AuthState {
    fn from_ref(input: &EventsState) -> Self {
        input.auth.clone()
    }
}

/// Create event routes
pub fn routes(state: EventsState) -> Router {
    Router::new()
        .route("/api/events", post(create_event).get(list_events))
        .route("/api/events/:id", get(get_event).put(update_event))
        .with_state(state)
}

/// GET /api/events - List events page by page
#[utoipa::path(
    get,
    path = "/api/events",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of events", body = EventsPage),
        (status = 401, description = "Invalid bearer token"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn list_events(
    State(state): State<EventsState>,
    OptionalAuthUser(caller): OptionalAuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<EventsPage>, StatusCode> {
    let page = state
        .service
        .list(query.to_page_request())
        .await
        .map_err(|e| {
            tracing::error!("Failed to list events: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(state.page_resource(page, caller.as_ref())))
}

/// GET /api/events/{id} - Get event by ID
#[utoipa::path(
    get,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = EventResource),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "events"
)]
pub async fn get_event(
    State(state): State<EventsState>,
    OptionalAuthUser(caller): OptionalAuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResource>, StatusCode> {
    let event = state
        .service
        .get(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get event: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    let is_manager = caller.is_some_and(|c| event.is_managed_by(c.id));
    let mut resource = state.resource(event);
    resource.links.add("profile", state.links.href(PROFILE_GET));
    if is_manager {
        resource
            .links
            .add("update-event", state.event_href(resource.event.id));
    }

    Ok(Json(resource))
}

/// POST /api/events - Create an event managed by the caller
#[utoipa::path(
    post,
    path = "/api/events",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResource),
        (status = 400, description = "Invalid event", body = ErrorsResource),
        (status = 401, description = "Authentication required"),
        (status = 403, description = "Token lacks the write scope"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn create_event(
    State(state): State<EventsState>,
    user: AuthUser,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    if let Err(e) = user.require_scope(SCOPE_WRITE) {
        return e.into_response();
    }
    let req = match state.bind_request(payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    let event = match state.service.create(req, user.id).await {
        Ok(event) => event,
        Err(e) => return state.error_response(e),
    };

    let location = state.event_href(event.id);
    let mut resource = state.resource(event);
    resource
        .links
        .add("query-events", state.links.href("/api/events"));
    resource.links.add("update-event", location.clone());
    resource.links.add("profile", state.links.href(PROFILE_CREATE));

    (
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(resource),
    )
        .into_response()
}

/// PUT /api/events/{id} - Replace an event (manager only)
#[utoipa::path(
    put,
    path = "/api/events/{id}",
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResource),
        (status = 400, description = "Invalid event", body = ErrorsResource),
        (status = 401, description = "Not authenticated or not the manager"),
        (status = 403, description = "Token lacks the write scope"),
        (status = 404, description = "Event not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn update_event(
    State(state): State<EventsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> Response {
    if let Err(e) = user.require_scope(SCOPE_WRITE) {
        return e.into_response();
    }
    let req = match state.bind_request(payload) {
        Ok(req) => req,
        Err(response) => return response,
    };

    match state.service.update(id, req, user.id).await {
        Ok(event) => {
            let mut resource = state.resource(event);
            resource.links.add("profile", state.links.href(PROFILE_UPDATE));
            Json(resource).into_response()
        }
        Err(e) => state.error_response(e),
    }
}
