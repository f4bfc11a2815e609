// Common DTOs for public API
//
// Hypermedia (HAL) building blocks shared by the resource endpoints:
// links, paging metadata, and the error resource.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use meetup_core::FieldError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

use crate::storage::{EventPageRequest, EventSortColumn, SortDirection};

/// Default page size for list endpoints
pub const DEFAULT_PAGE_SIZE: i64 = 20;
/// Largest page size a client may request
pub const MAX_PAGE_SIZE: i64 = 100;
/// Highest page number accepted, so offsets and next-page links stay in range
pub const MAX_PAGE_NUMBER: i64 = i64::MAX / MAX_PAGE_SIZE - 1;

/// Standard error response for API endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message describing what went wrong.
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }

    /// Convert to axum response tuple
    pub fn into_response(self, status: StatusCode) -> (StatusCode, Json<Self>) {
        (status, Json(self))
    }
}

/// A single hypermedia link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Link {
    pub href: String,
}

/// Link relations keyed by name, serialized as the HAL `_links` object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Links(pub BTreeMap<String, Link>);

impl Links {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, rel: &str, href: impl Into<String>) -> Self {
        self.add(rel, href);
        self
    }

    pub fn add(&mut self, rel: &str, href: impl Into<String>) {
        self.0.insert(rel.to_string(), Link { href: href.into() });
    }

    pub fn get(&self, rel: &str) -> Option<&str> {
        self.0.get(rel).map(|l| l.href.as_str())
    }

    pub fn contains(&self, rel: &str) -> bool {
        self.0.contains_key(rel)
    }
}

/// Builds absolute hrefs from the configured public base URL
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `path` must start with `/`
    pub fn href(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn index(&self) -> String {
        self.href("/api")
    }
}

/// Paging metadata of a HAL collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
    pub number: i64,
}

impl PageMetadata {
    pub fn new(size: i64, total_elements: i64, number: i64) -> Self {
        let total_pages = if size > 0 {
            (total_elements + size - 1) / size
        } else {
            0
        };
        Self {
            size,
            total_elements,
            total_pages,
            number,
        }
    }
}

/// Paging query parameters
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Zero-based page number
    pub page: Option<i64>,
    /// Page size (default 20, max 100)
    pub size: Option<i64>,
    /// Sort property and optional direction, e.g. `name,desc`
    pub sort: Option<String>,
}

impl PageQuery {
    /// Normalize into a page request. Out-of-range values are clamped and
    /// unknown sort properties fall back to `id`.
    pub fn to_page_request(&self) -> EventPageRequest {
        let page = self.page.unwrap_or(0).clamp(0, MAX_PAGE_NUMBER);
        let size = match self.size {
            Some(size) if size > 0 => size.min(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };

        let (sort, direction) = self
            .sort
            .as_deref()
            .map(parse_sort)
            .unwrap_or_default();

        EventPageRequest {
            page,
            size,
            sort,
            direction,
        }
    }
}

fn parse_sort(raw: &str) -> (EventSortColumn, SortDirection) {
    let mut parts = raw.split(',').map(str::trim);
    let sort = parts
        .next()
        .and_then(EventSortColumn::parse)
        .unwrap_or_default();
    let direction = match parts.next() {
        Some(d) if d.eq_ignore_ascii_case("desc") => SortDirection::Desc,
        _ => SortDirection::Asc,
    };
    (sort, direction)
}

/// Query string reproducing a page request, used for paging links
pub fn page_query_string(request: &EventPageRequest, page: i64) -> String {
    let mut query = format!("page={}&size={}", page, request.size);
    if request.sort != EventSortColumn::default() || request.direction != SortDirection::default()
    {
        let direction = match request.direction {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        query.push_str(&format!("&sort={},{}", request.sort.property(), direction));
    }
    query
}

/// Error resource: field errors plus a link back to the API index
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorsResource {
    pub errors: Vec<FieldError>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl ErrorsResource {
    pub fn new(errors: Vec<FieldError>, links: &LinkBuilder) -> Self {
        Self {
            errors,
            links: Links::new().with("index", links.index()),
        }
    }
}

impl IntoResponse for ErrorsResource {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}
