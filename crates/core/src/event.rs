// Event domain types
//
// `free` and `offline` are derived from the submitted fields and are never
// accepted from clients. Every constructor and mutator goes through
// `Event::update()` so the stored flags always match price and location.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Event lifecycle status. New events always start as `DRAFT`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum EventStatus {
    #[default]
    Draft,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Draft => write!(f, "DRAFT"),
        }
    }
}

impl EventStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(EventStatus::Draft),
            _ => None,
        }
    }
}

/// Client-controlled event fields, already validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub name: String,
    pub description: String,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-11-23T14:21:00"))]
    pub begin_enrollment_date_time: NaiveDateTime,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-11-24T14:21:00"))]
    pub close_enrollment_date_time: NaiveDateTime,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-11-25T14:21:00"))]
    pub begin_event_date_time: NaiveDateTime,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-11-26T14:21:00"))]
    pub end_event_date_time: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub base_price: i32,
    pub max_price: i32,
    pub limit_of_enrollment: i32,
}

/// Reference to the account that manages an event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Manager {
    pub id: Uuid,
}

/// Persisted event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    #[serde(flatten)]
    pub details: EventDetails,
    pub offline: bool,
    pub free: bool,
    pub event_status: EventStatus,
    pub manager: Manager,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `true` iff both prices are zero.
pub fn is_free(base_price: i32, max_price: i32) -> bool {
    base_price == 0 && max_price == 0
}

/// `true` iff the location is present and not blank.
pub fn is_offline(location: Option<&str>) -> bool {
    location.is_some_and(|l| !l.trim().is_empty())
}

impl Event {
    /// Build a new `DRAFT` event owned by `manager_id`.
    pub fn draft(details: EventDetails, manager_id: Uuid) -> Self {
        let now = Utc::now();
        let mut event = Self {
            id: Uuid::now_v7(),
            details,
            offline: false,
            free: false,
            event_status: EventStatus::Draft,
            manager: Manager { id: manager_id },
            created_at: now,
            updated_at: now,
        };
        event.update();
        event
    }

    /// Replace the client-controlled fields and recompute the derived flags.
    pub fn apply(&mut self, details: EventDetails) {
        self.details = details;
        self.updated_at = Utc::now();
        self.update();
    }

    /// Recompute `free` and `offline` from price and location.
    pub fn update(&mut self) {
        self.free = is_free(self.details.base_price, self.details.max_price);
        self.offline = is_offline(self.details.location.as_deref());
    }

    pub fn is_managed_by(&self, account_id: Uuid) -> bool {
        self.manager.id == account_id
    }
}
