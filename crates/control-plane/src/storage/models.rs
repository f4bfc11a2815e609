// Database models (internal, may differ from public DTOs)

use chrono::{DateTime, NaiveDateTime, Utc};
use meetup_core::{Account, AccountRole, Event, EventDetails, EventStatus, Manager};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================
// Accounts
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub roles: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert rejected because another account already uses the email
#[derive(Debug, thiserror::Error)]
#[error("account with email {0} already exists")]
pub struct DuplicateEmail(pub String);

impl AccountRow {
    pub fn role_list(&self) -> Vec<AccountRole> {
        let names: Vec<String> = serde_json::from_value(self.roles.clone()).unwrap_or_default();
        names.iter().filter_map(|n| AccountRole::parse(n)).collect()
    }

    pub fn to_account(&self) -> Account {
        Account {
            id: self.id,
            email: self.email.clone(),
            roles: self.role_list(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateAccountRow {
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<AccountRole>,
}

// ============================================
// Refresh tokens
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct RefreshTokenRow {
    pub id: Uuid,
    pub account_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateRefreshTokenRow {
    pub account_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

// ============================================
// Events
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub begin_enrollment_date_time: NaiveDateTime,
    pub close_enrollment_date_time: NaiveDateTime,
    pub begin_event_date_time: NaiveDateTime,
    pub end_event_date_time: NaiveDateTime,
    pub location: Option<String>,
    pub base_price: i32,
    pub max_price: i32,
    pub limit_of_enrollment: i32,
    pub offline: bool,
    pub free: bool,
    pub event_status: String,
    pub manager_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        let d = &event.details;
        Self {
            id: event.id,
            name: d.name.clone(),
            description: d.description.clone(),
            begin_enrollment_date_time: d.begin_enrollment_date_time,
            close_enrollment_date_time: d.close_enrollment_date_time,
            begin_event_date_time: d.begin_event_date_time,
            end_event_date_time: d.end_event_date_time,
            location: d.location.clone(),
            base_price: d.base_price,
            max_price: d.max_price,
            limit_of_enrollment: d.limit_of_enrollment,
            offline: event.offline,
            free: event.free,
            event_status: event.event_status.to_string(),
            manager_id: event.manager.id,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id,
            details: EventDetails {
                name: row.name,
                description: row.description,
                begin_enrollment_date_time: row.begin_enrollment_date_time,
                close_enrollment_date_time: row.close_enrollment_date_time,
                begin_event_date_time: row.begin_event_date_time,
                end_event_date_time: row.end_event_date_time,
                location: row.location,
                base_price: row.base_price,
                max_price: row.max_price,
                limit_of_enrollment: row.limit_of_enrollment,
            },
            offline: row.offline,
            free: row.free,
            event_status: EventStatus::parse(&row.event_status).unwrap_or_default(),
            manager: Manager { id: row.manager_id },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Sortable event columns
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EventSortColumn {
    #[default]
    Id,
    Name,
    BeginEnrollmentDateTime,
    BeginEventDateTime,
}

impl EventSortColumn {
    /// Parse the public (camelCase) property name
    pub fn parse(property: &str) -> Option<Self> {
        match property {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "beginEnrollmentDateTime" => Some(Self::BeginEnrollmentDateTime),
            "beginEventDateTime" => Some(Self::BeginEventDateTime),
            _ => None,
        }
    }

    pub fn property(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::BeginEnrollmentDateTime => "beginEnrollmentDateTime",
            Self::BeginEventDateTime => "beginEventDateTime",
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::BeginEnrollmentDateTime => "begin_enrollment_date_time",
            Self::BeginEventDateTime => "begin_event_date_time",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One page of the event list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPageRequest {
    /// Zero-based page number
    pub page: i64,
    /// Page size
    pub size: i64,
    pub sort: EventSortColumn,
    pub direction: SortDirection,
}

impl Default for EventPageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 20,
            sort: EventSortColumn::default(),
            direction: SortDirection::default(),
        }
    }
}

impl EventPageRequest {
    /// Rows to skip. Saturates instead of overflowing for absurd page numbers.
    pub fn offset(&self) -> i64 {
        self.page.max(0).saturating_mul(self.size.max(0))
    }
}
