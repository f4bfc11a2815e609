// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: UUIDs generated via uuid v7 (time-ordered)
//
// This implementation provides a PostgreSQL-compatible API backed by in-memory
// HashMaps, allowing the control-plane to run without a database for development.

use anyhow::Result;
use chrono::Utc;
use parking_lot::RwLock;
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::*;

/// In-memory database for dev mode
/// All data is stored in memory and lost on restart
#[derive(Default)]
pub struct InMemoryDatabase {
    accounts: RwLock<HashMap<Uuid, AccountRow>>,
    refresh_tokens: RwLock<HashMap<Uuid, RefreshTokenRow>>,
    events: RwLock<HashMap<Uuid, EventRow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: CreateAccountRow) -> Result<AccountRow> {
        let mut accounts = self.accounts.write();
        if accounts.values().any(|a| a.email == input.email) {
            return Err(DuplicateEmail(input.email).into());
        }

        let now = Utc::now();
        let roles: Vec<&str> = input.roles.iter().map(|r| r.as_str()).collect();
        let row = AccountRow {
            id: Uuid::now_v7(),
            email: input.email,
            password_hash: input.password_hash,
            roles: serde_json::to_value(&roles)?,
            created_at: now,
            updated_at: now,
        };
        accounts.insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        Ok(self.accounts.read().get(&id).cloned())
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        Ok(self
            .accounts
            .read()
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    // ============================================
    // Refresh tokens
    // ============================================

    pub async fn create_refresh_token(
        &self,
        input: CreateRefreshTokenRow,
    ) -> Result<RefreshTokenRow> {
        let row = RefreshTokenRow {
            id: Uuid::now_v7(),
            account_id: input.account_id,
            token_hash: input.token_hash,
            expires_at: input.expires_at,
            created_at: Utc::now(),
        };
        self.refresh_tokens.write().insert(row.id, row.clone());
        Ok(row)
    }

    pub async fn get_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRow>> {
        Ok(self
            .refresh_tokens
            .read()
            .values()
            .find(|t| t.token_hash == token_hash)
            .cloned())
    }

    pub async fn delete_refresh_token(&self, id: Uuid) -> Result<bool> {
        Ok(self.refresh_tokens.write().remove(&id).is_some())
    }

    pub async fn delete_expired_refresh_tokens(&self) -> Result<u64> {
        let now = Utc::now();
        let mut tokens = self.refresh_tokens.write();
        let before = tokens.len();
        tokens.retain(|_, t| t.expires_at >= now);
        Ok((before - tokens.len()) as u64)
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, event: &EventRow) -> Result<EventRow> {
        self.events.write().insert(event.id, event.clone());
        Ok(event.clone())
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        Ok(self.events.read().get(&id).cloned())
    }

    pub async fn list_events(&self, page: EventPageRequest) -> Result<(Vec<EventRow>, i64)> {
        let events = self.events.read();
        let mut rows: Vec<EventRow> = events.values().cloned().collect();
        rows.sort_by(|a, b| {
            let ord = compare_events(a, b, page.sort);
            let ord = match page.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            };
            ord.then_with(|| a.id.cmp(&b.id))
        });

        let total = rows.len() as i64;
        let rows = rows
            .into_iter()
            .skip(page.offset().max(0) as usize)
            .take(page.size.max(0) as usize)
            .collect();

        Ok((rows, total))
    }

    pub async fn update_event(&self, event: &EventRow) -> Result<Option<EventRow>> {
        let mut events = self.events.write();
        match events.get_mut(&event.id) {
            Some(existing) if existing.manager_id == event.manager_id => {
                let created_at = existing.created_at;
                *existing = EventRow {
                    event_status: existing.event_status.clone(),
                    created_at,
                    updated_at: Utc::now(),
                    ..event.clone()
                };
                Ok(Some(existing.clone()))
            }
            _ => Ok(None),
        }
    }
}

fn compare_events(a: &EventRow, b: &EventRow, sort: EventSortColumn) -> Ordering {
    match sort {
        EventSortColumn::Id => a.id.cmp(&b.id),
        EventSortColumn::Name => a.name.cmp(&b.name),
        EventSortColumn::BeginEnrollmentDateTime => a
            .begin_enrollment_date_time
            .cmp(&b.begin_enrollment_date_time),
        EventSortColumn::BeginEventDateTime => a.begin_event_date_time.cmp(&b.begin_event_date_time),
    }
}
