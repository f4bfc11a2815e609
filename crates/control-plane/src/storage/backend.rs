// Storage backend abstraction
// Decision: Use enum dispatch for simplicity over trait objects
//
// This module provides a unified StorageBackend enum that can work with
// either PostgreSQL (production) or in-memory (dev mode) storage.

use anyhow::Result;
use std::sync::Arc;
use uuid::Uuid;

use super::memory::InMemoryDatabase;
use super::models::*;
use super::repositories::Database;

/// Storage backend that can be either PostgreSQL or in-memory
#[derive(Clone)]
pub enum StorageBackend {
    /// PostgreSQL database (production)
    Postgres(Database),
    /// In-memory database (dev mode)
    InMemory(Arc<InMemoryDatabase>),
}

impl StorageBackend {
    /// Create a PostgreSQL storage backend from a database URL and apply migrations
    pub async fn postgres(database_url: &str) -> Result<Self> {
        let db = Database::from_url(database_url).await?;
        db.migrate().await?;
        Ok(Self::Postgres(db))
    }

    /// Create an in-memory storage backend
    pub fn in_memory() -> Self {
        Self::InMemory(Arc::new(InMemoryDatabase::new()))
    }

    /// Check if this is dev mode (in-memory)
    pub fn is_dev_mode(&self) -> bool {
        matches!(self, Self::InMemory(_))
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: CreateAccountRow) -> Result<AccountRow> {
        match self {
            Self::Postgres(db) => db.create_account(input).await,
            Self::InMemory(db) => db.create_account(input).await,
        }
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        match self {
            Self::Postgres(db) => db.get_account(id).await,
            Self::InMemory(db) => db.get_account(id).await,
        }
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        match self {
            Self::Postgres(db) => db.get_account_by_email(email).await,
            Self::InMemory(db) => db.get_account_by_email(email).await,
        }
    }

    // ============================================
    // Refresh Tokens
    // ============================================

    pub async fn create_refresh_token(
        &self,
        input: CreateRefreshTokenRow,
    ) -> Result<RefreshTokenRow> {
        match self {
            Self::Postgres(db) => db.create_refresh_token(input).await,
            Self::InMemory(db) => db.create_refresh_token(input).await,
        }
    }

    pub async fn get_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRow>> {
        match self {
            Self::Postgres(db) => db.get_refresh_token_by_hash(token_hash).await,
            Self::InMemory(db) => db.get_refresh_token_by_hash(token_hash).await,
        }
    }

    pub async fn delete_refresh_token(&self, id: Uuid) -> Result<bool> {
        match self {
            Self::Postgres(db) => db.delete_refresh_token(id).await,
            Self::InMemory(db) => db.delete_refresh_token(id).await,
        }
    }

    pub async fn delete_expired_refresh_tokens(&self) -> Result<u64> {
        match self {
            Self::Postgres(db) => db.delete_expired_refresh_tokens().await,
            Self::InMemory(db) => db.delete_expired_refresh_tokens().await,
        }
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, event: &EventRow) -> Result<EventRow> {
        match self {
            Self::Postgres(db) => db.create_event(event).await,
            Self::InMemory(db) => db.create_event(event).await,
        }
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.get_event(id).await,
            Self::InMemory(db) => db.get_event(id).await,
        }
    }

    pub async fn list_events(&self, page: EventPageRequest) -> Result<(Vec<EventRow>, i64)> {
        match self {
            Self::Postgres(db) => db.list_events(page).await,
            Self::InMemory(db) => db.list_events(page).await,
        }
    }

    pub async fn update_event(&self, event: &EventRow) -> Result<Option<EventRow>> {
        match self {
            Self::Postgres(db) => db.update_event(event).await,
            Self::InMemory(db) => db.update_event(event).await,
        }
    }
}
