// PostgreSQL repository layer
// Decision: Runtime-checked sqlx queries (query_as) so builds don't need a live database
// Decision: Ownership check and update happen in one statement

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, roles, created_at, updated_at";

const EVENT_COLUMNS: &str = "id, name, description, begin_enrollment_date_time, \
    close_enrollment_date_time, begin_event_date_time, end_event_date_time, location, \
    base_price, max_price, limit_of_enrollment, offline, free, event_status, manager_id, \
    created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        Ok(Self { pool })
    }

    /// Apply embedded migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // ============================================
    // Accounts
    // ============================================

    pub async fn create_account(&self, input: CreateAccountRow) -> Result<AccountRow> {
        let roles: Vec<&str> = input.roles.iter().map(|r| r.as_str()).collect();
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            r#"
            INSERT INTO accounts (id, email, password_hash, roles)
            VALUES ($1, $2, $3, $4)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(serde_json::to_value(&roles)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                anyhow::Error::new(DuplicateEmail(input.email.clone()))
            }
            e => e.into(),
        })?;

        Ok(row)
    }

    pub async fn get_account(&self, id: Uuid) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_account_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Refresh tokens
    // ============================================

    pub async fn create_refresh_token(
        &self,
        input: CreateRefreshTokenRow,
    ) -> Result<RefreshTokenRow> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            INSERT INTO refresh_tokens (id, account_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, account_id, token_hash, expires_at, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.account_id)
        .bind(&input.token_hash)
        .bind(input.expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_refresh_token_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRow>> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            r#"
            SELECT id, account_id, token_hash, expires_at, created_at
            FROM refresh_tokens
            WHERE token_hash = $1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_refresh_token(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired_refresh_tokens(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    // ============================================
    // Events
    // ============================================

    pub async fn create_event(&self, event: &EventRow) -> Result<EventRow> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            INSERT INTO events (
                id, name, description, begin_enrollment_date_time, close_enrollment_date_time,
                begin_event_date_time, end_event_date_time, location, base_price, max_price,
                limit_of_enrollment, offline, free, event_status, manager_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.begin_enrollment_date_time)
        .bind(event.close_enrollment_date_time)
        .bind(event.begin_event_date_time)
        .bind(event.end_event_date_time)
        .bind(&event.location)
        .bind(event.base_price)
        .bind(event.max_price)
        .bind(event.limit_of_enrollment)
        .bind(event.offline)
        .bind(event.free)
        .bind(&event.event_status)
        .bind(event.manager_id)
        .bind(event.created_at)
        .bind(event.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_event(&self, id: Uuid) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Returns one page of events and the total number of events
    pub async fn list_events(&self, page: EventPageRequest) -> Result<(Vec<EventRow>, i64)> {
        // column and direction come from closed enums, never from raw input
        let rows = sqlx::query_as::<_, EventRow>(&format!(
            "SELECT {EVENT_COLUMNS} FROM events ORDER BY {} {}, id ASC LIMIT $1 OFFSET $2",
            page.sort.column(),
            page.direction.sql(),
        ))
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Overwrite an event. Only matches when `manager_id` still owns it.
    pub async fn update_event(&self, event: &EventRow) -> Result<Option<EventRow>> {
        let row = sqlx::query_as::<_, EventRow>(&format!(
            r#"
            UPDATE events
            SET
                name = $3,
                description = $4,
                begin_enrollment_date_time = $5,
                close_enrollment_date_time = $6,
                begin_event_date_time = $7,
                end_event_date_time = $8,
                location = $9,
                base_price = $10,
                max_price = $11,
                limit_of_enrollment = $12,
                offline = $13,
                free = $14,
                updated_at = NOW()
            WHERE id = $1 AND manager_id = $2
            RETURNING {EVENT_COLUMNS}
            "#
        ))
        .bind(event.id)
        .bind(event.manager_id)
        .bind(&event.name)
        .bind(&event.description)
        .bind(event.begin_enrollment_date_time)
        .bind(event.close_enrollment_date_time)
        .bind(event.begin_event_date_time)
        .bind(event.end_event_date_time)
        .bind(&event.location)
        .bind(event.base_price)
        .bind(event.max_price)
        .bind(event.limit_of_enrollment)
        .bind(event.offline)
        .bind(event.free)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
