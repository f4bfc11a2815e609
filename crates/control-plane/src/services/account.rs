// Account service: registration, credential checks and startup seeding

use crate::config::SeedAccountsConfig;
use crate::storage::{
    password::{hash_password, verify_password},
    CreateAccountRow, DuplicateEmail, StorageBackend,
};
use anyhow::Result;
use meetup_core::{Account, AccountRole, ValidationErrors};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

/// Object name reported in registration field errors
pub const ACCOUNT_OBJECT_NAME: &str = "accountDto";

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 4;

#[derive(Debug, Error)]
pub enum AccountServiceError {
    #[error("invalid account: {0}")]
    Validation(ValidationErrors),
    #[error("email already registered")]
    EmailTaken,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(email))
}

/// Check registration input, collecting every violation
pub fn validate_registration(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if !is_valid_email(email) {
        errors.reject(
            ACCOUNT_OBJECT_NAME,
            "email",
            "Email",
            "must be a well-formed email address",
            Some(email.to_string()),
        );
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.reject(
            ACCOUNT_OBJECT_NAME,
            "password",
            "Size",
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
            None,
        );
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub struct AccountService {
    db: StorageBackend,
}

impl AccountService {
    pub fn new(db: StorageBackend) -> Self {
        Self { db }
    }

    /// Register a new account with a hashed password
    pub async fn save_account(
        &self,
        email: &str,
        password: &str,
        roles: Vec<AccountRole>,
    ) -> Result<Account, AccountServiceError> {
        let span = tracing::info_span!("save_account", email = %email);
        self.save_account_inner(email, password, roles)
            .instrument(span)
            .await
    }

    async fn save_account_inner(
        &self,
        email: &str,
        password: &str,
        roles: Vec<AccountRole>,
    ) -> Result<Account, AccountServiceError> {
        validate_registration(email, password).map_err(AccountServiceError::Validation)?;

        // Duplicates are caught by the store's unique email constraint
        let row = self
            .db
            .create_account(CreateAccountRow {
                email: email.to_string(),
                password_hash: hash_password(password)?,
                roles,
            })
            .await
            .map_err(|e| {
                if e.downcast_ref::<DuplicateEmail>().is_some() {
                    tracing::warn!("Registration rejected, email already taken");
                    AccountServiceError::EmailTaken
                } else {
                    AccountServiceError::Internal(e)
                }
            })?;

        tracing::info!(account_id = %row.id, "Account created");
        Ok(row.to_account())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.db.get_account(id).await?.map(|row| row.to_account()))
    }

    pub async fn load_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self
            .db
            .get_account_by_email(email)
            .await?
            .map(|row| row.to_account()))
    }

    /// Check email and password. `None` means the credentials are wrong.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<Account>> {
        let Some(row) = self.db.get_account_by_email(email).await? else {
            tracing::warn!("Authentication failed: unknown account");
            return Ok(None);
        };

        if !verify_password(password, &row.password_hash)? {
            tracing::warn!(account_id = %row.id, "Authentication failed: wrong password");
            return Ok(None);
        }

        Ok(Some(row.to_account()))
    }

    /// Create the configured seed accounts that do not exist yet
    pub async fn seed_accounts(&self, config: &SeedAccountsConfig) -> Result<()> {
        let seeds = [
            (&config.admin, vec![AccountRole::Admin, AccountRole::User]),
            (&config.user, vec![AccountRole::User]),
        ];

        for (seed, roles) in seeds {
            let Some(seed) = seed else { continue };
            if self.db.get_account_by_email(&seed.username).await?.is_some() {
                tracing::debug!(email = %seed.username, "Seed account already exists");
                continue;
            }
            match self.save_account(&seed.username, &seed.password, roles).await {
                Ok(account) => tracing::info!(email = %account.email, "Seeded account"),
                Err(AccountServiceError::Internal(e)) => return Err(e),
                Err(e) => tracing::warn!(email = %seed.username, "Skipping seed account: {}", e),
            }
        }

        Ok(())
    }
}
