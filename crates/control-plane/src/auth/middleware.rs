// Authentication middleware and extractors
// Decision: Bearer JWTs in the Authorization header are the only credential on API routes
// Decision: A present but invalid token is rejected even on routes where auth is optional

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use meetup_core::AccountRole;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use super::{config::AuthConfig, jwt::JwtService};
use crate::services::AccountService;
use crate::storage::StorageBackend;

/// Authentication error
#[derive(Debug, Clone, Serialize)]
pub struct AuthError {
    pub error: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl AuthError {
    pub fn unauthorized(message: &str) -> Self {
        Self {
            error: message.to_string(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    /// Valid token that was not granted `scope` (RFC 6750 insufficient_scope)
    pub fn insufficient_scope(scope: &str) -> Self {
        Self {
            error: format!("insufficient_scope: '{scope}' scope required"),
            status: StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let challenge = if self.status == StatusCode::FORBIDDEN {
            r#"Bearer error="insufficient_scope""#
        } else {
            "Bearer"
        };
        (self.status, [(header::WWW_AUTHENTICATE, challenge)], Json(self)).into_response()
    }
}

/// Authenticated account extracted from a bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Account ID
    pub id: Uuid,
    /// Account email
    pub email: String,
    /// Account roles
    pub roles: Vec<AccountRole>,
    /// Scopes granted to the token
    pub scopes: Vec<String>,
}

impl AuthUser {
    pub fn has_role(&self, role: AccountRole) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(AccountRole::Admin)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }

    /// Reject tokens that were not granted `scope`
    pub fn require_scope(&self, scope: &str) -> Result<(), AuthError> {
        if self.has_scope(scope) {
            Ok(())
        } else {
            Err(AuthError::insufficient_scope(scope))
        }
    }
}

/// Auth state shared across routes
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub jwt_service: Arc<JwtService>,
    pub accounts: Arc<AccountService>,
    pub db: StorageBackend,
}

impl AuthState {
    pub fn new(config: AuthConfig, db: StorageBackend) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let accounts = Arc::new(AccountService::new(db.clone()));
        Self {
            config,
            jwt_service,
            accounts,
            db,
        }
    }
}

/// Helper trait for extracting AuthState from application state
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

impl FromRef<AuthState> for AuthState {
    fn from_ref(input: &AuthState) -> Self {
        input.clone()
    }
}

/// Extractor for authenticated user
/// This is required - returns 401 if not authenticated
#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        extract_auth_user(parts, &auth_state)?
            .ok_or_else(|| AuthError::unauthorized("Authentication required"))
    }
}

/// Optional auth extractor - `None` when no Authorization header was sent
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);
        Ok(OptionalAuthUser(extract_auth_user(parts, &auth_state)?))
    }
}

/// Extract the caller from the Authorization header.
/// `Ok(None)` when the header is absent, an error when it is present but unusable.
fn extract_auth_user(parts: &Parts, auth_state: &AuthState) -> Result<Option<AuthUser>, AuthError> {
    if !parts.headers.contains_key(header::AUTHORIZATION) {
        return Ok(None);
    }

    let bearer = parts
        .headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| AuthError::unauthorized("Invalid authorization header"))?;

    validate_jwt_token(bearer.token(), auth_state).map(Some)
}

/// Validate JWT token and return user
fn validate_jwt_token(token: &str, auth_state: &AuthState) -> Result<AuthUser, AuthError> {
    let claims = auth_state
        .jwt_service
        .validate_access_token(token)
        .map_err(|e| {
            tracing::debug!("JWT validation failed: {}", e);
            AuthError::unauthorized("Invalid or expired token")
        })?;

    let id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AuthError::unauthorized("Invalid account ID in token"))?;

    Ok(AuthUser {
        id,
        email: claims.email,
        roles: claims
            .roles
            .iter()
            .filter_map(|r| AccountRole::parse(r))
            .collect(),
        scopes: claims.scope.split_whitespace().map(String::from).collect(),
    })
}
