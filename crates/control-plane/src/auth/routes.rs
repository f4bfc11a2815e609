// OAuth2 token endpoint
// Decision: Clients authenticate with HTTP Basic, grant parameters come as a form body
// Decision: Errors follow RFC 6749 section 5.2 ({error, error_description})
// Decision: Refresh tokens are single-use; redeeming one deletes it and issues a new pair

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Form, Json, Router,
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use chrono::Utc;
use meetup_core::Account;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    config::{CLIENT_SCOPES, GRANT_PASSWORD, GRANT_REFRESH_TOKEN},
    jwt::{hash_token, TokenPair},
    middleware::AuthState,
};
use crate::storage::CreateRefreshTokenRow;

/// Token request (form encoded)
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TokenRequest {
    /// `password` or `refresh_token`
    pub grant_type: Option<String>,
    /// Account email (password grant)
    pub username: Option<String>,
    /// Account password (password grant)
    pub password: Option<String>,
    /// Refresh token (refresh_token grant)
    pub refresh_token: Option<String>,
    /// Space separated scopes, defaults to every scope of the client
    pub scope: Option<String>,
}

/// OAuth2 error response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OAuthError {
    pub error: String,
    pub error_description: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl OAuthError {
    fn new(status: StatusCode, error: &str, description: &str) -> Self {
        Self {
            error: error.to_string(),
            error_description: description.to_string(),
            status,
        }
    }

    pub fn invalid_client(description: &str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "invalid_client", description)
    }

    pub fn invalid_request(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", description)
    }

    pub fn invalid_grant(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_grant", description)
    }

    pub fn invalid_scope(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_scope", description)
    }

    pub fn unsupported_grant_type(description: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "unsupported_grant_type", description)
    }

    pub fn server_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "server_error",
            "Internal server error",
        )
    }
}

impl IntoResponse for OAuthError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::UNAUTHORIZED {
            (
                self.status,
                [(header::WWW_AUTHENTICATE, "Basic realm=\"oauth2/client\"")],
                Json(self),
            )
                .into_response()
        } else {
            (self.status, Json(self)).into_response()
        }
    }
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/oauth/token", post(token))
        .with_state(state)
}

/// POST /oauth/token - Issue tokens for the password or refresh_token grant
#[utoipa::path(
    post,
    path = "/oauth/token",
    request_body(content = TokenRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Tokens issued", body = TokenPair),
        (status = 400, description = "Invalid grant or request", body = OAuthError),
        (status = 401, description = "Invalid client credentials", body = OAuthError)
    ),
    security(("client_basic" = [])),
    tag = "auth"
)]
pub async fn token(
    State(state): State<AuthState>,
    client: Option<TypedHeader<Authorization<Basic>>>,
    Form(req): Form<TokenRequest>,
) -> Result<Response, OAuthError> {
    let Some(TypedHeader(Authorization(basic))) = client else {
        return Err(OAuthError::invalid_client("Client authentication required"));
    };
    if !state.config.client.matches(basic.username(), basic.password()) {
        tracing::warn!(client_id = %basic.username(), "Rejected client credentials");
        return Err(OAuthError::invalid_client("Bad client credentials"));
    }

    let grant_type = present(&req.grant_type)
        .ok_or_else(|| OAuthError::invalid_request("Missing grant_type"))?;

    let pair = match grant_type {
        GRANT_PASSWORD => password_grant(&state, &req).await?,
        GRANT_REFRESH_TOKEN => refresh_token_grant(&state, &req).await?,
        other => {
            return Err(OAuthError::unsupported_grant_type(&format!(
                "Unsupported grant type: {other}"
            )))
        }
    };

    Ok((
        [(header::CACHE_CONTROL, "no-store"), (header::PRAGMA, "no-cache")],
        Json(pair),
    )
        .into_response())
}

async fn password_grant(state: &AuthState, req: &TokenRequest) -> Result<TokenPair, OAuthError> {
    let username =
        present(&req.username).ok_or_else(|| OAuthError::invalid_request("Missing username"))?;
    let password = req
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| OAuthError::invalid_request("Missing password"))?;
    let scope = resolve_scope(req.scope.as_deref())?;

    let account = state
        .accounts
        .authenticate(username, password)
        .await
        .map_err(|e| {
            tracing::error!("Database error during authentication: {}", e);
            OAuthError::server_error()
        })?
        .ok_or_else(|| OAuthError::invalid_grant("Bad credentials"))?;

    issue_tokens(state, &account, &scope).await
}

async fn refresh_token_grant(
    state: &AuthState,
    req: &TokenRequest,
) -> Result<TokenPair, OAuthError> {
    let refresh_token = present(&req.refresh_token)
        .ok_or_else(|| OAuthError::invalid_request("Missing refresh_token"))?;

    let claims = state
        .jwt_service
        .validate_refresh_token(refresh_token)
        .map_err(|e| {
            tracing::debug!("Refresh token validation failed: {}", e);
            OAuthError::invalid_grant("Invalid refresh token")
        })?;

    // Check if token is in database (not used or revoked)
    let token_row = state
        .db
        .get_refresh_token_by_hash(&hash_token(refresh_token))
        .await
        .map_err(|e| {
            tracing::error!("Database error during refresh: {}", e);
            OAuthError::server_error()
        })?
        .ok_or_else(|| OAuthError::invalid_grant("Invalid refresh token"))?;

    if token_row.expires_at < Utc::now() {
        return Err(OAuthError::invalid_grant("Refresh token expired"));
    }

    // Losing the delete race means another request already redeemed it
    let deleted = state
        .db
        .delete_refresh_token(token_row.id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete refresh token: {}", e);
            OAuthError::server_error()
        })?;
    if !deleted {
        return Err(OAuthError::invalid_grant("Invalid refresh token"));
    }

    let account_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| OAuthError::invalid_grant("Invalid refresh token"))?;
    if account_id != token_row.account_id {
        return Err(OAuthError::invalid_grant("Invalid refresh token"));
    }

    let account = state
        .accounts
        .get(account_id)
        .await
        .map_err(|e| {
            tracing::error!("Database error during refresh: {}", e);
            OAuthError::server_error()
        })?
        .ok_or_else(|| OAuthError::invalid_grant("Account no longer exists"))?;

    let scope = match present(&req.scope) {
        Some(requested) => narrow_scope(requested, &claims.scope)?,
        None => claims.scope,
    };

    issue_tokens(state, &account, &scope).await
}

/// Generate a token pair and persist the refresh token hash
async fn issue_tokens(
    state: &AuthState,
    account: &Account,
    scope: &str,
) -> Result<TokenPair, OAuthError> {
    let roles: Vec<String> = account.roles.iter().map(|r| r.to_string()).collect();
    let (pair, refresh) = state
        .jwt_service
        .generate_token_pair(account.id, &account.email, &roles, scope)
        .map_err(|e| {
            tracing::error!("Token generation error: {}", e);
            OAuthError::server_error()
        })?;

    state
        .db
        .create_refresh_token(CreateRefreshTokenRow {
            account_id: account.id,
            token_hash: hash_token(&refresh.token),
            expires_at: refresh.expires_at,
        })
        .await
        .map_err(|e| {
            tracing::error!("Failed to store refresh token: {}", e);
            OAuthError::server_error()
        })?;

    tracing::info!(account_id = %account.id, scope = %scope, "Issued tokens");
    Ok(pair)
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Requested scopes must all belong to the client. No request means every client scope.
fn resolve_scope(requested: Option<&str>) -> Result<String, OAuthError> {
    let Some(requested) = requested.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(CLIENT_SCOPES.join(" "));
    };
    narrow_scope(requested, &CLIENT_SCOPES.join(" "))
}

/// Keep `requested` only if it is a subset of `granted`
fn narrow_scope(requested: &str, granted: &str) -> Result<String, OAuthError> {
    let granted: Vec<&str> = granted.split_whitespace().collect();
    let mut scopes: Vec<&str> = Vec::new();
    for scope in requested.split_whitespace() {
        if !granted.contains(&scope) {
            return Err(OAuthError::invalid_scope(&format!("Invalid scope: {scope}")));
        }
        if !scopes.contains(&scope) {
            scopes.push(scope);
        }
    }
    Ok(scopes.join(" "))
}
