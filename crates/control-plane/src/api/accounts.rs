// Account HTTP routes: registration and caller lookup

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use meetup_core::{Account, AccountRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ErrorResponse, ErrorsResource, LinkBuilder, Links};
use crate::auth::{AuthState, AuthUser, FromRef};
use crate::services::{AccountService, AccountServiceError};

/// Request to register an account
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RegisterAccountRequest {
    #[schema(example = "keesun@email.com")]
    pub email: String,
    /// At least 4 characters
    #[schema(example = "keesun")]
    pub password: String,
}

/// Account with its hypermedia links
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountResource {
    #[serde(flatten)]
    pub account: Account,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// App state for account routes
#[derive(Clone)]
pub struct AccountsState {
    pub service: Arc<AccountService>,
    pub links: LinkBuilder,
    pub auth: AuthState,
}

impl AccountsState {
    pub fn new(links: LinkBuilder, auth: AuthState) -> Self {
        Self {
            service: auth.accounts.clone(),
            links,
            auth,
        }
    }

    fn account_href(&self, id: Uuid) -> String {
        self.links.href(&format!("/api/accounts/{id}"))
    }

    fn resource(&self, account: Account) -> AccountResource {
        let links = Links::new().with("self", self.account_href(account.id));
        AccountResource { account, links }
    }
}

impl FromRef<AccountsState> for AuthState {
    fn from_ref(input: &AccountsState) -> Self {
        input.auth.clone()
    }
}

/// Create account routes
pub fn routes(state: AccountsState) -> Router {
    Router::new()
        .route("/api/accounts", post(register_account))
        .route("/api/accounts/me", get(get_current_account))
        .route("/api/accounts/:id", get(get_account))
        .with_state(state)
}

/// POST /api/accounts - Register a new account
#[utoipa::path(
    post,
    path = "/api/accounts",
    request_body = RegisterAccountRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResource),
        (status = 400, description = "Invalid email or password", body = ErrorsResource),
        (status = 409, description = "Email already registered", body = ErrorResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "accounts"
)]
pub async fn register_account(
    State(state): State<AccountsState>,
    Json(req): Json<RegisterAccountRequest>,
) -> Response {
    let result = state
        .service
        .save_account(&req.email, &req.password, vec![AccountRole::User])
        .await;

    match result {
        Ok(account) => {
            let location = state.account_href(account.id);
            (
                StatusCode::CREATED,
                [(header::LOCATION, location)],
                Json(state.resource(account)),
            )
                .into_response()
        }
        Err(AccountServiceError::Validation(errors)) => {
            ErrorsResource::new(errors.errors, &state.links).into_response()
        }
        Err(AccountServiceError::EmailTaken) => ErrorResponse::new("Email already registered")
            .into_response(StatusCode::CONFLICT)
            .into_response(),
        Err(AccountServiceError::Internal(e)) => {
            tracing::error!("Failed to register account: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// GET /api/accounts/me - Get the calling account
#[utoipa::path(
    get,
    path = "/api/accounts/me",
    responses(
        (status = 200, description = "Current account", body = AccountResource),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn get_current_account(
    State(state): State<AccountsState>,
    user: AuthUser,
) -> Result<Json<AccountResource>, StatusCode> {
    find_account(&state, user.id).await
}

/// GET /api/accounts/{id} - Get an account (the account itself or an admin)
#[utoipa::path(
    get,
    path = "/api/accounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Account ID")
    ),
    responses(
        (status = 200, description = "Account found", body = AccountResource),
        (status = 401, description = "Authentication required"),
        (status = 404, description = "Account not found or not visible to the caller")
    ),
    security(("bearer" = [])),
    tag = "accounts"
)]
pub async fn get_account(
    State(state): State<AccountsState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AccountResource>, StatusCode> {
    if user.id != id && !user.is_admin() {
        return Err(StatusCode::NOT_FOUND);
    }
    find_account(&state, id).await
}

async fn find_account(
    state: &AccountsState,
    id: Uuid,
) -> Result<Json<AccountResource>, StatusCode> {
    let account = state
        .service
        .get(id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get account: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(state.resource(account)))
}
