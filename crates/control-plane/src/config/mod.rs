// Server configuration loaded from environment variables
// Decision: DATABASE_URL is optional; without it the server runs on the in-memory store
// Decision: Seed accounts are only created when both username and password are set

use axum::http::HeaderValue;

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub http_addr: String,
    /// Public base URL used when building hypermedia links
    pub base_url: String,
    /// PostgreSQL connection string (None = in-memory dev mode)
    pub database_url: Option<String>,
    /// Origins allowed by CORS (empty = same-origin only)
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            database_url: None,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let http_addr = non_empty_var("HTTP_ADDR").unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let base_url = non_empty_var("APP_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            http_addr,
            base_url,
            database_url: non_empty_var("DATABASE_URL"),
            cors_allowed_origins: non_empty_var("CORS_ALLOWED_ORIGINS")
                .map(|s| parse_origins(&s))
                .unwrap_or_default(),
        }
    }

    /// CORS origins as header values, skipping any that are not valid header values
    pub fn cors_origin_headers(&self) -> Vec<HeaderValue> {
        self.cors_allowed_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect()
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.trim().is_empty())
}

/// Credentials for an account created at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAccount {
    pub username: String,
    pub password: String,
}

/// Accounts created at startup if they do not exist yet
#[derive(Debug, Clone, Default)]
pub struct SeedAccountsConfig {
    /// Gets ADMIN and USER roles
    pub admin: Option<SeedAccount>,
    /// Gets the USER role
    pub user: Option<SeedAccount>,
}

impl SeedAccountsConfig {
    pub fn from_env() -> Self {
        Self {
            admin: seed_account("APP_ADMIN_USERNAME", "APP_ADMIN_PASSWORD"),
            user: seed_account("APP_USER_USERNAME", "APP_USER_PASSWORD"),
        }
    }
}

fn seed_account(username_var: &str, password_var: &str) -> Option<SeedAccount> {
    match (non_empty_var(username_var), non_empty_var(password_var)) {
        (Some(username), Some(password)) => Some(SeedAccount { username, password }),
        (Some(_), None) => {
            tracing::warn!("{} is set without {}, skipping", username_var, password_var);
            None
        }
        _ => None,
    }
}
