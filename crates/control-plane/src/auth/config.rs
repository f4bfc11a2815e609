// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: A single statically configured OAuth2 client (password + refresh_token grants)

use std::time::Duration;

/// Scopes granted to the configured client
pub const CLIENT_SCOPES: [&str; 2] = [SCOPE_READ, SCOPE_WRITE];

pub const SCOPE_READ: &str = "read";
/// Required to create or modify events
pub const SCOPE_WRITE: &str = "write";

/// Grant types the configured client may use
pub const GRANT_PASSWORD: &str = "password";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs
    pub secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            access_token_lifetime: Duration::from_secs(10 * 60), // 10 minutes
            refresh_token_lifetime: Duration::from_secs(60 * 60), // 1 hour
        }
    }
}

/// OAuth2 client credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl Default for OAuthClientConfig {
    fn default() -> Self {
        Self {
            client_id: "myApp".to_string(),
            client_secret: "pass".to_string(),
        }
    }
}

impl OAuthClientConfig {
    /// Check presented client credentials
    pub fn matches(&self, client_id: &str, client_secret: &str) -> bool {
        // compare both to avoid short-circuiting on the id
        let id_ok = constant_time_eq(self.client_id.as_bytes(), client_id.as_bytes());
        let secret_ok = constant_time_eq(self.client_secret.as_bytes(), client_secret.as_bytes());
        id_ok & secret_ok
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Complete authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// The OAuth2 client allowed to request tokens
    pub client: OAuthClientConfig,
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!("AUTH_JWT_SECRET not set, generating a random secret (tokens won't survive restarts)");
                use rand::Rng;
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            });

        let access_token_lifetime = std::env::var("AUTH_ACCESS_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(10 * 60));

        let refresh_token_lifetime = std::env::var("AUTH_REFRESH_TOKEN_LIFETIME")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60 * 60));

        let defaults = OAuthClientConfig::default();
        let client = OAuthClientConfig {
            client_id: std::env::var("AUTH_CLIENT_ID").unwrap_or(defaults.client_id),
            client_secret: std::env::var("AUTH_CLIENT_SECRET").unwrap_or(defaults.client_secret),
        };

        Self {
            jwt: JwtConfig {
                secret,
                access_token_lifetime,
                refresh_token_lifetime,
            },
            client,
        }
    }
}
