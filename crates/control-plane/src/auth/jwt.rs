// JWT token service for authentication
// Decision: Use HS256 algorithm for simplicity (symmetric key)
// Decision: Access tokens are short-lived, refresh tokens are stored in DB (hashed) and single-use

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::config::JwtConfig;

const ACCESS: &str = "access";
const REFRESH: &str = "refresh";

/// Generate a random identifier string (32 hex characters)
fn generate_random_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessTokenClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Account roles
    pub roles: Vec<String>,
    /// Granted scopes, space separated
    pub scope: String,
    /// Token type
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// JWT claims for refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshTokenClaims {
    /// Subject (account ID)
    pub sub: String,
    /// Scopes carried over to the next access token
    pub scope: String,
    /// Token type
    pub token_type: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Unique token ID, keeps rotated tokens distinct
    pub jti: String,
}

/// OAuth2 access token response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    /// Always `bearer`
    pub token_type: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    pub scope: String,
}

/// A freshly issued refresh token together with its expiry
pub struct IssuedRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Generate access token for an account
    pub fn generate_access_token(
        &self,
        account_id: Uuid,
        email: &str,
        roles: &[String],
        scope: &str,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::from_std(self.config.access_token_lifetime)?;

        let claims = AccessTokenClaims {
            sub: account_id.to_string(),
            email: email.to_string(),
            roles: roles.to_vec(),
            scope: scope.to_string(),
            token_type: ACCESS.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode access token")
    }

    /// Generate refresh token for an account
    pub fn generate_refresh_token(
        &self,
        account_id: Uuid,
        scope: &str,
    ) -> Result<IssuedRefreshToken> {
        let now = Utc::now();
        let expires_at = now + Duration::from_std(self.config.refresh_token_lifetime)?;

        let claims = RefreshTokenClaims {
            sub: account_id.to_string(),
            scope: scope.to_string(),
            token_type: REFRESH.to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
            jti: generate_random_id(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .context("Failed to encode refresh token")?;

        Ok(IssuedRefreshToken { token, expires_at })
    }

    /// Generate both access and refresh tokens
    pub fn generate_token_pair(
        &self,
        account_id: Uuid,
        email: &str,
        roles: &[String],
        scope: &str,
    ) -> Result<(TokenPair, IssuedRefreshToken)> {
        let access_token = self.generate_access_token(account_id, email, roles, scope)?;
        let refresh = self.generate_refresh_token(account_id, scope)?;

        let token_pair = TokenPair {
            access_token,
            token_type: "bearer".to_string(),
            refresh_token: refresh.token.clone(),
            expires_in: self.access_token_lifetime_secs(),
            scope: scope.to_string(),
        };

        Ok((token_pair, refresh))
    }

    /// Validate and decode an access token
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .context("Invalid access token")?;

        if token_data.claims.token_type != ACCESS {
            anyhow::bail!("Invalid token type");
        }

        Ok(token_data.claims)
    }

    /// Validate and decode a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<RefreshTokenClaims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<RefreshTokenClaims>(token, &self.decoding_key, &validation)
            .context("Invalid refresh token")?;

        if token_data.claims.token_type != REFRESH {
            anyhow::bail!("Invalid token type");
        }

        Ok(token_data.claims)
    }

    /// Get access token lifetime in seconds
    pub fn access_token_lifetime_secs(&self) -> i64 {
        self.config.access_token_lifetime.as_secs() as i64
    }
}

/// Hash a token for database storage (using SHA-256)
pub fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(token.as_bytes());
    hex::encode(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-for-testing".to_string(),
            access_token_lifetime: StdDuration::from_secs(600),
            refresh_token_lifetime: StdDuration::from_secs(3600),
        }
    }

    #[test]
    fn test_generate_access_token() {
        let service = JwtService::new(test_config());
        let account_id = Uuid::now_v7();
        let token = service
            .generate_access_token(
                account_id,
                "user@example.com",
                &["USER".to_string()],
                "read write",
            )
            .unwrap();

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.email, "user@example.com");
        assert_eq!(claims.roles, vec!["USER".to_string()]);
        assert_eq!(claims.scope, "read write");
        assert_eq!(claims.exp - claims.iat, 600);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let service = JwtService::new(test_config());
        let account_id = Uuid::now_v7();
        let first = service.generate_refresh_token(account_id, "read").unwrap();
        let second = service.generate_refresh_token(account_id, "read").unwrap();
        assert_ne!(first.token, second.token);

        let claims = service.validate_refresh_token(&first.token).unwrap();
        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.scope, "read");
        assert_eq!(claims.exp, first.expires_at.timestamp());
    }

    #[test]
    fn test_generate_token_pair() {
        let service = JwtService::new(test_config());
        let (pair, refresh) = service
            .generate_token_pair(Uuid::nil(), "user@example.com", &[], "read write")
            .unwrap();

        assert_eq!(pair.token_type, "bearer");
        assert_eq!(pair.expires_in, 600);
        assert_eq!(pair.refresh_token, refresh.token);
        assert!(!pair.access_token.is_empty());
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let service = JwtService::new(test_config());
        let (pair, _) = service
            .generate_token_pair(Uuid::nil(), "user@example.com", &[], "read")
            .unwrap();

        assert!(service.validate_access_token(&pair.refresh_token).is_err());
        assert!(service.validate_refresh_token(&pair.access_token).is_err());
    }

    #[test]
    fn test_token_signed_with_other_secret_rejected() {
        let service = JwtService::new(test_config());
        let other = JwtService::new(JwtConfig {
            secret: "another-secret".to_string(),
            ..test_config()
        });
        let token = other
            .generate_access_token(Uuid::nil(), "user@example.com", &[], "read")
            .unwrap();
        assert!(service.validate_access_token(&token).is_err());
        assert!(service.validate_access_token("invalid-token").is_err());
    }

    #[test]
    fn test_hash_token() {
        let hash = hash_token("test-token-123");
        assert_eq!(hash, hash_token("test-token-123"));
        assert_ne!(hash, hash_token("test-token-124"));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
