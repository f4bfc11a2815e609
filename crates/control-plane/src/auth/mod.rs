// Authentication module
// Decision: OAuth2 password and refresh_token grants issuing HS256 JWTs
//
// - config: AUTH_* environment configuration
// - jwt: token generation/validation
// - middleware: bearer extractors (AuthUser, OptionalAuthUser)
// - routes: POST /oauth/token

pub mod config;
pub mod jwt;
pub mod middleware;
pub mod routes;

pub use config::AuthConfig;
pub use middleware::{AuthError, AuthState, AuthUser, FromRef, OptionalAuthUser};
pub use routes::routes;
