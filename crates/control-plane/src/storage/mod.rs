// Storage layer for the meetup control-plane
// Decision: Support both PostgreSQL (production) and in-memory (dev mode)
//
// - Database: PostgreSQL repositories (sqlx, embedded migrations)
// - InMemoryDatabase: HashMap-backed equivalent for dev mode and tests
// - StorageBackend: enum dispatch over the two

pub mod backend;
pub mod memory;
pub mod models;
pub mod password;
pub mod repositories;

pub use backend::StorageBackend;
pub use memory::InMemoryDatabase;
pub use models::*;
pub use repositories::Database;
