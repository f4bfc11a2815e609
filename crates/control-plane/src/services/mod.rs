// Services layer for business logic
// Services own business logic and validation, calling storage directly

pub mod account;
pub mod event;

pub use account::{AccountService, AccountServiceError};
pub use event::{EventPage, EventService, EventServiceError};
