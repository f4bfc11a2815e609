// Meetup core domain
//
// DB-agnostic types shared by storage and API layers:
// - Account and AccountRole
// - Event, its derived-state rule (`free`, `offline`) and status
// - EventValidator, which turns a raw EventRequest into validated EventDetails

pub mod account;
pub mod event;
pub mod telemetry;
pub mod validation;

pub use account::{Account, AccountRole};
pub use event::{is_free, is_offline, Event, EventDetails, EventStatus, Manager};
pub use validation::{EventRequest, EventValidator, FieldError, ValidationErrors};
