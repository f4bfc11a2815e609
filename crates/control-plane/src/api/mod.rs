// API layer: HAL resources over the services
//
// - index: GET /api
// - accounts: registration and caller lookup
// - events: event list/get/create/update

pub mod accounts;
pub mod common;
pub mod events;
pub mod index;

pub use common::{ErrorResponse, ErrorsResource, Link, LinkBuilder, Links, PageMetadata};
