// --- File: crates/turnero_gcal/src/lib.rs ---
pub mod doc;
pub mod handlers;
pub mod logic;
#[cfg(test)]
mod logic_proptest;
pub mod routes;
pub mod service;

pub use handlers::GcalState;
pub use logic::{CalendarBackend, GcalError};
pub use routes::{page_routes, routes};
pub use service::{GcalServiceError, GoogleCalendarService};
