// --- File: crates/turnero_common/src/lib.rs ---

// Declare modules within this crate
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Calendar data structures
pub mod services; // Service abstractions

// Re-export error types and utilities for easier access
pub use error::{
    config_error, conflict, external_service_error, internal_error, not_found, unauthorized,
    validation_error, HttpStatusCode, TurneroError,
};

// Re-export HTTP utilities for easier access
pub use http::{
    client::{create_client, HTTP_CLIENT},
    IntoHttpResponse,
};

// Re-export logging utilities for easier access
pub use logging::{init, init_with_file, init_with_level, log_result};

pub use models::{Attendee, CalendarEvent, EventDateTime, GoogleCalendar, NewCalendar, NewEvent};
pub use services::{BoxFuture, CalendarAuth, CalendarService};
