// --- File: crates/turnero_common/src/services.rs ---
//! Service abstractions for external services.
//!
//! Handlers talk to the calendar backend only through [`CalendarService`], so the
//! Google implementation can be swapped for an in-memory one in tests.

use chrono::{DateTime, Utc};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::models::{CalendarEvent, GoogleCalendar, NewCalendar, NewEvent};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Credentials for a single calendar call.
#[derive(Clone, PartialEq, Eq)]
pub enum CalendarAuth {
    /// OAuth access token of the signed-in user.
    Bearer(String),
    /// Public API key. Only good for reading public calendars.
    ApiKey(String),
}

// Never print credentials.
impl fmt::Debug for CalendarAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarAuth::Bearer(_) => f.write_str("Bearer(***)"),
            CalendarAuth::ApiKey(_) => f.write_str("ApiKey(***)"),
        }
    }
}

/// A trait for calendar service operations.
///
/// Each call carries its own credentials: the service is shared across requests
/// from different users.
pub trait CalendarService: Send + Sync {
    /// Error type returned by calendar service operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Calendars in the authenticated user's calendar list.
    fn list_calendars(&self, auth: &CalendarAuth)
        -> BoxFuture<'_, Vec<GoogleCalendar>, Self::Error>;

    /// Metadata of a single calendar.
    fn get_calendar(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
    ) -> BoxFuture<'_, GoogleCalendar, Self::Error>;

    /// Create a secondary calendar owned by the authenticated user.
    fn create_calendar(
        &self,
        auth: &CalendarAuth,
        calendar: NewCalendar,
    ) -> BoxFuture<'_, GoogleCalendar, Self::Error>;

    /// Grant public read access to a calendar.
    fn make_calendar_public(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
    ) -> BoxFuture<'_, (), Self::Error>;

    /// Events overlapping `[time_min, time_max)`, recurring events expanded,
    /// ordered by start time.
    fn list_events(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarEvent>, Self::Error>;

    /// Create an event and notify its attendees.
    fn create_event(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
        event: NewEvent,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error>;

    /// Delete an event and notify its attendees.
    fn delete_event(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, (), Self::Error>;
}
