// --- File: crates/turnero_gcal/src/routes.rs ---

use crate::handlers::{
    agenda_handler, book_handler, booking_page_handler, cancel_appointment_handler,
    create_calendar_handler, create_direct_booking_handler, dashboard_handler,
    list_appointments_handler, privacy_policy_handler, search_handler, slots_preview_handler,
    GcalState,
};
use axum::{
    routing::{delete, get, post},
    Router,
};

/// API routes for the agenda and the public booking pages. Mount under `/api`.
pub fn routes(state: GcalState) -> Router {
    Router::new()
        .route("/search", get(search_handler))
        .route("/agenda", get(agenda_handler))
        .route("/agenda/calendar", post(create_calendar_handler))
        .route("/agenda/slots", get(slots_preview_handler))
        .route("/agenda/appointments", get(list_appointments_handler))
        .route(
            "/agenda/appointments/{event_id}",
            delete(cancel_appointment_handler),
        )
        .route("/dashboard", get(dashboard_handler))
        .route("/dashboard/turnos", post(create_direct_booking_handler))
        .route(
            "/reservar_turno/{calendar_id}",
            get(booking_page_handler).post(book_handler),
        )
        .with_state(state)
}

/// Static pages served at the site root.
pub fn page_routes() -> Router {
    Router::new().route("/politicas", get(privacy_policy_handler))
}
