// File: crates/turnero_gcal/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::handlers::{
    AgendaResponse, AppointmentsResponse, BookingPageResponse, CancellationResponse,
    DashboardResponse, SearchResponse, SlotsPreviewResponse,
};
use crate::logic::{
    AvailabilitySlot, BookSlotRequest, BookingResponse, DaySlots, DirectBookingRequest,
};
use turnero_auth::SessionUser;
use turnero_common::{Attendee, CalendarEvent, EventDateTime, GoogleCalendar};
use turnero_config::ScheduleConfig;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::search_handler,
        crate::handlers::agenda_handler,
        crate::handlers::create_calendar_handler,
        crate::handlers::slots_preview_handler,
        crate::handlers::list_appointments_handler,
        crate::handlers::cancel_appointment_handler,
        crate::handlers::dashboard_handler,
        crate::handlers::create_direct_booking_handler,
        crate::handlers::booking_page_handler,
        crate::handlers::book_handler
    ),
    components(
        schemas(
            AvailabilitySlot,
            DaySlots,
            BookSlotRequest,
            BookingResponse,
            SearchResponse,
            AgendaResponse,
            SlotsPreviewResponse,
            AppointmentsResponse,
            CancellationResponse,
            BookingPageResponse,
            DashboardResponse,
            DirectBookingRequest,
            SessionUser,
            ScheduleConfig,
            GoogleCalendar,
            CalendarEvent,
            EventDateTime,
            Attendee
        )
    ),
    tags(
        (name = "turnero", description = "Agenda and booking API")
    ),
    servers(
        (url = "/api", description = "Turnero API server")
    )
)]
pub struct GcalApiDoc;
