// File: crates/turnero_gcal/src/handlers.rs
use crate::logic::{
    book_appointment, cancel_appointment, create_app_calendar, create_direct_appointment,
    find_app_calendar, generate_available_slots_at, get_appointments, group_slots_by_day,
    looks_like_email, parse_time_zone, upcoming_primary_events, validate_booking,
    validate_schedule, AvailabilitySlot, BookSlotRequest, BookingPolicy, BookingResponse,
    CalendarBackend, Client, DaySlots, DirectBookingRequest, GcalError,
};
use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
};
use chrono::{Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use turnero_auth::{CurrentSession, MaybeSession, Session, SessionConfig, SessionUser};
use turnero_common::{
    external_service_error, not_found, validation_error, CalendarAuth, CalendarEvent,
    GoogleCalendar, TurneroError,
};
use turnero_config::{AppConfig, ScheduleConfig};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

const LOAD_SLOTS_ERROR: &str = "No se pudieron cargar los horarios. Asegúrate de que el calendario sea público o esté compartido contigo.";
const LOAD_CALENDARS_ERROR: &str = "Error al obtener calendarios";
const BOOKED_MESSAGE: &str = "¡Cita reservada con éxito! Recibirás una invitación por email.";
const CREATE_BOOKING_ERROR: &str = "Error al crear turno";

static PRIVACY_POLICY: &str = include_str!("../assets/politicas.html");

// Define shared state needed by GCal handlers
#[derive(Clone)]
pub struct GcalState {
    pub config: Arc<AppConfig>,
    pub calendar: Arc<CalendarBackend>,
    pub sessions: SessionConfig,
    pub time_zone: Tz,
}

impl FromRef<GcalState> for SessionConfig {
    fn from_ref(state: &GcalState) -> Self {
        state.sessions.clone()
    }
}

impl GcalState {
    /// Fails on an unknown time zone, an out-of-range look-ahead or an unusable default schedule.
    pub fn new(
        config: Arc<AppConfig>,
        calendar: Arc<CalendarBackend>,
        sessions: SessionConfig,
    ) -> Result<Self, GcalError> {
        let time_zone = parse_time_zone(config.booking.time_zone_name())?;
        validate_booking(&config.booking)?;
        validate_schedule(&config.schedule)?;
        Ok(Self {
            config,
            calendar,
            sessions,
            time_zone,
        })
    }

    fn policy<'a>(&'a self, schedule: &'a ScheduleConfig) -> BookingPolicy<'a> {
        BookingPolicy {
            schedule,
            time_zone: self.time_zone,
            days_ahead: self.config.booking.days_ahead,
            appointment_prefix: &self.config.booking.appointment_prefix,
        }
    }

    /// Read credentials: the user's token when signed in, else the public API key.
    fn read_auth(&self, session: Option<&Session>) -> Option<CalendarAuth> {
        session.map(Session::calendar_auth).or_else(|| {
            self.config
                .google
                .api_key
                .as_ref()
                .filter(|key| !key.is_empty())
                .map(|key| CalendarAuth::ApiKey(key.clone()))
        })
    }

    async fn app_calendar_id(
        &self,
        auth: &CalendarAuth,
        explicit: Option<String>,
    ) -> Result<String, TurneroError> {
        if let Some(id) = explicit.filter(|id| !id.is_empty()) {
            return Ok(id);
        }
        find_app_calendar(self.calendar.as_ref(), auth, &self.config.booking.app_calendar_name)
            .await?
            .map(|calendar| calendar.id)
            .ok_or_else(|| not_found("Todavía no creaste tu agenda de turnos"))
    }
}

fn booking_path(calendar_id: &str) -> String {
    format!("/reservar_turno/{}", urlencoding::encode(calendar_id))
}

// --- Search ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SearchQuery {
    /// Email of the professional whose agenda to open.
    pub email: Option<String>,
}

#[derive(Serialize, Debug, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SearchResponse {
    pub calendar_id: String,
    pub booking_path: String,
}

/// Resolves an owner's email to the booking page of their calendar.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Booking page for the email", body = SearchResponse),
        (status = 400, description = "Missing or malformed email"),
    ),
    tag = "turnero"
))]
pub async fn search_handler(
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, TurneroError> {
    let email = query.email.as_deref().map(str::trim).unwrap_or_default();
    if !looks_like_email(email) {
        return Err(validation_error("Ingresá un email válido"));
    }
    let calendar_id = email.to_lowercase();
    Ok(Json(SearchResponse {
        booking_path: booking_path(&calendar_id),
        calendar_id,
    }))
}

// --- Owner agenda ---

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AgendaResponse {
    pub user: SessionUser,
    /// The app calendar, `null` until the owner creates it.
    pub calendar: Option<GoogleCalendar>,
    /// Public booking page for the app calendar.
    pub share_path: Option<String>,
    pub events: Vec<CalendarEvent>,
    pub appointments: Vec<CalendarEvent>,
    pub slots: Vec<AvailabilitySlot>,
    pub schedule: ScheduleConfig,
    pub error: Option<String>,
}

/// Owner dashboard. Calendar API failures are reported in `error`, not as a failed request.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/agenda",
    responses(
        (status = 200, description = "Agenda panels", body = AgendaResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "turnero"
))]
pub async fn agenda_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
) -> Json<AgendaResponse> {
    let auth = session.calendar_auth();
    let booking = &state.config.booking;
    let mut response = AgendaResponse {
        user: session.user(),
        calendar: None,
        share_path: None,
        events: Vec::new(),
        appointments: Vec::new(),
        slots: Vec::new(),
        schedule: state.config.schedule.clone(),
        error: None,
    };

    let calendar =
        match find_app_calendar(state.calendar.as_ref(), &auth, &booking.app_calendar_name).await
        {
            Ok(Some(calendar)) => calendar,
            Ok(None) => return Json(response),
            Err(e) => {
                error!("Error looking up app calendar for {}: {}", session.email, e);
                response.error = Some(LOAD_CALENDARS_ERROR.to_string());
                return Json(response);
            }
        };
    response.share_path = Some(booking_path(&calendar.id));

    let now = Utc::now();
    match state
        .calendar
        .list_events(
            &auth,
            &calendar.id,
            now,
            now + Duration::days(booking.agenda_days),
        )
        .await
    {
        Ok(events) => {
            response.slots = generate_available_slots_at(
                &state.config.schedule,
                &events,
                booking.days_ahead,
                now,
                state.time_zone,
            );
            response.events = events;
        }
        Err(e) => {
            error!("Error fetching events of {}: {}", calendar.id, e);
            response.error = Some(e.api_message());
        }
    }

    match get_appointments(
        state.calendar.as_ref(),
        &auth,
        &calendar.id,
        &booking.appointment_prefix,
        now,
        booking.agenda_days,
    )
    .await
    {
        Ok(appointments) => response.appointments = appointments,
        Err(e) => error!("Error fetching appointments of {}: {}", calendar.id, e),
    }

    response.calendar = Some(calendar);
    Json(response)
}

/// Creates the public app calendar, or returns it if it already exists.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/agenda/calendar",
    responses(
        (status = 201, description = "Calendar created and shared", body = GoogleCalendar),
        (status = 200, description = "Calendar already existed", body = GoogleCalendar),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "Google Calendar error"),
    ),
    tag = "turnero"
))]
pub async fn create_calendar_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
) -> Result<(StatusCode, Json<GoogleCalendar>), TurneroError> {
    let auth = session.calendar_auth();
    let booking = &state.config.booking;

    if let Some(existing) =
        find_app_calendar(state.calendar.as_ref(), &auth, &booking.app_calendar_name).await?
    {
        info!("App calendar for {} already exists", session.email);
        return Ok((StatusCode::OK, Json(existing)));
    }

    let calendar = create_app_calendar(
        state.calendar.as_ref(),
        &auth,
        &booking.app_calendar_name,
        state.time_zone.name(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(calendar)))
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ScheduleQuery {
    pub calendar_id: Option<String>,
    pub slot_duration_minutes: Option<u32>,
    /// Comma separated weekdays, 0 = Sunday.
    #[cfg_attr(feature = "openapi", param(example = "1,2,3,4,5"))]
    pub available_days: Option<String>,
    pub start_hour: Option<u32>,
    pub end_hour: Option<u32>,
    pub break_start_hour: Option<u32>,
    pub break_end_hour: Option<u32>,
    /// `true` removes the configured break.
    #[serde(default)]
    pub no_break: bool,
}

impl ScheduleQuery {
    /// Overlays the query on `defaults`, field by field.
    pub fn apply(&self, defaults: &ScheduleConfig) -> Result<ScheduleConfig, TurneroError> {
        let available_days = match self.available_days.as_deref() {
            None => defaults.available_days.clone(),
            Some(days) => days
                .split(',')
                .map(str::trim)
                .filter(|day| !day.is_empty())
                .map(|day| {
                    day.parse::<u32>()
                        .map_err(|_| validation_error(format!("Día inválido: {}", day)))
                })
                .collect::<Result<Vec<u32>, _>>()?,
        };
        let (break_start_hour, break_end_hour) = if self.no_break {
            (None, None)
        } else {
            (
                self.break_start_hour.or(defaults.break_start_hour),
                self.break_end_hour.or(defaults.break_end_hour),
            )
        };
        let schedule = ScheduleConfig {
            slot_duration_minutes: self
                .slot_duration_minutes
                .unwrap_or(defaults.slot_duration_minutes),
            available_days,
            start_hour: self.start_hour.unwrap_or(defaults.start_hour),
            end_hour: self.end_hour.unwrap_or(defaults.end_hour),
            break_start_hour,
            break_end_hour,
        };
        validate_schedule(&schedule)?;
        Ok(schedule)
    }
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct SlotsPreviewResponse {
    pub schedule: ScheduleConfig,
    pub slots: Vec<AvailabilitySlot>,
    pub days: Vec<DaySlots>,
}

/// Slots the owner's calendar would offer under a different schedule.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/agenda/slots",
    params(ScheduleQuery),
    responses(
        (status = 200, description = "Slots for the schedule", body = SlotsPreviewResponse),
        (status = 400, description = "Invalid schedule"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No app calendar yet"),
    ),
    tag = "turnero"
))]
pub async fn slots_preview_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<SlotsPreviewResponse>, TurneroError> {
    let schedule = query.apply(&state.config.schedule)?;
    let auth = session.calendar_auth();
    let calendar_id = state.app_calendar_id(&auth, query.calendar_id.clone()).await?;

    let now = Utc::now();
    let days_ahead = state.config.booking.days_ahead;
    let events = state
        .calendar
        .list_events(&auth, &calendar_id, now, now + Duration::days(days_ahead))
        .await
        .map_err(GcalError::from)?;

    let slots = generate_available_slots_at(&schedule, &events, days_ahead, now, state.time_zone);
    Ok(Json(SlotsPreviewResponse {
        days: group_slots_by_day(&slots),
        schedule,
        slots,
    }))
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CalendarQuery {
    /// Defaults to the owner's app calendar.
    pub calendar_id: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AppointmentsResponse {
    pub calendar_id: String,
    pub appointments: Vec<CalendarEvent>,
}

/// Upcoming appointments of the owner's calendar.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/agenda/appointments",
    params(CalendarQuery),
    responses(
        (status = 200, description = "Appointments", body = AppointmentsResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No app calendar yet"),
    ),
    tag = "turnero"
))]
pub async fn list_appointments_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<AppointmentsResponse>, TurneroError> {
    let auth = session.calendar_auth();
    let calendar_id = state.app_calendar_id(&auth, query.calendar_id).await?;
    let appointments = get_appointments(
        state.calendar.as_ref(),
        &auth,
        &calendar_id,
        &state.config.booking.appointment_prefix,
        Utc::now(),
        state.config.booking.agenda_days,
    )
    .await?;
    Ok(Json(AppointmentsResponse {
        calendar_id,
        appointments,
    }))
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CancellationResponse {
    pub success: bool,
    pub message: String,
}

/// Cancels (deletes) an appointment; attendees are notified by Google.
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/agenda/appointments/{event_id}",
    params(
        ("event_id" = String, Path, description = "Event to cancel"),
        CalendarQuery
    ),
    responses(
        (status = 200, description = "Appointment cancelled", body = CancellationResponse),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "No such appointment"),
    ),
    tag = "turnero"
))]
pub async fn cancel_appointment_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
    Path(event_id): Path<String>,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<CancellationResponse>, TurneroError> {
    let auth = session.calendar_auth();
    let calendar_id = state.app_calendar_id(&auth, query.calendar_id).await?;
    cancel_appointment(state.calendar.as_ref(), &auth, &calendar_id, &event_id).await?;
    Ok(Json(CancellationResponse {
        success: true,
        message: "Turno cancelado".to_string(),
    }))
}

// --- Owner dashboard ---

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DashboardResponse {
    pub user: SessionUser,
    /// Busy events of the primary calendar for the coming month.
    pub events: Vec<CalendarEvent>,
    pub error: Option<String>,
}

/// The owner's primary calendar for the next month.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Upcoming events, or an error message", body = DashboardResponse),
        (status = 401, description = "Not signed in"),
    ),
    tag = "turnero"
))]
pub async fn dashboard_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
) -> Json<DashboardResponse> {
    let mut response = DashboardResponse {
        user: session.user(),
        events: Vec::new(),
        error: None,
    };
    match upcoming_primary_events(state.calendar.as_ref(), &session.calendar_auth(), Utc::now())
        .await
    {
        Ok(events) => response.events = events,
        Err(e) => {
            error!("Error loading primary events of {}: {}", session.email, e);
            response.error = Some(LOAD_CALENDARS_ERROR.to_string());
        }
    }
    Json(response)
}

/// Creates an appointment for a client directly in the owner's primary calendar.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/dashboard/turnos",
    request_body = DirectBookingRequest,
    responses(
        (status = 201, description = "Appointment created", body = BookingResponse),
        (status = 400, description = "Missing name, invalid email or times"),
        (status = 401, description = "Not signed in"),
        (status = 502, description = "Google Calendar error"),
    ),
    tag = "turnero"
))]
pub async fn create_direct_booking_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
    Json(payload): Json<DirectBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), TurneroError> {
    let event = create_direct_appointment(
        state.calendar.as_ref(),
        &session.calendar_auth(),
        &payload,
        state.time_zone,
    )
    .await
    .map_err(|e| match e {
        GcalError::ServiceError(_) => {
            external_service_error("Google Calendar", CREATE_BOOKING_ERROR)
        }
        other => other.into(),
    })?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            success: true,
            event_id: event.id,
            message: "Turno creado".to_string(),
        }),
    ))
}

// --- Public booking page ---

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingPageResponse {
    pub calendar_id: String,
    /// Available slots by day.
    pub days: Vec<DaySlots>,
    pub available_count: usize,
    pub user: Option<SessionUser>,
    pub error: Option<String>,
}

/// Bookable slots of a calendar. Readable anonymously when the calendar is public.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/reservar_turno/{calendar_id}",
    params(("calendar_id" = String, Path, description = "Owner calendar id or email")),
    responses(
        (status = 200, description = "Available slots, or an error message", body = BookingPageResponse),
    ),
    tag = "turnero"
))]
pub async fn booking_page_handler(
    State(state): State<GcalState>,
    MaybeSession(session): MaybeSession,
    Path(calendar_id): Path<String>,
) -> Json<BookingPageResponse> {
    let mut response = BookingPageResponse {
        calendar_id: calendar_id.clone(),
        days: Vec::new(),
        available_count: 0,
        user: session.as_ref().map(Session::user),
        error: None,
    };

    let Some(auth) = state.read_auth(session.as_ref()) else {
        error!("No credentials to read {}: not signed in and no API key", calendar_id);
        response.error = Some(LOAD_SLOTS_ERROR.to_string());
        return Json(response);
    };

    let now = Utc::now();
    let days_ahead = state.config.booking.days_ahead;
    match state
        .calendar
        .list_events(&auth, &calendar_id, now, now + Duration::days(days_ahead))
        .await
    {
        Ok(events) => {
            let slots = generate_available_slots_at(
                &state.config.schedule,
                &events,
                days_ahead,
                now,
                state.time_zone,
            );
            response.days = group_slots_by_day(&slots);
            response.available_count = response.days.iter().map(|day| day.slots.len()).sum();
        }
        Err(e) => {
            error!("Error loading slots of {}: {}", calendar_id, e);
            response.error = Some(LOAD_SLOTS_ERROR.to_string());
        }
    }
    Json(response)
}

/// Books a slot for the signed-in client.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/reservar_turno/{calendar_id}",
    params(("calendar_id" = String, Path, description = "Owner calendar id or email")),
    request_body = BookSlotRequest,
    responses(
        (status = 201, description = "Appointment booked", body = BookingResponse),
        (status = 400, description = "Slot not offered or malformed"),
        (status = 401, description = "Not signed in"),
        (status = 409, description = "Slot already taken"),
        (status = 502, description = "Google Calendar error"),
    ),
    tag = "turnero"
))]
pub async fn book_handler(
    State(state): State<GcalState>,
    CurrentSession(session): CurrentSession,
    Path(calendar_id): Path<String>,
    Json(payload): Json<BookSlotRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), TurneroError> {
    let name = [session.name.as_deref(), Some(session.email.as_str())]
        .into_iter()
        .flatten()
        .find(|name| !name.trim().is_empty())
        .unwrap_or("Cliente");
    let client = Client {
        name,
        email: &session.email,
    };

    let event = book_appointment(
        state.calendar.as_ref(),
        &session.calendar_auth(),
        &calendar_id,
        &client,
        &payload,
        &state.policy(&state.config.schedule),
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse {
            success: true,
            event_id: event.id,
            message: BOOKED_MESSAGE.to_string(),
        }),
    ))
}

// --- Static pages ---

/// Serves the privacy policy linked from the Google consent screen.
pub async fn privacy_policy_handler() -> Html<&'static str> {
    Html(PRIVACY_POLICY)
}
