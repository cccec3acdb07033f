// --- File: crates/turnero_gcal/src/logic.rs ---
use crate::service::GcalServiceError;
use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Months, NaiveDate, NaiveDateTime, NaiveTime,
    TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use turnero_common::{
    conflict, external_service_error, log_result, not_found, validation_error, Attendee,
    CalendarAuth, CalendarEvent, CalendarService, EventDateTime, GoogleCalendar, NewCalendar,
    NewEvent, TurneroError,
};
use turnero_config::{BookingConfig, ScheduleConfig};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// The calendar backend as stored in handler state.
pub type CalendarBackend = dyn CalendarService<Error = GcalServiceError>;

// --- Error Handling ---
use thiserror::Error;
#[derive(Error, Debug)]
pub enum GcalError {
    #[error("Calendar service error: {0}")]
    ServiceError(#[from] GcalServiceError),
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("Invalid slot: {0}")]
    InvalidSlot(String),
    #[error("Invalid client: {0}")]
    InvalidClient(String),
    #[error("Failed to parse time: {0}")]
    TimeParseError(String),
    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),
    #[error("Invalid booking settings: {0}")]
    InvalidSettings(String),
    #[error("Booking conflict")]
    Conflict,
}

impl From<GcalError> for TurneroError {
    fn from(err: GcalError) -> Self {
        match err {
            GcalError::ServiceError(GcalServiceError::NotFound(message)) => not_found(message),
            GcalError::ServiceError(e) => external_service_error("Google Calendar", e.api_message()),
            GcalError::InvalidSchedule(message)
            | GcalError::InvalidSlot(message)
            | GcalError::InvalidClient(message)
            | GcalError::TimeParseError(message) => validation_error(message),
            GcalError::InvalidTimeZone(zone) => {
                TurneroError::ConfigError(format!("Unknown time zone: {}", zone))
            }
            GcalError::InvalidSettings(message) => TurneroError::ConfigError(message),
            GcalError::Conflict => {
                conflict("El horario seleccionado ya no está disponible, elegí otro")
            }
        }
    }
}

// --- Data Structures ---

/// A bookable interval and whether it is still free.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AvailabilitySlot {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-05-05T09:00:00-03:00"))]
    pub start: DateTime<FixedOffset>,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2025-05-05T09:30:00-03:00"))]
    pub end: DateTime<FixedOffset>,
    pub available: bool,
}

/// Available slots of one local calendar day.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DaySlots {
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date", example = "2025-05-05"))]
    pub date: NaiveDate,
    pub slots: Vec<AvailabilitySlot>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookSlotRequest {
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:00:00-03:00"))]
    pub start_time: String, // RFC 3339
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:30:00-03:00"))]
    pub end_time: String, // RFC 3339
    /// Optional note from the client, copied into the event.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct BookingResponse {
    pub success: bool,
    pub event_id: Option<String>,
    pub message: String,
}

/// An appointment the owner enters by hand from the dashboard.
///
/// Times are RFC 3339, or local wall-clock times (`2025-05-05T09:00`) in the
/// booking time zone as sent by a `datetime-local` input.
#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DirectBookingRequest {
    #[cfg_attr(feature = "openapi", schema(example = "Ana Pérez"))]
    pub client_name: String,
    #[cfg_attr(feature = "openapi", schema(example = "ana@example.com"))]
    pub client_email: String,
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T09:00"))]
    pub start_time: String,
    #[cfg_attr(feature = "openapi", schema(example = "2025-05-05T10:00"))]
    pub end_time: String,
}

/// The person booking, taken from their session.
#[derive(Debug, Clone)]
pub struct Client<'a> {
    pub name: &'a str,
    pub email: &'a str,
}

/// Everything that decides whether and how a slot may be booked.
pub struct BookingPolicy<'a> {
    pub schedule: &'a ScheduleConfig,
    pub time_zone: Tz,
    /// Look-ahead window for bookable slots, in days.
    pub days_ahead: i64,
    /// Title prefix that marks an event as an appointment.
    pub appointment_prefix: &'a str,
}

// --- Schedule validation ---

pub fn parse_time_zone(name: &str) -> Result<Tz, GcalError> {
    name.parse::<Tz>()
        .map_err(|_| GcalError::InvalidTimeZone(name.to_string()))
}

/// Rejects schedules the slot generator cannot produce sensible output for.
pub fn validate_schedule(config: &ScheduleConfig) -> Result<(), GcalError> {
    let invalid = |msg: &str| Err(GcalError::InvalidSchedule(msg.to_string()));

    if !(1..=60).contains(&config.slot_duration_minutes) {
        return invalid("La duración del turno debe estar entre 1 y 60 minutos");
    }
    if config.start_hour > 24 || config.end_hour > 24 {
        return invalid("Las horas deben estar entre 0 y 24");
    }
    if config.start_hour >= config.end_hour {
        return invalid("La hora de inicio debe ser anterior a la hora de fin");
    }
    if config.available_days.iter().any(|day| *day > 6) {
        return invalid("Los días deben estar entre 0 (domingo) y 6 (sábado)");
    }
    match (config.break_start_hour, config.break_end_hour) {
        (Some(start), Some(end)) if start >= end || end > 24 => {
            invalid("El descanso debe comenzar antes de terminar")
        }
        (Some(_), None) | (None, Some(_)) => {
            invalid("El descanso necesita hora de inicio y de fin")
        }
        _ => Ok(()),
    }
}

/// Longest look-ahead accepted for `booking.days_ahead` and `booking.agenda_days`.
pub const MAX_LOOKAHEAD_DAYS: i64 = 366;

/// Rejects look-ahead windows outside `1..=MAX_LOOKAHEAD_DAYS`.
pub fn validate_booking(config: &BookingConfig) -> Result<(), GcalError> {
    for (name, days) in [
        ("booking.days_ahead", config.days_ahead),
        ("booking.agenda_days", config.agenda_days),
    ] {
        if !(1..=MAX_LOOKAHEAD_DAYS).contains(&days) {
            return Err(GcalError::InvalidSettings(format!(
                "{} must be between 1 and {}, got {}",
                name, MAX_LOOKAHEAD_DAYS, days
            )));
        }
    }
    Ok(())
}

// --- Availability Logic ---

/// Earliest instant of a local wall-clock time; `None` inside a DST gap.
fn local_instant(tz: Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Start of a local day. Zones that skip midnight start the day at the first valid hour.
fn local_midnight(tz: Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    (0..3).find_map(|hour| local_instant(tz, date.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?)))
}

fn bound(time: Option<&EventDateTime>, tz: Tz) -> Option<DateTime<Utc>> {
    let time = time?;
    match (time.date_time, time.date) {
        (Some(dt), _) => Some(dt.with_timezone(&Utc)),
        (None, Some(date)) => local_midnight(tz, date),
        (None, None) => None,
    }
}

/// The interval an event blocks, or `None` if it blocks nothing.
///
/// All-day events cover local midnight of the start date up to local midnight
/// of the (exclusive) end date.
pub fn event_interval(event: &CalendarEvent, tz: Tz) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    if event.is_cancelled() {
        return None;
    }
    let start = bound(event.start.as_ref(), tz)?;
    let end = match bound(event.end.as_ref(), tz) {
        Some(end) => end,
        // An all-day event without an end lasts one day.
        None => {
            let date = event.start.as_ref().and_then(|s| s.date)?;
            local_midnight(tz, date.succ_opt()?)?
        }
    };
    if end < start {
        debug!("Ignoring event {:?} ending before it starts", event.id);
        return None;
    }
    Some((start, end))
}

fn overlaps(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    busy: &[(DateTime<Utc>, DateTime<Utc>)],
) -> bool {
    busy.iter()
        .any(|(busy_start, busy_end)| start < *busy_end && end > *busy_start)
}

/// True when `[start, end)` overlaps any blocking event.
pub fn has_conflict(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    events: &[CalendarEvent],
    tz: Tz,
) -> bool {
    let busy: Vec<_> = events
        .iter()
        .filter_map(|event| event_interval(event, tz))
        .collect();
    overlaps(start, end, &busy)
}

fn in_break(config: &ScheduleConfig, hour: u32) -> bool {
    match (config.break_start_hour, config.break_end_hour) {
        (Some(start), Some(end)) => hour >= start && hour < end,
        _ => false,
    }
}

/// Generates the slots of the next `days_ahead` days (today included) as seen from `now`.
///
/// Days are calendar days in `tz`; `available_days` uses 0 = Sunday. Each
/// working hour outside the break is split into `60 / slot_duration_minutes`
/// slots. Slots starting at or before `now` are dropped, slots overlapping an
/// event are returned with `available = false`. Output is chronological.
pub fn generate_available_slots_at(
    config: &ScheduleConfig,
    events: &[CalendarEvent],
    days_ahead: i64,
    now: DateTime<Utc>,
    tz: Tz,
) -> Vec<AvailabilitySlot> {
    let duration = config.slot_duration_minutes;
    if duration == 0 || duration > 60 || days_ahead <= 0 {
        return Vec::new();
    }
    let slots_per_hour = 60 / duration;
    let slot_length = Duration::minutes(i64::from(duration));

    let busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = events
        .iter()
        .filter_map(|event| event_interval(event, tz))
        .collect();

    let today = now.with_timezone(&tz).date_naive();
    let mut slots = Vec::new();

    for offset in 0..days_ahead {
        let Some(day) = today.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        if !config
            .available_days
            .contains(&day.weekday().num_days_from_sunday())
        {
            continue;
        }

        for hour in config.start_hour..config.end_hour.min(24) {
            if in_break(config, hour) {
                continue;
            }
            for index in 0..slots_per_hour {
                let Some(time) = NaiveTime::from_hms_opt(hour, index * duration, 0) else {
                    continue;
                };
                let Some(start) = local_instant(tz, day.and_time(time)) else {
                    debug!("Skipping {} {}: not a valid local time", day, time);
                    continue;
                };
                if start <= now {
                    continue;
                }
                let end = start + slot_length;

                slots.push(AvailabilitySlot {
                    start: start.with_timezone(&tz).fixed_offset(),
                    end: end.with_timezone(&tz).fixed_offset(),
                    available: !overlaps(start, end, &busy),
                });
            }
        }
    }

    debug!(
        "Generated {} slots over {} days from {} events",
        slots.len(),
        days_ahead,
        events.len()
    );
    slots
}

/// [`generate_available_slots_at`] against the wall clock.
pub fn generate_available_slots(
    config: &ScheduleConfig,
    events: &[CalendarEvent],
    days_ahead: i64,
    tz: Tz,
) -> Vec<AvailabilitySlot> {
    generate_available_slots_at(config, events, days_ahead, Utc::now(), tz)
}

/// Available slots grouped by local date, in chronological order.
pub fn group_slots_by_day(slots: &[AvailabilitySlot]) -> Vec<DaySlots> {
    let mut days: Vec<DaySlots> = Vec::new();
    for slot in slots.iter().filter(|slot| slot.available) {
        let date = slot.start.date_naive();
        match days.last_mut() {
            Some(day) if day.date == date => day.slots.push(slot.clone()),
            _ => days.push(DaySlots {
                date,
                slots: vec![slot.clone()],
            }),
        }
    }
    days
}

// --- Booking flows ---

/// The owner's app calendar, matched by summary.
pub async fn find_app_calendar(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    calendar_name: &str,
) -> Result<Option<GoogleCalendar>, GcalError> {
    let calendars = service.list_calendars(auth).await?;
    Ok(calendars
        .into_iter()
        .find(|calendar| calendar.summary == calendar_name))
}

/// Creates the app calendar and opens it for public reading, so clients can see
/// availability with just an API key.
///
/// Returns the calendar as Google reports it after the ACL change.
pub async fn create_app_calendar(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    calendar_name: &str,
    time_zone: &str,
) -> Result<GoogleCalendar, GcalError> {
    let calendar = service
        .create_calendar(
            auth,
            NewCalendar {
                summary: calendar_name.to_string(),
                description: Some("Calendario de turnos gestionado por Turnero".to_string()),
                time_zone: time_zone.to_string(),
            },
        )
        .await?;
    service.make_calendar_public(auth, &calendar.id).await?;
    let calendar = service.get_calendar(auth, &calendar.id).await?;
    info!("App calendar {} ready and public", calendar.id);
    Ok(calendar)
}

/// Appointments (events whose title carries the prefix) from `now` to `now + days`.
pub async fn get_appointments(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    calendar_id: &str,
    appointment_prefix: &str,
    now: DateTime<Utc>,
    days: i64,
) -> Result<Vec<CalendarEvent>, GcalError> {
    let events = service
        .list_events(auth, calendar_id, now, now + Duration::days(days))
        .await?;
    Ok(events
        .into_iter()
        .filter(|event| event.title().starts_with(appointment_prefix))
        .collect())
}

pub async fn cancel_appointment(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    calendar_id: &str,
    event_id: &str,
) -> Result<(), GcalError> {
    service.delete_event(auth, calendar_id, event_id).await?;
    info!("Cancelled appointment {} on {}", event_id, calendar_id);
    Ok(())
}

/// Loose email check: one `@`, a dotted domain, no whitespace.
pub fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn parse_slot_time(value: &str, field: &str) -> Result<DateTime<FixedOffset>, GcalError> {
    DateTime::parse_from_rfc3339(value)
        .map_err(|e| GcalError::TimeParseError(format!("{} inválido ({}): {}", field, value, e)))
}

/// Books `request` on the owner's calendar `calendar_id`.
///
/// The slot must be one the owner's schedule offers and must not overlap any
/// event on the owner's calendar. The event is created in the client's own
/// primary calendar with the owner calendar as attendee, so Google sends both
/// parties an invitation and the booking shows up on the owner's calendar.
pub async fn book_appointment(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    calendar_id: &str,
    client: &Client<'_>,
    request: &BookSlotRequest,
    policy: &BookingPolicy<'_>,
    now: DateTime<Utc>,
) -> Result<CalendarEvent, GcalError> {
    let start = parse_slot_time(&request.start_time, "start_time")?;
    let end = parse_slot_time(&request.end_time, "end_time")?;
    let (start_utc, end_utc) = (start.with_timezone(&Utc), end.with_timezone(&Utc));

    if end_utc <= start_utc {
        return Err(GcalError::InvalidSlot(
            "El turno debe terminar después de empezar".to_string(),
        ));
    }
    if start_utc <= now {
        return Err(GcalError::InvalidSlot(
            "No se pueden reservar turnos en el pasado".to_string(),
        ));
    }

    let offered = generate_available_slots_at(
        policy.schedule,
        &[],
        policy.days_ahead,
        now,
        policy.time_zone,
    )
    .into_iter()
    .any(|slot| slot.start == start_utc && slot.end == end_utc);
    if !offered {
        return Err(GcalError::InvalidSlot(
            "El horario elegido no corresponde a un turno disponible".to_string(),
        ));
    }

    let existing = service
        .list_events(auth, calendar_id, start_utc, end_utc)
        .await?;
    if has_conflict(start_utc, end_utc, &existing, policy.time_zone) {
        warn!(
            "Rejected booking {} - {} on {}: slot taken",
            start, end, calendar_id
        );
        return Err(GcalError::Conflict);
    }

    let zone_name = policy.time_zone.name();
    let event = NewEvent {
        summary: format!("{} {}", policy.appointment_prefix, client.name),
        description: request
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
        start: EventDateTime::at(start, Some(zone_name)),
        end: EventDateTime::at(end, Some(zone_name)),
        attendees: vec![Attendee::new(calendar_id), Attendee::new(client.email)],
    };

    let created = service.create_event(auth, "primary", event).await?;
    info!(
        "Booked {} - {} for {} on {}",
        start, end, client.email, calendar_id
    );
    Ok(created)
}

/// RFC 3339, or a naive local time in `tz`.
fn parse_form_time(value: &str, field: &str, tz: Tz) -> Result<DateTime<FixedOffset>, GcalError> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Ok(time);
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|e| GcalError::TimeParseError(format!("{} inválido ({}): {}", field, value, e)))?;
    local_instant(tz, naive)
        .map(|instant| instant.with_timezone(&tz).fixed_offset())
        .ok_or_else(|| {
            GcalError::TimeParseError(format!("{} inválido ({}): hora inexistente", field, value))
        })
}

/// Events of the owner's primary calendar from `now` to one month later.
pub async fn upcoming_primary_events(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    now: DateTime<Utc>,
) -> Result<Vec<CalendarEvent>, GcalError> {
    let until = now
        .checked_add_months(Months::new(1))
        .unwrap_or(now + Duration::days(31));
    Ok(service.list_events(auth, "primary", now, until).await?)
}

/// Creates an appointment straight in the owner's primary calendar.
///
/// Unlike [`book_appointment`] this is the owner's own entry: no slot grid and
/// no conflict check, only a well-formed client and interval.
pub async fn create_direct_appointment(
    service: &CalendarBackend,
    auth: &CalendarAuth,
    request: &DirectBookingRequest,
    tz: Tz,
) -> Result<CalendarEvent, GcalError> {
    let client_name = request.client_name.trim();
    let client_email = request.client_email.trim();
    if client_name.is_empty() {
        return Err(GcalError::InvalidClient(
            "Ingresá el nombre del cliente".to_string(),
        ));
    }
    if !looks_like_email(client_email) {
        return Err(GcalError::InvalidClient(
            "Ingresá un email válido para el cliente".to_string(),
        ));
    }

    let start = parse_form_time(request.start_time.trim(), "start_time", tz)?;
    let end = parse_form_time(request.end_time.trim(), "end_time", tz)?;
    if end <= start {
        return Err(GcalError::InvalidSlot(
            "El turno debe terminar después de empezar".to_string(),
        ));
    }

    let zone_name = tz.name();
    let event = NewEvent {
        summary: format!("Turno: {}", client_name),
        description: Some(format!("Servicio para {}", client_email)),
        start: EventDateTime::at(start, Some(zone_name)),
        end: EventDateTime::at(end, Some(zone_name)),
        attendees: Vec::new(),
    };

    let created = log_result(
        service.create_event(auth, "primary", event).await,
        "Dashboard appointment created",
        "Error creating dashboard appointment",
    )?;
    Ok(created)
}
