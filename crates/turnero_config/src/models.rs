// --- File: crates/turnero_config/src/models.rs ---

use serde::{Deserialize, Serialize};

pub const DEFAULT_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

// --- General Server Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Externally visible origin, used for the OAuth redirect and share links.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl ServerConfig {
    /// Origin without a trailing slash, falling back to `http://host:port`.
    pub fn origin(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}:{}", self.host, self.port),
        }
    }
}

// --- Google Config ---
// client_id / client_secret / api_key are usually "secret_from_env" in the file and
// resolved from GOOGLE_CLIENT_ID, GOOGLE_CLIENT_SECRET and GOOGLE_API_KEY.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Public API key for unauthenticated reads of public calendars.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_calendar_api_url")]
    pub calendar_api_url: String,
    #[serde(default = "default_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_userinfo_url")]
    pub userinfo_url: String,
}

fn default_calendar_api_url() -> String {
    DEFAULT_CALENDAR_API_URL.to_string()
}
fn default_auth_url() -> String {
    DEFAULT_AUTH_URL.to_string()
}
fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}
fn default_userinfo_url() -> String {
    DEFAULT_USERINFO_URL.to_string()
}

// --- Session / Auth Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// Session signing secret, loaded from AUTH_SECRET.
    pub secret: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Upper bound for a session, in minutes. Google's token expiry wins if shorter.
    #[serde(default = "default_session_ttl_minutes")]
    pub session_ttl_minutes: i64,
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_cookie_name() -> String {
    "turnero_session".to_string()
}
fn default_session_ttl_minutes() -> i64 {
    8 * 60
}

// --- Booking Config ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BookingConfig {
    /// IANA zone the schedule hours are expressed in.
    #[serde(default)]
    pub time_zone: Option<String>,
    /// Summary of the public calendar created for the owner.
    #[serde(default = "default_app_calendar_name")]
    pub app_calendar_name: String,
    /// Summary prefix that marks an event as a booked appointment.
    #[serde(default = "default_appointment_prefix")]
    pub appointment_prefix: String,
    /// Look-ahead window for generated slots, in days.
    #[serde(default = "default_days_ahead")]
    pub days_ahead: i64,
    /// Window of events shown on the owner's agenda, in days.
    #[serde(default = "default_agenda_days")]
    pub agenda_days: i64,
}

pub const DEFAULT_TIME_ZONE: &str = "America/Argentina/Buenos_Aires";

fn default_app_calendar_name() -> String {
    "Turnero - Agenda de Turnos".to_string()
}
fn default_appointment_prefix() -> String {
    "[Turno]".to_string()
}
fn default_days_ahead() -> i64 {
    14
}
fn default_agenda_days() -> i64 {
    30
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            time_zone: None,
            app_calendar_name: default_app_calendar_name(),
            appointment_prefix: default_appointment_prefix(),
            days_ahead: default_days_ahead(),
            agenda_days: default_agenda_days(),
        }
    }
}

impl BookingConfig {
    pub fn time_zone_name(&self) -> &str {
        self.time_zone.as_deref().unwrap_or(DEFAULT_TIME_ZONE)
    }
}

// --- Schedule Config ---
/// Weekly availability pattern the slot generator works from.
///
/// `available_days` uses 0 = Sunday through 6 = Saturday.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub slot_duration_minutes: u32,
    pub available_days: Vec<u32>,
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default)]
    pub break_start_hour: Option<u32>,
    #[serde(default)]
    pub break_end_hour: Option<u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            slot_duration_minutes: 30,
            available_days: vec![1, 2, 3, 4, 5],
            start_hour: 9,
            end_hour: 18,
            break_start_hour: Some(13),
            break_end_hour: Some(14),
        }
    }
}

// --- Unified App Configuration ---
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub google: GoogleConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}
