// --- File: crates/turnero_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! Implements [`CalendarService`] against the Calendar REST API v3 with plain
//! `reqwest` calls. Credentials are supplied per call, so one instance serves
//! every signed-in user as well as anonymous API-key reads.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, error, info};
use turnero_common::{
    BoxFuture, CalendarAuth, CalendarEvent, CalendarService, GoogleCalendar, NewCalendar,
    NewEvent, HTTP_CLIENT,
};
use turnero_config::GoogleConfig;

/// Errors that can occur when interacting with Google Calendar.
#[derive(Error, Debug)]
pub enum GcalServiceError {
    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GcalServiceError {
    /// The API's own message when it sent one, otherwise a generic description.
    pub fn api_message(&self) -> String {
        match self {
            GcalServiceError::Api { message, .. } | GcalServiceError::NotFound(message) => {
                message.clone()
            }
            GcalServiceError::Http(e) => e.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    #[serde(default)]
    next_page_token: Option<String>,
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    base_url: String,
    http: Client,
}

impl GoogleCalendarService {
    pub fn new(base_url: impl Into<String>, http: Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    /// Uses the configured API base URL and the shared HTTP client.
    pub fn from_config(google: &GoogleConfig) -> Self {
        Self::new(google.calendar_api_url.as_str(), HTTP_CLIENT.clone())
    }

    fn calendar_url(&self, calendar_id: &str, rest: &str) -> String {
        format!(
            "{}/calendars/{}{}",
            self.base_url,
            urlencoding::encode(calendar_id),
            rest
        )
    }

    fn request(&self, method: Method, url: &str, auth: &CalendarAuth) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match auth {
            CalendarAuth::Bearer(token) => builder.bearer_auth(token),
            CalendarAuth::ApiKey(key) => builder.query(&[("key", key.as_str())]),
        }
    }

    /// Follows `nextPageToken` until the listing is exhausted.
    async fn fetch_all<T: DeserializeOwned>(
        &self,
        url: &str,
        auth: &CalendarAuth,
        query: &[(&str, String)],
        operation: &'static str,
    ) -> Result<Vec<T>, GcalServiceError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut builder = self.request(Method::GET, url, auth).query(query);
            if let Some(token) = &page_token {
                builder = builder.query(&[("pageToken", token.as_str())]);
            }
            let page: Page<T> = check(builder.send().await?, operation).await?.json().await?;
            items.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(items)
    }
}

/// Maps a non-success response to [`GcalServiceError`], keeping Google's message.
async fn check(response: Response, operation: &'static str) -> Result<Response, GcalServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiErrorBody>()
        .await
        .ok()
        .and_then(|body| body.error.message)
        .unwrap_or_else(|| format!("Failed to {}", operation));
    error!("Google Calendar {} failed ({}): {}", operation, status, message);

    if status == reqwest::StatusCode::NOT_FOUND {
        Err(GcalServiceError::NotFound(message))
    } else {
        Err(GcalServiceError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

fn rfc3339(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl CalendarService for GoogleCalendarService {
    type Error = GcalServiceError;

    fn list_calendars(
        &self,
        auth: &CalendarAuth,
    ) -> BoxFuture<'_, Vec<GoogleCalendar>, Self::Error> {
        let auth = auth.clone();
        Box::pin(async move {
            let url = format!("{}/users/me/calendarList", self.base_url);
            let calendars: Vec<GoogleCalendar> = self
                .fetch_all(&url, &auth, &[], "fetch calendars")
                .await?;
            info!("Fetched {} calendars", calendars.len());
            Ok(calendars)
        })
    }

    fn get_calendar(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
    ) -> BoxFuture<'_, GoogleCalendar, Self::Error> {
        let auth = auth.clone();
        let url = self.calendar_url(calendar_id, "");
        Box::pin(async move {
            let response = self.request(Method::GET, &url, &auth).send().await?;
            Ok(check(response, "fetch calendar").await?.json().await?)
        })
    }

    fn create_calendar(
        &self,
        auth: &CalendarAuth,
        calendar: NewCalendar,
    ) -> BoxFuture<'_, GoogleCalendar, Self::Error> {
        let auth = auth.clone();
        Box::pin(async move {
            let url = format!("{}/calendars", self.base_url);
            let response = self
                .request(Method::POST, &url, &auth)
                .json(&calendar)
                .send()
                .await?;
            let created: GoogleCalendar = check(response, "create calendar").await?.json().await?;
            info!("Created calendar {} ({})", created.summary, created.id);
            Ok(created)
        })
    }

    fn make_calendar_public(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let auth = auth.clone();
        let url = self.calendar_url(calendar_id, "/acl");
        Box::pin(async move {
            let rule = json!({
                "role": "reader",
                "scope": { "type": "default" }
            });
            let response = self
                .request(Method::POST, &url, &auth)
                .json(&rule)
                .send()
                .await?;
            check(response, "share calendar").await?;
            info!("Granted public read access on {}", url);
            Ok(())
        })
    }

    fn list_events(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> BoxFuture<'_, Vec<CalendarEvent>, Self::Error> {
        let auth = auth.clone();
        let url = self.calendar_url(calendar_id, "/events");
        Box::pin(async move {
            let query = [
                ("timeMin", rfc3339(time_min)),
                ("timeMax", rfc3339(time_max)),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", "250".to_string()),
            ];
            let events: Vec<CalendarEvent> = self
                .fetch_all(&url, &auth, &query, "fetch events")
                .await?;
            debug!(
                "Fetched {} events between {} and {}",
                events.len(),
                time_min,
                time_max
            );
            Ok(events)
        })
    }

    fn create_event(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
        event: NewEvent,
    ) -> BoxFuture<'_, CalendarEvent, Self::Error> {
        let auth = auth.clone();
        let url = self.calendar_url(calendar_id, "/events");
        Box::pin(async move {
            let response = self
                .request(Method::POST, &url, &auth)
                .query(&[("sendUpdates", "all")])
                .json(&event)
                .send()
                .await?;
            let created: CalendarEvent = check(response, "create event").await?.json().await?;
            info!("Created event {:?}: {}", created.id, created.title());
            Ok(created)
        })
    }

    fn delete_event(
        &self,
        auth: &CalendarAuth,
        calendar_id: &str,
        event_id: &str,
    ) -> BoxFuture<'_, (), Self::Error> {
        let auth = auth.clone();
        let url = self.calendar_url(
            calendar_id,
            &format!("/events/{}", urlencoding::encode(event_id)),
        );
        let event_id = event_id.to_string();
        Box::pin(async move {
            let response = self
                .request(Method::DELETE, &url, &auth)
                .query(&[("sendUpdates", "all")])
                .send()
                .await?;
            check(response, "delete event").await?;
            info!("Deleted event {}", event_id);
            Ok(())
        })
    }
}
