use chrono::{TimeZone, Utc};
use serde_json::json;
use turnero_common::{
    Attendee, CalendarAuth, CalendarService, EventDateTime, NewCalendar, NewEvent,
};
use turnero_gcal::{GcalServiceError, GoogleCalendarService};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service(server: &MockServer) -> GoogleCalendarService {
    GoogleCalendarService::new(format!("{}/calendar/v3/", server.uri()), reqwest::Client::new())
}

fn bearer() -> CalendarAuth {
    CalendarAuth::Bearer("ya29.token".to_string())
}

#[tokio::test]
async fn test_list_calendars_follows_pages() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/users/me/calendarList"))
        .and(query_param("pageToken", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "agenda@group.calendar.google.com", "summary": "Agenda" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/users/me/calendarList"))
        .and(header("authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{ "id": "owner@example.com", "summary": "owner@example.com", "primary": true }],
            "nextPageToken": "p2"
        })))
        .mount(&server)
        .await;

    let calendars = service(&server).list_calendars(&bearer()).await.unwrap();

    let ids: Vec<&str> = calendars.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["owner@example.com", "agenda@group.calendar.google.com"]);
    assert_eq!(calendars[0].primary, Some(true));
}

#[tokio::test]
async fn test_list_events_with_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/owner%40example.com/events"))
        .and(query_param("key", "public-key"))
        .and(query_param("timeMin", "2025-05-05T00:00:00Z"))
        .and(query_param("timeMax", "2025-05-19T00:00:00Z"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                {
                    "id": "e1",
                    "summary": "Reunión",
                    "status": "confirmed",
                    "start": { "dateTime": "2025-05-05T09:30:00-03:00" },
                    "end": { "dateTime": "2025-05-05T10:15:00-03:00" }
                },
                {
                    "id": "e2",
                    "start": { "date": "2025-05-06" },
                    "end": { "date": "2025-05-07" }
                }
            ]
        })))
        .mount(&server)
        .await;

    let events = service(&server)
        .list_events(
            &CalendarAuth::ApiKey("public-key".to_string()),
            "owner@example.com",
            Utc.with_ymd_and_hms(2025, 5, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 5, 19, 0, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(events.len(), 2);
    assert_eq!(events[0].title(), "Reunión");
    assert_eq!(
        events[1].start.as_ref().and_then(|s| s.date).map(|d| d.to_string()),
        Some("2025-05-06".to_string())
    );
}

#[tokio::test]
async fn test_create_calendar_and_share_publicly() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars"))
        .and(body_json(json!({
            "summary": "Agenda",
            "timeZone": "America/Argentina/Buenos_Aires"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "agenda@group.calendar.google.com",
            "summary": "Agenda",
            "timeZone": "America/Argentina/Buenos_Aires"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/agenda%40group.calendar.google.com/acl"))
        .and(body_json(json!({ "role": "reader", "scope": { "type": "default" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "default" })))
        .expect(1)
        .mount(&server)
        .await;

    let service = service(&server);
    let calendar = service
        .create_calendar(
            &bearer(),
            NewCalendar {
                summary: "Agenda".to_string(),
                description: None,
                time_zone: "America/Argentina/Buenos_Aires".to_string(),
            },
        )
        .await
        .unwrap();
    service
        .make_calendar_public(&bearer(), &calendar.id)
        .await
        .unwrap();

    assert_eq!(calendar.id, "agenda@group.calendar.google.com");
}

#[tokio::test]
async fn test_create_event_notifies_attendees() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(query_param("sendUpdates", "all"))
        .and(body_json(json!({
            "summary": "[Turno] Ana",
            "start": {
                "dateTime": "2025-05-05T09:00:00-03:00",
                "timeZone": "America/Argentina/Buenos_Aires"
            },
            "end": {
                "dateTime": "2025-05-05T10:00:00-03:00",
                "timeZone": "America/Argentina/Buenos_Aires"
            },
            "attendees": [{ "email": "owner@example.com" }, { "email": "ana@example.com" }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "evt123",
            "summary": "[Turno] Ana",
            "htmlLink": "https://calendar.google.com/event?eid=evt123"
        })))
        .mount(&server)
        .await;

    let zone = Some("America/Argentina/Buenos_Aires");
    let event = NewEvent {
        summary: "[Turno] Ana".to_string(),
        description: None,
        start: EventDateTime::at(
            chrono::DateTime::parse_from_rfc3339("2025-05-05T09:00:00-03:00").unwrap(),
            zone,
        ),
        end: EventDateTime::at(
            chrono::DateTime::parse_from_rfc3339("2025-05-05T10:00:00-03:00").unwrap(),
            zone,
        ),
        attendees: vec![
            Attendee::new("owner@example.com"),
            Attendee::new("ana@example.com"),
        ],
    };

    let created = service(&server)
        .create_event(&bearer(), "primary", event)
        .await
        .unwrap();

    assert_eq!(created.id.as_deref(), Some("evt123"));
    assert!(created.html_link.is_some());
}

#[tokio::test]
async fn test_api_error_message_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/users/me/calendarList"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": { "code": 401, "message": "Invalid Credentials" }
        })))
        .mount(&server)
        .await;

    let err = service(&server).list_calendars(&bearer()).await.unwrap_err();

    match err {
        GcalServiceError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid Credentials");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_without_body_uses_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let event = NewEvent {
        summary: "x".to_string(),
        description: None,
        start: EventDateTime::default(),
        end: EventDateTime::default(),
        attendees: Vec::new(),
    };
    let err = service(&server)
        .create_event(&bearer(), "primary", event)
        .await
        .unwrap_err();

    assert_eq!(err.api_message(), "Failed to create event");
}

#[tokio::test]
async fn test_delete_missing_event_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/calendar/v3/calendars/agenda%40group.calendar.google.com/events/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not Found" }
        })))
        .mount(&server)
        .await;

    let err = service(&server)
        .delete_event(&bearer(), "agenda@group.calendar.google.com", "gone")
        .await
        .unwrap_err();

    assert!(matches!(err, GcalServiceError::NotFound(ref m) if m == "Not Found"));
}

#[tokio::test]
async fn test_get_calendar_reads_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/agenda%40group.calendar.google.com"))
        .and(header("authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "agenda@group.calendar.google.com",
            "summary": "Turnero - Agenda de Turnos",
            "timeZone": "America/Argentina/Buenos_Aires"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = service(&server)
        .get_calendar(&bearer(), "agenda@group.calendar.google.com")
        .await
        .unwrap();

    assert_eq!(calendar.summary, "Turnero - Agenda de Turnos");
    assert_eq!(
        calendar.time_zone.as_deref(),
        Some("America/Argentina/Buenos_Aires")
    );
}

#[tokio::test]
async fn test_get_missing_calendar_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/nadie%40example.com"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "code": 404, "message": "Not Found" }
        })))
        .mount(&server)
        .await;

    let err = service(&server)
        .get_calendar(&CalendarAuth::ApiKey("public-key".to_string()), "nadie@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, GcalServiceError::NotFound(ref m) if m == "Not Found"));
}
