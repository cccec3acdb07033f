use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use turnero_backend::AppState;
use turnero_config::{
    AppConfig, AuthConfig, BookingConfig, GoogleConfig, ScheduleConfig, ServerConfig,
};

fn config(secret: &str) -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            public_url: Some("https://turnero.example.com/".to_string()),
        },
        google: GoogleConfig {
            client_id: "client-id".to_string(),
            client_secret: "client-secret".to_string(),
            api_key: None,
            calendar_api_url: "http://127.0.0.1:9/calendar/v3".to_string(),
            auth_url: "https://accounts.example.com/auth".to_string(),
            token_url: "http://127.0.0.1:9/token".to_string(),
            userinfo_url: "http://127.0.0.1:9/userinfo".to_string(),
        },
        auth: AuthConfig {
            secret: secret.to_string(),
            cookie_name: "turnero_session".to_string(),
            session_ttl_minutes: 60,
            secure_cookies: true,
        },
        booking: BookingConfig::default(),
        schedule: ScheduleConfig::default(),
    }
}

fn app() -> Router {
    AppState::new(Arc::new(config("a-long-enough-secret-for-the-router-tests")))
        .expect("valid config")
        .router()
}

async fn get(uri: &str) -> axum::response::Response {
    app()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, r#"{"status":"ok"}"#);
}

#[tokio::test]
async fn test_welcome() {
    let response = get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Turnero"));
}

#[tokio::test]
async fn test_privacy_policy_at_root() {
    let response = get("/politicas").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Política de Privacidad"));
}

#[tokio::test]
async fn test_api_routes_are_nested() {
    let response = get("/api/search?email=owner%40example.com").await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(get("/search?email=owner%40example.com").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_protected_routes_need_session() {
    for uri in ["/api/agenda", "/api/agenda/appointments", "/auth/session"] {
        assert_eq!(get(uri).await.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }
}

#[tokio::test]
async fn test_signin_redirects_back_to_public_origin() {
    let response = get("/auth/signin").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()["location"].to_str().unwrap();
    assert!(location.starts_with("https://accounts.example.com/auth?"));
    assert!(location.contains("redirect_uri=https%3A%2F%2Fturnero.example.com%2Fauth%2Fcallback"));
}

#[test]
fn test_empty_secret_is_rejected() {
    assert!(AppState::new(Arc::new(config(""))).is_err());
}

#[test]
fn test_unknown_time_zone_is_rejected() {
    let mut config = config("a-long-enough-secret-for-the-router-tests");
    config.booking.time_zone = Some("Mars/Olympus".to_string());
    assert!(AppState::new(Arc::new(config)).is_err());
}

#[test]
fn test_out_of_range_windows_are_rejected() {
    let mut ttl = config("a-long-enough-secret-for-the-router-tests");
    ttl.auth.session_ttl_minutes = i64::MAX;
    assert!(AppState::new(Arc::new(ttl)).is_err());

    let mut agenda = config("a-long-enough-secret-for-the-router-tests");
    agenda.booking.agenda_days = 0;
    assert!(AppState::new(Arc::new(agenda)).is_err());
}

#[tokio::test]
async fn test_dashboard_is_nested_and_protected() {
    assert_eq!(get("/api/dashboard").await.status(), StatusCode::UNAUTHORIZED);
}
