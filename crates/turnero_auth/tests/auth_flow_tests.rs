use axum::{
    body::Body,
    http::{
        header::{COOKIE, LOCATION, SET_COOKIE},
        Request, Response, StatusCode,
    },
    Router,
};
use reqwest::Url;
use std::sync::Arc;
use tower::ServiceExt;
use turnero_auth::{routes, AuthError, AuthState, GoogleOAuth, SessionConfig};
use turnero_config::{AuthConfig, GoogleConfig};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn google_config(server: &MockServer) -> GoogleConfig {
    GoogleConfig {
        client_id: "client-id".to_string(),
        client_secret: "client-secret".to_string(),
        api_key: None,
        calendar_api_url: format!("{}/calendar/v3", server.uri()),
        auth_url: format!("{}/authorize", server.uri()),
        token_url: format!("{}/token", server.uri()),
        userinfo_url: format!("{}/userinfo", server.uri()),
    }
}

fn oauth(server: &MockServer) -> GoogleOAuth {
    GoogleOAuth::new(
        &google_config(server),
        "http://localhost:8080/auth/callback",
        reqwest::Client::new(),
    )
}

fn app(server: &MockServer) -> Router {
    routes(AuthState {
        oauth: Arc::new(oauth(server)),
        sessions: SessionConfig::new(&AuthConfig {
            secret: "integration-secret".to_string(),
            cookie_name: "turnero_session".to_string(),
            session_ttl_minutes: 60,
            secure_cookies: false,
        }),
    })
}

async fn mount_google(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("code=good-code"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "ya29.token",
            "expires_in": 3599,
            "refresh_token": "1//refresh",
            "scope": "openid email profile https://www.googleapis.com/auth/calendar",
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .and(header("authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sub": "1234",
            "email": "owner@example.com",
            "name": "Owner",
            "picture": "https://example.com/owner.png"
        })))
        .mount(server)
        .await;
}

/// `name=value` of the first Set-Cookie header for `name`.
fn cookie_pair(response: &Response<Body>, name: &str) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&format!("{}=", name)))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_exchange_code_returns_tokens() {
    let server = MockServer::start().await;
    mount_google(&server).await;

    let tokens = oauth(&server).exchange_code("good-code").await.unwrap();

    assert_eq!(tokens.access_token, "ya29.token");
    assert_eq!(tokens.expires_in, Some(3599));
    assert_eq!(tokens.refresh_token.as_deref(), Some("1//refresh"));
}

#[tokio::test]
async fn test_exchange_code_surfaces_google_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Bad Request"
        })))
        .mount(&server)
        .await;

    let err = oauth(&server).exchange_code("stale-code").await.unwrap_err();

    match err {
        AuthError::TokenExchange(message) => assert_eq!(message, "Bad Request"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_authorize_url_requests_calendar_scope() {
    let server = MockServer::start().await;
    let url = oauth(&server).authorize_url("state-123").unwrap();
    let params: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    let param = |key: &str| {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    };

    assert_eq!(url.path(), "/authorize");
    assert_eq!(
        param("scope").as_deref(),
        Some("openid email profile https://www.googleapis.com/auth/calendar")
    );
    assert_eq!(param("access_type").as_deref(), Some("offline"));
    assert_eq!(param("prompt").as_deref(), Some("consent"));
    assert_eq!(param("state").as_deref(), Some("state-123"));
    assert_eq!(
        param("redirect_uri").as_deref(),
        Some("http://localhost:8080/auth/callback")
    );
}

#[tokio::test]
async fn test_full_sign_in_flow_opens_session() {
    let server = MockServer::start().await;
    mount_google(&server).await;
    let app = app(&server);

    // 1. Sign-in redirects to Google and remembers the state.
    let response = get(&app, "/signin?redirect_to=/reservar_turno/owner%40example.com", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response.headers()[LOCATION].to_str().unwrap().to_string();
    let state = Url::parse(&location)
        .unwrap()
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .expect("state parameter");
    let state_cookie = cookie_pair(&response, "turnero_oauth_state").expect("state cookie");

    // 2. Callback exchanges the code and sets the session.
    let response = get(
        &app,
        &format!("/callback?code=good-code&state={}", state),
        Some(&state_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    // The query string was percent-decoded on the way in.
    assert_eq!(
        response.headers()[LOCATION],
        "/reservar_turno/owner@example.com"
    );
    let session_cookie = cookie_pair(&response, "turnero_session").expect("session cookie");

    // 3. The session endpoint sees the user.
    let response = get(&app, "/session", Some(&session_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let user: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(user["email"], "owner@example.com");
    assert_eq!(user["name"], "Owner");
    assert!(user.get("access_token").is_none());
}

#[tokio::test]
async fn test_callback_rejects_mismatched_state() {
    let server = MockServer::start().await;
    mount_google(&server).await;
    let app = app(&server);

    let response = get(&app, "/signin", None).await;
    let state_cookie = cookie_pair(&response, "turnero_oauth_state").expect("state cookie");

    let response = get(
        &app,
        "/callback?code=good-code&state=forged",
        Some(&state_cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_callback_with_declined_consent_is_unauthorized() {
    let server = MockServer::start().await;
    let response = get(&app(&server), "/callback?error=access_denied", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_without_cookie_is_unauthorized() {
    let server = MockServer::start().await;
    let response = get(&app(&server), "/session", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
