// --- File: crates/turnero_auth/src/handlers.rs ---
use axum::{
    extract::{FromRef, Query, State},
    response::{Json, Redirect},
};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use turnero_common::TurneroError;
use uuid::Uuid;

use crate::error::AuthError;
use crate::oauth::GoogleOAuth;
use crate::session::{CurrentSession, Session, SessionConfig, SessionUser};

const STATE_COOKIE_NAME: &str = "turnero_oauth_state";
const DEFAULT_AFTER_SIGNIN: &str = "/agenda";

// Shared state for the auth routes.
#[derive(Clone)]
pub struct AuthState {
    pub oauth: Arc<GoogleOAuth>,
    pub sessions: SessionConfig,
}

impl FromRef<AuthState> for SessionConfig {
    fn from_ref(state: &AuthState) -> Self {
        state.sessions.clone()
    }
}

impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.sessions.key()
    }
}

#[derive(Deserialize, Debug, Default)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct SignInQuery {
    /// Local path to return to after signing in.
    pub redirect_to: Option<String>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by Google when the user declines consent.
    pub error: Option<String>,
}

/// What the state cookie remembers between sign-in and callback.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct PendingSignIn {
    state: String,
    redirect_to: String,
}

/// Only same-site absolute paths are accepted as post-login targets.
fn safe_redirect(target: Option<&str>) -> String {
    match target {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path.to_string()
        }
        _ => DEFAULT_AFTER_SIGNIN.to_string(),
    }
}

/// Starts Google sign-in.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/signin",
    params(SignInQuery),
    responses(
        (status = 303, description = "Redirect to Google's consent screen"),
    ),
    tag = "Auth"
))]
pub async fn signin_handler(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(query): Query<SignInQuery>,
) -> Result<(PrivateCookieJar, Redirect), TurneroError> {
    let pending = PendingSignIn {
        state: Uuid::new_v4().to_string(),
        redirect_to: safe_redirect(query.redirect_to.as_deref()),
    };
    let authorize_url = state.oauth.authorize_url(&pending.state)?;

    let jar = jar.add(
        Cookie::build((
            STATE_COOKIE_NAME,
            serde_json::to_string(&pending).map_err(AuthError::from)?,
        ))
        .path("/")
        .http_only(true)
        .secure(state.sessions.secure())
        .same_site(SameSite::Lax),
    );

    Ok((jar, Redirect::to(authorize_url.as_str())))
}

/// Completes Google sign-in and opens the session.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/callback",
    params(CallbackQuery),
    responses(
        (status = 303, description = "Signed in, redirect to the requested page"),
        (status = 400, description = "Missing or mismatched state"),
        (status = 401, description = "Consent declined"),
        (status = 502, description = "Google rejected the code"),
    ),
    tag = "Auth"
))]
pub async fn callback_handler(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
    Query(query): Query<CallbackQuery>,
) -> Result<(PrivateCookieJar, Redirect), TurneroError> {
    if let Some(error) = query.error {
        warn!("Google sign-in declined: {}", error);
        return Err(AuthError::Denied(error).into());
    }

    let pending: PendingSignIn = jar
        .get(STATE_COOKIE_NAME)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .ok_or(AuthError::InvalidState)?;
    if query.state.as_deref() != Some(pending.state.as_str()) {
        warn!("OAuth state mismatch on callback");
        return Err(AuthError::InvalidState.into());
    }
    let code = query.code.ok_or(AuthError::InvalidState)?;

    let tokens = state.oauth.exchange_code(&code).await?;
    let user = state.oauth.fetch_user(&tokens.access_token).await?;

    let session = Session {
        expires_at: state.sessions.expiry_for(Utc::now(), tokens.expires_in),
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        email: user.email,
        name: user.name,
        image: user.picture,
    };
    info!("Signed in {}", session.email);

    let jar = jar.remove(Cookie::build((STATE_COOKIE_NAME, "")).path("/"));
    let jar = state.sessions.store(jar, &session)?;
    Ok((jar, Redirect::to(&pending.redirect_to)))
}

/// Ends the session.
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/auth/signout",
    responses(
        (status = 303, description = "Session cookie cleared"),
    ),
    tag = "Auth"
))]
pub async fn signout_handler(
    State(state): State<AuthState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Redirect) {
    (state.sessions.clear(jar), Redirect::to("/"))
}

/// The signed-in user.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/auth/session",
    responses(
        (status = 200, description = "Current user", body = SessionUser),
        (status = 401, description = "Not signed in"),
    ),
    tag = "Auth"
))]
pub async fn session_handler(CurrentSession(session): CurrentSession) -> Json<SessionUser> {
    Json(session.user())
}
