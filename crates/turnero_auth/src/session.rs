// --- File: crates/turnero_auth/src/session.rs ---
//! Cookie-backed sessions.
//!
//! The session is serialized to JSON and stored in an encrypted, authenticated
//! cookie, so nothing is kept server side.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::convert::Infallible;
use std::fmt;
use tracing::debug;
use turnero_common::{CalendarAuth, TurneroError};
use turnero_config::AuthConfig;

use crate::error::AuthError;

/// Signed-in user plus the Google credentials used for calendar calls.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    /// Unix seconds.
    pub expires_at: i64,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.expires_at
    }

    pub fn calendar_auth(&self) -> CalendarAuth {
        CalendarAuth::Bearer(self.access_token.clone())
    }

    pub fn user(&self) -> SessionUser {
        SessionUser {
            email: self.email.clone(),
            name: self.name.clone(),
            image: self.image.clone(),
            expires_at: self.expires_at,
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// The public part of a session, safe to hand to the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionUser {
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub expires_at: i64,
}

/// Longest accepted `auth.session_ttl_minutes`, one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 60 * 24 * 365;

/// Cookie name, lifetime and encryption key for sessions.
#[derive(Clone)]
pub struct SessionConfig {
    key: Key,
    cookie_name: String,
    ttl: Duration,
    secure: bool,
}

impl SessionConfig {
    pub fn new(auth: &AuthConfig) -> Self {
        // Key needs 64 bytes of material regardless of the configured secret's length.
        let digest = Sha512::digest(auth.secret.as_bytes());
        Self {
            key: Key::from(digest.as_slice()),
            cookie_name: auth.cookie_name.clone(),
            ttl: Duration::minutes(
                auth.session_ttl_minutes
                    .clamp(1, MAX_SESSION_TTL_MINUTES),
            ),
            secure: auth.secure_cookies,
        }
    }

    pub fn key(&self) -> Key {
        self.key.clone()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Session expiry: the configured TTL, cut short by the access token's own lifetime.
    pub fn expiry_for(&self, now: DateTime<Utc>, token_expires_in: Option<i64>) -> i64 {
        let ttl_end = now + self.ttl;
        // Out-of-range lifetimes from the token endpoint leave the TTL in charge.
        let token_end = token_expires_in
            .filter(|secs| *secs > 0)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));
        match token_end {
            Some(token_end) => ttl_end.min(token_end).timestamp(),
            None => ttl_end.timestamp(),
        }
    }

    /// Adds the encrypted session cookie to `jar`.
    pub fn store(&self, jar: PrivateCookieJar, session: &Session) -> Result<PrivateCookieJar, AuthError> {
        let value = serde_json::to_string(session)?;
        Ok(jar.add(
            Cookie::build((self.cookie_name.clone(), value))
                .path("/")
                .http_only(true)
                .secure(self.secure)
                .same_site(SameSite::Lax),
        ))
    }

    pub fn clear(&self, jar: PrivateCookieJar) -> PrivateCookieJar {
        jar.remove(Cookie::build((self.cookie_name.clone(), "")).path("/"))
    }

    /// The unexpired session in `jar`, if any. Tampered or undecodable cookies count as none.
    pub fn load(&self, jar: &PrivateCookieJar, now: DateTime<Utc>) -> Option<Session> {
        let cookie = jar.get(&self.cookie_name)?;
        let session: Session = match serde_json::from_str(cookie.value()) {
            Ok(session) => session,
            Err(e) => {
                debug!("Discarding undecodable session cookie: {}", e);
                return None;
            }
        };
        if session.is_expired_at(now) {
            debug!("Session for {} expired at {}", session.email, session.expires_at);
            return None;
        }
        Some(session)
    }

    pub fn read_headers(&self, headers: &HeaderMap, now: DateTime<Utc>) -> Option<Session> {
        let jar = PrivateCookieJar::from_headers(headers, self.key());
        self.load(&jar, now)
    }
}

/// Extractor for routes that require a signed-in user. Rejects with 401.
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
    SessionConfig: FromRef<S>,
{
    type Rejection = TurneroError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = SessionConfig::from_ref(state);
        config
            .read_headers(&parts.headers, Utc::now())
            .map(CurrentSession)
            .ok_or_else(|| AuthError::MissingSession.into())
    }
}

/// Extractor for routes that work with or without a signed-in user.
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SessionConfig: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = SessionConfig::from_ref(state);
        Ok(MaybeSession(config.read_headers(&parts.headers, Utc::now())))
    }
}
