// --- File: crates/turnero_auth/src/lib.rs ---
//! Google sign-in and the cookie session that carries the user's access token.

pub mod doc;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod routes;
pub mod session;

pub use error::AuthError;
pub use handlers::AuthState;
pub use oauth::{GoogleOAuth, TokenResponse, UserInfo, SCOPES};
pub use routes::routes;
pub use session::{
    CurrentSession, MaybeSession, Session, SessionConfig, SessionUser, MAX_SESSION_TTL_MINUTES,
};
