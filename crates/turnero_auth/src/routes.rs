// --- File: crates/turnero_auth/src/routes.rs ---
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{
    callback_handler, session_handler, signin_handler, signout_handler, AuthState,
};

/// Sign-in routes, meant to be nested under `/auth`.
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/signin", get(signin_handler))
        .route("/callback", get(callback_handler))
        .route("/signout", post(signout_handler))
        .route("/session", get(session_handler))
        .with_state(state)
}
