// --- File: crates/turnero_auth/src/error.rs ---
use thiserror::Error;
use turnero_common::{external_service_error, internal_error, unauthorized, TurneroError};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No active session")]
    MissingSession,
    #[error("Sign-in state missing or mismatched")]
    InvalidState,
    #[error("Sign-in was cancelled: {0}")]
    Denied(String),
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),
    #[error("User info request failed: {0}")]
    UserInfo(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    Url(String),
    #[error("Session encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl From<AuthError> for TurneroError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingSession => unauthorized("Debes iniciar sesión para continuar"),
            AuthError::InvalidState => TurneroError::ValidationError(
                "La solicitud de inicio de sesión no es válida, intentá de nuevo".to_string(),
            ),
            AuthError::Denied(_) => unauthorized("Se canceló el inicio de sesión con Google"),
            AuthError::TokenExchange(msg) | AuthError::UserInfo(msg) => {
                external_service_error("Google OAuth", msg)
            }
            AuthError::Http(e) => external_service_error("Google OAuth", e),
            AuthError::Url(msg) => internal_error(msg),
            AuthError::Encoding(e) => internal_error(e),
        }
    }
}
