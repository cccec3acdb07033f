use std::fmt;
use thiserror::Error;

/// The base error type shared by all Turnero crates.
///
/// Crate-specific errors convert into this type at the HTTP boundary, where it is
/// rendered as a JSON error body with a matching status code.
#[derive(Error, Debug)]
pub enum TurneroError {
    /// Error occurred during an HTTP request
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Error occurred while parsing data
    #[error("Failed to parse data: {0}")]
    ParseError(String),

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The request has no valid session
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// The requested slot or resource collides with an existing one
    #[error("Conflict: {0}")]
    ConflictError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for TurneroError {
    fn status_code(&self) -> u16 {
        match self {
            TurneroError::HttpError(_) => 502,
            TurneroError::ParseError(_) => 400,
            TurneroError::ConfigError(_) => 500,
            TurneroError::AuthError(_) => 401,
            TurneroError::ValidationError(_) => 400,
            TurneroError::ExternalServiceError { .. } => 502,
            TurneroError::ConflictError(_) => 409,
            TurneroError::NotFoundError(_) => 404,
            TurneroError::InternalError(_) => 500,
        }
    }
}

impl TurneroError {
    /// The message meant for the end user, without the category prefix.
    pub fn user_message(&self) -> String {
        match self {
            TurneroError::HttpError(m)
            | TurneroError::ParseError(m)
            | TurneroError::ConfigError(m)
            | TurneroError::AuthError(m)
            | TurneroError::ValidationError(m)
            | TurneroError::ConflictError(m)
            | TurneroError::NotFoundError(m)
            | TurneroError::InternalError(m) => m.clone(),
            TurneroError::ExternalServiceError { message, .. } => message.clone(),
        }
    }
}

// Common error conversions
impl From<reqwest::Error> for TurneroError {
    fn from(err: reqwest::Error) -> Self {
        TurneroError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for TurneroError {
    fn from(err: serde_json::Error) -> Self {
        TurneroError::ParseError(err.to_string())
    }
}

impl From<std::io::Error> for TurneroError {
    fn from(err: std::io::Error) -> Self {
        TurneroError::InternalError(err.to_string())
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> TurneroError {
    TurneroError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> TurneroError {
    TurneroError::ValidationError(message.to_string())
}

pub fn unauthorized<T: fmt::Display>(message: T) -> TurneroError {
    TurneroError::AuthError(message.to_string())
}

pub fn not_found<T: fmt::Display>(message: T) -> TurneroError {
    TurneroError::NotFoundError(message.to_string())
}

pub fn conflict<T: fmt::Display>(message: T) -> TurneroError {
    TurneroError::ConflictError(message.to_string())
}

pub fn external_service_error<T: fmt::Display>(service_name: &str, message: T) -> TurneroError {
    TurneroError::ExternalServiceError {
        service_name: service_name.to_string(),
        message: message.to_string(),
    }
}

pub fn internal_error<T: fmt::Display>(message: T) -> TurneroError {
    TurneroError::InternalError(message.to_string())
}
