// --- File: crates/turnero_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{HttpStatusCode, TurneroError};

// Include the client module
pub mod client;

/// Extension trait for TurneroError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    /// Converts the error into an Axum HTTP response.
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for TurneroError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Internal details stay in the logs, the client gets the category message only.
        let error_message = if status_code.is_server_error()
            && !matches!(self, TurneroError::ExternalServiceError { .. })
        {
            tracing::error!("Internal error returned to client: {}", self);
            "Error interno del servidor".to_string()
        } else {
            self.user_message()
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }));

        (status_code, body).into_response()
    }
}

/// Implement IntoResponse for TurneroError to make it easier to use in Axum handlers.
impl IntoResponse for TurneroError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
