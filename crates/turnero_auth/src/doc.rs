// File: crates/turnero_auth/src/doc.rs

#![cfg(feature = "openapi")]
use utoipa::OpenApi;

use crate::session::SessionUser;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::signin_handler,
        crate::handlers::callback_handler,
        crate::handlers::signout_handler,
        crate::handlers::session_handler
    ),
    components(schemas(SessionUser)),
    tags(
        (name = "Auth", description = "Google sign-in and session")
    )
)]
pub struct AuthApiDoc;
