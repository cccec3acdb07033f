// --- File: crates/services/turnero_backend/src/app_state.rs ---
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use turnero_auth::{AuthState, GoogleOAuth, SessionConfig, MAX_SESSION_TTL_MINUTES};
use turnero_common::{config_error, TurneroError, HTTP_CLIENT};
use turnero_config::AppConfig;
use turnero_gcal::{CalendarBackend, GcalState, GoogleCalendarService};

/// Secrets shorter than this are accepted but logged as weak.
const MIN_SECRET_LEN: usize = 32;

/// Application state shared across all routes.
///
/// Each feature router gets its own slice of it (`GcalState`, `AuthState`);
/// both share the same session configuration so a cookie issued by the sign-in
/// flow is readable by the agenda and booking handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub gcal: GcalState,
    pub auth: AuthState,
}

impl AppState {
    /// Wires the Google Calendar REST service and OAuth client from `config`.
    pub fn new(config: Arc<AppConfig>) -> Result<Self, TurneroError> {
        let calendar: Arc<CalendarBackend> =
            Arc::new(GoogleCalendarService::from_config(&config.google));
        Self::with_calendar(config, calendar)
    }

    /// Like [`AppState::new`] with a caller-provided calendar backend.
    pub fn with_calendar(
        config: Arc<AppConfig>,
        calendar: Arc<CalendarBackend>,
    ) -> Result<Self, TurneroError> {
        if config.auth.secret.is_empty() {
            return Err(config_error("auth.secret is empty, set AUTH_SECRET"));
        }
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&config.auth.session_ttl_minutes) {
            return Err(config_error(format!(
                "auth.session_ttl_minutes must be between 1 and {}, got {}",
                MAX_SESSION_TTL_MINUTES, config.auth.session_ttl_minutes
            )));
        }
        if config.auth.secret.len() < MIN_SECRET_LEN {
            warn!(
                "auth.secret has fewer than {} characters, sessions are weakly protected",
                MIN_SECRET_LEN
            );
        }
        if config.google.api_key.is_none() {
            warn!("No GOOGLE_API_KEY configured, anonymous visitors cannot load booking pages");
        }

        let sessions = SessionConfig::new(&config.auth);
        let redirect_uri = format!("{}/auth/callback", config.server.origin());
        info!("OAuth redirect URI: {}", redirect_uri);

        let auth = AuthState {
            oauth: Arc::new(GoogleOAuth::new(
                &config.google,
                redirect_uri,
                HTTP_CLIENT.clone(),
            )),
            sessions: sessions.clone(),
        };
        let gcal = GcalState::new(config.clone(), calendar, sessions)?;

        Ok(Self { config, gcal, auth })
    }

    /// The complete application router.
    pub fn router(&self) -> Router {
        #[allow(unused_mut)] // only mutated with the openapi feature
        let mut app = Router::new()
            .route("/", get(|| async { "Bienvenido a Turnero" }))
            .route("/health", get(health))
            .nest("/api", turnero_gcal::routes(self.gcal.clone()))
            .nest("/auth", turnero_auth::routes(self.auth.clone()))
            .merge(turnero_gcal::page_routes());

        #[cfg(feature = "openapi")]
        {
            use turnero_auth::doc::AuthApiDoc;
            use turnero_gcal::doc::GcalApiDoc;
            use utoipa::OpenApi;
            use utoipa_swagger_ui::SwaggerUi;

            #[derive(OpenApi)]
            #[openapi(
                info(
                    title = "Turnero API",
                    version = "0.1.0",
                    description = "Appointment booking on top of Google Calendar",
                    license(name = "MIT", url = "https://opensource.org/licenses/MIT")
                ),
                tags((name = "Turnero", description = "Core service endpoints")),
            )]
            struct ApiDoc;

            let mut openapi_doc = ApiDoc::openapi();
            openapi_doc.merge(GcalApiDoc::openapi());
            openapi_doc.merge(AuthApiDoc::openapi());
            info!("Adding Swagger UI at /api/docs");

            app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
        }

        app.layer(TraceLayer::new_for_http())
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
