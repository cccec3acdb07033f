// --- File: crates/services/turnero_backend/src/lib.rs ---
pub mod app_state;

pub use app_state::AppState;
