use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;
use std::path::PathBuf;
use tracing::warn;

pub mod env_vars;
pub mod models;

pub use models::*;

/// Loads the application configuration.
///
/// Sources, later ones winning:
/// 1. `{CONFIG_DIR}/default.(toml|yaml|json)` (CONFIG_DIR defaults to `config`)
/// 2. `{CONFIG_DIR}/{RUN_ENV}.*` (RUN_ENV defaults to `debug`)
/// 3. environment variables `TURNERO__SECTION__KEY` (prefix overridable via PREFIX)
///
/// Afterwards every `"secret_from_env"` marker is resolved, see [`env_vars`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "TURNERO".to_string());
    let config_dir = env::var("CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    build_config(builder)
}

/// Builds, deserializes and resolves secrets for a prepared config builder.
pub fn build_config(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    apply_env_overrides_from_marker(raw_config)
}

/// Applies environment overrides based on "secret_from_env" markers in the serialized config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> Result<AppConfig, ConfigError> {
    let mut json = serde_json::to_value(&config)
        .map_err(|err| ConfigError::Message(format!("failed to serialize config: {err}")))?;

    let missing = env_vars::inject_env_secrets(&mut json);
    for var in &missing {
        warn!("Environment variable {} not set for secret_from_env", var);
    }

    serde_json::from_value(json).map_err(|err| {
        ConfigError::Message(format!(
            "config invalid after resolving secrets (missing: {}): {err}",
            missing.join(", ")
        ))
    })
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Loads the dotenv file once per process and returns the path that was used.
///
/// `DOTENV_OVERRIDE` selects the file, then a first CLI argument starting with
/// `.env`, otherwise `.env`.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}
