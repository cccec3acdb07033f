//! Environment variable handling for secrets.
//!
//! Config files mark secret values with the literal string `"secret_from_env"`.
//! The value is then read from the environment variable named after the config
//! path joined with `_` and upper-cased, so `google.client_id` becomes
//! `GOOGLE_CLIENT_ID` and `auth.secret` becomes `AUTH_SECRET`.

use serde_json::Value;
use std::env;

/// Marker string that requests a value from the environment.
pub const SECRET_MARKER: &str = "secret_from_env";

/// Convert a config path to the environment variable holding its secret.
///
/// ```
/// use turnero_config::env_vars::secret_env_var;
/// assert_eq!(secret_env_var(&["google", "client_id"]), "GOOGLE_CLIENT_ID");
/// ```
pub fn secret_env_var<S: AsRef<str>>(path: &[S]) -> String {
    path.iter()
        .map(|segment| segment.as_ref())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

/// Recursively replaces every `"secret_from_env"` string with its environment value.
///
/// Markers whose variable is unset are replaced with `null`, which lets optional
/// fields deserialize to `None` and makes required fields fail loudly.
/// Returns the names of the variables that were not found.
pub fn inject_env_secrets(value: &mut Value) -> Vec<String> {
    fn walk(path: &mut Vec<String>, obj: &mut Value, missing: &mut Vec<String>) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    path.push(k.to_string());
                    walk(path, v, missing);
                    path.pop();
                }
            }
            Value::String(s) if s == SECRET_MARKER => {
                let env_key = secret_env_var(path);
                match env::var(&env_key) {
                    Ok(env_val) => *obj = Value::String(env_val),
                    Err(_) => {
                        missing.push(env_key);
                        *obj = Value::Null;
                    }
                }
            }
            _ => {}
        }
    }

    let mut missing = Vec::new();
    walk(&mut Vec::new(), value, &mut missing);
    missing
}
