use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde_json::Value;
use std::env;
use std::path::PathBuf;

pub mod models;
pub use models::*;

/// Load the application configuration.
///
/// Sources are layered, later sources overriding earlier ones:
/// 1. `{config_dir}/default` (any format the `config` crate understands)
/// 2. `{config_dir}/{RUN_ENV}` (defaults to `debug`)
/// 3. Environment variables with the `COACHCHAT` prefix, `__` separated
///    (e.g. `COACHCHAT_SERVER__PORT=8080`)
///
/// The config directory is `./config` unless `COACHCHAT_CONFIG_DIR` is set.
/// `.env` is loaded once before anything else.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "COACHCHAT".to_string());

    let config_dir = env::var("COACHCHAT_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config"));

    let default_path = config_dir.join("default");
    let env_path = config_dir.join(&run_env);

    let builder = Config::builder()
        .add_source(File::with_name(&default_path.to_string_lossy()).required(false))
        .add_source(File::with_name(&env_path.to_string_lossy()).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    let raw_config: AppConfig = builder.build()?.try_deserialize()?;
    Ok(apply_env_overrides_from_marker(raw_config))
}

/// Recursively replaces all "secret_from_env" string values with environment
/// variable values. The variable name is the uppercased path of the field,
/// joined with underscores (e.g. `stream.api_secret` -> `STREAM_API_SECRET`).
fn inject_env_secrets(value: &mut Value) {
    fn walk(path: Vec<String>, obj: &mut Value) {
        match obj {
            Value::Object(map) => {
                for (k, v) in map.iter_mut() {
                    let mut new_path = path.clone();
                    new_path.push(k.to_string());
                    walk(new_path, v);
                }
            }
            Value::String(s) if s == "secret_from_env" => {
                let env_key = path.join("_").to_uppercase();
                if let Ok(env_val) = std::env::var(&env_key) {
                    *obj = Value::String(env_val);
                } else {
                    eprintln!("Warning: env var {} not found for secret_from_env", env_key);
                }
            }
            _ => {}
        }
    }

    walk(vec![], value);
}

/// Applies environment overrides based on "secret_from_env" markers in the
/// serialized config.
pub fn apply_env_overrides_from_marker(config: AppConfig) -> AppConfig {
    let mut json = serde_json::to_value(&config).expect("AppConfig must be serializable");
    inject_env_secrets(&mut json);
    serde_json::from_value(json).expect("AppConfig must remain deserializable")
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures that the dotenv file is loaded into the environment variables.
///
/// The path can be overridden with `DOTENV_OVERRIDE`; otherwise the first
/// command line argument starting with `.env` is used, falling back to
/// `.env`. The load happens at most once per process.
pub fn ensure_dotenv_loaded() -> String {
    let dotenv_path_override = std::env::var("DOTENV_OVERRIDE").ok();
    let dotenv_path_arg = env::args().nth(1).filter(|s| s.starts_with(".env"));

    let dotenv_path = dotenv_path_override
        .or(dotenv_path_arg)
        .unwrap_or_else(|| ".env".to_string());

    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });

    dotenv_path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_secret_marker_is_replaced() {
        std::env::set_var("STREAM_API_SECRET", "s3cret");
        let mut value = serde_json::json!({
            "stream": { "api_secret": "secret_from_env" }
        });
        inject_env_secrets(&mut value);
        assert_eq!(value["stream"]["api_secret"], "s3cret");
        std::env::remove_var("STREAM_API_SECRET");
    }

    #[test]
    fn non_marker_strings_are_untouched() {
        let mut value = serde_json::json!({ "stream": { "api_key": "abc" } });
        inject_env_secrets(&mut value);
        assert_eq!(value["stream"]["api_key"], "abc");
    }
}
