//! Server configuration from environment variables.
//!
//! | Variable           | Default                 |
//! |--------------------|-------------------------|
//! | `MODEL_PATH`       | `models/aqi_model.json` |
//! | `STATIC_DIR`       | `static`                |
//! | `PORT`             | `3000`                  |
//! | `SESSION_TTL_SECS` | `1800`                  |
//! | `SESSION_CAPACITY` | `10000`                 |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL_PATH: &str = "models/aqi_model.json";
pub const DEFAULT_STATIC_DIR: &str = "static";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;
pub const DEFAULT_SESSION_CAPACITY: u64 = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub model_path: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
    /// Idle time after which a session is forgotten.
    pub session_ttl: Duration,
    pub session_capacity: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            port: DEFAULT_PORT,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECS),
            session_capacity: DEFAULT_SESSION_CAPACITY,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (used by `from_env` and tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
            port: parse_or(&lookup, "PORT", defaults.port),
            session_ttl: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            )),
            session_capacity: parse_or(&lookup, "SESSION_CAPACITY", defaults.session_capacity),
        }
    }

    pub fn log_summary(&self) {
        tracing::info!("Configuration:");
        tracing::info!("  MODEL_PATH: {}", self.model_path.display());
        tracing::info!("  STATIC_DIR: {}", self.static_dir.display());
        tracing::info!("  PORT: {}", self.port);
        tracing::info!("  SESSION_TTL_SECS: {}", self.session_ttl.as_secs());
        tracing::info!("  SESSION_CAPACITY: {}", self.session_capacity);
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using {}", key, raw, default);
            default
        }),
        None => default,
    }
}
