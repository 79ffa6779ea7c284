//! Configuration module

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default prediction API location.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Upload limit enforced before anything is sent.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 50;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the prediction service
    pub api_url: String,

    /// Per-request timeout for API calls
    pub request_timeout: Duration,

    /// Maximum upload size in MB
    pub max_upload_mb: u64,

    /// Directory holding the session scope files
    pub data_dir: PathBuf,

    /// Name of the session scope (one file per name)
    pub session: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("CRYPTOSCOPE_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),

            request_timeout: Duration::from_secs(
                env::var("CRYPTOSCOPE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(10),
            ),

            max_upload_mb: env::var("CRYPTOSCOPE_MAX_UPLOAD_MB")
                .ok()
                .and_then(|m| m.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_MB),

            data_dir: env::var("CRYPTOSCOPE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_data_dir()),

            session: env::var("CRYPTOSCOPE_SESSION").unwrap_or_else(|_| "default".to_string()),
        }
    }

    /// Upload limit in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_mb * 1024 * 1024
    }

    /// File backing the session scope for the configured session name
    pub fn session_path(&self) -> PathBuf {
        self.data_dir.join(format!("session-{}.json", self.session))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(10),
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            data_dir: default_data_dir(),
            session: "default".to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join("cryptoscope")
}
