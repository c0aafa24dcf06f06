//! Client configuration.
//!
//! Dev setups keep the API base URL in `.env.local` / `.env`; production
//! injects real environment variables. `from_env` loads the dotenv files
//! first (missing files are fine) and then reads the process environment.

use std::time::Duration;

use anyhow::{Context, Result};

/// Environment variable holding the API base URL.
pub const ENV_BASE_URL: &str = "CAFETERIA_API_URL";
/// Environment variable overriding the per-request timeout, in seconds.
pub const ENV_TIMEOUT_SECS: &str = "CAFETERIA_HTTP_TIMEOUT_SECS";

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Settings for [`RestBackend`](crate::RestBackend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the cafeteria API, without a trailing path.
    pub base_url: String,
    /// Bounded wait per request; expiry surfaces as `BackendError::Timeout`.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Build from `.env.local` / `.env` plus the process environment.
    ///
    /// # Errors
    /// Fails only on an unparseable timeout override; missing variables fall
    /// back to defaults.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::dotenv();

        let base_url =
            std::env::var(ENV_BASE_URL).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let timeout = match std::env::var(ENV_TIMEOUT_SECS) {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{ENV_TIMEOUT_SECS} must be an integer, got '{raw}'"))?;
                Duration::from_secs(secs)
            }
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self { base_url, timeout })
    }
}
