//! Client configuration loaded from environment variables.
//!
//! The auth token is read once here and carried in an explicit [`Session`],
//! so nothing downstream reads ambient storage at request time.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the surveillance REST API
    pub api_base_url: String,
    /// Bearer token for authenticated requests
    pub session: Session,
    /// Token for the globe terrain provider (terrain stays off without it)
    pub terrain_token: Option<String>,
    /// Polling cadence per view
    pub cadence: PollCadence,
    /// Heatmap intensity threshold (0-100); points below it are not rendered
    pub heat_threshold: f64,
    /// Number of heatmap points requested per fetch
    pub heatmap_limit: u32,
}

/// Authentication context handed to the API client at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// Session with a bearer token. Blank tokens count as no token.
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = token.trim();
        Self {
            token: (!token.is_empty()).then(|| token.to_string()),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Poll intervals for the views that refresh on a timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCadence {
    /// Selected job's visualization payload
    pub visualization: Duration,
    /// Detection job list
    pub job_list: Duration,
    /// Live heatmap points
    pub heatmap: Duration,
}

impl Default for PollCadence {
    fn default() -> Self {
        Self {
            visualization: Duration::from_secs(10),
            job_list: Duration::from_secs(15),
            heatmap: Duration::from_secs(15),
        }
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            session: Session::anonymous(),
            terrain_token: None,
            cadence: PollCadence::default(),
            heat_threshold: 70.0,
            heatmap_limit: 1000,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honoured for local development.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = PollCadence::default();

        Ok(Self {
            api_base_url: env::var("MINEWATCH_API_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8000".to_string()),
            session: env::var("MINEWATCH_AUTH_TOKEN")
                .map(Session::with_token)
                .unwrap_or_default(),
            terrain_token: env::var("MINEWATCH_TERRAIN_TOKEN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            cadence: PollCadence {
                visualization: secs_var(
                    "MINEWATCH_POLL_VISUALIZATION_SECS",
                    defaults.visualization,
                )?,
                job_list: secs_var("MINEWATCH_POLL_JOBS_SECS", defaults.job_list)?,
                heatmap: secs_var("MINEWATCH_POLL_HEATMAP_SECS", defaults.heatmap)?,
            },
            heat_threshold: parsed_var("MINEWATCH_HEAT_THRESHOLD", 70.0)?,
            heatmap_limit: parsed_var("MINEWATCH_HEATMAP_LIMIT", 1000)?,
        })
    }
}

fn parsed_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => {
            let parsed: Result<T, _> = raw.trim().parse();
            parsed.map_err(|_| ConfigError::Invalid(name, raw))
        }
        Err(_) => Ok(default),
    }
}

fn secs_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let secs: u64 = parsed_var(name, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid(name, "0".to_string()));
    }
    Ok(Duration::from_secs(secs))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1:?}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("MINEWATCH_API_URL", "https://api.example.test/");
        env::set_var("MINEWATCH_AUTH_TOKEN", "tok_123");
        env::set_var("MINEWATCH_POLL_JOBS_SECS", "20");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.api_base_url, "https://api.example.test");
        assert_eq!(config.session.token(), Some("tok_123"));
        assert_eq!(config.cadence.job_list, Duration::from_secs(20));
        assert_eq!(config.cadence.visualization, Duration::from_secs(10));
        assert_eq!(config.heat_threshold, 70.0);

        env::remove_var("MINEWATCH_API_URL");
        env::remove_var("MINEWATCH_AUTH_TOKEN");
        env::remove_var("MINEWATCH_POLL_JOBS_SECS");
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        assert_eq!(Session::with_token("   "), Session::anonymous());
        assert_eq!(Session::with_token(" abc ").token(), Some("abc"));
    }
}
