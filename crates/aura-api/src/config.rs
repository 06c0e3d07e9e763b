//! API configuration.

use std::path::PathBuf;
use std::time::Duration;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Interval between progress stream polls
    pub progress_poll: Duration,
    /// Idle time after which a progress entry is evicted
    pub progress_ttl: Duration,
    /// Interval of the progress sweeper
    pub progress_sweep: Duration,
    /// Root of the local record store
    pub data_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 2 * 1024 * 1024, // 2MB
            environment: "development".to_string(),
            progress_poll: Duration::from_millis(250),
            progress_ttl: Duration::from_secs(1800),
            progress_sweep: Duration::from_secs(60),
            data_dir: PathBuf::from("/tmp/aura_data"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(defaults.cors_origins),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            progress_poll: env_parse("PROGRESS_POLL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.progress_poll),
            progress_ttl: env_parse("PROGRESS_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.progress_ttl),
            progress_sweep: env_parse("PROGRESS_SWEEP_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.progress_sweep),
            data_dir: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.progress_poll, Duration::from_millis(250));
        assert_eq!(config.progress_ttl, Duration::from_secs(1800));
        assert!(!config.is_production());
    }
}
