//! API configuration.

use crate::services::gate::ReviewPolicy;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Environment (development/production)
    pub environment: String,
    /// Emit JSON logs instead of ANSI-colored ones
    pub log_json: bool,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit per client IP per minute (0 disables)
    pub rate_limit_per_minute: u32,
    /// Max request body size in bytes
    pub max_body_bytes: usize,
    /// Who may review update requests
    pub review_policy: ReviewPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: "development".to_string(),
            log_json: false,
            cors_origins: vec!["*".to_string()],
            rate_limit_per_minute: 120,
            max_body_bytes: 64 * 1024,
            review_policy: ReviewPolicy::AssignedOnly,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            log_json: std::env::var("LOG_JSON")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.log_json),
            cors_origins: std::env::var("CORS_ALLOWED_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_per_minute),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_bytes),
            review_policy: std::env::var("REVIEW_POLICY")
                .ok()
                .map(|s| ReviewPolicy::parse(&s))
                .unwrap_or(defaults.review_policy),
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
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limit_per_minute, 120);
        assert_eq!(config.max_body_bytes, 64 * 1024);
        assert_eq!(config.review_policy, ReviewPolicy::AssignedOnly);
        assert!(!config.is_production());
    }
}
