use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but cannot be parsed.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let require_positive = |var: &str, value: u32| -> Result<u32, ConfigError> {
        if value == 0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(value)
    };

    let env = parse_environment(&or_default("PULSE_ENV", "development"));
    let bind_addr = parse_addr("PULSE_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("PULSE_LOG_LEVEL", "info");

    let instagram_base_url = or_default("PULSE_INSTAGRAM_BASE_URL", "https://graph.instagram.com");
    let search_base_url = or_default("PULSE_SEARCH_BASE_URL", "https://api.twitter.com");
    let request_timeout_secs = parse_u64("PULSE_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("PULSE_USER_AGENT", "social-pulse/0.1 (sentiment-aggregation)");

    let search_max_attempts = require_positive(
        "PULSE_SEARCH_MAX_ATTEMPTS",
        parse_u32("PULSE_SEARCH_MAX_ATTEMPTS", "5")?,
    )?;
    let instagram_max_attempts = require_positive(
        "PULSE_INSTAGRAM_MAX_ATTEMPTS",
        parse_u32("PULSE_INSTAGRAM_MAX_ATTEMPTS", "1")?,
    )?;
    let network_backoff_base_secs = parse_u64("PULSE_NETWORK_BACKOFF_BASE_SECS", "10")?;
    let network_backoff_step_secs = parse_u64("PULSE_NETWORK_BACKOFF_STEP_SECS", "5")?;
    let rate_limit_min_wait_secs = parse_u64("PULSE_RATE_LIMIT_MIN_WAIT_SECS", "10")?;
    let rate_limit_jitter_secs = parse_u64("PULSE_RATE_LIMIT_JITTER_SECS", "5")?;
    let max_wait_secs = parse_u64("PULSE_MAX_WAIT_SECS", "900")?;

    let comment_concurrency = parse_usize("PULSE_COMMENT_CONCURRENCY", "4")?.max(1);
    let aggregate_deadline_secs = parse_u64("PULSE_AGGREGATE_DEADLINE_SECS", "120")?;

    let default_query = or_default("PULSE_DEFAULT_QUERY", "AI");
    let default_result_count = parse_u32("PULSE_DEFAULT_RESULT_COUNT", "10")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        instagram_base_url,
        search_base_url,
        request_timeout_secs,
        user_agent,
        search_max_attempts,
        instagram_max_attempts,
        network_backoff_base_secs,
        network_backoff_step_secs,
        rate_limit_min_wait_secs,
        rate_limit_jitter_secs,
        max_wait_secs,
        comment_concurrency,
        aggregate_deadline_secs,
        default_query,
        default_result_count,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
