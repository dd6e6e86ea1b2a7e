use chrono::FixedOffset;

use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
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
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so tests can drive it from a
/// `HashMap` without `set_var`/`remove_var`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("TUTORDESK_ENV", "development"))?;

    let api_key_hash_salt = match lookup("TUTORDESK_API_KEY_HASH_SALT") {
        Ok(salt) => Some(salt),
        Err(_) if env == Environment::Production => {
            return Err(ConfigError::MissingEnvVar(
                "TUTORDESK_API_KEY_HASH_SALT".to_string(),
            ));
        }
        Err(_) => None,
    };

    let bind_addr = or_default("TUTORDESK_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("TUTORDESK_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("TUTORDESK_LOG_LEVEL", "info");
    let roster_path = PathBuf::from(or_default("TUTORDESK_ROSTER_PATH", "./config/roster.yaml"));

    let db_max_connections = parse_u32("TUTORDESK_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("TUTORDESK_DB_MIN_CONNECTIONS", "1")?;
    if db_min_connections > db_max_connections {
        return Err(invalid(
            "TUTORDESK_DB_MIN_CONNECTIONS",
            format!("must not exceed TUTORDESK_DB_MAX_CONNECTIONS ({db_max_connections})"),
        ));
    }
    let db_acquire_timeout_secs = parse_u64("TUTORDESK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let calendar_offset = parse_calendar_offset(&or_default(
        "TUTORDESK_CALENDAR_UTC_OFFSET",
        "+03:00",
    ))?;
    let compliance_cron = or_default("TUTORDESK_COMPLIANCE_CRON", "0 0 0 * * Sat");
    if compliance_cron.split_whitespace().count() != 6 {
        return Err(invalid(
            "TUTORDESK_COMPLIANCE_CRON",
            "expected six fields: sec min hour day-of-month month day-of-week".to_string(),
        ));
    }
    let rate_limit_per_minute = parse_usize("TUTORDESK_RATE_LIMIT_PER_MINUTE", "120")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        roster_path,
        api_key_hash_salt,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        calendar_offset,
        compliance_cron,
        rate_limit_per_minute,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "TUTORDESK_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

/// Parse a `+HH:MM` / `-HH:MM` offset into the calendar used for week windows.
fn parse_calendar_offset(s: &str) -> Result<FixedOffset, ConfigError> {
    s.trim()
        .parse::<FixedOffset>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: "TUTORDESK_CALENDAR_UTC_OFFSET".to_string(),
            reason: format!("'{s}' is not a UTC offset like +03:00 ({e})"),
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
