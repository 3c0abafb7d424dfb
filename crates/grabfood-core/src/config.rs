use crate::app_config::AppConfig;
use crate::ConfigError;

pub const DEFAULT_PAGE_URL: &str = "https://food.grab.com/sg/en/";
pub const DEFAULT_SEARCH_URL: &str = "https://portal.grab.com/foodweb/v2/search";

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
/// Decoupled from the process environment so tests can drive it with a
/// plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    let log_level = or_default("GRABFOOD_LOG_LEVEL", "info");

    let page_url = or_default("GRABFOOD_PAGE_URL", DEFAULT_PAGE_URL);
    let search_url = or_default("GRABFOOD_SEARCH_URL", DEFAULT_SEARCH_URL);
    let location = lookup("GRABFOOD_LOCATION")
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty());

    let output_csv = PathBuf::from(or_default(
        "GRABFOOD_OUTPUT_CSV",
        "unique_restaurant_data.csv",
    ));
    let output_json_gz = PathBuf::from(or_default(
        "GRABFOOD_OUTPUT_JSON_GZ",
        "unique_restaurant_data.json.gz",
    ));

    let scroll_delay_ms = parse_u64("GRABFOOD_SCROLL_DELAY_MS", "2000")?;
    let scroll_max_rounds = parse_u32("GRABFOOD_SCROLL_MAX_ROUNDS", "50")?;
    if scroll_max_rounds == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "GRABFOOD_SCROLL_MAX_ROUNDS".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    let scroll_max_secs = parse_u64("GRABFOOD_SCROLL_MAX_SECS", "180")?;

    let cookie_timeout_secs = parse_u64("GRABFOOD_COOKIE_TIMEOUT_SECS", "10")?;
    let ready_timeout_secs = parse_u64("GRABFOOD_READY_TIMEOUT_SECS", "10")?;
    let submit_timeout_secs = parse_u64("GRABFOOD_SUBMIT_TIMEOUT_SECS", "15")?;
    let input_settle_ms = parse_u64("GRABFOOD_INPUT_SETTLE_MS", "2000")?;

    Ok(AppConfig {
        log_level,
        page_url,
        search_url,
        location,
        output_csv,
        output_json_gz,
        scroll_delay_ms,
        scroll_max_rounds,
        scroll_max_secs,
        cookie_timeout_secs,
        ready_timeout_secs,
        submit_timeout_secs,
        input_settle_ms,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
