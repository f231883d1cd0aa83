use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, Result};

/// Typed configuration, loaded from the environment (with optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    // Transports / credentials
    pub bot_token: String,
    pub weather_api_key: Option<String>,

    // Currency
    pub local_currency: String,
    pub tracked_currencies: Vec<String>,

    // Background loops
    pub rate_refresh_interval: Duration,
    pub broadcast_hour: u32,
    pub broadcast_minute: u32,
    pub broadcast_pacing: Duration,
    pub broadcast_cooldown: Duration,

    // External I/O bounds
    pub http_timeout: Duration,

    // Durable storage
    pub subscribers_file: PathBuf,

    // Chat housekeeping
    pub message_window_limit: usize,

    // Liveness endpoint
    pub health_port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bot_token = env_str("BOT_TOKEN").unwrap_or_default();
        if bot_token.trim().is_empty() {
            return Err(Error::Config(
                "BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        // Weather is optional; without a key the weather features degrade to a
        // "not configured" reply instead of failing startup.
        let weather_api_key = env_str("WEATHER_API_KEY").and_then(non_empty);

        let local_currency = env_str("LOCAL_CURRENCY")
            .and_then(non_empty)
            .unwrap_or_else(|| "UZS".to_string())
            .to_uppercase();
        let tracked_currencies = parse_csv_upper(
            env_str("TRACKED_CURRENCIES").or_else(|| Some("USD,EUR".to_string())),
        );
        if tracked_currencies.is_empty() {
            return Err(Error::Config(
                "TRACKED_CURRENCIES must name at least one currency".to_string(),
            ));
        }

        let rate_refresh_interval =
            Duration::from_secs(env_u64("RATE_REFRESH_SECS").unwrap_or(600));
        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECS").unwrap_or(10));

        let broadcast_hour = env_u32("BROADCAST_HOUR").unwrap_or(9);
        let broadcast_minute = env_u32("BROADCAST_MINUTE").unwrap_or(0);
        validate_broadcast_time(broadcast_hour, broadcast_minute)?;
        let broadcast_pacing = Duration::from_millis(env_u64("BROADCAST_PACING_MS").unwrap_or(300));
        let broadcast_cooldown =
            Duration::from_secs(env_u64("BROADCAST_COOLDOWN_SECS").unwrap_or(3600));

        let subscribers_file = PathBuf::from(
            env_str("SUBSCRIBERS_FILE").unwrap_or_else(|| "subscribers.json".to_string()),
        );

        let message_window_limit = env_usize("MESSAGE_WINDOW_LIMIT").unwrap_or(5).max(1);

        // The hosting platform hands the liveness port down as PORT.
        let health_port = env_u16("PORT").unwrap_or(8080);

        Ok(Self {
            bot_token,
            weather_api_key,
            local_currency,
            tracked_currencies,
            rate_refresh_interval,
            broadcast_hour,
            broadcast_minute,
            broadcast_pacing,
            broadcast_cooldown,
            http_timeout,
            subscribers_file,
            message_window_limit,
            health_port,
        })
    }
}

fn validate_broadcast_time(hour: u32, minute: u32) -> Result<()> {
    if hour > 23 {
        return Err(Error::Config(format!("BROADCAST_HOUR out of range: {hour}")));
    }
    if minute > 59 {
        return Err(Error::Config(format!(
            "BROADCAST_MINUTE out of range: {minute}"
        )));
    }
    Ok(())
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u32(key: &str) -> Option<u32> {
    env_str(key).and_then(|s| s.trim().parse::<u32>().ok())
}

fn env_u16(key: &str) -> Option<u16> {
    env_str(key).and_then(|s| s.trim().parse::<u16>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv_upper(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_time_bounds() {
        assert!(validate_broadcast_time(0, 0).is_ok());
        assert!(validate_broadcast_time(23, 59).is_ok());
        assert!(validate_broadcast_time(24, 0).is_err());
        assert!(validate_broadcast_time(9, 60).is_err());
    }

    #[test]
    fn csv_currencies_are_uppercased_and_trimmed() {
        let parsed = parse_csv_upper(Some(" usd, eur ,,rub".to_string()));
        assert_eq!(parsed, vec!["USD", "EUR", "RUB"]);
    }
}
