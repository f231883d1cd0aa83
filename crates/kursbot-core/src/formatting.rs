//! User-visible text: HTML escaping, conversion lines, digest bodies.

use crate::domain::ConversionDirection;
use crate::weather::ForecastInterval;

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// One completed conversion, two decimals on both sides.
pub fn conversion_line(
    amount: f64,
    direction: ConversionDirection,
    factor: f64,
    local: &str,
) -> String {
    let foreign = direction.foreign_code();
    if direction.to_local() {
        format!("{amount:.2} {foreign} = {:.2} {local}", amount * factor)
    } else {
        format!("{amount:.2} {local} = {:.2} {foreign}", amount / factor)
    }
}

/// "1 USD = 12700.00 UZS" style lines, one per cached currency.
pub fn rate_lines(rates: &[(String, f64)], local: &str) -> String {
    rates
        .iter()
        .map(|(code, factor)| format!("1 {code} = {factor:.2} {local}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Daily currency digest body.
pub fn rate_digest(rates: &[(String, f64)], local: &str) -> String {
    format!("🔔 Daily exchange rates\n{}", rate_lines(rates, local))
}

/// Multi-day weather digest body, one line per sampled day.
pub fn weather_digest(samples: &[&ForecastInterval]) -> String {
    let lines = samples
        .iter()
        .map(|s| {
            format!(
                "{}: {:.0}°C, {}, wind {:.1} m/s",
                s.timestamp.format("%a %d %b"),
                s.temperature_c,
                escape_html(&s.condition),
                s.wind_speed_ms
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!("🌦 Daily forecast\n{lines}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(escape_html("<b> & \"q\""), "&lt;b&gt; &amp; &quot;q&quot;");
    }

    #[test]
    fn conversion_to_local_multiplies() {
        let line = conversion_line(10.0, ConversionDirection::UsdToLocal, 12_700.0, "UZS");
        assert_eq!(line, "10.00 USD = 127000.00 UZS");
    }

    #[test]
    fn conversion_from_local_divides() {
        let line = conversion_line(127_000.0, ConversionDirection::LocalToUsd, 12_700.0, "UZS");
        assert_eq!(line, "127000.00 UZS = 10.00 USD");
    }

    #[test]
    fn digest_lists_every_cached_currency() {
        let rates = vec![("USD".to_string(), 12_700.0), ("EUR".to_string(), 13_850.5)];
        let digest = rate_digest(&rates, "UZS");
        assert!(digest.contains("1 USD = 12700.00 UZS"));
        assert!(digest.contains("1 EUR = 13850.50 UZS"));
    }

    #[test]
    fn weather_digest_formats_day_lines() {
        let interval = ForecastInterval {
            timestamp: Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap(),
            temperature_c: 31.2,
            condition: "Clear".to_string(),
            wind_speed_ms: 3.42,
        };
        let digest = weather_digest(&[&interval]);
        assert!(digest.contains("Mon 15 Jun: 31°C, Clear, wind 3.4 m/s"));
    }
}
