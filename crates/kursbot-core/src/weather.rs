//! Port for the upstream weather collaborator plus the digest sampling rule.

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};

use crate::{domain::Coordinate, Result};

/// How many days a weather digest covers.
pub const FORECAST_DAYS: usize = 3;

/// One interval forecast as delivered by the provider, in chronological order.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastInterval {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: String,
    pub wind_speed_ms: f64,
}

#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch_forecast(&self, coordinate: Coordinate) -> Result<Vec<ForecastInterval>>;
}

/// Pick one representative interval per calendar day, preferring the sample
/// closest to midday, keeping day order, up to `max_days` days.
pub fn daily_samples(intervals: &[ForecastInterval], max_days: usize) -> Vec<&ForecastInterval> {
    let mut days: Vec<(chrono::NaiveDate, &ForecastInterval)> = Vec::new();

    for interval in intervals {
        let date = interval.timestamp.date_naive();
        match days.iter_mut().find(|(d, _)| *d == date) {
            Some((_, best)) => {
                if midday_distance(interval) < midday_distance(best) {
                    *best = interval;
                }
            }
            None => days.push((date, interval)),
        }
    }

    days.sort_by_key(|(d, _)| *d);
    days.into_iter().take(max_days).map(|(_, i)| i).collect()
}

fn midday_distance(interval: &ForecastInterval) -> u32 {
    let minutes = interval.timestamp.hour() * 60 + interval.timestamp.minute();
    minutes.abs_diff(12 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn interval(day: u32, hour: u32, temp: f64) -> ForecastInterval {
        ForecastInterval {
            timestamp: Utc.with_ymd_and_hms(2026, 6, day, hour, 0, 0).unwrap(),
            temperature_c: temp,
            condition: "Clear".to_string(),
            wind_speed_ms: 3.0,
        }
    }

    #[test]
    fn picks_the_sample_closest_to_midday_per_day() {
        let intervals = vec![
            interval(15, 0, 21.0),
            interval(15, 9, 26.0),
            interval(15, 12, 31.0),
            interval(15, 21, 24.0),
            interval(16, 3, 20.0),
            interval(16, 15, 29.0),
        ];

        let samples = daily_samples(&intervals, 5);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].temperature_c, 31.0);
        assert_eq!(samples[1].temperature_c, 29.0);
    }

    #[test]
    fn caps_the_number_of_days() {
        let intervals = vec![
            interval(15, 12, 30.0),
            interval(16, 12, 31.0),
            interval(17, 12, 32.0),
            interval(18, 12, 33.0),
        ];
        let samples = daily_samples(&intervals, 3);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[2].temperature_c, 32.0);
    }

    #[test]
    fn empty_forecast_yields_no_samples() {
        assert!(daily_samples(&[], 3).is_empty());
    }
}
