//! Provider adapters.
//!
//! Each adapter maps one external source onto the canonical records in
//! `crate::domain`. Adapters own unit conversion and nothing else: ordering,
//! fallback and timeouts belong to the resolver and fusion layers.

pub mod nws;
pub mod open_meteo;
pub mod openweathermap;
pub mod traffic511;
pub mod weatherapi;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

use crate::constants::USER_AGENT;
use crate::domain::{
    AlertSourceId, ForecastDay, Location, ProviderId, RoadRecord, UnifiedAlert, WeatherSnapshot,
};

pub use nws::NwsAlerts;
pub use open_meteo::OpenMeteo;
pub use openweathermap::OpenWeatherMap;
pub use traffic511::Traffic511;
pub use weatherapi::WeatherApi;

/// Common identity of every weather provider in a fallback chain
pub trait Provider: Send + Sync {
    fn id(&self) -> ProviderId;
}

#[async_trait]
pub trait CurrentWeatherProvider: Provider {
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot>;
}

#[async_trait]
pub trait ForecastProvider: Provider {
    async fn forecast_day(&self, location: &Location, date: NaiveDate) -> Result<ForecastDay>;
}

#[async_trait]
pub trait AlertSource: Send + Sync {
    fn id(&self) -> AlertSourceId;

    async fn alerts(&self, location: &Location) -> Result<Vec<UnifiedAlert>>;
}

/// Calls of a traveler-information feed. Each call is independent so callers
/// can issue them concurrently.
#[async_trait]
pub trait TrafficFeed: Send + Sync {
    /// Incidents and closures near `location`, tagged with their category.
    /// Both come from a single upstream request.
    async fn events(&self, location: &Location) -> Result<Vec<RoadRecord>>;
    async fn sensors(&self, location: &Location) -> Result<Vec<RoadRecord>>;
    async fn conditions(&self, location: &Location) -> Result<Vec<RoadRecord>>;
}

/// Shared HTTP client used by every adapter
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    /// Makes an HTTP GET request and deserializes the JSON response
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Request failed with status: {}", response.status());
        }

        let data = response.json::<T>().await?;
        Ok(data)
    }
}

pub(crate) fn kph_to_ms(kph: f64) -> f64 {
    kph / 3.6
}

/// Freezing precipitation accretes roughly a tenth of its liquid depth as
/// ice. `None` when the weather type itself is unknown.
pub(crate) fn estimate_ice_cm(precipitation_mm: Option<f64>, freezing: Option<bool>) -> Option<f64> {
    match (precipitation_mm, freezing) {
        (_, Some(false)) => Some(0.0),
        (Some(mm), Some(true)) => Some(mm.max(0.0) / 10.0),
        _ => None,
    }
}

/// Splits hourly snowfall on `date` into morning (06-12) and afternoon
/// (12-18) totals. Both are `None` when no hour of that day carried a value.
pub(crate) fn split_intraday<'a, I>(hours: I, date: NaiveDate, format: &str) -> (Option<f64>, Option<f64>)
where
    I: IntoIterator<Item = (&'a str, Option<f64>)>,
{
    let mut morning: Option<f64> = None;
    let mut afternoon: Option<f64> = None;

    for (time, value) in hours {
        let (Ok(at), Some(cm)) = (NaiveDateTime::parse_from_str(time, format), value) else {
            continue;
        };
        if at.date() != date {
            continue;
        }
        match at.hour() {
            6..=11 => *morning.get_or_insert(0.0) += cm,
            12..=17 => *afternoon.get_or_insert(0.0) += cm,
            _ => {}
        }
    }

    (morning, afternoon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intraday_split_buckets_by_hour() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let hours = vec![
            ("2025-01-15T05:00", Some(3.0)),
            ("2025-01-15T07:00", Some(0.5)),
            ("2025-01-15T11:00", Some(0.5)),
            ("2025-01-15T13:00", Some(1.5)),
            ("2025-01-15T17:00", Some(2.0)),
            ("2025-01-15T19:00", Some(4.0)),
            ("2025-01-16T08:00", Some(9.0)),
        ];
        let (morning, afternoon) = split_intraday(hours, date, "%Y-%m-%dT%H:%M");
        assert_eq!(morning, Some(1.0));
        assert_eq!(afternoon, Some(3.5));
    }

    #[test]
    fn intraday_split_without_values_is_unknown() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let hours = vec![("2025-01-15T08:00", None), ("garbage", Some(1.0))];
        assert_eq!(split_intraday(hours, date, "%Y-%m-%dT%H:%M"), (None, None));
    }

    #[test]
    fn ice_estimate_depends_on_precipitation_type() {
        assert_eq!(estimate_ice_cm(Some(12.0), Some(false)), Some(0.0));
        assert_eq!(estimate_ice_cm(Some(12.0), Some(true)), Some(1.2));
        assert_eq!(estimate_ice_cm(None, Some(true)), None);
        assert_eq!(estimate_ice_cm(Some(5.0), None), None);
    }
}
