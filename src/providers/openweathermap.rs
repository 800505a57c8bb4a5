use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;

use super::{CurrentWeatherProvider, HttpClient, Provider};
use crate::constants::OPENWEATHERMAP_API_BASE;
use crate::domain::{Location, ProviderId, WeatherSnapshot};
use crate::models::OwmCurrentResponse;

/// OpenWeatherMap current conditions. Keyed; queried by coordinates when known,
/// otherwise by place name.
pub struct OpenWeatherMap {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl OpenWeatherMap {
    pub fn new(http: HttpClient, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: OPENWEATHERMAP_API_BASE.to_string(),
        }
    }
}

impl Provider for OpenWeatherMap {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeatherMap
    }
}

#[async_trait]
impl CurrentWeatherProvider for OpenWeatherMap {
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot> {
        let url = format!("{}/weather", self.base_url);
        let mut query = vec![
            ("appid", self.api_key.clone()),
            ("units", "metric".to_string()),
        ];
        match location.coordinates {
            Some(c) => {
                query.push(("lat", c.latitude.to_string()));
                query.push(("lon", c.longitude.to_string()));
            }
            None => query.push(("q", location.name.clone())),
        }

        let response = self
            .http
            .get_json::<OwmCurrentResponse>(&url, &query)
            .await
            .context("OpenWeatherMap request failed")?;

        normalize_current(&location.name, response)
    }
}

/// `units=metric` already yields °C, m/s and hPa.
pub(crate) fn normalize_current(location: &str, response: OwmCurrentResponse) -> Result<WeatherSnapshot> {
    let timestamp = DateTime::from_timestamp(response.dt, 0)
        .ok_or_else(|| anyhow!("observation time {} out of range", response.dt))?;
    let description = response
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_default();

    Ok(WeatherSnapshot {
        location: location.to_string(),
        temperature_c: response.main.temp,
        humidity: response.main.humidity,
        pressure_hpa: response.main.pressure,
        description,
        wind_speed_ms: response.wind.speed,
        timestamp,
        source: ProviderId::OpenWeatherMap,
    })
}
