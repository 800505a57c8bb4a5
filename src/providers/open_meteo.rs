//! Open-Meteo: free, keyless, first in both fallback chains.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use super::{
    estimate_ice_cm, split_intraday, CurrentWeatherProvider, ForecastProvider, HttpClient,
    Provider,
};
use crate::constants::OPEN_METEO_API_BASE;
use crate::domain::{Coordinates, ForecastDay, Location, ProviderId, WeatherSnapshot};
use crate::models::{OpenMeteoCurrentResponse, OpenMeteoForecastResponse};

const HOURLY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

pub struct OpenMeteo {
    http: HttpClient,
    base_url: String,
}

impl OpenMeteo {
    pub fn new(http: HttpClient) -> Self {
        Self::with_base_url(http, OPEN_METEO_API_BASE.to_string())
    }

    pub fn with_base_url(http: HttpClient, base_url: String) -> Self {
        Self { http, base_url }
    }

    fn coordinates(location: &Location) -> Result<Coordinates> {
        location
            .coordinates
            .ok_or_else(|| anyhow!("no coordinates known for '{}'", location.name))
    }
}

impl Provider for OpenMeteo {
    fn id(&self) -> ProviderId {
        ProviderId::OpenMeteo
    }
}

#[async_trait]
impl CurrentWeatherProvider for OpenMeteo {
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot> {
        let coordinates = Self::coordinates(location)?;
        let url = format!("{}/forecast", self.base_url);
        let query = [
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            (
                "current",
                "temperature_2m,relative_humidity_2m,surface_pressure,wind_speed_10m,weather_code"
                    .to_string(),
            ),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", "UTC".to_string()),
        ];

        let response = self
            .http
            .get_json::<OpenMeteoCurrentResponse>(&url, &query)
            .await
            .context("Open-Meteo current conditions request failed")?;

        normalize_current(&location.name, response)
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteo {
    async fn forecast_day(&self, location: &Location, date: NaiveDate) -> Result<ForecastDay> {
        let coordinates = Self::coordinates(location)?;
        let url = format!("{}/forecast", self.base_url);
        let day = date.format("%Y-%m-%d").to_string();
        let query = [
            ("latitude", coordinates.latitude.to_string()),
            ("longitude", coordinates.longitude.to_string()),
            (
                "daily",
                "temperature_2m_min,weather_code,wind_speed_10m_max,wind_gusts_10m_max,precipitation_sum,snowfall_sum"
                    .to_string(),
            ),
            ("hourly", "snowfall".to_string()),
            ("wind_speed_unit", "ms".to_string()),
            ("timezone", "auto".to_string()),
            ("start_date", day.clone()),
            ("end_date", day),
        ];

        let response = self
            .http
            .get_json::<OpenMeteoForecastResponse>(&url, &query)
            .await
            .context("Open-Meteo forecast request failed")?;

        normalize_forecast(response, date)
    }
}

pub(crate) fn normalize_current(
    location: &str,
    response: OpenMeteoCurrentResponse,
) -> Result<WeatherSnapshot> {
    let current = response.current;
    let timestamp = NaiveDateTime::parse_from_str(&current.time, HOURLY_TIME_FORMAT)
        .with_context(|| format!("unparseable observation time '{}'", current.time))?
        .and_utc();

    Ok(WeatherSnapshot {
        location: location.to_string(),
        temperature_c: current.temperature,
        humidity: current.relative_humidity,
        pressure_hpa: current.surface_pressure,
        description: weather_code_to_description(current.weather_code).to_string(),
        wind_speed_ms: current.wind_speed,
        timestamp,
        source: ProviderId::OpenMeteo,
    })
}

pub(crate) fn normalize_forecast(
    response: OpenMeteoForecastResponse,
    date: NaiveDate,
) -> Result<ForecastDay> {
    let daily = response.daily;
    let wanted = date.format("%Y-%m-%d").to_string();
    let i = daily
        .time
        .iter()
        .position(|day| *day == wanted)
        .ok_or_else(|| anyhow!("Open-Meteo returned no daily entry for {wanted}"))?;

    let pick = |values: &Vec<Option<f64>>| values.get(i).copied().flatten();
    let code = daily.weather_code.get(i).copied().flatten();
    let precipitation_mm = pick(&daily.precipitation_sum);

    let (morning_snowfall_cm, afternoon_snowfall_cm) = match &response.hourly {
        Some(hourly) => split_intraday(
            hourly
                .time
                .iter()
                .map(String::as_str)
                .zip(hourly.snowfall.iter().copied()),
            date,
            HOURLY_TIME_FORMAT,
        ),
        None => (None, None),
    };

    Ok(ForecastDay {
        date,
        temperature_c: pick(&daily.temperature_min),
        precipitation_mm,
        snowfall_cm: pick(&daily.snowfall_sum),
        ice_cm: estimate_ice_cm(precipitation_mm, code.map(is_freezing_code)),
        wind_speed_ms: pick(&daily.wind_speed_max),
        wind_gust_ms: pick(&daily.wind_gusts_max),
        morning_snowfall_cm,
        afternoon_snowfall_cm,
        condition: code
            .map(weather_code_to_description)
            .unwrap_or("Unknown")
            .to_string(),
    })
}

fn is_freezing_code(code: i32) -> bool {
    matches!(code, 56 | 57 | 66 | 67)
}

/// Converts WMO weather code to human-readable description
fn weather_code_to_description(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Foggy",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 => "Snow",
        75 => "Heavy snow",
        77 => "Snow grains",
        80 | 81 | 82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}
