use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};

use super::{
    estimate_ice_cm, kph_to_ms, split_intraday, CurrentWeatherProvider, ForecastProvider,
    HttpClient, Provider,
};
use crate::constants::WEATHERAPI_API_BASE;
use crate::domain::{ForecastDay, Location, ProviderId, WeatherSnapshot};
use crate::models::{WeatherApiCurrentResponse, WeatherApiForecastResponse};

const HOUR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// WeatherAPI.com: keyed, last in the current-weather chain and the forecast
/// fallback behind Open-Meteo.
pub struct WeatherApi {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl WeatherApi {
    pub fn new(http: HttpClient, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: WEATHERAPI_API_BASE.to_string(),
        }
    }

    fn query_for(location: &Location) -> String {
        match location.coordinates {
            Some(c) => format!("{},{}", c.latitude, c.longitude),
            None => location.name.clone(),
        }
    }
}

impl Provider for WeatherApi {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }
}

#[async_trait]
impl CurrentWeatherProvider for WeatherApi {
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot> {
        let url = format!("{}/current.json", self.base_url);
        let query = [
            ("key", self.api_key.clone()),
            ("q", Self::query_for(location)),
        ];

        let response = self
            .http
            .get_json::<WeatherApiCurrentResponse>(&url, &query)
            .await
            .context("WeatherAPI current request failed")?;

        normalize_current(&location.name, response)
    }
}

#[async_trait]
impl ForecastProvider for WeatherApi {
    async fn forecast_day(&self, location: &Location, date: NaiveDate) -> Result<ForecastDay> {
        let url = format!("{}/forecast.json", self.base_url);
        let query = [
            ("key", self.api_key.clone()),
            ("q", Self::query_for(location)),
            ("dt", date.format("%Y-%m-%d").to_string()),
            ("days", "1".to_string()),
        ];

        let response = self
            .http
            .get_json::<WeatherApiForecastResponse>(&url, &query)
            .await
            .context("WeatherAPI forecast request failed")?;

        normalize_forecast(response, date)
    }
}

pub(crate) fn normalize_current(
    location: &str,
    response: WeatherApiCurrentResponse,
) -> Result<WeatherSnapshot> {
    let current = response.current;
    let timestamp = DateTime::from_timestamp(current.last_updated_epoch, 0)
        .ok_or_else(|| anyhow!("observation time {} out of range", current.last_updated_epoch))?;
    let location = if location.is_empty() {
        response.location.name
    } else {
        location.to_string()
    };

    Ok(WeatherSnapshot {
        location,
        temperature_c: current.temp_c,
        humidity: current.humidity,
        pressure_hpa: current.pressure_mb,
        description: current.condition.text,
        wind_speed_ms: kph_to_ms(current.wind_kph),
        timestamp,
        source: ProviderId::WeatherApi,
    })
}

pub(crate) fn normalize_forecast(
    response: WeatherApiForecastResponse,
    date: NaiveDate,
) -> Result<ForecastDay> {
    let wanted = date.format("%Y-%m-%d").to_string();
    let entry = response
        .forecast
        .forecastday
        .into_iter()
        .find(|day| day.date == wanted)
        .ok_or_else(|| anyhow!("WeatherAPI returned no forecast for {wanted}"))?;

    let condition = entry.day.condition.text;
    let lowered = condition.to_lowercase();
    let freezing = lowered.contains("freezing") || lowered.contains("ice pellets") || lowered.contains("sleet");

    let (morning_snowfall_cm, afternoon_snowfall_cm) = split_intraday(
        entry.hour.iter().map(|h| (h.time.as_str(), h.snow_cm)),
        date,
        HOUR_TIME_FORMAT,
    );
    let wind_gust_ms = entry
        .hour
        .iter()
        .filter_map(|h| h.gust_kph)
        .fold(None, |max: Option<f64>, gust| Some(max.map_or(gust, |m| m.max(gust))))
        .map(kph_to_ms);

    Ok(ForecastDay {
        date,
        temperature_c: entry.day.mintemp_c,
        precipitation_mm: entry.day.totalprecip_mm,
        snowfall_cm: entry.day.totalsnow_cm,
        ice_cm: estimate_ice_cm(entry.day.totalprecip_mm, Some(freezing)),
        wind_speed_ms: entry.day.maxwind_kph.map(kph_to_ms),
        wind_gust_ms,
        morning_snowfall_cm,
        afternoon_snowfall_cm,
        condition,
    })
}
