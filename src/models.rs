use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// ============================================================================
// Open-Meteo API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OpenMeteoCurrentResponse {
    pub current: OpenMeteoCurrent,
}

#[derive(Debug, Deserialize)]
pub struct OpenMeteoCurrent {
    /// ISO 8601 without offset, in the timezone requested (UTC)
    pub time: String,
    #[serde(rename = "temperature_2m")]
    pub temperature: f64,
    #[serde(rename = "relative_humidity_2m")]
    pub relative_humidity: f64,
    pub surface_pressure: f64,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: f64,
    pub weather_code: i32,
}

#[derive(Debug, Deserialize)]
pub struct OpenMeteoForecastResponse {
    pub daily: DailyData,
    #[serde(default)]
    pub hourly: Option<HourlyData>,
}

#[derive(Debug, Deserialize)]
pub struct DailyData {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m_min", default)]
    pub temperature_min: Vec<Option<f64>>,
    #[serde(rename = "weather_code", default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(rename = "wind_speed_10m_max", default)]
    pub wind_speed_max: Vec<Option<f64>>,
    #[serde(rename = "wind_gusts_10m_max", default)]
    pub wind_gusts_max: Vec<Option<f64>>,
    #[serde(rename = "precipitation_sum", default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(rename = "snowfall_sum", default)]
    pub snowfall_sum: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct HourlyData {
    /// "YYYY-MM-DDTHH:MM" in the location's local time
    pub time: Vec<String>,
    #[serde(default)]
    pub snowfall: Vec<Option<f64>>,
}

// ============================================================================
// OpenWeatherMap API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct OwmCurrentResponse {
    pub name: String,
    pub dt: i64,
    pub main: OwmMain,
    pub wind: OwmWind,
    #[serde(default)]
    pub weather: Vec<OwmWeather>,
}

#[derive(Debug, Deserialize)]
pub struct OwmMain {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwmWind {
    pub speed: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwmWeather {
    pub description: String,
}

// ============================================================================
// WeatherAPI.com Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WeatherApiCurrentResponse {
    pub location: WeatherApiLocation,
    pub current: WeatherApiCurrent,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiLocation {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiCurrent {
    pub last_updated_epoch: i64,
    pub temp_c: f64,
    pub humidity: f64,
    pub pressure_mb: f64,
    pub wind_kph: f64,
    pub condition: WeatherApiCondition,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiCondition {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiForecastResponse {
    pub forecast: WeatherApiForecast,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiForecast {
    pub forecastday: Vec<WeatherApiForecastDay>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiForecastDay {
    /// "YYYY-MM-DD"
    pub date: String,
    pub day: WeatherApiDay,
    #[serde(default)]
    pub hour: Vec<WeatherApiHour>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiDay {
    pub mintemp_c: Option<f64>,
    pub totalprecip_mm: Option<f64>,
    pub totalsnow_cm: Option<f64>,
    pub maxwind_kph: Option<f64>,
    pub condition: WeatherApiCondition,
}

#[derive(Debug, Deserialize)]
pub struct WeatherApiHour {
    /// "YYYY-MM-DD HH:MM" local time
    pub time: String,
    pub snow_cm: Option<f64>,
    pub gust_kph: Option<f64>,
}

// ============================================================================
// National Weather Service API Models
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AlertResponse {
    pub features: Vec<AlertFeature>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFeature {
    pub properties: AlertProperties,
}

#[derive(Debug, Deserialize)]
pub struct AlertProperties {
    pub id: String,
    pub event: String,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub severity: String,
    #[serde(rename = "areaDesc")]
    pub area_desc: String,
    pub sent: Option<String>,
    pub effective: Option<String>,
    pub expires: Option<String>,
    pub ends: Option<String>,
}

// ============================================================================
// 511 Traveler Information Models
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrafficEvent {
    #[serde(rename = "ID")]
    pub id: String,
    pub event_type: String,
    #[serde(default)]
    pub event_sub_type: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
    pub roadway_name: String,
    #[serde(default)]
    pub direction_of_travel: Option<String>,
    pub description: String,
    /// Unix seconds
    #[serde(default)]
    pub reported: Option<i64>,
    #[serde(default)]
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub planned_end_date: Option<i64>,
    #[serde(default)]
    pub is_full_closure: bool,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrafficRoadCondition {
    #[serde(rename = "ID")]
    pub id: String,
    pub roadway_name: String,
    #[serde(default)]
    pub location_description: Option<String>,
    pub primary_condition: String,
    #[serde(default)]
    pub secondary_conditions: Vec<String>,
    #[serde(default)]
    pub last_updated: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrafficWeatherStation {
    #[serde(rename = "ID")]
    pub id: String,
    pub station_name: String,
    #[serde(default)]
    pub air_temperature: Option<String>,
    #[serde(default)]
    pub surface_temperature: Option<String>,
    #[serde(default)]
    pub surface_status: Option<String>,
    #[serde(default)]
    pub last_updated: Option<i64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

// ============================================================================
// MCP Tool Request Models
// ============================================================================

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetCurrentWeatherRequest {
    /// Town name (e.g. "Burlington") or "lat,lon"
    pub location: String,
    /// "auto" (default) or one of "open-meteo", "openweathermap", "weatherapi"
    pub provider: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetAlertsRequest {
    pub location: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct PredictSnowDayRequest {
    /// Zip code, district name, district code, or town
    pub district: String,
    /// Target date as YYYY-MM-DD; defaults to tomorrow
    pub date: Option<String>,
    /// Optional plow positions to pair a road-safety rating with the prediction
    pub plows: Option<Vec<PlowSampleInput>>,
    pub route: Option<String>,
    pub route_length_km: Option<f64>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct PredictSnowWeekRequest {
    pub district: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct RatePlowCoverageRequest {
    pub route: String,
    pub route_length_km: Option<f64>,
    pub plows: Vec<PlowSampleInput>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct PlowSampleInput {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub route: Option<String>,
    pub direction: Option<String>,
    /// RFC 3339 timestamp
    pub timestamp: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct GetRoadConditionsRequest {
    pub location: String,
}
