//! Canonical records produced by the aggregation core.
//!
//! Every provider-specific shape is normalized into these types before it
//! leaves an adapter. Internal units are SI-consistent: °C, m/s, hPa, mm of
//! precipitation and cm of snow/ice depth.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{
    FAIR_COVERAGE_DENSITY, GOOD_COVERAGE_DENSITY, HIGH_RISK_CUTOFF, MODERATE_RISK_CUTOFF,
};

// ============================================================================
// Locations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A requested place: the caller's text plus coordinates when they are known
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub coordinates: Option<Coordinates>,
}

// ============================================================================
// Current weather
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    OpenMeteo,
    OpenWeatherMap,
    WeatherApi,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenMeteo => "open-meteo",
            ProviderId::OpenWeatherMap => "openweathermap",
            ProviderId::WeatherApi => "weatherapi",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "open-meteo" | "openmeteo" => Some(ProviderId::OpenMeteo),
            "openweathermap" | "owm" => Some(ProviderId::OpenWeatherMap),
            "weatherapi" | "weather-api" => Some(ProviderId::WeatherApi),
            _ => None,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which providers a resolution may use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderHint {
    #[default]
    Auto,
    Only(ProviderId),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub temperature_c: f64,
    pub humidity: f64,
    pub pressure_hpa: f64,
    pub description: String,
    pub wind_speed_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub source: ProviderId,
}

impl WeatherSnapshot {
    /// Rejects payloads that deserialized but cannot describe real weather.
    pub fn validate(&self) -> Result<(), String> {
        if !self.temperature_c.is_finite() {
            return Err("temperature is not a finite number".to_string());
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(format!("humidity {} is outside 0-100", self.humidity));
        }
        if !self.pressure_hpa.is_finite() || self.pressure_hpa <= 0.0 {
            return Err(format!("pressure {} hPa is not plausible", self.pressure_hpa));
        }
        if !self.wind_speed_ms.is_finite() || self.wind_speed_ms < 0.0 {
            return Err(format!("wind speed {} m/s is not plausible", self.wind_speed_ms));
        }
        Ok(())
    }
}

// ============================================================================
// Alerts
// ============================================================================

/// Four-level ordinal severity shared by every alert source
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
    Extreme,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
            Severity::Extreme => "Extreme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AlertSourceId {
    Nws,
    Traffic511,
}

impl fmt::Display for AlertSourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertSourceId::Nws => f.write_str("NWS"),
            AlertSourceId::Traffic511 => f.write_str("511"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedAlert {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub severity: Severity,
    pub title: String,
    pub body: String,
    pub issue_time: Option<DateTime<Utc>>,
    pub expires_time: Option<DateTime<Utc>>,
    pub source: AlertSourceId,
}

impl UnifiedAlert {
    /// An alert without an expiry never expires by this rule.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_time.map_or(true, |expires| expires > now)
    }
}

// ============================================================================
// Districts
// ============================================================================

/// Snow-day decision thresholds, all depths in centimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub full_closing_snowfall_cm: f64,
    pub delay_snowfall_cm: f64,
    pub ice_cm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct District {
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub zip_codes: Vec<String>,
    /// Towns served, used for contains-matching free-form identifiers
    pub locations: Vec<String>,
    pub thresholds: Thresholds,
    pub centroid: Coordinates,
}

/// Outcome of a district lookup. Lookups never fail: an unknown identifier
/// yields a synthetic district carrying regional thresholds.
#[derive(Debug, Clone, PartialEq)]
pub enum DistrictMatch {
    Matched(District),
    Defaulted(District),
}

impl DistrictMatch {
    pub fn district(&self) -> &District {
        match self {
            DistrictMatch::Matched(district) | DistrictMatch::Defaulted(district) => district,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, DistrictMatch::Defaulted(_))
    }
}

// ============================================================================
// Forecasts and predictions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    /// Daily low, the temperature buses and walkers actually face
    pub temperature_c: Option<f64>,
    pub precipitation_mm: Option<f64>,
    pub snowfall_cm: Option<f64>,
    pub ice_cm: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub wind_gust_ms: Option<f64>,
    /// Snowfall between 06:00 and 12:00 local time
    pub morning_snowfall_cm: Option<f64>,
    /// Snowfall between 12:00 and 18:00 local time
    pub afternoon_snowfall_cm: Option<f64>,
    pub condition: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    None,
    Low,
    Moderate,
    High,
}

impl RiskCategory {
    pub fn from_probability(probability: u8) -> Self {
        if probability >= HIGH_RISK_CUTOFF {
            RiskCategory::High
        } else if probability >= MODERATE_RISK_CUTOFF {
            RiskCategory::Moderate
        } else if probability > 0 {
            RiskCategory::Low
        } else {
            RiskCategory::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::None => "none",
            RiskCategory::Low => "low",
            RiskCategory::Moderate => "moderate",
            RiskCategory::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Probability {
    pub value: u8,
    pub category: RiskCategory,
}

impl Probability {
    pub fn new(value: u8) -> Self {
        let value = value.min(100);
        Self {
            value,
            category: RiskCategory::from_probability(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub district_id: String,
    pub district_name: String,
    pub prediction_date: DateTime<Utc>,
    pub predicted_for: NaiveDate,
    pub full_closing: Probability,
    pub delay: Probability,
    pub early_dismissal: Probability,
    pub confidence: u8,
    pub factors: Vec<String>,
    pub forecast: ForecastDay,
    /// Present on single-day predictions only
    pub thresholds: Option<Thresholds>,
    pub used_default_thresholds: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPrediction {
    pub district_name: String,
    pub predictions: Vec<PredictionResult>,
}

// ============================================================================
// Plows
// ============================================================================

/// A plow position as reported, before coordinate validation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlowSample {
    pub id: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub route: Option<String>,
    pub direction: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlowLocation {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub route: Option<String>,
    pub direction: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyLevel {
    None,
    Poor,
    Fair,
    Good,
}

impl SafetyLevel {
    pub fn from_density(plows_per_10km: f64) -> Self {
        if plows_per_10km >= GOOD_COVERAGE_DENSITY {
            SafetyLevel::Good
        } else if plows_per_10km >= FAIR_COVERAGE_DENSITY {
            SafetyLevel::Fair
        } else if plows_per_10km > 0.0 {
            SafetyLevel::Poor
        } else {
            SafetyLevel::None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SafetyLevel::None => "no coverage",
            SafetyLevel::Poor => "poor",
            SafetyLevel::Fair => "fair",
            SafetyLevel::Good => "good",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyRating {
    pub route: String,
    pub route_length_km: Option<f64>,
    pub plows_per_10km: f64,
    pub level: SafetyLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub plow_count: usize,
    pub centroid: Option<Coordinates>,
    pub spread_km: f64,
    pub largest_gap_km: f64,
    pub mean_spacing_km: f64,
    /// Length the density was computed against
    pub coverage_length_km: f64,
    pub length_estimated: bool,
}

// ============================================================================
// Road conditions
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadCategory {
    Incident,
    Closure,
    Sensor,
    Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoadRecord {
    pub id: String,
    pub category: RoadCategory,
    pub road: String,
    pub description: String,
    pub coordinates: Option<Coordinates>,
    pub updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RoadReport {
    pub incidents: Vec<RoadRecord>,
    pub closures: Vec<RoadRecord>,
    pub sensors: Vec<RoadRecord>,
    pub conditions: Vec<RoadRecord>,
}
