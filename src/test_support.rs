//! Hand-written doubles shared by the unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::districts::DistrictStore;
use crate::domain::{
    AlertSourceId, District, ForecastDay, Location, PredictionResult, ProviderId, RoadCategory,
    RoadRecord, Severity, UnifiedAlert, WeatherSnapshot,
};
use crate::persistence::{MemoryStore, RecordStore, Recorder};
use crate::providers::{AlertSource, CurrentWeatherProvider, ForecastProvider, Provider, TrafficFeed};

/// Far beyond any timeout used in tests; under a paused clock it costs nothing.
const HANG: Duration = Duration::from_secs(3600);

// ============================================================================
// Fixtures
// ============================================================================

/// Fixed reference instant plus `hours`
pub fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 15, 0, 0, 0).unwrap() + ChronoDuration::hours(hours)
}

pub fn sample_snapshot() -> WeatherSnapshot {
    WeatherSnapshot {
        location: "Burlington".to_string(),
        temperature_c: -5.0,
        humidity: 80.0,
        pressure_hpa: 1013.25,
        description: "Light snow".to_string(),
        wind_speed_ms: 4.0,
        timestamp: at(0),
        source: ProviderId::OpenMeteo,
    }
}

/// Complete forecast with snow split evenly across the school day
pub fn forecast_day(date: NaiveDate, snowfall_cm: f64) -> ForecastDay {
    ForecastDay {
        date,
        temperature_c: Some(-5.0),
        precipitation_mm: Some(snowfall_cm),
        snowfall_cm: Some(snowfall_cm),
        ice_cm: Some(0.0),
        wind_speed_ms: Some(3.0),
        wind_gust_ms: Some(5.0),
        morning_snowfall_cm: Some(snowfall_cm / 2.0),
        afternoon_snowfall_cm: Some(snowfall_cm / 2.0),
        condition: "Snow".to_string(),
    }
}

pub fn alert(
    source: AlertSourceId,
    id: &str,
    alert_type: &str,
    severity: Severity,
    issue_time: Option<DateTime<Utc>>,
) -> UnifiedAlert {
    UnifiedAlert {
        id: id.to_string(),
        name: alert_type.to_string(),
        alert_type: alert_type.to_string(),
        severity,
        title: format!("{alert_type} ({id})"),
        body: String::new(),
        issue_time,
        expires_time: None,
        source,
    }
}

pub fn recorder() -> Recorder {
    Recorder::new(Arc::new(MemoryStore::new()))
}

// ============================================================================
// Generic provider
// ============================================================================

enum Behaviour {
    Ok(f64),
    Slow(Duration),
    Failing(&'static str),
}

/// Provider yielding a bare number, for exercising the fallback runner
pub struct StaticProvider {
    id: ProviderId,
    behaviour: Behaviour,
}

impl StaticProvider {
    pub fn ok(id: ProviderId, value: f64) -> Self {
        Self { id, behaviour: Behaviour::Ok(value) }
    }

    pub fn slow(id: ProviderId, delay: Duration) -> Self {
        Self { id, behaviour: Behaviour::Slow(delay) }
    }

    pub fn failing(id: ProviderId, reason: &'static str) -> Self {
        Self { id, behaviour: Behaviour::Failing(reason) }
    }

    pub fn value(&self) -> Result<f64> {
        match self.behaviour {
            Behaviour::Ok(value) => Ok(value),
            Behaviour::Slow(_) => Ok(0.0),
            Behaviour::Failing(reason) => Err(anyhow!(reason)),
        }
    }

    pub async fn value_after_delay(&self) -> Result<f64> {
        if let Behaviour::Slow(delay) = self.behaviour {
            tokio::time::sleep(delay).await;
        }
        self.value()
    }
}

impl Provider for StaticProvider {
    fn id(&self) -> ProviderId {
        self.id
    }
}

// ============================================================================
// Weather doubles
// ============================================================================

#[derive(Clone, Copy)]
enum CurrentMode {
    Healthy,
    Failing,
    Hanging,
    Invalid,
    Mislabelled,
}

pub struct MockCurrent {
    id: ProviderId,
    mode: CurrentMode,
}

impl MockCurrent {
    pub fn healthy(id: ProviderId) -> Self {
        Self { id, mode: CurrentMode::Healthy }
    }

    pub fn failing(id: ProviderId) -> Self {
        Self { id, mode: CurrentMode::Failing }
    }

    pub fn hanging(id: ProviderId) -> Self {
        Self { id, mode: CurrentMode::Hanging }
    }

    /// Deserializes fine but reports humidity above 100%.
    pub fn invalid(id: ProviderId) -> Self {
        Self { id, mode: CurrentMode::Invalid }
    }

    /// Answers with a snapshot claiming to come from some other provider.
    pub fn mislabelled(id: ProviderId) -> Self {
        Self { id, mode: CurrentMode::Mislabelled }
    }
}

impl Provider for MockCurrent {
    fn id(&self) -> ProviderId {
        self.id
    }
}

#[async_trait]
impl CurrentWeatherProvider for MockCurrent {
    async fn current(&self, location: &Location) -> Result<WeatherSnapshot> {
        let snapshot = WeatherSnapshot {
            location: location.name.clone(),
            source: self.id,
            ..sample_snapshot()
        };
        match self.mode {
            CurrentMode::Healthy => Ok(snapshot),
            CurrentMode::Failing => Err(anyhow!("{} returned status 503", self.id)),
            CurrentMode::Hanging => {
                tokio::time::sleep(HANG).await;
                Ok(snapshot)
            }
            CurrentMode::Invalid => Ok(WeatherSnapshot { humidity: 140.0, ..snapshot }),
            CurrentMode::Mislabelled => {
                let other = if self.id == ProviderId::OpenMeteo {
                    ProviderId::WeatherApi
                } else {
                    ProviderId::OpenMeteo
                };
                Ok(WeatherSnapshot { source: other, ..snapshot })
            }
        }
    }
}

/// Serves fixed forecast days; any other date is an error.
pub struct MockForecast {
    id: ProviderId,
    days: Vec<ForecastDay>,
    delays: HashMap<NaiveDate, Duration>,
}

impl MockForecast {
    pub fn failing(id: ProviderId) -> Self {
        Self::with_days(id, Vec::new())
    }

    pub fn with_days(id: ProviderId, days: Vec<ForecastDay>) -> Self {
        Self {
            id,
            days,
            delays: HashMap::new(),
        }
    }

    pub fn with_delays(mut self, delays: HashMap<NaiveDate, Duration>) -> Self {
        self.delays = delays;
        self
    }
}

impl Provider for MockForecast {
    fn id(&self) -> ProviderId {
        self.id
    }
}

#[async_trait]
impl ForecastProvider for MockForecast {
    async fn forecast_day(&self, _location: &Location, date: NaiveDate) -> Result<ForecastDay> {
        if let Some(delay) = self.delays.get(&date) {
            tokio::time::sleep(*delay).await;
        }
        self.days
            .iter()
            .find(|day| day.date == date)
            .cloned()
            .ok_or_else(|| anyhow!("no forecast for {date}"))
    }
}

// ============================================================================
// Stores
// ============================================================================

pub struct FailingStore;

#[async_trait]
impl RecordStore for FailingStore {
    async fn save_snapshot(&self, _snapshot: &WeatherSnapshot) -> Result<()> {
        Err(anyhow!("disk full"))
    }

    async fn save_prediction(&self, _prediction: &PredictionResult) -> Result<()> {
        Err(anyhow!("disk full"))
    }
}

pub struct FailingDistrictStore;

#[async_trait]
impl DistrictStore for FailingDistrictStore {
    async fn find_by_zip(&self, _zip: &str) -> Result<Option<District>> {
        Err(anyhow!("district database offline"))
    }

    async fn find_by_name(&self, _name: &str) -> Result<Option<District>> {
        Err(anyhow!("district database offline"))
    }

    async fn find_by_code(&self, _code: &str) -> Result<Option<District>> {
        Err(anyhow!("district database offline"))
    }

    async fn find_by_location(&self, _text: &str) -> Result<Option<District>> {
        Err(anyhow!("district database offline"))
    }
}

// ============================================================================
// Alert and traffic doubles
// ============================================================================

enum AlertMode {
    Returning(Vec<UnifiedAlert>),
    Failing,
    Hanging,
}

pub struct MockAlertSource {
    id: AlertSourceId,
    mode: AlertMode,
}

impl MockAlertSource {
    pub fn returning(id: AlertSourceId, alerts: Vec<UnifiedAlert>) -> Self {
        Self { id, mode: AlertMode::Returning(alerts) }
    }

    pub fn failing(id: AlertSourceId) -> Self {
        Self { id, mode: AlertMode::Failing }
    }

    pub fn hanging(id: AlertSourceId) -> Self {
        Self { id, mode: AlertMode::Hanging }
    }
}

#[async_trait]
impl AlertSource for MockAlertSource {
    fn id(&self) -> AlertSourceId {
        self.id
    }

    async fn alerts(&self, _location: &Location) -> Result<Vec<UnifiedAlert>> {
        match &self.mode {
            AlertMode::Returning(alerts) => Ok(alerts.clone()),
            AlertMode::Failing => Err(anyhow!("{} feed returned status 500", self.id)),
            AlertMode::Hanging => {
                tokio::time::sleep(HANG).await;
                Ok(Vec::new())
            }
        }
    }
}

/// One record per category unless told to misbehave
#[derive(Default)]
pub struct MockTrafficFeed {
    pub fail_events: bool,
    pub hang_sensors: bool,
    pub event_calls: AtomicUsize,
}

fn road_record(category: RoadCategory, road: &str) -> RoadRecord {
    RoadRecord {
        id: format!("{category:?}-1"),
        category,
        road: road.to_string(),
        description: format!("{category:?} on {road}"),
        coordinates: None,
        updated: Some(at(0)),
    }
}

#[async_trait]
impl TrafficFeed for MockTrafficFeed {
    async fn events(&self, _location: &Location) -> Result<Vec<RoadRecord>> {
        self.event_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_events {
            return Err(anyhow!("event endpoint returned status 502"));
        }
        Ok(vec![
            road_record(RoadCategory::Incident, "I-89"),
            road_record(RoadCategory::Closure, "VT-15"),
        ])
    }

    async fn sensors(&self, _location: &Location) -> Result<Vec<RoadRecord>> {
        if self.hang_sensors {
            tokio::time::sleep(HANG).await;
        }
        Ok(vec![road_record(RoadCategory::Sensor, "US-2")])
    }

    async fn conditions(&self, _location: &Location) -> Result<Vec<RoadRecord>> {
        Ok(vec![road_record(RoadCategory::Condition, "US-7")])
    }
}
