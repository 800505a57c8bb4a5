//! New England 511 traveler information.
//!
//! Serves two roles: an alert source (traffic events become `UnifiedAlert`s)
//! and a `TrafficFeed` for the road-conditions report.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use super::{AlertSource, HttpClient, TrafficFeed};
use crate::constants::{TRAFFIC_511_API_BASE, TRAFFIC_RADIUS_KM};
use crate::domain::{
    AlertSourceId, Coordinates, Location, RoadCategory, RoadRecord, Severity, UnifiedAlert,
};
use crate::geo::{haversine_km, places_mentioned};
use crate::models::{TrafficEvent, TrafficRoadCondition, TrafficWeatherStation};

pub struct Traffic511 {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl Traffic511 {
    pub fn new(http: HttpClient, api_key: String) -> Self {
        Self {
            http,
            api_key,
            base_url: TRAFFIC_511_API_BASE.to_string(),
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let query = [
            ("key", self.api_key.clone()),
            ("format", "json".to_string()),
        ];
        self.http
            .get_json::<Vec<T>>(&url, &query)
            .await
            .with_context(|| format!("511 {endpoint} request failed"))
    }

    async fn nearby_events(&self, location: &Location) -> Result<Vec<TrafficEvent>> {
        let events = self.fetch::<TrafficEvent>("event").await?;
        Ok(events
            .into_iter()
            .filter(|e| is_nearby(location, point(e.latitude, e.longitude)))
            .collect())
    }
}

#[async_trait]
impl AlertSource for Traffic511 {
    fn id(&self) -> AlertSourceId {
        AlertSourceId::Traffic511
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<UnifiedAlert>> {
        let events = self.nearby_events(location).await?;
        Ok(events.into_iter().map(event_to_alert).collect())
    }
}

#[async_trait]
impl TrafficFeed for Traffic511 {
    async fn events(&self, location: &Location) -> Result<Vec<RoadRecord>> {
        let events = self.nearby_events(location).await?;
        Ok(events.into_iter().map(categorize_event).collect())
    }

    async fn sensors(&self, location: &Location) -> Result<Vec<RoadRecord>> {
        let stations = self.fetch::<TrafficWeatherStation>("weatherstations").await?;
        Ok(stations
            .into_iter()
            .filter(|s| is_nearby(location, point(s.latitude, s.longitude)))
            .map(station_to_record)
            .collect())
    }

    async fn conditions(&self, location: &Location) -> Result<Vec<RoadRecord>> {
        let conditions = self.fetch::<TrafficRoadCondition>("roadconditions").await?;
        Ok(conditions
            .into_iter()
            .filter(|c| condition_is_nearby(location, c))
            .map(condition_to_record)
            .collect())
    }
}

/// 511 severity vocabulary to the shared ordinal scale
pub(crate) fn map_severity(severity: Option<&str>) -> Severity {
    match severity.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("critical") | Some("extreme") => Severity::Extreme,
        Some("major") | Some("high") => Severity::Severe,
        Some("moderate") | Some("medium") => Severity::Moderate,
        _ => Severity::Minor,
    }
}

pub(crate) fn event_to_alert(event: TrafficEvent) -> UnifiedAlert {
    let heading = event
        .event_sub_type
        .clone()
        .unwrap_or_else(|| event.event_type.clone());
    let title = match &event.direction_of_travel {
        Some(direction) => format!("{} {}: {}", event.roadway_name, direction, heading),
        None => format!("{}: {}", event.roadway_name, heading),
    };

    UnifiedAlert {
        id: event.id,
        name: heading,
        severity: map_severity(event.severity.as_deref()),
        alert_type: event.event_type,
        title,
        body: event.description,
        issue_time: event.reported.and_then(epoch),
        expires_time: event.planned_end_date.and_then(epoch),
        source: AlertSourceId::Traffic511,
    }
}

/// Full closures are closures; every other event is an incident.
fn categorize_event(event: TrafficEvent) -> RoadRecord {
    let category = if event.is_full_closure {
        RoadCategory::Closure
    } else {
        RoadCategory::Incident
    };
    RoadRecord {
        id: event.id,
        category,
        road: event.roadway_name,
        description: event.description,
        coordinates: point(event.latitude, event.longitude),
        updated: event.last_updated.or(event.reported).and_then(epoch),
    }
}

fn station_to_record(station: TrafficWeatherStation) -> RoadRecord {
    let mut parts = Vec::new();
    if let Some(air) = &station.air_temperature {
        parts.push(format!("air {air}"));
    }
    if let Some(surface) = &station.surface_temperature {
        parts.push(format!("pavement {surface}"));
    }
    if let Some(status) = &station.surface_status {
        parts.push(status.clone());
    }

    RoadRecord {
        id: station.id,
        category: RoadCategory::Sensor,
        road: station.station_name,
        description: parts.join(", "),
        coordinates: point(station.latitude, station.longitude),
        updated: station.last_updated.and_then(epoch),
    }
}

fn condition_to_record(condition: TrafficRoadCondition) -> RoadRecord {
    let mut description = condition.primary_condition;
    if !condition.secondary_conditions.is_empty() {
        description = format!("{} ({})", description, condition.secondary_conditions.join(", "));
    }
    let road = match condition.location_description {
        Some(segment) => format!("{} {}", condition.roadway_name, segment),
        None => condition.roadway_name,
    };

    RoadRecord {
        id: condition.id,
        category: RoadCategory::Condition,
        road,
        description,
        coordinates: None,
        updated: condition.last_updated.and_then(epoch),
    }
}

fn point(latitude: Option<f64>, longitude: Option<f64>) -> Option<Coordinates> {
    Some(Coordinates {
        latitude: latitude?,
        longitude: longitude?,
    })
}

/// Records without a position, or requests without one, are kept.
fn is_nearby(location: &Location, at: Option<Coordinates>) -> bool {
    match (location.coordinates, at) {
        (Some(origin), Some(at)) => haversine_km(origin, at) <= TRAFFIC_RADIUS_KM,
        _ => true,
    }
}

/// Road segments carry no position, only names. A segment is near when any
/// town it names lies within the traffic radius. Requests without a position
/// keep every segment.
fn condition_is_nearby(location: &Location, condition: &TrafficRoadCondition) -> bool {
    let Some(origin) = location.coordinates else {
        return true;
    };
    let text = match &condition.location_description {
        Some(segment) => format!("{} {}", condition.roadway_name, segment),
        None => condition.roadway_name.clone(),
    };
    places_mentioned(&text)
        .into_iter()
        .any(|place| haversine_km(origin, place) <= TRAFFIC_RADIUS_KM)
}

fn epoch(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}
