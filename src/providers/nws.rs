use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{AlertSource, HttpClient};
use crate::constants::NWS_API_BASE;
use crate::domain::{AlertSourceId, Location, Severity, UnifiedAlert};
use crate::models::{AlertProperties, AlertResponse};

/// Active alerts from the National Weather Service for a point
pub struct NwsAlerts {
    http: HttpClient,
    base_url: String,
}

impl NwsAlerts {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            base_url: NWS_API_BASE.to_string(),
        }
    }
}

#[async_trait]
impl AlertSource for NwsAlerts {
    fn id(&self) -> AlertSourceId {
        AlertSourceId::Nws
    }

    async fn alerts(&self, location: &Location) -> Result<Vec<UnifiedAlert>> {
        let coordinates = location
            .coordinates
            .ok_or_else(|| anyhow!("NWS alerts need coordinates for '{}'", location.name))?;

        let url = format!("{}/alerts/active", self.base_url);
        let query = [(
            "point",
            format!("{:.4},{:.4}", coordinates.latitude, coordinates.longitude),
        )];

        let response = self
            .http
            .get_json::<AlertResponse>(&url, &query)
            .await
            .context("Failed to fetch NWS alerts")?;

        Ok(normalize_alerts(response))
    }
}

/// NWS severity vocabulary to the shared ordinal scale
pub(crate) fn map_severity(severity: &str) -> Severity {
    match severity {
        "Extreme" => Severity::Extreme,
        "Severe" => Severity::Severe,
        "Moderate" => Severity::Moderate,
        _ => Severity::Minor,
    }
}

pub(crate) fn normalize_alerts(response: AlertResponse) -> Vec<UnifiedAlert> {
    response
        .features
        .into_iter()
        .map(|feature| normalize_alert(feature.properties))
        .collect()
}

fn normalize_alert(props: AlertProperties) -> UnifiedAlert {
    let issue_time = props
        .sent
        .as_deref()
        .or(props.effective.as_deref())
        .and_then(parse_time);
    let expires_time = props
        .expires
        .as_deref()
        .or(props.ends.as_deref())
        .and_then(parse_time);
    let title = props
        .headline
        .unwrap_or_else(|| format!("{} for {}", props.event, props.area_desc));

    UnifiedAlert {
        id: props.id,
        name: props.event.clone(),
        alert_type: props.event,
        severity: map_severity(&props.severity),
        title,
        body: props.description.unwrap_or_default(),
        issue_time,
        expires_time,
        source: AlertSourceId::Nws,
    }
}

fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
