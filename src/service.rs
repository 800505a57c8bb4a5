use chrono::{DateTime, Duration, NaiveDate, Utc};
use rmcp::{
    handler::server::{wrapper::Parameters, ServerHandler, tool::ToolRouter},
    model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde_json::json;
use std::sync::Arc;

use crate::alerts::{active_at, AlertFusion};
use crate::domain::{PlowSample, ProviderHint, ProviderId};
use crate::error::SnowcastError;
use crate::formatters::{
    format_alerts, format_prediction, format_road_report, format_safety, format_snapshot,
    format_week,
};
use crate::models::{
    GetAlertsRequest, GetCurrentWeatherRequest, GetRoadConditionsRequest, PlowSampleInput,
    PredictSnowDayRequest, PredictSnowWeekRequest, RatePlowCoverageRequest,
};
use crate::plows;
use crate::prediction::{local_today, PredictionEngine};
use crate::resolver::WeatherResolver;
use crate::traffic::RoadConditions;

/// MCP front end over the snow-day and winter-road aggregation core
#[derive(Clone)]
pub struct Snowcast {
    weather: Arc<WeatherResolver>,
    alerts: Arc<AlertFusion>,
    predictions: Arc<PredictionEngine>,
    roads: Option<Arc<RoadConditions>>,
    alert_limit: usize,
    tool_router: ToolRouter<Self>,
}

impl Snowcast {
    /// `roads` is `None` when no traffic feed is configured.
    pub fn new(
        weather: Arc<WeatherResolver>,
        alerts: Arc<AlertFusion>,
        predictions: Arc<PredictionEngine>,
        roads: Option<Arc<RoadConditions>>,
        alert_limit: usize,
    ) -> Self {
        Self {
            weather,
            alerts,
            predictions,
            roads,
            alert_limit,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_mcp_error(error: SnowcastError) -> McpError {
    match error {
        SnowcastError::InvalidInput(_) => McpError::invalid_params(error.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn parse_provider(raw: Option<&str>) -> Result<ProviderHint, SnowcastError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ProviderHint::Auto),
        Some(name) if name.eq_ignore_ascii_case("auto") => Ok(ProviderHint::Auto),
        Some(name) => ProviderId::parse(name).map(ProviderHint::Only).ok_or_else(|| {
            SnowcastError::InvalidInput(format!(
                "unknown provider '{name}'; expected auto, open-meteo, openweathermap or weatherapi"
            ))
        }),
    }
}

fn parse_date(raw: Option<&str>, now: DateTime<Utc>) -> Result<NaiveDate, SnowcastError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(local_today(now) + Duration::days(1)),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
            SnowcastError::InvalidInput(format!("date must be formatted YYYY-MM-DD, got '{text}'"))
        }),
    }
}

fn to_samples(inputs: &[PlowSampleInput]) -> Result<Vec<PlowSample>, SnowcastError> {
    inputs
        .iter()
        .enumerate()
        .map(|(i, input)| {
            let timestamp = input
                .timestamp
                .as_deref()
                .map(|raw| {
                    DateTime::parse_from_rfc3339(raw)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|_| {
                            SnowcastError::InvalidInput(format!(
                                "plow sample at index {i} (id '{}') has an invalid timestamp '{raw}'",
                                input.id
                            ))
                        })
                })
                .transpose()?;

            Ok(PlowSample {
                id: input.id.clone(),
                latitude: input.latitude,
                longitude: input.longitude,
                route: input.route.clone(),
                direction: input.direction.clone(),
                timestamp,
                status: input.status.clone(),
            })
        })
        .collect()
}

fn json_content<T: serde::Serialize>(value: T) -> Result<Content, McpError> {
    Content::json(value)
}

#[tool_handler]
impl ServerHandler for Snowcast {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "mcp-snowcast".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                title: None,
                website_url: None,
            },
            instructions: Some(
                "Snow-day and winter-road service for Vermont school districts. \
                Resolves current weather across several providers, fuses National Weather \
                Service and 511 alerts, predicts closings and delays, and rates plow coverage."
                    .to_string(),
            ),
        }
    }
}

#[tool_router]
impl Snowcast {
    #[tool(description = "Get current weather for a town (e.g. 'Burlington') or 'lat,lon'. Optionally pin a provider: 'open-meteo', 'openweathermap' or 'weatherapi'; by default providers are tried in order until one answers.")]
    async fn get_current_weather(
        &self,
        Parameters(request): Parameters<GetCurrentWeatherRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(location = %request.location, "Getting current weather");

        let hint = parse_provider(request.provider.as_deref()).map_err(to_mcp_error)?;
        let snapshot = self
            .weather
            .resolve(&request.location, hint)
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![
            Content::text(format_snapshot(&snapshot)),
            json_content(&snapshot)?,
        ]))
    }

    #[tool(description = "Get active weather and traffic alerts near a town, merged across sources and ranked most severe first.")]
    async fn get_alerts(
        &self,
        Parameters(request): Parameters<GetAlertsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(location = %request.location, "Getting alerts");

        let limit = request.limit.unwrap_or(self.alert_limit);
        let fused = self
            .alerts
            .fetch_alerts(&request.location, limit)
            .await
            .map_err(to_mcp_error)?;
        let active = active_at(fused, Utc::now());

        Ok(CallToolResult::success(vec![
            Content::text(format_alerts(&active)),
            json_content(&active)?,
        ]))
    }

    #[tool(description = "Predict school closing, delay and early-dismissal chances for a district (zip code, name, code or town) on a date (YYYY-MM-DD, default tomorrow). Optionally include plow positions to add a road-safety rating.")]
    async fn predict_snow_day(
        &self,
        Parameters(request): Parameters<PredictSnowDayRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(district = %request.district, date = ?request.date, "Predicting snow day");

        let date = parse_date(request.date.as_deref(), Utc::now()).map_err(to_mcp_error)?;
        let prediction = self
            .predictions
            .predict(&request.district, date)
            .await
            .map_err(to_mcp_error)?;

        let mut text = format_prediction(&prediction);
        let mut safety = None;
        if let Some(inputs) = request.plows.as_deref() {
            let route = request.route.as_deref().unwrap_or("district roads");
            let rated = to_samples(inputs)
                .and_then(|samples| plows::rate(&samples, route, request.route_length_km));
            match rated {
                Ok((rating, distribution)) => {
                    text.push('\n');
                    text.push_str(&format_safety(&rating, &distribution));
                    safety = Some(json!({ "rating": rating, "distribution": distribution }));
                }
                Err(e) => tracing::warn!(error = %e, "Skipping road-safety rating"),
            }
        }

        let payload = json!({ "prediction": prediction, "road_safety": safety });
        Ok(CallToolResult::success(vec![Content::text(text), json_content(payload)?]))
    }

    #[tool(description = "Predict snow-day chances for each of the next seven days for a district.")]
    async fn predict_snow_week(
        &self,
        Parameters(request): Parameters<PredictSnowWeekRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(district = %request.district, "Predicting snow week");

        let week = self
            .predictions
            .predict_week(&request.district)
            .await
            .map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![
            Content::text(format_week(&week)),
            json_content(&week)?,
        ]))
    }

    #[tool(description = "Rate road safety for a route from reported plow positions. Every position needs a latitude and longitude; supply route_length_km if known.")]
    async fn rate_plow_coverage(
        &self,
        Parameters(request): Parameters<RatePlowCoverageRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(route = %request.route, plows = request.plows.len(), "Rating plow coverage");

        let samples = to_samples(&request.plows).map_err(to_mcp_error)?;
        let (rating, distribution) =
            plows::rate(&samples, &request.route, request.route_length_km).map_err(to_mcp_error)?;

        Ok(CallToolResult::success(vec![
            Content::text(format_safety(&rating, &distribution)),
            json_content(json!({ "rating": rating, "distribution": distribution }))?,
        ]))
    }

    #[tool(description = "Get incidents, closures, road sensor readings and surface conditions near a town from New England 511.")]
    async fn get_road_conditions(
        &self,
        Parameters(request): Parameters<GetRoadConditionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::info!(location = %request.location, "Getting road conditions");

        let roads = self.roads.as_ref().ok_or_else(|| {
            McpError::internal_error(
                "Road conditions are not configured; set TRAFFIC_511_API_KEY to enable them",
                None,
            )
        })?;
        let report = roads.report(&request.location).await;

        Ok(CallToolResult::success(vec![
            Content::text(format_road_report(&request.location, &report)),
            json_content(&report)?,
        ]))
    }
}
