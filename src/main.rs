use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_snowcast::alerts::AlertFusion;
use mcp_snowcast::config::Config;
use mcp_snowcast::districts::{DistrictResolver, StaticDistrictStore};
use mcp_snowcast::persistence::{MemoryStore, Recorder};
use mcp_snowcast::prediction::PredictionEngine;
use mcp_snowcast::providers::{
    AlertSource, CurrentWeatherProvider, ForecastProvider, HttpClient, NwsAlerts, OpenMeteo,
    OpenWeatherMap, Traffic511, WeatherApi,
};
use mcp_snowcast::resolver::WeatherResolver;
use mcp_snowcast::service::Snowcast;
use mcp_snowcast::traffic::RoadConditions;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_snowcast=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting MCP snowcast server");

    let config = Config::from_env()?;
    let http = HttpClient::new(config.provider_timeout)?;
    let recorder = Recorder::new(Arc::new(MemoryStore::new()));

    // Chain order is fallback order.
    let open_meteo = Arc::new(OpenMeteo::new(http.clone()));
    let mut current: Vec<Arc<dyn CurrentWeatherProvider>> = vec![open_meteo.clone()];
    let mut forecast: Vec<Arc<dyn ForecastProvider>> = vec![open_meteo];
    if let Some(key) = &config.openweathermap_api_key {
        current.push(Arc::new(OpenWeatherMap::new(http.clone(), key.clone())));
    }
    if let Some(key) = &config.weatherapi_key {
        let weatherapi = Arc::new(WeatherApi::new(http.clone(), key.clone()));
        current.push(weatherapi.clone());
        forecast.push(weatherapi);
    }

    let mut alert_sources: Vec<Arc<dyn AlertSource>> = vec![Arc::new(NwsAlerts::new(http.clone()))];
    let mut roads = None;
    if let Some(key) = &config.traffic_511_api_key {
        let traffic = Arc::new(Traffic511::new(http.clone(), key.clone()));
        alert_sources.push(traffic.clone());
        roads = Some(Arc::new(RoadConditions::new(traffic, config.provider_timeout)));
    } else {
        tracing::warn!("TRAFFIC_511_API_KEY not set; traffic alerts and road conditions are disabled");
    }

    tracing::info!(
        current_providers = current.len(),
        forecast_providers = forecast.len(),
        alert_sources = alert_sources.len(),
        "Providers configured"
    );

    let weather = Arc::new(WeatherResolver::new(
        current,
        forecast,
        config.provider_timeout,
        recorder.clone(),
    ));
    let predictions = Arc::new(PredictionEngine::new(
        DistrictResolver::new(Arc::new(StaticDistrictStore::new())),
        Arc::clone(&weather),
        recorder,
    ));
    let alerts = Arc::new(AlertFusion::new(alert_sources, config.provider_timeout));

    let snowcast = Snowcast::new(weather, alerts, predictions, roads, config.alert_limit);
    let server = snowcast.serve(rmcp::transport::stdio()).await?;
    server.waiting().await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
