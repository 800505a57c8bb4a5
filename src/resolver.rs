use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::{ForecastDay, Location, ProviderHint, WeatherSnapshot};
use crate::error::{SnowcastError, SnowcastResult};
use crate::fallback::{first_success, run_one};
use crate::geo::locate;
use crate::persistence::Recorder;
use crate::providers::{CurrentWeatherProvider, ForecastProvider};

/// Resolves current conditions and day forecasts over ordered provider chains
pub struct WeatherResolver {
    current: Vec<Arc<dyn CurrentWeatherProvider>>,
    forecast: Vec<Arc<dyn ForecastProvider>>,
    per_attempt: Duration,
    recorder: Recorder,
}

impl WeatherResolver {
    /// Chains are tried in the order given.
    pub fn new(
        current: Vec<Arc<dyn CurrentWeatherProvider>>,
        forecast: Vec<Arc<dyn ForecastProvider>>,
        per_attempt: Duration,
        recorder: Recorder,
    ) -> Self {
        Self {
            current,
            forecast,
            per_attempt,
            recorder,
        }
    }

    /// Returns exactly one snapshot, tagged with the provider that answered.
    pub async fn resolve(&self, location: &str, hint: ProviderHint) -> SnowcastResult<WeatherSnapshot> {
        if location.trim().is_empty() {
            return Err(SnowcastError::InvalidInput("location must not be empty".to_string()));
        }
        let place = locate(location);
        tracing::info!(location = %place.name, hint = ?hint, "Resolving current weather");

        let (provider, mut snapshot) = match hint {
            ProviderHint::Only(wanted) => {
                let provider = self
                    .current
                    .iter()
                    .find(|p| p.id() == wanted)
                    .cloned()
                    .ok_or_else(|| SnowcastError::ProviderUnavailable {
                        provider: wanted,
                        reason: "provider is not configured".to_string(),
                    })?;
                let snapshot = run_one(
                    provider,
                    self.per_attempt,
                    &mut |p: Arc<dyn CurrentWeatherProvider>| fetch_current(p, place.clone()),
                    &WeatherSnapshot::validate,
                )
                .await
                .map_err(|reason| SnowcastError::ProviderUnavailable {
                    provider: wanted,
                    reason,
                })?;
                (wanted, snapshot)
            }
            ProviderHint::Auto => first_success(
                &self.current,
                self.per_attempt,
                |p| fetch_current(p, place.clone()),
                WeatherSnapshot::validate,
            )
            .await
            .map_err(|attempts| SnowcastError::NoProviderAvailable { attempts })?,
        };

        snapshot.source = provider;
        self.recorder.record_snapshot(snapshot.clone());
        Ok(snapshot)
    }

    /// Forecast for one day at `location`, over the forecast chain.
    pub async fn forecast(&self, location: &Location, date: NaiveDate) -> SnowcastResult<ForecastDay> {
        let (provider, day) = first_success(
            &self.forecast,
            self.per_attempt,
            |p| fetch_forecast(p, location.clone(), date),
            |day: &ForecastDay| {
                if day.date == date {
                    Ok(())
                } else {
                    Err(format!("forecast is for {} instead of {}", day.date, date))
                }
            },
        )
        .await
        .map_err(|attempts| SnowcastError::ForecastUnavailable {
            date,
            reason: if attempts.is_empty() {
                "no forecast providers configured".to_string()
            } else {
                attempts
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ")
            },
        })?;

        tracing::debug!(provider = %provider, date = %date, "Forecast resolved");
        Ok(day)
    }
}

async fn fetch_current(
    provider: Arc<dyn CurrentWeatherProvider>,
    location: Location,
) -> anyhow::Result<WeatherSnapshot> {
    provider.current(&location).await
}

async fn fetch_forecast(
    provider: Arc<dyn ForecastProvider>,
    location: Location,
    date: NaiveDate,
) -> anyhow::Result<ForecastDay> {
    provider.forecast_day(&location, date).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ProviderId, ProviderHint};
    use crate::persistence::MemoryStore;
    use crate::test_support::{
        forecast_day, recorder, FailingStore, MockCurrent, MockForecast,
    };

    fn resolver(current: Vec<Arc<dyn CurrentWeatherProvider>>) -> WeatherResolver {
        WeatherResolver::new(current, vec![], Duration::from_secs(5), recorder())
    }

    #[tokio::test]
    async fn auto_falls_back_to_last_provider_and_tags_it() {
        let resolver = resolver(vec![
            Arc::new(MockCurrent::failing(ProviderId::OpenMeteo)),
            Arc::new(MockCurrent::failing(ProviderId::OpenWeatherMap)),
            Arc::new(MockCurrent::healthy(ProviderId::WeatherApi)),
        ]);
        let snapshot = resolver.resolve("Burlington", ProviderHint::Auto).await.unwrap();
        assert_eq!(snapshot.source, ProviderId::WeatherApi);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_provider_is_treated_like_a_failure() {
        let resolver = resolver(vec![
            Arc::new(MockCurrent::hanging(ProviderId::OpenMeteo)),
            Arc::new(MockCurrent::healthy(ProviderId::OpenWeatherMap)),
        ]);
        let snapshot = resolver.resolve("Burlington", ProviderHint::Auto).await.unwrap();
        assert_eq!(snapshot.source, ProviderId::OpenWeatherMap);
    }

    #[tokio::test]
    async fn structurally_invalid_payload_is_skipped() {
        let resolver = resolver(vec![
            Arc::new(MockCurrent::invalid(ProviderId::OpenMeteo)),
            Arc::new(MockCurrent::healthy(ProviderId::WeatherApi)),
        ]);
        let snapshot = resolver.resolve("Burlington", ProviderHint::Auto).await.unwrap();
        assert_eq!(snapshot.source, ProviderId::WeatherApi);
    }

    #[tokio::test]
    async fn source_tag_reflects_chain_position_not_adapter_claim() {
        let resolver = resolver(vec![Arc::new(MockCurrent::mislabelled(ProviderId::OpenWeatherMap))]);
        let snapshot = resolver.resolve("Burlington", ProviderHint::Auto).await.unwrap();
        assert_eq!(snapshot.source, ProviderId::OpenWeatherMap);
    }

    #[tokio::test]
    async fn every_provider_failing_is_no_provider_available() {
        let resolver = resolver(vec![
            Arc::new(MockCurrent::failing(ProviderId::OpenMeteo)),
            Arc::new(MockCurrent::failing(ProviderId::WeatherApi)),
        ]);
        let err = resolver.resolve("Burlington", ProviderHint::Auto).await.unwrap_err();
        match err {
            SnowcastError::NoProviderAvailable { attempts } => assert_eq!(attempts.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn explicit_provider_failure_is_not_retried_elsewhere() {
        let resolver = resolver(vec![
            Arc::new(MockCurrent::failing(ProviderId::OpenMeteo)),
            Arc::new(MockCurrent::healthy(ProviderId::WeatherApi)),
        ]);
        let err = resolver
            .resolve("Burlington", ProviderHint::Only(ProviderId::OpenMeteo))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SnowcastError::ProviderUnavailable { provider: ProviderId::OpenMeteo, .. }
        ));
    }

    #[tokio::test]
    async fn explicit_unconfigured_provider_is_unavailable() {
        let resolver = resolver(vec![Arc::new(MockCurrent::healthy(ProviderId::OpenMeteo))]);
        let err = resolver
            .resolve("Burlington", ProviderHint::Only(ProviderId::WeatherApi))
            .await
            .unwrap_err();
        assert!(matches!(err, SnowcastError::ProviderUnavailable { .. }));
    }

    #[tokio::test]
    async fn explicit_provider_success() {
        let resolver = resolver(vec![
            Arc::new(MockCurrent::healthy(ProviderId::OpenMeteo)),
            Arc::new(MockCurrent::healthy(ProviderId::WeatherApi)),
        ]);
        let snapshot = resolver
            .resolve("Burlington", ProviderHint::Only(ProviderId::WeatherApi))
            .await
            .unwrap();
        assert_eq!(snapshot.source, ProviderId::WeatherApi);
    }

    #[tokio::test]
    async fn persistence_failure_does_not_fail_resolution() {
        let resolver = WeatherResolver::new(
            vec![Arc::new(MockCurrent::healthy(ProviderId::OpenMeteo))],
            vec![],
            Duration::from_secs(5),
            Recorder::new(Arc::new(FailingStore)),
        );
        assert!(resolver.resolve("Burlington", ProviderHint::Auto).await.is_ok());
    }

    #[tokio::test]
    async fn successful_resolution_is_recorded() {
        let store = Arc::new(MemoryStore::new());
        let resolver = WeatherResolver::new(
            vec![Arc::new(MockCurrent::healthy(ProviderId::OpenMeteo))],
            vec![],
            Duration::from_secs(5),
            Recorder::new(store.clone()),
        );
        resolver.resolve("Burlington", ProviderHint::Auto).await.unwrap();
        for _ in 0..10 {
            if !store.snapshots().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.snapshots().len(), 1);
    }

    #[tokio::test]
    async fn blank_location_is_invalid_input() {
        let resolver = resolver(vec![Arc::new(MockCurrent::healthy(ProviderId::OpenMeteo))]);
        let err = resolver.resolve("   ", ProviderHint::Auto).await.unwrap_err();
        assert!(matches!(err, SnowcastError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn forecast_falls_back_and_then_fails_with_forecast_unavailable() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        let location = locate("Burlington");

        let resolver = WeatherResolver::new(
            vec![],
            vec![
                Arc::new(MockForecast::failing(ProviderId::OpenMeteo)),
                Arc::new(MockForecast::with_days(
                    ProviderId::WeatherApi,
                    vec![forecast_day(date, 12.0)],
                )),
            ],
            Duration::from_secs(5),
            recorder(),
        );
        let day = resolver.forecast(&location, date).await.unwrap();
        assert_eq!(day.snowfall_cm, Some(12.0));

        let other = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
        let err = resolver.forecast(&location, other).await.unwrap_err();
        assert!(matches!(err, SnowcastError::ForecastUnavailable { date, .. } if date == other));
    }
}
