//! Alert fusion: concurrent fetch, dedup, severity ranking.

use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::{AlertSourceId, UnifiedAlert};
use crate::error::{SnowcastError, SnowcastResult};
use crate::geo::locate;
use crate::providers::AlertSource;

pub struct AlertFusion {
    sources: Vec<Arc<dyn AlertSource>>,
    per_source: Duration,
}

impl AlertFusion {
    pub fn new(sources: Vec<Arc<dyn AlertSource>>, per_source: Duration) -> Self {
        Self { sources, per_source }
    }

    /// Fetches every source concurrently and fuses the results.
    ///
    /// A source that errors or times out contributes nothing. Expired alerts
    /// are not removed here; see [`active_at`].
    pub async fn fetch_alerts(&self, location: &str, limit: usize) -> SnowcastResult<Vec<UnifiedAlert>> {
        if limit == 0 {
            return Err(SnowcastError::InvalidInput("limit must be a positive integer".to_string()));
        }
        let place = locate(location);

        let fetches = self.sources.iter().map(|source| {
            let source = Arc::clone(source);
            let place = place.clone();
            let per_source = self.per_source;
            async move {
                let id = source.id();
                match timeout(per_source, source.alerts(&place)).await {
                    Ok(Ok(alerts)) => {
                        tracing::debug!(source = %id, count = alerts.len(), "Alert source answered");
                        alerts
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(source = %id, error = %e, "Alert source failed");
                        Vec::new()
                    }
                    Err(_) => {
                        tracing::warn!(source = %id, "Alert source timed out");
                        Vec::new()
                    }
                }
            }
        });

        let batches = join_all(fetches).await;
        Ok(fuse(batches, limit))
    }
}

/// Merges per-source batches (in fetch order) into one ranked list.
///
/// Alerts sharing `(source, id, type)` collapse to the one fetched last.
/// Ordering is severity descending, then issue time descending, with alerts
/// lacking an issue time after those that have one.
pub fn fuse(batches: Vec<Vec<UnifiedAlert>>, limit: usize) -> Vec<UnifiedAlert> {
    let mut fused: Vec<UnifiedAlert> = Vec::new();
    let mut index: HashMap<(AlertSourceId, String, String), usize> = HashMap::new();

    for alert in batches.into_iter().flatten() {
        let key = (alert.source, alert.id.clone(), alert.alert_type.clone());
        match index.get(&key) {
            Some(&slot) => fused[slot] = alert,
            None => {
                index.insert(key, fused.len());
                fused.push(alert);
            }
        }
    }

    // `None < Some(_)`, so a reversed comparison puts missing issue times last.
    fused.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| b.issue_time.cmp(&a.issue_time))
    });
    fused.truncate(limit);
    fused
}

/// Read-time view: drops alerts whose expiry has passed.
pub fn active_at(alerts: Vec<UnifiedAlert>, now: DateTime<Utc>) -> Vec<UnifiedAlert> {
    alerts.into_iter().filter(|a| a.is_active_at(now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;
    use crate::test_support::{alert, at, MockAlertSource};
    use proptest::prelude::*;

    fn severity_from(n: u8) -> Severity {
        match n % 4 {
            0 => Severity::Minor,
            1 => Severity::Moderate,
            2 => Severity::Severe,
            _ => Severity::Extreme,
        }
    }

    /// Small id and type spaces so that generated batches collide often.
    fn alert_strategy() -> impl Strategy<Value = UnifiedAlert> {
        (
            any::<bool>(),
            0u8..6,
            0u8..2,
            any::<u8>(),
            proptest::option::of(0i64..72),
            any::<u32>(),
        )
            .prop_map(|(nws, id, kind, severity, issued, tag)| {
                let source = if nws { AlertSourceId::Nws } else { AlertSourceId::Traffic511 };
                UnifiedAlert {
                    title: format!("revision {tag}"),
                    ..alert(source, &id.to_string(), &format!("type-{kind}"), severity_from(severity), issued.map(at))
                }
            })
    }

    fn batches_strategy() -> impl Strategy<Value = Vec<Vec<UnifiedAlert>>> {
        proptest::collection::vec(proptest::collection::vec(alert_strategy(), 0..12), 0..4)
    }

    proptest! {
        #[test]
        fn fused_list_is_ranked_by_severity_then_recency(batches in batches_strategy()) {
            let fused = fuse(batches, usize::MAX);
            for pair in fused.windows(2) {
                let (a, b) = (&pair[0], &pair[1]);
                prop_assert!(a.severity >= b.severity, "{:?} before {:?}", a.severity, b.severity);
                if a.severity == b.severity {
                    // `None < Some(_)`: an undated alert never precedes a dated one.
                    prop_assert!(a.issue_time >= b.issue_time);
                }
            }
        }

        #[test]
        fn duplicates_collapse_to_the_last_fetched(batches in batches_strategy()) {
            let mut latest: HashMap<(AlertSourceId, String, String), UnifiedAlert> = HashMap::new();
            for alert in batches.iter().flatten() {
                latest.insert((alert.source, alert.id.clone(), alert.alert_type.clone()), alert.clone());
            }

            let fused = fuse(batches, usize::MAX);
            prop_assert_eq!(fused.len(), latest.len());
            for alert in &fused {
                let key = (alert.source, alert.id.clone(), alert.alert_type.clone());
                prop_assert_eq!(Some(alert), latest.get(&key));
            }
        }

        #[test]
        fn output_never_exceeds_limit(batches in batches_strategy(), limit in 1usize..20) {
            prop_assert!(fuse(batches, limit).len() <= limit);
        }
    }

    #[test]
    fn equal_severity_newest_first_and_undated_last() {
        let undated = alert(AlertSourceId::Nws, "u", "t", Severity::Severe, None);
        let old = alert(AlertSourceId::Nws, "o", "t", Severity::Severe, Some(at(2)));
        let new = alert(AlertSourceId::Nws, "n", "t", Severity::Severe, Some(at(9)));

        let fused = fuse(vec![vec![undated, old, new]], 10);
        let ids: Vec<&str> = fused.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["n", "o", "u"]);
    }

    #[test]
    fn duplicate_key_keeps_later_fetched_alert() {
        let first = UnifiedAlert {
            title: "first".to_string(),
            ..alert(AlertSourceId::Nws, "same", "Winter Storm Warning", Severity::Moderate, Some(at(1)))
        };
        let second = UnifiedAlert {
            title: "second".to_string(),
            ..alert(AlertSourceId::Nws, "same", "Winter Storm Warning", Severity::Severe, Some(at(2)))
        };

        let fused = fuse(vec![vec![first], vec![second.clone()]], 10);
        assert_eq!(fused, vec![second]);
    }

    #[test]
    fn same_native_id_from_different_sources_or_types_is_kept() {
        let nws = alert(AlertSourceId::Nws, "42", "t", Severity::Minor, None);
        let traffic = alert(AlertSourceId::Traffic511, "42", "t", Severity::Minor, None);
        let other_type = alert(AlertSourceId::Nws, "42", "other", Severity::Minor, None);
        assert_eq!(fuse(vec![vec![nws, other_type], vec![traffic]], 10).len(), 3);
    }

    #[test]
    fn result_is_truncated_to_limit() {
        let batch: Vec<UnifiedAlert> = (0..15)
            .map(|i| alert(AlertSourceId::Nws, &i.to_string(), "t", Severity::Minor, Some(at(i))))
            .collect();
        let fused = fuse(vec![batch], 10);
        assert_eq!(fused.len(), 10);
        assert_eq!(fused[0].id, "14");
    }

    #[test]
    fn expired_alerts_are_hidden_at_read_time() {
        let now = at(10);
        let expired = UnifiedAlert {
            expires_time: Some(at(5)),
            ..alert(AlertSourceId::Nws, "e", "t", Severity::Extreme, Some(at(1)))
        };
        let open_ended = alert(AlertSourceId::Nws, "o", "t", Severity::Minor, Some(at(1)));
        let active = active_at(vec![expired, open_ended], now);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "o");
    }

    #[tokio::test]
    async fn failing_source_does_not_affect_the_other() {
        let a1 = alert(AlertSourceId::Nws, "a1", "Winter Storm Warning", Severity::Severe, Some(at(3)));
        let a2 = alert(AlertSourceId::Nws, "a2", "Wind Chill Advisory", Severity::Moderate, Some(at(4)));
        let fusion = AlertFusion::new(
            vec![
                Arc::new(MockAlertSource::returning(AlertSourceId::Nws, vec![a1.clone(), a2.clone()])),
                Arc::new(MockAlertSource::failing(AlertSourceId::Traffic511)),
            ],
            Duration::from_secs(5),
        );

        let fused = fusion.fetch_alerts("Burlington", 10).await.unwrap();
        assert_eq!(fused, vec![a1, a2]);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_source_times_out_to_empty() {
        let a1 = alert(AlertSourceId::Traffic511, "a1", "closures", Severity::Severe, Some(at(3)));
        let fusion = AlertFusion::new(
            vec![
                Arc::new(MockAlertSource::hanging(AlertSourceId::Nws)),
                Arc::new(MockAlertSource::returning(AlertSourceId::Traffic511, vec![a1.clone()])),
            ],
            Duration::from_secs(5),
        );
        let fused = fusion.fetch_alerts("Burlington", 10).await.unwrap();
        assert_eq!(fused, vec![a1]);
    }

    #[tokio::test]
    async fn zero_limit_is_invalid_input() {
        let fusion = AlertFusion::new(vec![], Duration::from_secs(5));
        let err = fusion.fetch_alerts("Burlington", 0).await.unwrap_err();
        assert!(matches!(err, SnowcastError::InvalidInput(_)));
    }
}
