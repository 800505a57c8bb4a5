//! Road-conditions report assembled from the traffic feed.

use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::domain::{RoadCategory, RoadRecord, RoadReport};
use crate::geo::locate;
use crate::providers::TrafficFeed;

pub struct RoadConditions {
    feed: Arc<dyn TrafficFeed>,
    per_category: Duration,
}

impl RoadConditions {
    pub fn new(feed: Arc<dyn TrafficFeed>, per_category: Duration) -> Self {
        Self { feed, per_category }
    }

    /// Events, sensors and conditions are requested at once; a failed call
    /// leaves its categories empty. Incidents and closures share the events
    /// call, so they fail together.
    pub async fn report(&self, location: &str) -> RoadReport {
        let place = locate(location);
        let feed = &self.feed;

        let (events, sensors, conditions) = tokio::join!(
            guarded("events", self.per_category, feed.events(&place)),
            guarded("sensors", self.per_category, feed.sensors(&place)),
            guarded("conditions", self.per_category, feed.conditions(&place)),
        );

        let (closures, incidents): (Vec<RoadRecord>, Vec<RoadRecord>) = events
            .into_iter()
            .partition(|record| record.category == RoadCategory::Closure);

        RoadReport {
            incidents,
            closures,
            sensors,
            conditions,
        }
    }
}

async fn guarded<F>(category: &str, limit: Duration, call: F) -> Vec<RoadRecord>
where
    F: Future<Output = Result<Vec<RoadRecord>>>,
{
    match timeout(limit, call).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            tracing::warn!(category, error = %e, "Traffic category failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(category, "Traffic category timed out");
            Vec::new()
        }
    }
}
