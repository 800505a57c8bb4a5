//! District and threshold resolution.
//!
//! Lookups never fail. Identifiers are matched against the store in a fixed
//! order (zip, name, code, then a whole-word match on served towns); anything
//! unmatched becomes a synthetic district carrying regional thresholds.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::constants::{
    REGIONAL_CENTROID, REGIONAL_DELAY_SNOWFALL_CM, REGIONAL_FULL_CLOSING_SNOWFALL_CM,
    REGIONAL_ICE_CM,
};
use crate::domain::{Coordinates, District, DistrictMatch, Thresholds};
use crate::geo::{lookup_centroid, mentions};

/// Keyed read access to district records
#[async_trait]
pub trait DistrictStore: Send + Sync {
    async fn find_by_zip(&self, zip: &str) -> Result<Option<District>>;
    async fn find_by_name(&self, name: &str) -> Result<Option<District>>;
    async fn find_by_code(&self, code: &str) -> Result<Option<District>>;
    /// First district serving a town whose name appears in `text`
    async fn find_by_location(&self, text: &str) -> Result<Option<District>>;
}

pub fn regional_thresholds() -> Thresholds {
    Thresholds {
        full_closing_snowfall_cm: REGIONAL_FULL_CLOSING_SNOWFALL_CM,
        delay_snowfall_cm: REGIONAL_DELAY_SNOWFALL_CM,
        ice_cm: REGIONAL_ICE_CM,
    }
}

#[derive(Clone)]
pub struct DistrictResolver {
    store: Arc<dyn DistrictStore>,
}

impl DistrictResolver {
    pub fn new(store: Arc<dyn DistrictStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, identifier: &str) -> DistrictMatch {
        let key = identifier.trim();

        if !key.is_empty() {
            let store = &self.store;
            let attempts: [(&str, _); 4] = [
                ("zip", store.find_by_zip(key)),
                ("name", store.find_by_name(key)),
                ("code", store.find_by_code(key)),
                ("location", store.find_by_location(key)),
            ];
            for (kind, lookup) in attempts {
                match lookup.await {
                    Ok(Some(district)) => {
                        tracing::debug!(identifier = key, matched_by = kind, district = %district.id, "District matched");
                        return DistrictMatch::Matched(district);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        tracing::warn!(identifier = key, lookup = kind, error = %e, "District lookup failed");
                    }
                }
            }
        }

        tracing::info!(identifier = key, "No district matched, using regional defaults");
        DistrictMatch::Defaulted(default_district(key))
    }
}

/// Synthetic district for an unmatched identifier
pub fn default_district(identifier: &str) -> District {
    let centroid = lookup_centroid(identifier).unwrap_or(Coordinates {
        latitude: REGIONAL_CENTROID.0,
        longitude: REGIONAL_CENTROID.1,
    });
    let label = if identifier.is_empty() { "Vermont" } else { identifier };

    District {
        id: format!("default:{}", slug(label)),
        name: format!("{label} (regional defaults)"),
        code: None,
        zip_codes: Vec::new(),
        locations: vec![label.to_string()],
        thresholds: regional_thresholds(),
        centroid,
    }
}

fn slug(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

// ============================================================================
// Static registry
// ============================================================================

struct DistrictSeed {
    id: &'static str,
    name: &'static str,
    code: &'static str,
    zips: &'static [&'static str],
    locations: &'static [&'static str],
    /// Inches, as published by the districts
    closing_in: Option<f64>,
    delay_in: Option<f64>,
    ice_in: Option<f64>,
    centroid: (f64, f64),
}

const CM_PER_INCH: f64 = 2.54;

const SEEDS: &[DistrictSeed] = &[
    DistrictSeed {
        id: "burlington-sd",
        name: "Burlington School District",
        code: "BSD",
        zips: &["05401", "05405", "05408"],
        locations: &["Burlington"],
        closing_in: Some(4.0),
        delay_in: Some(2.0),
        ice_in: Some(0.25),
        centroid: (44.4759, -73.2121),
    },
    DistrictSeed {
        id: "south-burlington-sd",
        name: "South Burlington School District",
        code: "SBSD",
        zips: &["05403"],
        locations: &["South Burlington"],
        closing_in: Some(5.0),
        delay_in: Some(2.5),
        ice_in: Some(0.25),
        centroid: (44.4669, -73.1710),
    },
    DistrictSeed {
        id: "champlain-valley-sd",
        name: "Champlain Valley School District",
        code: "CVSD",
        zips: &["05482", "05445", "05461", "05495"],
        locations: &["Shelburne", "Charlotte", "Hinesburg", "Williston", "St. George"],
        closing_in: Some(6.0),
        delay_in: Some(3.0),
        ice_in: None,
        centroid: (44.3806, -73.2273),
    },
    DistrictSeed {
        id: "essex-westford-sd",
        name: "Essex Westford School District",
        code: "EWSD",
        zips: &["05452", "05451", "05453", "05489"],
        locations: &["Essex Junction", "Essex", "Westford"],
        closing_in: Some(6.0),
        delay_in: Some(3.0),
        ice_in: Some(0.2),
        centroid: (44.4906, -73.1115),
    },
    DistrictSeed {
        id: "winooski-sd",
        name: "Winooski School District",
        code: "WSD",
        zips: &["05404"],
        locations: &["Winooski"],
        closing_in: Some(4.0),
        delay_in: Some(2.0),
        ice_in: Some(0.25),
        centroid: (44.4914, -73.1857),
    },
    DistrictSeed {
        id: "montpelier-roxbury-sd",
        name: "Montpelier Roxbury Public Schools",
        code: "MRPS",
        zips: &["05602", "05669"],
        locations: &["Montpelier", "Roxbury"],
        closing_in: Some(8.0),
        delay_in: Some(4.0),
        ice_in: Some(0.3),
        centroid: (44.2601, -72.5754),
    },
    DistrictSeed {
        id: "rutland-city-sd",
        name: "Rutland City Public Schools",
        code: "RCPS",
        zips: &["05701", "05702"],
        locations: &["Rutland"],
        closing_in: None,
        delay_in: Some(3.0),
        ice_in: None,
        centroid: (43.6106, -72.9726),
    },
];

impl DistrictSeed {
    fn to_district(&self) -> District {
        let defaults = regional_thresholds();
        let cm = |inches: Option<f64>, fallback: f64| inches.map_or(fallback, |i| i * CM_PER_INCH);

        District {
            id: self.id.to_string(),
            name: self.name.to_string(),
            code: Some(self.code.to_string()),
            zip_codes: self.zips.iter().map(|z| z.to_string()).collect(),
            locations: self.locations.iter().map(|l| l.to_string()).collect(),
            thresholds: Thresholds {
                full_closing_snowfall_cm: cm(self.closing_in, defaults.full_closing_snowfall_cm),
                delay_snowfall_cm: cm(self.delay_in, defaults.delay_snowfall_cm),
                ice_cm: cm(self.ice_in, defaults.ice_cm),
            },
            centroid: Coordinates {
                latitude: self.centroid.0,
                longitude: self.centroid.1,
            },
        }
    }
}

/// Read-only registry of the districts the service ships with
pub struct StaticDistrictStore {
    districts: Vec<District>,
}

impl StaticDistrictStore {
    pub fn new() -> Self {
        Self::with_districts(SEEDS.iter().map(DistrictSeed::to_district).collect())
    }

    pub fn with_districts(districts: Vec<District>) -> Self {
        Self { districts }
    }
}

impl Default for StaticDistrictStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DistrictStore for StaticDistrictStore {
    async fn find_by_zip(&self, zip: &str) -> Result<Option<District>> {
        Ok(self
            .districts
            .iter()
            .find(|d| d.zip_codes.iter().any(|z| z == zip))
            .cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<District>> {
        Ok(self
            .districts
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<District>> {
        Ok(self
            .districts
            .iter()
            .find(|d| d.code.as_deref().is_some_and(|c| c.eq_ignore_ascii_case(code)))
            .cloned())
    }

    async fn find_by_location(&self, text: &str) -> Result<Option<District>> {
        // Longest town name first: "South Burlington" must beat "Burlington".
        let mut candidates: Vec<(&District, usize)> = self
            .districts
            .iter()
            .flat_map(|d| {
                d.locations
                    .iter()
                    .filter(|town| mentions(text, town))
                    .map(move |town| (d, town.len()))
            })
            .collect();
        candidates.sort_by_key(|(_, len)| std::cmp::Reverse(*len));
        Ok(candidates.first().map(|(d, _)| (*d).clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FailingDistrictStore;

    fn resolver() -> DistrictResolver {
        DistrictResolver::new(Arc::new(StaticDistrictStore::new()))
    }

    #[tokio::test]
    async fn zip_05401_is_burlington() {
        let matched = resolver().resolve("05401").await;
        assert!(!matched.is_default());
        let district = matched.district();
        assert_eq!(district.id, "burlington-sd");
        assert!((district.thresholds.full_closing_snowfall_cm - 10.16).abs() < 1e-9);
    }

    #[tokio::test]
    async fn name_and_code_match_case_insensitively() {
        let by_name = resolver().resolve("essex westford school district").await;
        assert_eq!(by_name.district().id, "essex-westford-sd");

        let by_code = resolver().resolve("mrps").await;
        assert_eq!(by_code.district().id, "montpelier-roxbury-sd");
    }

    #[tokio::test]
    async fn town_inside_free_text_matches_serving_district() {
        let matched = resolver().resolve("Shelburne, VT").await;
        assert_eq!(matched.district().id, "champlain-valley-sd");

        let matched = resolver().resolve("South Burlington High").await;
        assert_eq!(matched.district().id, "south-burlington-sd");
    }

    #[tokio::test]
    async fn town_inside_a_longer_word_does_not_match() {
        let matched = resolver().resolve("Sussex Road").await;
        assert!(matched.is_default(), "{matched:?}");

        let matched = resolver().resolve("Charlottesville").await;
        assert!(matched.is_default(), "{matched:?}");

        let matched = resolver().resolve("St George, VT").await;
        assert_eq!(matched.district().id, "champlain-valley-sd");
    }

    #[tokio::test]
    async fn zip_wins_over_later_match_kinds() {
        let store = StaticDistrictStore::with_districts(vec![
            District {
                code: Some("05401".to_string()),
                ..default_district("Decoy")
            },
            StaticDistrictStore::new().districts[0].clone(),
        ]);
        let matched = DistrictResolver::new(Arc::new(store)).resolve("05401").await;
        assert_eq!(matched.district().id, "burlington-sd");
    }

    #[tokio::test]
    async fn unknown_identifier_falls_back_to_regional_defaults() {
        let matched = resolver().resolve("Stowe").await;
        assert!(matched.is_default());
        let district = matched.district();
        assert_eq!(district.thresholds, regional_thresholds());
        assert_eq!(district.id, "default:stowe");
        assert!((district.centroid.latitude - 44.4654).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ungeocodable_identifier_uses_regional_centroid() {
        let matched = resolver().resolve("Atlantis").await;
        assert!(matched.is_default());
        assert_eq!(matched.district().centroid.latitude, REGIONAL_CENTROID.0);
    }

    #[tokio::test]
    async fn missing_published_thresholds_use_regional_values() {
        let matched = resolver().resolve("05701").await;
        let thresholds = matched.district().thresholds;
        assert_eq!(thresholds.full_closing_snowfall_cm, REGIONAL_FULL_CLOSING_SNOWFALL_CM);
        assert!((thresholds.delay_snowfall_cm - 7.62).abs() < 1e-9);
    }

    #[tokio::test]
    async fn store_errors_degrade_to_defaults() {
        let matched = DistrictResolver::new(Arc::new(FailingDistrictStore))
            .resolve("05401")
            .await;
        assert!(matched.is_default());
    }
}
