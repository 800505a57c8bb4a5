//! Plow distribution and road-safety rating for a route.
//!
//! Unlike the fan-out paths, input here is validated fail-fast: a single
//! sample without usable coordinates rejects the whole call.

use crate::constants::PLOW_ROUTE_FOOTPRINT_KM;
use crate::domain::{Coordinates, Distribution, PlowLocation, PlowSample, SafetyLevel, SafetyRating};
use crate::error::{SnowcastError, SnowcastResult};
use crate::geo::{haversine_km, is_valid_latitude, is_valid_longitude};

pub fn rate(
    samples: &[PlowSample],
    route: &str,
    route_length_km: Option<f64>,
) -> SnowcastResult<(SafetyRating, Distribution)> {
    if let Some(length) = route_length_km {
        if !length.is_finite() || length <= 0.0 {
            return Err(SnowcastError::InvalidInput(format!(
                "route length must be a positive number of kilometres, got {length}"
            )));
        }
    }

    let plows = validate(samples)?;
    let distribution = distribute(&plows, route_length_km);

    let plows_per_10km = if distribution.coverage_length_km > 0.0 {
        plows.len() as f64 / distribution.coverage_length_km * 10.0
    } else {
        0.0
    };

    let rating = SafetyRating {
        route: route.to_string(),
        route_length_km,
        plows_per_10km,
        level: SafetyLevel::from_density(plows_per_10km),
    };

    tracing::debug!(
        route,
        plows = plows.len(),
        density = plows_per_10km,
        level = rating.level.label(),
        "Rated plow coverage"
    );
    Ok((rating, distribution))
}

/// Converts raw samples into locations, failing on the first bad one.
pub fn validate(samples: &[PlowSample]) -> SnowcastResult<Vec<PlowLocation>> {
    samples
        .iter()
        .enumerate()
        .map(|(i, sample)| {
            let latitude = match sample.latitude {
                None => return Err(invalid(i, sample, "is missing latitude")),
                Some(lat) if !is_valid_latitude(lat) => {
                    return Err(invalid(i, sample, &format!("has invalid latitude {lat}")))
                }
                Some(lat) => lat,
            };
            let longitude = match sample.longitude {
                None => return Err(invalid(i, sample, "is missing longitude")),
                Some(lon) if !is_valid_longitude(lon) => {
                    return Err(invalid(i, sample, &format!("has invalid longitude {lon}")))
                }
                Some(lon) => lon,
            };

            Ok(PlowLocation {
                id: sample.id.clone(),
                latitude,
                longitude,
                route: sample.route.clone(),
                direction: sample.direction.clone(),
                timestamp: sample.timestamp,
                status: sample.status.clone(),
            })
        })
        .collect()
}

fn invalid(index: usize, sample: &PlowSample, problem: &str) -> SnowcastError {
    SnowcastError::InvalidInput(format!(
        "plow sample at index {index} (id '{}') {problem}",
        sample.id
    ))
}

fn distribute(plows: &[PlowLocation], route_length_km: Option<f64>) -> Distribution {
    let points: Vec<Coordinates> = plows
        .iter()
        .map(|p| Coordinates {
            latitude: p.latitude,
            longitude: p.longitude,
        })
        .collect();

    let ordered = order_along_route(&points);
    let gaps: Vec<f64> = ordered
        .windows(2)
        .map(|pair| haversine_km(pair[0], pair[1]))
        .collect();

    let spread_km = match (ordered.first(), ordered.last()) {
        (Some(&first), Some(&last)) => haversine_km(first, last),
        _ => 0.0,
    };
    let largest_gap_km = gaps.iter().copied().fold(0.0, f64::max);
    let mean_spacing_km = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<f64>() / gaps.len() as f64
    };

    let (coverage_length_km, length_estimated) = match route_length_km {
        Some(length) => (length, false),
        None if points.is_empty() => (0.0, true),
        None => (spread_km + PLOW_ROUTE_FOOTPRINT_KM, true),
    };

    Distribution {
        plow_count: points.len(),
        centroid: centroid(&points),
        spread_km,
        largest_gap_km,
        mean_spacing_km,
        coverage_length_km,
        length_estimated,
    }
}

/// Orders points along whichever axis they spread across most, which for a
/// road-shaped cloud approximates travel order.
fn order_along_route(points: &[Coordinates]) -> Vec<Coordinates> {
    let mut ordered = points.to_vec();
    if ordered.len() < 2 {
        return ordered;
    }

    let (min_lat, max_lat) = bounds(ordered.iter().map(|p| p.latitude));
    let (min_lon, max_lon) = bounds(ordered.iter().map(|p| p.longitude));
    let mid_lat = ((min_lat + max_lat) / 2.0).to_radians();
    let lat_extent = max_lat - min_lat;
    let lon_extent = (max_lon - min_lon) * mid_lat.cos();

    if lat_extent >= lon_extent {
        ordered.sort_by(|a, b| a.latitude.total_cmp(&b.latitude));
    } else {
        ordered.sort_by(|a, b| a.longitude.total_cmp(&b.longitude));
    }
    ordered
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

fn centroid(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    Some(Coordinates {
        latitude: points.iter().map(|p| p.latitude).sum::<f64>() / n,
        longitude: points.iter().map(|p| p.longitude).sum::<f64>() / n,
    })
}
