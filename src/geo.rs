//! Static geocoding and great-circle distance.
//!
//! Live geocoding is deliberately absent; locations resolve through a fixed
//! table of towns the service covers, or through an explicit "lat,lon" pair.

use crate::domain::{Coordinates, Location};

const EARTH_RADIUS_KM: f64 = 6371.0;

struct KnownPlace {
    name: &'static str,
    latitude: f64,
    longitude: f64,
}

const KNOWN_PLACES: &[KnownPlace] = &[
    KnownPlace { name: "burlington", latitude: 44.4759, longitude: -73.2121 },
    KnownPlace { name: "south burlington", latitude: 44.4669, longitude: -73.1710 },
    KnownPlace { name: "winooski", latitude: 44.4914, longitude: -73.1857 },
    KnownPlace { name: "essex junction", latitude: 44.4906, longitude: -73.1115 },
    KnownPlace { name: "essex", latitude: 44.5195, longitude: -73.0590 },
    KnownPlace { name: "colchester", latitude: 44.5439, longitude: -73.1479 },
    KnownPlace { name: "shelburne", latitude: 44.3806, longitude: -73.2273 },
    KnownPlace { name: "williston", latitude: 44.4370, longitude: -73.0687 },
    KnownPlace { name: "milton", latitude: 44.6398, longitude: -73.1107 },
    KnownPlace { name: "st. albans", latitude: 44.8109, longitude: -73.0832 },
    KnownPlace { name: "montpelier", latitude: 44.2601, longitude: -72.5754 },
    KnownPlace { name: "barre", latitude: 44.1970, longitude: -72.5020 },
    KnownPlace { name: "stowe", latitude: 44.4654, longitude: -72.6874 },
    KnownPlace { name: "middlebury", latitude: 44.0153, longitude: -73.1673 },
    KnownPlace { name: "rutland", latitude: 43.6106, longitude: -72.9726 },
    KnownPlace { name: "brattleboro", latitude: 42.8509, longitude: -72.5579 },
    KnownPlace { name: "bennington", latitude: 42.8781, longitude: -73.1968 },
    KnownPlace { name: "st. johnsbury", latitude: 44.4192, longitude: -72.0151 },
    KnownPlace { name: "newport", latitude: 44.9364, longitude: -72.2051 },
    KnownPlace { name: "plattsburgh", latitude: 44.6995, longitude: -73.4529 },
];

/// Looks a place name up in the static table, longest name first so that
/// "South Burlington" is not mistaken for "Burlington".
///
/// Names match on whole words only: "Hamilton" does not contain Milton.
pub fn lookup_centroid(name: &str) -> Option<Coordinates> {
    let mut places: Vec<&KnownPlace> = KNOWN_PLACES.iter().collect();
    places.sort_by_key(|place| std::cmp::Reverse(place.name.len()));

    places
        .into_iter()
        .find(|place| mentions(name, place.name))
        .map(KnownPlace::coordinates)
}

/// Every known place named anywhere in `text`.
pub fn places_mentioned(text: &str) -> Vec<Coordinates> {
    KNOWN_PLACES
        .iter()
        .filter(|place| mentions(text, place.name))
        .map(KnownPlace::coordinates)
        .collect()
}

/// Whether `phrase` appears in `text` as a run of whole words.
///
/// Case and punctuation are ignored, so "St Albans" mentions "st. albans".
pub fn mentions(text: &str, phrase: &str) -> bool {
    let phrase = words(phrase);
    !phrase.is_empty() && format!(" {} ", words(text)).contains(&format!(" {phrase} "))
}

fn words(text: &str) -> String {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl KnownPlace {
    fn coordinates(&self) -> Coordinates {
        Coordinates {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

/// Parses "44.47,-73.21" style input.
pub fn parse_coordinates(text: &str) -> Option<Coordinates> {
    let (lat, lon) = text.split_once(',')?;
    let latitude: f64 = lat.trim().parse().ok()?;
    let longitude: f64 = lon.trim().parse().ok()?;
    if is_valid_latitude(latitude) && is_valid_longitude(longitude) {
        Some(Coordinates { latitude, longitude })
    } else {
        None
    }
}

/// Builds a `Location` from free text, attaching coordinates when the text is
/// either a coordinate pair or a known place.
pub fn locate(text: &str) -> Location {
    let name = text.trim().to_string();
    let coordinates = parse_coordinates(&name).or_else(|| lookup_centroid(&name));
    Location { name, coordinates }
}

pub fn is_valid_latitude(latitude: f64) -> bool {
    latitude.is_finite() && (-90.0..=90.0).contains(&latitude)
}

pub fn is_valid_longitude(longitude: f64) -> bool {
    longitude.is_finite() && (-180.0..=180.0).contains(&longitude)
}

/// Great-circle distance in kilometres
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `h` just past 1 for antipodal points.
    2.0 * EARTH_RADIUS_KM * h.min(1.0).sqrt().asin()
}
