/// User agent string for HTTP requests
pub const USER_AGENT: &str = "mcp-snowcast/0.1.0";

/// National Weather Service API base URL
pub const NWS_API_BASE: &str = "https://api.weather.gov";

/// Open-Meteo API base URL
pub const OPEN_METEO_API_BASE: &str = "https://api.open-meteo.com/v1";

/// OpenWeatherMap API base URL
pub const OPENWEATHERMAP_API_BASE: &str = "https://api.openweathermap.org/data/2.5";

/// WeatherAPI.com base URL
pub const WEATHERAPI_API_BASE: &str = "https://api.weatherapi.com/v1";

/// New England 511 traveler information API base URL
pub const TRAFFIC_511_API_BASE: &str = "https://newengland511.org/api/v2/get";

/// Per-attempt timeout applied to every provider call, in seconds
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 8;

/// Number of alerts returned when the caller does not ask for a limit
pub const DEFAULT_ALERT_LIMIT: usize = 10;

/// Traffic events further than this from the requested location are dropped
pub const TRAFFIC_RADIUS_KM: f64 = 60.0;

// ============================================================================
// Regional defaults (northern Vermont)
// ============================================================================

/// 4 inches of snow
pub const REGIONAL_FULL_CLOSING_SNOWFALL_CM: f64 = 10.16;

/// 2 inches of snow
pub const REGIONAL_DELAY_SNOWFALL_CM: f64 = 5.08;

/// A quarter inch of ice
pub const REGIONAL_ICE_CM: f64 = 0.635;

/// Geographic centre of Vermont, used when a location cannot be geocoded
pub const REGIONAL_CENTROID: (f64, f64) = (44.0459, -72.7107);

// ============================================================================
// Prediction scoring
// ============================================================================

/// Probability assigned when snowfall exactly meets a threshold
pub const AT_THRESHOLD_PROBABILITY: f64 = 75.0;

/// Points added per whole threshold multiple above the threshold
pub const OVER_THRESHOLD_SLOPE: f64 = 40.0;

pub const FULL_CLOSING_ICE_BUMP: f64 = 20.0;
pub const DELAY_ICE_BUMP: f64 = 25.0;

/// 20 mph
pub const BREEZY_WIND_MS: f64 = 8.9;
/// 30 mph
pub const STRONG_WIND_MS: f64 = 13.4;
/// 40 mph gusts make afternoon bus routes unsafe
pub const DISMISSAL_GUST_MS: f64 = 17.9;

/// 0 °F
pub const COLD_C: f64 = -17.8;
/// -10 °F
pub const EXTREME_COLD_C: f64 = -23.3;

/// Afternoon snowfall below this never triggers an early-dismissal signal
pub const MIN_AFTERNOON_SNOW_CM: f64 = 1.0;
pub const MAX_EARLY_DISMISSAL_FROM_TREND: f64 = 60.0;

pub const BASE_CONFIDENCE: i32 = 95;
pub const CONFIDENCE_FLOOR: i32 = 20;

/// Days predicted by a multi-day request, starting tomorrow
pub const PREDICTION_HORIZON_DAYS: i64 = 7;

/// Every district keeps Eastern time; "tomorrow" is tomorrow there
pub const DISTRICT_TIMEZONE: chrono_tz::Tz = chrono_tz::America::New_York;

// ============================================================================
// Category cut points, shared by predictions and plow ratings
// ============================================================================

pub const HIGH_RISK_CUTOFF: u8 = 75;
pub const MODERATE_RISK_CUTOFF: u8 = 55;

/// Plows per 10 km
pub const GOOD_COVERAGE_DENSITY: f64 = 2.0;
pub const FAIR_COVERAGE_DENSITY: f64 = 1.0;

/// Footprint assumed for a route when no length is supplied
pub const PLOW_ROUTE_FOOTPRINT_KM: f64 = 2.0;

/// Records kept per kind by the in-process store before the oldest is dropped
pub const MEMORY_STORE_CAPACITY: usize = 256;
