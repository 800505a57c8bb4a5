//! Snow-day prediction.
//!
//! Each day's forecast is scored against the district's thresholds into three
//! independent probabilities. A closing implies conditions bad enough for a
//! delay, so `delay >= full_closing` holds for every input.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use futures::future::join_all;
use std::sync::Arc;

use crate::constants::{
    AT_THRESHOLD_PROBABILITY, BASE_CONFIDENCE, BREEZY_WIND_MS, COLD_C, CONFIDENCE_FLOOR,
    DELAY_ICE_BUMP, DISMISSAL_GUST_MS, EXTREME_COLD_C, FULL_CLOSING_ICE_BUMP,
    DISTRICT_TIMEZONE, MAX_EARLY_DISMISSAL_FROM_TREND, MIN_AFTERNOON_SNOW_CM,
    OVER_THRESHOLD_SLOPE, PREDICTION_HORIZON_DAYS, STRONG_WIND_MS,
};
use crate::districts::DistrictResolver;
use crate::domain::{
    DistrictMatch, ForecastDay, Location, PredictionResult, Probability, Thresholds,
    WeekPrediction,
};
use crate::error::{SnowcastError, SnowcastResult};
use crate::formatters::{celsius_to_fahrenheit, cm_to_inches, ms_to_mph};
use crate::persistence::Recorder;
use crate::resolver::WeatherResolver;

pub struct PredictionEngine {
    districts: DistrictResolver,
    weather: Arc<WeatherResolver>,
    recorder: Recorder,
}

impl PredictionEngine {
    pub fn new(districts: DistrictResolver, weather: Arc<WeatherResolver>, recorder: Recorder) -> Self {
        Self {
            districts,
            weather,
            recorder,
        }
    }

    pub async fn predict(&self, identifier: &str, date: NaiveDate) -> SnowcastResult<PredictionResult> {
        self.predict_at(identifier, date, Utc::now()).await
    }

    /// Single-day prediction as of `now`. Fails only when no forecast for
    /// `date` can be obtained.
    pub async fn predict_at(
        &self,
        identifier: &str,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> SnowcastResult<PredictionResult> {
        require_identifier(identifier)?;
        let matched = self.districts.resolve(identifier).await;
        let forecast = self.weather.forecast(&district_location(&matched), date).await?;

        let days_ahead = (date - local_today(now)).num_days();
        let mut prediction = assess(&matched, forecast, days_ahead, now);
        prediction.thresholds = Some(matched.district().thresholds);

        tracing::info!(
            district = %prediction.district_id,
            date = %date,
            full_closing = prediction.full_closing.value,
            delay = prediction.delay.value,
            confidence = prediction.confidence,
            "Snow day prediction computed"
        );
        self.recorder.record_prediction(prediction.clone());
        Ok(prediction)
    }

    pub async fn predict_week(&self, identifier: &str) -> SnowcastResult<WeekPrediction> {
        self.predict_week_at(identifier, Utc::now()).await
    }

    /// Tomorrow through seven days out, in date order. Days whose forecast
    /// cannot be obtained are omitted; if none can, the call fails.
    pub async fn predict_week_at(&self, identifier: &str, now: DateTime<Utc>) -> SnowcastResult<WeekPrediction> {
        require_identifier(identifier)?;
        let matched = self.districts.resolve(identifier).await;
        let location = district_location(&matched);
        let today = local_today(now);

        let dates: Vec<NaiveDate> = (1..=PREDICTION_HORIZON_DAYS)
            .map(|offset| today + Duration::days(offset))
            .collect();

        let fetches = dates.iter().map(|&date| {
            let location = &location;
            async move { (date, self.weather.forecast(location, date).await) }
        });

        // join_all yields in input order, whatever order the fetches finish in.
        let mut predictions = Vec::with_capacity(dates.len());
        for (date, outcome) in join_all(fetches).await {
            match outcome {
                Ok(forecast) => {
                    let days_ahead = (date - today).num_days();
                    predictions.push(assess(&matched, forecast, days_ahead, now));
                }
                Err(e) => {
                    tracing::warn!(date = %date, error = %e, "Skipping day without forecast");
                }
            }
        }

        if predictions.is_empty() {
            return Err(SnowcastError::ForecastUnavailable {
                date: dates[0],
                reason: format!("no forecast could be obtained for any of the next {PREDICTION_HORIZON_DAYS} days"),
            });
        }

        Ok(WeekPrediction {
            district_name: matched.district().name.clone(),
            predictions,
        })
    }
}

/// Calendar date at the districts at instant `now`. Forecast days are local
/// dates, so day arithmetic must start here rather than from the UTC date.
pub fn local_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&DISTRICT_TIMEZONE).date_naive()
}

fn require_identifier(identifier: &str) -> SnowcastResult<()> {
    if identifier.trim().is_empty() {
        return Err(SnowcastError::InvalidInput("district identifier must not be empty".to_string()));
    }
    Ok(())
}

fn district_location(matched: &DistrictMatch) -> Location {
    let district = matched.district();
    Location {
        name: district.name.clone(),
        coordinates: Some(district.centroid),
    }
}

// ============================================================================
// Scoring
// ============================================================================

/// Raw scores before rounding, plus the factor lines that explain them
#[derive(Debug, Clone, PartialEq)]
pub struct Scores {
    pub full_closing: u8,
    pub delay: u8,
    pub early_dismissal: u8,
    pub factors: Vec<String>,
}

/// Builds a prediction (without thresholds attached) from one forecast day.
pub fn assess(
    matched: &DistrictMatch,
    forecast: ForecastDay,
    days_ahead: i64,
    now: DateTime<Utc>,
) -> PredictionResult {
    let district = matched.district();
    let mut scores = score(&forecast, &district.thresholds);
    if matched.is_default() {
        scores
            .factors
            .push("Using regional default thresholds (no district-specific record)".to_string());
    }

    PredictionResult {
        district_id: district.id.clone(),
        district_name: district.name.clone(),
        prediction_date: now,
        predicted_for: forecast.date,
        full_closing: Probability::new(scores.full_closing),
        delay: Probability::new(scores.delay),
        early_dismissal: Probability::new(scores.early_dismissal),
        confidence: confidence(&forecast, matched.is_default(), days_ahead),
        factors: scores.factors,
        forecast,
        thresholds: None,
        used_default_thresholds: matched.is_default(),
    }
}

/// Probability from an amount relative to a threshold: quadratic up to the
/// threshold, where it reaches the high-risk cut point, then linear to 100.
fn threshold_curve(amount: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return if amount > 0.0 { AT_THRESHOLD_PROBABILITY } else { 0.0 };
    }
    let ratio = (amount / threshold).max(0.0);
    if ratio >= 1.0 {
        AT_THRESHOLD_PROBABILITY + (OVER_THRESHOLD_SLOPE * (ratio - 1.0)).min(100.0 - AT_THRESHOLD_PROBABILITY)
    } else {
        AT_THRESHOLD_PROBABILITY * ratio * ratio
    }
}

/// Full bump at or above the ice threshold, half-proportional below it.
fn ice_bump(ice_cm: f64, threshold: f64, full_bump: f64) -> f64 {
    if ice_cm <= 0.0 {
        return 0.0;
    }
    if threshold <= 0.0 || ice_cm >= threshold {
        return full_bump;
    }
    full_bump * 0.5 * (ice_cm / threshold)
}

fn to_percent(value: f64) -> u8 {
    value.clamp(0.0, 100.0).round() as u8
}

pub fn score(forecast: &ForecastDay, thresholds: &Thresholds) -> Scores {
    let mut factors = Vec::new();
    let snow = forecast.snowfall_cm.unwrap_or(0.0).max(0.0);
    let ice = forecast.ice_cm.unwrap_or(0.0).max(0.0);
    let closing_in = cm_to_inches(thresholds.full_closing_snowfall_cm);
    let delay_in = cm_to_inches(thresholds.delay_snowfall_cm);

    let mut full = threshold_curve(snow, thresholds.full_closing_snowfall_cm);
    let mut delay = threshold_curve(snow, thresholds.delay_snowfall_cm);

    match forecast.snowfall_cm {
        None => factors.push("Snowfall amount unavailable in forecast".to_string()),
        Some(_) if snow >= thresholds.full_closing_snowfall_cm && snow > 0.0 => {
            let verb = if snow > thresholds.full_closing_snowfall_cm { "exceeding" } else { "meeting" };
            factors.push(format!(
                "{:.1} inches of snowfall forecast, {} full-closing threshold of {:.1} inches",
                cm_to_inches(snow),
                verb,
                closing_in
            ));
        }
        Some(_) if snow >= thresholds.delay_snowfall_cm && snow > 0.0 => factors.push(format!(
            "{:.1} inches of snowfall forecast, above delay threshold of {:.1} inches but below full-closing threshold of {:.1} inches",
            cm_to_inches(snow),
            delay_in,
            closing_in
        )),
        Some(_) if snow > 0.0 => factors.push(format!(
            "{:.1} inches of snowfall forecast, below delay threshold of {:.1} inches",
            cm_to_inches(snow),
            delay_in
        )),
        Some(_) => {}
    }

    if ice > 0.0 {
        full += ice_bump(ice, thresholds.ice_cm, FULL_CLOSING_ICE_BUMP);
        delay += ice_bump(ice, thresholds.ice_cm, DELAY_ICE_BUMP);
        let relation = if ice >= thresholds.ice_cm { "meeting" } else { "below" };
        factors.push(format!(
            "{:.2} inches of ice accumulation forecast, {} ice threshold of {:.2} inches",
            cm_to_inches(ice),
            relation,
            cm_to_inches(thresholds.ice_cm)
        ));
    }

    let mut early = 0.0;
    if let (Some(morning), Some(afternoon)) = (forecast.morning_snowfall_cm, forecast.afternoon_snowfall_cm) {
        if afternoon > morning && afternoon >= MIN_AFTERNOON_SNOW_CM {
            let scale = thresholds.delay_snowfall_cm.max(MIN_AFTERNOON_SNOW_CM);
            early += (50.0 * afternoon / scale).min(MAX_EARLY_DISMISSAL_FROM_TREND);
            factors.push(format!(
                "Snowfall intensifying through the day ({:.1} inches after noon vs {:.1} inches in the morning)",
                cm_to_inches(afternoon),
                cm_to_inches(morning)
            ));
        }
    }
    if let Some(gust) = forecast.wind_gust_ms {
        if gust >= DISMISSAL_GUST_MS {
            early += 10.0;
            factors.push(format!("Wind gusts up to {:.0} mph during the school day", ms_to_mph(gust)));
        }
    }

    let mut secondary = 0.0;
    if let Some(wind) = forecast.wind_speed_ms {
        let bump = if wind >= STRONG_WIND_MS {
            10.0
        } else if wind >= BREEZY_WIND_MS {
            5.0
        } else {
            0.0
        };
        if bump > 0.0 {
            secondary += bump;
            factors.push(format!("Sustained winds of {:.0} mph", ms_to_mph(wind)));
        }
    }
    if let Some(low) = forecast.temperature_c {
        let bump = if low <= EXTREME_COLD_C {
            10.0
        } else if low <= COLD_C {
            5.0
        } else {
            0.0
        };
        if bump > 0.0 {
            secondary += bump;
            factors.push(format!("Low temperature of {:.0}\u{00b0}F", celsius_to_fahrenheit(low)));
        }
    }

    let full_closing = to_percent(full + secondary);
    let delay = to_percent(delay + secondary).max(full_closing);
    let early_dismissal = to_percent(early + secondary);

    Scores {
        full_closing,
        delay,
        early_dismissal,
        factors,
    }
}

/// Starts high and loses points for every gap in the inputs.
pub fn confidence(forecast: &ForecastDay, defaulted: bool, days_ahead: i64) -> u8 {
    let mut confidence = BASE_CONFIDENCE;

    if forecast.snowfall_cm.is_none() {
        confidence -= 25;
    }
    if forecast.temperature_c.is_none() {
        confidence -= 5;
    }
    if forecast.wind_speed_ms.is_none() {
        confidence -= 5;
    }
    if forecast.ice_cm.is_none() {
        confidence -= 5;
    }
    if forecast.morning_snowfall_cm.is_none() && forecast.afternoon_snowfall_cm.is_none() {
        confidence -= 5;
    }
    if defaulted {
        confidence -= 15;
    }
    if days_ahead > 1 {
        confidence -= 3 * (days_ahead.min(30) as i32 - 1);
    }

    confidence.clamp(CONFIDENCE_FLOOR, 100) as u8
}
