use crate::domain::{
    Distribution, PredictionResult, Probability, RoadRecord, RoadReport, SafetyRating,
    UnifiedAlert, WeatherSnapshot, WeekPrediction,
};

// ============================================================================
// Unit conversions (presentation only; stored records stay metric)
// ============================================================================

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn ms_to_mph(ms: f64) -> f64 {
    ms * 2.236_936
}

pub fn cm_to_inches(cm: f64) -> f64 {
    cm / 2.54
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / 25.4
}

pub fn hpa_to_inhg(hpa: f64) -> f64 {
    hpa * 0.029_53
}

// ============================================================================
// Text output
// ============================================================================

/// Formats a current-weather snapshot into a human-readable string
pub fn format_snapshot(snapshot: &WeatherSnapshot) -> String {
    format!(
        "Current Weather for {}:\n  Conditions: {}\n  Temperature: {:.1}\u{00b0}F ({:.1}\u{00b0}C)\n  Humidity: {:.0}%\n  Pressure: {:.2} inHg\n  Wind: {:.0} mph\n  Observed: {}\n  Source: {}\n",
        snapshot.location,
        snapshot.description,
        celsius_to_fahrenheit(snapshot.temperature_c),
        snapshot.temperature_c,
        snapshot.humidity,
        hpa_to_inhg(snapshot.pressure_hpa),
        ms_to_mph(snapshot.wind_speed_ms),
        snapshot.timestamp.format("%Y-%m-%d %H:%M UTC"),
        snapshot.source
    )
}

/// Formats weather alerts into a human-readable string
pub fn format_alerts(alerts: &[UnifiedAlert]) -> String {
    if alerts.is_empty() {
        return "No active weather alerts.".to_string();
    }

    let mut output = String::from("Active Alerts:\n\n");
    for (i, alert) in alerts.iter().enumerate() {
        output.push_str(&format!(
            "Alert {}:\n  Event: {}\n  Severity: {}\n  Source: {}\n  Title: {}\n",
            i + 1,
            alert.name,
            alert.severity.label(),
            alert.source,
            alert.title
        ));
        if let Some(issued) = alert.issue_time {
            output.push_str(&format!("  Issued: {}\n", issued.format("%Y-%m-%d %H:%M UTC")));
        }
        if let Some(expires) = alert.expires_time {
            output.push_str(&format!("  Expires: {}\n", expires.format("%Y-%m-%d %H:%M UTC")));
        }
        if !alert.body.is_empty() {
            output.push_str(&format!("  Details: {}\n", alert.body));
        }
        output.push('\n');
    }
    output
}

fn format_probability(label: &str, probability: &Probability) -> String {
    format!(
        "  {}: {}% ({})\n",
        label,
        probability.value,
        probability.category.label()
    )
}

/// Formats a single-day snow-day prediction into a human-readable string
pub fn format_prediction(prediction: &PredictionResult) -> String {
    let forecast = &prediction.forecast;
    let mut output = format!(
        "Snow Day Prediction for {} on {}:\n",
        prediction.district_name,
        prediction.predicted_for.format("%A, %B %-d, %Y")
    );
    output.push_str(&format_probability("Full closing", &prediction.full_closing));
    output.push_str(&format_probability("Delay", &prediction.delay));
    output.push_str(&format_probability("Early dismissal", &prediction.early_dismissal));
    output.push_str(&format!("  Confidence: {}%\n", prediction.confidence));

    output.push_str(&format!("  Forecast: {}", forecast.condition));
    if let Some(snow) = forecast.snowfall_cm {
        output.push_str(&format!(", {:.1} in snow", cm_to_inches(snow)));
    }
    if let Some(precip) = forecast.precipitation_mm {
        output.push_str(&format!(", {:.2} in precipitation", mm_to_inches(precip)));
    }
    if let Some(low) = forecast.temperature_c {
        output.push_str(&format!(", low {:.0}\u{00b0}F", celsius_to_fahrenheit(low)));
    }
    if let Some(wind) = forecast.wind_speed_ms {
        output.push_str(&format!(", wind {:.0} mph", ms_to_mph(wind)));
    }
    output.push('\n');

    if let Some(thresholds) = &prediction.thresholds {
        output.push_str(&format!(
            "  Thresholds: closing {:.1} in, delay {:.1} in, ice {:.2} in{}\n",
            cm_to_inches(thresholds.full_closing_snowfall_cm),
            cm_to_inches(thresholds.delay_snowfall_cm),
            cm_to_inches(thresholds.ice_cm),
            if prediction.used_default_thresholds { " (regional defaults)" } else { "" }
        ));
    }

    if !prediction.factors.is_empty() {
        output.push_str("  Factors:\n");
        for factor in &prediction.factors {
            output.push_str(&format!("    - {}\n", factor));
        }
    }
    output
}

/// Formats a multi-day outlook, one line per day
pub fn format_week(week: &WeekPrediction) -> String {
    let mut output = format!("Snow Day Outlook for {}:\n\n", week.district_name);
    for prediction in &week.predictions {
        let snow = prediction
            .forecast
            .snowfall_cm
            .map(|cm| format!("{:.1} in", cm_to_inches(cm)))
            .unwrap_or_else(|| "unknown".to_string());
        output.push_str(&format!(
            "{}: closing {}% ({}), delay {}% ({}), early dismissal {}%, snow {}, confidence {}%\n",
            prediction.predicted_for.format("%a %b %-d"),
            prediction.full_closing.value,
            prediction.full_closing.category.label(),
            prediction.delay.value,
            prediction.delay.category.label(),
            prediction.early_dismissal.value,
            snow,
            prediction.confidence
        ));
    }
    output
}

/// Formats a plow-coverage rating into a human-readable string
pub fn format_safety(rating: &SafetyRating, distribution: &Distribution) -> String {
    let mut output = format!(
        "Road Safety for {}:\n  Rating: {}\n  Plows: {}\n  Density: {:.2} plows per 10 km\n",
        rating.route,
        rating.level.label(),
        distribution.plow_count,
        rating.plows_per_10km
    );
    output.push_str(&format!(
        "  Coverage length: {:.1} km{}\n",
        distribution.coverage_length_km,
        if distribution.length_estimated { " (estimated)" } else { "" }
    ));
    if distribution.plow_count > 1 {
        output.push_str(&format!(
            "  Spread: {:.1} km, largest gap {:.1} km, mean spacing {:.1} km\n",
            distribution.spread_km, distribution.largest_gap_km, distribution.mean_spacing_km
        ));
    }
    output
}

fn format_road_section(output: &mut String, heading: &str, records: &[RoadRecord]) {
    output.push_str(&format!("{} ({}):\n", heading, records.len()));
    for record in records {
        output.push_str(&format!("  {}: {}\n", record.road, record.description));
    }
    output.push('\n');
}

/// Formats the four-category road report into a human-readable string
pub fn format_road_report(location: &str, report: &RoadReport) -> String {
    let mut output = format!("Road Conditions near {}:\n\n", location);
    format_road_section(&mut output, "Incidents", &report.incidents);
    format_road_section(&mut output, "Closures", &report.closures);
    format_road_section(&mut output, "Road sensors", &report.sensors);
    format_road_section(&mut output, "Surface conditions", &report.conditions);
    output
}
