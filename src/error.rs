//! Error kinds surfaced by the aggregation core.
//!
//! Failures inside a fan-out (one alert source, one traffic category) never
//! reach this type; they are logged and replaced by an empty result at the
//! source boundary.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::ProviderId;

pub type SnowcastResult<T> = Result<T, SnowcastError>;

/// One failed attempt inside a fallback chain
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub provider: ProviderId,
    pub reason: String,
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.provider, self.reason)
    }
}

#[derive(Error, Debug)]
pub enum SnowcastError {
    /// An explicitly requested provider failed or timed out
    #[error("Weather provider {provider} is unavailable: {reason}")]
    ProviderUnavailable { provider: ProviderId, reason: String },

    /// Every provider in the fallback chain failed
    #[error("No weather provider available ({})", join_attempts(.attempts))]
    NoProviderAvailable { attempts: Vec<AttemptFailure> },

    #[error("Forecast unavailable for {date}: {reason}")]
    ForecastUnavailable { date: NaiveDate, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn join_attempts(attempts: &[AttemptFailure]) -> String {
    if attempts.is_empty() {
        return "no providers configured".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
