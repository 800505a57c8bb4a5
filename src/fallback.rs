//! Ordered fallback across providers.
//!
//! A chain is a slice of capability-typed adapters. Adding a provider means
//! adding an adapter to the slice; the control flow lives here once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::ProviderId;
use crate::error::AttemptFailure;
use crate::providers::Provider;

/// Tries `attempt` against each provider in order until one succeeds.
///
/// Every attempt runs under its own `per_attempt` timeout. An error, a timeout
/// or a value rejected by `validate` moves on to the next provider. Returns the
/// winning provider's id with its value, or every failure in chain order.
pub async fn first_success<P, T, F, Fut, V>(
    chain: &[Arc<P>],
    per_attempt: Duration,
    mut attempt: F,
    validate: V,
) -> Result<(ProviderId, T), Vec<AttemptFailure>>
where
    P: Provider + ?Sized,
    F: FnMut(Arc<P>) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    V: Fn(&T) -> Result<(), String>,
{
    let mut failures = Vec::with_capacity(chain.len());

    for provider in chain {
        let id = provider.id();
        match run_one(Arc::clone(provider), per_attempt, &mut attempt, &validate).await {
            Ok(value) => {
                tracing::debug!(provider = %id, "Provider answered");
                return Ok((id, value));
            }
            Err(reason) => {
                tracing::warn!(provider = %id, reason = %reason, "Provider failed, trying next");
                failures.push(AttemptFailure { provider: id, reason });
            }
        }
    }

    Err(failures)
}

/// Runs a single provider under a timeout, flattening every failure mode into
/// a reason string.
pub async fn run_one<P, T, F, Fut, V>(
    provider: Arc<P>,
    per_attempt: Duration,
    attempt: &mut F,
    validate: &V,
) -> Result<T, String>
where
    P: Provider + ?Sized,
    F: FnMut(Arc<P>) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    V: Fn(&T) -> Result<(), String>,
{
    match timeout(per_attempt, attempt(provider)).await {
        Err(_) => Err(format!("timed out after {}s", per_attempt.as_secs_f32())),
        Ok(Err(e)) => Err(format!("{e:#}")),
        Ok(Ok(value)) => {
            validate(&value).map_err(|reason| format!("invalid payload: {reason}"))?;
            Ok(value)
        }
    }
}
