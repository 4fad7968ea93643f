//! Bounded polling with exponential backoff.
//!
//! The remote store only offers eventually-consistent reads: a table that was just created may
//! not be listed yet and its status moves through several states before settling. Every wait in
//! the reconciler goes through a [`Poller`], which re-runs a probe until a predicate holds or
//! its attempt budget is exhausted.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use config::shared::WaitConfig;
use thiserror::Error;
use tracing::info;

use crate::error::{ErrorKind, ReconcileResult};
use crate::reconcile_error;
use crate::types::Region;

/// Source attached to [`ErrorKind::PollTimeout`] errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("exhausted all {attempts} attempts waiting for {subject} in {region} to be {condition}")]
pub struct PollTimeoutError {
    pub subject: String,
    pub region: Region,
    pub condition: String,
    pub attempts: u32,
}

/// What a poll waits for, used for logging and for the timeout error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    subject: String,
    region: Region,
    condition: String,
}

impl PollTarget {
    pub fn new(subject: impl Into<String>, region: Region, condition: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            region,
            condition: condition.into(),
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn region(&self) -> &Region {
        &self.region
    }

    pub fn condition(&self) -> &str {
        &self.condition
    }
}

impl fmt::Display for PollTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} ({})", self.subject, self.region, self.condition)
    }
}

/// Delays applied before each attempt of a poll.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffSchedule {
    max_attempts: u32,
    initial_delay: Duration,
    backoff_multiplier: f64,
    max_delay: Duration,
}

impl BackoffSchedule {
    pub fn new(
        max_attempts: u32,
        initial_delay: Duration,
        backoff_multiplier: f64,
        max_delay: Duration,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            backoff_multiplier,
            max_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay preceding `attempt`, counted from 1.
    ///
    /// delay = initial_delay * multiplier^(attempt - 1), capped at `max_delay`.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let delay_ms = self.initial_delay.as_millis() as f64 * factor;
        let capped_ms = delay_ms.min(self.max_delay.as_millis() as f64);

        Duration::from_millis(capped_ms as u64)
    }

    /// Delays before every attempt, in order.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..=self.max_attempts).map(|attempt| self.delay_before(attempt))
    }

    /// Total time spent sleeping when every attempt fails.
    pub fn total_delay(&self) -> Duration {
        self.delays().sum()
    }
}

impl From<&WaitConfig> for BackoffSchedule {
    fn from(config: &WaitConfig) -> Self {
        Self::new(
            config.max_attempts,
            config.initial_delay(),
            config.backoff_multiplier,
            config.max_delay(),
        )
    }
}

/// Re-runs a probe until its result satisfies a predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Poller {
    schedule: BackoffSchedule,
}

impl Poller {
    pub fn new(schedule: BackoffSchedule) -> Self {
        Self { schedule }
    }

    pub fn from_config(config: &WaitConfig) -> Self {
        Self::new(BackoffSchedule::from(config))
    }

    /// Polls `probe` until `predicate` accepts its result and returns that result.
    ///
    /// Every attempt, the first one included, is preceded by a delay. At most
    /// `max_attempts` probes are made. An error returned by the probe ends the poll
    /// immediately; running out of attempts fails with [`ErrorKind::PollTimeout`] carrying a
    /// [`PollTimeoutError`].
    pub async fn poll<T, P, Fut, F>(
        &self,
        target: &PollTarget,
        mut probe: P,
        predicate: F,
    ) -> ReconcileResult<T>
    where
        P: FnMut() -> Fut,
        Fut: Future<Output = ReconcileResult<T>>,
        F: Fn(&T) -> bool,
    {
        let max_attempts = self.schedule.max_attempts;

        for attempt in 1..=max_attempts {
            let delay = self.schedule.delay_before(attempt);
            if attempt > 1 {
                info!(
                    subject = target.subject(),
                    region = %target.region(),
                    condition = target.condition(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "condition not met yet, will probe again"
                );
            }
            tokio::time::sleep(delay).await;

            let value = probe().await?;
            if predicate(&value) {
                return Ok(value);
            }
        }

        let timeout = PollTimeoutError {
            subject: target.subject.clone(),
            region: target.region.clone(),
            condition: target.condition.clone(),
            attempts: max_attempts,
        };

        Err(reconcile_error!(
            ErrorKind::PollTimeout,
            "Exhausted all attempts waiting for a condition",
            timeout.to_string(),
            source: timeout
        ))
    }
}
