use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Backoff schedule for waiting on an eventually-consistent condition.
///
/// Every attempt is preceded by a delay. The first delay is `initial_delay_ms`; after each
/// unsuccessful attempt the delay is multiplied by `backoff_multiplier` and capped at
/// `max_delay_ms`. When a wait is configured explicitly, all fields must be provided.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaitConfig {
    /// Maximum number of probes before the wait fails.
    pub max_attempts: u32,
    /// Delay before the first probe, in milliseconds.
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after every unsuccessful probe.
    pub backoff_multiplier: f64,
    /// Upper bound for the delay between probes, in milliseconds.
    pub max_delay_ms: u64,
}

impl WaitConfig {
    /// Upper bound applied to both built-in presets.
    pub const DEFAULT_MAX_DELAY_MS: u64 = 10_000;

    /// Preset used while waiting for tables to reach a given status.
    pub fn table_status() -> Self {
        Self {
            max_attempts: 10,
            initial_delay_ms: 2_000,
            backoff_multiplier: 1.5,
            max_delay_ms: Self::DEFAULT_MAX_DELAY_MS,
        }
    }

    /// Preset used while waiting for a table to show up in tag listings.
    ///
    /// Tag listings are served by a separate service and lag behind table creation, hence the
    /// larger attempt budget.
    pub fn tags_visible() -> Self {
        Self {
            max_attempts: 15,
            initial_delay_ms: 2_000,
            backoff_multiplier: 1.5,
            max_delay_ms: Self::DEFAULT_MAX_DELAY_MS,
        }
    }

    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Validates the schedule; `name` identifies the wait in error messages.
    pub fn validate(&self, name: &'static str) -> Result<(), ValidationError> {
        if self.max_attempts == 0 {
            return Err(ValidationError::WaitMaxAttemptsZero(name));
        }

        if !(self.backoff_multiplier >= 1.0) {
            return Err(ValidationError::WaitBackoffMultiplierTooSmall(
                name,
                self.backoff_multiplier,
            ));
        }

        if self.max_delay_ms < self.initial_delay_ms {
            return Err(ValidationError::WaitMaxDelayBelowInitial(name));
        }

        Ok(())
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self::table_status()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(WaitConfig::table_status().validate("table_status_wait"), Ok(()));
        assert_eq!(WaitConfig::tags_visible().validate("tags_visible_wait"), Ok(()));
        assert_eq!(WaitConfig::tags_visible().max_attempts, 15);
    }

    #[test]
    fn rejects_zero_attempts_and_shrinking_backoff() {
        let mut config = WaitConfig::table_status();
        config.max_attempts = 0;
        assert_eq!(
            config.validate("wait"),
            Err(ValidationError::WaitMaxAttemptsZero("wait"))
        );

        let mut config = WaitConfig::table_status();
        config.backoff_multiplier = 0.5;
        assert!(matches!(
            config.validate("wait"),
            Err(ValidationError::WaitBackoffMultiplierTooSmall("wait", _))
        ));

        let mut config = WaitConfig::table_status();
        config.backoff_multiplier = f64::NAN;
        assert!(config.validate("wait").is_err());
    }
}
