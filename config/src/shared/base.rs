use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A wait must probe at least once.
    #[error("`{0}.max_attempts` cannot be zero")]
    WaitMaxAttemptsZero(&'static str),
    /// Backoff must never shrink the delay between attempts.
    #[error("`{0}.backoff_multiplier` must be at least 1.0, got {1}")]
    WaitBackoffMultiplierTooSmall(&'static str, f64),
    /// The delay cap is below the first delay.
    #[error("`{0}.max_delay_ms` must be greater than or equal to `initial_delay_ms`")]
    WaitMaxDelayBelowInitial(&'static str),
    /// The master region is required to know which table must never be torn down.
    #[error("`reconciler.master_region` cannot be empty")]
    MasterRegionEmpty,
}
