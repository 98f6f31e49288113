//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. Validation is a
//! pure function that reports every problem, not just the first one.

use crate::config::schema::ServerConfig;

/// A single semantic problem in a [`ServerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("recv_buffer_size must be greater than zero")]
    ZeroRecvBuffer,

    #[error("max_in_flight must be greater than zero when set")]
    ZeroInFlightLimit,

    #[error("backoff.initial_ms must be greater than zero")]
    ZeroInitialBackoff,

    #[error("backoff.initial_ms ({initial_ms}) exceeds backoff.max_ms ({max_ms})")]
    BackoffRange { initial_ms: u64, max_ms: u64 },
}

/// Check a configuration, collecting all errors.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.recv_buffer_size == 0 {
        errors.push(ValidationError::ZeroRecvBuffer);
    }

    if config.max_in_flight == Some(0) {
        errors.push(ValidationError::ZeroInFlightLimit);
    }

    let backoff = &config.backoff;
    if backoff.initial_ms == 0 {
        errors.push(ValidationError::ZeroInitialBackoff);
    }
    if backoff.initial_ms > backoff.max_ms {
        errors.push(ValidationError::BackoffRange {
            initial_ms: backoff.initial_ms,
            max_ms: backoff.max_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BackoffConfig;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let config = ServerConfig {
            recv_buffer_size: 0,
            max_in_flight: Some(0),
            backoff: BackoffConfig {
                initial_ms: 2_000,
                max_ms: 1_000,
            },
            ..ServerConfig::default()
        };

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroRecvBuffer,
                ValidationError::ZeroInFlightLimit,
                ValidationError::BackoffRange {
                    initial_ms: 2_000,
                    max_ms: 1_000
                },
            ]
        );
    }

    #[test]
    fn zero_initial_backoff_rejected() {
        let config = ServerConfig {
            backoff: BackoffConfig {
                initial_ms: 0,
                max_ms: 1_000,
            },
            ..ServerConfig::default()
        };
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::ZeroInitialBackoff])
        );
    }
}
