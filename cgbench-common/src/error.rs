use thiserror::Error;

use crate::types::Metric;

/// Main error type for cgbench
#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no render surface registered for metric '{metric}'")]
    MissingSurface { metric: Metric },

    #[error("malformed sample id '{id}': {reason}")]
    MalformedSample { id: String, reason: String },

    #[error("batch size mismatch: expected {expected} samples, got {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },

    #[error("invalid transition: event '{event}' in state '{state}'")]
    InvalidStateTransition { state: String, event: String },

    #[error("entity count must be at least 1, got {0}")]
    InvalidEntityCount(usize),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DashboardError {
    /// Recoverable errors are surfaced as warnings and never abort a run;
    /// everything else is fatal to the operation that produced it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DashboardError::MalformedSample { .. }
                | DashboardError::BatchSizeMismatch { .. }
                | DashboardError::InvalidStateTransition { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        let err = DashboardError::MalformedSample {
            id: "xyz".to_string(),
            reason: "no digits".to_string(),
        };
        assert!(err.is_recoverable());

        let err = DashboardError::MissingSurface {
            metric: Metric::Latency,
        };
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let err = DashboardError::BatchSizeMismatch {
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            err.to_string(),
            "batch size mismatch: expected 3 samples, got 2"
        );
    }
}
