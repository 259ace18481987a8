use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::IngestError;
use crate::mining::Stage;
use crate::recommend::QueryError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("{stage} thresholds must not be empty")]
    EmptyThresholds { stage: Stage },
    #[error("{stage} threshold {value} is outside (0, 1]")]
    ThresholdOutOfRange { stage: Stage, value: f64 },
    #[error("{stage} thresholds must be strictly decreasing ({previous} is followed by {next})")]
    ThresholdsNotDecreasing { stage: Stage, previous: f64, next: f64 },
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error(transparent)]
    Ingestion(#[from] IngestError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ApplicationError {
    /// Stable machine-readable class used in command payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "domain_invariant",
            Self::Configuration(_) => "config_validation",
            Self::Ingestion(_) => "dataset_ingestion",
            Self::Query(_) => "invalid_query",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Ingestion(_) => 3,
            Self::Query(_) => 4,
            Self::Domain(_) => 5,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) | Self::Domain(_) => {
                "The configuration is invalid. Run `basketry config` to inspect effective values."
            }
            Self::Ingestion(_) => {
                "The transaction dataset could not be loaded. Check the path and column names."
            }
            Self::Query(_) => "Please enter at least one item.",
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigError;
    use crate::errors::{ApplicationError, DomainError};
    use crate::mining::Stage;
    use crate::recommend::QueryError;

    #[test]
    fn domain_error_messages_name_the_stage() {
        let error = DomainError::ThresholdsNotDecreasing {
            stage: Stage::Confidence,
            previous: 0.1,
            next: 0.2,
        };
        assert_eq!(
            error.to_string(),
            "confidence thresholds must be strictly decreasing (0.1 is followed by 0.2)"
        );
    }

    #[test]
    fn configuration_error_maps_to_config_validation_class() {
        let error = ApplicationError::from(ConfigError::Validation("bad".to_owned()));
        assert_eq!(error.error_class(), "config_validation");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn query_error_has_user_safe_message() {
        let error = ApplicationError::from(QueryError::Empty);
        assert_eq!(error.error_class(), "invalid_query");
        assert_eq!(error.user_message(), "Please enter at least one item.");
    }
}
