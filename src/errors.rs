use thiserror::Error;

/// Errors raised when building attribution records or configuration.
///
/// Nothing on the attribution or provisioning paths returns this type: those
/// degrade to empty results instead. It only guards construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AttributionError {
    #[error("source key names must be non-empty")]
    EmptySourceKeyName,

    #[error("trigger key fragment must apply to at least one source key")]
    EmptyFragmentSourceKeys,

    #[error("invalid aggregation key `{0}`")]
    InvalidAggregationKey(String),

    #[error("invalid coordinator configuration: {0}")]
    InvalidConfig(String),
}
