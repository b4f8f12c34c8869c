use thiserror::Error;

/// Errors raised while declaring metric families.
///
/// Record operations have no recoverable failure modes; misuse at record time
/// (undeclared metric, wrong kind, mismatched label set) is a programming
/// error and panics instead.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metric name cannot be empty")]
    EmptyMetricName,

    #[error("metric `{0}` is already declared")]
    DuplicateMetric(String),

    #[error("metric `{0}`: label name cannot be empty")]
    EmptyLabelName(String),

    #[error("metric `{0}`: histogram boundaries must be finite and strictly ascending")]
    InvalidBuckets(String),
}
