use thiserror::Error;

/// Crate-wide result alias, mirroring the error surface below.
pub type Result<T> = std::result::Result<T, SignpostError>;

/// Closed error surface for the policy engine.
///
/// Every variant maps to one of the error kinds in the specification:
/// repository misses are recoverable by the caller, malformed policy
/// documents are recoverable by fixing the data, and
/// `PathNormalizationFailed` is fatal (it should never be reachable from
/// well-formed UTF-8 input).
#[derive(Debug, Error)]
pub enum SignpostError {
    #[error("policy not found: {name}")]
    PolicyNotFound { name: String },

    #[error("policies not found: {names:?}")]
    MultiplePoliciesNotFound { names: Vec<String> },

    #[error("invalid policy data: {reason}")]
    InvalidPolicyData { reason: String },

    #[error("unknown capability: {value}")]
    UnknownCapability { value: String },

    #[error("unknown effect: {value}")]
    UnknownEffect { value: String },

    #[error("path normalization failed for {path:?}: {reason}")]
    PathNormalizationFailed { path: String, reason: String },

    #[error("failed to compile pattern {pattern:?}: {reason}")]
    PatternCompile { pattern: String, reason: String },

    #[error("unsupported condition value for key {key:?}")]
    UnsupportedConditionValue { key: String },

    #[error("usage error: {reason}")]
    UsageError { reason: String },
}
