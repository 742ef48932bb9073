//! Core error types for priomage-core.
//!
//! Each subsystem gets its own thiserror enum; [`CoreError`] aggregates them
//! so callers can propagate with `?` and still match on the failing layer.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for priomage-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// An input value is outside its declared domain
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Configuration or destination-field errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A computed value escaped its guaranteed range
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),

    /// GitHub API errors
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors for a single item's inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Effort value is not one of the known levels
    #[error("unrecognized effort level '{value}' (expected XS, Small, Medium, Large or XL)")]
    UnknownEffort { value: String },

    /// Impact is outside the configured range
    #[error("impact {value} is outside [{min}, {max}]")]
    ImpactOutOfRange { value: f64, min: f64, max: f64 },

    /// Due date could not be parsed
    #[error("malformed due date '{value}'")]
    MalformedDate { value: String },

    /// Goal weight is not a finite value in [0, 1]
    #[error("goal weight {value} is outside [0, 1]")]
    WeightOutOfRange { value: f64 },

    /// Effort dampening factor is not a finite value in [0, 1)
    #[error("effort factor {value} is outside [0, 1)")]
    EffortFactorOutOfRange { value: f64 },

    /// Urgency bonus is negative or not finite
    #[error("urgency bonus {value} must be a finite non-negative number")]
    UrgencyOutOfRange { value: f64 },

    /// A required field holds a value of the wrong type
    #[error("field '{field}' has unexpected type: {message}")]
    WrongType { field: String, message: String },
}

impl ValidationError {
    /// Name of the input field the error refers to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::UnknownEffort { .. } | ValidationError::EffortFactorOutOfRange { .. } => {
                "effort"
            }
            ValidationError::ImpactOutOfRange { .. } => "impact",
            ValidationError::MalformedDate { .. } | ValidationError::UrgencyOutOfRange { .. } => {
                "due"
            }
            ValidationError::WeightOutOfRange { .. } => "labels",
            ValidationError::WrongType { field, .. } => field,
        }
    }
}

/// Per-item failure: the item identifier plus what went wrong with it.
#[derive(Error, Debug)]
#[error("item {identifier}: {source}")]
pub struct ItemError {
    pub identifier: String,
    #[source]
    pub source: CoreError,
}

impl ItemError {
    pub fn new(identifier: impl Into<String>, source: impl Into<CoreError>) -> Self {
        Self {
            identifier: identifier.into(),
            source: source.into(),
        }
    }

    /// Failing field, when the underlying error is a validation error.
    pub fn field(&self) -> Option<&str> {
        match &self.source {
            CoreError::Validation(err) => Some(err.field()),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Missing required configuration key
    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    /// Destination field does not exist in the project
    #[error("No field named any of [{candidates}] in the project")]
    FieldNotFound { candidates: String },

    /// Destination field has a type the adapter cannot write
    #[error("Field '{name}' has unsupported type {data_type}")]
    UnsupportedFieldType { name: String, data_type: String },

    /// Single-select destination lacks one or more band options
    #[error("Single-select field is missing priority band options: {}", missing.join(", "))]
    MissingBandOptions { missing: Vec<String> },
}

/// A computed score escaped [0, 200] after clamping.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Logic invariant violated: score {value} is outside [0, 200]")]
pub struct InvariantViolation {
    pub value: f64,
}

/// GitHub GraphQL API errors.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("GitHub API error (HTTP {status}): {body}")]
    Status { status: u16, body: String },

    #[error("GraphQL errors: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("Unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("GitHub token not configured (set GITHUB_TOKEN or run `priomage auth login`)")]
    NotAuthenticated,

    #[error("Project {number} not found for organization '{organization}'")]
    ProjectNotFound { organization: String, number: u32 },
}

impl GitHubError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            GitHubError::Network(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            GitHubError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_reports_field() {
        let err = ValidationError::UnknownEffort {
            value: "huge".into(),
        };
        assert_eq!(err.field(), "effort");

        let err = ValidationError::ImpactOutOfRange {
            value: 500.0,
            min: 1.0,
            max: 100.0,
        };
        assert_eq!(err.field(), "impact");
    }

    #[test]
    fn item_error_carries_identifier_and_field() {
        let err = ItemError::new(
            "acme/api#12",
            ValidationError::MalformedDate {
                value: "next week".into(),
            },
        );
        assert_eq!(err.identifier, "acme/api#12");
        assert_eq!(err.field(), Some("due"));
        assert!(err.to_string().contains("acme/api#12"));
        assert!(err.to_string().contains("next week"));
    }

    #[test]
    fn missing_band_options_lists_names() {
        let err = ConfigError::MissingBandOptions {
            missing: vec!["Backlog".into(), "Low".into()],
        };
        assert!(err.to_string().contains("Backlog, Low"));
    }

    #[test]
    fn status_transience() {
        let server = GitHubError::Status {
            status: 502,
            body: String::new(),
        };
        let limited = GitHubError::Status {
            status: 429,
            body: String::new(),
        };
        let denied = GitHubError::Status {
            status: 401,
            body: String::new(),
        };
        assert!(server.is_transient());
        assert!(limited.is_transient());
        assert!(!denied.is_transient());
        assert!(!GitHubError::NotAuthenticated.is_transient());
    }
}
