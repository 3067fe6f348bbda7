use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound on the number of context entries a `GenerationError` carries.
pub const MAX_CONTEXT_ENTRIES: usize = 8;

/// Failures that abort an advice generation call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdviceError {
    #[error("snapshot series is empty")]
    EmptySnapshotSeries,

    #[error("non-finite value in {field}")]
    NonFiniteValue { field: String },

    #[error("{field} is {age}, above the supported maximum of {max}")]
    AgeOutOfRange { field: String, age: u32, max: u32 },

    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("{strategy} strategy failed: {reason}")]
    StrategyFailure {
        strategy: &'static str,
        reason: String,
    },
}

impl AdviceError {
    pub fn non_finite(field: impl Into<String>) -> Self {
        AdviceError::NonFiniteValue {
            field: field.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AdviceError::EmptySnapshotSeries => ErrorKind::EmptySnapshotSeries,
            AdviceError::NonFiniteValue { .. } => ErrorKind::NonFiniteValue,
            AdviceError::AgeOutOfRange { .. } => ErrorKind::AgeOutOfRange,
            AdviceError::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            AdviceError::StrategyFailure { .. } => ErrorKind::StrategyFailure,
        }
    }
}

pub type AdviceResult<T> = Result<T, AdviceError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    EmptySnapshotSeries,
    NonFiniteValue,
    AgeOutOfRange,
    InvalidConfiguration,
    StrategyFailure,
    InvalidPersonTarget,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Text(String),
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::Text(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::Text(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

impl From<i64> for ContextValue {
    fn from(value: i64) -> Self {
        ContextValue::Integer(value)
    }
}

impl From<usize> for ContextValue {
    fn from(value: usize) -> Self {
        ContextValue::Integer(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationError {
    pub code: ErrorKind,
    pub message: String,
    pub severity: Severity,
    #[serde(default)]
    pub context: BTreeMap<String, ContextValue>,
}

impl GenerationError {
    pub fn warning(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity: Severity::Warning,
            context: BTreeMap::new(),
        }
    }

    pub fn critical(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            severity: Severity::Critical,
            context: BTreeMap::new(),
        }
    }

    /// Adds a context entry; entries past `MAX_CONTEXT_ENTRIES` are dropped.
    pub fn with_context(mut self, key: &str, value: impl Into<ContextValue>) -> Self {
        if self.context.len() < MAX_CONTEXT_ENTRIES || self.context.contains_key(key) {
            self.context.insert(key.to_string(), value.into());
        }
        self
    }
}

impl From<&AdviceError> for GenerationError {
    fn from(err: &AdviceError) -> Self {
        let generation_error = GenerationError::critical(err.kind(), err.to_string());
        match err {
            AdviceError::NonFiniteValue { field } => {
                generation_error.with_context("field", field.as_str())
            }
            AdviceError::AgeOutOfRange { field, age, .. } => generation_error
                .with_context("field", field.as_str())
                .with_context("age", i64::from(*age)),
            AdviceError::StrategyFailure { strategy, .. } => {
                generation_error.with_context("strategy", *strategy)
            }
            AdviceError::EmptySnapshotSeries | AdviceError::InvalidConfiguration { .. } => {
                generation_error
            }
        }
    }
}
