pub mod investigation;
pub mod validators;

use std::fmt;
use thiserror::Error;

use crate::vectra::error::VectraApiError;
use validators::ValidationError;

pub use investigation::InvestigationTools;

/// Failure of a tool invocation, carrying the operation context and the
/// message of whatever went wrong underneath.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{context}: {message}")]
pub struct ToolError {
    context: String,
    message: String,
}

impl ToolError {
    pub fn new(context: impl Into<String>, cause: impl fmt::Display) -> Self {
        Self {
            context: context.into(),
            message: cause.to_string(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Anything an operation can fail with before it is wrapped into a `ToolError`.
#[derive(Error, Debug)]
pub(crate) enum Failure {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] VectraApiError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
