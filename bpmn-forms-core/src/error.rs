use crate::types::{RecordId, RecordKind};
use crate::validation::FieldError;
use std::fmt;

pub type Result<T> = std::result::Result<T, StudioError>;

/// Which document format failed to import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Diagram,
    FormSchema,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Diagram => f.write_str("diagram"),
            DocumentFormat::FormSchema => f.write_str("form schema"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: RecordId },

    #[error("validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("failed to import {format} document: {reason}")]
    Import {
        format: DocumentFormat,
        reason: String,
    },

    #[error("task {task_id} is not a user task of process {process_id}")]
    UnknownTask {
        process_id: RecordId,
        task_id: String,
    },

    #[error("submission blocked: {0}")]
    NotReady(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("internal: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StudioError {
    pub fn not_found(kind: RecordKind, id: RecordId) -> Self {
        StudioError::NotFound { kind, id }
    }

    pub fn import(format: DocumentFormat, reason: impl Into<String>) -> Self {
        StudioError::Import {
            format,
            reason: reason.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StudioError::NotFound { .. })
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
