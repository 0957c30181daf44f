//! Input rules checked before any store call.
//!
//! Mirrors the editor pages: metadata needs a name of at least 2 characters
//! and a description of at least 5; a link needs a process, a task and a form.

use crate::error::{Result, StudioError};
use crate::types::RecordId;
use std::fmt;

pub const NAME_MIN_CHARS: usize = 2;
pub const DESCRIPTION_MIN_CHARS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check name/description. `None` means the field is not being written
/// (partial update) and is skipped.
pub fn validate_metadata(name: Option<&str>, description: Option<&str>) -> Vec<FieldError> {
    let mut errors = Vec::new();

    if let Some(name) = name {
        if name.chars().count() < NAME_MIN_CHARS {
            errors.push(FieldError::new(
                "name",
                format!("Name must be at least {} characters", NAME_MIN_CHARS),
            ));
        }
    }

    if let Some(description) = description {
        if description.chars().count() < DESCRIPTION_MIN_CHARS {
            errors.push(FieldError::new(
                "description",
                format!(
                    "Description must be at least {} characters",
                    DESCRIPTION_MIN_CHARS
                ),
            ));
        }
    }

    errors
}

pub fn validate_link(
    process_id: Option<RecordId>,
    task_id: Option<&str>,
    form_id: Option<RecordId>,
) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if process_id.is_none() {
        errors.push(FieldError::new("processId", "Process is required"));
    }
    if task_id.map_or(true, str::is_empty) {
        errors.push(FieldError::new("taskId", "Task is required"));
    }
    if form_id.is_none() {
        errors.push(FieldError::new("formId", "Form is required"));
    }
    errors
}

/// Turn collected field errors into `StudioError::Validation`.
pub fn ensure_valid(errors: Vec<FieldError>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StudioError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_metadata_minimum_lengths() {
        let errors = validate_metadata(Some("A"), Some("abcd"));
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "name");
        assert_eq!(errors[1].field, "description");

        assert!(validate_metadata(Some("Ab"), Some("abcde")).is_empty());
    }

    #[test]
    fn test_metadata_counts_characters_not_bytes() {
        // "Çã" is 2 characters, 4 bytes.
        assert!(validate_metadata(Some("Çã"), None).is_empty());
        assert_eq!(validate_metadata(Some("Ç"), None).len(), 1);
    }

    #[test]
    fn test_metadata_skips_absent_fields() {
        assert!(validate_metadata(None, None).is_empty());
        assert_eq!(validate_metadata(None, Some("x")).len(), 1);
    }

    #[test]
    fn test_link_requires_all_three() {
        let errors = validate_link(None, Some(""), None);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["processId", "taskId", "formId"]);

        let ok = validate_link(Some(Uuid::new_v4()), Some("Task_1"), Some(Uuid::new_v4()));
        assert!(ok.is_empty());
    }

    #[test]
    fn test_ensure_valid() {
        assert!(ensure_valid(vec![]).is_ok());
        let err = ensure_valid(vec![FieldError::new("name", "bad")]).unwrap_err();
        assert!(matches!(err, StudioError::Validation(ref v) if v.len() == 1));
    }
}
