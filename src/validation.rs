//! Project name validation for deployment requests.
//!
//! The rules mirror what downstream GitHub/Vercel accept for repository and
//! project names: non-empty, at most [`MAX_PROJECT_NAME_LENGTH`] characters,
//! starting with an alphanumeric character and containing only alphanumerics,
//! dots, underscores, and hyphens. Callers are expected to trim input first.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::error::{ApiError, validation_error};

/// Maximum accepted project name length in characters.
pub const MAX_PROJECT_NAME_LENGTH: usize = 100;

fn project_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").expect("project name pattern must compile")
    })
}

/// Reasons a project name can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProjectNameError {
    #[error("Project name is required and cannot be empty")]
    Empty,
    #[error("Project name cannot exceed {MAX_PROJECT_NAME_LENGTH} characters")]
    TooLong { length: usize },
    #[error(
        "Project name must start with a letter or digit and may only contain letters, digits, dots, underscores, and hyphens"
    )]
    InvalidCharacters,
}

impl ProjectNameError {
    /// Field-level details for problem+json responses.
    pub fn details(&self) -> serde_json::Value {
        match self {
            ProjectNameError::Empty => serde_json::json!({
                "field": "projectName",
                "message": "Project name must be provided and cannot be empty"
            }),
            ProjectNameError::TooLong { length } => serde_json::json!({
                "field": "projectName",
                "message": "Project name is too long",
                "max_length": MAX_PROJECT_NAME_LENGTH,
                "actual_length": length
            }),
            ProjectNameError::InvalidCharacters => serde_json::json!({
                "field": "projectName",
                "message": "Project name contains invalid characters"
            }),
        }
    }
}

impl From<ProjectNameError> for ApiError {
    fn from(err: ProjectNameError) -> Self {
        let details = err.details();
        validation_error(&err.to_string(), details)
    }
}

/// Validate an already-trimmed project name.
pub fn validate_project_name(name: &str) -> Result<(), ProjectNameError> {
    if name.is_empty() {
        return Err(ProjectNameError::Empty);
    }

    let length = name.chars().count();
    if length > MAX_PROJECT_NAME_LENGTH {
        return Err(ProjectNameError::TooLong { length });
    }

    if !project_name_pattern().is_match(name) {
        return Err(ProjectNameError::InvalidCharacters);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for name in ["my-app", "MyApp", "app_2", "a", "demo.site", "0day"] {
            assert_eq!(validate_project_name(name), Ok(()), "rejected {name}");
        }
    }

    #[test]
    fn rejects_empty_name() {
        assert_eq!(validate_project_name(""), Err(ProjectNameError::Empty));
    }

    #[test]
    fn rejects_overlong_name() {
        let name = "a".repeat(MAX_PROJECT_NAME_LENGTH + 1);
        assert_eq!(
            validate_project_name(&name),
            Err(ProjectNameError::TooLong {
                length: MAX_PROJECT_NAME_LENGTH + 1
            })
        );
    }

    #[test]
    fn accepts_name_at_limit() {
        let name = "a".repeat(MAX_PROJECT_NAME_LENGTH);
        assert_eq!(validate_project_name(&name), Ok(()));
    }

    #[test]
    fn rejects_invalid_characters() {
        for name in ["my app", "-leading-hyphen", ".hidden", "emoji🚀", "slash/y"] {
            assert_eq!(
                validate_project_name(name),
                Err(ProjectNameError::InvalidCharacters),
                "accepted {name}"
            );
        }
    }

    #[test]
    fn maps_to_validation_failed_api_error() {
        let api_error: ApiError = ProjectNameError::Empty.into();
        assert_eq!(api_error.code, Box::from("VALIDATION_FAILED"));
        assert!(api_error.details.is_some());
    }
}
