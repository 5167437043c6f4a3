// src/error.rs

//! Unified error handling for the roster service.

use std::fmt;

use thiserror::Error;

/// Result type alias for roster operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upstream fetch failed (network, non-2xx status, body decoding)
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Roster body could not be read as XML
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// A container or field the pipeline depends on is missing
    #[error("Structural error: missing container '{context}'")]
    Structural { context: String },

    /// A rename would overwrite a populated field
    #[error("Field collision on '{field}': refusing to overwrite with '{source_field}'")]
    FieldCollision { field: String, source_field: String },

    /// Upstream fetch failed outside the HTTP client (e.g. a non-HTTP source)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Configuration validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a structural error for a missing container or field.
    pub fn structural(context: impl Into<String>) -> Self {
        Self::Structural {
            context: context.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create a rename collision error.
    pub fn field_collision(field: impl Into<String>, source_field: impl Into<String>) -> Self {
        Self::FieldCollision {
            field: field.into(),
            source_field: source_field.into(),
        }
    }

    /// Create an upstream fetch error.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<quick_xml::Error> for AppError {
    fn from(error: quick_xml::Error) -> Self {
        Self::parse(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_message_names_container() {
        let err = AppError::structural("sections");
        assert_eq!(
            err.to_string(),
            "Structural error: missing container 'sections'"
        );
    }

    #[test]
    fn collision_message_names_both_fields() {
        let err = AppError::field_collision("subject_key", "subject");
        let msg = err.to_string();
        assert!(msg.contains("subject_key"));
        assert!(msg.contains("'subject'"));
    }
}
