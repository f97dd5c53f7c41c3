//! Error and finding types for schema validation
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for schema engine operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Failure to get as far as validating: the schema or the content is unusable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The schema text could not be parsed or compiled
    #[error("{message}")]
    InvalidSchema { message: String },

    /// The content could not be parsed in the schema's language
    #[error("{message}")]
    InvalidContent { message: String },
}

impl SchemaError {
    pub fn invalid_schema<M: Into<String>>(message: M) -> Self {
        Self::InvalidSchema {
            message: message.into(),
        }
    }

    pub fn invalid_content<M: Into<String>>(message: M) -> Self {
        Self::InvalidContent {
            message: message.into(),
        }
    }
}

/// Where in the content a finding was detected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ViolationLocation {
    /// Structured-data location: JSON pointers into the instance and the schema
    #[serde(rename_all = "camelCase")]
    Pointer {
        instance_path: String,
        schema_path: String,
    },
    /// Markup location: 1-based line and column in the content text
    Position { line: u32, column: u32 },
}

impl fmt::Display for ViolationLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pointer { instance_path, .. } if instance_path.is_empty() => write!(f, "/"),
            Self::Pointer { instance_path, .. } => write!(f, "{}", instance_path),
            Self::Position { line, column } => write!(f, "line {}, column {}", line, column),
        }
    }
}

/// One way in which a body fails its schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// Human-readable description of the failure
    pub message: String,
    /// Where the failure was detected
    pub location: ViolationLocation,
}

impl SchemaViolation {
    pub fn at_pointer<M, I, S>(message: M, instance_path: I, schema_path: S) -> Self
    where
        M: Into<String>,
        I: Into<String>,
        S: Into<String>,
    {
        Self {
            message: message.into(),
            location: ViolationLocation::Pointer {
                instance_path: instance_path.into(),
                schema_path: schema_path.into(),
            },
        }
    }

    pub fn at_position<M: Into<String>>(message: M, line: u32, column: u32) -> Self {
        Self {
            message: message.into(),
            location: ViolationLocation::Position { line, column },
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at '{}'", self.message, self.location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_display() {
        let violation = SchemaViolation::at_pointer("\"x\" is not of type \"integer\"", "/items/0", "/properties/items");
        assert_eq!(violation.to_string(), "\"x\" is not of type \"integer\" at '/items/0'");

        let root = SchemaViolation::at_pointer("42 is not of type \"string\"", "", "/type");
        assert_eq!(root.to_string(), "42 is not of type \"string\" at '/'");
    }

    #[test]
    fn test_position_display() {
        let violation = SchemaViolation::at_position("element 'b' is not allowed in 'a'", 3, 5);
        assert_eq!(violation.to_string(), "element 'b' is not allowed in 'a' at 'line 3, column 5'");
    }

    #[test]
    fn test_location_serialization() {
        let location = ViolationLocation::Position { line: 1, column: 2 };
        let json = serde_json::to_value(&location).unwrap();
        assert_eq!(json["kind"], "position");
        assert_eq!(json["line"], 1);
    }
}
