//! Error types for the Apicheck core library
//!
//! Contract findings are not errors: they are collected as violations in a
//! [`Report`](crate::Report). The types here cover the remaining failures:
//! malformed configuration of the contract itself, malformed checker
//! configuration, and the fail-fast escape out of a check.

use std::path::PathBuf;
use thiserror::Error;

/// Error surfaced by a check call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// The first violation of a fail-fast check
    #[error("{message}")]
    ContractViolation { message: String },
}

/// Convenience type alias for Results of check calls
pub type Result<T> = std::result::Result<T, CheckError>;

/// Malformed URI template in the contract
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("Unclosed variable in template '{template}' at position {position}")]
    UnclosedVariable { template: String, position: usize },
}

/// Malformed media type string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaTypeError {
    #[error("Media type must not be empty")]
    Empty,

    #[error("Media type '{media_type}' has no '/'")]
    MissingSlash { media_type: String },

    #[error("Media type '{media_type}' has an empty type or subtype")]
    EmptySubtype { media_type: String },

    #[error("Media type '{media_type}' has a wildcard type with a non-wildcard subtype")]
    WildcardType { media_type: String },

    #[error("Media type '{media_type}' has an invalid parameter '{parameter}'")]
    InvalidParameter { media_type: String, parameter: String },

    #[error("Media type '{media_type}' has an invalid quality value '{quality}'")]
    InvalidQuality { media_type: String, quality: String },
}

/// Configuration problem found in a [`SpecModel`](crate::SpecModel)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{kind} '{name}' is defined more than once on {location}")]
    DuplicateParameter {
        kind: String,
        name: String,
        location: String,
    },

    #[error("Invalid resource template on {location}: {source}")]
    InvalidTemplate {
        location: String,
        #[source]
        source: TemplateError,
    },

    #[error("Invalid media type on {location}: {source}")]
    InvalidMediaType {
        location: String,
        #[source]
        source: MediaTypeError,
    },

    #[error("Schema '{name}' referenced on {location} is not defined")]
    UnknownSchema { name: String, location: String },
}

/// Checker configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML configuration: {source}")]
    Yaml {
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Failed to parse JSON configuration: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    #[error("Unsupported configuration format for '{path}'. Expected .yaml, .yml, or .json")]
    UnsupportedFormat { path: PathBuf },
}
