//! Apicheck Schemas - body schema engines for contract checking
//!
//! This crate validates message bodies against the schemas a contract declares
//! for them. Two engines are provided:
//! - **JSON**: JSON Schema validation backed by the `jsonschema` crate
//! - **XML**: validation against the commonly used subset of W3C XML Schema
//!
//! Both engines compile a schema text once and keep the compiled form in a
//! bounded, thread-safe [`SchemaCache`] keyed by the schema text, so one engine
//! can be shared by any number of concurrent checks.
//!
//! ## Findings
//!
//! An engine never panics on bad input. A schema or content that cannot be
//! parsed is reported as a [`SchemaError`]; every distinct way the content fails
//! the schema is reported as one [`SchemaViolation`] carrying a rendered message
//! and a structured [`ViolationLocation`].
//!
//! ```rust
//! use apicheck_schemas::{JsonSchemaEngine, SchemaEngine};
//!
//! let engine = JsonSchemaEngine::new();
//! let findings = engine.validate("42", r#"{"type":"string"}"#).unwrap();
//! assert_eq!(findings.len(), 1);
//! ```
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

pub mod cache;
pub mod error;
pub mod json;
pub mod xml;

pub use cache::{CacheConfig, SchemaCache};
pub use error::{SchemaError, SchemaResult, SchemaViolation, ViolationLocation};
pub use json::JsonSchemaEngine;
pub use xml::XmlSchemaEngine;

/// A schema language that can check a body text against a schema text
pub trait SchemaEngine: Send + Sync {
    /// Short name of the schema language, used in diagnostics
    fn name(&self) -> &'static str;

    /// Validate `content` against `schema`.
    ///
    /// Returns the list of findings (empty when the content conforms), or a
    /// [`SchemaError`] when either the schema or the content cannot be parsed.
    fn validate(&self, content: &str, schema: &str) -> SchemaResult<Vec<SchemaViolation>>;
}
