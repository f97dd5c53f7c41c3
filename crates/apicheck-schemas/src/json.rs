//! JSON Schema engine
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use crate::cache::{CacheConfig, SchemaCache};
use crate::error::{SchemaError, SchemaResult, SchemaViolation};
use crate::SchemaEngine;
use serde_json::Value;
use std::sync::Arc;

/// Validates JSON bodies against JSON Schema documents.
///
/// The draft is detected from the schema's `$schema` keyword and defaults to
/// the latest draft supported by `jsonschema`.
#[derive(Debug, Default)]
pub struct JsonSchemaEngine {
    cache: SchemaCache<jsonschema::Validator>,
}

impl JsonSchemaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_config(config: CacheConfig) -> Self {
        Self {
            cache: SchemaCache::with_config(config),
        }
    }

    /// Compile (or fetch from cache) the validator for a schema text
    pub fn compile(&self, schema: &str) -> SchemaResult<Arc<jsonschema::Validator>> {
        self.cache.get_or_try_insert_with(schema, || {
            let schema_value: Value = serde_json::from_str(schema)
                .map_err(|e| SchemaError::invalid_schema(format!("schema is not valid JSON: {}", e)))?;
            jsonschema::validator_for(&schema_value)
                .map_err(|e| SchemaError::invalid_schema(e.to_string()))
        })
    }

    /// Number of compiled schemas currently cached
    pub fn cached_schemas(&self) -> usize {
        self.cache.len()
    }
}

impl SchemaEngine for JsonSchemaEngine {
    fn name(&self) -> &'static str {
        "json"
    }

    fn validate(&self, content: &str, schema: &str) -> SchemaResult<Vec<SchemaViolation>> {
        let validator = self.compile(schema)?;
        let instance: Value = serde_json::from_str(content)
            .map_err(|e| SchemaError::invalid_content(format!("content is not valid JSON: {}", e)))?;

        let violations = validator
            .iter_errors(&instance)
            .map(|error| {
                SchemaViolation::at_pointer(
                    error.to_string(),
                    error.instance_path.to_string(),
                    error.schema_path.to_string(),
                )
            })
            .collect();
        Ok(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ViolationLocation;

    const PERSON: &str = r#"{
        "type": "object",
        "properties": {
            "name": {"type": "string"},
            "age": {"type": "integer", "minimum": 0}
        },
        "required": ["name"]
    }"#;

    #[test]
    fn test_valid_content() {
        let engine = JsonSchemaEngine::new();
        let findings = engine.validate(r#"{"name":"Ada","age":36}"#, PERSON).unwrap();
        assert!(findings.is_empty());
    }

    #[test]
    fn test_each_failure_is_reported() {
        let engine = JsonSchemaEngine::new();
        let findings = engine.validate(r#"{"age":-1}"#, PERSON).unwrap();
        assert_eq!(findings.len(), 2);

        let age = findings
            .iter()
            .find(|f| matches!(&f.location, ViolationLocation::Pointer { instance_path, .. } if instance_path == "/age"))
            .expect("age finding");
        assert!(age.message.contains("-1"));
    }

    #[test]
    fn test_unparsable_content() {
        let engine = JsonSchemaEngine::new();
        let err = engine.validate("illegal json", r#"{"type":"string"}"#).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidContent { .. }));
        assert!(err.to_string().starts_with("content is not valid JSON"));
    }

    #[test]
    fn test_unparsable_schema() {
        let engine = JsonSchemaEngine::new();
        let err = engine.validate("\"x\"", "{not json").unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));

        let err = engine.validate("\"x\"", r#"{"type": 12}"#).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidSchema { .. }));
    }

    #[test]
    fn test_compiled_schema_is_cached() {
        let engine = JsonSchemaEngine::new();
        engine.validate("\"a\"", r#"{"type":"string"}"#).unwrap();
        engine.validate("\"b\"", r#"{"type":"string"}"#).unwrap();
        assert_eq!(engine.cached_schemas(), 1);
    }
}
