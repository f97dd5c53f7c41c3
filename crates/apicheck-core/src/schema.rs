//! Body schema validator dispatch
//!
//! A [`SchemaValidator`] declares which media types it handles and reports its
//! findings straight into a [`ViolationSink`]. [`SchemaValidators`] holds the
//! registered validators and picks the first one whose declared family is
//! compatible with a body's content type.

use crate::media_type::MediaType;
use crate::violations::{Flow, ViolationSink};
use apicheck_schemas::{CacheConfig, JsonSchemaEngine, SchemaEngine, XmlSchemaEngine};
use std::fmt;
use std::sync::Arc;

/// Validates message bodies of one content family
pub trait SchemaValidator: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Whether bodies of `media_type` are handled by this validator
    fn supports(&self, media_type: &MediaType) -> bool;

    /// Validate `content` against `schema`, reporting every finding into `sink`
    /// prefixed with `message` (the body description).
    fn validate(&self, content: &str, schema: &str, sink: &mut ViolationSink, message: &str) -> Flow;
}

/// Adapter from a [`SchemaEngine`] to a [`SchemaValidator`] for a set of media
/// type families
pub struct EngineValidator<E> {
    engine: E,
    families: Vec<MediaType>,
}

impl<E: SchemaEngine> EngineValidator<E> {
    pub fn new(engine: E, families: Vec<MediaType>) -> Self {
        Self { engine, families }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

impl EngineValidator<JsonSchemaEngine> {
    /// JSON Schema for `application/json` and `application/*+json`
    pub fn json(cache: CacheConfig) -> Self {
        Self::new(JsonSchemaEngine::with_cache_config(cache), families(&["application/*+json"]))
    }
}

impl EngineValidator<XmlSchemaEngine> {
    /// XML Schema for `application/xml`, `application/*+xml` and `text/xml`
    pub fn xml(cache: CacheConfig) -> Self {
        Self::new(
            XmlSchemaEngine::with_cache_config(cache),
            families(&["application/*+xml", "text/xml"]),
        )
    }
}

fn families(media_types: &[&str]) -> Vec<MediaType> {
    media_types
        .iter()
        .filter_map(|m| MediaType::parse(m).ok())
        .collect()
}

impl<E: SchemaEngine> SchemaValidator for EngineValidator<E> {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn supports(&self, media_type: &MediaType) -> bool {
        self.families.iter().any(|f| f.is_compatible_with(media_type))
    }

    fn validate(&self, content: &str, schema: &str, sink: &mut ViolationSink, message: &str) -> Flow {
        match self.engine.validate(content, schema) {
            Ok(findings) => {
                for finding in findings {
                    sink.add_with_cause(format!("{}: {}", message, finding), finding)?;
                }
                Ok(())
            }
            Err(e) => sink.add(format!("{}: Schema invalid: {}", message, e)),
        }
    }
}

/// Registry of schema validators, consulted in registration order
#[derive(Clone, Default)]
pub struct SchemaValidators {
    validators: Vec<Arc<dyn SchemaValidator>>,
}

impl SchemaValidators {
    /// An empty registry: no body is schema-checked
    pub fn empty() -> Self {
        Self::default()
    }

    /// The JSON and XML validators, each with its own cache of `cache` capacity
    pub fn standard(cache: CacheConfig) -> Self {
        Self::empty()
            .with(EngineValidator::json(cache.clone()))
            .with(EngineValidator::xml(cache))
    }

    pub fn with<V: SchemaValidator + 'static>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// The first validator supporting `media_type`
    pub fn find(&self, media_type: &MediaType) -> Option<&dyn SchemaValidator> {
        self.validators
            .iter()
            .find(|v| v.supports(media_type))
            .map(|v| v.as_ref())
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl fmt::Debug for SchemaValidators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.validators.iter().map(|v| v.name()))
            .finish()
    }
}
