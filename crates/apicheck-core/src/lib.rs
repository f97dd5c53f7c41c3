//! Apicheck Core - conformance engine for declarative API contracts
//!
//! This crate checks whether one live HTTP request/response exchange conforms
//! to an API contract: a tree of templated resources with typed parameters,
//! declared media types and body schemas.
//!
//! # Main Components
//!
//! - **Model**: the immutable contract ([`SpecModel`]) built once by the host
//! - **Resolution**: URI template matching and resource tree descent
//! - **Parameters**: typed validation of query, URI, header and form values
//! - **Media Types**: parsing, wildcard/suffix compatibility and Accept negotiation
//! - **Schemas**: pluggable body validators, JSON and XML by default
//! - **Checker**: the request/response state machine producing a [`Report`]
//!
//! # Example
//!
//! ```rust
//! use apicheck_core::{
//!     Action, Body, ContractChecker, ResponseDef, Resource, SimpleRequest, SimpleResponse, SpecModel,
//! };
//!
//! let model = SpecModel::default().with_resource(
//!     Resource::new("/data").with_action(Action::new("GET").with_response(
//!         200,
//!         ResponseDef::default().with_body(Body::new("application/json").with_schema(r#"{"type":"string"}"#)),
//!     )),
//! );
//!
//! let checker = ContractChecker::new(&model);
//! let report = checker
//!     .check(
//!         &SimpleRequest::get("/data?param=bu"),
//!         &SimpleResponse::new(200)
//!             .with_content_type("application/json")
//!             .with_content(r#""hello""#),
//!     )
//!     .unwrap();
//!
//! assert_eq!(
//!     report.request_violations.messages(),
//!     vec!["Query parameter 'param' on action(GET /data) is not defined"]
//! );
//! assert!(report.response_violations.is_empty());
//! ```

pub mod checker;
pub mod config;
pub mod error;
pub mod http;
pub mod media_type;
pub mod model;
pub mod params;
pub mod resolver;
pub mod schema;
pub mod template;
pub mod values;
pub mod violations;

// Re-export main types for convenience
pub use checker::ContractChecker;
pub use config::CheckerConfig;
pub use error::{CheckError, ConfigError, MediaTypeError, ModelError, Result, TemplateError};
pub use http::{HttpRequest, HttpResponse, SimpleRequest, SimpleResponse};
pub use media_type::MediaType;
pub use model::{Action, Body, ParamType, ParameterDef, Resource, ResponseDef, SpecModel};
pub use params::{ParameterChecker, ParameterKind};
pub use resolver::ResolvedResource;
pub use schema::{EngineValidator, SchemaValidator, SchemaValidators};
pub use values::Values;
pub use violations::{Abort, Flow, Report, Violation, ViolationSink, Violations};

// Schema cause types appear in reports
pub use apicheck_schemas::{SchemaViolation, ViolationLocation};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
