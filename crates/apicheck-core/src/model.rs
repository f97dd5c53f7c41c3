//! In-memory contract model
//!
//! A [`SpecModel`] is built once by the host's contract parser and shared,
//! read-only, by every check. The types derive serde so hosts may also
//! materialise a model from JSON or YAML they produced themselves.

use crate::error::ModelError;
use crate::media_type::MediaType;
use crate::template;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// The parsed, immutable API contract
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpecModel {
    pub title: Option<String>,
    /// Base URI template, e.g. `http://{host}.example.com/api/{version}`
    pub base_uri: Option<String>,
    /// Allowed URL schemes (`HTTP`, `HTTPS`); empty means unrestricted
    pub protocols: Vec<String>,
    pub base_uri_parameters: Vec<ParameterDef>,
    /// Top-level resources
    pub resources: Vec<Resource>,
    /// Consolidated schema table: name -> schema text
    pub schemas: BTreeMap<String, String>,
}

/// A node of the resource tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Resource {
    /// URI template relative to the parent, e.g. `/users` or `/{id}`
    pub relative_uri: String,
    pub uri_parameters: Vec<ParameterDef>,
    pub actions: Vec<Action>,
    pub resources: Vec<Resource>,
}

/// An HTTP method on a resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Action {
    pub method: String,
    /// Overrides [`SpecModel::protocols`] when non-empty
    pub protocols: Vec<String>,
    pub query_parameters: Vec<ParameterDef>,
    pub headers: Vec<ParameterDef>,
    pub uri_parameters: Vec<ParameterDef>,
    /// Request bodies, one per media type
    pub bodies: Vec<Body>,
    pub responses: BTreeMap<u16, ResponseDef>,
}

/// A declared response of an action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResponseDef {
    pub headers: Vec<ParameterDef>,
    pub bodies: Vec<Body>,
}

/// A declared body for one media type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Body {
    pub media_type: String,
    /// Inline schema text, or the name of an entry in [`SpecModel::schemas`]
    pub schema: Option<String>,
    pub form_parameters: Vec<ParameterDef>,
}

/// Value type of a parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    Boolean,
    Date,
    Integer,
    Number,
    #[default]
    String,
    File,
}

/// Definition of a named query, header, URI or form parameter
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub repeat: bool,
    pub minimum: Option<BigDecimal>,
    pub maximum: Option<BigDecimal>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
    #[serde(rename = "enum")]
    pub enumeration: Option<Vec<String>>,
}

impl ParameterDef {
    pub fn new<N: Into<String>>(name: N, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn repeat(mut self) -> Self {
        self.repeat = true;
        self
    }

    pub fn minimum(mut self, minimum: BigDecimal) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn maximum(mut self, maximum: BigDecimal) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn pattern<P: Into<String>>(mut self, pattern: P) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn enumeration<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enumeration = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

impl Resource {
    pub fn new<U: Into<String>>(relative_uri: U) -> Self {
        Self {
            relative_uri: relative_uri.into(),
            ..Self::default()
        }
    }

    /// The action for `method`, compared case-insensitively
    pub fn action(&self, method: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.method.eq_ignore_ascii_case(method))
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_uri_parameter(mut self, parameter: ParameterDef) -> Self {
        self.uri_parameters.push(parameter);
        self
    }
}

impl Action {
    pub fn new<M: Into<String>>(method: M) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Restrict the action to the given URL schemes
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_query_parameter(mut self, parameter: ParameterDef) -> Self {
        self.query_parameters.push(parameter);
        self
    }

    pub fn with_uri_parameter(mut self, parameter: ParameterDef) -> Self {
        self.uri_parameters.push(parameter);
        self
    }

    pub fn with_header(mut self, parameter: ParameterDef) -> Self {
        self.headers.push(parameter);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.bodies.push(body);
        self
    }

    pub fn with_response(mut self, status: u16, response: ResponseDef) -> Self {
        self.responses.insert(status, response);
        self
    }
}

impl ResponseDef {
    pub fn with_header(mut self, parameter: ParameterDef) -> Self {
        self.headers.push(parameter);
        self
    }

    pub fn with_body(mut self, body: Body) -> Self {
        self.bodies.push(body);
        self
    }
}

impl Body {
    pub fn new<M: Into<String>>(media_type: M) -> Self {
        Self {
            media_type: media_type.into(),
            ..Self::default()
        }
    }

    pub fn with_schema<S: Into<String>>(mut self, schema: S) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_form_parameter(mut self, parameter: ParameterDef) -> Self {
        self.form_parameters.push(parameter);
        self
    }
}

impl SpecModel {
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resources.push(resource);
        self
    }

    /// Resolve a body's schema reference to schema text.
    ///
    /// A name in the consolidated table wins; otherwise a reference that looks
    /// like a JSON or XML document is taken as an inline schema.
    pub fn resolve_schema<'m>(&'m self, reference: &'m str) -> Option<&'m str> {
        if let Some(schema) = self.schemas.get(reference) {
            return Some(schema.as_str());
        }
        let trimmed = reference.trim_start();
        if trimmed.starts_with('{') || trimmed.starts_with('[') || trimmed.starts_with('<') {
            Some(reference)
        } else {
            None
        }
    }

    /// Report configuration problems: duplicate parameter names, unclosed template
    /// variables, unparsable media types and unknown schema names.
    pub fn verify(&self) -> Result<(), Vec<ModelError>> {
        let mut problems = Vec::new();
        check_unique("BaseUri parameter", &self.base_uri_parameters, "base URI", &mut problems);
        if let Some(base_uri) = &self.base_uri {
            if let Err(source) = template::variable_names(base_uri) {
                problems.push(ModelError::InvalidTemplate {
                    location: "base URI".to_string(),
                    source,
                });
            }
        }
        for resource in &self.resources {
            self.verify_resource(resource, "", &mut problems);
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    fn verify_resource(&self, resource: &Resource, parent: &str, problems: &mut Vec<ModelError>) {
        let path = format!("{}{}", parent, resource.relative_uri);
        let location = format!("resource({})", path);
        if let Err(source) = template::variable_names(&resource.relative_uri) {
            problems.push(ModelError::InvalidTemplate {
                location: location.clone(),
                source,
            });
        }
        check_unique("URI parameter", &resource.uri_parameters, &location, problems);

        for action in &resource.actions {
            let location = format!("action({} {})", action.method.to_uppercase(), path);
            check_unique("Query parameter", &action.query_parameters, &location, problems);
            check_unique("Header", &action.headers, &location, problems);
            check_unique("URI parameter", &action.uri_parameters, &location, problems);
            for body in &action.bodies {
                self.verify_body(body, &location, problems);
            }
            for (status, response) in &action.responses {
                let location = format!("{} response({})", location, status);
                check_unique("Header", &response.headers, &location, problems);
                for body in &response.bodies {
                    self.verify_body(body, &location, problems);
                }
            }
        }
        for child in &resource.resources {
            self.verify_resource(child, &path, problems);
        }
    }

    fn verify_body(&self, body: &Body, location: &str, problems: &mut Vec<ModelError>) {
        if let Err(source) = MediaType::parse(&body.media_type) {
            problems.push(ModelError::InvalidMediaType {
                location: location.to_string(),
                source,
            });
        }
        check_unique("Form parameter", &body.form_parameters, location, problems);
        if let Some(reference) = &body.schema {
            if self.resolve_schema(reference).is_none() {
                problems.push(ModelError::UnknownSchema {
                    name: reference.clone(),
                    location: format!("{} mime-type('{}')", location, body.media_type),
                });
            }
        }
    }
}

fn check_unique(kind: &str, parameters: &[ParameterDef], location: &str, problems: &mut Vec<ModelError>) {
    let mut seen = HashSet::new();
    for parameter in parameters {
        if !seen.insert(parameter.name.as_str()) {
            problems.push(ModelError::DuplicateParameter {
                kind: kind.to_string(),
                name: parameter.name.clone(),
                location: location.to_string(),
            });
        }
    }
}
