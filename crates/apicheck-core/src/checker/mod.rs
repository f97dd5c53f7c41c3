//! Contract checker
//!
//! [`ContractChecker`] drives one exchange through a fixed sequence of phases:
//!
//! ```text
//! ResolveAction -> CheckRequest -> CheckResponse -> Done
//! ```
//!
//! Each phase reports into its own [`ViolationSink`]. A phase that aborts ends
//! early; an abort while resolving the action also skips the response phase.
//! In fail-fast mode every violation aborts, and the abort leaves the call as a
//! [`CheckError::ContractViolation`].
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

mod request;
mod response;

use crate::config::CheckerConfig;
use crate::error::{CheckError, Result};
use crate::http::{HttpRequest, HttpResponse};
use crate::media_type::MediaType;
use crate::model::{Action, Body, SpecModel};
use crate::resolver::{self, ResolvedResource};
use crate::schema::SchemaValidators;
use crate::template::{self, MatchKind};
use crate::values::Values;
use crate::violations::{Abort, Report, ViolationSink};
use tracing::debug;
use url::Url;

/// Checks HTTP exchanges against one contract
#[derive(Debug)]
pub struct ContractChecker<'m> {
    model: &'m SpecModel,
    config: CheckerConfig,
    validators: SchemaValidators,
}

/// Where an exchange currently is
enum Phase<'m> {
    ResolveAction,
    CheckRequest(Target<'m>),
    CheckResponse(Target<'m>),
    Done,
}

/// The action an exchange was resolved to
#[derive(Debug)]
struct Target<'m> {
    resolved: ResolvedResource<'m>,
    action: &'m Action,
    base_variables: Values,
}

impl Target<'_> {
    /// `action(GET /users/{id})`
    fn location(&self) -> String {
        format!("action({} {})", self.action.method.to_uppercase(), self.resolved.path())
    }
}

impl<'m> ContractChecker<'m> {
    pub fn new(model: &'m SpecModel) -> Self {
        Self::with_config(model, CheckerConfig::default())
    }

    /// A checker with the standard JSON and XML validators sized by `config`
    pub fn with_config(model: &'m SpecModel, config: CheckerConfig) -> Self {
        let validators = SchemaValidators::standard(config.cache_config());
        Self {
            model,
            config,
            validators,
        }
    }

    /// Replace the schema validators
    pub fn with_validators(mut self, validators: SchemaValidators) -> Self {
        self.validators = validators;
        self
    }

    pub fn model(&self) -> &'m SpecModel {
        self.model
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Check one request/response exchange.
    ///
    /// Violations are returned in the report. Only fail-fast mode returns an
    /// error, carrying the first violation found.
    pub fn check(&self, request: &dyn HttpRequest, response: &dyn HttpResponse) -> Result<Report> {
        self.run(request, Some(response))
    }

    /// Check only the request side; the report's response list is empty
    pub fn check_request(&self, request: &dyn HttpRequest) -> Result<Report> {
        self.run(request, None)
    }

    fn run(&self, request: &dyn HttpRequest, response: Option<&dyn HttpResponse>) -> Result<Report> {
        let mut request_sink = self.new_sink();
        let mut response_sink = self.new_sink();
        let mut phase = Phase::ResolveAction;

        loop {
            phase = match phase {
                Phase::ResolveAction => match self.resolve_action(request, &mut request_sink) {
                    Ok(target) => Phase::CheckRequest(target),
                    Err(abort) => {
                        self.aborted("resolve", abort)?;
                        Phase::Done
                    }
                },
                Phase::CheckRequest(target) => {
                    if let Err(abort) = self.check_request_side(&target, request, &mut request_sink) {
                        self.aborted("request", abort)?;
                    }
                    if response.is_some() {
                        Phase::CheckResponse(target)
                    } else {
                        Phase::Done
                    }
                }
                Phase::CheckResponse(target) => {
                    if let Some(response) = response {
                        if let Err(abort) =
                            self.check_response_side(&target, request, response, &mut response_sink)
                        {
                            self.aborted("response", abort)?;
                        }
                    }
                    Phase::Done
                }
                Phase::Done => break,
            };
        }

        Ok(Report {
            request_violations: request_sink.into_violations(),
            response_violations: response_sink.into_violations(),
        })
    }

    fn new_sink(&self) -> ViolationSink {
        if self.config.fail_fast {
            ViolationSink::fail_fast()
        } else {
            ViolationSink::new()
        }
    }

    /// Consume an abort at the phase boundary
    fn aborted(&self, phase: &str, abort: Abort) -> Result<()> {
        debug!("{} phase aborted: {}", phase, abort.message());
        if self.config.fail_fast {
            return Err(CheckError::ContractViolation {
                message: abort.message().to_string(),
            });
        }
        Ok(())
    }

    fn resolve_action(&self, request: &dyn HttpRequest, sink: &mut ViolationSink) -> std::result::Result<Target<'m>, Abort> {
        let raw_url = request.request_url();
        let url = RequestUrl::parse(raw_url);

        let Some((path, base_variables)) = self.match_base_uri(&url) else {
            return Err(sink.abort(format!(
                "Request URL '{}' does not match base URI '{}'",
                raw_url,
                self.model.base_uri.as_deref().unwrap_or_default()
            )));
        };

        let Some(resolved) = resolver::resolve(&self.model.resources, &path) else {
            return Err(sink.abort(format!("Resource '{}' is not defined", path)));
        };
        let method = request.method().to_uppercase();
        let Some(action) = resolved.resource().action(&method) else {
            return Err(sink.abort(format!(
                "Action {} is not defined on resource({})",
                method,
                resolved.path()
            )));
        };

        let target = Target {
            resolved,
            action,
            base_variables,
        };
        debug!("Resolved {} {} to {}", method, path, target.location());

        let protocols = if action.protocols.is_empty() {
            &self.model.protocols
        } else {
            &action.protocols
        };
        if let Some(scheme) = url.scheme.as_deref() {
            sink.add_if(
                !protocols.is_empty() && !protocols.iter().any(|p| p.eq_ignore_ascii_case(scheme)),
                format!(
                    "Protocol {} is not defined on {}",
                    scheme.to_uppercase(),
                    target.location()
                ),
            )?;
        }
        Ok(target)
    }

    /// Strip the base URI off the request URL.
    ///
    /// Returns the remaining resource path and the captured base URI variables,
    /// or `None` when the URL is not below the base URI.
    fn match_base_uri(&self, url: &RequestUrl) -> Option<(String, Values)> {
        let Some(base_uri) = self.model.base_uri.as_deref() else {
            return Some((url.path.clone(), Values::new()));
        };
        let base = strip_scheme(base_uri).trim_end_matches('/');
        let (base_template, value) = match &url.authority {
            Some(authority) => (base, format!("{}{}", authority, url.path)),
            None => (base.find('/').map_or("", |i| &base[i..]), url.path.clone()),
        };
        if base_template.is_empty() {
            return Some((value, Values::new()));
        }

        match template::match_template(base_template, &value) {
            Ok(m) if m.kind == MatchKind::Complete => Some((String::new(), m.variables)),
            Ok(m) if m.kind == MatchKind::Partial && m.suffix.starts_with('/') => {
                Some((m.suffix, m.variables))
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("Malformed base URI: {}", e);
                None
            }
        }
    }
}

/// The parts of a request URL the checker needs
#[derive(Debug, Clone, PartialEq, Eq)]
struct RequestUrl {
    scheme: Option<String>,
    /// `host[:port]`
    authority: Option<String>,
    path: String,
}

impl RequestUrl {
    /// Absolute URLs keep scheme and authority; anything else is read as a
    /// path relative to the server root.
    fn parse(raw: &str) -> Self {
        if let Ok(url) = Url::parse(raw) {
            if let Some(host) = url.host_str() {
                let authority = match url.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                return Self {
                    scheme: Some(url.scheme().to_string()),
                    authority: Some(authority),
                    path: url.path().to_string(),
                };
            }
        }
        let path = Url::parse("http://localhost")
            .and_then(|root| root.join(raw))
            .map(|url| url.path().to_string())
            .unwrap_or_else(|_| raw.split(['?', '#']).next().unwrap_or_default().to_string());
        Self {
            scheme: None,
            authority: None,
            path,
        }
    }
}

fn strip_scheme(uri: &str) -> &str {
    uri.split_once("://").map_or(uri, |(_, rest)| rest)
}

/// Pick the declared body for an actual media type: an exact `type/subtype`
/// match first, otherwise the first compatible declaration.
fn find_body<'b>(bodies: &'b [Body], actual: &MediaType) -> Option<(&'b Body, MediaType)> {
    let declared: Vec<(&Body, MediaType)> = bodies
        .iter()
        .filter_map(|body| parse_declared(&body.media_type).map(|m| (body, m)))
        .collect();
    let essence = actual.essence();
    let position = declared
        .iter()
        .position(|(_, m)| m.essence() == essence)
        .or_else(|| declared.iter().position(|(_, m)| m.is_compatible_with(actual)))?;
    declared.into_iter().nth(position)
}

/// Parse a media type declared in the contract, skipping it when malformed
fn parse_declared(media_type: &str) -> Option<MediaType> {
    match MediaType::parse(media_type) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            log::warn!("Ignoring malformed declared media type '{}': {}", media_type, e);
            None
        }
    }
}
