//! Request phase: parameters, headers and body

use super::{find_body, ContractChecker, Target};
use crate::http::HttpRequest;
use crate::media_type::MediaType;
use crate::model::ParameterDef;
use crate::params::{ParameterChecker, ParameterKind};
use crate::violations::{Flow, ViolationSink};
use tracing::debug;

/// Standard request headers that are never reported as undefined
const STANDARD_REQUEST_HEADERS: &[&str] = &[
    "Accept",
    "Accept-Charset",
    "Accept-Encoding",
    "Accept-Language",
    "Authorization",
    "Connection",
    "Content-Length",
    "Content-Type",
    "Cookie",
    "Host",
    "User-Agent",
];

impl<'m> ContractChecker<'m> {
    pub(super) fn check_request_side(
        &self,
        target: &Target<'m>,
        request: &dyn HttpRequest,
        sink: &mut ViolationSink,
    ) -> Flow {
        let location = target.location();

        ParameterChecker::new(ParameterKind::BaseUri, location.as_str())
            .accept_undefined(true)
            .check_parameters(&self.model.base_uri_parameters, &target.base_variables, sink)?;

        ParameterChecker::new(ParameterKind::Uri, location.as_str())
            .accept_undefined(true)
            .check_parameters(uri_parameters(target), &target.resolved.variables, sink)?;

        ParameterChecker::new(ParameterKind::Query, location.as_str())
            .check_parameters(&target.action.query_parameters, request.query_values(), sink)?;

        let mut headers = ParameterChecker::new(ParameterKind::Header, location.as_str())
            .ignore_case(true)
            .accept_undefined(!self.config.report_undefined_headers)
            .ignore_undefined_names(STANDARD_REQUEST_HEADERS.iter().copied());
        if self.config.ignore_x_headers {
            headers = headers.ignore_undefined_prefix("x-");
        }
        headers.check_parameters(&target.action.headers, request.header_values(), sink)?;

        self.check_request_body(target, &location, request, sink)
    }

    fn check_request_body(
        &self,
        target: &Target<'m>,
        location: &str,
        request: &dyn HttpRequest,
        sink: &mut ViolationSink,
    ) -> Flow {
        if request.content().is_empty() && request.form_values().is_empty() {
            return Ok(());
        }
        let Some(content_type) = request.content_type() else {
            return sink.add(format!("Request body given but no Content-Type header on {}", location));
        };
        let not_defined = || format!("Media type '{}' is not defined on {}", content_type, location);

        let Ok(actual) = MediaType::parse(content_type) else {
            return sink.add(not_defined());
        };
        let Some((body, _)) = find_body(&target.action.bodies, &actual) else {
            return sink.add(not_defined());
        };

        if actual.is_form() {
            if body.form_parameters.is_empty() {
                return Ok(());
            }
            return ParameterChecker::new(ParameterKind::Form, location).check_parameters(
                &body.form_parameters,
                request.form_values(),
                sink,
            );
        }

        let Some(reference) = body.schema.as_deref() else {
            return Ok(());
        };
        let description = format!("Request body of {} mime-type('{}')", location, body.media_type);
        let Some(schema) = self.model.resolve_schema(reference) else {
            return Err(sink.abort(format!(
                "Schema '{}' referenced by {} is not defined",
                reference, description
            )));
        };
        match self.validators.find(&actual) {
            Some(validator) => {
                let content = String::from_utf8_lossy(request.content());
                validator.validate(&content, schema, sink, &description)
            }
            None => {
                debug!("No schema validator for {}", actual);
                Ok(())
            }
        }
    }
}

/// URI parameter definitions of the resource chain, overridden by the action's own
fn uri_parameters<'m>(target: &Target<'m>) -> Vec<&'m ParameterDef> {
    let action = target.action;
    let mut defs = target.resolved.uri_parameters();
    for def in &action.uri_parameters {
        match defs.iter_mut().find(|d| d.name == def.name) {
            Some(slot) => *slot = def,
            None => defs.push(def),
        }
    }
    defs
}
