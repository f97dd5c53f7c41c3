//! Response phase: status, headers, media type negotiation and body

use super::{find_body, parse_declared, ContractChecker, Target};
use crate::http::{HttpRequest, HttpResponse};
use crate::media_type::{self, MediaType};
use crate::model::Body;
use crate::params::{ParameterChecker, ParameterKind};
use crate::violations::{Flow, ViolationSink};
use tracing::debug;

impl<'m> ContractChecker<'m> {
    pub(super) fn check_response_side(
        &self,
        target: &Target<'m>,
        request: &dyn HttpRequest,
        response: &dyn HttpResponse,
        sink: &mut ViolationSink,
    ) -> Flow {
        let status = response.status();
        let Some(definition) = target.action.responses.get(&status) else {
            return Err(sink.abort(format!(
                "Response({}) is not defined on {}",
                status,
                target.location()
            )));
        };
        let location = format!("{} response({})", target.location(), status);

        ParameterChecker::new(ParameterKind::Header, location.as_str())
            .ignore_case(true)
            .accept_undefined(true)
            .check_parameters(&definition.headers, response.header_values(), sink)?;

        if definition.bodies.is_empty() {
            return sink.add_if(
                !response.content().is_empty(),
                format!("Response body given but none defined on {}", location),
            );
        }
        let Some(content_type) = response.content_type() else {
            return sink.add(format!("Response has no Content-Type header on {}", location));
        };
        let selected = MediaType::parse(content_type)
            .ok()
            .and_then(|actual| find_body(&definition.bodies, &actual).map(|found| (actual, found)));
        let Some((actual, (body, declared))) = selected else {
            return Err(sink.abort(format!(
                "Media type '{}' is not defined on {}",
                content_type, location
            )));
        };
        debug!("Selected {} body for {} on {}", body.media_type, actual, location);

        self.check_accept(request, &definition.bodies, (body, &declared), &location, sink)?;

        let Some(reference) = body.schema.as_deref() else {
            return Ok(());
        };
        let description = format!("Response body of {} mime-type('{}')", location, body.media_type);
        let Some(schema) = self.model.resolve_schema(reference) else {
            return Err(sink.abort(format!(
                "Schema '{}' referenced by {} is not defined",
                reference, description
            )));
        };
        match self.validators.find(&actual) {
            Some(validator) => {
                let content = String::from_utf8_lossy(response.content());
                validator.validate(&content, schema, sink, &description)
            }
            None => {
                debug!("No schema validator for {}", actual);
                Ok(())
            }
        }
    }

    /// Verify the selected body is the one the request's Accept header prefers
    /// among the declared bodies.
    fn check_accept(
        &self,
        request: &dyn HttpRequest,
        bodies: &[Body],
        (selected, declared): (&Body, &MediaType),
        location: &str,
        sink: &mut ViolationSink,
    ) -> Flow {
        let accept = request.header_values().get_ignore_case("Accept").join(", ");
        if accept.trim().is_empty() {
            return Ok(());
        }
        let candidates: Vec<MediaType> = bodies
            .iter()
            .filter_map(|b| parse_declared(&b.media_type))
            .collect();
        match media_type::find_best_match(&accept, &candidates) {
            Ok(best) => sink.add_if(
                !best.is_some_and(|best| best.essence() == declared.essence()),
                format!(
                    "Response media type '{}' on {} is not the best match for Accept header '{}'",
                    selected.media_type, location, accept
                ),
            ),
            Err(e) => sink.add(format!("Accept header '{}' on {} is invalid: {}", accept, location, e)),
        }
    }
}
