//! Violation collection and the per-exchange report
//!
//! A [`ViolationSink`] is created for each phase of one check call. Checks append
//! messages to it in the order they are detected. Returning `Err(Abort)` from a
//! check is the explicit short-circuit out of the current phase; the checker
//! consumes it at the phase boundary (or, in fail-fast mode, turns it into a
//! [`CheckError`](crate::CheckError)).

use apicheck_schemas::SchemaViolation;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One contract violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Rendered, human-readable message
    pub message: String,
    /// Structured cause for schema findings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<SchemaViolation>,
}

impl Violation {
    pub fn new<M: Into<String>>(message: M) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<M: Into<String>>(message: M, cause: SchemaViolation) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Ordered list of violations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations(Vec<Violation>);

impl Violations {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.0.iter()
    }

    /// The rendered messages, in detection order
    pub fn messages(&self) -> Vec<&str> {
        self.0.iter().map(|v| v.message.as_str()).collect()
    }

    pub fn contains_message(&self, message: &str) -> bool {
        self.0.iter().any(|v| v.message == message)
    }
}

impl std::ops::Index<usize> for Violations {
    type Output = Violation;

    fn index(&self, index: usize) -> &Violation {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Violation>> for Violations {
    fn from(violations: Vec<Violation>) -> Self {
        Self(violations)
    }
}

/// Result of checking one request/response exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub request_violations: Violations,
    pub response_violations: Violations,
}

impl Report {
    /// True when neither side has a violation
    pub fn is_empty(&self) -> bool {
        self.request_violations.is_empty() && self.response_violations.is_empty()
    }

    /// All violations, request side first
    pub fn all(&self) -> impl Iterator<Item = &Violation> {
        self.request_violations.iter().chain(self.response_violations.iter())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "No violations");
        }
        for (title, violations) in [
            ("Request violations", &self.request_violations),
            ("Response violations", &self.response_violations),
        ] {
            if violations.is_empty() {
                continue;
            }
            write!(f, "{}:", title)?;
            for (i, violation) in violations.iter().enumerate() {
                write!(f, "\n  {}. {}", i + 1, violation)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Short-circuit signal out of the current check phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abort {
    message: String,
}

impl Abort {
    /// Message of the violation that triggered the abort
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of a check step: continue, or abort the phase
pub type Flow = std::result::Result<(), Abort>;

/// Append-only, ordered collector of violations for one phase
#[derive(Debug, Default)]
pub struct ViolationSink {
    violations: Vec<Violation>,
    fail_fast: bool,
}

impl ViolationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that aborts on the first violation added
    pub fn fail_fast() -> Self {
        Self {
            violations: Vec::new(),
            fail_fast: true,
        }
    }

    /// Record a violation. Only aborts in fail-fast mode.
    pub fn add<M: Into<String>>(&mut self, message: M) -> Flow {
        self.push(Violation::new(message))
    }

    /// Record a violation when `condition` holds
    pub fn add_if<M: Into<String>>(&mut self, condition: bool, message: M) -> Flow {
        if condition {
            self.add(message)
        } else {
            Ok(())
        }
    }

    /// Record a schema finding with its structured cause
    pub fn add_with_cause<M: Into<String>>(&mut self, message: M, cause: SchemaViolation) -> Flow {
        self.push(Violation::with_cause(message, cause))
    }

    /// Record a violation and return the signal that ends the current phase
    pub fn abort<M: Into<String>>(&mut self, message: M) -> Abort {
        let violation = Violation::new(message);
        let abort = Abort {
            message: violation.message.clone(),
        };
        self.violations.push(violation);
        abort
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn into_violations(self) -> Violations {
        Violations(self.violations)
    }

    fn push(&mut self, violation: Violation) -> Flow {
        let abort = self.fail_fast.then(|| Abort {
            message: violation.message.clone(),
        });
        self.violations.push(violation);
        abort.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_keeps_order() {
        let mut sink = ViolationSink::new();
        sink.add("first").unwrap();
        sink.add_if(false, "skipped").unwrap();
        sink.add_if(true, "second").unwrap();

        let violations = sink.into_violations();
        assert_eq!(violations.messages(), vec!["first", "second"]);
    }

    #[test]
    fn test_abort_records_violation() {
        let mut sink = ViolationSink::new();
        let abort = sink.abort("Resource '/x' is not defined");
        assert_eq!(abort.message(), "Resource '/x' is not defined");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_fail_fast_sink_aborts_on_add() {
        let mut sink = ViolationSink::fail_fast();
        let flow = sink.add("boom");
        assert_eq!(flow.unwrap_err().message(), "boom");
        assert!(sink.add_if(false, "quiet").is_ok());
    }

    #[test]
    fn test_report_display() {
        let report = Report {
            request_violations: Violations::from(vec![Violation::new("bad query")]),
            response_violations: Violations::default(),
        };
        let text = report.to_string();
        assert!(text.starts_with("Request violations:"));
        assert!(text.contains("1. bad query"));
        assert!(!text.contains("Response violations"));
        assert_eq!(Report::default().to_string(), "No violations");
    }

    #[test]
    fn test_report_serialization() {
        let report = Report {
            request_violations: Violations::from(vec![Violation::new("x")]),
            response_violations: Violations::default(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["requestViolations"][0]["message"], "x");
        assert!(json["requestViolations"][0].get("cause").is_none());
    }
}
