//! Typed parameter validation
//!
//! Checks a multi-valued map of supplied values against a set of named
//! [`ParameterDef`]s. Findings are rendered as
//! `<kind> '<name>' on <location> ...` so that a message can be traced back
//! to the exact parameter and place in the contract.
//!
//! Copyright (c) 2025 Apicheck Team
//! Licensed under the Apache-2.0 license

use crate::model::{ParamType, ParameterDef};
use crate::values::Values;
use crate::violations::{Flow, ViolationSink};
use bigdecimal::BigDecimal;
use chrono::NaiveDateTime;
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Fixed-format HTTP date, e.g. `Fri, 28 Feb 2014 12:34:56 GMT`
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Which set of parameters is being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    BaseUri,
    Uri,
    Query,
    Header,
    Form,
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BaseUri => "BaseUri parameter",
            Self::Uri => "URI parameter",
            Self::Query => "Query parameter",
            Self::Header => "Header",
            Self::Form => "Form parameter",
        })
    }
}

/// Validator for one kind of parameter at one place in the contract
#[derive(Debug, Clone)]
pub struct ParameterChecker {
    kind: ParameterKind,
    location: String,
    accept_undefined: bool,
    ignore_case: bool,
    ignored_prefix: Option<String>,
    ignored_names: Vec<String>,
}

impl ParameterChecker {
    /// `location` is the contract element being checked, e.g. `action(GET /data)`
    pub fn new<L: Into<String>>(kind: ParameterKind, location: L) -> Self {
        Self {
            kind,
            location: location.into(),
            accept_undefined: false,
            ignore_case: false,
            ignored_prefix: None,
            ignored_names: Vec::new(),
        }
    }

    /// Tolerate supplied names that have no definition
    pub fn accept_undefined(mut self, accept: bool) -> Self {
        self.accept_undefined = accept;
        self
    }

    /// Match supplied names to definitions ignoring ASCII case
    pub fn ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    /// Never report undefined names starting with `prefix` (ASCII case-insensitive)
    pub fn ignore_undefined_prefix<P: Into<String>>(mut self, prefix: P) -> Self {
        self.ignored_prefix = Some(prefix.into());
        self
    }

    /// Never report these undefined names (ASCII case-insensitive)
    pub fn ignore_undefined_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_names.extend(names.into_iter().map(Into::into));
        self
    }

    /// Check the supplied `values` against `defs`, reporting into `sink`.
    pub fn check_parameters<'d, I>(&self, defs: I, values: &Values, sink: &mut ViolationSink) -> Flow
    where
        I: IntoIterator<Item = &'d ParameterDef>,
    {
        let defs: Vec<&ParameterDef> = defs.into_iter().collect();
        for (name, supplied) in values.iter() {
            let Some(def) = self.find_def(&defs, name) else {
                if !self.accept_undefined && !self.is_ignored(name) {
                    sink.add(format!("{} is not defined", self.subject(name)))?;
                }
                continue;
            };

            sink.add_if(
                !def.repeat && supplied.len() > 1,
                format!("{} is not repeat but found repeatedly", self.subject(name)),
            )?;
            for value in supplied {
                for reason in check_value(def, value, &self.subject(name)) {
                    sink.add(format!("{}: Value '{}' {}", self.subject(name), value, reason))?;
                }
            }
        }

        for def in defs.iter().filter(|d| d.required) {
            let supplied = if self.ignore_case {
                !values.get_ignore_case(&def.name).is_empty()
            } else {
                values.get(&def.name).is_some_and(|v| !v.is_empty())
            };
            sink.add_if(
                !supplied,
                format!("{} is required but not found", self.subject(&def.name)),
            )?;
        }
        Ok(())
    }

    fn subject(&self, name: &str) -> String {
        format!("{} '{}' on {}", self.kind, name, self.location)
    }

    fn find_def<'d>(&self, defs: &[&'d ParameterDef], name: &str) -> Option<&'d ParameterDef> {
        defs.iter().copied().find(|d| {
            if self.ignore_case {
                d.name.eq_ignore_ascii_case(name)
            } else {
                d.name == name
            }
        })
    }

    fn is_ignored(&self, name: &str) -> bool {
        let prefixed = self.ignored_prefix.as_deref().is_some_and(|prefix| {
            name.get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
        });
        prefixed || self.ignored_names.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// Check one value against its definition's type rule.
///
/// Returns the failure reasons, e.g. `is not a valid integer`; empty when valid.
/// `subject` only appears in the warning logged for an unusable pattern.
pub fn check_value(def: &ParameterDef, value: &str, subject: &str) -> Vec<String> {
    match def.param_type {
        ParamType::Boolean => {
            if value == "true" || value == "false" {
                Vec::new()
            } else {
                vec!["is not a valid boolean".to_string()]
            }
        }
        ParamType::Date => {
            if NaiveDateTime::parse_from_str(value, HTTP_DATE_FORMAT).is_ok() {
                Vec::new()
            } else {
                vec!["is not a valid date".to_string()]
            }
        }
        ParamType::Integer => {
            if !integer_regex().is_match(value) {
                return vec!["is not a valid integer".to_string()];
            }
            check_bounds(def, value)
        }
        ParamType::Number => {
            if !number_regex().is_match(value) {
                return vec!["is not a valid number".to_string()];
            }
            if matches!(value, "inf" | "-inf" | "nan") {
                if def.minimum.is_some() || def.maximum.is_some() {
                    return vec!["is not inside any minimum/maximum".to_string()];
                }
                return Vec::new();
            }
            check_bounds(def, value)
        }
        ParamType::String => check_string(def, value, subject),
        ParamType::File => Vec::new(),
    }
}

fn check_bounds(def: &ParameterDef, value: &str) -> Vec<String> {
    let Ok(number) = BigDecimal::from_str(value) else {
        return vec![format!("is not a valid {}", type_name(def.param_type))];
    };
    let mut reasons = Vec::new();
    if let Some(minimum) = &def.minimum {
        if &number < minimum {
            reasons.push(format!("is smaller than minimum {}", minimum));
        }
    }
    if let Some(maximum) = &def.maximum {
        if &number > maximum {
            reasons.push(format!("is bigger than maximum {}", maximum));
        }
    }
    reasons
}

fn check_string(def: &ParameterDef, value: &str, subject: &str) -> Vec<String> {
    if let Some(enumeration) = &def.enumeration {
        if !enumeration.iter().any(|e| e == value) {
            return vec![format!("is not a member of enum '[{}]'", enumeration.join(", "))];
        }
    }

    let mut reasons = Vec::new();
    if let Some(pattern) = &def.pattern {
        match Pattern::compile(pattern) {
            Ok(compiled) => {
                if !compiled.matches(value) {
                    reasons.push(format!("does not match pattern '{}'", pattern));
                }
            }
            Err(e) => log::warn!("Ignoring illegal pattern '{}' of {}: {}", pattern, subject, e),
        }
    }
    let length = value.chars().count();
    if let Some(min_length) = def.min_length {
        if length < min_length {
            reasons.push(format!("is shorter than minimum length {}", min_length));
        }
    }
    if let Some(max_length) = def.max_length {
        if length > max_length {
            reasons.push(format!("is longer than maximum length {}", max_length));
        }
    }
    reasons
}

fn type_name(param_type: ParamType) -> &'static str {
    match param_type {
        ParamType::Boolean => "boolean",
        ParamType::Date => "date",
        ParamType::Integer => "integer",
        ParamType::Number => "number",
        ParamType::String => "string",
        ParamType::File => "file",
    }
}

fn integer_regex() -> &'static Regex {
    static INTEGER: OnceLock<Regex> = OnceLock::new();
    INTEGER.get_or_init(|| Regex::new(r"^(?:0|-?[1-9][0-9]*)$").expect("integer grammar"))
}

fn number_regex() -> &'static Regex {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    NUMBER.get_or_init(|| {
        Regex::new(r"^(?:-?(?:0|[1-9][0-9]*)(?:\.[0-9]+)?(?:[eE][-+]?[0-9]+)?|inf|-inf|nan)$")
            .expect("number grammar")
    })
}

/// A string parameter pattern.
///
/// `/regex/flags` is searched anywhere in the value, as in JavaScript; the `i`
/// flag makes it case-insensitive and `m` multi-line. A bare or quoted pattern
/// must match the whole value.
#[derive(Debug)]
struct Pattern {
    regex: Regex,
}

impl Pattern {
    fn compile(pattern: &str) -> Result<Self, regex::Error> {
        let (body, flags, anchored) = split_pattern(pattern);
        let body = if anchored {
            format!("^(?:{})$", body)
        } else {
            body.to_string()
        };
        let regex = RegexBuilder::new(&body)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .build()?;
        Ok(Self { regex })
    }

    fn matches(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

fn split_pattern(pattern: &str) -> (&str, &str, bool) {
    let quoted = pattern.len() >= 2
        && ((pattern.starts_with('"') && pattern.ends_with('"'))
            || (pattern.starts_with('\'') && pattern.ends_with('\'')));
    if quoted {
        return (&pattern[1..pattern.len() - 1], "", true);
    }
    if let Some(rest) = pattern.strip_prefix('/') {
        if let Some(end) = rest.rfind('/') {
            return (&rest[..end], &rest[end + 1..], false);
        }
    }
    (pattern, "", true)
}
