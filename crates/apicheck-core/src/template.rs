//! URI template matching
//!
//! A template is literal text with `{name}` variables. Matching walks template
//! and value together: literal characters must be equal, and a variable captures
//! value characters up to the literal that follows its closing brace in the
//! template (or up to `/` when the variable ends the template). Matching stops
//! as soon as either side runs out.

use crate::error::TemplateError;
use crate::values::Values;

/// How far a template matched a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A literal differed, or the value ran out before the template did
    NoMatch,
    /// The template is consumed but part of the value remains
    Partial,
    /// Template and value are both consumed
    Complete,
}

/// Outcome of matching one template against one value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableMatch {
    pub kind: MatchKind,
    /// Unconsumed rest of the value (empty unless partial)
    pub suffix: String,
    /// Captured variables, in template order
    pub variables: Values,
}

impl VariableMatch {
    pub fn is_match(&self) -> bool {
        self.kind != MatchKind::NoMatch
    }

    pub fn is_complete(&self) -> bool {
        self.kind == MatchKind::Complete
    }
}

/// Match `template` against `value`.
///
/// Fails only when the template contains a `{` without a closing `}` that the
/// match actually reaches.
pub fn match_template(template: &str, value: &str) -> Result<VariableMatch, TemplateError> {
    let pattern = template.as_bytes();
    let input = value.as_bytes();
    let mut variables = Values::new();
    let mut p = 0;
    let mut v = 0;

    while p < pattern.len() && v < input.len() {
        if pattern[p] == b'{' {
            let close = template[p..]
                .find('}')
                .map(|offset| p + offset)
                .ok_or_else(|| TemplateError::UnclosedVariable {
                    template: template.to_string(),
                    position: p,
                })?;
            let name = &template[p + 1..close];
            let boundary = pattern.get(close + 1).copied().unwrap_or(b'/');
            let end = input[v..]
                .iter()
                .position(|b| *b == boundary)
                .map_or(input.len(), |offset| v + offset);
            variables.add_value(name, &value[v..end]);
            p = close + 1;
            v = end;
        } else if pattern[p] == input[v] {
            p += 1;
            v += 1;
        } else {
            return Ok(VariableMatch {
                kind: MatchKind::NoMatch,
                suffix: String::new(),
                variables,
            });
        }
    }

    let kind = match (p == pattern.len(), v == input.len()) {
        (true, true) => MatchKind::Complete,
        (true, false) => MatchKind::Partial,
        (false, _) => MatchKind::NoMatch,
    };
    let suffix = if kind == MatchKind::Partial {
        value[v..].to_string()
    } else {
        String::new()
    };
    Ok(VariableMatch {
        kind,
        suffix,
        variables,
    })
}

/// Names of the variables a template declares, in order
pub fn variable_names(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names = Vec::new();
    let mut rest = 0;
    while let Some(open) = template[rest..].find('{').map(|i| rest + i) {
        let close = template[open..]
            .find('}')
            .map(|i| open + i)
            .ok_or_else(|| TemplateError::UnclosedVariable {
                template: template.to_string(),
                position: open,
            })?;
        names.push(template[open + 1..close].to_string());
        rest = close + 1;
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_match() {
        let m = match_template("abc{var}xyz", "abc123xyz").unwrap();
        assert_eq!(m.kind, MatchKind::Complete);
        assert_eq!(m.suffix, "");
        assert_eq!(m.variables.first("var"), Some("123"));
    }

    #[test]
    fn test_partial_match() {
        let m = match_template("abc{var}xyz", "abc123xyz000").unwrap();
        assert_eq!(m.kind, MatchKind::Partial);
        assert_eq!(m.suffix, "000");
        assert_eq!(m.variables.first("var"), Some("123"));
    }

    #[test]
    fn test_trailing_variable_stops_at_slash() {
        let m = match_template("/users/{id}", "/users/42/posts").unwrap();
        assert_eq!(m.kind, MatchKind::Partial);
        assert_eq!(m.suffix, "/posts");
        assert_eq!(m.variables.first("id"), Some("42"));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(match_template("/data", "/info").unwrap().kind, MatchKind::NoMatch);
        // Value exhausted before the template
        assert_eq!(match_template("/lit/{b}", "/lit/").unwrap().kind, MatchKind::NoMatch);
        assert_eq!(match_template("/{a}/{b}", "/lit").unwrap().kind, MatchKind::NoMatch);
    }

    #[test]
    fn test_repeated_variable_accumulates() {
        let m = match_template("/{id}/x/{id}", "/1/x/2").unwrap();
        assert!(m.is_complete());
        assert_eq!(m.variables.get("id").unwrap(), &["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn test_unclosed_variable() {
        let err = match_template("/a/{b", "/a/c").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnclosedVariable {
                template: "/a/{b".to_string(),
                position: 3
            }
        );
        // Not reached: the literal already differs
        assert!(!match_template("/a/{b", "/x").unwrap().is_match());
    }

    #[test]
    fn test_variable_names() {
        assert_eq!(variable_names("/{a}/lit/{b}").unwrap(), vec!["a", "b"]);
        assert!(variable_names("/plain").unwrap().is_empty());
        assert!(variable_names("/{open").is_err());
    }
}
