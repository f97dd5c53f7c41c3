//! Media types: parsing, compatibility and Accept negotiation
//!
//! Compatibility is symmetric and wildcard-aware:
//! - `*/*` is compatible with everything
//! - equal types with equal subtypes are compatible
//! - a wildcard subtype (`*` or `*+suffix`) matches a subtype with the same
//!   suffix; `*` alone only matches subtypes without a suffix
//! - against a wildcard subtype, the bare family names `json` and `xml` stand for
//!   `*+json` and `*+xml`, so `application/*+json` accepts `application/json`

use crate::error::MediaTypeError;
use std::fmt;
use std::str::FromStr;

/// Subtypes that are shorthand for a whole suffix family
const FAMILY_ALIASES: &[(&str, &str)] = &[("json", "*+json"), ("xml", "*+xml")];

/// A parsed `type/subtype;name=value` media type or media range
#[derive(Debug, Clone, PartialEq)]
pub struct MediaType {
    main: String,
    sub: String,
    parameters: Vec<(String, String)>,
    quality: f64,
}

impl MediaType {
    pub const WILDCARD: &'static str = "*/*";

    /// Parse a media type; a bare `*` is read as `*/*`.
    pub fn parse(value: &str) -> Result<Self, MediaTypeError> {
        let mut parts = value.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        if essence.is_empty() {
            return Err(MediaTypeError::Empty);
        }
        let essence = if essence == "*" { Self::WILDCARD } else { essence };
        let (main, sub) = essence.split_once('/').ok_or_else(|| MediaTypeError::MissingSlash {
            media_type: value.to_string(),
        })?;
        let (main, sub) = (main.trim().to_ascii_lowercase(), sub.trim().to_ascii_lowercase());
        if main.is_empty() || sub.is_empty() {
            return Err(MediaTypeError::EmptySubtype {
                media_type: value.to_string(),
            });
        }
        if main == "*" && sub != "*" {
            return Err(MediaTypeError::WildcardType {
                media_type: value.to_string(),
            });
        }

        let mut parameters = Vec::new();
        let mut quality = 1.0;
        for raw in parts.map(str::trim).filter(|p| !p.is_empty()) {
            let (name, param_value) = raw.split_once('=').ok_or_else(|| MediaTypeError::InvalidParameter {
                media_type: value.to_string(),
                parameter: raw.to_string(),
            })?;
            let name = name.trim().to_ascii_lowercase();
            let param_value = unquote(param_value.trim()).to_string();
            if name == "q" {
                quality = parse_quality(&param_value).ok_or_else(|| MediaTypeError::InvalidQuality {
                    media_type: value.to_string(),
                    quality: param_value.clone(),
                })?;
            }
            parameters.push((name, param_value));
        }

        Ok(Self {
            main,
            sub,
            parameters,
            quality,
        })
    }

    /// Primary type, e.g. `application`
    pub fn main_type(&self) -> &str {
        &self.main
    }

    pub fn subtype(&self) -> &str {
        &self.sub
    }

    /// `type/subtype` without parameters
    pub fn essence(&self) -> String {
        format!("{}/{}", self.main, self.sub)
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The `q` parameter, 1 when absent
    pub fn quality(&self) -> f64 {
        self.quality
    }

    pub fn is_wildcard(&self) -> bool {
        self.main == "*" && self.sub == "*"
    }

    pub fn is_wildcard_subtype(&self) -> bool {
        self.sub == "*" || self.sub.starts_with("*+")
    }

    /// The structured-syntax suffix after the last `+`, if any
    pub fn suffix(&self) -> Option<&str> {
        self.sub.rfind('+').map(|pos| &self.sub[pos + 1..])
    }

    /// Form-encoded or multipart form body
    pub fn is_form(&self) -> bool {
        self.main == "application" && self.sub == "x-www-form-urlencoded"
            || self.main == "multipart" && self.sub == "form-data"
    }

    pub fn is_compatible_with(&self, other: &MediaType) -> bool {
        if self.is_wildcard() || other.is_wildcard() {
            return true;
        }
        if self.matches(other) {
            return true;
        }
        if self.is_wildcard_subtype() || other.is_wildcard_subtype() {
            let this = self.aliased();
            let that = other.aliased();
            if this.is_some() || that.is_some() {
                let this = this.as_ref().unwrap_or(self);
                let that = that.as_ref().unwrap_or(other);
                return this.matches(that);
            }
        }
        false
    }

    fn matches(&self, other: &MediaType) -> bool {
        if self.main != other.main {
            return false;
        }
        if self.sub == other.sub {
            return true;
        }
        if !self.is_wildcard_subtype() && !other.is_wildcard_subtype() {
            return false;
        }
        match (self.suffix(), other.suffix()) {
            (None, None) => self.sub == "*" || other.sub == "*",
            (Some(a), Some(b)) => a == b && (self.sub.starts_with('*') || other.sub.starts_with('*')),
            _ => false,
        }
    }

    fn aliased(&self) -> Option<MediaType> {
        FAMILY_ALIASES
            .iter()
            .find(|(family, _)| *family == self.sub)
            .map(|(_, alias)| MediaType {
                main: self.main.clone(),
                sub: (*alias).to_string(),
                parameters: self.parameters.clone(),
                quality: self.quality,
            })
    }
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main, self.sub)?;
        for (name, value) in &self.parameters {
            write!(f, ";{}={}", name, value)?;
        }
        Ok(())
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_quality(value: &str) -> Option<f64> {
    value
        .parse::<f64>()
        .ok()
        .filter(|q| (0.0..=1.0).contains(q))
}

/// Parse a comma-separated Accept-style list of media ranges, sorted by
/// descending quality. Ranges of equal quality keep their original order.
pub fn parse_media_ranges(accept: &str) -> Result<Vec<MediaType>, MediaTypeError> {
    let mut ranges = accept
        .split(',')
        .filter(|r| !r.trim().is_empty())
        .map(MediaType::parse)
        .collect::<Result<Vec<_>, _>>()?;
    ranges.sort_by(|a, b| b.quality().total_cmp(&a.quality()));
    Ok(ranges)
}

/// Outcome of Accept negotiation
#[derive(Debug, Clone, PartialEq)]
pub struct Negotiated<'a> {
    /// The media range that selected the candidate
    pub range: MediaType,
    pub candidate: &'a MediaType,
}

/// Negotiate the preferred candidate for an Accept header value.
///
/// Walks the ranges from highest to lowest quality and returns the first
/// candidate compatible with a range. A blank Accept accepts anything, so the
/// first candidate is returned.
pub fn negotiate<'a>(
    accept: &str,
    candidates: &'a [MediaType],
) -> Result<Option<Negotiated<'a>>, MediaTypeError> {
    let ranges = if accept.trim().is_empty() {
        vec![MediaType::parse(MediaType::WILDCARD)?]
    } else {
        parse_media_ranges(accept)?
    };
    Ok(ranges.into_iter().find_map(|range| {
        candidates
            .iter()
            .find(|c| range.is_compatible_with(c))
            .map(|candidate| Negotiated { range, candidate })
    }))
}

/// The candidate preferred by `accept`, see [`negotiate`]
pub fn find_best_match<'a>(
    accept: &str,
    candidates: &'a [MediaType],
) -> Result<Option<&'a MediaType>, MediaTypeError> {
    Ok(negotiate(accept, candidates)?.map(|n| n.candidate))
}
