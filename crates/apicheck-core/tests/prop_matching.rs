//! Property-based tests for template matching, media types and parameters
//!
//! These tests verify invariants that should hold for all inputs, not just
//! the hand-picked cases in the unit tests.

use apicheck_core::media_type::{self, MediaType};
use apicheck_core::params::check_value;
use apicheck_core::template::{match_template, MatchKind};
use apicheck_core::{ParamType, ParameterDef};
use proptest::prelude::*;

// Strategy functions for property testing

/// Strategy for literal path segments
fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z0-9]{1,8}"
}

/// Strategy for media type tokens
fn token_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9.-]{0,10}"
}

proptest! {
    #[test]
    fn prop_literal_template_matches_itself(segments in prop::collection::vec(segment_strategy(), 1..5)) {
        let path = format!("/{}", segments.join("/"));
        let m = match_template(&path, &path).unwrap();
        prop_assert_eq!(m.kind, MatchKind::Complete);
        prop_assert!(m.variables.is_empty());
    }

    #[test]
    fn prop_variables_capture_segments(values in prop::collection::vec(segment_strategy(), 1..5)) {
        let template: String = (0..values.len()).map(|i| format!("/{{v{}}}", i)).collect();
        let path = format!("/{}", values.join("/"));
        let m = match_template(&template, &path).unwrap();
        prop_assert_eq!(m.kind, MatchKind::Complete);
        for (i, value) in values.iter().enumerate() {
            let name = format!("v{}", i);
            prop_assert_eq!(m.variables.first(&name), Some(value.as_str()));
        }
    }

    #[test]
    fn prop_partial_suffix_is_unconsumed_rest(
        prefix in prop::collection::vec(segment_strategy(), 1..3),
        rest in prop::collection::vec(segment_strategy(), 1..3),
    ) {
        let template = format!("/{}", prefix.join("/"));
        let suffix = format!("/{}", rest.join("/"));
        let m = match_template(&template, &format!("{}{}", template, suffix)).unwrap();
        prop_assert_eq!(m.kind, MatchKind::Partial);
        prop_assert_eq!(m.suffix, suffix);
    }

    #[test]
    fn prop_matching_never_panics(template in "[a-z/{}]{0,12}", value in "[a-z/]{0,12}") {
        let _ = match_template(&template, &value);
    }

    #[test]
    fn prop_media_type_display_reparses(main in token_strategy(), sub in token_strategy()) {
        let parsed = MediaType::parse(&format!("{}/{}", main, sub)).unwrap();
        let reparsed = MediaType::parse(&parsed.to_string()).unwrap();
        prop_assert_eq!(parsed, reparsed);
    }

    #[test]
    fn prop_compatibility_is_symmetric(
        a in prop::sample::select(vec!["*/*", "application/*", "application/*+json", "application/json",
                                       "application/hal+json", "text/*", "text/xml", "application/*+xml"]),
        b in prop::sample::select(vec!["*/*", "application/*", "application/*+json", "application/json",
                                       "application/hal+json", "text/*", "text/xml", "application/*+xml"]),
    ) {
        let (a, b) = (MediaType::parse(a).unwrap(), MediaType::parse(b).unwrap());
        prop_assert_eq!(a.is_compatible_with(&b), b.is_compatible_with(&a));
    }

    #[test]
    fn prop_negotiated_candidate_is_declared(q1 in 0.0f64..=1.0, q2 in 0.0f64..=1.0) {
        let candidates = vec![
            MediaType::parse("text/plain").unwrap(),
            MediaType::parse("text/xml").unwrap(),
        ];
        let accept = format!("text/plain;q={:.3}, text/xml;q={:.3}", q1, q2);
        let best = media_type::find_best_match(&accept, &candidates).unwrap().unwrap();
        prop_assert!(candidates.contains(best));
    }

    #[test]
    fn prop_canonical_integers_are_valid(n in any::<i64>()) {
        let def = ParameterDef::new("n", ParamType::Integer);
        prop_assert!(check_value(&def, &n.to_string(), "n").is_empty());
    }

    #[test]
    fn prop_leading_zeros_are_invalid(n in 0u32..100_000) {
        let def = ParameterDef::new("n", ParamType::Integer);
        let reasons = check_value(&def, &format!("0{}", n), "n");
        prop_assert_eq!(reasons, vec!["is not a valid integer".to_string()]);
    }
}
