//! Resource resolution
//!
//! Descends the contract's resource tree one level at a time. At each level the
//! children whose template matches the remaining path are ordered by how many
//! variables they captured, fewest first, and the first of them decides: a
//! complete match is the result, a partial match is descended into with the
//! unconsumed suffix. A descent that dead-ends is not retried on a sibling.

use crate::model::{ParameterDef, Resource};
use crate::template::{self, MatchKind, VariableMatch};
use crate::values::Values;

/// A resolved resource together with the resources above it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedResource<'m> {
    /// Root-most first; the resolved resource is last
    pub chain: Vec<&'m Resource>,
    /// Variables captured along the whole path
    pub variables: Values,
}

impl<'m> ResolvedResource<'m> {
    pub fn resource(&self) -> &'m Resource {
        // The chain is never empty for a resolved resource
        self.chain[self.chain.len() - 1]
    }

    /// Full template path, e.g. `/users/{id}/posts`
    pub fn path(&self) -> String {
        self.chain.iter().map(|r| r.relative_uri.as_str()).collect()
    }

    /// URI parameter definitions in force for this resource.
    ///
    /// Definitions are collected down the chain; a deeper declaration of the
    /// same name replaces the shallower one.
    pub fn uri_parameters(&self) -> Vec<&'m ParameterDef> {
        let mut merged: Vec<&'m ParameterDef> = Vec::new();
        for resource in &self.chain {
            for def in &resource.uri_parameters {
                match merged.iter_mut().find(|d| d.name == def.name) {
                    Some(slot) => *slot = def,
                    None => merged.push(def),
                }
            }
        }
        merged
    }
}

/// Resolve `path` against the top-level `resources`.
///
/// An empty path is treated as `/`. Returns `None` when nothing matches or the
/// committed descent dead-ends.
pub fn resolve<'m>(resources: &'m [Resource], path: &str) -> Option<ResolvedResource<'m>> {
    let path = if path.is_empty() { "/" } else { path };
    let mut resolved = ResolvedResource {
        chain: Vec::new(),
        variables: Values::new(),
    };
    descend(resources, path, &mut resolved).then_some(resolved)
}

fn descend<'m>(resources: &'m [Resource], path: &str, resolved: &mut ResolvedResource<'m>) -> bool {
    let mut candidates: Vec<(&'m Resource, VariableMatch)> = resources
        .iter()
        .filter_map(|resource| match_child(resource, path).map(|m| (resource, m)))
        .collect();
    candidates.sort_by_key(|(_, m)| m.variables.value_count());

    // The most specific match decides; a partial one is committed to
    let Some((resource, m)) = candidates.into_iter().next() else {
        return false;
    };
    resolved.chain.push(resource);
    resolved.variables.merge(&m.variables);
    m.is_complete() || descend(&resource.resources, &m.suffix, resolved)
}

/// Match one child's template, keeping only complete matches and partial matches
/// that stop on a segment boundary.
fn match_child(resource: &Resource, path: &str) -> Option<VariableMatch> {
    match template::match_template(&resource.relative_uri, path) {
        Ok(m) => match m.kind {
            MatchKind::Complete => Some(m),
            MatchKind::Partial if m.suffix.starts_with('/') => Some(m),
            _ => None,
        },
        Err(e) => {
            log::warn!("Skipping resource with malformed template: {}", e);
            None
        }
    }
}
