//! Ordered multi-valued name/value map used for headers, query, form and URI values

use serde::{Deserialize, Serialize};

/// Insertion-ordered map from a name to all values supplied for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Values {
    entries: Vec<(String, Vec<String>)>,
}

impl Values {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` string such as a URL query
    pub fn from_query(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect()
    }

    /// Append one value under `name`
    pub fn add_value<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Builder-style [`add_value`](Self::add_value)
    pub fn with_value<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.add_value(name, value);
        self
    }

    /// Append every value of `other`, keeping its order
    pub fn merge(&mut self, other: &Values) {
        for (name, values) in other.iter() {
            for value in values {
                self.add_value(name, value.as_str());
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Look a name up ignoring ASCII case; values of differently-cased names are combined
    pub fn get_ignore_case(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .flat_map(|(_, values)| values.iter().map(String::as_str))
            .collect()
    }

    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|values| values.first()).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_slice()))
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of values across all names
    pub fn value_count(&self) -> usize {
        self.entries.iter().map(|(_, v)| v.len()).sum()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut values = Values::new();
        for (name, value) in iter {
            values.add_value(name, value);
        }
        values
    }
}
