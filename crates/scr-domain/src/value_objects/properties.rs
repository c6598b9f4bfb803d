//! Property sets
//!
//! Component and service properties are string-keyed JSON values. Keys are
//! stored as given; filter evaluation looks them up case-insensitively.

use crate::constants::{
    COMPONENT_ID, DEFAULT_SERVICE_RANKING, OBJECT_CLASS, PRIVATE_PROPERTY_PREFIX, SERVICE_ID,
    SERVICE_RANKING,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Ordered property map used for descriptions, configurations and services
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a property, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a property
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Exact-key lookup
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Case-insensitive lookup, exact match first
    pub fn get_ignore_case(&self, key: &str) -> Option<&Value> {
        self.0.get(key).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// True if the key is present
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value of a property, if it is a string
    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Integer value of a property, if it is an integer
    pub fn i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    /// Iterate over all properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if there are no properties
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in &other.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Copy of `self` overlaid with `other`
    pub fn merged(&self, other: &Properties) -> Properties {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// Properties without the private (dot-prefixed) keys
    pub fn public(&self) -> Properties {
        self.0
            .iter()
            .filter(|(k, _)| !k.starts_with(PRIVATE_PROPERTY_PREFIX))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Service ranking; non-integer values count as the default ranking
    pub fn ranking(&self) -> i64 {
        self.i64(SERVICE_RANKING).unwrap_or(DEFAULT_SERVICE_RANKING)
    }

    /// Registry-assigned service id, if present
    pub fn service_id(&self) -> Option<u64> {
        self.get(SERVICE_ID).and_then(Value::as_u64)
    }

    /// Runtime id of the component configuration that provides this service
    pub fn component_id(&self) -> Option<u64> {
        self.get(COMPONENT_ID).and_then(Value::as_u64)
    }

    /// Interfaces listed under `objectClass`
    pub fn object_class(&self) -> Vec<String> {
        match self.get(OBJECT_CLASS) {
            Some(Value::String(single)) => vec![single.clone()],
            Some(Value::Array(values)) => values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// True if `objectClass` lists the interface
    pub fn implements(&self, interface: &str) -> bool {
        self.object_class().iter().any(|name| name == interface)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for Properties {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Properties> for BTreeMap<String, Value> {
    fn from(properties: Properties) -> Self {
        properties.0
    }
}

impl<'a> IntoIterator for &'a Properties {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
