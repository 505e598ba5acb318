use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The cumulative answer set collected across every wizard step.
/// This IS the form's context bag.
///
/// An open key/value record that grows by union of the step schemas.
/// Values live as JSON so steps can store strings, arrays, nested
/// objects (address, coordinates) or nulls without a fixed shape.
/// Every key a flow uses gets a stable default at construction, so
/// merging partial updates never produces a missing read.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormAnswers(Map<String, Value>);

impl FormAnswers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an answer bag from a JSON object. Anything else yields an
    /// empty bag; answers are always merged at the root level.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                tracing::warn!(value = %other, "attempted to build answers from non-object value");
                Self::default()
            }
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sets a single root-level key (aliasing).
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Merges `update` into the bag. If `update` is an object, its keys
    /// are merged at the root level; other values cannot be merged.
    pub fn merge(&mut self, update: Value) {
        match update {
            Value::Object(map) => {
                for (k, v) in map {
                    self.0.insert(k, v);
                }
            }
            other => {
                tracing::warn!(value = %other, "attempted to merge non-object into answers");
            }
        }
    }

    /// Resolves a dot-separated path (`address.street`) against the bag.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut value = self.0.get(segments.next()?)?;
        for segment in segments {
            value = value.get(segment)?;
        }
        Some(value)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    pub fn get_array(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path)?.as_array()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Overlays `overlay` on top of `defaults`, recursing into nested
    /// objects. Keys added to the defaults after a snapshot was written
    /// still come out with their default values.
    pub fn deep_merge(defaults: &FormAnswers, overlay: FormAnswers) -> FormAnswers {
        let mut merged = Value::Object(defaults.0.clone());
        merge_value(&mut merged, Value::Object(overlay.0));
        Self::from_value(merged)
    }
}

fn merge_value(base: &mut Value, overlay: Value) {
    match overlay {
        Value::Object(map) => {
            if let Value::Object(target) = base {
                for (k, v) in map {
                    match target.entry(k) {
                        serde_json::map::Entry::Occupied(mut slot) => merge_value(slot.get_mut(), v),
                        serde_json::map::Entry::Vacant(slot) => {
                            slot.insert(v);
                        }
                    }
                }
            } else {
                *base = Value::Object(map);
            }
        }
        other => *base = other,
    }
}
