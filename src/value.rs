//! `DynamicValue` — the tagged union accepted in [`crate::agent::AgentInput`]'s
//! `context` map and [`crate::agent::AgentOutput`]'s `structured_data` map.
//!
//! Modeled the way the retrieval pack's agent runtimes model heterogeneous
//! config values (e.g. `aof-core`'s `MemorySpec`): an untagged `serde` enum
//! that serializes to whatever JSON shape its variant naturally produces, and
//! parses back by trying variants in order until one matches.

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use std::collections::BTreeMap;

/// A JSON-round-trippable dynamic value.
///
/// Integers and floats are distinguished on the way in from JSON by trying
/// `as_i64` before falling back to `as_f64` — this preserves the common case
/// of whole-number context values (e.g. retry counts) as `Integer` rather
/// than silently widening everything to `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DynamicValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<DynamicValue>),
    Map(BTreeMap<String, DynamicValue>),
}

impl DynamicValue {
    /// Render as a single-line primitive string where possible; anything that
    /// isn't a scalar falls back to its JSON form. Used by [`crate::llm_agent`]
    /// to stringify context variables into the assembled prompt.
    pub fn stringify(&self) -> String {
        match self {
            DynamicValue::String(s) => s.clone(),
            DynamicValue::Integer(i) => i.to_string(),
            DynamicValue::Float(f) => f.to_string(),
            DynamicValue::Bool(b) => b.to_string(),
            DynamicValue::Array(_) | DynamicValue::Map(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynamicValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DynamicValue::Integer(i) => Some(*i as f64),
            DynamicValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DynamicValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&Json> for DynamicValue {
    fn from(value: &Json) -> Self {
        match value {
            Json::String(s) => DynamicValue::String(s.clone()),
            Json::Bool(b) => DynamicValue::Bool(*b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    DynamicValue::Integer(i)
                } else {
                    DynamicValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Json::Array(items) => DynamicValue::Array(items.iter().map(DynamicValue::from).collect()),
            Json::Object(map) => DynamicValue::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), DynamicValue::from(v)))
                    .collect(),
            ),
            Json::Null => DynamicValue::Map(BTreeMap::new()),
        }
    }
}

impl From<Json> for DynamicValue {
    fn from(value: Json) -> Self {
        DynamicValue::from(&value)
    }
}

impl From<DynamicValue> for Json {
    fn from(value: DynamicValue) -> Self {
        match value {
            DynamicValue::String(s) => Json::String(s),
            DynamicValue::Integer(i) => Json::Number(i.into()),
            DynamicValue::Float(f) => {
                serde_json::Number::from_f64(f).map(Json::Number).unwrap_or(Json::Null)
            }
            DynamicValue::Bool(b) => Json::Bool(b),
            DynamicValue::Array(items) => Json::Array(items.into_iter().map(Json::from).collect()),
            DynamicValue::Map(map) => {
                Json::Object(map.into_iter().map(|(k, v)| (k, Json::from(v))).collect())
            }
        }
    }
}

impl From<&str> for DynamicValue {
    fn from(s: &str) -> Self {
        DynamicValue::String(s.to_string())
    }
}

impl From<String> for DynamicValue {
    fn from(s: String) -> Self {
        DynamicValue::String(s)
    }
}

impl From<i64> for DynamicValue {
    fn from(i: i64) -> Self {
        DynamicValue::Integer(i)
    }
}

impl From<f64> for DynamicValue {
    fn from(f: f64) -> Self {
        DynamicValue::Float(f)
    }
}

impl From<bool> for DynamicValue {
    fn from(b: bool) -> Self {
        DynamicValue::Bool(b)
    }
}
