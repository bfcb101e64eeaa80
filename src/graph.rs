//! Live object graph seen through path lookups.
//!
//! The host owns the real graph; components only ever see it through
//! [`ObjectGraph`]. Lookups never create or mutate anything on failure.

use crate::value::Value;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A gettable/settable value living at a graph path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub path: String,

    /// Kind tag reported by the host (`CHOP`, `DAT`, `par`, ...).
    #[serde(default = "default_family")]
    pub family: String,

    #[serde(default = "default_value")]
    pub value: Value,

    /// Non-empty for menu endpoints; `value` then holds the selected index.
    #[serde(default, rename = "menu")]
    pub menu_labels: Vec<String>,
}

fn default_family() -> String {
    "par".to_string()
}

fn default_value() -> Value {
    Value::Float(0.0)
}

impl Endpoint {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            family: default_family(),
            value: value.into(),
            menu_labels: Vec::new(),
        }
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = family.into();
        self
    }

    pub fn with_menu(mut self, labels: &[&str], selected: usize) -> Self {
        self.menu_labels = labels.iter().map(|l| l.to_string()).collect();
        self.value = Value::Int(selected as i64);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn is_menu(&self) -> bool {
        !self.menu_labels.is_empty()
    }

    /// Current value; menus report their selected index.
    pub fn get(&self) -> Value {
        if self.is_menu() {
            return Value::Int(self.menu_index().unwrap_or(0) as i64);
        }
        self.value.clone()
    }

    /// Assign a value. Menus accept an index or one of their labels; anything
    /// else leaves a menu unchanged and returns `false`.
    pub fn set(&mut self, value: Value) -> bool {
        if !self.is_menu() {
            self.value = value;
            return true;
        }

        let index = match &value {
            Value::Str(label) => self.menu_labels.iter().position(|l| l == label),
            other => other.as_index().filter(|i| *i < self.menu_labels.len()),
        };
        match index {
            Some(i) => {
                self.value = Value::Int(i as i64);
                true
            }
            None => false,
        }
    }

    fn menu_index(&self) -> Option<usize> {
        self.value.as_index().filter(|i| *i < self.menu_labels.len())
    }
}

pub trait ObjectGraph {
    fn resolve(&self, path: &str) -> Option<&Endpoint>;
    fn resolve_mut(&mut self, path: &str) -> Option<&mut Endpoint>;
}

/// Path-keyed registry standing in for the host graph.
#[derive(Debug, Clone, Default)]
pub struct MemoryGraph {
    endpoints: BTreeMap<String, Endpoint>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, endpoint: Endpoint) -> Option<Endpoint> {
        self.endpoints.insert(endpoint.path.clone(), endpoint)
    }

    pub fn remove(&mut self, path: &str) -> Option<Endpoint> {
        self.endpoints.remove(path)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

impl FromIterator<Endpoint> for MemoryGraph {
    fn from_iter<I: IntoIterator<Item = Endpoint>>(iter: I) -> Self {
        let mut graph = MemoryGraph::new();
        for endpoint in iter {
            graph.insert(endpoint);
        }
        graph
    }
}

impl ObjectGraph for MemoryGraph {
    fn resolve(&self, path: &str) -> Option<&Endpoint> {
        self.endpoints.get(path)
    }

    fn resolve_mut(&mut self, path: &str) -> Option<&mut Endpoint> {
        self.endpoints.get_mut(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn menu_reports_index_and_accepts_labels() {
        let mut ep = Endpoint::new("/a/blend", 0.0).with_menu(&["Add", "Alpha", "Multiply"], 1);
        assert_eq!(ep.get(), Value::Int(1));

        assert!(ep.set(Value::from("Multiply")));
        assert_eq!(ep.get(), Value::Int(2));

        assert!(ep.set(Value::Int(0)));
        assert_eq!(ep.get(), Value::Int(0));

        assert!(!ep.set(Value::from("Screen")));
        assert!(!ep.set(Value::Int(7)));
        assert_eq!(ep.get(), Value::Int(0));
    }

    #[test]
    fn scalar_endpoint_takes_any_value() {
        let mut ep = Endpoint::new("/a/opacity", 1.0);
        assert!(ep.set(Value::Float(0.25)));
        assert_eq!(ep.get(), Value::Float(0.25));
    }

    #[test]
    fn resolve_misses_without_side_effects() {
        let mut graph: MemoryGraph = [Endpoint::new("/a/x", 1.0)].into_iter().collect();
        assert!(graph.resolve("/a/y").is_none());
        assert!(graph.resolve_mut("/a/y").is_none());
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn deserializes_scenario_shape() {
        let ep: Endpoint =
            serde_json::from_str(r#"{"path": "/a/blend", "menu": ["Add", "Alpha"], "value": 1}"#)
                .unwrap();
        assert!(ep.is_menu());
        assert_eq!(ep.family(), "par");
        assert_eq!(ep.get(), Value::Int(1));
    }
}
