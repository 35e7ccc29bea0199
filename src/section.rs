//! Ordered label/value mapping produced by every collector.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// A displayable value: a formatted scalar or nested entries.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Group(Section),
    List(Vec<Section>),
}

impl Value {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Section> {
        match self {
            Value::Group(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Section]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Text(s) => serializer.serialize_str(s),
            Value::Group(g) => g.serialize(serializer),
            Value::List(l) => l.serialize(serializer),
        }
    }
}

/// Insertion-ordered mapping from label to [`Value`].
///
/// Re-inserting a label replaces its value and keeps its original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Section {
    entries: Vec<(String, Value)>,
}

impl Section {
    pub fn new() -> Self {
        Self::default()
    }

    /// A section holding a single `label: value` entry.
    pub fn single(label: impl Into<String>, value: impl Into<String>) -> Self {
        let mut section = Self::new();
        section.text(label, value);
        section
    }

    pub fn insert(&mut self, label: impl Into<String>, value: Value) {
        let label = label.into();
        match self.entries.iter_mut().find(|(l, _)| *l == label) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((label, value)),
        }
    }

    pub fn text(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.insert(label, Value::Text(value.into()));
    }

    pub fn group(&mut self, label: impl Into<String>, section: Section) {
        self.insert(label, Value::Group(section));
    }

    pub fn list(&mut self, label: impl Into<String>, items: Vec<Section>) {
        self.insert(label, Value::List(items));
    }

    pub fn get(&self, label: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v)
    }

    /// Text value for `label`, if present and scalar.
    pub fn get_text(&self, label: &str) -> Option<&str> {
        self.get(label).and_then(Value::as_text)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(l, _)| l.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(l, v)| (l.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}
