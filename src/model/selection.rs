use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::collections::HashMap;

/// Named values shared by the panels of one group, e.g. the currently
/// selected idea. Values are opaque to the layout engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    values: HashMap<String, Value>,
}

/// A set of updates to merge into a [`Selection`]. A `null` value clears the key.
pub type SelectionChanges = Selection;

impl Selection {
    pub fn new() -> Self { Self::default() }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> { self.values.get(key) }

    /// True when `key` holds a non-null value.
    pub fn contains(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn is_empty(&self) -> bool { self.values.is_empty() }

    pub fn len(&self) -> usize { self.values.len() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Applies `changes` and reports whether any stored value changed.
    pub fn merge(&mut self, changes: &SelectionChanges) -> bool {
        let mut changed = false;
        for (key, value) in &changes.values {
            if value.is_null() {
                changed |= self.values.remove(key).is_some();
            } else if self.values.get(key) != Some(value) {
                self.values.insert(key.clone(), value.clone());
                changed = true;
            }
        }
        changed
    }
}

impl FromIterator<(String, Value)> for Selection {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn merge_inserts_and_reports_changes() {
        let mut selection = Selection::new();
        assert!(selection.merge(&Selection::new().with("currentIdea", 3)));
        assert_eq!(selection.get("currentIdea"), Some(&json!(3)));
        assert!(!selection.merge(&Selection::new().with("currentIdea", 3)));
        assert!(selection.merge(&Selection::new().with("currentIdea", 4)));
    }

    #[test]
    fn null_clears_a_key() {
        let mut selection = Selection::new().with("currentIdea", "a");
        assert!(selection.contains("currentIdea"));
        assert!(selection.merge(&Selection::new().with("currentIdea", Value::Null)));
        assert!(!selection.contains("currentIdea"));
        assert!(selection.is_empty());
        assert!(!selection.merge(&Selection::new().with("currentIdea", Value::Null)));
    }

    #[test]
    fn serializes_as_a_plain_map() {
        let selection = Selection::new().with("currentIdea", 7);
        assert_eq!(serde_json::to_value(&selection).unwrap(), json!({"currentIdea": 7}));
    }
}
