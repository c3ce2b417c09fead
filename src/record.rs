//! The row type flowing through every operator.
//!
//! A [`Record`] is a schemaless mapping from field name to [`Value`]. Field order is
//! irrelevant; storage is a `BTreeMap` so equality, ordering and debug output are
//! deterministic. Records serialize as a plain JSON object.
//!
//! ```
//! use compgraph::{record, Record, Value};
//!
//! let r = record! { "doc_id" => 1, "text" => "a a b" };
//! assert_eq!(r.get("doc_id"), Some(&Value::from(1)));
//! assert_eq!(r.get_str("text"), Some("a a b"));
//! ```

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map;

/// One row of a table.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// String field, or `None` when absent or not a string.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Integer field, or `None` when absent or not an integer.
    #[must_use]
    pub fn get_i64(&self, field: &str) -> Option<i64> {
        self.get(field).and_then(Value::as_i64)
    }

    /// Numeric field (integer or float) as `f64`.
    #[must_use]
    pub fn get_f64(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    /// Set `field`, returning the previous value if any.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(field.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in ascending order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Keep only the listed fields.
    #[must_use]
    pub fn project(&self, fields: &[&str]) -> Self {
        fields
            .iter()
            .filter_map(|f| self.get(f).map(|v| ((*f).to_string(), v.clone())))
            .collect()
    }
}

impl From<BTreeMap<String, Value>> for Record {
    fn from(fields: BTreeMap<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Record> for BTreeMap<String, Value> {
    fn from(record: Record) -> Self {
        record.0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Record {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Build a [`Record`] from `field => value` pairs.
///
/// Values go through `Into<Value>`, so numbers, strings, booleans, vectors and
/// options can be used directly.
///
/// ```
/// use compgraph::record;
///
/// let r = record! { "word" => "hello", "count" => 1 };
/// assert_eq!(r.len(), 2);
/// let empty = record! {};
/// assert!(empty.is_empty());
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::Record::new()
    };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $( record.insert($field, $value); )+
        record
    }};
}
