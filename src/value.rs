//! Field values carried by a [`Record`](crate::Record).
//!
//! `Value` mirrors the JSON data model, with two differences that matter to the
//! engine:
//! - integers and floats are kept apart (`Int` / `Float`) but compare
//!   numerically against each other, so `1` and `1.0` land in the same key group;
//! - every value is totally ordered, which is what lets `Sort`, `Reduce` and the
//!   sort-merge `Join` work over arbitrary key tuples.
//!
//! Ordering across kinds follows a fixed rank:
//! `Null < Bool < numbers < Str < List < Map`. NaN sorts after every other float.
//!
//! Values (de)serialize through `serde_json::Value`, so a `Value` reads and writes
//! as plain JSON.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// A single field value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Rank used to order values of different kinds.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) => 4,
            Value::Map(_) => 5,
        }
    }

    /// Integer view. Floats are not truncated; they return `None`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of either an `Int` or a `Float`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(f.0),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }
}

/// 2^63, the first float above every `i64`.
const I64_END: f64 = 9_223_372_036_854_775_808.0;

/// Exact comparison of an integer with a float. Casting the integer to `f64`
/// rounds above 2^53 and would make distinct integers equal to the same float.
#[allow(clippy::cast_possible_truncation)]
fn cmp_int_float(i: i64, f: OrderedFloat<f64>) -> Ordering {
    let f = f.0;
    if f.is_nan() || f >= I64_END {
        return Ordering::Less;
    }
    if f < -I64_END {
        return Ordering::Greater;
    }
    // In range and integral, so the cast is exact.
    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => whole.partial_cmp(&f).unwrap_or(Ordering::Equal),
        other => other,
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.cmp(b),
            (Value::Int(a), Value::Float(b)) => cmp_int_float(*a, *b),
            (Value::Float(a), Value::Int(b)) => cmp_int_float(*b, *a).reverse(),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => a.cmp(b),
            (Value::Map(a), Value::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality must agree with `Ord`, otherwise grouping and merging disagree.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{}", serde_json::Value::from(self.clone()))
    }
}

/* ---------- JSON bridge ---------- */

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(OrderedFloat(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            // Non-finite floats have no JSON spelling.
            Value::Float(f) => serde_json::Number::from_f64(f.0)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::Str(s) => serde_json::Value::String(s),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Into::into).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/* ---------- Native conversions ---------- */

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! int_into_value {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(i: $t) -> Self {
                Value::Int(i64::from(i))
            }
        })*
    };
}

int_into_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: usize) -> Self {
        i64::try_from(n).map_or(Value::Float(OrderedFloat(n as f64)), Value::Int)
    }
}

impl From<u64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: u64) -> Self {
        i64::try_from(n).map_or(Value::Float(OrderedFloat(n as f64)), Value::Int)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(OrderedFloat(f64::from(f)))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(Value::from(1), Value::from(1.0));
        assert!(Value::from(1) < Value::from(1.5));
        assert!(Value::from(2.5) > Value::from(2));
        assert!(Value::from(-3) < Value::from(-2.9));
    }

    #[test]
    fn large_integers_compare_exactly_with_floats() {
        let two_53 = 9_007_199_254_740_992_i64;
        let f = Value::from(9_007_199_254_740_992.0);
        assert_eq!(Value::from(two_53), f);
        assert_ne!(Value::from(two_53 + 1), f);
        assert!(Value::from(two_53 + 1) > f);
        assert!(f < Value::from(two_53 + 1));
        assert!(Value::from(i64::MAX) < Value::from(9.3e18));
        assert!(Value::from(i64::MIN) > Value::from(-9.3e18));
        assert_eq!(Value::from(i64::MIN), Value::from(-9_223_372_036_854_775_808.0));
        assert!(Value::from(i64::MAX) < Value::from(f64::INFINITY));
        assert!(Value::from(-2) > Value::from(-2.5));
        assert!(Value::from(-3) < Value::from(-2.5));
    }

    #[test]
    fn kinds_are_ranked() {
        let mut vals = vec![
            Value::from("a"),
            Value::from(3),
            Value::Null,
            Value::from(true),
            Value::from(vec![1]),
        ];
        vals.sort();
        assert_eq!(
            vals,
            vec![
                Value::Null,
                Value::from(true),
                Value::from(3),
                Value::from("a"),
                Value::from(vec![1]),
            ]
        );
    }

    #[test]
    fn nan_sorts_last_among_numbers() {
        let mut vals = vec![Value::from(f64::NAN), Value::from(1.0), Value::from(-4)];
        vals.sort();
        assert_eq!(vals[0], Value::from(-4));
        assert_eq!(vals[1], Value::from(1.0));
        assert!(vals[2].as_f64().is_some_and(f64::is_nan));
    }

    #[test]
    fn json_bridge_keeps_integers_integral() {
        let v: Value = serde_json::from_str(r#"{"a": 1, "b": 1.5, "c": [null, "x"]}"#).unwrap();
        let m = v.as_map().unwrap();
        assert_eq!(m["a"].as_i64(), Some(1));
        assert_eq!(m["b"].as_f64(), Some(1.5));
        assert_eq!(m["c"].as_list().map(<[Value]>::len), Some(2));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#"{"a":1,"b":1.5,"c":[null,"x"]}"#);
    }

    #[test]
    fn non_finite_float_serializes_as_null() {
        assert_eq!(serde_json::to_string(&Value::from(f64::INFINITY)).unwrap(), "null");
    }
}
