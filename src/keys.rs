//! Key lists used by `Reduce`, `Sort` and `Join`.
//!
//! Builders accept keys in whatever shape is convenient (a single field name, an
//! array or a `Vec` of names, or [`Keys::none()`]) and normalize them to an
//! ordered [`Keys`] list once, at construction time.

use crate::error::{Error, Result};
use crate::operator::OperatorKind;
use crate::record::Record;
use crate::value::Value;
use std::fmt::{Display, Formatter, Result as FormatResult};

/// The values of a record's key fields, in key order.
///
/// Tuples compare lexicographically, which is the order `Sort` and `Join` use.
pub type KeyTuple = Vec<Value>;

/// Ordered list of field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Keys(Vec<String>);

impl Keys {
    /// The empty key list. Every record maps to the same (empty) key tuple.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|k| k == field)
    }

    /// Pull the key tuple out of `record`.
    ///
    /// # Errors
    /// [`Error::MalformedKeys`] naming the first key field the record lacks.
    pub fn extract(&self, record: &Record, operator: OperatorKind) -> Result<KeyTuple> {
        self.0
            .iter()
            .map(|field| {
                record
                    .get(field)
                    .cloned()
                    .ok_or_else(|| Error::MalformedKeys {
                        operator,
                        keys: self.clone(),
                        field: field.clone(),
                    })
            })
            .collect()
    }
}

impl Display for Keys {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "[{}]", self.0.join(", "))
    }
}

impl From<&str> for Keys {
    fn from(field: &str) -> Self {
        Self(vec![field.to_string()])
    }
}

impl From<String> for Keys {
    fn from(field: String) -> Self {
        Self(vec![field])
    }
}

impl From<&[&str]> for Keys {
    fn from(fields: &[&str]) -> Self {
        Self(fields.iter().map(|f| (*f).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Keys {
    fn from(fields: [&str; N]) -> Self {
        Self(fields.iter().map(|f| (*f).to_string()).collect())
    }
}

impl From<Vec<&str>> for Keys {
    fn from(fields: Vec<&str>) -> Self {
        Self(fields.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Keys {
    fn from(fields: Vec<String>) -> Self {
        Self(fields)
    }
}

impl From<&Keys> for Keys {
    fn from(keys: &Keys) -> Self {
        keys.clone()
    }
}

impl From<Option<&str>> for Keys {
    fn from(field: Option<&str>) -> Self {
        field.map_or_else(Keys::none, Keys::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn normalizes_every_shape() {
        let expected = Keys(vec!["word".to_string()]);
        assert_eq!(Keys::from("word"), expected);
        assert_eq!(Keys::from(["word"]), expected);
        assert_eq!(Keys::from(vec!["word"]), expected);
        assert_eq!(Keys::from(Some("word")), expected);
        assert!(Keys::from(None::<&str>).is_empty());
        assert!(Keys::from([] as [&str; 0]).is_empty());
    }

    #[test]
    fn extract_follows_key_order() -> Result<()> {
        let r = record! { "a" => 1, "b" => "x" };
        let keys = Keys::from(["b", "a"]);
        assert_eq!(
            keys.extract(&r, OperatorKind::Sort)?,
            vec![Value::from("x"), Value::from(1)]
        );
        Ok(())
    }

    #[test]
    fn extract_reports_missing_field() {
        let r = record! { "a" => 1 };
        let err = Keys::from(["a", "b"])
            .extract(&r, OperatorKind::Reduce)
            .unwrap_err();
        match err {
            Error::MalformedKeys {
                operator, field, ..
            } => {
                assert_eq!(operator, OperatorKind::Reduce);
                assert_eq!(field, "b");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_keys_give_empty_tuple() -> Result<()> {
        assert!(Keys::none().extract(&record! { "a" => 1 }, OperatorKind::Join)?.is_empty());
        Ok(())
    }
}
