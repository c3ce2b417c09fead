//! Sort-merge join.
//!
//! Both sides are drained on first pull, stably sorted by the key tuple and cut
//! into runs of equal keys. Two cursors then walk the runs in ascending key
//! order:
//! - equal keys emit the left-major Cartesian product of the two runs;
//! - a run present on only one side is emitted as-is when the join kind keeps
//!   that side, and skipped otherwise.
//!
//! Output is produced one matched group at a time.

use crate::error::{Error, Result};
use crate::exec::sort::sort_keyed;
use crate::exec::{RecordStream, keyed};
use crate::keys::{KeyTuple, Keys};
use crate::operator::{JoinKind, OperatorKind};
use crate::record::Record;
use std::cmp::Ordering;
use std::collections::VecDeque;
use std::iter::Peekable;

type Groups = Peekable<std::vec::IntoIter<(KeyTuple, Vec<Record>)>>;

/// Merge one matched pair into a single record.
///
/// Fields from `left` come first; fields only `right` has are added. A field on
/// both sides must be a join key and keeps the left value, which equals the
/// right one by construction.
///
/// # Errors
/// [`Error::AmbiguousField`] when a shared field is not a join key.
pub fn merge_records(left: &Record, right: &Record, keys: &Keys) -> Result<Record> {
    let mut merged = left.clone();
    for (field, value) in right {
        if merged.contains(field) {
            if keys.contains(field) {
                continue;
            }
            return Err(Error::AmbiguousField {
                field: field.clone(),
                keys: keys.clone(),
            });
        }
        merged.insert(field.clone(), value.clone());
    }
    Ok(merged)
}

fn group(mut rows: Vec<(KeyTuple, Record)>) -> Groups {
    sort_keyed(&mut rows, false);
    let mut groups: Vec<(KeyTuple, Vec<Record>)> = Vec::new();
    for (key, record) in rows {
        match groups.last_mut() {
            Some((last, members)) if *last == key => members.push(record),
            _ => groups.push((key, vec![record])),
        }
    }
    groups.into_iter().peekable()
}

struct Merge {
    left: Groups,
    right: Groups,
    buffer: VecDeque<Record>,
}

enum State {
    Pending {
        left: RecordStream,
        right: RecordStream,
    },
    Merging(Merge),
    Done,
}

/// Lazy sort-merge join of two record streams.
pub struct JoinStream {
    keys: Keys,
    kind: JoinKind,
    state: State,
}

impl JoinStream {
    pub fn new(left: RecordStream, right: RecordStream, keys: Keys, kind: JoinKind) -> Self {
        Self {
            keys,
            kind,
            state: State::Pending { left, right },
        }
    }

    fn start(&self, mut left: RecordStream, mut right: RecordStream) -> Result<Merge> {
        let left = keyed(&mut left, &self.keys, OperatorKind::Join)?;
        let right = keyed(&mut right, &self.keys, OperatorKind::Join)?;
        tracing::trace!(
            keys = %self.keys,
            kind = %self.kind,
            left = left.len(),
            right = right.len(),
            "join inputs materialized"
        );
        Ok(Merge {
            left: group(left),
            right: group(right),
            buffer: VecDeque::new(),
        })
    }

    /// Fill `merge.buffer` from the next key group. Returns `false` once both
    /// sides are exhausted.
    fn advance(&self, merge: &mut Merge) -> Result<bool> {
        let order = match (merge.left.peek(), merge.right.peek()) {
            (None, None) => return Ok(false),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (Some((l, _)), Some((r, _))) => l.cmp(r),
        };
        match order {
            Ordering::Less => {
                if let Some((_, records)) = merge.left.next()
                    && self.kind.keeps_left()
                {
                    merge.buffer.extend(records);
                }
            }
            Ordering::Greater => {
                if let Some((_, records)) = merge.right.next()
                    && self.kind.keeps_right()
                {
                    merge.buffer.extend(records);
                }
            }
            Ordering::Equal => {
                if let (Some((_, lefts)), Some((_, rights))) = (merge.left.next(), merge.right.next())
                {
                    for l in &lefts {
                        for r in &rights {
                            merge.buffer.push_back(merge_records(l, r, &self.keys)?);
                        }
                    }
                }
            }
        }
        Ok(true)
    }
}

impl Iterator for JoinStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match std::mem::replace(&mut self.state, State::Done) {
                State::Done => return None,
                State::Pending { left, right } => match self.start(left, right) {
                    Ok(merge) => self.state = State::Merging(merge),
                    Err(e) => return Some(Err(e)),
                },
                State::Merging(mut merge) => {
                    if let Some(record) = merge.buffer.pop_front() {
                        self.state = State::Merging(merge);
                        return Some(Ok(record));
                    }
                    match self.advance(&mut merge) {
                        Ok(true) => self.state = State::Merging(merge),
                        Ok(false) => return None,
                        Err(e) => return Some(Err(e)),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    fn stream(records: Vec<Record>) -> RecordStream {
        Box::new(records.into_iter().map(Ok))
    }

    fn join(left: Vec<Record>, right: Vec<Record>, keys: Keys, kind: JoinKind) -> Result<Vec<Record>> {
        JoinStream::new(stream(left), stream(right), keys, kind).collect()
    }

    #[test]
    fn merge_keeps_single_key_value() {
        let merged = merge_records(
            &record! { "id" => 1, "x" => "p" },
            &record! { "id" => 1, "y" => "q" },
            &Keys::from("id"),
        )
        .unwrap();
        assert_eq!(merged, record! { "id" => 1, "x" => "p", "y" => "q" });
    }

    #[test]
    fn merge_rejects_shared_non_key_field() {
        let err = merge_records(
            &record! { "id" => 1, "x" => "p" },
            &record! { "id" => 1, "x" => "q" },
            &Keys::from("id"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::AmbiguousField { field, .. } if field == "x"));
    }

    #[test]
    fn matched_groups_emit_left_major_product() {
        let out = join(
            vec![record! { "k" => 1, "l" => "a" }, record! { "k" => 1, "l" => "b" }],
            vec![record! { "k" => 1, "r" => "x" }, record! { "k" => 1, "r" => "y" }],
            Keys::from("k"),
            JoinKind::Inner,
        )
        .unwrap();
        assert_eq!(
            out,
            vec![
                record! { "k" => 1, "l" => "a", "r" => "x" },
                record! { "k" => 1, "l" => "a", "r" => "y" },
                record! { "k" => 1, "l" => "b", "r" => "x" },
                record! { "k" => 1, "l" => "b", "r" => "y" },
            ]
        );
    }

    #[test]
    fn unmatched_groups_follow_join_kind() {
        let left = || vec![record! { "k" => 1, "l" => "a" }, record! { "k" => 3, "l" => "c" }];
        let right = || vec![record! { "k" => 2, "r" => "b" }, record! { "k" => 3, "r" => "d" }];
        let matched = record! { "k" => 3, "l" => "c", "r" => "d" };

        let inner = join(left(), right(), Keys::from("k"), JoinKind::Inner).unwrap();
        assert_eq!(inner, vec![matched.clone()]);

        let left_join = join(left(), right(), Keys::from("k"), JoinKind::Left).unwrap();
        assert_eq!(left_join, vec![record! { "k" => 1, "l" => "a" }, matched.clone()]);

        let right_join = join(left(), right(), Keys::from("k"), JoinKind::Right).unwrap();
        assert_eq!(right_join, vec![record! { "k" => 2, "r" => "b" }, matched.clone()]);

        let outer = join(left(), right(), Keys::from("k"), JoinKind::Outer).unwrap();
        assert_eq!(
            outer,
            vec![
                record! { "k" => 1, "l" => "a" },
                record! { "k" => 2, "r" => "b" },
                matched,
            ]
        );
    }

    #[test]
    fn sides_are_sorted_before_merging() {
        let out = join(
            vec![record! { "k" => 2, "l" => "b" }, record! { "k" => 1, "l" => "a" }],
            vec![record! { "k" => 1, "r" => "x" }, record! { "k" => 2, "r" => "y" }],
            Keys::from("k"),
            JoinKind::Inner,
        )
        .unwrap();
        assert_eq!(
            out,
            vec![
                record! { "k" => 1, "l" => "a", "r" => "x" },
                record! { "k" => 2, "l" => "b", "r" => "y" },
            ]
        );
    }

    #[test]
    fn missing_key_on_right_is_malformed() {
        let err = join(
            vec![record! { "k" => 1 }],
            vec![record! { "other" => 1 }],
            Keys::from("k"),
            JoinKind::Inner,
        )
        .unwrap_err();
        assert!(matches!(err, Error::MalformedKeys { operator: OperatorKind::Join, .. }));
    }
}
