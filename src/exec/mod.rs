//! Execution nodes: lazy adapters that apply a graph's operators.
//!
//! Every operator becomes one iterator adapter over the previous step's stream.
//! Map and Reduce are streaming; Fold, Sort and Join are barriers and drain their
//! input on first pull. Errors travel in-band as `Err` items so that a failure
//! surfaces exactly when the offending record is reached.

pub mod fold;
pub mod join;
pub mod map;
pub mod reduce;
pub mod sort;

use crate::error::{Error, Result};
use crate::keys::{KeyTuple, Keys};
use crate::operator::{Operator, OperatorKind};
use crate::record::Record;

pub use fold::FoldStream;
pub use join::{JoinStream, merge_records};
pub use map::MapStream;
pub use reduce::ReduceStream;
pub use sort::SortStream;

/// Lazy, fallible sequence of records flowing between operators.
pub type RecordStream = Box<dyn Iterator<Item = Result<Record>>>;

/// Compose `ops` over `upstreams` into a single lazy stream.
///
/// `upstreams[0]` feeds the first operator; each `Join` pulls the upstream at its
/// own index. Nothing is read until the returned stream is pulled.
pub fn compose(ops: &[Operator], upstreams: Vec<RecordStream>) -> RecordStream {
    let mut upstreams: Vec<Option<RecordStream>> = upstreams.into_iter().map(Some).collect();
    let Some(mut stream) = upstreams.first_mut().and_then(Option::take) else {
        return failed(Error::Invariant("graph node has no upstream".to_string()));
    };

    for op in ops {
        stream = match op {
            Operator::Map { mapper } => Box::new(MapStream::new(stream, mapper.clone())),
            Operator::Reduce { reducer, keys } => {
                Box::new(ReduceStream::new(stream, reducer.clone(), keys.clone()))
            }
            Operator::Fold { folder, initial } => {
                Box::new(FoldStream::new(stream, folder.clone(), initial.clone()))
            }
            Operator::Sort { keys, descending } => {
                Box::new(SortStream::new(stream, keys.clone(), *descending))
            }
            Operator::Join {
                upstream,
                keys,
                kind,
            } => match upstreams.get_mut(*upstream).and_then(Option::take) {
                Some(right) => Box::new(JoinStream::new(stream, right, keys.clone(), *kind)),
                None => {
                    return failed(Error::Invariant(format!(
                        "join refers to missing upstream {upstream}"
                    )));
                }
            },
        };
    }
    stream
}

fn failed(err: Error) -> RecordStream {
    Box::new(std::iter::once(Err(err)))
}

/// Drain `stream`, pairing every record with its key tuple.
pub(crate) fn keyed(
    stream: &mut RecordStream,
    keys: &Keys,
    operator: OperatorKind,
) -> Result<Vec<(KeyTuple, Record)>> {
    stream
        .by_ref()
        .map(|item| {
            let record = item?;
            Ok((keys.extract(&record, operator)?, record))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keys;
    use crate::operator::{JoinKind, RecordIter};
    use crate::record;
    use std::sync::Arc;

    fn source(records: Vec<Record>) -> RecordStream {
        Box::new(records.into_iter().map(Ok))
    }

    #[test]
    fn composes_in_declared_order() {
        let ops = vec![
            Operator::Map {
                mapper: Arc::new(|r: Record| {
                    let v = r.get_i64("v").unwrap_or(0);
                    Box::new(vec![r.with("v", v * 10)].into_iter()) as RecordIter
                }),
            },
            Operator::Sort {
                keys: Keys::from("v"),
                descending: true,
            },
        ];
        assert_eq!(ops[1].kind(), OperatorKind::Sort);
        let out: Vec<Record> = compose(
            &ops,
            vec![source(vec![record! { "v" => 1 }, record! { "v" => 2 }])],
        )
        .collect::<Result<_>>()
        .unwrap();
        assert_eq!(out, vec![record! { "v" => 20 }, record! { "v" => 10 }]);
    }

    #[test]
    fn missing_join_upstream_is_an_invariant_error() {
        let ops = vec![Operator::Join {
            upstream: 3,
            keys: Keys::none(),
            kind: JoinKind::Inner,
        }];
        let mut s = compose(&ops, vec![source(vec![])]);
        assert!(matches!(s.next(), Some(Err(Error::Invariant(_)))));
    }
}
