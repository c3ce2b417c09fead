use crate::error::Result;
use crate::exec::RecordStream;
use crate::keys::{KeyTuple, Keys};
use crate::operator::{OperatorKind, RecordIter, Reducer};
use crate::record::Record;

/// Groups consecutive records with equal key tuples and hands each group to the
/// reducer. Only one group is buffered at a time.
pub struct ReduceStream {
    upstream: RecordStream,
    reducer: Reducer,
    keys: Keys,
    /// First record of the next group, read while closing the previous one.
    pending: Option<(KeyTuple, Record)>,
    output: Option<RecordIter>,
    exhausted: bool,
}

impl ReduceStream {
    pub fn new(upstream: RecordStream, reducer: Reducer, keys: Keys) -> Self {
        Self {
            upstream,
            reducer,
            keys,
            pending: None,
            output: None,
            exhausted: false,
        }
    }

    fn pull(&mut self) -> Option<Result<(KeyTuple, Record)>> {
        let item = self.upstream.next()?;
        Some(item.and_then(|record| {
            let key = self.keys.extract(&record, OperatorKind::Reduce)?;
            Ok((key, record))
        }))
    }
}

impl Iterator for ReduceStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(output) = self.output.as_mut() {
                if let Some(record) = output.next() {
                    return Some(Ok(record));
                }
                self.output = None;
            }
            if self.exhausted {
                return None;
            }

            let (key, first) = match self.pending.take().map(Ok).or_else(|| self.pull()) {
                Some(Ok(head)) => head,
                Some(Err(e)) => {
                    self.exhausted = true;
                    return Some(Err(e));
                }
                None => {
                    self.exhausted = true;
                    return None;
                }
            };

            let mut group = vec![first];
            loop {
                match self.pull() {
                    Some(Ok((next_key, record))) if next_key == key => group.push(record),
                    Some(Ok(head)) => {
                        self.pending = Some(head);
                        break;
                    }
                    Some(Err(e)) => {
                        self.exhausted = true;
                        return Some(Err(e));
                    }
                    None => {
                        self.exhausted = true;
                        break;
                    }
                }
            }
            self.output = Some((self.reducer)(group));
        }
    }
}
