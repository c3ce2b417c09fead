use crate::error::Result;
use crate::exec::{RecordStream, keyed};
use crate::keys::{KeyTuple, Keys};
use crate::operator::OperatorKind;
use crate::record::Record;

enum State {
    Pending,
    Sorted(std::vec::IntoIter<Record>),
    Done,
}

/// Materializes the upstream on first pull and yields it stably sorted.
pub struct SortStream {
    upstream: RecordStream,
    keys: Keys,
    descending: bool,
    state: State,
}

impl SortStream {
    pub fn new(upstream: RecordStream, keys: Keys, descending: bool) -> Self {
        Self {
            upstream,
            keys,
            descending,
            state: State::Pending,
        }
    }
}

/// Stable sort of keyed rows. Descending order reverses the comparator, not the
/// output, so equal keys keep their input order either way.
pub(crate) fn sort_keyed(rows: &mut [(KeyTuple, Record)], descending: bool) {
    if descending {
        rows.sort_by(|a, b| b.0.cmp(&a.0));
    } else {
        rows.sort_by(|a, b| a.0.cmp(&b.0));
    }
}

impl Iterator for SortStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.state {
                State::Sorted(rows) => return rows.next().map(Ok),
                State::Done => return None,
                State::Pending => {
                    match keyed(&mut self.upstream, &self.keys, OperatorKind::Sort) {
                        Ok(mut rows) => {
                            sort_keyed(&mut rows, self.descending);
                            let records: Vec<Record> = rows.into_iter().map(|(_, r)| r).collect();
                            self.state = State::Sorted(records.into_iter());
                        }
                        Err(e) => {
                            self.state = State::Done;
                            return Some(Err(e));
                        }
                    }
                }
            }
        }
    }
}
