use crate::error::Result;
use crate::exec::RecordStream;
use crate::operator::{Mapper, RecordIter};
use crate::record::Record;

/// Flat-map adapter: drains each callback's output before pulling the next input.
pub struct MapStream {
    upstream: RecordStream,
    mapper: Mapper,
    current: Option<RecordIter>,
}

impl MapStream {
    pub fn new(upstream: RecordStream, mapper: Mapper) -> Self {
        Self {
            upstream,
            mapper,
            current: None,
        }
    }
}

impl Iterator for MapStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(record) = current.next() {
                    return Some(Ok(record));
                }
                self.current = None;
            }
            match self.upstream.next()? {
                Ok(record) => self.current = Some((self.mapper)(record)),
                Err(e) => return Some(Err(e)),
            }
        }
    }
}
