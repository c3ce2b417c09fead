use crate::error::Result;
use crate::exec::RecordStream;
use crate::operator::Folder;
use crate::record::Record;

/// Folds the whole upstream into exactly one record.
pub struct FoldStream {
    upstream: RecordStream,
    folder: Folder,
    initial: Option<Record>,
}

impl FoldStream {
    pub fn new(upstream: RecordStream, folder: Folder, initial: Record) -> Self {
        Self {
            upstream,
            folder,
            initial: Some(initial),
        }
    }
}

impl Iterator for FoldStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut acc = self.initial.take()?;
        for item in self.upstream.by_ref() {
            match item {
                Ok(record) => acc = (self.folder)(acc, &record),
                Err(e) => return Some(Err(e)),
            }
        }
        Some(Ok(acc))
    }
}
