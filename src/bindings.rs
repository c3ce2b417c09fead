//! Run-time bindings of named inputs to record sources.
//!
//! A graph only names its inputs; the concrete sources are supplied per run.
//! Each bound source is consumed at most once per run, however many graphs read
//! the name: shared inputs are cached like any other shared vertex.

use crate::error::Error;
use crate::exec::RecordStream;
use crate::record::Record;
use std::collections::HashMap;

/// Mapping from input name to a lazy, possibly fallible record source.
#[derive(Default)]
pub struct Bindings {
    pub(crate) sources: HashMap<String, RecordStream>,
}

impl Bindings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to an infallible source. Rebinding a name replaces the source.
    #[must_use]
    pub fn bind<I>(mut self, name: impl Into<String>, source: I) -> Self
    where
        I: IntoIterator<Item = Record>,
        I::IntoIter: 'static,
    {
        self.sources
            .insert(name.into(), Box::new(source.into_iter().map(Ok)));
        self
    }

    /// Bind `name` to a source whose items may fail, e.g. a file reader.
    ///
    /// A failed item aborts the run with [`Error::Input`] naming the input.
    #[must_use]
    pub fn bind_fallible<I, E>(mut self, name: impl Into<String>, source: I) -> Self
    where
        I: IntoIterator<Item = std::result::Result<Record, E>>,
        I::IntoIter: 'static,
        E: Into<anyhow::Error>,
    {
        let name = name.into();
        let label = name.clone();
        let stream = source.into_iter().map(move |item| {
            item.map_err(|e| Error::Input {
                name: label.clone(),
                source: e.into(),
            })
        });
        self.sources.insert(name, Box::new(stream));
        self
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    /// Bound names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<RecordStream> {
        self.sources.remove(name)
    }
}
