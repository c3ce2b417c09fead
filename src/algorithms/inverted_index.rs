//! TF-IDF inverted index.
//!
//! For a word `w` and document `d`:
//! `tf_idf(w, d) = tf(w, d) * ln(N / df(w))`, where `tf` is the share of `d`'s
//! words that are `w`, `N` the number of documents and `df(w)` the number of
//! documents containing `w`. The index keeps the three best documents per word.

use crate::algorithms::{count_rows, emit_words, top_by};
use crate::graph::{Graph, Input};
use crate::keys::Keys;
use crate::operator::JoinKind;
use crate::pipeline::Pipeline;
use crate::record;
use crate::record::Record;
use std::collections::BTreeMap;

/// Reduce callback keeping one `{doc_id, word}` per group.
#[must_use]
pub fn unique(group: Vec<Record>) -> Option<Record> {
    group
        .into_iter()
        .next()
        .map(|r| r.project(&["doc_id", "word"]))
}

/// Reduce callback over one word's `{doc_id, word, docs_count}` group:
/// `{doc_id, word, idf}` per document, with `idf = docs_count / documents`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn calc_idf(group: Vec<Record>) -> Vec<Record> {
    let docs_with_word = group.len() as f64;
    let Some(first) = group.first() else {
        return Vec::new();
    };
    let word = first.get("word").cloned().unwrap_or_default();
    let docs_count = first.get_f64("docs_count").unwrap_or(0.0);
    group
        .iter()
        .map(|r| {
            record! {
                "doc_id" => r.get("doc_id").cloned().unwrap_or_default(),
                "word" => word.clone(),
                "idf" => docs_count / docs_with_word,
            }
        })
        .collect()
}

/// Reduce callback over one document's words: `{doc_id, word, tf}` per word.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn term_frequency(group: Vec<Record>) -> Vec<Record> {
    let total = group.len() as f64;
    let Some(doc_id) = group.first().and_then(|r| r.get("doc_id")).cloned() else {
        return Vec::new();
    };
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for word in group.iter().filter_map(|r| r.get_str("word")) {
        *counts.entry(word).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(word, n)| {
            record! { "doc_id" => doc_id.clone(), "word" => word, "tf" => n as f64 / total }
        })
        .collect()
}

/// Reduce callback over one word's `{doc_id, word, tf, idf}` group: the three
/// documents with the highest `tf * ln(idf)`.
#[must_use]
pub fn top_documents(group: Vec<Record>) -> Vec<Record> {
    let scored = group
        .iter()
        .map(|r| {
            let tf = r.get_f64("tf").unwrap_or(0.0);
            let idf = r.get_f64("idf").unwrap_or(1.0);
            record! {
                "text" => r.get("word").cloned().unwrap_or_default(),
                "doc_id" => r.get("doc_id").cloned().unwrap_or_default(),
                "tf_idf" => tf * idf.ln(),
            }
        })
        .collect();
    top_by(scored, "tf_idf", 3)
}

/// Build the inverted index over `docs` (`{doc_id, text}` records).
///
/// `docs` is read by two consumers (the word splitter and the document
/// counter) and the split words by two more, so both are computed once and
/// replayed.
pub fn inverted_index_graph(p: &Pipeline, docs: impl Into<Input>) -> Graph {
    let docs = docs.into();
    let split_words = Graph::new(p, docs.clone()).map(emit_words);
    let count_docs = Graph::new(p, docs).fold(record! { "docs_count" => 0 }, count_rows);

    let idf = Graph::new(p, &split_words)
        .sort(["doc_id", "word"])
        .reduce(unique, ["doc_id", "word"])
        .join(&count_docs, Keys::none(), JoinKind::Inner)
        .sort("word")
        .reduce(calc_idf, "word");

    Graph::new(p, &split_words)
        .sort("doc_id")
        .reduce(term_frequency, "doc_id")
        .join(&idf, ["word", "doc_id"], JoinKind::Left)
        .sort("word")
        .reduce(top_documents, "word")
}
