//! Top words per document by pointwise mutual information.
//!
//! Only words longer than four characters that occur at least twice in a
//! document are considered. For such a word `w` in document `d`:
//! `pmi(w, d) = ln(tf(w, d) * W / count(w))`, where `tf` is `w`'s share of the
//! considered words of `d`, `W` the number of considered words in the corpus and
//! `count(w)` the occurrences of `w` across the corpus.

use crate::algorithms::{emit_words, top_by};
use crate::graph::{Graph, Input};
use crate::keys::Keys;
use crate::operator::JoinKind;
use crate::pipeline::Pipeline;
use crate::record;
use crate::record::Record;
use std::collections::BTreeMap;

const MIN_WORD_CHARS: usize = 5;
const MIN_OCCURRENCES: usize = 2;
const TOP: usize = 10;

/// Reduce callback over one document's words: per qualifying word
/// `{doc_id, word, tf, count_in_doc, total_count_in_doc}`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sifted_term_frequency(group: Vec<Record>) -> Vec<Record> {
    let Some(doc_id) = group.first().and_then(|r| r.get("doc_id")).cloned() else {
        return Vec::new();
    };
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for word in group.iter().filter_map(|r| r.get_str("word")) {
        if word.chars().count() >= MIN_WORD_CHARS {
            *counts.entry(word).or_default() += 1;
        }
    }
    counts.retain(|_, n| *n >= MIN_OCCURRENCES);
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .map(|(word, n)| {
            record! {
                "doc_id" => doc_id.clone(),
                "word" => word,
                "tf" => n as f64 / total as f64,
                "count_in_doc" => n,
                "total_count_in_doc" => total,
            }
        })
        .collect()
}

/// Fold callback summing `count_in_doc` into `words_count`.
#[must_use]
pub fn sum_words(acc: Record, record: &Record) -> Record {
    let total = acc.get_i64("words_count").unwrap_or(0) + record.get_i64("count_in_doc").unwrap_or(0);
    acc.with("words_count", total)
}

/// Reduce callback: `{word, count}` summing `count_in_doc` over one word's group.
#[must_use]
pub fn corpus_count(group: Vec<Record>) -> Option<Record> {
    let word = group.first()?.get("word").cloned()?;
    let count: i64 = group.iter().filter_map(|r| r.get_i64("count_in_doc")).sum();
    Some(record! { "word" => word, "count" => count })
}

/// Reduce callback turning every joined `(word, doc_id)` record into `{doc_id, text, pmi}`.
#[must_use]
pub fn calc_pmi(group: Vec<Record>) -> Vec<Record> {
    group
        .iter()
        .map(|r| {
            let tf = r.get_f64("tf").unwrap_or(0.0);
            let words = r.get_f64("words_count").unwrap_or(0.0);
            let count = r.get_f64("count").unwrap_or(1.0);
            record! {
                "doc_id" => r.get("doc_id").cloned().unwrap_or_default(),
                "text" => r.get("word").cloned().unwrap_or_default(),
                "pmi" => (tf * words / count).ln(),
            }
        })
        .collect()
}

/// Build the PMI graph over `docs` (`{doc_id, text}` records).
pub fn pmi_graph(p: &Pipeline, docs: impl Into<Input>) -> Graph {
    let per_doc = Graph::new(p, docs)
        .map(emit_words)
        .sort("doc_id")
        .reduce(sifted_term_frequency, "doc_id");

    let total_words = Graph::new(p, &per_doc).fold(record! { "words_count" => 0 }, sum_words);
    let word_counts = Graph::new(p, &per_doc)
        .sort("word")
        .reduce(corpus_count, "word");

    Graph::new(p, &per_doc)
        .join(&total_words, Keys::none(), JoinKind::Inner)
        .join(&word_counts, "word", JoinKind::Left)
        .sort(["word", "doc_id"])
        .reduce(calc_pmi, ["word", "doc_id"])
        .sort("doc_id")
        .reduce(|group: Vec<Record>| top_by(group, "pmi", TOP), "doc_id")
}
