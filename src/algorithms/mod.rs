//! Ready-made graphs for common text and trip analyses.
//!
//! Each builder takes a pipeline plus its input(s) and returns the terminal
//! [`Graph`](crate::Graph); callers bind inputs and run it like any other graph.
//! The per-record callbacks they use are public so they can be reused in custom
//! graphs.
//!
//! | builder | inputs | output |
//! |---|---|---|
//! | [`word_count_graph`] | `{doc_id, text}` | `{text, count}` sorted by count |
//! | [`inverted_index_graph`] | `{doc_id, text}` | `{text, doc_id, tf_idf}`, top 3 documents per word |
//! | [`pmi_graph`] | `{doc_id, text}` | `{doc_id, text, pmi}`, top 10 words per document |
//! | [`average_speed_graph`] | `{edge_id, enter_time, leave_time}`, `{edge_id, start, end}` | `{weekday, hour, speed}` |

pub mod average_speed;
pub mod inverted_index;
pub mod pmi;
pub mod word_count;

pub use average_speed::{average_speed_graph, haversine_km};
pub use inverted_index::inverted_index_graph;
pub use pmi::pmi_graph;
pub use word_count::word_count_graph;

use crate::record;
use crate::record::Record;
use crate::value::Value;

/// Words of `text`: ASCII punctuation removed, lowercased, split on whitespace.
pub fn extract_words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace().filter_map(|raw| {
        let word: String = raw
            .chars()
            .filter(|c| !c.is_ascii_punctuation())
            .flat_map(char::to_lowercase)
            .collect();
        (!word.is_empty()).then_some(word)
    })
}

/// Map callback: one `{doc_id, word, count: 1}` per word of the `text` field.
///
/// Records without a string `text` emit nothing.
#[must_use]
pub fn emit_words(record: Record) -> Vec<Record> {
    let doc_id = record.get("doc_id").cloned().unwrap_or(Value::Null);
    let Some(text) = record.get_str("text") else {
        return Vec::new();
    };
    extract_words(text)
        .map(|word| record! { "doc_id" => doc_id.clone(), "word" => word, "count" => 1 })
        .collect()
}

/// Fold callback that counts records into `docs_count`.
#[must_use]
pub fn count_rows(acc: Record, _: &Record) -> Record {
    let n = acc.get_i64("docs_count").unwrap_or(0);
    acc.with("docs_count", n + 1)
}

/// The first `n` records by descending `field`; ties keep input order.
pub(crate) fn top_by(mut records: Vec<Record>, field: &str, n: usize) -> Vec<Record> {
    records.sort_by(|a, b| {
        let a = a.get_f64(field).unwrap_or(f64::NEG_INFINITY);
        let b = b.get_f64(field).unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    records.truncate(n);
    records
}
