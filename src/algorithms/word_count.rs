use crate::algorithms::emit_words;
use crate::graph::{Graph, Input};
use crate::pipeline::Pipeline;
use crate::record;
use crate::record::Record;

/// Reduce callback: `{text, count}` summing `count` over one word's group.
#[must_use]
pub fn collect_counts(group: Vec<Record>) -> Option<Record> {
    let word = group.first()?.get("word").cloned()?;
    let count: i64 = group.iter().filter_map(|r| r.get_i64("count")).sum();
    Some(record! { "text" => word, "count" => count })
}

/// Occurrences of every word across all documents, ascending by count and then
/// by word.
pub fn word_count_graph(p: &Pipeline, docs: impl Into<Input>) -> Graph {
    Graph::new(p, docs)
        .map(emit_words)
        .sort("word")
        .reduce(collect_counts, "word")
        .sort("count")
}
