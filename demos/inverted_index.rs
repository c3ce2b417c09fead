//! TF-IDF inverted index over a JSONL corpus.
//!
//! Reads `{doc_id, text}` records and writes, for every word, the three
//! documents where it scores highest as `{text, doc_id, tf_idf}`.
//!
//! Run with: cargo run --example inverted_index -- docs.jsonl index.jsonl
//!
//! The plan is printed first: the corpus and the split words are both shared
//! by two consumers, so both are marked as cached.

use anyhow::{Context, Result};
use compgraph::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let input = args
        .next()
        .context("usage: inverted_index <docs.jsonl> <out.jsonl>")?;
    let output = args
        .next()
        .context("usage: inverted_index <docs.jsonl> <out.jsonl>")?;

    let pipeline = Pipeline::default();
    let index = algorithms::inverted_index_graph(&pipeline, "docs");
    println!("{}", index.explain()?);

    let records = index.run(Bindings::new().bind_jsonl("docs", &input)?)?;
    let written = write_jsonl(&output, &records)?;
    println!("📚 Wrote {written} index entries to {output}");
    Ok(())
}
