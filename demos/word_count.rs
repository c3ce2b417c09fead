//! Word count over a JSONL corpus.
//!
//! Reads `{doc_id, text}` records and writes `{text, count}` records, ascending
//! by count.
//!
//! Run with: cargo run --example word_count -- docs.jsonl counts.jsonl
//!
//! Set `RUST_LOG=compgraph=debug` to see planning and caching decisions.

use anyhow::{Context, Result};
use compgraph::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let input = args.next().context("usage: word_count <docs.jsonl> <out.jsonl>")?;
    let output = args.next().context("usage: word_count <docs.jsonl> <out.jsonl>")?;

    let pipeline = Pipeline::default();
    let counts = algorithms::word_count_graph(&pipeline, "docs");

    let (records, metrics) = Runner::default()
        .run_with_metrics(&counts, Bindings::new().bind_jsonl("docs", &input)?)?;
    let written = write_jsonl(&output, &records)?;

    println!("📝 Wrote {written} word counts to {output}");
    metrics.print();
    Ok(())
}
