//! Average road speed per weekday and hour.
//!
//! Reads travel times `{edge_id, enter_time, leave_time}` and edge geometry
//! `{edge_id, start, end}`, and writes `{weekday, hour, speed}` in km/h.
//! Compressed inputs (`.gz`, `.zst`) are detected automatically.
//!
//! Run with: cargo run --example average_speed -- times.jsonl.gz lengths.jsonl speed.jsonl

use anyhow::{Context, Result};
use compgraph::*;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: average_speed <times.jsonl> <lengths.jsonl> <out.jsonl>";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let times = args.next().context(USAGE)?;
    let lengths = args.next().context(USAGE)?;
    let output = args.next().context(USAGE)?;

    let pipeline = Pipeline::default();
    let speed = algorithms::average_speed_graph(&pipeline, "times", "lengths");

    let bindings = Bindings::new()
        .bind_jsonl("times", &times)?
        .bind_jsonl("lengths", &lengths)?;
    let records = speed.run(bindings)?;

    for r in &records {
        println!(
            "{:>3} {:02}:00  {:>8.2} km/h",
            r.get_str("weekday").unwrap_or("?"),
            r.get_i64("hour").unwrap_or_default(),
            r.get_f64("speed").unwrap_or_default()
        );
    }
    write_jsonl(&output, &records)?;
    Ok(())
}
