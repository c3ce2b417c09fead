// tests/algorithms.rs
use anyhow::Result;
use compgraph::testing::*;
use compgraph::*;

fn docs() -> Bindings {
    Bindings::new().bind("docs", sample_documents())
}

fn approx(a: Option<f64>, b: f64) -> bool {
    a.is_some_and(|a| (a - b).abs() < 1e-9)
}

#[test]
fn word_count_over_sample_documents() -> Result<()> {
    let p = Pipeline::default();
    let out = algorithms::word_count_graph(&p, "docs").run(docs())?;
    assert_records_equal(
        &out,
        &[
            record! { "text" => "again", "count" => 1 },
            record! { "text" => "hell", "count" => 1 },
            record! { "text" => "my", "count" => 2 },
            record! { "text" => "world", "count" => 2 },
            record! { "text" => "hello", "count" => 4 },
            record! { "text" => "little", "count" => 5 },
        ],
    );
    Ok(())
}

#[test]
fn inverted_index_scores_rare_words_higher() -> Result<()> {
    let p = Pipeline::default();
    let out = algorithms::inverted_index_graph(&p, "docs").run(docs())?;
    assert_schema(&out, &["doc_id", "text", "tf_idf"]);

    let score = |word: &str, doc: i64| {
        out.iter()
            .find(|r| r.get_str("text") == Some(word) && r.get_i64("doc_id") == Some(doc))
            .and_then(|r| r.get_f64("tf_idf"))
    };
    assert!(approx(score("again", 3), 3f64.ln() / 6.0));
    assert!(approx(score("world", 1), 1.5f64.ln() / 4.0));
    assert!(approx(score("hello", 1), 0.0));

    for word in ["hello", "little"] {
        let docs = out.iter().filter(|r| r.get_str("text") == Some(word)).count();
        assert_eq!(docs, 3, "{word} is in every document");
    }
    Ok(())
}

#[test]
fn inverted_index_keeps_top_three_documents() -> Result<()> {
    let p = Pipeline::default();
    let many: Vec<Record> = (1..=5usize)
        .map(|id| record! { "doc_id" => id, "text" => format!("common {}", "x ".repeat(id)) })
        .collect();
    let out = algorithms::inverted_index_graph(&p, "docs").run(Bindings::new().bind("docs", many))?;
    let common = out
        .iter()
        .filter(|r| r.get_str("text") == Some("common"))
        .count();
    assert_eq!(common, 3);
    Ok(())
}

#[test]
fn pmi_over_sample_documents() -> Result<()> {
    let p = Pipeline::default();
    let out = algorithms::pmi_graph(&p, "docs").run(docs())?;

    let rows: Vec<(i64, &str)> = out
        .iter()
        .filter_map(|r| Some((r.get_i64("doc_id")?, r.get_str("text")?)))
        .collect();
    assert_eq!(rows, vec![(2, "little"), (3, "hello"), (3, "little")]);
    assert!(approx(out[0].get_f64("pmi"), 1.5f64.ln()));
    assert!(approx(out[1].get_f64("pmi"), 1.5f64.ln()));
    assert!(approx(out[2].get_f64("pmi"), 0.75f64.ln()));
    Ok(())
}

#[test]
fn average_speed_splits_traversals_across_hours() -> Result<()> {
    let p = Pipeline::default();
    let g = algorithms::average_speed_graph(&p, "times", "lengths");
    let out = g.run(
        Bindings::new()
            .bind(
                "times",
                vec![
                    record! {
                        "edge_id" => 1,
                        "enter_time" => "20171020T103000",
                        "leave_time" => "20171020T113000",
                    },
                    record! {
                        "edge_id" => 2,
                        "enter_time" => "20171022T090000.500000",
                        "leave_time" => "20171022T093000.500000",
                    },
                ],
            )
            .bind(
                "lengths",
                vec![
                    record! {
                        "edge_id" => 1,
                        "start" => Value::from(vec![37.0, 55.0]),
                        "end" => Value::from(vec![37.1, 55.0]),
                    },
                    record! {
                        "edge_id" => 2,
                        "start" => Value::from(vec![37.0, 55.0]),
                        "end" => Value::from(vec![37.0, 55.1]),
                    },
                ],
            ),
    )?;

    let buckets: Vec<(&str, i64)> = out
        .iter()
        .filter_map(|r| Some((r.get_str("weekday")?, r.get_i64("hour")?)))
        .collect();
    assert_eq!(buckets, vec![("Fri", 10), ("Fri", 11), ("Sun", 9)]);

    let d1 = algorithms::haversine_km((37.0, 55.0), (37.1, 55.0));
    let d2 = algorithms::haversine_km((37.0, 55.0), (37.0, 55.1));
    // Half of edge 1 is travelled in each half hour.
    assert!(approx(out[0].get_f64("speed"), d1));
    assert!(approx(out[1].get_f64("speed"), d1));
    assert!(approx(out[2].get_f64("speed"), d2 * 2.0));
    Ok(())
}

#[test]
fn average_speed_ignores_unknown_edges() -> Result<()> {
    let p = Pipeline::default();
    let g = algorithms::average_speed_graph(&p, "times", "lengths");
    let out = g.run(
        Bindings::new()
            .bind(
                "times",
                vec![record! {
                    "edge_id" => 9,
                    "enter_time" => "20171020T103000",
                    "leave_time" => "20171020T110000",
                }],
            )
            .bind("lengths", Vec::new()),
    )?;
    assert!(out.is_empty());
    Ok(())
}
