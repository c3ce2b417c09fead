// tests/joins.rs
use anyhow::Result;
use compgraph::testing::*;
use compgraph::*;

fn employees_join(kind: JoinKind) -> Result<Vec<Record>> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "employees").join("departments", "DepartmentID", kind);
    Ok(g.run(
        Bindings::new()
            .bind("employees", employee_table())
            .bind("departments", department_table()),
    )?)
}

fn matched() -> Vec<Record> {
    vec![
        record! { "LastName" => "Rafferty", "DepartmentID" => 31, "DepartmentName" => "Sales" },
        record! { "LastName" => "Jones", "DepartmentID" => 33, "DepartmentName" => "Engineering" },
        record! { "LastName" => "Heisenberg", "DepartmentID" => 33, "DepartmentName" => "Engineering" },
        record! { "LastName" => "Robinson", "DepartmentID" => 34, "DepartmentName" => "Clerical" },
        record! { "LastName" => "Smith", "DepartmentID" => 34, "DepartmentName" => "Clerical" },
    ]
}

#[test]
fn inner_join_keeps_matches_in_key_order() -> Result<()> {
    let out = employees_join(JoinKind::Inner)?;
    assert_records_equal(&out, &matched());
    Ok(())
}

#[test]
fn left_join_keeps_unmatched_employees() -> Result<()> {
    let out = employees_join(JoinKind::Left)?;
    let mut expected = vec![record! { "LastName" => "Williams", "DepartmentID" => 0 }];
    expected.extend(matched());
    assert_records_equal(&out, &expected);
    Ok(())
}

#[test]
fn right_join_keeps_unmatched_departments() -> Result<()> {
    let out = employees_join(JoinKind::Right)?;
    let mut expected = matched();
    expected.push(record! { "DepartmentID" => 35, "DepartmentName" => "Marketing" });
    assert_records_equal(&out, &expected);
    Ok(())
}

#[test]
fn outer_join_keeps_both_sides() -> Result<()> {
    let out = employees_join(JoinKind::Outer)?;
    let mut expected = vec![record! { "LastName" => "Williams", "DepartmentID" => 0 }];
    expected.extend(matched());
    expected.push(record! { "DepartmentID" => 35, "DepartmentName" => "Marketing" });
    assert_records_equal(&out, &expected);
    Ok(())
}

#[test]
fn left_and_outer_joins_on_small_tables() -> Result<()> {
    let p = Pipeline::default();
    let bindings = || {
        Bindings::new()
            .bind("left", vec![record! { "id" => 1, "x" => "p" }])
            .bind(
                "right",
                vec![record! { "id" => 1, "y" => "q" }, record! { "id" => 2, "y" => "r" }],
            )
    };

    let left = Graph::new(&p, "left").join("right", "id", JoinKind::Left);
    assert_records_equal(
        &left.run(bindings())?,
        &[record! { "id" => 1, "x" => "p", "y" => "q" }],
    );

    let outer = Graph::new(&p, "left").join("right", "id", JoinKind::Outer);
    assert_records_equal(
        &outer.run(bindings())?,
        &[
            record! { "id" => 1, "x" => "p", "y" => "q" },
            record! { "id" => 2, "y" => "r" },
        ],
    );
    Ok(())
}

#[test]
fn equal_keys_emit_every_pair() -> Result<()> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "l").join("r", "k", JoinKind::Inner);
    let out = g.run(
        Bindings::new()
            .bind("l", vec![record! { "k" => 1, "a" => 1 }, record! { "k" => 1, "a" => 2 }])
            .bind("r", vec![record! { "k" => 1, "b" => 1 }, record! { "k" => 1, "b" => 2 }]),
    )?;
    assert_records_equal(
        &out,
        &[
            record! { "k" => 1, "a" => 1, "b" => 1 },
            record! { "k" => 1, "a" => 1, "b" => 2 },
            record! { "k" => 1, "a" => 2, "b" => 1 },
            record! { "k" => 1, "a" => 2, "b" => 2 },
        ],
    );
    Ok(())
}

#[test]
fn join_without_keys_is_a_cross_product() -> Result<()> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "colors").join("sizes", Keys::none(), JoinKind::Inner);
    let out = g.run(
        Bindings::new()
            .bind("colors", ["red", "blue"].map(|c| record! { "color" => c }))
            .bind("sizes", ["S", "M", "L"].map(|s| record! { "size" => s })),
    )?;
    assert_eq!(out.len(), 6);
    assert_schema(&out, &["color", "size"]);
    Ok(())
}

#[test]
fn shared_non_key_field_is_ambiguous() -> Result<()> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "employees").join("departments", Keys::none(), JoinKind::Inner);
    let err = g
        .run(
            Bindings::new()
                .bind("employees", employee_table())
                .bind("departments", department_table()),
        )
        .unwrap_err();
    assert!(
        matches!(&err, Error::AmbiguousField { field, .. } if field == "DepartmentID"),
        "unexpected error: {err}"
    );
    Ok(())
}

#[test]
fn missing_join_key_is_malformed() -> Result<()> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "l").join("r", "id", JoinKind::Inner);
    let err = g
        .run(
            Bindings::new()
                .bind("l", vec![record! { "id" => 1 }])
                .bind("r", vec![record! { "other" => 1 }]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        Error::MalformedKeys {
            operator: OperatorKind::Join,
            ..
        }
    ));
    Ok(())
}

#[test]
fn join_with_an_upstream_graph() -> Result<()> {
    let p = Pipeline::default();
    let named = Graph::new(&p, "departments").map(|r: Record| {
        let name = r.get_str("DepartmentName").map(str::to_uppercase);
        Some(r.with("DepartmentName", name))
    });
    let g = Graph::new(&p, "employees")
        .sort("LastName")
        .join(&named, "DepartmentID", JoinKind::Inner)
        .sort("LastName");
    let out = g.run(
        Bindings::new()
            .bind("employees", employee_table())
            .bind("departments", department_table()),
    )?;

    let names: Vec<(&str, &str)> = out
        .iter()
        .filter_map(|r| Some((r.get_str("LastName")?, r.get_str("DepartmentName")?)))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Heisenberg", "ENGINEERING"),
            ("Jones", "ENGINEERING"),
            ("Rafferty", "SALES"),
            ("Robinson", "CLERICAL"),
            ("Smith", "CLERICAL"),
        ]
    );
    Ok(())
}

#[test]
fn outer_join_row_count_law() -> Result<()> {
    // |outer| = |inner| + unmatched left + unmatched right
    let inner = employees_join(JoinKind::Inner)?.len();
    let left = employees_join(JoinKind::Left)?.len();
    let right = employees_join(JoinKind::Right)?.len();
    let outer = employees_join(JoinKind::Outer)?.len();
    assert_eq!(outer, left + right - inner);
    Ok(())
}

#[test]
fn int_and_float_keys_match() -> Result<()> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "l").join("r", "k", JoinKind::Inner);
    let out = g.run(
        Bindings::new()
            .bind("l", vec![record! { "k" => 2, "a" => "int" }])
            .bind("r", vec![record! { "k" => 2.0, "b" => "float" }]),
    )?;
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].get_str("b"), Some("float"));
    Ok(())
}

fn run_join(left: &str, right: &str, kind: JoinKind) -> Result<Vec<Record>> {
    let p = Pipeline::default();
    let g = Graph::new(&p, left).join(right, "DepartmentID", kind);
    Ok(g.run(
        Bindings::new()
            .bind("employees", employee_table())
            .bind("departments", department_table()),
    )?)
}

#[test]
fn inner_join_is_symmetric() -> Result<()> {
    let ab = run_join("employees", "departments", JoinKind::Inner)?;
    let ba = run_join("departments", "employees", JoinKind::Inner)?;
    assert_records_unordered_equal(&ab, &ba);
    Ok(())
}

#[test]
fn matched_part_of_left_join_is_the_inner_join() -> Result<()> {
    let left = run_join("employees", "departments", JoinKind::Left)?;
    let matched: Vec<Record> = left
        .into_iter()
        .filter(|r| r.contains("DepartmentName"))
        .collect();
    assert_records_equal(&matched, &run_join("employees", "departments", JoinKind::Inner)?);
    Ok(())
}

#[test]
fn outer_join_is_left_plus_unmatched_right() -> Result<()> {
    let inner = run_join("employees", "departments", JoinKind::Inner)?;
    let mut expected = run_join("employees", "departments", JoinKind::Left)?;
    expected.extend(
        run_join("employees", "departments", JoinKind::Right)?
            .into_iter()
            .filter(|r| !inner.contains(r)),
    );
    assert_records_unordered_equal(
        &run_join("employees", "departments", JoinKind::Outer)?,
        &expected,
    );
    Ok(())
}

#[test]
fn large_integer_keys_do_not_match_nearby_floats() -> Result<()> {
    let p = Pipeline::default();
    let g = Graph::new(&p, "l").join("r", "k", JoinKind::Inner);
    let out = g.run(
        Bindings::new()
            .bind("l", vec![record! { "k" => 9_007_199_254_740_993_i64, "a" => 1 }])
            .bind("r", vec![record! { "k" => 9_007_199_254_740_992.0, "b" => 2 }]),
    )?;
    assert!(out.is_empty(), "unexpected match: {out:?}");
    Ok(())
}
