//! Assertion functions for comparing result tables.

use crate::record::Record;

/// Assert that two tables are equal in order and content.
///
/// # Panics
///
/// Panics if the tables differ in length or in any row.
///
/// # Example
///
/// ```
/// use compgraph::record;
/// use compgraph::testing::assert_records_equal;
///
/// let actual = vec![record! { "id" => 1 }];
/// assert_records_equal(&actual, &[record! { "id" => 1 }]);
/// ```
pub fn assert_records_equal(actual: &[Record], expected: &[Record]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Table length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Row mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that two tables hold the same rows as multisets, ignoring order.
///
/// # Panics
///
/// Panics if any row occurs a different number of times in the two tables.
///
/// # Example
///
/// ```
/// use compgraph::record;
/// use compgraph::testing::assert_records_unordered_equal;
///
/// let actual = vec![record! { "id" => 2 }, record! { "id" => 1 }];
/// assert_records_unordered_equal(&actual, &[record! { "id" => 1 }, record! { "id" => 2 }]);
/// ```
pub fn assert_records_unordered_equal(actual: &[Record], expected: &[Record]) {
    let mut a = actual.to_vec();
    let mut e = expected.to_vec();
    a.sort();
    e.sort();
    assert_eq!(
        a, e,
        "Tables differ (ignoring order):\n  Expected: {expected:?}\n  Actual: {actual:?}"
    );
}

/// Assert that every row satisfies `predicate`.
///
/// # Panics
///
/// Panics on the first row that fails, naming its index.
pub fn assert_all_records(table: &[Record], predicate: impl Fn(&Record) -> bool) {
    for (i, row) in table.iter().enumerate() {
        assert!(predicate(row), "Row {i} failed predicate: {row:?}");
    }
}

/// Assert that every row has exactly `fields`, in any order.
///
/// # Panics
///
/// Panics on the first row with a different field set.
pub fn assert_schema(table: &[Record], fields: &[&str]) {
    let mut want: Vec<&str> = fields.to_vec();
    want.sort_unstable();
    for (i, row) in table.iter().enumerate() {
        let have: Vec<&str> = row.fields().collect();
        assert_eq!(have, want, "Row {i} has unexpected fields: {row:?}");
    }
}
