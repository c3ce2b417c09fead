//! Pre-built tables for common testing scenarios.

use crate::record;
use crate::record::Record;

/// Employees with a `DepartmentID`; Williams belongs to no listed department.
///
/// # Example
///
/// ```
/// use compgraph::testing::employee_table;
///
/// assert_eq!(employee_table().len(), 6);
/// ```
#[must_use]
pub fn employee_table() -> Vec<Record> {
    [
        ("Rafferty", 31),
        ("Jones", 33),
        ("Heisenberg", 33),
        ("Robinson", 34),
        ("Smith", 34),
        ("Williams", 0),
    ]
    .into_iter()
    .map(|(name, dept)| record! { "LastName" => name, "DepartmentID" => dept })
    .collect()
}

/// Departments keyed by `DepartmentID`; Marketing has no employees.
#[must_use]
pub fn department_table() -> Vec<Record> {
    [
        (31, "Sales"),
        (33, "Engineering"),
        (34, "Clerical"),
        (35, "Marketing"),
    ]
    .into_iter()
    .map(|(dept, name)| record! { "DepartmentID" => dept, "DepartmentName" => name })
    .collect()
}

/// Small `{doc_id, text}` corpus with punctuation and mixed case.
#[must_use]
pub fn sample_documents() -> Vec<Record> {
    [
        (1, "hello, my little WORLD"),
        (2, "Hello, my little little hell"),
        (3, "Little world, little hello. Hello again!"),
    ]
    .into_iter()
    .map(|(doc_id, text)| record! { "doc_id" => doc_id, "text" => text })
    .collect()
}
