//! Testing utilities for compgraph graphs.
//!
//! This module provides helpers for writing idiomatic Rust tests against graphs:
//!
//! - **Assertions**: compare result tables with expected rows
//! - **Fixtures**: small tables for joins and text processing
//! - **Call counters**: observe how often a callback runs
//!
//! # Quick Start
//!
//! ```
//! use compgraph::*;
//! use compgraph::testing::*;
//!
//! # fn main() -> compgraph::Result<()> {
//! let p = Pipeline::default();
//! let calls = CallCounter::new();
//! let seen = calls.clone();
//! let g = Graph::new(&p, "employees")
//!     .map(move |r: Record| {
//!         seen.hit();
//!         Some(r)
//!     })
//!     .join("departments", "DepartmentID", JoinKind::Inner);
//!
//! let out = g.run(
//!     Bindings::new()
//!         .bind("employees", employee_table())
//!         .bind("departments", department_table()),
//! )?;
//! assert_eq!(out.len(), 5);
//! assert_eq!(calls.count(), 6);
//! assert_schema(&out, &["DepartmentID", "DepartmentName", "LastName"]);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Shared invocation counter for callbacks.
///
/// Clones share the count, so one clone can move into a callback while the
/// test keeps another.
#[derive(Clone, Debug, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }
}
