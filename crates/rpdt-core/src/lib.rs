#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod attributes;
pub mod comparison;
pub mod document;
pub mod findings;
pub mod query;
pub mod reconcile;
pub mod report;
pub mod runner;
pub mod spec;

#[cfg(test)]
mod test_helpers;

pub use attributes::{Tolerance, ZonePair, compare_attribute, compare_scalar, values_equal};
pub use comparison::{Alignment, alignment, compare, compare_entry};
pub use document::{Category, SurfaceKind, entities, entity_id};
pub use findings::{Finding, Findings, Severity};
pub use query::{Filter, PathQuery, Segment, find_all, find_all_with_filters, find_one};
pub use reconcile::{IdentityMap, Reconciliation, reconcile};
pub use report::{
    EvaluationCriteria, RunMetadata, RunReport, SpecificationTest, Tally, TestCaseReport,
    TestOutcome, TestResult,
};
pub use runner::{TestCase, TestCaseOutcome, run_test_case};
pub use spec::{ComparisonSpec, LimitKind, PumpRatios, SpecError, SpecialCase, TestSpecEntry};

/// Returns the current version of the rpdt-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
