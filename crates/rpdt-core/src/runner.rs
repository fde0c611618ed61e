//! One test case end to end: reconcile, then compare every spec entry.
use serde_json::Value;
use tracing::{info, warn};

use crate::comparison::compare;
use crate::findings::Findings;
use crate::reconcile::{Reconciliation, reconcile};
use crate::report::TestCaseReport;
use crate::spec::ComparisonSpec;

/// Inputs of one test case, already loaded and validated.
#[derive(Debug, Clone, Copy)]
pub struct TestCase<'a> {
    pub test_id: &'a str,
    pub generated_file_name: &'a str,
    pub files_utilized: &'a [String],
    pub spec: &'a ComparisonSpec,
    pub generated: &'a Value,
    pub reference: &'a Value,
}

/// What running a test case produced.
#[derive(Debug, Clone)]
pub struct TestCaseOutcome {
    pub report: TestCaseReport,
    /// Reconciliation findings followed by comparison findings.
    pub findings: Findings,
    pub reconciliation: Reconciliation,
}

impl TestCaseOutcome {
    pub fn has_errors(&self) -> bool {
        self.findings.has_errors()
    }
}

/// Runs one test case.
///
/// When zones cannot be reconciled the report carries no specification tests
/// and the findings explain why.
pub fn run_test_case(case: TestCase<'_>) -> TestCaseOutcome {
    let mut report = TestCaseReport::new(
        case.test_id,
        case.generated_file_name,
        case.files_utilized.to_vec(),
    );
    let reconciliation = reconcile(case.generated, case.reference);
    let mut findings = reconciliation.findings.clone();

    if reconciliation.complete {
        let (tests, comparison_findings) =
            compare(case.spec, case.generated, case.reference, &reconciliation.map);
        report.specification_tests = tests;
        findings.extend(comparison_findings);
    } else {
        warn!(test_id = case.test_id, "zones not reconciled; comparisons skipped");
    }

    info!(
        test_id = case.test_id,
        specification_tests = report.specification_tests.len(),
        warnings = findings.warning_count(),
        errors = findings.error_count(),
        "test case finished"
    );
    TestCaseOutcome {
        report,
        findings,
        reconciliation,
    }
}
