//! The run report: one entry per test case, one specification test per spec
//! entry, one test result per aligned value.
//!
//! The report is an owned builder. The caller creates it at the start of a
//! run, appends a [`TestCaseReport`] per test case and serializes it once at
//! the end.
use serde::{Deserialize, Serialize};

/// Outcome of a single test result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestOutcome {
    Match,
    Differ,
    NotImplemented,
}

/// What a specification test checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationCriteria {
    /// Values compared, with tolerance for numbers.
    Value,
    /// Only presence of the generated value was checked.
    Present,
    /// Only list lengths were compared.
    Quantity,
}

/// Identity of the software and ruleset under test. Supplied by the caller;
/// every field defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetadata {
    pub generation_software_name: String,
    pub generation_software_version: String,
    pub modeling_software_name: String,
    pub modeling_software_version: String,
    pub schema_version: String,
    pub ruleset_name: String,
    pub ruleset_checking_specification_name: String,
}

/// One graded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub generated_instance_id: Option<String>,
    pub reference_instance_id: Option<String>,
    /// Last key of the specification test's data path.
    pub data_element: String,
    pub test_outcome: TestOutcome,
    pub notes: String,
}

/// Results for one spec entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecificationTest {
    pub data_path: String,
    pub evaluation_criteria: EvaluationCriteria,
    pub test_results: Vec<TestResult>,
    #[serde(skip)]
    data_element: String,
}

impl SpecificationTest {
    pub fn new(
        data_path: impl Into<String>,
        data_element: impl Into<String>,
        evaluation_criteria: EvaluationCriteria,
    ) -> Self {
        Self {
            data_path: data_path.into(),
            evaluation_criteria,
            test_results: Vec::new(),
            data_element: data_element.into(),
        }
    }

    pub fn data_element(&self) -> &str {
        &self.data_element
    }

    /// Appends a result for this test's data element.
    pub fn record(
        &mut self,
        generated_id: Option<&str>,
        reference_id: Option<&str>,
        outcome: TestOutcome,
        notes: impl Into<String>,
    ) {
        self.test_results.push(TestResult {
            generated_instance_id: generated_id.map(str::to_owned),
            reference_instance_id: reference_id.map(str::to_owned),
            data_element: self.data_element.clone(),
            test_outcome: outcome,
            notes: notes.into(),
        });
    }
}

/// Everything recorded for one test case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseReport {
    pub test_id: String,
    pub generated_file_name: String,
    /// Auxiliary files shipped with the test case.
    pub files_utilized: Vec<String>,
    pub specification_tests: Vec<SpecificationTest>,
}

impl TestCaseReport {
    pub fn new(
        test_id: impl Into<String>,
        generated_file_name: impl Into<String>,
        files_utilized: Vec<String>,
    ) -> Self {
        Self {
            test_id: test_id.into(),
            generated_file_name: generated_file_name.into(),
            files_utilized,
            specification_tests: Vec::new(),
        }
    }
}

/// The whole run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub metadata: RunMetadata,
    pub test_case_reports: Vec<TestCaseReport>,
}

impl RunReport {
    pub fn new(metadata: RunMetadata) -> Self {
        Self {
            metadata,
            test_case_reports: Vec::new(),
        }
    }

    pub fn push(&mut self, report: TestCaseReport) {
        self.test_case_reports.push(report);
    }

    /// Totals per outcome across every test case.
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::default();
        for result in self
            .test_case_reports
            .iter()
            .flat_map(|c| &c.specification_tests)
            .flat_map(|t| &t.test_results)
        {
            match result.test_outcome {
                TestOutcome::Match => tally.matched += 1,
                TestOutcome::Differ => tally.differ += 1,
                TestOutcome::NotImplemented => tally.not_implemented += 1,
            }
        }
        tally
    }
}

/// Result counts by outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub matched: usize,
    pub differ: usize,
    pub not_implemented: usize,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use serde_json::json;

    use super::*;

    /// Outcomes and criteria serialize as upper-case tags and metadata
    /// flattens into the run object.
    #[test]
    fn test_report_shape() {
        let mut test = SpecificationTest::new("$.a.area", "area", EvaluationCriteria::Value);
        test.record(Some("S1"), None, TestOutcome::NotImplemented, "");
        let mut case = TestCaseReport::new("T1", "gen.json", vec!["weather.epw".to_owned()]);
        case.specification_tests.push(test);
        let mut report = RunReport::new(RunMetadata {
            ruleset_name: "ASHRAE 90.1".to_owned(),
            ..RunMetadata::default()
        });
        report.push(case);

        let value = serde_json::to_value(&report).expect("serializes");
        assert_eq!(value["ruleset_name"], json!("ASHRAE 90.1"));
        assert_eq!(value["schema_version"], json!(""));
        let test = &value["test_case_reports"][0]["specification_tests"][0];
        assert_eq!(test["evaluation_criteria"], json!("VALUE"));
        assert_eq!(
            test["test_results"][0],
            json!({
                "generated_instance_id": "S1",
                "reference_instance_id": null,
                "data_element": "area",
                "test_outcome": "NOT_IMPLEMENTED",
                "notes": ""
            })
        );
        assert!(test.get("data_element").is_none());
    }

    /// Tally counts every result once.
    #[test]
    fn test_tally() {
        let mut test = SpecificationTest::new("$.x", "x", EvaluationCriteria::Value);
        test.record(Some("a"), Some("b"), TestOutcome::Match, "");
        test.record(Some("c"), Some("d"), TestOutcome::Differ, "off");
        test.record(None, None, TestOutcome::Differ, "");
        let mut case = TestCaseReport::new("T", "g.json", Vec::new());
        case.specification_tests.push(test);
        let mut report = RunReport::default();
        report.push(case);
        assert_eq!(
            report.tally(),
            Tally {
                matched: 1,
                differ: 2,
                not_implemented: 0
            }
        );
    }

    /// Partial metadata objects fill the rest with empty strings.
    #[test]
    fn test_metadata_defaults() {
        let meta: RunMetadata =
            serde_json::from_value(json!({"schema_version": "0.1.7"})).expect("parses");
        assert_eq!(meta.schema_version, "0.1.7");
        assert!(meta.ruleset_name.is_empty());
    }
}
