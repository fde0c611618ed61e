use serde_json::Value;

use crate::attributes::{Tolerance, compare_scalar, values_equal};
use crate::findings::Findings;
use crate::report::{EvaluationCriteria, SpecificationTest, TestOutcome};
use crate::spec::TestSpecEntry;

use super::align::Aligned;

/// Renders a value the way diagnostics quote it: strings bare, everything
/// else as JSON.
pub(super) fn show(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            value.to_string()
        }
    }
}

/// Grades aligned pairs into `test`.
///
/// - generated absent, reference present: `NOT_IMPLEMENTED` plus a warning;
/// - generated present, reference absent: a warning, no result;
/// - reference list: lengths compared (`QUANTITY`), then elements when values
///   are compared;
/// - otherwise a tolerance comparison (`VALUE`), or a presence check when
///   `compare-value` is off.
pub(super) fn grade(
    entry: &TestSpecEntry,
    aligned: &[Aligned<'_>],
    test: &mut SpecificationTest,
    findings: &mut Findings,
) {
    let element = test.data_element().to_owned();
    for pair in aligned {
        let generated_id = pair.generated_id.as_deref();
        let reference_id = pair.reference_id.as_deref();
        let at = pair.label.as_str();

        let (generated, reference) = match (pair.generated, pair.reference) {
            (Some(generated), Some(reference)) => (generated, reference),
            (None, Some(_)) => {
                let note = format!("Missing value for key '{element}' at {at}");
                test.record(generated_id, reference_id, TestOutcome::NotImplemented, &note);
                findings.warn(note);
                continue;
            }
            (Some(generated), None) => {
                if entry.compare_value {
                    findings.warn(format!(
                        "Extra data provided at '{at}' for key '{element}'. Expected: 'None'; got: '{}'",
                        show(generated)
                    ));
                }
                continue;
            }
            (None, None) => continue,
        };

        if let Value::Array(expected) = reference {
            test.evaluation_criteria = EvaluationCriteria::Quantity;
            let Some(got) = generated.as_array() else {
                let note = format!(
                    "Expected a list at '{at}' for key '{element}'; got: '{}'",
                    show(generated)
                );
                test.record(generated_id, reference_id, TestOutcome::Differ, &note);
                findings.error(note);
                continue;
            };
            if got.len() != expected.len() {
                let note = format!(
                    "List length mismatch at '{at}' for key '{element}'. Expected: {}; got: {}",
                    expected.len(),
                    got.len()
                );
                test.record(generated_id, reference_id, TestOutcome::Differ, &note);
                findings.error(note);
                continue;
            }
            test.record(generated_id, reference_id, TestOutcome::Match, "");
            if entry.compare_value {
                test.evaluation_criteria = EvaluationCriteria::Value;
                for (j, (g, r)) in got.iter().zip(expected).enumerate() {
                    if !values_equal(g, r) {
                        let note = format!(
                            "List element mismatch for {at} at index [{j}]. Expected: {}; got: {}",
                            show(r),
                            show(g)
                        );
                        test.record(generated_id, reference_id, TestOutcome::Differ, &note);
                        findings.error(note);
                    }
                }
            }
            continue;
        }

        if reference.is_object() {
            let note = format!(
                "Path '{}' selects an object at '{at}'; only values and lists can be compared",
                test.data_path
            );
            test.record(generated_id, reference_id, TestOutcome::NotImplemented, &note);
            findings.error(note);
            continue;
        }

        if !entry.compare_value {
            if reference.is_string() {
                test.evaluation_criteria = EvaluationCriteria::Present;
            }
            test.record(generated_id, reference_id, TestOutcome::Match, "");
            continue;
        }

        test.evaluation_criteria = EvaluationCriteria::Value;
        if compare_scalar(generated, reference, Tolerance::Absolute(entry.tolerance)) {
            test.record(generated_id, reference_id, TestOutcome::Match, "");
        } else {
            let note = format!(
                "Value mismatch at '{at}' for key '{element}'. Expected: '{}'; got: '{}'",
                show(reference),
                show(generated)
            );
            test.record(generated_id, reference_id, TestOutcome::Differ, &note);
            findings.error(note);
        }
    }
}
