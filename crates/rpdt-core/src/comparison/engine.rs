use serde_json::Value;
use tracing::debug;

use crate::findings::Findings;
use crate::reconcile::IdentityMap;
use crate::report::{EvaluationCriteria, SpecificationTest, TestOutcome};
use crate::spec::{ComparisonSpec, TestSpecEntry};

use super::align::{self, Alignment, alignment};
use super::{special, values};

/// Runs every entry of `spec`, returning one specification test per entry in
/// spec order together with the findings raised along the way.
pub fn compare(
    spec: &ComparisonSpec,
    generated: &Value,
    reference: &Value,
    map: &IdentityMap,
) -> (Vec<SpecificationTest>, Findings) {
    let mut findings = Findings::new();
    let tests = spec
        .entries
        .iter()
        .map(|entry| compare_entry(entry, generated, reference, map, &mut findings))
        .collect();
    (tests, findings)
}

/// Runs one spec entry.
pub fn compare_entry(
    entry: &TestSpecEntry,
    generated: &Value,
    reference: &Value,
    map: &IdentityMap,
    findings: &mut Findings,
) -> SpecificationTest {
    let criteria = if entry.compare_value {
        EvaluationCriteria::Value
    } else {
        EvaluationCriteria::Present
    };
    let mut test = SpecificationTest::new(&entry.raw_path, entry.data_element(), criteria);

    if let Some(case) = &entry.special_case {
        debug!(path = %entry.raw_path, case = case.tag(), "special case");
        special::run(case, entry, generated, reference, map, &mut test, findings);
        return test;
    }

    let how = alignment(&entry.path);
    debug!(path = %entry.raw_path, alignment = ?how, "comparing");
    let (aligned, unmapped) = match how {
        Alignment::Ordered {
            collection,
            category,
        } => align::ordered(
            &entry.path,
            collection,
            category,
            generated,
            reference,
            map,
            findings,
        ),
        Alignment::Unordered => (align::unordered(&entry.path, generated, reference, map), 0),
    };

    let element = test.data_element().to_owned();
    if aligned.iter().all(|pair| pair.generated.is_none()) {
        let note = match how {
            Alignment::Ordered { category, .. } if aligned.is_empty() && unmapped > 0 => format!(
                "Missing key {element}: none of the {unmapped} generated {} could be mapped to a reference object",
                category.label()
            ),
            Alignment::Ordered { .. } | Alignment::Unordered => format!("Missing key {element}"),
        };
        test.record(None, None, TestOutcome::NotImplemented, &note);
        findings.warn(note);
    } else {
        values::grade(entry, &aligned, &mut test, findings);
    }
    test
}
