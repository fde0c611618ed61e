//! Derived-value rules. None of them read a reference value except the
//! azimuth rule; the others check the generated document against an
//! expectation computed from its own data.
use serde_json::Value;

use crate::attributes::{flip_azimuth, origin_mismatched, within};
use crate::document::{
    Category, LoopRole, SUPPLY_FANS_PATH, entities, entity_id, find_loop, zone_of_surface,
};
use crate::findings::Findings;
use crate::query::find_all;
use crate::reconcile::IdentityMap;
use crate::report::{SpecificationTest, TestOutcome};
use crate::spec::{LimitKind, PumpRatios, SpecialCase, TestSpecEntry};

use super::values::show;

/// Absolute tolerance in watts for derived fan and pump power.
const POWER_TOLERANCE: f64 = 1.0;

pub(super) fn run(
    case: &SpecialCase,
    entry: &TestSpecEntry,
    generated: &Value,
    reference: &Value,
    map: &IdentityMap,
    test: &mut SpecificationTest,
    findings: &mut Findings,
) {
    match case {
        SpecialCase::FanPower { ratio } => fan_power(*ratio, generated, test, findings),
        SpecialCase::PumpPower(ratios) => pump_power(ratios, generated, test, findings),
        SpecialCase::Azimuth => azimuth(entry, generated, reference, map, test, findings),
        SpecialCase::StagedLimit(kind) => staged_limit(*kind, entry, generated, test, findings),
    }
}

/// A positive number under `key`. Zero counts as missing.
fn positive(node: &Value, key: &str) -> Option<f64> {
    node.get(key).and_then(Value::as_f64).filter(|v| *v != 0.0)
}

/// Checks `design_electric_power == ratio * flow` for one fan or pump.
fn check_power(
    node: &Value,
    flow_key: &str,
    flow_label: &str,
    ratio: f64,
    test: &mut SpecificationTest,
    findings: &mut Findings,
) {
    let id = entity_id(node).unwrap_or_default();
    let Some(flow) = positive(node, flow_key) else {
        let note = format!("Missing {flow_label} for '{id}'");
        test.record(Some(id), None, TestOutcome::Differ, &note);
        findings.warn(note);
        return;
    };
    let Some(power) = positive(node, "design_electric_power") else {
        let note = format!("Missing design electric power for '{id}'");
        test.record(Some(id), None, TestOutcome::Differ, &note);
        findings.warn(note);
        return;
    };
    let expected = ratio * flow;
    if within(power, expected, POWER_TOLERANCE) {
        test.record(Some(id), None, TestOutcome::Match, "");
    } else {
        let note = format!("Value mismatch at '{id}'. Expected: {expected}; got: {power}");
        test.record(Some(id), None, TestOutcome::Differ, &note);
        findings.error(note);
    }
}

/// `W/cfm`: every supply fan's power against `ratio * design_airflow`.
fn fan_power(ratio: f64, generated: &Value, test: &mut SpecificationTest, findings: &mut Findings) {
    for fan in find_all(SUPPLY_FANS_PATH, generated) {
        check_power(fan, "design_airflow", "design airflow", ratio, test, findings);
    }
}

/// `W/GPM`: every pump's power against the ratio of the loop it serves.
fn pump_power(
    ratios: &PumpRatios,
    generated: &Value,
    test: &mut SpecificationTest,
    findings: &mut Findings,
) {
    for pump in entities(generated, Category::Pump) {
        let pump_id = entity_id(pump).unwrap_or_default();
        let loop_id = pump
            .get("loop_or_piping")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some((fluid_loop, role)) = find_loop(generated, loop_id) else {
            let note = format!("Could not find loop with id '{loop_id}' for pump '{pump_id}'");
            test.record(Some(pump_id), None, TestOutcome::Differ, &note);
            findings.error(note);
            continue;
        };
        let loop_type = fluid_loop
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let ratio = match (loop_type, role) {
            ("COOLING", LoopRole::Primary) => ratios.pchw,
            ("COOLING", LoopRole::Secondary) => ratios.schw,
            ("HEATING", LoopRole::Primary | LoopRole::Secondary) => ratios.hw,
            ("CONDENSER", LoopRole::Primary | LoopRole::Secondary) => ratios.cw,
            (_, LoopRole::Primary | LoopRole::Secondary) => None,
        };
        let Some(ratio) = ratio else {
            let note = format!(
                "No W/GPM ratio for {loop_type} loop '{loop_id}' serving pump '{pump_id}'"
            );
            test.record(Some(pump_id), None, TestOutcome::NotImplemented, &note);
            findings.warn(note);
            continue;
        };
        check_power(pump, "design_flow", "design flow", ratio, test, findings);
    }
}

/// Azimuths of mapped surfaces, expecting a 180 degree flip where the two
/// documents record a surface from opposite zones. Adds one aggregate result.
fn azimuth(
    entry: &TestSpecEntry,
    generated: &Value,
    reference: &Value,
    map: &IdentityMap,
    test: &mut SpecificationTest,
    findings: &mut Findings,
) {
    let element = test.data_element().to_owned();
    let path = &entry.path;
    let Some(collection) = path.rposition_key(|key| key == "surfaces") else {
        let note = format!("Path '{}' does not select surfaces", entry.raw_path);
        test.record(None, None, TestOutcome::NotImplemented, &note);
        findings.error(note);
        return;
    };
    let rest = path.suffix(collection + 1);

    let mut any_generated = false;
    for surface in path.prefix(collection + 1).evaluate(generated) {
        let Some(surface_id) = entity_id(surface) else {
            continue;
        };
        let Some(reference_id) = map.get(surface_id) else {
            findings.error(format!("Could not map '{surface_id}' to a reference surface"));
            continue;
        };
        let Some(reference_surface) = path
            .prefix(collection + 1)
            .with_id_at(collection, reference_id)
            .find_one(reference)
        else {
            findings.error(format!(
                "Could not find reference surface with id '{reference_id}'"
            ));
            continue;
        };

        let generated_value = rest.find_one(surface).filter(|v| !v.is_null());
        let Some(generated_value) = generated_value else {
            continue;
        };
        any_generated = true;

        let generated_zone = zone_of_surface(generated, surface_id).and_then(entity_id);
        let reference_zone = generated_zone.and_then(|z| map.get(z));
        let flipped = origin_mismatched(surface, generated_zone, reference_surface, reference_zone);

        let reference_value = path
            .with_id_at(collection, reference_id)
            .find_one(reference)
            .and_then(Value::as_f64);
        let expected = reference_value.map(|r| if flipped { flip_azimuth(r) } else { r });
        let agrees = match (expected, generated_value.as_f64()) {
            (Some(e), Some(g)) => within(g, e, entry.tolerance),
            (None, _) | (_, None) => false,
        };
        if !agrees {
            let expected = expected.map_or_else(|| "None".to_owned(), |e| e.to_string());
            findings.error(format!(
                "Value mismatch at '{surface_id}' for key '{element}': Expected '{expected}', got '{}'",
                show(generated_value)
            ));
        }
    }

    if any_generated {
        test.record(None, None, TestOutcome::Match, "");
    } else {
        let note = format!("Missing key {element}");
        test.record(None, None, TestOutcome::NotImplemented, &note);
        findings.warn(note);
    }
}

/// Staged boiler sequencing: boilers sorted by their own limit must start
/// where the previous boilers' capacity ends.
fn staged_limit(
    kind: LimitKind,
    entry: &TestSpecEntry,
    generated: &Value,
    test: &mut SpecificationTest,
    findings: &mut Findings,
) {
    let field = kind.field();
    let mut boilers = match entry.path.rposition_key(|key| key == "boilers") {
        Some(collection) => entry.path.prefix(collection + 1).evaluate(generated),
        None => entities(generated, Category::Boiler),
    };
    let limit_of = |boiler: &Value| boiler.get(field).and_then(Value::as_f64);
    boilers.sort_by(|a, b| {
        limit_of(a)
            .unwrap_or(f64::INFINITY)
            .total_cmp(&limit_of(b).unwrap_or(f64::INFINITY))
    });

    let mut staged = true;
    let mut cumulative = 0.0;
    for boiler in boilers {
        let id = entity_id(boiler).unwrap_or_default();
        let capacity = boiler
            .get("rated_capacity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        let actual = limit_of(boiler).unwrap_or(0.0);
        if kind == LimitKind::Upper {
            cumulative += capacity;
        }
        if within(actual, cumulative, entry.tolerance) {
            test.record(Some(id), None, TestOutcome::Match, "");
        } else {
            let note = format!(
                "{id} operation {} limit incorrect for staged operation. Expected: {cumulative}; got: {actual}",
                kind.label()
            );
            test.record(Some(id), None, TestOutcome::Differ, &note);
            findings.warn(note);
            staged = false;
        }
        if kind == LimitKind::Lower {
            cumulative += capacity;
        }
    }
    if !staged {
        findings.warn(format!(
            "Boilers are not staged based on operation {} limits.",
            kind.label()
        ));
    }
}
