//! Value and attribute comparison rules.
//!
//! [`compare_scalar`] grades a generated value against its reference value.
//! [`compare_attribute`] is the looser rule set used while reconciling
//! entities: it decides whether two candidate objects agree on one attribute,
//! with overrides for `azimuth`, `area`, sequences and plain numbers.
use serde_json::Value;

/// Absolute tolerance applied to `area` while matching entities.
pub const AREA_TOLERANCE: f64 = 0.1;

/// Relative tolerance applied to numeric attributes while matching entities.
pub const MATCH_RELATIVE_TOLERANCE: f64 = 0.01;

/// Relative tolerance always in force alongside an absolute one.
const BASE_RELATIVE_TOLERANCE: f64 = 1e-9;

/// How far a numeric value may stray from its reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// `|a - b| <= abs` (or within a relative `1e-9`).
    Absolute(f64),
    /// `|a - b| <= rel * max(|a|, |b|)`.
    Relative(f64),
    /// No numeric comparison possible; numbers never match.
    Unspecified,
}

/// The zones scoping an attribute comparison, one per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZonePair<'a> {
    pub generated: &'a str,
    pub reference: &'a str,
}

/// Structural equality where numbers compare by value, so `90` equals `90.0`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            (None, _) | (_, None) => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, x)| ym.get(k).is_some_and(|y| values_equal(x, y)))
        }
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) | Value::Array(_)
            | Value::Object(_),
            _,
        ) => false,
    }
}

/// `math.isclose`-style closeness: `|a - b| <= max(rel * max(|a|, |b|), abs)`.
pub fn is_close(a: f64, b: f64, abs: f64, rel: f64) -> bool {
    if a == b {
        return true;
    }
    if !a.is_finite() || !b.is_finite() {
        return false;
    }
    let diff = (a - b).abs();
    diff <= (rel * a.abs().max(b.abs())).max(abs)
}

/// Whether `value` is within `abs` of `expected`.
pub fn within(value: f64, expected: f64, abs: f64) -> bool {
    is_close(value, expected, abs, BASE_RELATIVE_TOLERANCE)
}

/// Compares a generated value against its reference value.
///
/// String and boolean references require exact equality. Numeric references
/// use the supplied tolerance; without one the comparison fails closed. Any
/// other reference shape never matches.
pub fn compare_scalar(value: &Value, reference: &Value, tolerance: Tolerance) -> bool {
    match reference {
        Value::String(_) | Value::Bool(_) => values_equal(value, reference),
        Value::Number(r) => {
            let (Some(v), Some(r)) = (value.as_f64(), r.as_f64()) else {
                return false;
            };
            match tolerance {
                Tolerance::Absolute(abs) => is_close(v, r, abs, BASE_RELATIVE_TOLERANCE),
                Tolerance::Relative(rel) => is_close(v, r, 0.0, rel),
                Tolerance::Unspecified => false,
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => false,
    }
}

/// Looks up `name` on `obj`, following dots through nested mappings
/// (`cooling_system.type`). A key present with a `null` value is found.
pub fn attribute<'a>(obj: &'a Value, name: &str) -> Option<&'a Value> {
    if let Some(direct) = obj.get(name) {
        return Some(direct);
    }
    name.split('.')
        .try_fold(obj, |node, part| node.as_object().and_then(|m| m.get(part)))
}

/// `(reference + 180) mod 360`.
pub fn flip_azimuth(reference: f64) -> f64 {
    (reference + 180.0).rem_euclid(360.0)
}

/// Whether a surface is recorded from opposite sides in the two documents.
///
/// A surface is "seen from the adjacent zone" when its `adjacent_zone` equals
/// the zone scoping the comparison. The origin is mismatched when that holds
/// in exactly one document.
pub fn origin_mismatched(
    generated: &Value,
    generated_zone: Option<&str>,
    reference: &Value,
    reference_zone: Option<&str>,
) -> bool {
    fn adjacent(surface: &Value) -> Option<&str> {
        surface.get("adjacent_zone").and_then(Value::as_str)
    }
    (adjacent(generated) == generated_zone) != (adjacent(reference) == reference_zone)
}

/// Whether `target` and `candidate` agree on `attr` for matching purposes.
///
/// Returns `false` when `target` lacks the attribute altogether.
pub fn compare_attribute(
    target: &Value,
    candidate: &Value,
    attr: &str,
    zones: Option<ZonePair<'_>>,
) -> bool {
    let Some(target_value) = attribute(target, attr) else {
        return false;
    };
    let candidate_value = attribute(candidate, attr).unwrap_or(&Value::Null);

    if attr == "azimuth" {
        let mismatched = origin_mismatched(
            target,
            zones.map(|z| z.generated),
            candidate,
            zones.map(|z| z.reference),
        );
        return if mismatched {
            match (target_value.as_f64(), candidate_value.as_f64()) {
                (Some(t), Some(c)) => (t - c).abs() == 180.0,
                (None, _) | (_, None) => false,
            }
        } else {
            values_equal(target_value, candidate_value)
        };
    }
    if attr == "area" {
        return compare_scalar(target_value, candidate_value, Tolerance::Absolute(AREA_TOLERANCE));
    }
    match target_value {
        Value::Array(items) => {
            items.len() == candidate_value.as_array().map_or(0, Vec::len)
        }
        Value::Number(_) => compare_scalar(
            target_value,
            candidate_value,
            Tolerance::Relative(MATCH_RELATIVE_TOLERANCE),
        ),
        Value::Null | Value::Bool(_) | Value::String(_) | Value::Object(_) => {
            values_equal(target_value, candidate_value)
        }
    }
}

/// Number of `attrs` on which `target` and `candidate` agree.
pub fn agreement_score(
    target: &Value,
    candidate: &Value,
    attrs: &[&str],
    zones: Option<ZonePair<'_>>,
) -> usize {
    attrs
        .iter()
        .filter(|attr| compare_attribute(target, candidate, attr, zones))
        .count()
}
