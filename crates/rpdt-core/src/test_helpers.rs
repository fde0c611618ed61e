//! Shared builders for unit tests.
use serde_json::{Map, Value, json};

pub(crate) fn surface(
    id: &str,
    classification: &str,
    adjacent_to: &str,
    area: f64,
    azimuth: f64,
) -> Value {
    json!({
        "id": id,
        "classification": classification,
        "adjacent_to": adjacent_to,
        "area": area,
        "azimuth": azimuth,
    })
}

pub(crate) fn terminal(id: &str, hvac: &str) -> Value {
    json!({
        "id": id,
        "type": "VARIABLE_AIR_VOLUME",
        "served_by_heating_ventilating_air_conditioning_system": hvac,
    })
}

pub(crate) fn zone(id: &str, surfaces: Vec<Value>, terminals: Vec<Value>) -> Value {
    json!({"id": id, "surfaces": surfaces, "terminals": terminals})
}

/// A single-building model holding `zones`, with `extra` merged into the
/// ruleset model description (boilers, pumps, fluid loops...).
pub(crate) fn model(zones: Vec<Value>, extra: Value) -> Value {
    let mut rmd = Map::new();
    rmd.insert(
        "buildings".to_owned(),
        json!([{"id": "B1", "building_segments": [{"id": "BS1", "zones": zones}]}]),
    );
    if let Value::Object(extra) = extra {
        rmd.extend(extra);
    }
    json!({"id": "RPD", "ruleset_model_descriptions": [Value::Object(rmd)]})
}

/// Zones `Z1` and `Z2` holding the given surfaces.
pub(crate) fn two_zone_doc(z1_surfaces: Vec<Value>, z2_surfaces: Vec<Value>) -> Value {
    model(
        vec![
            zone("Z1", z1_surfaces, Vec::new()),
            zone("Z2", z2_surfaces, Vec::new()),
        ],
        json!({}),
    )
}
