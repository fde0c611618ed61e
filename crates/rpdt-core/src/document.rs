//! Entity categories and derived views over a building model document.
//!
//! Documents are untyped [`Value`] trees. This module knows where each entity
//! category lives inside them and computes the two derived views used by the
//! reconciler: which zones and terminals each HVAC system serves, and how each
//! construction is used by surfaces.
use std::collections::HashSet;
use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Value, json};

use crate::query::{PathQuery, find_all, find_all_with_filters};

const RMD: &str = "$.ruleset_model_descriptions[*]";
const SEGMENTS: &str = "$.ruleset_model_descriptions[*].buildings[*].building_segments[*]";

/// Every zone of every building segment.
pub const ZONES_PATH: &str =
    "$.ruleset_model_descriptions[*].buildings[*].building_segments[*].zones[*]";

/// Every surface of every zone.
pub const SURFACES_PATH: &str =
    "$.ruleset_model_descriptions[*].buildings[*].building_segments[*].zones[*].surfaces[*]";

/// Every supply fan of every HVAC system.
pub const SUPPLY_FANS_PATH: &str = "$.ruleset_model_descriptions[*].buildings[*].building_segments[*].heating_ventilating_air_conditioning_systems[*].fan_system.supply_fans[*]";

/// Kinds of entity the reconciler pairs across documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Zone,
    Surface,
    Terminal,
    HvacSystem,
    Construction,
    Material,
    Boiler,
    Chiller,
    HeatRejection,
    FluidLoop,
    Pump,
}

impl Category {
    /// Every category, in reconciliation order.
    pub const ALL: [Category; 11] = [
        Category::Zone,
        Category::HvacSystem,
        Category::Surface,
        Category::Terminal,
        Category::Construction,
        Category::Material,
        Category::Boiler,
        Category::Chiller,
        Category::HeatRejection,
        Category::FluidLoop,
        Category::Pump,
    ];

    /// The document key holding the category's sequence.
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::Zone => "zones",
            Self::Surface => "surfaces",
            Self::Terminal => "terminals",
            Self::HvacSystem => "heating_ventilating_air_conditioning_systems",
            Self::Construction => "constructions",
            Self::Material => "materials",
            Self::Boiler => "boilers",
            Self::Chiller => "chillers",
            Self::HeatRejection => "heat_rejections",
            Self::FluidLoop => "fluid_loops",
            Self::Pump => "pumps",
        }
    }

    /// Maps a sequence key back to its category. `child_loops` are loops.
    pub fn from_collection_key(key: &str) -> Option<Self> {
        if key == "child_loops" {
            return Some(Self::FluidLoop);
        }
        Self::ALL.into_iter().find(|c| c.collection_key() == key)
    }

    /// Plural display name used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            Self::Zone => "Zones",
            Self::Surface => "Surfaces",
            Self::Terminal => "Terminals",
            Self::HvacSystem => "HVAC Systems",
            Self::Construction => "Constructions",
            Self::Material => "Materials",
            Self::Boiler => "Boilers",
            Self::Chiller => "Chillers",
            Self::HeatRejection => "Heat Rejections",
            Self::FluidLoop => "Loops",
            Self::Pump => "Pumps",
        }
    }

    /// Singular display name used in count-mismatch diagnostics.
    pub fn singular(self) -> &'static str {
        match self {
            Self::Zone => "Zone",
            Self::Surface => "Surface",
            Self::Terminal => "Terminal",
            Self::HvacSystem => "HVAC system",
            Self::Construction => "Construction",
            Self::Material => "Material",
            Self::Boiler => "Boiler",
            Self::Chiller => "Chiller",
            Self::HeatRejection => "Heat Rejection",
            Self::FluidLoop => "Loop",
            Self::Pump => "Pump",
        }
    }

    /// Whether comparisons under this category go through the identity map.
    ///
    /// Constructions and materials are reconciled but compared positionally.
    pub fn is_aligned(self) -> bool {
        match self {
            Self::Zone
            | Self::Surface
            | Self::Terminal
            | Self::HvacSystem
            | Self::Boiler
            | Self::Chiller
            | Self::HeatRejection
            | Self::FluidLoop
            | Self::Pump => true,
            Self::Construction | Self::Material => false,
        }
    }

    /// Paths selecting every entity of this category.
    fn paths(self) -> Vec<String> {
        match self {
            Self::Zone => vec![ZONES_PATH.to_owned()],
            Self::Surface => vec![SURFACES_PATH.to_owned()],
            Self::Terminal => vec![format!("{ZONES_PATH}.terminals[*]")],
            Self::HvacSystem => vec![
                format!("{SEGMENTS}.heating_ventilating_air_conditioning_systems[*]"),
                format!("{RMD}.heating_ventilating_air_conditioning_systems[*]"),
            ],
            Self::FluidLoop => vec![
                format!("{RMD}.fluid_loops[*]"),
                format!("{RMD}.fluid_loops[*].child_loops[*]"),
            ],
            Self::Construction
            | Self::Material
            | Self::Boiler
            | Self::Chiller
            | Self::HeatRejection
            | Self::Pump => vec![format!("{RMD}.{}[*]", self.collection_key())],
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The string `id` of an entity node.
pub fn entity_id(node: &Value) -> Option<&str> {
    node.get("id").and_then(Value::as_str)
}

/// Every entity of `category` in document order.
pub fn entities(doc: &Value, category: Category) -> Vec<&Value> {
    category
        .paths()
        .iter()
        .flat_map(|path| find_all(path, doc))
        .filter(|node| node.is_object())
        .collect()
}

/// Surface subtypes used to partition a zone's surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    ExteriorWall,
    InteriorWall,
    GroundFloor,
    Roof,
}

impl SurfaceKind {
    pub const ALL: [SurfaceKind; 4] = [
        SurfaceKind::ExteriorWall,
        SurfaceKind::InteriorWall,
        SurfaceKind::GroundFloor,
        SurfaceKind::Roof,
    ];

    /// `(classification, adjacent_to)` selecting this subtype.
    pub fn filter(self) -> [(&'static str, &'static str); 2] {
        let (classification, adjacent_to) = match self {
            Self::ExteriorWall => ("WALL", "EXTERIOR"),
            Self::InteriorWall => ("WALL", "INTERIOR"),
            Self::GroundFloor => ("FLOOR", "GROUND"),
            Self::Roof => ("CEILING", "EXTERIOR"),
        };
        [("classification", classification), ("adjacent_to", adjacent_to)]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ExteriorWall => "Exterior Wall",
            Self::InteriorWall => "Interior Wall",
            Self::GroundFloor => "Ground Floor",
            Self::Roof => "Roof",
        }
    }
}

/// Surfaces of `kind` belonging to `zone`.
///
/// Interior walls also include surfaces declared by other zones whose
/// `adjacent_zone` is this zone, since a shared wall may be recorded from
/// either side.
pub fn zone_surfaces<'a>(doc: &'a Value, zone: &'a Value, kind: SurfaceKind) -> Vec<&'a Value> {
    let mut surfaces = find_all_with_filters("$.surfaces[*]", zone, &kind.filter());
    if kind == SurfaceKind::InteriorWall {
        if let Some(zone_id) = entity_id(zone) {
            for other in find_all_with_filters(SURFACES_PATH, doc, &[("adjacent_zone", zone_id)]) {
                if !surfaces.iter().any(|s| std::ptr::eq(*s, other)) {
                    surfaces.push(other);
                }
            }
        }
    }
    surfaces
}

/// The zone whose `surfaces` contain a surface with id `surface_id`.
pub fn zone_of_surface<'a>(doc: &'a Value, surface_id: &str) -> Option<&'a Value> {
    find_all(ZONES_PATH, doc).into_iter().find(|zone| {
        find_all("$.surfaces[*]", zone)
            .into_iter()
            .any(|s| entity_id(s) == Some(surface_id))
    })
}

/// Zones and terminals served by one HVAC system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServedBy {
    /// Zone ids in first-seen order, without duplicates.
    pub zones: Vec<String>,
    /// Terminal ids in first-seen order, without duplicates.
    pub terminals: Vec<String>,
}

/// For each HVAC system referenced by a zone terminal's
/// `served_by_heating_ventilating_air_conditioning_system`, the zones and
/// terminals it serves. Keys keep first-reference order.
pub fn hvac_service_index(doc: &Value) -> IndexMap<String, ServedBy> {
    let mut index: IndexMap<String, ServedBy> = IndexMap::new();
    for zone in find_all(ZONES_PATH, doc) {
        let Some(zone_id) = entity_id(zone) else {
            continue;
        };
        for terminal in find_all("$.terminals[*]", zone) {
            let Some(terminal_id) = entity_id(terminal) else {
                continue;
            };
            let Some(hvac_id) = terminal
                .get("served_by_heating_ventilating_air_conditioning_system")
                .and_then(Value::as_str)
                .filter(|id| !id.is_empty())
            else {
                continue;
            };
            let served = index.entry(hvac_id.to_owned()).or_default();
            if !served.zones.iter().any(|z| z == zone_id) {
                served.zones.push(zone_id.to_owned());
            }
            if !served.terminals.iter().any(|t| t == terminal_id) {
                served.terminals.push(terminal_id.to_owned());
            }
        }
    }
    index
}

/// How a construction is used by the surfaces of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConstructionUsage {
    pub exterior_walls: u64,
    pub rooves: u64,
    pub below_grade_surfaces: u64,
    pub interior_surfaces: u64,
    pub primary_layers_length: u64,
    pub framing_layers_length: u64,
    pub u_factor: Option<f64>,
    pub c_factor: Option<f64>,
    pub f_factor: Option<f64>,
}

impl ConstructionUsage {
    /// The usage as a mapping tagged with `id`, ready for attribute matching.
    pub fn to_entity(&self, id: &str) -> Value {
        json!({
            "id": id,
            "exterior_walls": self.exterior_walls,
            "rooves": self.rooves,
            "below_grade_surfaces": self.below_grade_surfaces,
            "interior_surfaces": self.interior_surfaces,
            "primary_layers_length": self.primary_layers_length,
            "framing_layers_length": self.framing_layers_length,
            "u_factor": self.u_factor,
            "c_factor": self.c_factor,
            "f_factor": self.f_factor,
        })
    }
}

fn seq_len(node: &Value, key: &str) -> u64 {
    node.get(key)
        .and_then(Value::as_array)
        .map_or(0, |items| items.len() as u64)
}

/// Usage counters for every construction, keyed by construction id.
///
/// Exterior surfaces without a classification count as roofs when
/// `tilt < 60` and as walls when `60 <= tilt < 120` (`tilt` defaults to 90).
/// Surfaces referencing an unknown construction are ignored.
pub fn construction_usage(doc: &Value) -> IndexMap<String, ConstructionUsage> {
    let mut usage: IndexMap<String, ConstructionUsage> = IndexMap::new();
    for construction in entities(doc, Category::Construction) {
        let Some(id) = entity_id(construction) else {
            continue;
        };
        let entry = usage.entry(id.to_owned()).or_default();
        entry.primary_layers_length = seq_len(construction, "primary_layers");
        entry.framing_layers_length = seq_len(construction, "framing_layers");
        entry.u_factor = construction.get("u_factor").and_then(Value::as_f64);
        entry.c_factor = construction.get("c_factor").and_then(Value::as_f64);
        entry.f_factor = construction.get("f_factor").and_then(Value::as_f64);
    }

    for surface in find_all(SURFACES_PATH, doc) {
        let Some(entry) = surface
            .get("construction")
            .and_then(Value::as_str)
            .and_then(|id| usage.get_mut(id))
        else {
            continue;
        };
        let adjacent_to = surface.get("adjacent_to").and_then(Value::as_str);
        let classification = surface.get("classification").and_then(Value::as_str);
        let tilt = surface.get("tilt").and_then(Value::as_f64).unwrap_or(90.0);
        match (adjacent_to, classification) {
            (Some("GROUND"), _) => entry.below_grade_surfaces += 1,
            (Some("INTERIOR"), _) => entry.interior_surfaces += 1,
            (Some("EXTERIOR"), Some("WALL")) => entry.exterior_walls += 1,
            (Some("EXTERIOR"), Some("CEILING")) => entry.rooves += 1,
            (Some("EXTERIOR"), None) if tilt < 60.0 => entry.rooves += 1,
            (Some("EXTERIOR"), None) if (60.0..120.0).contains(&tilt) => {
                entry.exterior_walls += 1;
            }
            _ => {}
        }
    }
    usage
}

/// Ids listed in any construction's `primary_layers` or `framing_layers`.
pub fn referenced_layer_ids(doc: &Value) -> HashSet<String> {
    ["primary_layers", "framing_layers"]
        .iter()
        .flat_map(|key| {
            PathQuery::parse(&format!("{RMD}.constructions[*].{key}[*]")).evaluate(doc)
        })
        .filter_map(|v| v.as_str().map(str::to_owned))
        .collect()
}

/// Whether a loop is a top-level fluid loop or a child of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRole {
    Primary,
    Secondary,
}

/// The fluid loop with id `loop_id`, searching top-level loops first.
pub fn find_loop<'a>(doc: &'a Value, loop_id: &str) -> Option<(&'a Value, LoopRole)> {
    let primary = format!("{RMD}.fluid_loops[*]");
    let secondary = format!("{RMD}.fluid_loops[*].child_loops[*]");
    let filter = [("id", loop_id)];
    if let Some(found) = find_all_with_filters(&primary, doc, &filter).into_iter().next() {
        return Some((found, LoopRole::Primary));
    }
    find_all_with_filters(&secondary, doc, &filter)
        .into_iter()
        .next()
        .map(|found| (found, LoopRole::Secondary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{surface, terminal, two_zone_doc};

    /// Collection keys round-trip; `child_loops` maps to loops.
    #[test]
    fn test_collection_key_round_trip() {
        for category in Category::ALL {
            assert_eq!(Category::from_collection_key(category.collection_key()), Some(category));
        }
        assert_eq!(Category::from_collection_key("child_loops"), Some(Category::FluidLoop));
        assert_eq!(Category::from_collection_key("weather"), None);
    }

    /// Loops include child loops after top-level loops.
    #[test]
    fn test_entities_include_child_loops() {
        let doc = json!({"ruleset_model_descriptions": [{
            "fluid_loops": [{"id": "L1", "child_loops": [{"id": "L1a"}]}, {"id": "L2"}]
        }]});
        let ids: Vec<&str> = entities(&doc, Category::FluidLoop)
            .into_iter()
            .filter_map(entity_id)
            .collect();
        assert_eq!(ids, vec!["L1", "L2", "L1a"]);
    }

    /// Interior walls pick up surfaces declared by the neighbouring zone.
    #[test]
    fn test_interior_walls_include_adjacent_declarations() {
        let doc = two_zone_doc(
            vec![surface("S1", "WALL", "INTERIOR", 5.0, 0.0)],
            vec![{
                let mut s = surface("S2", "WALL", "INTERIOR", 5.0, 180.0);
                s["adjacent_zone"] = json!("Z1");
                s
            }],
        );
        let zones = find_all(ZONES_PATH, &doc);
        let walls = zone_surfaces(&doc, zones[0], SurfaceKind::InteriorWall);
        let ids: Vec<&str> = walls.into_iter().filter_map(entity_id).collect();
        assert_eq!(ids, vec!["S1", "S2"]);
    }

    /// The service index de-duplicates zones and keeps first-seen order.
    #[test]
    fn test_hvac_service_index() {
        let doc = json!({"ruleset_model_descriptions": [{"buildings": [{"building_segments": [{
            "zones": [
                {"id": "Z1", "terminals": [terminal("T1", "SYS-A"), terminal("T2", "SYS-A")]},
                {"id": "Z2", "terminals": [terminal("T3", "SYS-B"), terminal("T4", "SYS-A")]}
            ]
        }]}]}]});
        let index = hvac_service_index(&doc);
        assert_eq!(index.len(), 2);
        let a = &index["SYS-A"];
        assert_eq!(a.zones, vec!["Z1", "Z2"]);
        assert_eq!(a.terminals, vec!["T1", "T2", "T4"]);
        assert_eq!(index.get_index(1).map(|(k, _)| k.as_str()), Some("SYS-B"));
    }

    /// Usage counters follow adjacency, classification and tilt.
    #[test]
    fn test_construction_usage() {
        let doc = json!({"ruleset_model_descriptions": [{
            "constructions": [{"id": "C1", "primary_layers": ["M1", "M2"], "u_factor": 0.3}],
            "buildings": [{"building_segments": [{"zones": [{"id": "Z1", "surfaces": [
                {"id": "a", "construction": "C1", "adjacent_to": "EXTERIOR", "classification": "WALL"},
                {"id": "b", "construction": "C1", "adjacent_to": "EXTERIOR", "tilt": 10},
                {"id": "c", "construction": "C1", "adjacent_to": "EXTERIOR"},
                {"id": "d", "construction": "C1", "adjacent_to": "EXTERIOR", "tilt": 150},
                {"id": "e", "construction": "C1", "adjacent_to": "GROUND"},
                {"id": "f", "construction": "C1", "adjacent_to": "INTERIOR"},
                {"id": "g", "construction": "UNKNOWN", "adjacent_to": "INTERIOR"}
            ]}]}]}]
        }]});
        let usage = construction_usage(&doc);
        let c1 = &usage["C1"];
        assert_eq!(c1.exterior_walls, 2);
        assert_eq!(c1.rooves, 1);
        assert_eq!(c1.below_grade_surfaces, 1);
        assert_eq!(c1.interior_surfaces, 1);
        assert_eq!(c1.primary_layers_length, 2);
        assert_eq!(c1.framing_layers_length, 0);
        assert_eq!(c1.u_factor, Some(0.3));
        assert_eq!(c1.c_factor, None);
    }

    /// Loops are found at the top level first, then among child loops.
    #[test]
    fn test_find_loop_roles() {
        let doc = json!({"ruleset_model_descriptions": [{
            "fluid_loops": [{"id": "CHW", "type": "COOLING", "child_loops": [{"id": "SCHW", "type": "COOLING"}]}]
        }]});
        assert_eq!(find_loop(&doc, "CHW").map(|(_, r)| r), Some(LoopRole::Primary));
        assert_eq!(find_loop(&doc, "SCHW").map(|(_, r)| r), Some(LoopRole::Secondary));
        assert!(find_loop(&doc, "HW").is_none());
    }

    /// A surface's owning zone is found by id.
    #[test]
    fn test_zone_of_surface() {
        let doc = two_zone_doc(
            vec![surface("S1", "WALL", "EXTERIOR", 1.0, 0.0)],
            vec![surface("S2", "WALL", "EXTERIOR", 1.0, 0.0)],
        );
        assert_eq!(zone_of_surface(&doc, "S2").and_then(entity_id), Some("Z2"));
        assert!(zone_of_surface(&doc, "S9").is_none());
    }
}
