//! Entity reconciliation: inferring which generated object corresponds to
//! which reference object.
//!
//! The two documents share no primary key, so correspondence is inferred per
//! [`Category`] from structure, cross-references and attribute agreement.
//! Categories are resolved in a fixed order, each stage reading pairings
//! committed by earlier ones:
//!
//! 1. zones (must cover every reference zone, otherwise reconciliation stops)
//! 2. HVAC systems, by the set of zones they serve
//! 3. per zone: surfaces by subtype, then terminals by their HVAC system
//! 4. constructions and materials, tolerating surplus generated objects
//! 5. boilers, chillers, heat rejections, fluid loops
//! 6. pumps, by the loop they serve
//!
//! Every category runs the same chain: a direct pairing when exactly one
//! candidate exists on each side, the category's primary strategy, attribute
//! matching for whatever the primary strategy left over, and fuzzy id
//! matching when nothing else produced a pairing. See [`plan`] for the
//! per-category choices.
pub mod identity_map;
mod stages;
pub mod strategies;


use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::attributes::ZonePair;
use crate::document::Category;
use crate::findings::Findings;

pub use identity_map::{CategoryMap, IdentityMap, Rejection};
pub use strategies::{Candidate, ScoredPair, greedy_by_score};

use strategies::{
    match_by_attributes, match_by_id, match_by_link, match_by_link_set, match_excess_generated,
};

/// The strategy tried first for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primary {
    /// No bespoke strategy; attribute matching does the work.
    Attributes,
    /// Fuzzy id matching.
    ById,
    /// Exact correspondence of translated link sets.
    LinkSet,
    /// First free reference candidate sharing the translated link.
    FollowLink,
    /// Global greedy attribute matching tolerating surplus generated objects.
    ExcessGenerated,
}

/// What happens when the two sides hold different numbers of candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountRule {
    /// Report an error and skip the category.
    Strict,
    /// Report a warning and match anyway.
    Lenient,
}

/// How one category is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchPlan {
    pub primary: Primary,
    /// Attributes scored by attribute matching. Empty disables the
    /// attribute fallback.
    pub attrs: &'static [&'static str],
    pub count_rule: CountRule,
}

/// The matching plan for `category`.
pub fn plan(category: Category) -> MatchPlan {
    let (primary, attrs, count_rule): (Primary, &'static [&'static str], CountRule) =
        match category {
            Category::Zone => (
                Primary::ById,
                &["volume", "spaces", "surfaces", "terminals"],
                CountRule::Lenient,
            ),
            Category::HvacSystem => (
                Primary::LinkSet,
                &["cooling_system.type", "heating_system.type"],
                CountRule::Strict,
            ),
            Category::Surface => (Primary::Attributes, &["area", "azimuth"], CountRule::Strict),
            Category::Terminal => (
                Primary::FollowLink,
                &[
                    "type",
                    "is_supply_ducted",
                    "heating_source",
                    "heating_capacity",
                    "cooling_capacity",
                    "primary_airflow",
                    "minimum_outdoor_airflow",
                ],
                CountRule::Strict,
            ),
            Category::Construction => (
                Primary::ExcessGenerated,
                &[
                    "exterior_walls",
                    "rooves",
                    "below_grade_surfaces",
                    "interior_surfaces",
                    "primary_layers_length",
                    "framing_layers_length",
                    "u_factor",
                    "c_factor",
                    "f_factor",
                ],
                CountRule::Lenient,
            ),
            Category::Material => (
                Primary::ExcessGenerated,
                &["thickness", "conductivity", "density", "specific_heat", "r_value"],
                CountRule::Lenient,
            ),
            Category::Boiler => (
                Primary::Attributes,
                &["draft_type", "energy_source_type"],
                CountRule::Strict,
            ),
            Category::Chiller => (
                Primary::Attributes,
                &["compressor_type", "energy_source_type"],
                CountRule::Strict,
            ),
            Category::HeatRejection => (
                Primary::Attributes,
                &["type", "fan_type", "fan_speed_control"],
                CountRule::Strict,
            ),
            Category::FluidLoop => (
                Primary::Attributes,
                &["type", "child_loops"],
                CountRule::Strict,
            ),
            Category::Pump => (Primary::FollowLink, &[], CountRule::Strict),
        };
    MatchPlan {
        primary,
        attrs,
        count_rule,
    }
}

/// Runs the matching chain for one category over candidates that are not yet
/// resolved in `map`.
pub fn match_category(
    category: Category,
    generated: &[Candidate<'_>],
    reference: &[Candidate<'_>],
    zones: Option<ZonePair<'_>>,
    map: &IdentityMap,
) -> CategoryMap {
    let generated: Vec<&Candidate<'_>> = generated
        .iter()
        .filter(|c| !map.contains_generated(&c.id))
        .collect();
    let reference: Vec<&Candidate<'_>> =
        reference.iter().filter(|c| !map.is_target(&c.id)).collect();

    if generated.is_empty() || reference.is_empty() {
        return CategoryMap::new();
    }
    if let ([only_generated], [only_reference]) = (generated.as_slice(), reference.as_slice()) {
        let mut mapping = CategoryMap::new();
        mapping.insert(only_generated.id.clone(), only_reference.id.clone());
        return mapping;
    }

    let plan = plan(category);
    let mut mapping = match plan.primary {
        Primary::Attributes => CategoryMap::new(),
        Primary::ById => match_by_id(&generated, &reference),
        Primary::LinkSet => match_by_link_set(&generated, &reference, map),
        Primary::FollowLink => match_by_link(&generated, &reference, map),
        Primary::ExcessGenerated => match_excess_generated(&generated, &reference, plan.attrs),
    };
    debug!(
        category = %category,
        primary = ?plan.primary,
        matched = mapping.len(),
        "primary strategy finished"
    );

    if plan.primary != Primary::ExcessGenerated && !plan.attrs.is_empty() {
        let rest_generated: Vec<&Candidate<'_>> = generated
            .iter()
            .copied()
            .filter(|c| !mapping.contains_key(&c.id))
            .collect();
        let rest_reference: Vec<&Candidate<'_>> = reference
            .iter()
            .copied()
            .filter(|c| !mapping.values().any(|r| *r == c.id))
            .collect();
        if !rest_generated.is_empty() && !rest_reference.is_empty() {
            mapping.extend(match_by_attributes(
                &rest_generated,
                &rest_reference,
                plan.attrs,
                zones,
            ));
        }
    }

    if mapping.is_empty() {
        mapping = match_by_id(&generated, &reference);
        debug!(category = %category, matched = mapping.len(), "fell back to id matching");
    }
    mapping
}

/// Outcome of reconciling two documents.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Reconciliation {
    pub map: IdentityMap,
    pub findings: Findings,
    /// `false` when zones could not be fully matched and later categories
    /// were skipped.
    pub complete: bool,
}

/// Builds the identity map between `generated` and `reference`.
pub fn reconcile(generated: &Value, reference: &Value) -> Reconciliation {
    let mut run = stages::Stages::new(generated, reference);
    let complete = match run.zones() {
        Some(zones) => {
            let hvac = run.hvac_systems(&zones);
            run.zone_contents(&zones, &hvac);
            run.constructions(&zones);
            run.materials(&zones);
            for category in [Category::Boiler, Category::Chiller, Category::HeatRejection] {
                run.plant(&zones, category);
            }
            let loops = run.fluid_loops(&zones);
            run.pumps(&loops);
            true
        }
        None => false,
    };
    let (map, findings) = run.finish();
    info!(
        pairs = map.len(),
        warnings = findings.warning_count(),
        errors = findings.error_count(),
        complete,
        "reconciliation finished"
    );
    Reconciliation {
        map,
        findings,
        complete,
    }
}
