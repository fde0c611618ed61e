use serde_json::{Value, json};
use tracing::debug;

use crate::attributes::ZonePair;
use crate::document::{
    Category, SurfaceKind, construction_usage, entities, entity_id, hvac_service_index,
    referenced_layer_ids, zone_surfaces,
};
use crate::findings::Findings;
use crate::query::find_all;

use super::identity_map::{CategoryMap, IdentityMap, Rejection};
use super::strategies::{Candidate, candidates};
use super::{CountRule, match_category, plan};

/// Proof that every reference zone is matched. Carries the zone pairs in
/// generated-document order.
pub(super) struct ZonesResolved<'d> {
    pairs: Vec<(&'d Value, &'d Value)>,
}

/// Proof that the HVAC system stage has run.
pub(super) struct HvacResolved(());

/// Proof that the fluid loop stage has run.
pub(super) struct LoopsResolved(());

/// Shared state of one reconciliation run.
pub(super) struct Stages<'d> {
    generated: &'d Value,
    reference: &'d Value,
    map: IdentityMap,
    findings: Findings,
}

impl<'d> Stages<'d> {
    pub(super) fn new(generated: &'d Value, reference: &'d Value) -> Self {
        Self {
            generated,
            reference,
            map: IdentityMap::new(),
            findings: Findings::new(),
        }
    }

    pub(super) fn finish(self) -> (IdentityMap, Findings) {
        (self.map, self.findings)
    }

    /// Applies a category's count rule. Returns `false` when the category
    /// must be skipped.
    fn check_counts(&mut self, category: Category, generated: usize, reference: usize) -> bool {
        if generated == reference {
            return true;
        }
        match plan(category).count_rule {
            CountRule::Strict => {
                self.findings.error(format!(
                    "{} count mismatch. Expected: {reference}; got: {generated}",
                    category.singular()
                ));
                false
            }
            CountRule::Lenient => {
                self.findings.warn(format!(
                    "{} count mismatch. Expected: {reference}; got: {generated}. Verify the object mapping.",
                    category.label()
                ));
                true
            }
        }
    }

    /// Matches and commits one batch of candidates, then reports whichever
    /// generated candidates remain unmatched.
    fn resolve(
        &mut self,
        category: Category,
        generated: &[Candidate<'_>],
        reference: &[Candidate<'_>],
        zones: Option<ZonePair<'_>>,
    ) {
        let mapping = match_category(category, generated, reference, zones, &self.map);
        self.commit(category, mapping);
        let unmatched: Vec<&str> = generated
            .iter()
            .map(|c| c.id.as_str())
            .filter(|id| !self.map.contains_generated(id))
            .collect();
        if !unmatched.is_empty() {
            self.findings.warn(format!(
                "Unmatched {} objects: {}",
                category.label(),
                unmatched.join(",")
            ));
        }
    }

    fn commit(&mut self, category: Category, mapping: CategoryMap) {
        for (generated, reference) in mapping {
            match self.map.insert(category, &generated, &reference) {
                Ok(()) => {}
                Err(Rejection::GeneratedTaken { existing }) => self.findings.warn(format!(
                    "Conflicting {} match for '{generated}': already matched to '{existing}', ignoring '{reference}'",
                    category.singular()
                )),
                Err(Rejection::ReferenceTaken { by }) => self.findings.warn(format!(
                    "Reference {} '{reference}' is already matched to '{by}'; '{generated}' left unmatched",
                    category.singular()
                )),
            }
        }
    }

    /// Zones. Fails unless every reference zone ends up matched.
    pub(super) fn zones(&mut self) -> Option<ZonesResolved<'d>> {
        let generated_zones = entities(self.generated, Category::Zone);
        let reference_zones = entities(self.reference, Category::Zone);
        self.check_counts(Category::Zone, generated_zones.len(), reference_zones.len());

        let generated = candidates(generated_zones.iter().copied());
        let reference = candidates(reference_zones.iter().copied());
        self.resolve(Category::Zone, &generated, &reference, None);

        let covered = reference_zones
            .iter()
            .filter_map(|z| entity_id(z))
            .all(|id| self.map.is_target(id));
        if !covered {
            let listing: Vec<String> = reference_zones
                .iter()
                .filter_map(|z| entity_id(z))
                .map(|id| format!("- {id}"))
                .collect();
            self.findings.error(format!(
                "Could not match zones between the generated and reference files. Try to better align your modeled zone names with the correct answer file's zone naming conventions.\n{}",
                listing.join("\n")
            ));
            return None;
        }

        let pairs = generated_zones
            .into_iter()
            .filter_map(|gz| {
                let reference_id = self.map.get(entity_id(gz)?)?;
                let rz = reference_zones
                    .iter()
                    .copied()
                    .find(|z| entity_id(z) == Some(reference_id))?;
                Some((gz, rz))
            })
            .collect();
        debug!(pairs = self.map.len(), "zones resolved");
        Some(ZonesResolved { pairs })
    }

    /// HVAC systems, keyed by the zones their terminals serve.
    pub(super) fn hvac_systems(&mut self, _zones: &ZonesResolved<'d>) -> HvacResolved {
        let generated = hvac_candidates(self.generated);
        let reference = hvac_candidates(self.reference);
        if self.check_counts(Category::HvacSystem, generated.len(), reference.len()) {
            self.resolve(Category::HvacSystem, &generated, &reference, None);
        }
        debug!("hvac systems resolved");
        HvacResolved(())
    }

    /// Surfaces by subtype and terminals, zone pair by zone pair.
    pub(super) fn zone_contents(&mut self, zones: &ZonesResolved<'d>, _hvac: &HvacResolved) {
        for &(gz, rz) in &zones.pairs {
            let (Some(gz_id), Some(rz_id)) = (entity_id(gz), entity_id(rz)) else {
                continue;
            };
            let pair = ZonePair {
                generated: gz_id,
                reference: rz_id,
            };

            for kind in SurfaceKind::ALL {
                let generated = candidates(zone_surfaces(self.generated, gz, kind));
                let reference = candidates(zone_surfaces(self.reference, rz, kind));
                if generated.len() != reference.len() {
                    self.findings.error(format!(
                        "{} surface count mismatch in zone id '{gz_id}'. Expected: {}; got: {}",
                        kind.label(),
                        reference.len(),
                        generated.len()
                    ));
                    continue;
                }
                self.resolve(Category::Surface, &generated, &reference, Some(pair));
            }

            let generated: Vec<Candidate<'_>> = candidates(find_all("$.terminals[*]", gz))
                .into_iter()
                .map(|c| c.linked_by(HVAC_LINK))
                .collect();
            let reference: Vec<Candidate<'_>> = candidates(find_all("$.terminals[*]", rz))
                .into_iter()
                .map(|c| c.linked_by(HVAC_LINK))
                .collect();
            if generated.len() != reference.len() {
                self.findings.error(format!(
                    "Terminal count mismatch in zone id '{gz_id}'. Expected: {}; got: {}",
                    reference.len(),
                    generated.len()
                ));
                continue;
            }
            self.resolve(Category::Terminal, &generated, &reference, Some(pair));
        }
    }

    /// Constructions, compared on how surfaces use them.
    pub(super) fn constructions(&mut self, _zones: &ZonesResolved<'d>) {
        let to_candidates = |doc: &Value| -> Vec<Candidate<'static>> {
            construction_usage(doc)
                .iter()
                .map(|(id, usage)| Candidate::owned(id.clone(), usage.to_entity(id)))
                .collect()
        };
        let generated = to_candidates(self.generated);
        let reference = to_candidates(self.reference);
        self.check_counts(Category::Construction, generated.len(), reference.len());
        self.resolve(Category::Construction, &generated, &reference, None);
    }

    /// Materials. Generated materials no construction layer refers to are
    /// ignored.
    pub(super) fn materials(&mut self, _zones: &ZonesResolved<'d>) {
        let used = referenced_layer_ids(self.generated);
        let generated: Vec<Candidate<'_>> = candidates(entities(self.generated, Category::Material))
            .into_iter()
            .filter(|c| used.contains(&c.id))
            .collect();
        let reference = candidates(entities(self.reference, Category::Material));
        self.check_counts(Category::Material, generated.len(), reference.len());
        self.resolve(Category::Material, &generated, &reference, None);
    }

    /// Boilers, chillers and heat rejections.
    pub(super) fn plant(&mut self, _zones: &ZonesResolved<'d>, category: Category) {
        self.simple(category);
    }

    /// Fluid loops including child loops.
    pub(super) fn fluid_loops(&mut self, _zones: &ZonesResolved<'d>) -> LoopsResolved {
        self.simple(Category::FluidLoop);
        LoopsResolved(())
    }

    /// Pumps, by the loop they serve.
    pub(super) fn pumps(&mut self, _loops: &LoopsResolved) {
        let link = |doc: &'d Value| -> Vec<Candidate<'d>> {
            candidates(entities(doc, Category::Pump))
                .into_iter()
                .map(|c| c.linked_by("loop_or_piping"))
                .collect()
        };
        let generated = link(self.generated);
        let reference = link(self.reference);
        if self.check_counts(Category::Pump, generated.len(), reference.len()) {
            self.resolve(Category::Pump, &generated, &reference, None);
        }
    }

    fn simple(&mut self, category: Category) {
        let generated = candidates(entities(self.generated, category));
        let reference = candidates(entities(self.reference, category));
        if self.check_counts(category, generated.len(), reference.len()) {
            self.resolve(category, &generated, &reference, None);
        }
        debug!(category = %category, "category resolved");
    }
}

const HVAC_LINK: &str = "served_by_heating_ventilating_air_conditioning_system";

/// One candidate per HVAC system referenced by a terminal. Attributes come
/// from the system's own node when the document has one.
fn hvac_candidates(doc: &Value) -> Vec<Candidate<'_>> {
    let systems = entities(doc, Category::HvacSystem);
    hvac_service_index(doc)
        .into_iter()
        .map(|(id, served)| {
            let node = systems.iter().copied().find(|s| entity_id(s) == Some(id.as_str()));
            let candidate = match node.and_then(Candidate::borrowed) {
                Some(candidate) => candidate,
                None => {
                    let attrs = json!({ "id": id });
                    Candidate::owned(id, attrs)
                }
            };
            candidate.with_links(served.zones)
        })
        .collect()
}
