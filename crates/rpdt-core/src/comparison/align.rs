use serde_json::Value;

use crate::document::{Category, entity_id};
use crate::findings::Findings;
use crate::query::{Op, PathQuery};
use crate::reconcile::IdentityMap;

/// How a path's values are paired across the two documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Through the identity map, at the segment selecting `category`.
    Ordered { collection: usize, category: Category },
    /// By position among the parents of the compared key.
    Unordered,
}

/// Picks the alignment for `path`.
///
/// The deepest segment that indexes or filters a reconciled collection decides
/// it; a bare key such as `zones` in `$.building_segments[*].zones` does not
/// count, since it selects the list itself rather than its entities.
pub fn alignment(path: &PathQuery) -> Alignment {
    path.segments()
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, seg)| {
            let category = Category::from_collection_key(seg.key()?)?;
            let selects = seg.ops().iter().any(|op| !matches!(op, Op::Key(_)));
            (selects && category.is_aligned()).then_some(Alignment::Ordered {
                collection: index,
                category,
            })
        })
        .unwrap_or(Alignment::Unordered)
}

/// One generated value and its reference counterpart.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Aligned<'a> {
    pub generated_id: Option<String>,
    pub reference_id: Option<String>,
    /// How the pair is named in diagnostics.
    pub label: String,
    pub generated: Option<&'a Value>,
    pub reference: Option<&'a Value>,
}

/// `null` counts as absent.
fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// Pairs every generated entity at `collection` with its mapped reference
/// entity. Entities without a counterpart are reported and left out; their
/// number is returned alongside the pairs.
pub(super) fn ordered<'a>(
    path: &PathQuery,
    collection: usize,
    category: Category,
    generated: &'a Value,
    reference: &'a Value,
    map: &IdentityMap,
    findings: &mut Findings,
) -> (Vec<Aligned<'a>>, usize) {
    let rest = path.suffix(collection + 1);
    let mut aligned = Vec::new();
    let mut unmapped = 0;
    for entity in path.prefix(collection + 1).evaluate(generated) {
        let Some(id) = entity_id(entity) else {
            continue;
        };
        let Some(reference_id) = map.get(id) else {
            findings.warn(format!(
                "Could not map {} '{id}' to a reference object",
                category.singular()
            ));
            unmapped += 1;
            continue;
        };
        let reference_value = path.with_id_at(collection, reference_id).find_one(reference);
        aligned.push(Aligned {
            generated_id: Some(id.to_owned()),
            reference_id: Some(reference_id.to_owned()),
            label: id.to_owned(),
            generated: present(rest.find_one(entity)),
            reference: present(reference_value),
        });
    }
    (aligned, unmapped)
}

fn ends_in_selection(path: &PathQuery) -> bool {
    path
        .segments()
        .last()
        .is_some_and(|seg| seg.ops().iter().any(|op| !matches!(op, Op::Key(_))))
}

/// A value found under one parent, before pairing.
struct Slot<'a> {
    parent_id: Option<&'a str>,
    label: String,
    value: Option<&'a Value>,
}

/// Values at `path` in `doc`, one slot per parent of the last segment.
///
/// When the last segment indexes or filters, every selected element gets its
/// own slot, labelled by its parent and position within it.
fn slots<'a>(path: &PathQuery, doc: &'a Value, selects: bool) -> Vec<Slot<'a>> {
    let last = path.segments().len().saturating_sub(1);
    let leaf = path.suffix(last);
    let mut slots = Vec::new();
    for (i, parent) in path.prefix(last).evaluate(doc).into_iter().enumerate() {
        let parent_id = entity_id(parent);
        let parent_label = parent_id.map_or_else(|| format!("[{i}]"), str::to_owned);
        if selects {
            for (j, value) in leaf.evaluate(parent).into_iter().enumerate() {
                slots.push(Slot {
                    parent_id,
                    label: format!("{parent_label}[{j}]"),
                    value: present(Some(value)),
                });
            }
        } else {
            slots.push(Slot {
                parent_id,
                label: parent_label,
                value: present(leaf.find_one(parent)),
            });
        }
    }
    slots
}

/// Pairs the values at `path` by position.
///
/// Key-terminated paths pair one value per generated parent. Paths ending in
/// an index or filter pair the selected elements themselves, and reference
/// elements beyond the generated ones are kept with no generated value.
pub(super) fn unordered<'a>(
    path: &PathQuery,
    generated: &'a Value,
    reference: &'a Value,
    map: &IdentityMap,
) -> Vec<Aligned<'a>> {
    let selects = ends_in_selection(path);
    let generated_slots = slots(path, generated, selects);
    let reference_slots = slots(path, reference, selects);
    let len = if selects {
        generated_slots.len().max(reference_slots.len())
    } else {
        generated_slots.len()
    };
    (0..len)
        .filter_map(|i| {
            let gen_slot = generated_slots.get(i);
            let ref_slot = reference_slots.get(i);
            let label = gen_slot.or(ref_slot)?.label.clone();
            let generated_id = gen_slot.and_then(|slot| slot.parent_id);
            Some(Aligned {
                generated_id: generated_id.map(str::to_owned),
                reference_id: generated_id.and_then(|id| map.get(id)).map(str::to_owned),
                label,
                generated: gen_slot.and_then(|slot| slot.value),
                reference: ref_slot.and_then(|slot| slot.value),
            })
        })
        .collect()
}
