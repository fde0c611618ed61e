//! Matching strategies shared by every category.
//!
//! Each strategy takes the still-unresolved generated and reference
//! candidates of one category and returns a [`CategoryMap`] that is injective
//! on its own. Committing into the document-wide identity map happens in the
//! stage runner.
use std::borrow::Cow;
use std::collections::{BTreeSet, HashSet};

use serde_json::Value;

use crate::attributes::{ZonePair, agreement_score};
use crate::document::entity_id;

use super::identity_map::{CategoryMap, IdentityMap};

/// Minimum normalized similarity for two ids to be considered the same.
pub const ID_SIMILARITY_THRESHOLD: f64 = 0.4;

/// One object offered for matching.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate<'a> {
    pub id: String,
    /// Attributes scored by the attribute strategies.
    pub attrs: Cow<'a, Value>,
    /// Ids of other entities this one points at (served zones, owning HVAC
    /// system, serving loop).
    pub links: Vec<String>,
}

impl<'a> Candidate<'a> {
    /// Wraps a document node. `None` when the node has no string `id`.
    pub fn borrowed(node: &'a Value) -> Option<Self> {
        Some(Self {
            id: entity_id(node)?.to_owned(),
            attrs: Cow::Borrowed(node),
            links: Vec::new(),
        })
    }

    /// A candidate whose attributes were derived rather than read.
    pub fn owned(id: impl Into<String>, attrs: Value) -> Self {
        Self {
            id: id.into(),
            attrs: Cow::Owned(attrs),
            links: Vec::new(),
        }
    }

    /// Records the string found under `key` as this candidate's link.
    #[must_use]
    pub fn linked_by(mut self, key: &str) -> Self {
        if let Some(target) = self.attrs.get(key).and_then(Value::as_str) {
            if !target.is_empty() {
                self.links = vec![target.to_owned()];
            }
        }
        self
    }

    #[must_use]
    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = links;
        self
    }
}

/// Candidates for every node that carries an `id`, in order.
pub fn candidates<'a>(nodes: impl IntoIterator<Item = &'a Value>) -> Vec<Candidate<'a>> {
    nodes.into_iter().filter_map(Candidate::borrowed).collect()
}

/// Fuzzy id matching.
///
/// Each generated id takes its most similar reference id (first wins on a
/// tie) provided the similarity reaches [`ID_SIMILARITY_THRESHOLD`]. When that
/// best reference id is already taken the generated id stays unmatched.
pub fn match_by_id(generated: &[&Candidate<'_>], reference: &[&Candidate<'_>]) -> CategoryMap {
    let mut mapping = CategoryMap::new();
    let mut used: HashSet<&str> = HashSet::new();
    for target in generated {
        let mut best: Option<(&str, f64)> = None;
        for candidate in reference {
            let similarity = strsim::normalized_levenshtein(&target.id, &candidate.id);
            if similarity < ID_SIMILARITY_THRESHOLD {
                continue;
            }
            if best.is_none_or(|(_, s)| similarity > s) {
                best = Some((candidate.id.as_str(), similarity));
            }
        }
        if let Some((id, _)) = best {
            if used.insert(id) {
                mapping.insert(target.id.clone(), id.to_owned());
            }
        }
    }
    mapping
}

/// Best-effort attribute matching.
///
/// Generated candidates are processed in order. Each scores every reference
/// candidate not yet taken and keeps the highest score (first wins on a
/// tie), even when that score is zero.
pub fn match_by_attributes(
    generated: &[&Candidate<'_>],
    reference: &[&Candidate<'_>],
    attrs: &[&str],
    zones: Option<ZonePair<'_>>,
) -> CategoryMap {
    let mut mapping = CategoryMap::new();
    let mut used: HashSet<&str> = HashSet::new();
    for target in generated {
        let mut best: Option<(&str, usize)> = None;
        for candidate in reference.iter().filter(|c| !used.contains(c.id.as_str())) {
            let score = agreement_score(&target.attrs, &candidate.attrs, attrs, zones);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate.id.as_str(), score));
            }
        }
        if let Some((id, _)) = best {
            used.insert(id);
            mapping.insert(target.id.clone(), id.to_owned());
        }
    }
    mapping
}

/// A scored `(generated, reference)` pairing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredPair {
    pub generated: String,
    pub reference: String,
    pub score: usize,
}

/// Greedy global assignment: highest score first, no id used twice.
///
/// Pairs with equal scores keep their input order. Generated ids that find no
/// free partner are left out.
pub fn greedy_by_score(mut pairs: Vec<ScoredPair>) -> CategoryMap {
    pairs.sort_by(|a, b| b.score.cmp(&a.score));
    let mut mapping = CategoryMap::new();
    let mut used_reference: HashSet<String> = HashSet::new();
    for pair in pairs {
        if mapping.contains_key(&pair.generated) || used_reference.contains(&pair.reference) {
            continue;
        }
        used_reference.insert(pair.reference.clone());
        mapping.insert(pair.generated, pair.reference);
    }
    mapping
}

/// Attribute matching for categories where generated objects may outnumber
/// reference objects. Surplus generated objects stay unmatched.
pub fn match_excess_generated(
    generated: &[&Candidate<'_>],
    reference: &[&Candidate<'_>],
    attrs: &[&str],
) -> CategoryMap {
    let pairs = generated
        .iter()
        .flat_map(|g| {
            reference.iter().map(move |r| ScoredPair {
                generated: g.id.clone(),
                reference: r.id.clone(),
                score: agreement_score(&g.attrs, &r.attrs, attrs, None),
            })
        })
        .collect();
    greedy_by_score(pairs)
}

/// Follows a link through the identity map.
///
/// A generated candidate linked to `X` pairs with the first free reference
/// candidate linked to whatever `X` is mapped to.
pub fn match_by_link(
    generated: &[&Candidate<'_>],
    reference: &[&Candidate<'_>],
    map: &IdentityMap,
) -> CategoryMap {
    let mut mapping = CategoryMap::new();
    let mut used: HashSet<&str> = HashSet::new();
    for target in generated {
        let Some(resolved) = target.links.first().and_then(|link| map.get(link)) else {
            continue;
        };
        let found = reference.iter().find(|c| {
            !used.contains(c.id.as_str()) && c.links.first().map(String::as_str) == Some(resolved)
        });
        if let Some(candidate) = found {
            used.insert(candidate.id.as_str());
            mapping.insert(target.id.clone(), candidate.id.clone());
        }
    }
    mapping
}

/// Matches candidates whose link sets correspond exactly once translated
/// through the identity map (an HVAC system by the set of zones it serves).
///
/// A generated candidate with any untranslatable link is skipped. When two
/// reference candidates share a link set the first one is used.
pub fn match_by_link_set(
    generated: &[&Candidate<'_>],
    reference: &[&Candidate<'_>],
    map: &IdentityMap,
) -> CategoryMap {
    let mut by_set: Vec<(BTreeSet<&str>, &str)> = Vec::new();
    for candidate in reference {
        let set: BTreeSet<&str> = candidate.links.iter().map(String::as_str).collect();
        if !by_set.iter().any(|(s, _)| *s == set) {
            by_set.push((set, candidate.id.as_str()));
        }
    }

    let mut mapping = CategoryMap::new();
    let mut used: HashSet<&str> = HashSet::new();
    for target in generated {
        let translated: Option<BTreeSet<&str>> =
            target.links.iter().map(|link| map.get(link)).collect();
        let Some(translated) = translated else {
            continue;
        };
        let hit = by_set
            .iter()
            .find(|(set, _)| *set == translated)
            .map(|(_, id)| *id);
        if let Some(id) = hit {
            if used.insert(id) {
                mapping.insert(target.id.clone(), id.to_owned());
            }
        }
    }
    mapping
}
