use std::collections::HashMap;

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::document::Category;

/// Matches found by one strategy run, generated id to reference id.
pub type CategoryMap = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    reference: String,
    category: Category,
}

/// Why a pairing was not committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The generated id is already paired with a different reference id.
    GeneratedTaken { existing: String },
    /// The reference id is already the target of another generated id.
    ReferenceTaken { by: String },
}

/// Injective mapping from generated entity ids to reference entity ids.
///
/// Pairings are only ever added. The first pairing committed for a generated
/// id wins, and a reference id can be the target of one generated id only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityMap {
    forward: IndexMap<String, Entry>,
    reverse: HashMap<String, String>,
}

impl IdentityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference id paired with `generated`.
    pub fn get(&self, generated: &str) -> Option<&str> {
        self.forward.get(generated).map(|e| e.reference.as_str())
    }

    /// Category under which `generated` was paired.
    pub fn category_of(&self, generated: &str) -> Option<Category> {
        self.forward.get(generated).map(|e| e.category)
    }

    pub fn contains_generated(&self, generated: &str) -> bool {
        self.forward.contains_key(generated)
    }

    /// Whether some generated id already maps onto `reference`.
    pub fn is_target(&self, reference: &str) -> bool {
        self.reverse.contains_key(reference)
    }

    /// Adds one pairing.
    ///
    /// Re-committing an identical pairing is accepted and changes nothing.
    pub fn insert(
        &mut self,
        category: Category,
        generated: &str,
        reference: &str,
    ) -> Result<(), Rejection> {
        if let Some(existing) = self.forward.get(generated) {
            if existing.reference == reference {
                return Ok(());
            }
            return Err(Rejection::GeneratedTaken {
                existing: existing.reference.clone(),
            });
        }
        if let Some(by) = self.reverse.get(reference) {
            return Err(Rejection::ReferenceTaken { by: by.clone() });
        }
        self.forward.insert(
            generated.to_owned(),
            Entry {
                reference: reference.to_owned(),
                category,
            },
        );
        self.reverse
            .insert(reference.to_owned(), generated.to_owned());
        Ok(())
    }

    /// Pairings in commit order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.forward
            .iter()
            .map(|(g, e)| (g.as_str(), e.reference.as_str()))
    }

    /// Pairings committed under `category`, in commit order.
    pub fn iter_category(&self, category: Category) -> impl Iterator<Item = (&str, &str)> {
        self.forward
            .iter()
            .filter(move |(_, e)| e.category == category)
            .map(|(g, e)| (g.as_str(), e.reference.as_str()))
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

impl Serialize for IdentityMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.forward.len()))?;
        for (generated, reference) in self.iter() {
            map.serialize_entry(generated, reference)?;
        }
        map.end()
    }
}
