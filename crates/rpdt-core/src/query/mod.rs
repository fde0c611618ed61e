//! Path queries over untyped JSON trees.
//!
//! A [`PathQuery`] is a dotted expression such as
//! `$.ruleset_model_descriptions[0].buildings[*].building_segments[*].zones[?(@.id == 'Z1')].surfaces[*].area`.
//! It is parsed once into [`Segment`]s, each holding an ordered list of [`Op`]s:
//!
//! - a leading key lookup when the segment starts with a bare name,
//! - `[*]` selects every element of a sequence,
//! - `[n]` selects element `n` of a sequence (empty when out of range),
//! - `[?(@.field == 'literal' and ...)]` keeps mappings whose fields equal
//!   every literal. Applied to a sequence it filters the elements.
//!
//! Parsing and evaluation are both total. Bracket content that is not one of
//! the forms above parses into an operation that selects nothing, and missing
//! keys, out-of-range indices and type mismatches collapse the affected branch
//! to an empty result. A query therefore never fails on a document whose shape
//! differs from what the query expects.
mod eval;
mod parse;

#[cfg(test)]
mod tests;

use std::fmt;

use serde_json::Value;

/// A parsed path query.
///
/// Queries are immutable values; evaluating one is a pure function of the
/// query and the tree it runs against.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathQuery {
    segments: Vec<Segment>,
}

/// One dot-separated component of a [`PathQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    ops: Vec<Op>,
}

/// An atomic step applied to every node of the working set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    /// Replace each mapping with the value stored under this key.
    Key(String),
    /// Select elements of each sequence.
    Index(IndexSel),
    /// Keep mappings satisfying every condition of the filter.
    Filter(Filter),
}

/// Which sequence elements an [`Op::Index`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSel {
    /// `[*]`
    All,
    /// `[n]`
    At(usize),
    /// Bracket content that is neither a wildcard, an index nor a filter.
    Nothing,
}

/// A conjunction of `@.field == 'literal'` tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Filter {
    conditions: Vec<Condition>,
}

/// One conjunct of a [`Filter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// The mapping's `field` is a string exactly equal to `literal`.
    Equals { field: String, literal: String },
    /// Text that could not be read as an equality test; never satisfied.
    Malformed(String),
}

impl PathQuery {
    /// Parses `text` into a query. Never fails.
    pub fn parse(text: &str) -> Self {
        parse::parse_query(text)
    }

    /// Builds a query from already-parsed segments.
    pub fn from_segments(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// The segments in evaluation order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Every node selected by this query, in document order.
    pub fn evaluate<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        eval::evaluate(&self.segments, root)
    }

    /// The first node selected by this query, if any.
    pub fn find_one<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        self.evaluate(root).into_iter().next()
    }

    /// Name of the last key looked up by this query, e.g. `area` for
    /// `$.zones[*].surfaces[*].area`. Empty for the root query.
    pub fn data_element(&self) -> &str {
        self.segments
            .iter()
            .rev()
            .find_map(Segment::key)
            .unwrap_or_default()
    }

    /// The first `end` segments as a query of their own.
    pub fn prefix(&self, end: usize) -> Self {
        let end = end.min(self.segments.len());
        Self::from_segments(self.segments[..end].to_vec())
    }

    /// Segments from `start` onwards, evaluated relative to whatever node the
    /// caller supplies as root.
    pub fn suffix(&self, start: usize) -> Self {
        let start = start.min(self.segments.len());
        Self::from_segments(self.segments[start..].to_vec())
    }

    /// Index of the deepest segment whose key satisfies `pred`.
    pub fn rposition_key(&self, pred: impl Fn(&str) -> bool) -> Option<usize> {
        self.segments
            .iter()
            .rposition(|seg| seg.key().is_some_and(&pred))
    }

    /// Copy of this query with `filter` applied to the last segment in place of
    /// any trailing index selection.
    ///
    /// `$.zones[*].surfaces[*]` filtered on `classification == 'WALL'` becomes
    /// `$.zones[*].surfaces[?(@.classification == 'WALL')]`.
    pub fn filtered(&self, filter: Filter) -> Self {
        let mut segments = self.segments.clone();
        match segments.last_mut() {
            Some(last) => last.replace_selection(filter),
            None => segments.push(Segment {
                ops: vec![Op::Filter(filter)],
            }),
        }
        Self::from_segments(segments)
    }

    /// Copy of this query whose segment at `index` selects only the element
    /// with `id == id`. The segment's index ops are dropped; an existing
    /// filter is kept and gains the id test as another conjunct.
    pub fn with_id_at(&self, index: usize, id: &str) -> Self {
        let mut segments = self.segments.clone();
        if let Some(seg) = segments.get_mut(index) {
            seg.select_id(id);
        }
        Self::from_segments(segments)
    }
}

impl fmt::Display for PathQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("$")?;
        for seg in &self.segments {
            if seg.key().is_some() {
                f.write_str(".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl Segment {
    /// Builds a segment from raw operations.
    pub fn new(ops: Vec<Op>) -> Self {
        Self { ops }
    }

    pub fn ops(&self) -> &[Op] {
        &self.ops
    }

    /// The key looked up by this segment, if it has one.
    pub fn key(&self) -> Option<&str> {
        self.ops.iter().find_map(|op| match op {
            Op::Key(k) => Some(k.as_str()),
            Op::Index(_) | Op::Filter(_) => None,
        })
    }

    fn replace_selection(&mut self, filter: Filter) {
        self.ops.retain(|op| matches!(op, Op::Key(_)));
        self.ops.push(Op::Filter(filter));
    }

    fn select_id(&mut self, id: &str) {
        self.ops.retain(|op| !matches!(op, Op::Index(_)));
        let existing = self.ops.iter_mut().rev().find_map(|op| match op {
            Op::Filter(filter) => Some(filter),
            Op::Key(_) | Op::Index(_) => None,
        });
        match existing {
            Some(filter) => filter.conditions.insert(
                0,
                Condition::Equals {
                    field: "id".to_owned(),
                    literal: id.to_owned(),
                },
            ),
            None => self.ops.push(Op::Filter(Filter::equals("id", id))),
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            match op {
                Op::Key(k) => f.write_str(k)?,
                Op::Index(IndexSel::All) => f.write_str("[*]")?,
                Op::Index(IndexSel::At(n)) => write!(f, "[{n}]")?,
                Op::Index(IndexSel::Nothing) => f.write_str("[!]")?,
                Op::Filter(filter) => write!(f, "[?({filter})]")?,
            }
        }
        Ok(())
    }
}

impl Filter {
    /// A filter with a single `field == literal` test.
    pub fn equals(field: &str, literal: &str) -> Self {
        Self {
            conditions: vec![Condition::Equals {
                field: field.to_owned(),
                literal: literal.to_owned(),
            }],
        }
    }

    /// Adds another `field == literal` conjunct.
    #[must_use]
    pub fn and(mut self, field: &str, literal: &str) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.to_owned(),
            literal: literal.to_owned(),
        });
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns `true` when `node` is a mapping satisfying every condition.
    ///
    /// A filter without conditions accepts every mapping.
    pub fn matches(&self, node: &Value) -> bool {
        let Some(map) = node.as_object() else {
            return false;
        };
        self.conditions.iter().all(|cond| match cond {
            Condition::Equals { field, literal } => {
                map.get(field).and_then(Value::as_str) == Some(literal.as_str())
            }
            Condition::Malformed(_) => false,
        })
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cond) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            match cond {
                Condition::Equals { field, literal } => {
                    let quote = if literal.contains('\'') { '"' } else { '\'' };
                    write!(f, "@.{field} == {quote}{literal}{quote}")?;
                }
                Condition::Malformed(text) => f.write_str(text)?,
            }
        }
        Ok(())
    }
}

/// Evaluates `query` against `root`. Shorthand for parsing then evaluating.
pub fn find_all<'a>(query: &str, root: &'a Value) -> Vec<&'a Value> {
    PathQuery::parse(query).evaluate(root)
}

/// First match of `query` against `root`, or `default` when nothing matches.
pub fn find_one<'a>(query: &str, root: &'a Value, default: &'a Value) -> &'a Value {
    PathQuery::parse(query).find_one(root).unwrap_or(default)
}

/// Every node under `query` satisfying all `field == literal` pairs.
///
/// `query` addresses a collection (`$.zones[*].surfaces[*]` or
/// `$.zones[*].surfaces`); its trailing index is replaced by the filter.
pub fn find_all_with_filters<'a>(
    query: &str,
    root: &'a Value,
    filters: &[(&str, &str)],
) -> Vec<&'a Value> {
    let filter = Filter {
        conditions: filters
            .iter()
            .map(|(field, literal)| Condition::Equals {
                field: (*field).to_owned(),
                literal: (*literal).to_owned(),
            })
            .collect(),
    };
    PathQuery::parse(query).filtered(filter).evaluate(root)
}
