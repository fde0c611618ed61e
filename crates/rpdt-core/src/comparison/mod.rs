//! Grading a generated document against its reference, one spec entry at a
//! time.
//!
//! Each [`TestSpecEntry`](crate::spec::TestSpecEntry) becomes one
//! [`SpecificationTest`](crate::report::SpecificationTest). Entries naming a
//! special case are handed to the derived-value rules in [`special`]. All other
//! entries are aligned first:
//!
//! - a path through a reconciled collection (`zones[*]`, `surfaces[*]`,
//!   `pumps[*]`...) is *ordered*: every generated entity of that collection is
//!   paired with the reference entity the identity map assigns to it, and the
//!   rest of the path is evaluated under each of the two;
//! - any other path is *unordered*: the parents of the compared key are
//!   paired by position.
//!
//! Aligned pairs are then graded by [`values`]. Results are appended in the
//! generated document's order.
mod align;
mod engine;
mod special;
mod values;


pub use align::{Alignment, alignment};
pub use engine::{compare, compare_entry};
