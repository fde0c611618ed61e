use serde_json::Value;

use super::{IndexSel, Op, Segment};

/// Folds every segment's operations over a working set that starts as
/// `[root]`. A branch that cannot continue simply drops out of the set.
pub(super) fn evaluate<'a>(segments: &[Segment], root: &'a Value) -> Vec<&'a Value> {
    let mut working = vec![root];
    for op in segments.iter().flat_map(|seg| seg.ops.iter()) {
        if working.is_empty() {
            break;
        }
        working = step(op, working);
    }
    working
}

fn step<'a>(op: &Op, working: Vec<&'a Value>) -> Vec<&'a Value> {
    match op {
        Op::Key(key) => working
            .into_iter()
            .filter_map(|node| node.as_object().and_then(|map| map.get(key)))
            .collect(),
        Op::Index(sel) => working
            .into_iter()
            .filter_map(Value::as_array)
            .flat_map(|items| select(*sel, items))
            .collect(),
        Op::Filter(filter) => working
            .into_iter()
            .flat_map(|node| -> Vec<&'a Value> {
                if let Value::Array(items) = node {
                    items.iter().filter(|v| filter.matches(v)).collect()
                } else if filter.matches(node) {
                    vec![node]
                } else {
                    Vec::new()
                }
            })
            .collect(),
    }
}

fn select(sel: IndexSel, items: &[Value]) -> Vec<&Value> {
    match sel {
        IndexSel::All => items.iter().collect(),
        IndexSel::At(n) => items.get(n).into_iter().collect(),
        IndexSel::Nothing => Vec::new(),
    }
}
