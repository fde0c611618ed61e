//! Property-based tests for the path evaluator and the reconciler.
//!
//! The evaluator must be total and deterministic over arbitrary trees and
//! query text; the identity map must stay injective whatever the two
//! documents look like.
#![allow(clippy::expect_used)]

use std::collections::{BTreeMap, BTreeSet, HashSet};

use proptest::prelude::*;
use rpdt_core::{PathQuery, reconcile};
use serde_json::{Map, Value, json};

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-100i32..100).prop_map(|n| json!(n)),
        "[a-c]{0,3}".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]|id", inner, 0..4)
                .prop_map(|m: BTreeMap<String, Value>| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Query text assembled from well-formed and malformed segment fragments.
fn arb_query_text() -> impl Strategy<Value = String> {
    let fragment = prop::sample::select(vec![
        "a",
        "b",
        "c",
        "a[*]",
        "b[0]",
        "c[2]",
        "a[?(@.b == 'a')]",
        "b[?(@.a=='b' and @.id == \"c\")]",
        "c[?(@.a == 'x' && @.b == 'y')]",
        "[*]",
        "a[",
        "b[zz]",
        "c]",
        "a[?(@.b ==",
        "'q.]'",
        "",
    ]);
    prop::collection::vec(fragment, 0..6).prop_map(|parts| format!("$.{}", parts.join(".")))
}

fn zone_doc(zones: &[(String, u8, Vec<(u8, u8)>)]) -> Value {
    let zones: Vec<Value> = zones
        .iter()
        .map(|(id, volume, surfaces)| {
            let surfaces: Vec<Value> = surfaces
                .iter()
                .enumerate()
                .map(|(j, (area, azimuth))| {
                    json!({
                        "id": format!("{id}-s{j}"),
                        "classification": "WALL",
                        "adjacent_to": "EXTERIOR",
                        "area": f64::from(*area),
                        "azimuth": f64::from(*azimuth) * 90.0,
                    })
                })
                .collect();
            json!({"id": id, "volume": volume, "surfaces": surfaces})
        })
        .collect();
    let mut rmd = Map::new();
    rmd.insert(
        "buildings".to_owned(),
        json!([{"id": "B", "building_segments": [{"id": "BS", "zones": zones}]}]),
    );
    json!({"ruleset_model_descriptions": [Value::Object(rmd)]})
}

fn arb_zones() -> impl Strategy<Value = Vec<(String, u8, Vec<(u8, u8)>)>> {
    prop::collection::btree_set("[a-e]{1,4}", 1..5).prop_flat_map(|ids: BTreeSet<String>| {
        let n = ids.len();
        (
            Just(ids.into_iter().collect::<Vec<_>>()),
            prop::collection::vec(
                (0u8..3, prop::collection::vec((1u8..4, 0u8..4), 0..4)),
                n,
            ),
        )
            .prop_map(|(ids, attrs)| {
                ids.into_iter()
                    .zip(attrs)
                    .map(|(id, (volume, surfaces))| (id, volume, surfaces))
                    .collect()
            })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Arbitrary query text parses and evaluates without panicking.
    #[test]
    fn evaluator_is_total(tree in arb_json(), text in any::<String>()) {
        let query = PathQuery::parse(&text);
        let selected = query.evaluate(&tree);
        prop_assert!(selected.len() <= 1 || !query.segments().is_empty());
    }

    /// Evaluation is a pure function of query and tree.
    #[test]
    fn evaluator_is_deterministic(tree in arb_json(), text in arb_query_text()) {
        let query = PathQuery::parse(&text);
        let first = query.evaluate(&tree);
        let second = PathQuery::parse(&text).evaluate(&tree);
        prop_assert_eq!(first, second);
    }

    /// Wildcards never select anything from a non-sequence.
    #[test]
    fn wildcard_on_mapping_is_empty(tree in arb_json()) {
        let wrapped = json!({"a": tree});
        let selected = PathQuery::parse("$.a[*]").evaluate(&wrapped);
        if let Some(items) = wrapped.get("a").and_then(Value::as_array) {
            prop_assert_eq!(selected.len(), items.len());
        } else {
            prop_assert!(selected.is_empty());
        }
    }

    /// No reference id is ever the target of two generated ids.
    #[test]
    fn identity_map_is_injective(generated in arb_zones(), reference in arb_zones()) {
        let result = reconcile(&zone_doc(&generated), &zone_doc(&reference));
        let mut targets = HashSet::new();
        for (g, r) in result.map.iter() {
            prop_assert!(targets.insert(r.to_owned()), "{} re-used reference id {}", g, r);
        }
    }

    /// A document reconciled against itself maps every zone onto itself.
    #[test]
    fn identical_documents_reconcile_to_identity(zones in arb_zones()) {
        let doc = zone_doc(&zones);
        let result = reconcile(&doc, &doc);
        prop_assert!(result.complete);
        for (id, _, _) in &zones {
            prop_assert_eq!(result.map.get(id), Some(id.as_str()));
        }
    }
}
