#![allow(clippy::expect_used)]

use serde_json::{Value, json};

use super::*;

fn doc() -> Value {
    json!({
        "a": {"b": [{"c": 1}, {"c": 2}]},
        "zones": [
            {"id": "Z1", "surfaces": [
                {"id": "S1", "classification": "WALL", "adjacent_to": "EXTERIOR", "area": 10.0},
                {"id": "S2", "classification": "WALL", "adjacent_to": "INTERIOR", "area": 4.0},
                {"id": "S3", "classification": "CEILING", "adjacent_to": "EXTERIOR", "area": 12.0}
            ]},
            {"id": "Z2", "surfaces": [
                {"id": "S4", "classification": "WALL", "adjacent_to": "EXTERIOR", "area": 8.0}
            ]}
        ],
        "meta": {"name": "dotted.name]"}
    })
}

/// The canonical wildcard example flattens in document order.
#[test]
fn test_wildcard_then_key() {
    let d = doc();
    assert_eq!(find_all("$.a.b[*].c", &d), vec![&json!(1), &json!(2)]);
}

/// Numeric indices select a single element; out of range selects nothing.
#[test]
fn test_numeric_index() {
    let d = doc();
    assert_eq!(find_all("$.a.b[1].c", &d), vec![&json!(2)]);
    assert!(find_all("$.a.b[7].c", &d).is_empty());
}

/// Wildcards and indices on a mapping yield nothing rather than failing.
#[test]
fn test_index_on_mapping_is_empty() {
    let d = doc();
    assert!(find_all("$.a[*]", &d).is_empty());
    assert!(find_all("$.a[0]", &d).is_empty());
}

/// Missing keys drop the branch silently.
#[test]
fn test_missing_key_is_empty() {
    let d = doc();
    assert!(find_all("$.a.missing.c", &d).is_empty());
    assert!(find_all("$.zones[*].nothing_here", &d).is_empty());
}

/// A filter matches only exact string equality.
#[test]
fn test_filter_exact_match() {
    let d = doc();
    let ids: Vec<&Value> = find_all(
        "$.zones[*].surfaces[?(@.classification == 'WALL')].id",
        &d,
    );
    assert_eq!(ids, vec![&json!("S1"), &json!("S2"), &json!("S4")]);

    assert!(find_all("$.zones[*].surfaces[?(@.classification == 'WAL')]", &d).is_empty());
}

/// Conjunctions require every test to hold.
#[test]
fn test_filter_conjunction() {
    let d = doc();
    let (s1, s4) = (json!("S1"), json!("S4"));
    let expected = vec![&s1, &s4];
    for query in [
        "$.zones[*].surfaces[?(@.classification == 'WALL' and @.adjacent_to == 'EXTERIOR')].id",
        "$.zones[*].surfaces[?(@.classification == 'WALL' && @.adjacent_to == \"EXTERIOR\")].id",
        "$.zones[*].surfaces[?(@.classification=='WALL' & @.adjacent_to=='EXTERIOR')].id",
    ] {
        assert_eq!(find_all(query, &d), expected, "query {query}");
    }
}

/// A filter after a wildcard narrows the expanded elements.
#[test]
fn test_filter_after_wildcard() {
    let d = doc();
    let ids = find_all("$.zones[*][?(@.id == 'Z2')].surfaces[*].id", &d);
    assert_eq!(ids, vec![&json!("S4")]);
}

/// A malformed filter condition never matches.
#[test]
fn test_malformed_filter_matches_nothing() {
    let d = doc();
    assert!(find_all("$.zones[?(@.id ~ 'Z1')]", &d).is_empty());
    assert!(find_all("$.zones[?(id == 'Z1')]", &d).is_empty());
}

/// Bracket content that is not an index, wildcard or filter selects nothing.
#[test]
fn test_garbage_brackets_are_total() {
    let d = doc();
    for query in ["$.zones[-1]", "$.zones[abc]", "$.zones[0", "$.zones]x[", "$.[[[", ""] {
        let _ = find_all(query, &d);
    }
    assert!(find_all("$.zones[-1]", &d).is_empty());
}

/// Dots and brackets inside quoted literals do not split the path.
#[test]
fn test_quoted_literal_with_separators() {
    let d = json!({"items": [{"name": "a.b]c", "v": 1}, {"name": "x", "v": 2}]});
    assert_eq!(find_all("$.items[?(@.name == 'a.b]c')].v", &d), vec![&json!(1)]);
}

/// The bare root query returns the root.
#[test]
fn test_root_query() {
    let d = doc();
    assert_eq!(find_all("$", &d), vec![&d]);
}

/// `find_one` falls back to the caller's default.
#[test]
fn test_find_one_default() {
    let d = doc();
    let fallback = json!("none");
    assert_eq!(find_one("$.a.b[0].c", &d, &fallback), &json!(1));
    assert_eq!(find_one("$.a.z", &d, &fallback), &fallback);
}

/// `find_all_with_filters` replaces the trailing wildcard with the filter.
#[test]
fn test_find_all_with_filters() {
    let d = doc();
    let found = find_all_with_filters(
        "$.zones[*].surfaces[*]",
        &d,
        &[("classification", "CEILING"), ("adjacent_to", "EXTERIOR")],
    );
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], json!("S3"));
}

/// Display produces text that parses back to the same query.
#[test]
fn test_display_reparses() {
    let q = PathQuery::parse("$.zones[0].surfaces[?(@.a == 'x' and @.b == 'y')].area");
    assert_eq!(
        q.to_string(),
        "$.zones[0].surfaces[?(@.a == 'x' and @.b == 'y')].area"
    );
    assert_eq!(PathQuery::parse(&q.to_string()), q);
}

/// `with_id_at` swaps a segment's index selection for an id filter.
#[test]
fn test_with_id_at() {
    let d = doc();
    let q = PathQuery::parse("$.zones[0].surfaces[*].area");
    let pos = q.rposition_key(|k| k == "surfaces").expect("surfaces segment");
    let reselected = q.prefix(pos + 1).with_id_at(pos, "S3");
    assert_eq!(reselected.to_string(), "$.zones[0].surfaces[?(@.id == 'S3')]");
    let hit = reselected.find_one(&d).expect("one surface");
    assert_eq!(q.suffix(pos + 1).evaluate(hit), vec![&json!(12.0)]);
}

/// An existing filter keeps its conditions and gains the id test.
#[test]
fn test_with_id_at_keeps_filter() {
    let d = doc();
    let q = PathQuery::parse("$.zones[*].surfaces[?(@.classification == 'WALL')].area");
    let pos = q.rposition_key(|k| k == "surfaces").expect("surfaces segment");
    let wall = q.with_id_at(pos, "S2");
    assert_eq!(
        wall.to_string(),
        "$.zones[*].surfaces[?(@.id == 'S2' and @.classification == 'WALL')].area"
    );
    assert_eq!(wall.evaluate(&d), vec![&json!(4.0)]);
    assert!(q.with_id_at(pos, "S3").evaluate(&d).is_empty());
}

/// The data element is the last key of the path.
#[test]
fn test_data_element() {
    assert_eq!(PathQuery::parse("$.zones[*].surfaces[*].area").data_element(), "area");
    assert_eq!(PathQuery::parse("$.zones[*]").data_element(), "zones");
    assert_eq!(PathQuery::parse("$").data_element(), "");
}

/// Evaluation is a pure function of query and tree.
#[test]
fn test_evaluation_is_repeatable() {
    let d = doc();
    let q = PathQuery::parse("$.zones[*].surfaces[*].area");
    assert_eq!(q.evaluate(&d), q.evaluate(&d));
}
