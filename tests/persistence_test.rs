//! Persistence round-trips: containers as path lists, query expressions as
//! JSON records.

use tag_query::{ExprKind, QueryExpression, QueryRecord, TagContainer, TagError, TagRegistry};

#[test]
fn container_round_trips_through_path_list() {
    let mut registry = TagRegistry::new();
    let container = TagContainer::from_paths(
        &mut registry,
        ["Enemy.Flying.Boss", "Player", "Enemy.Ground"],
    )
    .unwrap();
    registry.seal();

    let paths = container.to_paths(&registry).unwrap();
    assert_eq!(paths, vec!["Enemy.Flying.Boss", "Enemy.Ground", "Player"]);

    let reloaded = TagContainer::resolve_paths(&registry, &paths).unwrap();
    assert_eq!(reloaded, container);
}

#[test]
fn query_record_round_trips_through_json() {
    let mut registry = TagRegistry::new();
    let enemy = registry.register("Enemy").unwrap();
    let ground = registry.register("Enemy.Ground").unwrap();
    let player = registry.register("Player").unwrap();
    let boss = registry.register("Enemy.Flying.Boss").unwrap();
    registry.seal();

    let expr = QueryExpression::And(vec![
        QueryExpression::AllMatch(vec![enemy]),
        QueryExpression::NoneMatch(vec![ground]),
        QueryExpression::Not(Box::new(QueryExpression::AnyMatch(vec![player]))),
    ]);

    let record = expr.to_record(&registry).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    let parsed: QueryRecord = serde_json::from_str(&json).unwrap();
    let reloaded = parsed.resolve(&registry).unwrap();

    assert_eq!(reloaded, expr);
    assert!(reloaded.evaluate(&TagContainer::single(boss)));
}

#[test]
fn hand_written_json_loads() {
    let mut registry = TagRegistry::new();
    registry.register("Enemy.Ground").unwrap();
    registry.seal();

    let json = r#"{
        "kind": "And",
        "children": [
            { "kind": "AnyMatch", "tags": ["Enemy"] },
            { "kind": "Not", "children": [
                { "kind": "AnyMatch", "tags": ["Enemy.Ground"] }
            ] }
        ]
    }"#;

    let record: QueryRecord = serde_json::from_str(json).unwrap();
    let expr = record.resolve(&registry).unwrap();

    let ground = registry.resolve("Enemy.Ground").unwrap();
    let enemy = registry.resolve("Enemy").unwrap();
    assert!(!expr.evaluate(&TagContainer::single(ground)));
    assert!(expr.evaluate(&TagContainer::single(enemy)));
}

#[test]
fn leaf_serialization_omits_empty_fields() {
    let record = QueryRecord::leaf(ExprKind::AllMatch, vec!["Enemy".into()]);
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, r#"{"kind":"AllMatch","tags":["Enemy"]}"#);

    let none = QueryRecord::leaf(ExprKind::None, Vec::new());
    assert_eq!(serde_json::to_string(&none).unwrap(), r#"{"kind":"None"}"#);
}

#[test]
fn malformed_json_record_is_refused() {
    let registry = TagRegistry::new();

    // Leaf carrying children.
    let json = r#"{
        "kind": "NoneMatch",
        "tags": [],
        "children": [ { "kind": "None" } ]
    }"#;
    let record: QueryRecord = serde_json::from_str(json).unwrap();
    assert!(matches!(
        record.resolve(&registry),
        Err(TagError::InvalidExpressionShape { .. })
    ));

    // A path the registry does not know.
    let json = r#"{ "kind": "AnyMatch", "tags": ["Never.Registered"] }"#;
    let record: QueryRecord = serde_json::from_str(json).unwrap();
    assert!(matches!(
        record.resolve(&registry),
        Err(TagError::UnknownTag { .. })
    ));
}
