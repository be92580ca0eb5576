// tests/engine_tests.rs
//
// End-to-end properties of the matching and clustering engine.

use std::collections::{BTreeSet, HashMap};

use serde_json::{json, Value};

use dedupe_engine::{
    AggregationRule, Cluster, DedupConfig, Deduper, OversizedPolicy,
};

fn config_with_threshold(threshold: f64) -> DedupConfig {
    let json = json!({
        "wf": {
            "threshold": threshold,
            "max_block_size": 100,
            "max_iterations": 50,
            "block_workers": 4
        },
        "identifier_path": "/id",
        "fields": [
            {"name": "name", "path": "/name", "algorithm": "jaro-winkler", "weight": 1.0}
        ],
        "blocking": [
            {"function": "prefix", "field": "name", "params": {"len": 2}},
            {"function": "sorted-tokens", "field": "name"}
        ]
    });
    DedupConfig::from_json(&json.to_string()).unwrap()
}

fn catalog() -> Vec<Value> {
    vec![
        json!({"id": "A", "name": "John Smith", "year": 1990}),
        json!({"id": "B", "name": "Jon Smith", "year": 1990}),
        json!({"id": "C", "name": "Totally Different", "year": 1990}),
        json!({"id": "D", "name": "Johann Sebastian Bach"}),
        json!({"id": "E", "name": "J. S. Bach"}),
        json!({"id": "F", "name": "Smith John"}),
        json!({"id": "G"}),
        json!({"id": "H", "name": "..."}),
    ]
}

fn cluster_sets(clusters: &[Cluster]) -> BTreeSet<BTreeSet<String>> {
    clusters
        .iter()
        .map(|c| c.members.iter().map(|m| m.0.clone()).collect())
        .collect()
}

#[tokio::test]
async fn scenario_at_threshold_0_8() {
    let deduper = Deduper::new(config_with_threshold(0.8)).unwrap();
    let records = vec![
        json!({"id": "A", "name": "John Smith", "year": 1990}),
        json!({"id": "B", "name": "Jon Smith", "year": 1990}),
        json!({"id": "C", "name": "Totally Different", "year": 1990}),
    ];
    let output = deduper.dedup(&records).await.unwrap();

    let relation_pairs: Vec<(&str, &str)> = output
        .relations
        .iter()
        .map(|r| (r.first.as_str(), r.second.as_str()))
        .collect();
    assert_eq!(relation_pairs, vec![("A", "B")]);

    let sets = cluster_sets(&output.clusters);
    let expected: BTreeSet<BTreeSet<String>> = [
        ["A".to_string(), "B".to_string()].into_iter().collect(),
        ["C".to_string()].into_iter().collect(),
    ]
    .into_iter()
    .collect();
    assert_eq!(sets, expected);
}

#[tokio::test]
async fn determinism_across_runs() {
    let records = catalog();
    let first = Deduper::new(config_with_threshold(0.8))
        .unwrap()
        .dedup(&records)
        .await
        .unwrap();
    let second = Deduper::new(config_with_threshold(0.8))
        .unwrap()
        .dedup(&records)
        .await
        .unwrap();

    assert_eq!(cluster_sets(&first.clusters), cluster_sets(&second.clusters));
    assert_eq!(first.relations, second.relations);
}

#[tokio::test]
async fn clusters_partition_the_identifier_universe() {
    let records = catalog();
    let output = Deduper::new(config_with_threshold(0.8))
        .unwrap()
        .dedup(&records)
        .await
        .unwrap();

    let mut seen: BTreeSet<String> = BTreeSet::new();
    for cluster in &output.clusters {
        for member in &cluster.members {
            assert!(
                seen.insert(member.0.clone()),
                "identifier {} appears in two clusters",
                member
            );
        }
    }
    // Every record has a usable id, so all eight must surface, including
    // G (no name) and H (no derivable blocking key) as singletons.
    let expected: BTreeSet<String> = ["A", "B", "C", "D", "E", "F", "G", "H"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn lowering_the_threshold_only_merges() {
    let records = catalog();
    let strict = Deduper::new(config_with_threshold(0.95))
        .unwrap()
        .dedup(&records)
        .await
        .unwrap();
    let lenient = Deduper::new(config_with_threshold(0.7))
        .unwrap()
        .dedup(&records)
        .await
        .unwrap();

    // Every strict cluster must be wholly contained in one lenient
    // cluster: lower thresholds never split existing merges.
    for strict_cluster in &strict.clusters {
        let hosting = lenient.clusters.iter().find(|lenient_cluster| {
            strict_cluster
                .members
                .iter()
                .all(|m| lenient_cluster.members.contains(m))
        });
        assert!(
            hosting.is_some(),
            "strict cluster {:?} split at lower threshold",
            strict_cluster.members
        );
    }
}

#[tokio::test]
async fn zero_iterations_means_all_singletons() {
    let mut config = config_with_threshold(0.8);
    config.wf.max_iterations = 0;
    let output = Deduper::new(config)
        .unwrap()
        .dedup(&catalog())
        .await
        .unwrap();
    assert!(output.clusters.iter().all(Cluster::is_singleton));
    // The relation set is unaffected by the clustering bound.
    assert!(!output.relations.is_empty());
}

#[tokio::test]
async fn oversized_block_produces_no_relations_and_one_counter_tick() {
    let mut config = config_with_threshold(0.8);
    config.wf.max_block_size = 10;
    config.wf.oversized_policy = OversizedPolicy::Skip;
    // One blocking function only, so all fifty documents share exactly
    // one block.
    config.blocking.truncate(1);

    let records: Vec<Value> = (0..50)
        .map(|i| json!({"id": format!("r{:02}", i), "name": "John Smith"}))
        .collect();
    let output = Deduper::new(config).unwrap().dedup(&records).await.unwrap();

    assert!(output.relations.is_empty());
    assert_eq!(output.stats.counters.get("oversized-blocks"), Some(&1));
    assert_eq!(output.clusters.len(), 50);
}

#[tokio::test]
async fn always_match_forces_full_agreement() {
    let json = json!({
        "wf": {"threshold": 0.99, "max_block_size": 100, "max_iterations": 10},
        "identifier_path": "/id",
        "fields": [
            {"name": "name", "path": "/name", "algorithm": "always-match", "weight": 1.0}
        ],
        "blocking": [
            {"function": "prefix", "field": "name", "params": {"len": 1}}
        ]
    });
    let config = DedupConfig::from_json(&json.to_string()).unwrap();
    let records = vec![
        json!({"id": "A", "name": "apples"}),
        json!({"id": "B", "name": "anchors"}),
    ];
    let output = Deduper::new(config).unwrap().dedup(&records).await.unwrap();
    assert_eq!(output.clusters.len(), 1);
    assert_eq!(output.clusters[0].size(), 2);
}

#[tokio::test]
async fn must_match_aggregation_rejects_on_designated_field() {
    let json = json!({
        "wf": {"threshold": 0.5, "max_block_size": 100, "max_iterations": 10},
        "identifier_path": "/id",
        "fields": [
            {"name": "name", "path": "/name", "algorithm": "jaro-winkler", "weight": 1.0},
            {"name": "doi", "path": "/doi", "algorithm": "exact", "weight": 1.0,
             "must_match": true, "threshold": 1.0}
        ],
        "blocking": [
            {"function": "prefix", "field": "name"}
        ],
        "aggregation": "must-match-then-average"
    });
    let config = DedupConfig::from_json(&json.to_string()).unwrap();
    let records = vec![
        json!({"id": "A", "name": "John Smith", "doi": "10.1/x"}),
        json!({"id": "B", "name": "John Smith", "doi": "10.1/y"}),
        json!({"id": "C", "name": "John Smith", "doi": "10.1/x"}),
    ];
    let output = Deduper::new(config).unwrap().dedup(&records).await.unwrap();

    // A and C share the DOI; B is identical by name but its DOI differs,
    // so the must-match rule keeps it out.
    let sets = cluster_sets(&output.clusters);
    let merged: BTreeSet<String> = ["A".to_string(), "C".to_string()].into_iter().collect();
    let alone: BTreeSet<String> = ["B".to_string()].into_iter().collect();
    assert!(sets.contains(&merged));
    assert!(sets.contains(&alone));
}

#[tokio::test]
async fn malformed_records_are_skipped_and_counted() {
    let records = vec![
        json!(null),
        json!({"name": "no identifier"}),
        json!({"id": "A", "name": "John Smith"}),
    ];
    let output = Deduper::new(config_with_threshold(0.8))
        .unwrap()
        .dedup(&records)
        .await
        .unwrap();
    assert_eq!(output.stats.counters.get("parse-errors"), Some(&2));
    assert_eq!(output.clusters.len(), 1);
}

#[tokio::test]
async fn counters_are_exposed_in_stats() {
    let output = Deduper::new(config_with_threshold(0.8))
        .unwrap()
        .dedup(&catalog())
        .await
        .unwrap();
    let counters: &HashMap<String, u64> = &output.stats.counters;
    assert!(counters.get("pairs-compared").copied().unwrap_or(0) > 0);
    assert_eq!(output.stats.total_documents, 8);
}

#[test]
fn weighted_average_is_the_default_aggregation() {
    let config = config_with_threshold(0.8);
    assert_eq!(config.aggregation, AggregationRule::WeightedAverage);
}
