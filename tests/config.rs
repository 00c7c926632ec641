use flowcut::config::{
    AvoidAugmentingPath, BulkDistance, Config, DistanceType, GraphSearchAlgorithm, PierceRating,
    SeparatorSelection,
};

#[test]
fn defaults_match_the_documented_values() {
    let c = Config::default();
    assert_eq!(c.pierce_rating, PierceRating::MaxTargetMinusSourceHopDist);
    assert_eq!(c.avoid_augmenting_path, AvoidAugmentingPath::AvoidAndPickBest);
    assert_eq!(
        c.graph_search_algorithm,
        GraphSearchAlgorithm::PseudoDepthFirstSearch
    );
    assert_eq!(c.separator_selection, SeparatorSelection::NodeMinExpansion);
    assert_eq!(c.bulk_distance, BulkDistance::No);
    assert_eq!(c.bulk_distance_factor, 0.05);
    assert_eq!(c.max_imbalance, 0.4);
    assert_eq!(c.max_cut_size, i32::MAX);
    assert_eq!(c.geo_pos_ordering_cutter_count, 4);
    assert_eq!(c.distance_ordering_cutter_count, 16);
    assert_eq!(c.bulk_assimilation_threshold, 0.4);
    assert_eq!(c.bulk_assimilation_order_threshold, 0.15);
    assert_eq!(c.initial_assimilated_fraction, 0.05);
    assert_eq!(c.bulk_step_fraction, 0.05);
    assert_eq!(c.random_seed, 0);
    assert!(c.thread_count >= 1);
    assert!(c.source.is_none() && c.target.is_none());
    assert!(c.validate().is_ok());
}

#[test]
fn options_parse_by_name() {
    let mut c = Config::default();
    c.set("pierce_rating", "min_source_weight_dist").unwrap();
    assert_eq!(c.pierce_rating, PierceRating::MinSourceWeightDist);
    c.set("avoid_augmenting_path", "avoid_and_pick_random").unwrap();
    c.set("graph_search_algorithm", "breadth_first_search").unwrap();
    c.set("separator_selection", "edge_first").unwrap();
    c.set("max_imbalance", "0.33").unwrap();
    c.set("cutter_count", "12").unwrap();
    c.set("random_seed", "99").unwrap();
    c.set("source", "5").unwrap();
    c.set("source", "-1").unwrap();
    assert!(c.source.is_none());
    assert!(c.validate().is_ok());
    assert_eq!(c.max_imbalance, 0.33);
    assert_eq!(c.cutter_count, 12);
    assert_eq!(c.random_seed, 99);
}

#[test]
fn unknown_options_and_values_are_rejected() {
    let mut c = Config::default();
    assert!(c.set("no_such_option", "1").is_err());
    assert!(c.set("pierce_rating", "no_such_rating").is_err());
    assert!(c.set("cutter_count", "many").is_err());
}

#[test]
fn out_of_range_values_fail_validation() {
    let cases: &[(&str, &str)] = &[
        ("max_imbalance", "0.6"),
        ("max_imbalance", "0"),
        ("bulk_distance_factor", "1.5"),
        ("bulk_assimilation_threshold", "0.7"),
        ("initial_assimilated_fraction", "0"),
        ("cutter_count", "0"),
        ("thread_count", "0"),
        ("max_cut_size", "-3"),
    ];
    for (key, value) in cases {
        let mut c = Config::default();
        c.set(key, value).unwrap();
        assert!(c.validate().is_err(), "{key}={value} must not validate");
    }
}

#[test]
fn reserved_search_algorithm_fails_validation() {
    let mut c = Config::default();
    c.set("graph_search_algorithm", "depth_first_search").unwrap();
    let err = c.validate().unwrap_err();
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn bulk_distance_needs_a_hop_rating() {
    let mut c = Config::default();
    c.set("bulk_distance", "yes").unwrap();
    assert!(c.validate().is_ok());
    assert_eq!(c.distance_type(), DistanceType::HopDistanceTerminalSet);
    c.set("pierce_rating", "max_arc_weight").unwrap();
    assert!(c.validate().is_err());
}

#[test]
fn distance_type_follows_the_rating() {
    let mut c = Config::default();
    assert_eq!(c.distance_type(), DistanceType::HopDistance);
    c.set("pierce_rating", "max_target_weight_dist").unwrap();
    assert_eq!(c.distance_type(), DistanceType::WeightedDistance);
    assert!(c.requires_non_negative_weights());
    c.set("pierce_rating", "random").unwrap();
    assert_eq!(c.distance_type(), DistanceType::NoDistance);
    assert!(!c.requires_non_negative_weights());
}

#[test]
fn config_serializes_round_trip() {
    let mut c = Config::default();
    c.set("pierce_rating", "circular_weight").unwrap();
    c.set("max_imbalance", "0.25").unwrap();
    let json = serde_json::to_string(&c).unwrap();
    assert!(json.contains("\"circular_weight\""));
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back.pierce_rating, c.pierce_rating);
    assert_eq!(back.max_imbalance, c.max_imbalance);
    assert_eq!(back.thread_count, c.thread_count);
}

#[test]
fn partial_configs_deserialize_with_defaults() {
    let c: Config = serde_json::from_str(r#"{"cutter_count": 8}"#).unwrap();
    assert_eq!(c.cutter_count, 8);
    assert_eq!(c.max_imbalance, 0.4);
}
