use tonegraph_dsp::{
    compute_response, normalize_value, response_for_node, FilterSlots, InvalidFilterSpec,
    DEFAULT_SAMPLE_RATE,
};
use tonegraph_graph::{default_graph, BiquadFilterType, FilterKind, Graph, ParametricEqParameters};

#[test]
fn bypassed_eq_is_flat_everywhere() {
    let graph = default_graph();
    let eq = graph.node("StereoEQ").unwrap();
    let response = response_for_node(eq, DEFAULT_SAMPLE_RATE).unwrap().unwrap();
    assert_eq!(response.len(), 512);
    assert!(response.magnitudes_db.iter().all(|&db| db == 0.0));
    assert!(response.phases_rad.iter().all(|&phase| phase == 0.0));
}

#[test]
fn grid_spans_the_audible_range() {
    let response = compute_response(&FilterSlots::bypassed(), DEFAULT_SAMPLE_RATE).unwrap();
    assert_eq!(response.frequencies[0], 20.0);
    assert!((response.frequencies[511] - 20_000.0).abs() < 1e-6);
    assert!(response.frequencies.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn eight_slot_cascade_stays_finite() {
    let mut eq = ParametricEqParameters::default();
    let kinds = FilterKind::ALL
        .into_iter()
        .filter(|kind| *kind != FilterKind::Bypass)
        .take(8);
    for (slot, kind) in kinds.enumerate() {
        eq = eq.with_filter(slot, BiquadFilterType::with_defaults(kind));
    }
    assert_eq!(eq.active_filters(), 8);
    let response = compute_response(&FilterSlots::from_parametric_eq(&eq), 44_100.0).unwrap();
    assert!(response.magnitudes_db.iter().all(|db| db.is_finite()));
    assert!(response.phases_rad.iter().all(|phase| phase.is_finite()));
}

#[test]
fn wire_filters_normalize_like_typed_ones() {
    let graph = Graph::from_json(
        r#"{
            "name": "eq", "sample_rate": 48000, "inputs": [], "outputs": [],
            "nodes": [{
                "op_type": "ParametricEq",
                "placement": { "input": [0], "output": [1], "name": "EQ", "thread": 0 },
                "parameters": { "filters": [
                    { "type": "highshelf", "filter_freq": 8000, "q_factor": 0.7, "boost_db": 3 },
                    { "type": "bypass" }, { "type": "bypass" }, { "type": "bypass" },
                    { "type": "bypass" }, { "type": "bypass" }, { "type": "bypass" },
                    { "type": "bypass" }
                ] }
            }]
        }"#,
    )
    .unwrap();
    let response = response_for_node(graph.node("EQ").unwrap(), 48_000.0)
        .unwrap()
        .unwrap();
    let top = response.magnitudes_db[511];
    assert!((top - 3.0).abs() < 0.5, "shelf gain at 20 kHz was {top}");

    let specs = normalize_value(&serde_json::json!({
        "type": "highshelf", "filter_freq": 8000, "q_factor": 0.7, "boost_db": 3
    }))
    .unwrap();
    assert_eq!(specs.len(), 1);
}

#[test]
fn unknown_wire_filters_are_reported() {
    let err = normalize_value(&serde_json::json!({ "type": "tilt", "gain_db": 2 })).unwrap_err();
    assert_eq!(err, InvalidFilterSpec::UnknownType("tilt".to_string()));
}
