use tonegraph_graph::{
    default_graph, BiquadFilterType, DelayConfig, DelayParameters, DelayUnits, FilterKind, Graph,
    Node, NodeBody, ParametricEqParameters, Placement, FILTER_SLOTS,
};

#[test]
fn default_graph_roundtrips() {
    let graph = default_graph();
    let json = graph.to_json().unwrap();
    let parsed = Graph::from_json(&json).unwrap();
    assert_eq!(parsed, graph);
}

#[test]
fn eq_keeps_eight_slots_through_json() {
    let eq = ParametricEqParameters::default()
        .with_filter(0, BiquadFilterType::with_defaults(FilterKind::Highpass))
        .with_filter(5, BiquadFilterType::with_defaults(FilterKind::Linkwitz));
    let graph = Graph::new("eq", 44_100)
        .with_input("in", [0])
        .push_node(Node::ParametricEq(
            NodeBody::new(Placement::new("EQ", [0], [1], 0)).with_parameters(eq),
        ))
        .with_output("out", [1]);

    let value: serde_json::Value = serde_json::from_str(&graph.to_json_pretty().unwrap()).unwrap();
    let filters = value["nodes"][0]["parameters"]["filters"].as_array().unwrap();
    assert_eq!(filters.len(), FILTER_SLOTS);
    assert_eq!(filters[0]["type"], "highpass");
    assert_eq!(filters[7], serde_json::json!({ "type": "bypass" }));

    let parsed: Graph = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, graph);
}

#[test]
fn parses_backend_graph_with_config_and_optional_parameters() {
    let json = r#"{
        "name": "delay line",
        "sample_rate": 48000,
        "nodes": [
            {
                "op_type": "Delay",
                "placement": { "input": [0], "output": [1], "name": "D", "thread": 0 },
                "parameters": { "delay": 0.25, "units": "seconds" },
                "config": { "max_delay": 96000 }
            },
            {
                "op_type": "Adder",
                "placement": { "input": [1, 0], "output": [2], "name": "Sum", "thread": 1 }
            }
        ],
        "inputs": [ { "name": "in", "output": [0] } ],
        "outputs": [ { "name": "out", "input": [2] } ]
    }"#;

    let graph = Graph::from_json(json).unwrap();
    match graph.nodes[0].as_ref() {
        Node::Delay(body) => {
            assert_eq!(
                body.parameters,
                Some(DelayParameters {
                    delay: 0.25,
                    units: DelayUnits::Seconds
                })
            );
            assert_eq!(body.config, Some(DelayConfig { max_delay: 96_000 }));
        }
        other => panic!("unexpected node {other:?}"),
    }
    assert!(matches!(graph.nodes[1].as_ref(), Node::Adder(body) if body.parameters.is_none()));

    let reparsed = Graph::from_json(&graph.to_json().unwrap()).unwrap();
    assert_eq!(reparsed, graph);
}
