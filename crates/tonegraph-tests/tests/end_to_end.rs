use std::sync::Arc;
use std::time::Duration;

use tonegraph_client::{ClientConfig, GraphSession, MemoryBackend};
use tonegraph_dsp::response_for_node;
use tonegraph_graph::{resolve_edges, validate, EndpointKind, Graph};
use tonegraph_preview::PreviewConfig;
use tonegraph_tests::lowpass_chain;

const LOWPASS_CHAIN: &str = r#"{
    "name": "Lowpass Chain",
    "sample_rate": 48000,
    "inputs": [{ "name": "in", "output": [0] }],
    "outputs": [{ "name": "out", "input": [1] }],
    "nodes": [{
        "op_type": "Biquad",
        "placement": { "input": [0], "output": [1], "name": "B", "thread": 0 },
        "parameters": {
            "filter_type": { "type": "lowpass", "filter_freq": 1000, "q_factor": 0.707 }
        }
    }]
}"#;

#[test]
fn lowpass_chain_resolves_and_attenuates_highs() -> anyhow::Result<()> {
    let graph = Graph::from_json(LOWPASS_CHAIN)?;
    assert_eq!(graph, lowpass_chain(1000.0));
    assert!(validate(&graph).is_ok());

    let edges = resolve_edges(&graph);
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[0].source.kind, EndpointKind::Input);
    assert_eq!((edges[0].source.name.as_str(), edges[0].target.name.as_str()), ("in", "B"));
    assert_eq!((edges[1].source.name.as_str(), edges[1].target.name.as_str()), ("B", "out"));
    assert_eq!(edges[1].target.kind, EndpointKind::Output);

    let node = graph.node("B").unwrap();
    let response = response_for_node(node, f64::from(graph.sample_rate)).unwrap()?;
    for (freq, magnitude, _) in response.points() {
        if freq >= 4000.0 {
            assert!(magnitude < -3.0, "{magnitude} dB at {freq} Hz");
        }
        if freq <= 200.0 {
            assert!(magnitude.abs() < 0.1, "{magnitude} dB at {freq} Hz");
        }
    }
    Ok(())
}

#[test]
fn wire_json_round_trips() -> anyhow::Result<()> {
    let graph = Graph::from_json(LOWPASS_CHAIN)?;
    let reparsed = Graph::from_json(&graph.to_json()?)?;
    assert_eq!(graph, reparsed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn session_previews_edits_and_syncs_them() -> anyhow::Result<()> {
    let backend = Arc::new(MemoryBackend::new(lowpass_chain(1000.0)));
    let session = GraphSession::connect(
        Arc::clone(&backend),
        &ClientConfig::default(),
        PreviewConfig::default(),
    )
    .await?;
    let mut preview = session.subscribe_preview();

    session.select_node("B")?;
    preview.changed().await?;
    let at_1k = preview.borrow_and_update().clone().unwrap();
    let probe = at_1k.response.nearest_bin(2000.0).unwrap();

    let retuned = lowpass_chain(5000.0);
    let node = retuned.node("B").unwrap().as_ref().clone();
    session.edit_node(node)?;
    preview.changed().await?;
    let at_5k = preview.borrow_and_update().clone().unwrap();
    assert!(at_5k.generation > at_1k.generation);
    assert!(at_5k.response.magnitudes_db[probe] > at_1k.response.magnitudes_db[probe]);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(backend.push_count(), 1);
    assert_eq!(backend.graph(), retuned);
    Ok(())
}
