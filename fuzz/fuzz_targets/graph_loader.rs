#![no_main]

use libfuzzer_sys::fuzz_target;
use tonegraph_graph::{resolve_edges, validate, Graph, SignalRegistry};

fuzz_target!(|data: &[u8]| {
    let Ok(graph) = Graph::from_slice(data) else {
        return;
    };
    let edges = resolve_edges(&graph);
    let producer_ports: usize = graph.inputs.iter().map(|input| input.output.len()).sum::<usize>()
        + graph.nodes.iter().map(|node| node.outputs().len()).sum::<usize>();
    assert!(edges.len() <= producer_ports);
    assert!(edges.iter().all(|edge| edge.source != edge.target));

    let registry = SignalRegistry::build(&graph);
    assert_eq!(registry.edges(), edges);
    let _ = registry.dangling_inputs();
    let _ = validate(&graph);

    let json = graph.to_json().expect("parsed graphs serialize");
    let reparsed = Graph::from_json(&json).expect("serialized graphs parse");
    assert_eq!(reparsed.nodes.len(), graph.nodes.len());
});
