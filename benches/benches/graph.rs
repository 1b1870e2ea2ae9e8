use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion};
use tonegraph_graph::{
    resolve_edges, validate, Graph, GainParameters, Node, NodeBody, Placement, SignalRegistry,
};

/// `chains` parallel chains of `length` gain stages, each fed by its own
/// graph input and ending in its own graph output.
fn gain_chains(chains: u32, length: u32) -> Graph {
    let mut graph = Graph::new("bench", 48_000);
    let mut signal = 0;
    for chain in 0..chains {
        graph = graph.with_input(format!("in{chain}"), [signal]);
        for stage in 0..length {
            let node = Node::FixedGain(
                NodeBody::new(Placement::new(
                    format!("gain{chain}_{stage}"),
                    [signal],
                    [signal + 1],
                    chain,
                ))
                .with_parameters(GainParameters { gain_db: -1.0 }),
            );
            graph = graph.push_node(node);
            signal += 1;
        }
        graph = graph.with_output(format!("out{chain}"), [signal]);
        signal += 1;
    }
    graph
}

fn port_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("ports");
    group.measurement_time(Duration::from_secs(10));

    let graph = gain_chains(16, 32);
    group.bench_function("resolve_edges_16x32", |b| {
        b.iter(|| resolve_edges(&graph));
    });
    group.bench_function("registry_queries_16x32", |b| {
        let registry = SignalRegistry::build(&graph);
        b.iter(|| {
            (
                registry.dangling_outputs().len(),
                registry.unbound_consumers().len(),
            )
        });
    });
    group.bench_function("validate_16x32", |b| {
        b.iter(|| validate(&graph).is_ok());
    });

    group.finish();
}

criterion_group!(benches, port_resolution);
criterion_main!(benches);
