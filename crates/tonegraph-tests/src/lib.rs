//! Graph fixtures shared by the cross-crate tests.

use tonegraph_graph::{
    BiquadFilterType, BiquadParameters, Empty, Graph, Node, NodeBody, Placement, SignalId,
};

/// `in -> B (lowpass) -> out` at 48 kHz.
pub fn lowpass_chain(filter_freq: f64) -> Graph {
    Graph::new("Lowpass Chain", 48_000)
        .push_node(Node::Biquad(
            NodeBody::new(Placement::new("B", [0], [1], 0)).with_parameters(BiquadParameters {
                filter_type: BiquadFilterType::Lowpass {
                    filter_freq,
                    q_factor: 0.707,
                },
                slew_rate: None,
            }),
        ))
        .with_input("in", [0])
        .with_output("out", [1])
}

/// A parameterless `Adder` node, handy for wiring tests.
pub fn adder(name: &str, input: &[SignalId], output: &[SignalId]) -> Node {
    Node::Adder(NodeBody::<Empty, Empty>::new(Placement::new(
        name,
        input.iter().copied(),
        output.iter().copied(),
        0,
    )))
}
