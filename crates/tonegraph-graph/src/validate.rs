//! Structural checks on a graph.
//!
//! Validation is advisory: edge resolution works on any graph, and dangling
//! ports are never reported.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::{Graph, NodeKind, SignalId};
use crate::ports::SignalRegistry;

/// Allowed number of ports on one side of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exactly(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exactly(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Any => true,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "exactly {n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Any => f.write_str("any number of"),
        }
    }
}

impl NodeKind {
    /// Port-count constraints as `(inputs, outputs)`.
    pub fn port_arity(self) -> (Arity, Arity) {
        match self {
            NodeKind::CompressorSidechain | NodeKind::CompressorRms => {
                (Arity::Exactly(2), Arity::Exactly(1))
            }
            NodeKind::Mixer => (Arity::AtLeast(1), Arity::Exactly(1)),
            NodeKind::EnvelopeDetectorPeak | NodeKind::EnvelopeDetectorRms => {
                (Arity::AtLeast(1), Arity::Exactly(0))
            }
            _ => (Arity::Any, Arity::Any),
        }
    }
}

/// A single structural problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("node name `{0}` is used more than once")]
    DuplicateName(String),
    #[error("signal {signal} is produced by more than one port ({producers:?})")]
    MultipleProducers {
        signal: SignalId,
        producers: Vec<String>,
    },
    #[error("{kind} node `{name}` has {actual} {side} ports, expected {expected}")]
    PortCount {
        name: String,
        kind: NodeKind,
        side: &'static str,
        expected: Arity,
        actual: usize,
    },
    #[error("graph {side} `{name}` must carry 1 or 2 ports, found {actual}")]
    ChannelCount {
        name: String,
        side: &'static str,
        actual: usize,
    },
}

/// Checks name uniqueness, single producers per signal and per-kind port
/// counts. Returns every problem found.
pub fn validate(graph: &Graph) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for node in &graph.nodes {
        if !seen.insert(node.name()) {
            errors.push(ValidationError::DuplicateName(node.name().to_string()));
        }
    }

    for node in &graph.nodes {
        let kind = node.kind();
        let (inputs, outputs) = kind.port_arity();
        for (side, arity, actual) in [
            ("input", inputs, node.inputs().len()),
            ("output", outputs, node.outputs().len()),
        ] {
            if !arity.accepts(actual) {
                errors.push(ValidationError::PortCount {
                    name: node.name().to_string(),
                    kind,
                    side,
                    expected: arity,
                    actual,
                });
            }
        }
    }

    for input in &graph.inputs {
        if !(1..=2).contains(&input.output.len()) {
            errors.push(ValidationError::ChannelCount {
                name: input.name.clone(),
                side: "input",
                actual: input.output.len(),
            });
        }
    }
    for output in &graph.outputs {
        if !(1..=2).contains(&output.input.len()) {
            errors.push(ValidationError::ChannelCount {
                name: output.name.clone(),
                side: "output",
                actual: output.input.len(),
            });
        }
    }

    let registry = SignalRegistry::build(graph);
    for signal in registry.multiply_produced() {
        let producers = registry
            .producers(signal)
            .iter()
            .map(|port| port.endpoint.name.clone())
            .collect();
        errors.push(ValidationError::MultipleProducers { signal, producers });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        tracing::debug!(graph = %graph.name, problems = errors.len(), "graph failed validation");
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeBody, Placement};

    #[test]
    fn default_graph_is_valid() {
        assert_eq!(validate(&crate::default_graph()), Ok(()));
    }

    #[test]
    fn compressor_needs_two_inputs() {
        let graph = Graph::new("g", 48_000).push_node(Node::CompressorSidechain(NodeBody::new(
            Placement::new("c", [0], [1], 0),
        )));
        let errors = validate(&graph).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::PortCount { side: "input", expected: Arity::Exactly(2), actual: 1, .. }
        ));
    }

    #[test]
    fn envelope_detectors_have_no_outputs() {
        let graph = Graph::new("g", 48_000).push_node(Node::EnvelopeDetectorRms(NodeBody::new(
            Placement::new("env", [0], [1], 0),
        )));
        let errors = validate(&graph).unwrap_err();
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::PortCount { side: "output", .. }
        )));
    }

    #[test]
    fn reports_duplicates_and_channel_counts() {
        let node = Node::Adder(NodeBody::new(Placement::new("same", [0], [1], 0)));
        let graph = Graph::new("g", 48_000)
            .with_input("in", [0, 1, 2])
            .push_node(node.clone())
            .push_node(node)
            .with_output("out", [1]);
        let errors = validate(&graph).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateName("same".into())));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::ChannelCount { side: "input", actual: 3, .. }
        )));
        assert!(errors.iter().any(|error| matches!(
            error,
            ValidationError::MultipleProducers { signal: 1, .. }
        )));
    }

    #[test]
    fn dangling_ports_are_fine() {
        let graph = Graph::new("g", 48_000)
            .push_node(Node::Adder(NodeBody::new(Placement::new("a", [10], [11], 0))));
        assert_eq!(validate(&graph), Ok(()));
    }
}
