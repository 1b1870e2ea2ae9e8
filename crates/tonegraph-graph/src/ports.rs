//! Derivation of directed edges from matching port numbers.
//!
//! Producers are graph inputs followed by nodes, consumers are nodes
//! followed by graph outputs, both in declaration order. Each producer
//! output port binds to the first consumer (other than itself) that lists
//! the same signal number, at the first input index holding it. A consumer
//! that shares a port number with an earlier consumer stays unbound.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::model::{Graph, SignalId};

/// Which part of the graph an endpoint lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    Input,
    Node,
    Output,
}

/// A graph input, node or graph output, identified by its name and its index
/// within the corresponding list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Endpoint {
    pub kind: EndpointKind,
    pub index: usize,
    pub name: String,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// One port of an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PortRef {
    pub endpoint: Endpoint,
    pub port: usize,
}

/// Directed connection derived from a shared signal number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    /// `<source>-<signal>-<target>-<target_port>`.
    pub id: String,
    pub signal: SignalId,
    pub source: Endpoint,
    pub source_port: usize,
    pub target: Endpoint,
    pub target_port: usize,
}

#[derive(Debug, Default, Clone)]
struct SignalEntry {
    producers: Vec<PortRef>,
    consumers: Vec<PortRef>,
}

/// Index from signal number to the ports producing and consuming it.
///
/// Built once per graph revision; all queries are lookups.
#[derive(Debug, Default, Clone)]
pub struct SignalRegistry {
    signals: HashMap<SignalId, SignalEntry>,
    /// Every producer port with its signal, in resolution order.
    produced: Vec<(PortRef, SignalId)>,
    /// Every consumer port with its signal, in resolution order.
    consumed: Vec<(PortRef, SignalId)>,
}

impl SignalRegistry {
    pub fn build(graph: &Graph) -> Self {
        let mut registry = SignalRegistry::default();

        for (index, input) in graph.inputs.iter().enumerate() {
            let endpoint = Endpoint {
                kind: EndpointKind::Input,
                index,
                name: input.name.clone(),
            };
            for (port, &signal) in input.output.iter().enumerate() {
                registry.add_producer(&endpoint, port, signal);
            }
        }
        for (index, node) in graph.nodes.iter().enumerate() {
            let endpoint = Endpoint {
                kind: EndpointKind::Node,
                index,
                name: node.name().to_string(),
            };
            for (port, &signal) in node.outputs().iter().enumerate() {
                registry.add_producer(&endpoint, port, signal);
            }
        }

        for (index, node) in graph.nodes.iter().enumerate() {
            let endpoint = Endpoint {
                kind: EndpointKind::Node,
                index,
                name: node.name().to_string(),
            };
            registry.add_consumer(&endpoint, node.inputs());
        }
        for (index, output) in graph.outputs.iter().enumerate() {
            let endpoint = Endpoint {
                kind: EndpointKind::Output,
                index,
                name: output.name.clone(),
            };
            registry.add_consumer(&endpoint, &output.input);
        }

        tracing::debug!(
            graph = %graph.name,
            signals = registry.signals.len(),
            "signal registry built"
        );
        registry
    }

    fn add_producer(&mut self, endpoint: &Endpoint, port: usize, signal: SignalId) {
        let port_ref = PortRef {
            endpoint: endpoint.clone(),
            port,
        };
        self.signals
            .entry(signal)
            .or_default()
            .producers
            .push(port_ref.clone());
        self.produced.push((port_ref, signal));
    }

    fn add_consumer(&mut self, endpoint: &Endpoint, inputs: &[SignalId]) {
        for (port, &signal) in inputs.iter().enumerate() {
            // Only the first index carrying a signal is bindable.
            if inputs[..port].contains(&signal) {
                continue;
            }
            let port_ref = PortRef {
                endpoint: endpoint.clone(),
                port,
            };
            self.signals
                .entry(signal)
                .or_default()
                .consumers
                .push(port_ref.clone());
            self.consumed.push((port_ref, signal));
        }
    }

    /// First producer of `signal`, if any.
    pub fn producer(&self, signal: SignalId) -> Option<&PortRef> {
        self.producers(signal).first()
    }

    /// All producers of `signal`. More than one is a modeling error.
    pub fn producers(&self, signal: SignalId) -> &[PortRef] {
        self.signals
            .get(&signal)
            .map(|entry| entry.producers.as_slice())
            .unwrap_or(&[])
    }

    /// Consumers of `signal` in resolution order.
    pub fn consumers(&self, signal: SignalId) -> &[PortRef] {
        self.signals
            .get(&signal)
            .map(|entry| entry.consumers.as_slice())
            .unwrap_or(&[])
    }

    /// Signals declared anywhere in the graph, sorted.
    pub fn signals(&self) -> Vec<SignalId> {
        let mut signals: Vec<_> = self.signals.keys().copied().collect();
        signals.sort_unstable();
        signals
    }

    /// Signals with more than one producer, sorted.
    pub fn multiply_produced(&self) -> Vec<SignalId> {
        let mut signals: Vec<_> = self
            .signals
            .iter()
            .filter(|(_, entry)| entry.producers.len() > 1)
            .map(|(&signal, _)| signal)
            .collect();
        signals.sort_unstable();
        signals
    }

    fn bound_consumer(&self, producer: &PortRef, signal: SignalId) -> Option<&PortRef> {
        self.consumers(signal)
            .iter()
            .find(|consumer| consumer.endpoint != producer.endpoint)
    }

    /// Resolves the edge set.
    pub fn edges(&self) -> Vec<Edge> {
        self.produced
            .iter()
            .filter_map(|(producer, signal)| {
                let consumer = self.bound_consumer(producer, *signal)?;
                Some(Edge {
                    id: format!(
                        "{}-{}-{}-{}",
                        producer.endpoint.name, signal, consumer.endpoint.name, consumer.port
                    ),
                    signal: *signal,
                    source: producer.endpoint.clone(),
                    source_port: producer.port,
                    target: consumer.endpoint.clone(),
                    target_port: consumer.port,
                })
            })
            .collect()
    }

    /// Producer ports whose signal no other endpoint consumes.
    pub fn dangling_outputs(&self) -> Vec<(&PortRef, SignalId)> {
        self.produced
            .iter()
            .filter(|(producer, signal)| self.bound_consumer(producer, *signal).is_none())
            .map(|(producer, signal)| (producer, *signal))
            .collect()
    }

    /// Consumer ports whose signal nobody produces.
    pub fn dangling_inputs(&self) -> Vec<(&PortRef, SignalId)> {
        self.consumed
            .iter()
            .filter(|(_, signal)| self.producers(*signal).is_empty())
            .map(|(consumer, signal)| (consumer, *signal))
            .collect()
    }

    /// Consumer ports that have a producer but lost the first-consumer
    /// tie-break to an earlier consumer of the same signal.
    pub fn unbound_consumers(&self) -> Vec<(&PortRef, SignalId)> {
        let edges = self.edges();
        self.consumed
            .iter()
            .filter(|(consumer, signal)| {
                !self.producers(*signal).is_empty()
                    && !edges.iter().any(|edge| {
                        edge.target == consumer.endpoint && edge.target_port == consumer.port
                    })
            })
            .map(|(consumer, signal)| (consumer, *signal))
            .collect()
    }
}

/// Resolves the directed edge set of `graph`.
pub fn resolve_edges(graph: &Graph) -> Vec<Edge> {
    SignalRegistry::build(graph).edges()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Node, NodeBody, Placement};

    fn adder(name: &str, input: &[SignalId], output: &[SignalId]) -> Node {
        Node::Adder(NodeBody::new(Placement::new(
            name,
            input.iter().copied(),
            output.iter().copied(),
            0,
        )))
    }

    #[test]
    fn single_match_produces_one_edge() {
        let graph = Graph::new("g", 48_000)
            .push_node(adder("P", &[], &[5]))
            .push_node(adder("C", &[5], &[]));
        let edges = resolve_edges(&graph);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source.name, "P");
        assert_eq!(edges[0].target.name, "C");
        assert_eq!((edges[0].source_port, edges[0].target_port), (0, 0));
        assert_eq!(edges[0].id, "P-5-C-0");
    }

    #[test]
    fn first_consumer_wins() {
        let graph = Graph::new("g", 48_000)
            .push_node(adder("P", &[], &[5]))
            .push_node(adder("C1", &[5], &[]))
            .push_node(adder("C2", &[5], &[]));
        let registry = SignalRegistry::build(&graph);
        let edges = registry.edges();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].target.name, "C1");
        let unbound = registry.unbound_consumers();
        assert_eq!(unbound.len(), 1);
        assert_eq!(unbound[0].0.endpoint.name, "C2");
    }

    #[test]
    fn self_loops_are_skipped() {
        let graph = Graph::new("g", 48_000)
            .push_node(adder("loop", &[3], &[3]))
            .push_node(adder("next", &[3], &[]));
        let edges = resolve_edges(&graph);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source.name, "loop");
        assert_eq!(edges[0].target.name, "next");
    }

    #[test]
    fn handle_indices_follow_port_positions() {
        let graph = Graph::new("g", 48_000)
            .with_input("in", [0, 1])
            .push_node(adder("sum", &[1, 0], &[2]))
            .with_output("out", [2]);
        let edges = resolve_edges(&graph);
        let ids: Vec<_> = edges.iter().map(|edge| edge.id.as_str()).collect();
        assert_eq!(ids, ["in-0-sum-1", "in-1-sum-0", "sum-2-out-0"]);
        assert_eq!(edges[0].source_port, 0);
        assert_eq!(edges[1].source_port, 1);
    }

    #[test]
    fn dangling_ports_are_reported_not_connected() {
        let graph = Graph::new("g", 48_000)
            .with_input("in", [0])
            .push_node(adder("a", &[7], &[8]));
        let registry = SignalRegistry::build(&graph);
        assert!(registry.edges().is_empty());
        let outputs: Vec<_> = registry
            .dangling_outputs()
            .into_iter()
            .map(|(port, signal)| (port.endpoint.name.clone(), signal))
            .collect();
        assert_eq!(outputs, [("in".to_string(), 0), ("a".to_string(), 8)]);
        assert_eq!(registry.dangling_inputs().len(), 1);
    }

    #[test]
    fn duplicate_producers_are_indexed() {
        let graph = Graph::new("g", 48_000)
            .with_input("in", [4])
            .push_node(adder("a", &[], &[4]));
        let registry = SignalRegistry::build(&graph);
        assert_eq!(registry.multiply_produced(), [4]);
        assert_eq!(registry.producer(4).unwrap().endpoint.name, "in");
    }
}
