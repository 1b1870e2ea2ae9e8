//! Graph value types and their wire representation.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::filter::{BiquadFilterType, ParametricEqParameters};

/// Process-wide signal number carried by a port.
pub type SignalId = u32;

/// Port numbers declared by a node, graph input or graph output.
pub type PortList = SmallVec<[SignalId; 4]>;

/// Where a node sits in the signal flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    /// Signals consumed, by input port index.
    pub input: PortList,
    /// Signals produced, by output port index.
    pub output: PortList,
    /// Node name, unique within a graph.
    pub name: String,
    /// Worker thread the node is scheduled on by the backend.
    pub thread: u32,
}

impl Placement {
    pub fn new(
        name: impl Into<String>,
        input: impl IntoIterator<Item = SignalId>,
        output: impl IntoIterator<Item = SignalId>,
        thread: u32,
    ) -> Self {
        Self {
            input: input.into_iter().collect(),
            output: output.into_iter().collect(),
            name: name.into(),
            thread,
        }
    }
}

/// Placeholder for node kinds without parameters or configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Empty {}

/// Shared shape of every node: a placement plus optional parameters and
/// optional static configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeBody<P = Empty, C = Empty> {
    pub placement: Placement,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub parameters: Option<P>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub config: Option<C>,
}

impl<P, C> NodeBody<P, C> {
    pub fn new(placement: Placement) -> Self {
        Self {
            placement,
            parameters: None,
            config: None,
        }
    }

    pub fn with_parameters(mut self, parameters: P) -> Self {
        self.parameters = Some(parameters);
        self
    }

    pub fn with_config(mut self, config: C) -> Self {
        self.config = Some(config);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiquadParameters {
    pub filter_type: BiquadFilterType,
    /// Parameter smoothing rate; the backend assumes 1.0 when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slew_rate: Option<f64>,
}

/// Shared by the RMS, sidechain and expander dynamics nodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressorParameters {
    pub ratio: f64,
    pub threshold_db: f64,
    pub attack_t: f64,
    pub release_t: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DelayUnits {
    #[default]
    Samples,
    Seconds,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayParameters {
    pub delay: f64,
    #[serde(default)]
    pub units: DelayUnits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Longest delay the backend allocates for, in samples.
    pub max_delay: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvelopeParameters {
    pub attack_t: f64,
    pub release_t: f64,
}

/// Used by `FixedGain` and `Mixer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GainParameters {
    pub gain_db: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkConfig {
    /// Number of copies produced from each input.
    pub copies: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LimiterParameters {
    pub threshold_db: f64,
    pub attack_t: f64,
    pub release_t: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseGateParameters {
    pub threshold_db: f64,
    pub attack_t: f64,
    pub release_t: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbConfig {
    pub predelay: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReverbPlateParameters {
    pub predelay: f64,
    pub width: f64,
    pub pregain: f64,
    pub wet_dry_mix: f64,
    pub damping: f64,
    pub decay: f64,
    pub early_diffusion: f64,
    pub late_diffusion: f64,
    pub bandwidth: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchParameters {
    pub position: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeControlParameters {
    pub gain_db: f64,
    pub mute_state: u8,
}

/// Operator node, discriminated by `op_type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op_type")]
pub enum Node {
    Adder(NodeBody),
    Biquad(NodeBody<BiquadParameters>),
    #[serde(rename = "CompressorRMS")]
    CompressorRms(NodeBody<CompressorParameters>),
    CompressorSidechain(NodeBody<CompressorParameters>),
    Delay(NodeBody<DelayParameters, DelayConfig>),
    EnvelopeDetectorPeak(NodeBody<EnvelopeParameters>),
    #[serde(rename = "EnvelopeDetectorRMS")]
    EnvelopeDetectorRms(NodeBody<EnvelopeParameters>),
    FixedGain(NodeBody<GainParameters>),
    Fork(NodeBody<Empty, ForkConfig>),
    HardLimiterPeak(NodeBody<LimiterParameters>),
    LimiterPeak(NodeBody<LimiterParameters>),
    #[serde(rename = "LimiterRMS")]
    LimiterRms(NodeBody<LimiterParameters>),
    Mixer(NodeBody<GainParameters>),
    NoiseGate(NodeBody<NoiseGateParameters>),
    NoiseSuppressorExpander(NodeBody<CompressorParameters>),
    ParametricEq(NodeBody<ParametricEqParameters>),
    ReverbPlateStereo(NodeBody<ReverbPlateParameters, ReverbConfig>),
    Switch(NodeBody<SwitchParameters>),
    SwitchStereo(NodeBody<SwitchParameters>),
    VolumeControl(NodeBody<VolumeControlParameters>),
}

macro_rules! with_body {
    ($node:expr, $body:ident => $expr:expr) => {
        match $node {
            Node::Adder($body) => $expr,
            Node::Biquad($body) => $expr,
            Node::CompressorRms($body) => $expr,
            Node::CompressorSidechain($body) => $expr,
            Node::Delay($body) => $expr,
            Node::EnvelopeDetectorPeak($body) => $expr,
            Node::EnvelopeDetectorRms($body) => $expr,
            Node::FixedGain($body) => $expr,
            Node::Fork($body) => $expr,
            Node::HardLimiterPeak($body) => $expr,
            Node::LimiterPeak($body) => $expr,
            Node::LimiterRms($body) => $expr,
            Node::Mixer($body) => $expr,
            Node::NoiseGate($body) => $expr,
            Node::NoiseSuppressorExpander($body) => $expr,
            Node::ParametricEq($body) => $expr,
            Node::ReverbPlateStereo($body) => $expr,
            Node::Switch($body) => $expr,
            Node::SwitchStereo($body) => $expr,
            Node::VolumeControl($body) => $expr,
        }
    };
}

impl Node {
    pub fn placement(&self) -> &Placement {
        with_body!(self, body => &body.placement)
    }

    pub fn name(&self) -> &str {
        &self.placement().name
    }

    /// Signals consumed by this node.
    pub fn inputs(&self) -> &[SignalId] {
        &self.placement().input
    }

    /// Signals produced by this node.
    pub fn outputs(&self) -> &[SignalId] {
        &self.placement().output
    }

    /// Returns a copy of the node with a different placement.
    pub fn with_placement(&self, placement: Placement) -> Node {
        let mut node = self.clone();
        with_body!(&mut node, body => body.placement = placement);
        node
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Adder(_) => NodeKind::Adder,
            Node::Biquad(_) => NodeKind::Biquad,
            Node::CompressorRms(_) => NodeKind::CompressorRms,
            Node::CompressorSidechain(_) => NodeKind::CompressorSidechain,
            Node::Delay(_) => NodeKind::Delay,
            Node::EnvelopeDetectorPeak(_) => NodeKind::EnvelopeDetectorPeak,
            Node::EnvelopeDetectorRms(_) => NodeKind::EnvelopeDetectorRms,
            Node::FixedGain(_) => NodeKind::FixedGain,
            Node::Fork(_) => NodeKind::Fork,
            Node::HardLimiterPeak(_) => NodeKind::HardLimiterPeak,
            Node::LimiterPeak(_) => NodeKind::LimiterPeak,
            Node::LimiterRms(_) => NodeKind::LimiterRms,
            Node::Mixer(_) => NodeKind::Mixer,
            Node::NoiseGate(_) => NodeKind::NoiseGate,
            Node::NoiseSuppressorExpander(_) => NodeKind::NoiseSuppressorExpander,
            Node::ParametricEq(_) => NodeKind::ParametricEq,
            Node::ReverbPlateStereo(_) => NodeKind::ReverbPlateStereo,
            Node::Switch(_) => NodeKind::Switch,
            Node::SwitchStereo(_) => NodeKind::SwitchStereo,
            Node::VolumeControl(_) => NodeKind::VolumeControl,
        }
    }
}

/// Operator kind without placement or parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Adder,
    Biquad,
    CompressorRms,
    CompressorSidechain,
    Delay,
    EnvelopeDetectorPeak,
    EnvelopeDetectorRms,
    FixedGain,
    Fork,
    HardLimiterPeak,
    LimiterPeak,
    LimiterRms,
    Mixer,
    NoiseGate,
    NoiseSuppressorExpander,
    ParametricEq,
    ReverbPlateStereo,
    Switch,
    SwitchStereo,
    VolumeControl,
}

impl NodeKind {
    /// The `op_type` string used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Adder => "Adder",
            NodeKind::Biquad => "Biquad",
            NodeKind::CompressorRms => "CompressorRMS",
            NodeKind::CompressorSidechain => "CompressorSidechain",
            NodeKind::Delay => "Delay",
            NodeKind::EnvelopeDetectorPeak => "EnvelopeDetectorPeak",
            NodeKind::EnvelopeDetectorRms => "EnvelopeDetectorRMS",
            NodeKind::FixedGain => "FixedGain",
            NodeKind::Fork => "Fork",
            NodeKind::HardLimiterPeak => "HardLimiterPeak",
            NodeKind::LimiterPeak => "LimiterPeak",
            NodeKind::LimiterRms => "LimiterRMS",
            NodeKind::Mixer => "Mixer",
            NodeKind::NoiseGate => "NoiseGate",
            NodeKind::NoiseSuppressorExpander => "NoiseSuppressorExpander",
            NodeKind::ParametricEq => "ParametricEq",
            NodeKind::ReverbPlateStereo => "ReverbPlateStereo",
            NodeKind::Switch => "Switch",
            NodeKind::SwitchStereo => "SwitchStereo",
            NodeKind::VolumeControl => "VolumeControl",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audio entering the graph. Produces one (mono) or two (stereo) signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphInput {
    pub name: String,
    pub output: PortList,
}

/// Audio leaving the graph. Consumes one (mono) or two (stereo) signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphOutput {
    pub name: String,
    pub input: PortList,
}

/// A complete processing graph.
///
/// Graphs are values: edits produce a new graph and leave the old one intact.
/// Nodes are reference counted so unchanged nodes are shared between
/// revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub name: String,
    #[serde(alias = "fs")]
    pub sample_rate: u32,
    pub nodes: Vec<Arc<Node>>,
    pub inputs: Vec<GraphInput>,
    pub outputs: Vec<GraphOutput>,
}

impl Graph {
    /// Creates an empty graph.
    pub fn new(name: impl Into<String>, sample_rate: u32) -> Self {
        Self {
            name: name.into(),
            sample_rate,
            nodes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(
        mut self,
        name: impl Into<String>,
        output: impl IntoIterator<Item = SignalId>,
    ) -> Self {
        self.inputs.push(GraphInput {
            name: name.into(),
            output: output.into_iter().collect(),
        });
        self
    }

    pub fn with_output(
        mut self,
        name: impl Into<String>,
        input: impl IntoIterator<Item = SignalId>,
    ) -> Self {
        self.outputs.push(GraphOutput {
            name: name.into(),
            input: input.into_iter().collect(),
        });
        self
    }

    /// Appends a node. Used while building a graph; edits of an existing
    /// graph go through [`Graph::with_node`].
    pub fn push_node(mut self, node: Node) -> Self {
        self.nodes.push(Arc::new(node));
        self
    }

    /// Looks a node up by name.
    pub fn node(&self, name: &str) -> Option<&Arc<Node>> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    /// Returns a new graph in which the node named like `node` is replaced.
    ///
    /// All other nodes are shared with `self`.
    pub fn with_node(&self, node: Node) -> Result<Graph, GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|existing| existing.name() == node.name())
            .ok_or_else(|| GraphError::UnknownNode(node.name().to_string()))?;
        let mut nodes = self.nodes.clone();
        nodes[index] = Arc::new(node);
        Ok(Graph {
            name: self.name.clone(),
            sample_rate: self.sample_rate,
            nodes,
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
        })
    }

    /// Parses a graph from its wire JSON.
    pub fn from_json(json: &str) -> Result<Graph, GraphError> {
        serde_json::from_str(json).map_err(GraphError::Json)
    }

    /// Parses a graph from wire JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Graph, GraphError> {
        serde_json::from_slice(bytes).map_err(GraphError::Json)
    }

    /// Serializes the graph to compact wire JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string(self).map_err(GraphError::Json)
    }

    /// Serializes the graph to indented wire JSON.
    pub fn to_json_pretty(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self).map_err(GraphError::Json)
    }
}

/// Error produced by graph operations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// No node carries the requested name.
    #[error("node `{0}` not found")]
    UnknownNode(String),
    /// The wire JSON could not be parsed or produced.
    #[error("invalid graph json: {0}")]
    Json(#[source] serde_json::Error),
}
