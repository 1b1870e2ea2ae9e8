//! Signal-flow graph primitives.
//!
//! Nodes never reference each other directly. Each node declares the signal
//! numbers it consumes and produces, and edges are derived by matching those
//! numbers (see [`ports`]).

pub mod defaults;
pub mod filter;
pub mod model;
pub mod params;
pub mod ports;
pub mod validate;

pub use defaults::default_graph;
pub use filter::{BiquadFilterType, FilterKind, ParametricEqParameters, FILTER_SLOTS};
pub use model::{
    BiquadParameters, CompressorParameters, DelayConfig, DelayParameters, DelayUnits, Empty,
    EnvelopeParameters, ForkConfig, GainParameters, Graph, GraphError, GraphInput, GraphOutput,
    LimiterParameters, Node, NodeBody, NodeKind, NoiseGateParameters, Placement, PortList,
    ReverbConfig, ReverbPlateParameters, SignalId, SwitchParameters, VolumeControlParameters,
};
pub use params::{parameter_range, ParameterRange};
pub use ports::{resolve_edges, Edge, Endpoint, EndpointKind, SignalRegistry};
pub use validate::{validate, ValidationError};
