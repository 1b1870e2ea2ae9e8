//! Graph used when no backend graph is available.

use crate::filter::ParametricEqParameters;
use crate::model::{
    CompressorParameters, GainParameters, Graph, Node, NodeBody, Placement,
    VolumeControlParameters,
};

/// Stereo sidechain compressor feeding a volume control and an all-bypass
/// parametric EQ.
pub fn default_graph() -> Graph {
    let compressor = CompressorParameters {
        ratio: 3.0,
        threshold_db: -35.0,
        attack_t: 0.005,
        release_t: 0.12,
    };

    Graph::new("Stereo Compressor with Volume Control", 48_000)
        .push_node(Node::Mixer(
            NodeBody::new(Placement::new("DetectionMixer", [0, 1], [2], 0))
                .with_parameters(GainParameters { gain_db: 0.0 }),
        ))
        .push_node(Node::CompressorSidechain(
            NodeBody::new(Placement::new("LeftCompressor", [0, 2], [3], 1))
                .with_parameters(compressor),
        ))
        .push_node(Node::CompressorSidechain(
            NodeBody::new(Placement::new("RightCompressor", [1, 2], [4], 2))
                .with_parameters(compressor),
        ))
        .push_node(Node::VolumeControl(
            NodeBody::new(Placement::new("StereoVolume", [3, 4], [5, 6], 3)).with_parameters(
                VolumeControlParameters {
                    gain_db: 0.0,
                    mute_state: 0,
                },
            ),
        ))
        .push_node(Node::ParametricEq(
            NodeBody::new(Placement::new("StereoEQ", [5, 6], [7, 8], 4))
                .with_parameters(ParametricEqParameters::default()),
        ))
        .with_input("audio_in", [0, 1])
        .with_output("audio_out", [7, 8])
}
