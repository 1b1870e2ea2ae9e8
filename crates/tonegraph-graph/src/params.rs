//! Editing ranges and defaults for node and filter parameters.

use serde::Serialize;

use crate::model::NodeKind;

/// Range, default and scaling hint for one numeric parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub default: f64,
    /// Whether an editor should map the range logarithmically.
    pub log_scale: bool,
}

impl ParameterRange {
    const fn linear(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
            log_scale: false,
        }
    }

    const fn log(min: f64, max: f64, step: f64, default: f64) -> Self {
        Self {
            min,
            max,
            step,
            default,
            log_scale: true,
        }
    }

    /// Saturates `value` into the range. `NaN` becomes the default.
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

const GAIN_DB: ParameterRange = ParameterRange::linear(-60.0, 12.0, 0.1, 0.0);
const RATIO: ParameterRange = ParameterRange::log(1.0, 20.0, 0.1, 3.0);
const THRESHOLD_DB: ParameterRange = ParameterRange::linear(-60.0, 0.0, 0.1, -35.0);
const ATTACK_T: ParameterRange = ParameterRange::log(0.001, 1.0, 0.001, 0.005);
const RELEASE_T: ParameterRange = ParameterRange::log(0.01, 2.0, 0.01, 0.12);
const POSITION: ParameterRange = ParameterRange::linear(0.0, 8.0, 1.0, 0.0);
const UNIT: ParameterRange = ParameterRange::linear(0.0, 1.0, 0.01, 0.5);

/// Ranges for the numeric fields of biquad filter slots.
pub fn filter_field_range(field: &str) -> Option<ParameterRange> {
    let range = match field {
        "filter_freq" | "f0" | "fp" => ParameterRange::log(20.0, 20_000.0, 1.0, 1000.0),
        "q_factor" | "q0" | "qp" => ParameterRange::linear(0.1, 10.0, 0.1, 0.707),
        "bw" => ParameterRange::linear(0.1, 10.0, 0.1, 1.0),
        "boost_db" | "gain_db" => ParameterRange::linear(-20.0, 20.0, 0.1, 0.0),
        "slew_rate" => ParameterRange::log(0.1, 100.0, 0.1, 1.0),
        _ => return None,
    };
    Some(range)
}

/// Range of `field` on nodes of `kind`, or `None` when the field is not an
/// editable number on that kind.
pub fn parameter_range(kind: NodeKind, field: &str) -> Option<ParameterRange> {
    let range = match (kind, field) {
        (NodeKind::Mixer | NodeKind::FixedGain | NodeKind::VolumeControl, "gain_db") => GAIN_DB,
        (NodeKind::Switch | NodeKind::SwitchStereo, "position") => POSITION,
        (
            NodeKind::CompressorSidechain
            | NodeKind::CompressorRms
            | NodeKind::NoiseSuppressorExpander,
            "ratio",
        ) => RATIO,
        (
            NodeKind::CompressorSidechain
            | NodeKind::CompressorRms
            | NodeKind::NoiseSuppressorExpander
            | NodeKind::LimiterPeak
            | NodeKind::LimiterRms
            | NodeKind::HardLimiterPeak,
            "threshold_db",
        ) => THRESHOLD_DB,
        (NodeKind::NoiseGate, "threshold_db") => ParameterRange::linear(-96.0, 0.0, 0.1, -40.0),
        (NodeKind::NoiseGate, "release_t") => ParameterRange::log(0.01, 5.0, 0.01, 0.1),
        (_, "attack_t") if has_envelope_timing(kind) => ATTACK_T,
        (_, "release_t") if has_envelope_timing(kind) => RELEASE_T,
        (NodeKind::Delay, "delay") => ParameterRange::linear(0.0, f64::MAX, 1.0, 0.0),
        (NodeKind::Biquad, field) => return filter_field_range(field),
        (NodeKind::ReverbPlateStereo, field) => match field {
            "predelay" => ParameterRange::linear(0.0, 30.0, 0.1, 15.0),
            "width" => ParameterRange::linear(0.0, 1.0, 0.01, 1.0),
            "pregain" | "wet_dry_mix" | "damping" | "decay" => UNIT,
            "early_diffusion" => ParameterRange::linear(0.0, 1.0, 0.01, 0.2),
            "late_diffusion" => ParameterRange::linear(0.0, 1.0, 0.01, 0.6),
            "bandwidth" => ParameterRange::log(20.0, 24_000.0, 1.0, 8000.0),
            _ => return None,
        },
        _ => return None,
    };
    Some(range)
}

fn has_envelope_timing(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::CompressorSidechain
            | NodeKind::CompressorRms
            | NodeKind::NoiseSuppressorExpander
            | NodeKind::EnvelopeDetectorPeak
            | NodeKind::EnvelopeDetectorRms
            | NodeKind::LimiterPeak
            | NodeKind::LimiterRms
            | NodeKind::HardLimiterPeak
            | NodeKind::NoiseGate
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compressor_defaults_match_default_graph() {
        let ratio = parameter_range(NodeKind::CompressorSidechain, "ratio").unwrap();
        assert_eq!(ratio.default, 3.0);
        assert!(ratio.log_scale);
        let release = parameter_range(NodeKind::CompressorSidechain, "release_t").unwrap();
        assert_eq!(release.default, 0.12);
    }

    #[test]
    fn noise_gate_overrides_shared_timing() {
        let release = parameter_range(NodeKind::NoiseGate, "release_t").unwrap();
        assert_eq!(release.max, 5.0);
        let attack = parameter_range(NodeKind::NoiseGate, "attack_t").unwrap();
        assert_eq!(attack, ATTACK_T);
    }

    #[test]
    fn clamp_saturates_and_replaces_nan() {
        let freq = filter_field_range("filter_freq").unwrap();
        assert_eq!(freq.clamp(5.0), 20.0);
        assert_eq!(freq.clamp(50_000.0), 20_000.0);
        assert_eq!(freq.clamp(f64::NAN), 1000.0);
    }

    #[test]
    fn unknown_fields_have_no_range() {
        assert!(parameter_range(NodeKind::Adder, "gain_db").is_none());
        assert!(parameter_range(NodeKind::Mixer, "ratio").is_none());
    }
}
