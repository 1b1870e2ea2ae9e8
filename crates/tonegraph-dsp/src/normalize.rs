//! Mapping of wire filter variants onto canonical biquad specs.

use std::fmt;

use serde::Serialize;
use smallvec::{smallvec, SmallVec};
use thiserror::Error;
use tonegraph_graph::{BiquadFilterType, FilterKind};

/// Canonical biquad shapes understood by the response engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    Lowpass,
    Highpass,
    Bandpass,
    Bandstop,
    Notch,
    Allpass,
    Peaking,
    Lowshelf,
    Highshelf,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SpecKind::Lowpass => "lowpass",
            SpecKind::Highpass => "highpass",
            SpecKind::Bandpass => "bandpass",
            SpecKind::Bandstop => "bandstop",
            SpecKind::Notch => "notch",
            SpecKind::Allpass => "allpass",
            SpecKind::Peaking => "peaking",
            SpecKind::Lowshelf => "lowshelf",
            SpecKind::Highshelf => "highshelf",
        };
        f.write_str(name)
    }
}

/// A single biquad ready for transfer-function evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterSpec {
    pub kind: SpecKind,
    pub center_freq: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<f64>,
    /// Bandwidth in octaves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bandwidth: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gain_db: Option<f64>,
}

impl FilterSpec {
    pub fn with_q(kind: SpecKind, center_freq: f64, q: f64) -> Self {
        Self {
            kind,
            center_freq,
            q: Some(q),
            bandwidth: None,
            gain_db: None,
        }
    }

    pub fn with_bandwidth(kind: SpecKind, center_freq: f64, bandwidth: f64) -> Self {
        Self {
            kind,
            center_freq,
            q: None,
            bandwidth: Some(bandwidth),
            gain_db: None,
        }
    }

    pub fn with_gain(kind: SpecKind, center_freq: f64, q: f64, gain_db: f64) -> Self {
        Self {
            kind,
            center_freq,
            q: Some(q),
            bandwidth: None,
            gain_db: Some(gain_db),
        }
    }
}

/// Specs produced by one filter slot. Linkwitz slots produce two.
pub type NormalizedSpecs = SmallVec<[FilterSpec; 2]>;

/// Raised when a filter slot cannot be turned into canonical specs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidFilterSpec {
    #[error("filter slot has no `type` field")]
    MissingType,
    #[error("unknown filter type `{0}`")]
    UnknownType(String),
    #[error("malformed `{kind}` filter: {reason}")]
    Malformed { kind: FilterKind, reason: String },
    #[error("`{kind}` filter field `{field}` must be {expected}, got {value}")]
    OutOfRange {
        kind: FilterKind,
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
}

/// Centre frequency used to approximate a frequency-independent gain.
const GAIN_CENTER_FREQ: f64 = 1000.0;
/// Q used to approximate a frequency-independent gain.
const GAIN_Q: f64 = 0.707;

fn positive(kind: FilterKind, field: &'static str, value: f64) -> Result<f64, InvalidFilterSpec> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(InvalidFilterSpec::OutOfRange {
            kind,
            field,
            expected: "a positive finite number",
            value,
        })
    }
}

fn finite(kind: FilterKind, field: &'static str, value: f64) -> Result<f64, InvalidFilterSpec> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidFilterSpec::OutOfRange {
            kind,
            field,
            expected: "a finite number",
            value,
        })
    }
}

/// Maps one filter slot to zero, one or two canonical specs.
///
/// `bypass` yields nothing. `constant_q` and `gain` become peaking filters,
/// and `linkwitz` becomes two flat peaking filters at `f0` and `fp`; both are
/// approximations of the real transforms.
pub fn normalize(filter: &BiquadFilterType) -> Result<NormalizedSpecs, InvalidFilterSpec> {
    let kind = filter.kind();
    let specs = match *filter {
        BiquadFilterType::Bypass => SmallVec::new(),
        BiquadFilterType::Lowpass {
            filter_freq,
            q_factor,
        }
        | BiquadFilterType::Highpass {
            filter_freq,
            q_factor,
        }
        | BiquadFilterType::Notch {
            filter_freq,
            q_factor,
        }
        | BiquadFilterType::Allpass {
            filter_freq,
            q_factor,
        } => {
            let spec_kind = match kind {
                FilterKind::Lowpass => SpecKind::Lowpass,
                FilterKind::Highpass => SpecKind::Highpass,
                FilterKind::Notch => SpecKind::Notch,
                _ => SpecKind::Allpass,
            };
            smallvec![FilterSpec::with_q(
                spec_kind,
                positive(kind, "filter_freq", filter_freq)?,
                positive(kind, "q_factor", q_factor)?,
            )]
        }
        BiquadFilterType::Bandpass { filter_freq, bw }
        | BiquadFilterType::Bandstop { filter_freq, bw } => {
            let spec_kind = if kind == FilterKind::Bandpass {
                SpecKind::Bandpass
            } else {
                SpecKind::Bandstop
            };
            smallvec![FilterSpec::with_bandwidth(
                spec_kind,
                positive(kind, "filter_freq", filter_freq)?,
                positive(kind, "bw", bw)?,
            )]
        }
        BiquadFilterType::Peaking {
            filter_freq,
            q_factor,
            boost_db,
        }
        | BiquadFilterType::Lowshelf {
            filter_freq,
            q_factor,
            boost_db,
        }
        | BiquadFilterType::Highshelf {
            filter_freq,
            q_factor,
            boost_db,
        }
        | BiquadFilterType::ConstantQ {
            filter_freq,
            q_factor,
            boost_db,
        } => {
            let spec_kind = match kind {
                FilterKind::Lowshelf => SpecKind::Lowshelf,
                FilterKind::Highshelf => SpecKind::Highshelf,
                _ => SpecKind::Peaking,
            };
            smallvec![FilterSpec::with_gain(
                spec_kind,
                positive(kind, "filter_freq", filter_freq)?,
                positive(kind, "q_factor", q_factor)?,
                finite(kind, "boost_db", boost_db)?,
            )]
        }
        BiquadFilterType::Gain { gain_db } => smallvec![FilterSpec::with_gain(
            SpecKind::Peaking,
            GAIN_CENTER_FREQ,
            GAIN_Q,
            finite(kind, "gain_db", gain_db)?,
        )],
        BiquadFilterType::Linkwitz { f0, q0, fp, qp } => smallvec![
            FilterSpec::with_gain(
                SpecKind::Peaking,
                positive(kind, "f0", f0)?,
                positive(kind, "q0", q0)?,
                0.0,
            ),
            FilterSpec::with_gain(
                SpecKind::Peaking,
                positive(kind, "fp", fp)?,
                positive(kind, "qp", qp)?,
                0.0,
            ),
        ],
    };
    Ok(specs)
}

/// Normalizes a filter slot given as raw JSON, reporting unknown or
/// malformed variants instead of defaulting them.
pub fn normalize_value(value: &serde_json::Value) -> Result<NormalizedSpecs, InvalidFilterSpec> {
    let tag = value
        .get("type")
        .ok_or(InvalidFilterSpec::MissingType)?
        .as_str()
        .ok_or(InvalidFilterSpec::MissingType)?;
    let kind: FilterKind = tag
        .parse()
        .map_err(|_| InvalidFilterSpec::UnknownType(tag.to_string()))?;
    let filter: BiquadFilterType =
        serde_json::from_value(value.clone()).map_err(|err| InvalidFilterSpec::Malformed {
            kind,
            reason: err.to_string(),
        })?;
    normalize(&filter)
}
