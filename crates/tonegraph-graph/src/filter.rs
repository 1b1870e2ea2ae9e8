//! Biquad filter slot definitions shared by `Biquad` and `ParametricEq` nodes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of filter slots held by a parametric EQ.
pub const FILTER_SLOTS: usize = 8;

/// One biquad section as it appears on the wire.
///
/// The `type` field selects the variant; every variant carries exactly the
/// numeric fields it needs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BiquadFilterType {
    Allpass {
        filter_freq: f64,
        q_factor: f64,
    },
    Bandpass {
        filter_freq: f64,
        bw: f64,
    },
    Bandstop {
        filter_freq: f64,
        bw: f64,
    },
    #[default]
    Bypass,
    ConstantQ {
        filter_freq: f64,
        q_factor: f64,
        boost_db: f64,
    },
    Gain {
        gain_db: f64,
    },
    Highpass {
        filter_freq: f64,
        q_factor: f64,
    },
    Highshelf {
        filter_freq: f64,
        q_factor: f64,
        boost_db: f64,
    },
    Linkwitz {
        f0: f64,
        q0: f64,
        fp: f64,
        qp: f64,
    },
    Lowpass {
        filter_freq: f64,
        q_factor: f64,
    },
    Lowshelf {
        filter_freq: f64,
        q_factor: f64,
        boost_db: f64,
    },
    Notch {
        filter_freq: f64,
        q_factor: f64,
    },
    Peaking {
        filter_freq: f64,
        q_factor: f64,
        boost_db: f64,
    },
}

impl BiquadFilterType {
    /// Discriminant of this filter.
    pub fn kind(&self) -> FilterKind {
        match self {
            BiquadFilterType::Allpass { .. } => FilterKind::Allpass,
            BiquadFilterType::Bandpass { .. } => FilterKind::Bandpass,
            BiquadFilterType::Bandstop { .. } => FilterKind::Bandstop,
            BiquadFilterType::Bypass => FilterKind::Bypass,
            BiquadFilterType::ConstantQ { .. } => FilterKind::ConstantQ,
            BiquadFilterType::Gain { .. } => FilterKind::Gain,
            BiquadFilterType::Highpass { .. } => FilterKind::Highpass,
            BiquadFilterType::Highshelf { .. } => FilterKind::Highshelf,
            BiquadFilterType::Linkwitz { .. } => FilterKind::Linkwitz,
            BiquadFilterType::Lowpass { .. } => FilterKind::Lowpass,
            BiquadFilterType::Lowshelf { .. } => FilterKind::Lowshelf,
            BiquadFilterType::Notch { .. } => FilterKind::Notch,
            BiquadFilterType::Peaking { .. } => FilterKind::Peaking,
        }
    }

    /// Returns `true` when the slot contributes nothing to the response.
    pub fn is_bypass(&self) -> bool {
        matches!(self, BiquadFilterType::Bypass)
    }

    /// Creates a filter of the given kind populated with editor defaults:
    /// 1 kHz, Q 0.707, one octave of bandwidth and no boost.
    pub fn with_defaults(kind: FilterKind) -> Self {
        const FREQ: f64 = 1000.0;
        const Q: f64 = 0.707;
        match kind {
            FilterKind::Allpass => BiquadFilterType::Allpass {
                filter_freq: FREQ,
                q_factor: Q,
            },
            FilterKind::Bandpass => BiquadFilterType::Bandpass {
                filter_freq: FREQ,
                bw: 1.0,
            },
            FilterKind::Bandstop => BiquadFilterType::Bandstop {
                filter_freq: FREQ,
                bw: 1.0,
            },
            FilterKind::Bypass => BiquadFilterType::Bypass,
            FilterKind::ConstantQ => BiquadFilterType::ConstantQ {
                filter_freq: FREQ,
                q_factor: Q,
                boost_db: 0.0,
            },
            FilterKind::Gain => BiquadFilterType::Gain { gain_db: 0.0 },
            FilterKind::Highpass => BiquadFilterType::Highpass {
                filter_freq: FREQ,
                q_factor: Q,
            },
            FilterKind::Highshelf => BiquadFilterType::Highshelf {
                filter_freq: FREQ,
                q_factor: Q,
                boost_db: 0.0,
            },
            FilterKind::Linkwitz => BiquadFilterType::Linkwitz {
                f0: FREQ,
                q0: Q,
                fp: 2000.0,
                qp: Q,
            },
            FilterKind::Lowpass => BiquadFilterType::Lowpass {
                filter_freq: FREQ,
                q_factor: Q,
            },
            FilterKind::Lowshelf => BiquadFilterType::Lowshelf {
                filter_freq: FREQ,
                q_factor: Q,
                boost_db: 0.0,
            },
            FilterKind::Notch => BiquadFilterType::Notch {
                filter_freq: FREQ,
                q_factor: Q,
            },
            FilterKind::Peaking => BiquadFilterType::Peaking {
                filter_freq: FREQ,
                q_factor: Q,
                boost_db: 0.0,
            },
        }
    }
}

/// Filter discriminant without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Allpass,
    Bandpass,
    Bandstop,
    Bypass,
    ConstantQ,
    Gain,
    Highpass,
    Highshelf,
    Linkwitz,
    Lowpass,
    Lowshelf,
    Notch,
    Peaking,
}

impl FilterKind {
    /// Every filter kind in wire-name order.
    pub const ALL: [FilterKind; 13] = [
        FilterKind::Allpass,
        FilterKind::Bandpass,
        FilterKind::Bandstop,
        FilterKind::Bypass,
        FilterKind::ConstantQ,
        FilterKind::Gain,
        FilterKind::Highpass,
        FilterKind::Highshelf,
        FilterKind::Linkwitz,
        FilterKind::Lowpass,
        FilterKind::Lowshelf,
        FilterKind::Notch,
        FilterKind::Peaking,
    ];

    /// Name used for the `type` discriminant on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterKind::Allpass => "allpass",
            FilterKind::Bandpass => "bandpass",
            FilterKind::Bandstop => "bandstop",
            FilterKind::Bypass => "bypass",
            FilterKind::ConstantQ => "constant_q",
            FilterKind::Gain => "gain",
            FilterKind::Highpass => "highpass",
            FilterKind::Highshelf => "highshelf",
            FilterKind::Linkwitz => "linkwitz",
            FilterKind::Lowpass => "lowpass",
            FilterKind::Lowshelf => "lowshelf",
            FilterKind::Notch => "notch",
            FilterKind::Peaking => "peaking",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = UnknownFilterKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownFilterKind(s.to_string()))
    }
}

/// Returned when a string does not name a filter kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter type `{0}`")]
pub struct UnknownFilterKind(pub String);

/// Parameters of a `ParametricEq` node: exactly [`FILTER_SLOTS`] filters in
/// cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ParametricEqParameters {
    pub filters: [BiquadFilterType; FILTER_SLOTS],
}

impl ParametricEqParameters {
    /// Returns a copy with `slot` replaced by `filter`; out-of-range slots are
    /// ignored.
    pub fn with_filter(mut self, slot: usize, filter: BiquadFilterType) -> Self {
        if let Some(target) = self.filters.get_mut(slot) {
            *target = filter;
        }
        self
    }

    /// Number of slots that are not bypassed.
    pub fn active_filters(&self) -> usize {
        self.filters.iter().filter(|filter| !filter.is_bypass()).count()
    }
}
