//! Cascaded frequency response over a logarithmic sweep.
//!
//! The computation is an iterator over bin chunks so callers can interleave
//! it with other work; [`compute_response_async`] yields to the runtime
//! between chunks.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tonegraph_graph::{BiquadFilterType, Node, ParametricEqParameters, FILTER_SLOTS};
use tonegraph_utils::{gain_to_db, SpanTimer};

use crate::biquad::BiquadCoefficients;
use crate::normalize::{normalize, InvalidFilterSpec};

pub const DEFAULT_BINS: usize = 512;
pub const DEFAULT_CHUNK_SIZE: usize = 64;
pub const DEFAULT_SAMPLE_RATE: f64 = 48_000.0;

const GRID_START_HZ: f64 = 20.0;
/// Ratio between the last and first grid frequency (20 Hz to 20 kHz).
const GRID_SPAN: f64 = 1000.0;

/// `bins` log-spaced frequencies from 20 Hz to 20 kHz inclusive.
pub fn frequency_grid(bins: usize) -> Vec<f64> {
    match bins {
        0 => Vec::new(),
        1 => vec![GRID_START_HZ],
        _ => {
            let last = (bins - 1) as f64;
            (0..bins)
                .map(|i| GRID_START_HZ * GRID_SPAN.powf(i as f64 / last))
                .collect()
        }
    }
}

/// Magnitude and phase of a filter cascade, one entry per frequency bin.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FrequencyResponse {
    pub frequencies: Vec<f64>,
    pub magnitudes_db: Vec<f64>,
    pub phases_rad: Vec<f64>,
}

impl FrequencyResponse {
    /// Flat response over `frequencies`.
    pub fn unity(frequencies: Vec<f64>) -> Self {
        let len = frequencies.len();
        Self {
            frequencies,
            magnitudes_db: vec![0.0; len],
            phases_rad: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Index of the bin closest to `freq` on a log scale.
    pub fn nearest_bin(&self, freq: f64) -> Option<usize> {
        let target = freq.max(f64::MIN_POSITIVE).ln();
        self.frequencies
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                (a.ln() - target)
                    .abs()
                    .total_cmp(&(b.ln() - target).abs())
            })
            .map(|(index, _)| index)
    }

    /// `(frequency, magnitude_db, phase_rad)` triples.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64, f64)> + '_ {
        self.frequencies
            .iter()
            .zip(&self.magnitudes_db)
            .zip(&self.phases_rad)
            .map(|((&freq, &mag), &phase)| (freq, mag, phase))
    }
}

/// The eight filter slots of a cascade, in processing order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FilterSlots(pub [BiquadFilterType; FILTER_SLOTS]);

impl FilterSlots {
    /// All slots bypassed.
    pub fn bypassed() -> Self {
        Self::default()
    }

    pub fn from_parametric_eq(parameters: &ParametricEqParameters) -> Self {
        Self(parameters.filters)
    }

    /// A single filter promoted into slot 0; the other slots are bypassed.
    pub fn from_single(filter: BiquadFilterType) -> Self {
        let mut slots = [BiquadFilterType::Bypass; FILTER_SLOTS];
        slots[0] = filter;
        Self(slots)
    }

    /// Slots previewed for `node`, or `None` when the node is neither a
    /// `Biquad` nor a `ParametricEq`. Nodes without parameters preview as
    /// all-bypass.
    pub fn for_node(node: &Node) -> Option<Self> {
        match node {
            Node::Biquad(body) => Some(
                body.parameters
                    .map(|parameters| Self::from_single(parameters.filter_type))
                    .unwrap_or_default(),
            ),
            Node::ParametricEq(body) => Some(
                body.parameters
                    .as_ref()
                    .map(Self::from_parametric_eq)
                    .unwrap_or_default(),
            ),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BiquadFilterType> {
        self.0.iter()
    }
}

/// Incremental evaluation of a cascade. Each call to `next` fills one chunk
/// of bins and returns the range it filled.
#[derive(Debug, Clone)]
pub struct ResponseComputation {
    sections: Vec<BiquadCoefficients>,
    sample_rate: f64,
    chunk_size: usize,
    next_bin: usize,
    response: FrequencyResponse,
}

impl ResponseComputation {
    /// Computation over the default 512-bin grid in chunks of 64.
    pub fn new(slots: &FilterSlots, sample_rate: f64) -> Result<Self, InvalidFilterSpec> {
        Self::with_grid(slots, sample_rate, DEFAULT_BINS, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_grid(
        slots: &FilterSlots,
        sample_rate: f64,
        bins: usize,
        chunk_size: usize,
    ) -> Result<Self, InvalidFilterSpec> {
        let mut sections = Vec::new();
        for filter in slots.iter() {
            for spec in normalize(filter)? {
                sections.push(BiquadCoefficients::design(&spec, sample_rate));
            }
        }
        Ok(Self {
            sections,
            sample_rate,
            chunk_size: chunk_size.max(1),
            next_bin: 0,
            response: FrequencyResponse::unity(frequency_grid(bins)),
        })
    }

    /// Number of biquad sections that contribute to the response.
    pub fn active_sections(&self) -> usize {
        self.sections.len()
    }

    pub fn is_finished(&self) -> bool {
        self.next_bin >= self.response.len()
    }

    /// Runs any remaining chunks and returns the response.
    pub fn finish(mut self) -> FrequencyResponse {
        while self.next().is_some() {}
        self.response
    }

    fn evaluate_bin(&mut self, bin: usize) {
        // With nothing active the unity values written at construction stand.
        if self.sections.is_empty() {
            return;
        }
        let freq = self.response.frequencies[bin];
        let mut magnitude_db = 0.0;
        let mut phase = 0.0;
        for section in &self.sections {
            let (magnitude, section_phase) = section.magnitude_phase(freq, self.sample_rate);
            magnitude_db += gain_to_db(magnitude);
            phase += section_phase;
        }
        self.response.magnitudes_db[bin] = magnitude_db;
        self.response.phases_rad[bin] = phase;
    }
}

impl Iterator for ResponseComputation {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Range<usize>> {
        if self.is_finished() {
            return None;
        }
        let start = self.next_bin;
        let end = (start + self.chunk_size).min(self.response.len());
        for bin in start..end {
            self.evaluate_bin(bin);
        }
        self.next_bin = end;
        Some(start..end)
    }
}

/// Computes the cascaded response of `slots` in one go.
pub fn compute_response(
    slots: &FilterSlots,
    sample_rate: f64,
) -> Result<FrequencyResponse, InvalidFilterSpec> {
    let computation = ResponseComputation::new(slots, sample_rate)?;
    let timer = SpanTimer::new("compute_response").with_bins(computation.response.len());
    let response = computation.finish();
    timer.finish();
    Ok(response)
}

/// Response of a `Biquad` or `ParametricEq` node; `None` for other kinds.
pub fn response_for_node(
    node: &Node,
    sample_rate: f64,
) -> Option<Result<FrequencyResponse, InvalidFilterSpec>> {
    FilterSlots::for_node(node).map(|slots| compute_response(&slots, sample_rate))
}

/// Computes the cascaded response, yielding to the runtime after every chunk.
pub async fn compute_response_async(
    mut computation: ResponseComputation,
) -> FrequencyResponse {
    let timer =
        SpanTimer::new("compute_response_async").with_bins(computation.response.len());
    while let Some(range) = computation.next() {
        tracing::trace!(start = range.start, end = range.end, "response chunk done");
        tokio::task::yield_now().await;
    }
    timer.finish();
    computation.response
}
