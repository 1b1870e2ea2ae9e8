//! Filter normalization and frequency-response analysis.

pub mod biquad;
pub mod normalize;
pub mod response;

pub use biquad::BiquadCoefficients;
pub use normalize::{normalize, normalize_value, FilterSpec, InvalidFilterSpec, SpecKind};
pub use response::{
    compute_response, compute_response_async, frequency_grid, response_for_node, FilterSlots,
    FrequencyResponse, ResponseComputation, DEFAULT_BINS, DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_RATE,
};
