use std::time::Duration;

use serde::{Deserialize, Serialize};
use tonegraph_dsp::{DEFAULT_BINS, DEFAULT_CHUNK_SIZE, DEFAULT_SAMPLE_RATE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Quiet period required before a computation starts.
    pub debounce: Duration,
    pub bins: usize,
    /// Bins evaluated between two yields to the runtime.
    pub chunk_size: usize,
    /// Used when the graph does not provide one.
    pub sample_rate: f64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            bins: DEFAULT_BINS,
            chunk_size: DEFAULT_CHUNK_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

impl PreviewConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        self.bins = bins;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}
