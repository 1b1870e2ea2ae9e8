use std::sync::Arc;

use tokio::sync::watch;
use tonegraph_dsp::FrequencyResponse;

/// A computed response tagged with the generation of the edit it reflects.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewResult {
    pub generation: u64,
    pub response: FrequencyResponse,
}

/// Latest applied preview result.
///
/// Results are applied only when their generation is newer than the one
/// already held, so a slow computation finishing after a faster, newer one
/// never replaces it.
#[derive(Debug)]
pub struct ResponseStore {
    latest: watch::Sender<Option<Arc<PreviewResult>>>,
}

impl Default for ResponseStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseStore {
    pub fn new() -> Self {
        let (latest, _) = watch::channel(None);
        Self { latest }
    }

    /// Applies `response` if `generation` is newer than the current result.
    /// Returns whether it was applied.
    pub fn apply(&self, generation: u64, response: FrequencyResponse) -> bool {
        let mut held = 0;
        let applied = self.latest.send_if_modified(|current| match current {
            Some(existing) if existing.generation >= generation => {
                held = existing.generation;
                false
            }
            _ => {
                *current = Some(Arc::new(PreviewResult {
                    generation,
                    response,
                }));
                true
            }
        });
        if applied {
            tracing::debug!(generation, "preview response applied");
        } else {
            tracing::warn!(generation, held, "discarding stale preview response");
        }
        applied
    }

    pub fn current(&self) -> Option<Arc<PreviewResult>> {
        self.latest.borrow().clone()
    }

    /// Generation of the current result, 0 when nothing was applied yet.
    pub fn generation(&self) -> u64 {
        self.latest
            .borrow()
            .as_ref()
            .map_or(0, |result| result.generation)
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<PreviewResult>>> {
        self.latest.subscribe()
    }
}
