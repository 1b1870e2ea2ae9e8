//! Debounced response scheduling with generation-ordered publication.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tonegraph_dsp::{compute_response_async, FilterSlots, ResponseComputation};
use tonegraph_graph::Node;

use crate::config::PreviewConfig;
use crate::debounce::Debouncer;
use crate::store::{PreviewResult, ResponseStore};
use crate::ScheduleError;

/// Decrements the in-flight counter even if the computation is dropped.
struct InFlightGuard(Arc<AtomicUsize>);

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Schedules response previews for filter edits.
///
/// Every submission is tagged with a new generation. Submissions inside the
/// debounce window replace each other; computations that have started run
/// to completion, and their results are published only if nothing newer has
/// been applied meanwhile.
#[derive(Debug)]
pub struct ResponseScheduler {
    config: PreviewConfig,
    debouncer: Debouncer,
    store: Arc<ResponseStore>,
    next_generation: AtomicU64,
    in_flight: Arc<AtomicUsize>,
    started: Arc<AtomicU64>,
}

impl Default for ResponseScheduler {
    fn default() -> Self {
        Self::new(PreviewConfig::default())
    }
}

impl ResponseScheduler {
    pub fn new(config: PreviewConfig) -> Self {
        Self {
            debouncer: Debouncer::new(config.debounce),
            config,
            store: Arc::new(ResponseStore::new()),
            next_generation: AtomicU64::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            started: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &PreviewConfig {
        &self.config
    }

    /// Submits `slots` for preview and returns the generation assigned to
    /// the submission.
    ///
    /// Filter slots are normalized here, so invalid parameters are reported
    /// to the caller instead of surfacing inside the computation.
    pub fn submit(&self, slots: FilterSlots, sample_rate: f64) -> Result<u64, ScheduleError> {
        let computation = ResponseComputation::with_grid(
            &slots,
            sample_rate,
            self.config.bins,
            self.config.chunk_size,
        )?;
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let store = Arc::clone(&self.store);
        let in_flight = Arc::clone(&self.in_flight);
        let started = Arc::clone(&self.started);

        // In flight from the moment the window elapses, before the spawned
        // computation is first polled.
        self.debouncer.call_with(move || {
            let guard = InFlightGuard::enter(&in_flight);
            started.fetch_add(1, Ordering::SeqCst);
            async move {
                let _guard = guard;
                tracing::debug!(
                    generation,
                    sections = computation.active_sections(),
                    "preview computation started"
                );
                let response = compute_response_async(computation).await;
                store.apply(generation, response);
            }
        })?;
        tracing::trace!(generation, "preview submitted");
        Ok(generation)
    }

    /// Submits the filter slots of `node` for preview, using the configured
    /// sample rate.
    pub fn submit_node(&self, node: &Node) -> Result<u64, ScheduleError> {
        let slots = FilterSlots::for_node(node).ok_or_else(|| ScheduleError::NotPreviewable {
            name: node.name().to_string(),
            kind: node.kind(),
        })?;
        self.submit(slots, self.config.sample_rate)
    }

    /// Drops the submission still waiting in the debounce window.
    pub fn cancel_pending(&self) -> bool {
        self.debouncer.cancel()
    }

    /// Whether at least one computation has left the debounce window and
    /// not yet finished.
    pub fn in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Generation of the most recent submission.
    pub fn latest_generation(&self) -> u64 {
        self.next_generation.load(Ordering::SeqCst)
    }

    /// Number of computations that have started so far.
    pub fn computations_started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Option<Arc<PreviewResult>> {
        self.store.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<PreviewResult>>> {
        self.store.subscribe()
    }

    pub fn store(&self) -> &Arc<ResponseStore> {
        &self.store
    }
}
