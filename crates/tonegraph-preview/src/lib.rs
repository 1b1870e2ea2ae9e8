//! Response preview scheduling.
//!
//! Parameter edits arrive in bursts. [`ResponseScheduler`] coalesces them
//! through a [`Debouncer`], runs the chunked response computation on the
//! Tokio runtime and publishes results through a [`ResponseStore`] that only
//! accepts results newer than the one it holds.

pub mod config;
pub mod debounce;
pub mod scheduler;
pub mod store;

pub use config::PreviewConfig;
pub use debounce::Debouncer;
pub use scheduler::ResponseScheduler;
pub use store::{PreviewResult, ResponseStore};

use thiserror::Error;
use tonegraph_dsp::InvalidFilterSpec;
use tonegraph_graph::NodeKind;

/// Errors reported when scheduling a preview.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Scheduling needs a Tokio runtime on the current thread.
    #[error("no tokio runtime available to schedule the computation")]
    NoRuntime,
    #[error(transparent)]
    InvalidFilter(#[from] InvalidFilterSpec),
    /// Only `Biquad` and `ParametricEq` nodes have a response to preview.
    #[error("{kind} node `{name}` has no frequency response")]
    NotPreviewable { name: String, kind: NodeKind },
}
