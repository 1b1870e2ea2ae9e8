//! Client side of the tonegraph backend.
//!
//! [`GraphSession`] owns the graph being edited and keeps it in sync with a
//! [`GraphBackend`]: edits apply locally at once, pushes are debounced and
//! snapshots streamed by the backend replace the local graph.

pub mod backend;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod session;
pub mod sse;

pub use backend::{AudioInput, GraphBackend, GraphUpdates, MemoryBackend};
pub use config::ClientConfig;
pub use endpoint::{Endpoint, Route};
pub use error::ClientError;
pub use http::HttpBackend;
pub use session::{source_archive_name, GraphSession};
pub use sse::{SseDecoder, MAX_LINE_BYTES};
