//! Backend abstraction and an in-process implementation.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tonegraph_graph::Graph;

use crate::error::ClientError;

/// Stream of graph snapshots pushed by the backend. The channel closes when
/// the backend ends the stream.
pub type GraphUpdates = mpsc::Receiver<Result<Graph, ClientError>>;

pub(crate) const UPDATE_BUFFER: usize = 16;

/// Recorded audio for one graph input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInput {
    /// Name of the graph input the audio feeds.
    pub name: String,
    pub file_name: String,
    pub wav: Vec<u8>,
}

impl AudioInput {
    pub fn new(name: impl Into<String>, wav: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            file_name: format!("{name}.wav"),
            name,
            wav,
        }
    }
}

/// Operations offered by a graph backend.
pub trait GraphBackend: Send + Sync {
    fn fetch_graph(&self) -> impl Future<Output = Result<Graph, ClientError>> + Send;

    /// Replaces the backend graph and returns the graph it accepted.
    fn push_graph(
        &self,
        graph: &Graph,
    ) -> impl Future<Output = Result<Graph, ClientError>> + Send;

    fn subscribe(&self) -> impl Future<Output = Result<GraphUpdates, ClientError>> + Send;

    /// Runs the graph over one WAV per input and returns a zip archive with
    /// one WAV per output.
    fn render_audio(
        &self,
        inputs: Vec<AudioInput>,
    ) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;

    fn download_source(&self) -> impl Future<Output = Result<Vec<u8>, ClientError>> + Send;
}

/// Backend living in the same process.
///
/// Useful for tests and offline editing. It can be switched unavailable to
/// exercise failure handling.
#[derive(Debug)]
pub struct MemoryBackend {
    graph: Mutex<Graph>,
    subscribers: Mutex<Vec<mpsc::Sender<Result<Graph, ClientError>>>>,
    rendered: Mutex<Vec<u8>>,
    source: Mutex<Vec<u8>>,
    renders: Mutex<Vec<Vec<AudioInput>>>,
    available: AtomicBool,
    pushes: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(graph: Graph) -> Self {
        Self {
            graph: Mutex::new(graph),
            subscribers: Mutex::new(Vec::new()),
            rendered: Mutex::new(Vec::new()),
            source: Mutex::new(Vec::new()),
            renders: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
            pushes: AtomicUsize::new(0),
        }
    }

    /// Archive returned by [`GraphBackend::render_audio`].
    pub fn with_rendered_archive(self, archive: Vec<u8>) -> Self {
        *self.rendered.lock() = archive;
        self
    }

    /// Archive returned by [`GraphBackend::download_source`].
    pub fn with_source_archive(self, archive: Vec<u8>) -> Self {
        *self.source.lock() = archive;
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn graph(&self) -> Graph {
        self.graph.lock().clone()
    }

    /// Number of pushes accepted so far.
    pub fn push_count(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    /// Inputs of every render request, oldest first.
    pub fn render_requests(&self) -> Vec<Vec<AudioInput>> {
        self.renders.lock().clone()
    }

    /// Replaces the backend graph and sends the snapshot to subscribers.
    pub fn publish(&self, graph: Graph) {
        *self.graph.lock() = graph.clone();
        self.broadcast(Ok(&graph));
    }

    /// Sends subscribers an update that failed to decode.
    pub fn publish_malformed(&self, reason: &str) {
        self.broadcast(Err(reason));
    }

    /// Ends every open update stream.
    pub fn close_streams(&self) {
        self.subscribers.lock().clear();
    }

    fn broadcast(&self, update: Result<&Graph, &str>) {
        self.subscribers.lock().retain(|tx| {
            let message = match update {
                Ok(graph) => Ok(graph.clone()),
                Err(reason) => Err(ClientError::malformed(reason)),
            };
            tx.try_send(message).is_ok()
        });
    }

    fn check_available(&self, operation: &str) -> Result<(), ClientError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::unavailable(
                format!("memory://{operation}"),
                "backend switched off",
            ))
        }
    }
}

impl GraphBackend for MemoryBackend {
    async fn fetch_graph(&self) -> Result<Graph, ClientError> {
        self.check_available("graph")?;
        Ok(self.graph())
    }

    async fn push_graph(&self, graph: &Graph) -> Result<Graph, ClientError> {
        self.check_available("graph")?;
        *self.graph.lock() = graph.clone();
        self.pushes.fetch_add(1, Ordering::SeqCst);
        Ok(graph.clone())
    }

    async fn subscribe(&self) -> Result<GraphUpdates, ClientError> {
        self.check_available("graph-updates")?;
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);
        self.subscribers.lock().push(tx);
        Ok(rx)
    }

    async fn render_audio(&self, inputs: Vec<AudioInput>) -> Result<Vec<u8>, ClientError> {
        self.check_available("graph/audio")?;
        self.renders.lock().push(inputs);
        Ok(self.rendered.lock().clone())
    }

    async fn download_source(&self) -> Result<Vec<u8>, ClientError> {
        self.check_available("graph/source")?;
        Ok(self.source.lock().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonegraph_graph::default_graph;

    #[tokio::test]
    async fn push_then_fetch_round_trips() {
        let backend = MemoryBackend::new(Graph::new("empty", 48_000));
        let graph = default_graph();
        let echoed = backend.push_graph(&graph).await.unwrap();
        assert_eq!(echoed, graph);
        assert_eq!(backend.fetch_graph().await.unwrap(), graph);
        assert_eq!(backend.push_count(), 1);
    }

    #[tokio::test]
    async fn unavailable_backend_fails_every_call() {
        let backend = MemoryBackend::new(default_graph());
        backend.set_available(false);
        assert!(matches!(
            backend.fetch_graph().await,
            Err(ClientError::BackendUnavailable { .. })
        ));
        assert!(backend.subscribe().await.is_err());
        assert_eq!(backend.push_count(), 0);
    }

    #[tokio::test]
    async fn subscribers_receive_published_snapshots() {
        let backend = MemoryBackend::new(default_graph());
        let mut updates = backend.subscribe().await.unwrap();
        backend.publish(Graph::new("next", 44_100));
        let received = updates.recv().await.unwrap().unwrap();
        assert_eq!(received.name, "next");
        backend.close_streams();
        assert!(updates.recv().await.is_none());
    }
}
