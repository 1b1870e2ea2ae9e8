//! Editing session kept in sync with a backend.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tonegraph_dsp::FilterSlots;
use tonegraph_graph::{Graph, Node};
use tonegraph_preview::{Debouncer, PreviewConfig, PreviewResult, ResponseScheduler};

use crate::backend::{AudioInput, GraphBackend};
use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug)]
struct SessionState {
    graph: Graph,
    revision: u64,
    selected: Option<String>,
    /// Edited nodes not yet handed to a push, oldest first.
    unsynced: Vec<Node>,
}

/// The graph being edited, its response preview and its backend sync.
///
/// Edits apply to the local graph immediately. The edited graph is pushed
/// once no edit has arrived for the configured sync debounce. Snapshots
/// streamed by the backend replace the local graph, with edits that have
/// not been pushed yet applied on top. A failing
/// backend call is logged and never changes the local graph or the last
/// computed response.
pub struct GraphSession<B: GraphBackend + 'static> {
    backend: Arc<B>,
    state: Arc<RwLock<SessionState>>,
    preview: ResponseScheduler,
    sync: Debouncer,
}

impl<B: GraphBackend + 'static> GraphSession<B> {
    pub fn new(
        backend: Arc<B>,
        graph: Graph,
        client: &ClientConfig,
        preview: PreviewConfig,
    ) -> Self {
        Self {
            backend,
            state: Arc::new(RwLock::new(SessionState {
                graph,
                revision: 0,
                selected: None,
                unsynced: Vec::new(),
            })),
            preview: ResponseScheduler::new(preview),
            sync: Debouncer::new(client.sync_debounce),
        }
    }

    /// Starts a session from the graph currently held by the backend.
    pub async fn connect(
        backend: Arc<B>,
        client: &ClientConfig,
        preview: PreviewConfig,
    ) -> Result<Self, ClientError> {
        let graph = backend.fetch_graph().await?;
        tracing::info!(graph = %graph.name, nodes = graph.nodes.len(), "session connected");
        Ok(Self::new(backend, graph, client, preview))
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Current graph. Nodes are shared with the session, so this is cheap.
    pub fn graph(&self) -> Graph {
        self.state.read().graph.clone()
    }

    /// Incremented on every local edit and every applied snapshot.
    pub fn revision(&self) -> u64 {
        self.state.read().revision
    }

    pub fn selected(&self) -> Option<String> {
        self.state.read().selected.clone()
    }

    /// Selects the node whose response is previewed. Returns the preview
    /// generation when the node has a response.
    pub fn select_node(&self, name: &str) -> Result<Option<u64>, ClientError> {
        let node = {
            let mut state = self.state.write();
            let node = state
                .graph
                .node(name)
                .cloned()
                .ok_or_else(|| tonegraph_graph::GraphError::UnknownNode(name.to_string()))?;
            state.selected = Some(name.to_string());
            node
        };
        Ok(self.preview_node(&node))
    }

    pub fn clear_selection(&self) {
        self.state.write().selected = None;
        self.preview.cancel_pending();
    }

    /// Replaces the node with the same name, previews it if it is selected
    /// and schedules a push of the edited graph.
    pub fn edit_node(&self, node: Node) -> Result<Option<u64>, ClientError> {
        let edited = node.name().to_string();
        let selected = {
            let mut state = self.state.write();
            let graph = state.graph.with_node(node.clone())?;
            state.graph = graph;
            state.revision += 1;
            state.unsynced.retain(|pending| pending.name() != edited);
            state.unsynced.push(node);
            if state.selected.as_deref() == Some(edited.as_str()) {
                state.graph.node(&edited).cloned()
            } else {
                None
            }
        };
        let generation = selected.and_then(|node| self.preview_node(&node));
        self.schedule_push()?;
        Ok(generation)
    }

    fn preview_node(&self, node: &Node) -> Option<u64> {
        let slots = FilterSlots::for_node(node)?;
        let sample_rate = f64::from(self.state.read().graph.sample_rate);
        match self.preview.submit(slots, sample_rate) {
            Ok(generation) => Some(generation),
            Err(err) => {
                tracing::warn!(node = node.name(), %err, "keeping previous response");
                None
            }
        }
    }

    fn schedule_push(&self) -> Result<(), ClientError> {
        let backend = Arc::clone(&self.backend);
        let state = Arc::clone(&self.state);
        self.sync.call(async move {
            let (graph, revision) = {
                let mut state = state.write();
                state.unsynced.clear();
                (state.graph.clone(), state.revision)
            };
            match backend.push_graph(&graph).await {
                Ok(_) => tracing::debug!(revision, "graph synced with backend"),
                Err(err) => tracing::warn!(revision, %err, "graph sync failed, keeping local graph"),
            }
        })?;
        Ok(())
    }

    /// Pushes the current graph right away, dropping any scheduled push.
    pub async fn push_now(&self) -> Result<Graph, ClientError> {
        self.sync.cancel();
        let graph = {
            let mut state = self.state.write();
            state.unsynced.clear();
            state.graph.clone()
        };
        self.backend.push_graph(&graph).await
    }

    /// Whether a debounced push is waiting.
    pub fn push_pending(&self) -> bool {
        self.sync.is_pending()
    }

    /// Replaces the local graph with a backend snapshot.
    ///
    /// Edits still waiting for the debounced push are applied over the
    /// snapshot so the push carries them. An edit whose node is missing from
    /// the snapshot is dropped, and the push is cancelled once no edit is
    /// left. The selection survives if the new graph still has a node of
    /// that name.
    pub fn apply_snapshot(&self, graph: Graph) {
        let node = {
            let mut state = self.state.write();
            let mut merged = graph;
            let unsynced = std::mem::take(&mut state.unsynced);
            for edit in unsynced {
                match merged.with_node(edit.clone()) {
                    Ok(graph) => {
                        merged = graph;
                        state.unsynced.push(edit);
                    }
                    Err(err) => {
                        tracing::warn!(node = edit.name(), %err, "dropping unsynced edit");
                    }
                }
            }
            if state.unsynced.is_empty() {
                self.sync.cancel();
            }
            state.graph = merged;
            state.revision += 1;
            let node = state
                .selected
                .as_deref()
                .and_then(|name| state.graph.node(name).cloned());
            if node.is_none() {
                state.selected = None;
            }
            tracing::debug!(revision = state.revision, graph = %state.graph.name, "applied graph snapshot");
            node
        };
        if let Some(node) = node {
            self.preview_node(&node);
        }
    }

    /// Fetches the backend graph and applies it.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        match self.backend.fetch_graph().await {
            Ok(graph) => {
                self.apply_snapshot(graph);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(%err, "refresh failed, keeping local graph");
                Err(err)
            }
        }
    }

    /// Applies streamed snapshots until the backend ends the stream.
    ///
    /// Malformed updates are skipped. Returns the number of snapshots
    /// applied, or the transport error that ended the stream.
    pub async fn run_updates(&self) -> Result<usize, ClientError> {
        let mut updates = self.backend.subscribe().await?;
        let mut applied = 0;
        while let Some(update) = updates.recv().await {
            match update {
                Ok(graph) => {
                    self.apply_snapshot(graph);
                    applied += 1;
                }
                Err(err @ ClientError::MalformedUpdate { .. }) => {
                    tracing::warn!(%err, "skipping graph update");
                }
                Err(err) => {
                    tracing::warn!(%err, "graph update stream failed");
                    return Err(err);
                }
            }
        }
        Ok(applied)
    }

    /// Renders audio through the backend. Every graph input needs exactly
    /// one recording; they are uploaded in graph input order.
    pub async fn render(&self, inputs: Vec<AudioInput>) -> Result<Vec<u8>, ClientError> {
        let graph = self.graph();
        let mut by_name: HashMap<String, AudioInput> = HashMap::new();
        for input in inputs {
            if !graph.inputs.iter().any(|graph_input| graph_input.name == input.name) {
                return Err(ClientError::UnknownInput(input.name));
            }
            by_name.insert(input.name.clone(), input);
        }
        let mut ordered = Vec::with_capacity(graph.inputs.len());
        for graph_input in &graph.inputs {
            let input = by_name
                .remove(&graph_input.name)
                .ok_or_else(|| ClientError::MissingInput(graph_input.name.clone()))?;
            ordered.push(input);
        }
        self.backend.render_audio(ordered).await
    }

    /// Downloads the source archive and the file name it should be saved
    /// under.
    pub async fn download_source(&self) -> Result<(String, Vec<u8>), ClientError> {
        let name = source_archive_name(&self.graph());
        let archive = self.backend.download_source().await?;
        Ok((name, archive))
    }

    pub fn preview(&self) -> Option<Arc<PreviewResult>> {
        self.preview.current()
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<Option<Arc<PreviewResult>>> {
        self.preview.subscribe()
    }

    pub fn preview_in_flight(&self) -> bool {
        self.preview.in_flight()
    }
}

/// File name for a graph's source archive: the graph name lowercased, runs
/// of characters other than ASCII letters, digits and `_` replaced by a
/// single `_`, plus `.zip`.
pub fn source_archive_name(graph: &Graph) -> String {
    let mut stem = String::with_capacity(graph.name.len());
    let mut in_run = false;
    for ch in graph.name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            stem.push(ch);
            in_run = false;
        } else if !in_run {
            stem.push('_');
            in_run = true;
        }
    }
    format!("{stem}.zip")
}
