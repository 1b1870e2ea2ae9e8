//! HTTP implementation of [`GraphBackend`].

use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use tokio::sync::mpsc;
use tonegraph_graph::Graph;

use crate::backend::{AudioInput, GraphBackend, GraphUpdates, UPDATE_BUFFER};
use crate::config::ClientConfig;
use crate::endpoint::{Endpoint, Route};
use crate::error::ClientError;
use crate::sse::SseDecoder;

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    endpoint: Endpoint,
    config: ClientConfig,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let endpoint = Endpoint::from_config(&config)?;
        // Only the connect phase is bounded client-wide; the update stream
        // stays open indefinitely, so per-request timeouts cover the rest.
        let client = Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|err| ClientError::unavailable(&config.base_url, err))?;
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn send(&self, url: &Url, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request
            .send()
            .await
            .map_err(|err| ClientError::unavailable(url, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::unavailable(url, format!("status {status}")));
        }
        Ok(response)
    }

    async fn graph_body(&self, url: &Url, response: Response) -> Result<Graph, ClientError> {
        let body = response
            .bytes()
            .await
            .map_err(|err| ClientError::unavailable(url, err))?;
        Graph::from_slice(&body).map_err(ClientError::malformed)
    }

    async fn archive_body(&self, url: &Url, response: Response) -> Result<Vec<u8>, ClientError> {
        response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|err| ClientError::unavailable(url, err))
    }
}

impl GraphBackend for HttpBackend {
    async fn fetch_graph(&self) -> Result<Graph, ClientError> {
        let url = self.endpoint.url(Route::Graph);
        tracing::debug!(%url, "fetching graph");
        let request = self
            .client
            .get(url.clone())
            .timeout(self.config.request_timeout);
        let response = self.send(&url, request).await?;
        self.graph_body(&url, response).await
    }

    async fn push_graph(&self, graph: &Graph) -> Result<Graph, ClientError> {
        let url = self.endpoint.url(Route::Graph);
        tracing::debug!(%url, graph = %graph.name, "pushing graph");
        let request = self
            .client
            .post(url.clone())
            .timeout(self.config.request_timeout)
            .json(graph);
        let response = self.send(&url, request).await?;
        self.graph_body(&url, response).await
    }

    async fn subscribe(&self) -> Result<GraphUpdates, ClientError> {
        let url = self.endpoint.url(Route::GraphUpdates);
        tracing::debug!(%url, "subscribing to graph updates");
        let request = self
            .client
            .get(url.clone())
            .header(ACCEPT, "text/event-stream");
        let mut response = self.send(&url, request).await?;
        let (tx, rx) = mpsc::channel(UPDATE_BUFFER);

        tokio::spawn(async move {
            let mut decoder = SseDecoder::new();
            loop {
                match response.chunk().await {
                    Ok(Some(chunk)) => {
                        for event in decoder.push(&chunk) {
                            if tx.send(event).await.is_err() {
                                return;
                            }
                        }
                    }
                    Ok(None) => {
                        decoder.finish();
                        tracing::debug!(%url, "graph update stream ended");
                        return;
                    }
                    Err(err) => {
                        let _ = tx.send(Err(ClientError::unavailable(&url, err))).await;
                        return;
                    }
                }
            }
        });
        Ok(rx)
    }

    async fn render_audio(&self, inputs: Vec<AudioInput>) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint.url(Route::GraphAudio);
        let mut form = Form::new();
        for input in inputs {
            let part = Part::bytes(input.wav)
                .file_name(input.file_name)
                .mime_str("audio/wav")
                .map_err(|err| ClientError::unavailable(&url, err))?;
            form = form.part(input.name, part);
        }
        tracing::debug!(%url, "uploading audio for rendering");
        let request = self
            .client
            .post(url.clone())
            .timeout(self.config.request_timeout)
            .multipart(form);
        let response = self.send(&url, request).await?;
        self.archive_body(&url, response).await
    }

    async fn download_source(&self) -> Result<Vec<u8>, ClientError> {
        let url = self.endpoint.url(Route::GraphSource);
        tracing::debug!(%url, "downloading graph source");
        let request = self
            .client
            .get(url.clone())
            .timeout(self.config.request_timeout);
        let response = self.send(&url, request).await?;
        self.archive_body(&url, response).await
    }
}
