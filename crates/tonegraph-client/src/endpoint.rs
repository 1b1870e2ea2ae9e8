//! Backend routes.

use reqwest::Url;

use crate::config::ClientConfig;
use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `GET` the current graph, `POST` a replacement.
    Graph,
    /// Server-sent stream of graph snapshots.
    GraphUpdates,
    /// Multipart WAV upload returning a zip of rendered outputs.
    GraphAudio,
    /// Downloadable source archive.
    GraphSource,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Graph => "graph",
            Route::GraphUpdates => "graph-updates",
            Route::GraphAudio => "graph/audio",
            Route::GraphSource => "graph/source",
        }
    }
}

/// Builds session-scoped URLs below a backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    base: Url,
    session_id: String,
}

impl Endpoint {
    pub fn new(base_url: &str, session_id: impl Into<String>) -> Result<Self, ClientError> {
        // Routes are joined relative to the base, which must end in a slash
        // to keep any path prefix it carries.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base = Url::parse(&normalized).map_err(|err| ClientError::InvalidUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl {
                url: base_url.to_string(),
                reason: "not a hierarchical url".to_string(),
            });
        }
        Ok(Self {
            base,
            session_id: session_id.into(),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(&config.base_url, config.session_id.clone())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn url(&self, route: Route) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(route.path().split('/'));
        }
        url.query_pairs_mut()
            .clear()
            .append_pair("session_id", &self.session_id);
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routes_carry_the_session() {
        let endpoint = Endpoint::new("http://localhost:8000", "42").unwrap();
        assert_eq!(
            endpoint.url(Route::Graph).as_str(),
            "http://localhost:8000/graph?session_id=42"
        );
        assert_eq!(
            endpoint.url(Route::GraphUpdates).as_str(),
            "http://localhost:8000/graph-updates?session_id=42"
        );
        assert_eq!(
            endpoint.url(Route::GraphAudio).as_str(),
            "http://localhost:8000/graph/audio?session_id=42"
        );
        assert_eq!(
            endpoint.url(Route::GraphSource).as_str(),
            "http://localhost:8000/graph/source?session_id=42"
        );
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let endpoint = Endpoint::new("https://studio.example/api/", "a b").unwrap();
        assert_eq!(
            endpoint.url(Route::Graph).as_str(),
            "https://studio.example/api/graph?session_id=a+b"
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            Endpoint::new("not a url", "42"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }
}
