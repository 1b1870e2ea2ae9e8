use thiserror::Error;
use tonegraph_graph::GraphError;
use tonegraph_preview::ScheduleError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport failure or non-success status from the backend.
    #[error("backend unavailable ({url}): {reason}")]
    BackendUnavailable { url: String, reason: String },
    /// A body or stream event that does not parse as a graph.
    #[error("malformed graph update: {reason}")]
    MalformedUpdate { reason: String },
    #[error("invalid backend url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("graph has no input named `{0}`")]
    UnknownInput(String),
    #[error("no audio provided for graph input `{0}`")]
    MissingInput(String),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl ClientError {
    pub(crate) fn unavailable(url: impl ToString, reason: impl ToString) -> Self {
        ClientError::BackendUnavailable {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(reason: impl ToString) -> Self {
        ClientError::MalformedUpdate {
            reason: reason.to_string(),
        }
    }

    /// Whether the failure came from talking to the backend rather than from
    /// local input.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ClientError::BackendUnavailable { .. } | ClientError::MalformedUpdate { .. }
        )
    }
}
