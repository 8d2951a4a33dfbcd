use std::io;
use std::time::Duration;

/// Failure while reconstructing the cluster topology.
///
/// Any of these aborts the topology for the current cycle; the previously
/// published topology stays in place until a later cycle succeeds.
#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("{kind} {name} not found")]
    Lookup { kind: &'static str, name: String },

    #[error("Malformed cluster data: {0}")]
    MalformedInput(String),

    #[error("Cluster API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Cluster API {url} returned status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Cluster client setup failed: {0}")]
    Setup(String),
}

impl From<serde_json::Error> for TopologyError {
    fn from(e: serde_json::Error) -> Self {
        TopologyError::MalformedInput(e.to_string())
    }
}

/// Failure of a single backing-service probe. Only marks that service down.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unhealthy: {0}")]
    Unhealthy(String),

    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("{program} exited with code {code:?}")]
    CommandFailed { program: String, code: Option<i32> },

    #[error("Unexpected output from {program}")]
    UnexpectedOutput { program: String },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}
