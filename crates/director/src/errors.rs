use a2a_rs::client::ClientError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("LLM request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("LLM responded with HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("could not parse agent selection: {0}")]
    Parse(String),
}

/// Failure talking to a downstream agent.
///
/// Connection-class failures (agent unreachable) are kept apart from every
/// other failure so callers can report them differently.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("{0}")]
    Connection(String),
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    pub fn is_connection(&self) -> bool {
        matches!(self, TransportError::Connection(_))
    }
}

impl From<ClientError> for TransportError {
    fn from(e: ClientError) -> Self {
        if e.is_connection() {
            TransportError::Connection(e.to_string())
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectorError {
    #[error("agent selection failed: {0}")]
    Selection(#[from] SelectionError),
    #[error("Unknown agent_id: {0}")]
    UnknownAgent(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{0}")]
    Unsupported(String),
}
