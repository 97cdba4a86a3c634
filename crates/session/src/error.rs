//! Error types of the session core

use thiserror::Error;

/// Failures talking to the collaborator HTTP API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("server rejected the request: {0}")]
    Rejected(String),
}

/// Failures establishing the event stream
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connect timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Why a guidance submission produced no frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuidanceRejection {
    #[error("guidance is empty")]
    Empty,

    #[error("not connected to the server")]
    NotConnected,

    #[error("no project is bound to this session")]
    NoProject,
}

/// Why a run could not be started
#[derive(Debug, Error)]
pub enum RunRejection {
    #[error("objective is empty")]
    EmptyObjective,

    #[error("a run is already in progress")]
    AlreadyRunning,

    #[error(transparent)]
    Api(#[from] ApiError),
}
