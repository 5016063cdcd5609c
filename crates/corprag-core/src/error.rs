use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the answering/ingestion service.
///
/// Never leaves a coordinator: each variant is turned into a fallback
/// chat turn or a failed upload status.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service rejected request with status {0}")]
    Rejected(StatusCode),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("could not read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a submission was dropped without touching any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Ignored {
    #[error("input is empty")]
    EmptyInput,

    #[error("a request of this kind is already in flight")]
    InFlight,

    #[error("no file selected")]
    NoFile,
}
