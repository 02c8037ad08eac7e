use serde::Deserialize;

/// Transport-level failures. Converted into `crate::Error` at the gateway
/// boundary, where statuses get their meaning.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("status {status}")]
    Status {
        status: u16,
        response: Option<ErrorResponse>,
    },
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error("empty_body: {0}")]
    EmptyBody(&'static str),
}

/// Error body returned by the notes service, e.g. `{"error": "not_found", "message": "Note not found"}`.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ErrorResponse {
    pub error: Option<String>,
    pub message: Option<String>,
    pub status: Option<u16>,
}
