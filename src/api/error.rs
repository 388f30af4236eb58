use thiserror::Error;

/// Failures below the outcome classification: the request never produced a
/// usable reply. All of these surface to the user as a transport failure.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    ServerStatus(reqwest::StatusCode),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
