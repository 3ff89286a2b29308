use thiserror::Error;

/// Failures reported by a document host. In a browser these come from DOM
/// APIs that are missing or throw in a restricted environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("{0} unavailable")]
    Unavailable(String),
    #[error("host rejected {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("no document body to mount overlays into")]
    NoDocument,
    #[error(transparent)]
    Host(#[from] HostError),
    #[error("invalid overlay config: {0}")]
    Config(#[from] serde_json::Error),
}
