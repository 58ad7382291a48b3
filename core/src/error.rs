//! Domain error type for viewer operations.

use std::fmt;

use thiserror::Error;

/// Why a single indexer query did not produce data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The API answered with a non-2xx status.
    Status(u16),
    /// The query did not finish within the configured request timeout.
    Timeout,
    /// Connection-level failure before a status was received.
    Transport(String),
    /// The body could not be decoded into the expected shape.
    Decode(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP error! status: {code}"),
            Self::Timeout => write!(f, "request timed out"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Decode(msg) => write!(f, "invalid response: {msg}"),
        }
    }
}

/// Typed error enum for viewer operations, allowing callers to match on
/// specific failure modes instead of inspecting opaque `anyhow::Error` messages.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// No wallet provider is available to connect to.
    #[error("Wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Account request was rejected, returned nothing, or otherwise failed.
    #[error("Wallet connection failed: {0}")]
    HandshakeFailed(String),

    /// Local validation failed; nothing was sent to the network.
    #[error("{0}")]
    InvalidInput(String),

    /// An indexer query failed.
    #[error("Fetch failed: {0}")]
    FetchFailed(FetchFailure),

    /// Transfer submission or confirmation failed.
    #[error("Transfer failed: {0}")]
    TransferFailed(String),

    /// Unexpected error from internal subsystems.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<FetchFailure> for ViewerError {
    fn from(failure: FetchFailure) -> Self {
        Self::FetchFailed(failure)
    }
}

/// Alias for `std::result::Result<T, ViewerError>`.
pub type Result<T> = std::result::Result<T, ViewerError>;
