use walletkit_types::{auth, domain::ProjectIdError};
pub use tokio_tungstenite::tungstenite::protocol::CloseFrame;

pub type TransportError = tokio_tungstenite::tungstenite::Error;

/// Errors generated while building the websocket upgrade request.
#[derive(Debug, thiserror::Error)]
pub enum RequestBuildError {
    #[error("Failed to serialize connection query: {0}")]
    Query(#[from] serde_qs::Error),

    #[error("Failed to add request headers")]
    Headers,

    #[error("Failed to create websocket request: {0}")]
    Other(TransportError),
}

/// Failure to produce a [`WalletKit`](crate::WalletKit) handle. Not retried.
#[derive(Debug, thiserror::Error)]
pub enum InitializationError {
    #[error("Invalid project ID: {0}")]
    InvalidProjectId(#[from] ProjectIdError),

    #[error("Failed to sign relay auth token: {0}")]
    Auth(#[from] auth::Error),

    #[error("Failed to build connection request: {0}")]
    RequestBuilder(#[from] RequestBuildError),

    #[error("Failed to connect to relay: {0}")]
    Connection(TransportError),
}

/// Errors reported by an initialized [`WalletKit`](crate::WalletKit).
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not connected")]
    NotConnected,

    #[error("Failed to close connection: {0}")]
    ClosingFailed(TransportError),

    #[error("Internal error: Channel closed")]
    ChannelClosed,
}
