//! Error types for the server crate.

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while running the movie server
#[derive(Error, Debug)]
pub enum ServerError {
    /// The listening socket could not be bound (port in use, unresolvable host)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server is already started on {0}")]
    AlreadyStarted(SocketAddr),

    #[error("Server was never started")]
    NotStarted,

    /// The transport failed while serving
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The serving task panicked or was aborted
    #[error("Server task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ServerError>;
