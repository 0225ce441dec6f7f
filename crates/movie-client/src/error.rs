//! Error types for the movie client.

use thiserror::Error;
use tonic::{Code, Status};

/// Errors that can occur when talking to the movie service
#[derive(Error, Debug)]
pub enum ClientError {
    /// The `(host, port)` pair does not form a valid endpoint URI
    #[error("Invalid service address {addr}: {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The runtime that drives calls and callbacks could not be built
    #[error("Failed to start client runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// The call terminated with a non-OK status
    #[error("RPC failed: {0}")]
    Rpc(#[from] Status),

    /// The dispatcher went away without delivering a terminal event
    #[error("Response stream was abandoned before completion")]
    Abandoned,
}

impl ClientError {
    /// The gRPC status code carried by this error, if any.
    pub fn code(&self) -> Option<Code> {
        match self {
            ClientError::Rpc(status) => Some(status.code()),
            ClientError::Abandoned => Some(Code::Cancelled),
            _ => None,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, ClientError>;

/// Status given to calls attempted once the channel is shutting down.
pub(crate) fn shutting_down() -> Status {
    Status::unavailable("channel is shutting down")
}

/// Status given to in-flight calls when the channel is torn down.
pub(crate) fn channel_closed() -> Status {
    Status::cancelled("channel was shut down while the call was in flight")
}
