//! Error types for transport operations.

use thiserror::Error;

/// Error reported by a transport.
///
/// Describes what went wrong on the wire; the connection adds the phase
/// and any partial response metadata.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// TLS handshake failures and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out.
    #[error("Request timed out")]
    Timeout,

    /// The request could not be built (malformed header, bad URL for the transport, ...).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Reading the response body failed.
    #[error("Body error: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The exchange violated the transport event contract or HTTP itself.
    #[error("Protocol error: {0}")]
    Protocol(String),
}
