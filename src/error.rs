//! Error types for request construction and connection outcomes.

use std::fmt;

use thiserror::Error;

use crate::compress::CompressionError;
use crate::transport::{ResponseHead, TransportError};

/// Error returned when a [`Request`](crate::Request) cannot be built.
///
/// Construction errors are surfaced immediately, never deferred to
/// connection time.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The URL string was empty (or only whitespace).
    #[error("URL must not be empty")]
    EmptyUrl,

    /// The URL string could not be parsed.
    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected URL string
        url: String,
        /// Underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// The HTTP method is not a valid method token.
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),
}

/// Point in the exchange at which a transport failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before any response metadata arrived (DNS, connect, TLS, request upload).
    Connecting,
    /// After the response head arrived, while body bytes were streaming.
    Receiving,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Receiving => write!(f, "receiving"),
        }
    }
}

/// Coarse category of a terminal failure.
///
/// Lets callers tell "I cancelled this" apart from "it failed on its own"
/// without matching on the full error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request body could not be compressed; nothing was sent.
    Compression,
    /// The transport reported a failure.
    Transport,
    /// The connection was cancelled by the caller.
    Cancelled,
}

/// Terminal failure of a connection, stored on the request.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Body compression failed before anything was sent.
    #[error("Request body compression failed: {0}")]
    Compression(#[source] CompressionError),

    /// The transport failed.
    #[error("Transport failed while {phase}: {source}")]
    Transport {
        /// Where in the exchange the failure happened
        phase: Phase,
        /// Underlying transport error
        #[source]
        source: TransportError,
        /// Response metadata received before the failure, if any
        response: Option<ResponseHead>,
    },

    /// The caller cancelled the connection.
    #[error("Connection cancelled")]
    Cancelled,
}

impl ConnectionError {
    /// Returns the category of this failure.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Compression(_) => ErrorKind::Compression,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Returns `true` if this failure is a caller-requested cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the partial response metadata captured before a transport failure.
    #[must_use]
    pub const fn partial_response(&self) -> Option<&ResponseHead> {
        match self {
            Self::Transport { response, .. } => response.as_ref(),
            Self::Compression(_) | Self::Cancelled => None,
        }
    }
}
