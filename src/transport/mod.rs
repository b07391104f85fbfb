//! Transport layer: the collaborator that actually speaks HTTP.
//!
//! This module provides:
//! - The outbound request snapshot handed to a transport ([`OutboundRequest`])
//! - Response metadata ([`ResponseHead`])
//! - The transport abstraction ([`Transport`]) and its event sink ([`TransportEvents`])
//! - Production transport implementation ([`ReqwestTransport`])

mod client;
mod error;


use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::request::Credentials;

pub use crate::connection::TransportEvents;
pub use client::ReqwestTransport;
pub use error::TransportError;

/// Everything a transport needs to perform one exchange.
///
/// Headers are carried verbatim, exactly as the caller supplied them.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// HTTP method
    pub method: Method,
    /// Target URL
    pub url: Url,
    /// Request headers, unvalidated
    pub headers: Vec<(String, String)>,
    /// Request body, already compressed if compression was requested
    pub body: Vec<u8>,
    /// Basic authentication credentials
    pub credentials: Option<Credentials>,
    /// Default `User-Agent` to apply when no header sets one
    pub user_agent: Option<String>,
}

impl OutboundRequest {
    /// Returns the value of a header, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and headers of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseHead {
    /// Creates response metadata.
    #[must_use]
    pub const fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self { status, headers }
    }

    /// Returns the status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the response headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns true if the status code indicates success (2xx).
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Performs HTTP exchanges on behalf of a connection.
///
/// A transport reports progress through the [`TransportEvents`] sink:
/// response metadata once, body chunks in arrival order, then exactly one
/// of [`finish`](TransportEvents::finish) or [`fail`](TransportEvents::fail).
/// When a sink method returns `false` (or [`is_closed`](TransportEvents::is_closed)
/// is true) the connection has already reached a terminal state and the
/// transport should stop.
///
/// Cancellation drops the returned future, so implementations must release
/// their resources on drop.
///
/// # Example
///
/// ```ignore
/// use http_connection::transport::{OutboundRequest, ResponseHead, Transport, TransportEvents};
///
/// struct CannedTransport;
///
/// impl Transport for CannedTransport {
///     async fn exchange(&self, _request: OutboundRequest, events: TransportEvents) {
///         events.response(ResponseHead::new(http::StatusCode::OK, http::HeaderMap::new()));
///         events.data(b"hello");
///         events.finish();
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Runs one exchange, reporting events to `events`.
    fn exchange(
        &self,
        request: OutboundRequest,
        events: TransportEvents,
    ) -> impl std::future::Future<Output = ()> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn exchange(
        &self,
        request: OutboundRequest,
        events: TransportEvents,
    ) -> impl std::future::Future<Output = ()> + Send {
        (**self).exchange(request, events)
    }
}
