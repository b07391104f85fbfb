//! The request value object: inputs of one HTTP exchange and, once a
//! [`Connection`](crate::Connection) finishes with it, the captured outputs.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::error::{ConnectionError, RequestError};
use crate::text::decode_body;
use crate::transport::{OutboundRequest, ResponseHead};

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;

/// Basic authentication credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// User name
    pub username: String,
    /// Optional password
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Captured result of a finished exchange.
///
/// Kept as a single value so success fields and an error can never coexist.
#[derive(Debug)]
pub(crate) enum Outcome {
    Success {
        head: ResponseHead,
        data: Vec<u8>,
        text: String,
    },
    Failure(ConnectionError),
}

/// One HTTP exchange: what to send, and what came back.
///
/// Configure the request, hand it to a [`Connection`](crate::Connection),
/// then read the results once the connection has delivered its outcome.
/// Result accessors return `None` until then.
///
/// # Example
///
/// ```
/// use http_connection::Request;
///
/// let mut request = Request::new("https://api.example.com/upload")?;
/// request.set_method("POST")?;
/// request.add_header("Content-Type", "application/json");
/// request.append_body(br#"{"id":"#);
/// request.append_body(b"1}");
/// assert_eq!(request.body(), br#"{"id":1}"#);
/// # Ok::<(), http_connection::RequestError>(())
/// ```
pub struct Request {
    url: Url,
    method: Method,
    headers: Vec<(String, String)>,
    credentials: Option<Credentials>,
    body: Vec<u8>,
    compress_body: bool,
    user_info: Option<Arc<dyn Any + Send + Sync>>,
    outcome: Option<Outcome>,
}

impl Request {
    /// Creates a GET request for the given URL string.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::EmptyUrl`] for an empty string and
    /// [`RequestError::InvalidUrl`] if the string does not parse.
    pub fn new(url: &str) -> Result<Self, RequestError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(RequestError::EmptyUrl);
        }

        let parsed = Url::parse(trimmed).map_err(|source| RequestError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        Ok(Self::from_url(parsed))
    }

    /// Creates a GET request for an already parsed URL.
    #[must_use]
    pub const fn from_url(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            headers: Vec::new(),
            credentials: None,
            body: Vec::new(),
            compress_body: false,
            user_info: None,
            outcome: None,
        }
    }

    /// Returns the target URL.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the HTTP method.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidMethod`] if `method` is not a valid token.
    pub fn set_method(&mut self, method: &str) -> Result<(), RequestError> {
        self.method = Method::from_bytes(method.as_bytes())
            .map_err(|_| RequestError::InvalidMethod(method.to_string()))?;
        Ok(())
    }

    /// Adds a header, replacing any existing header with the same name.
    ///
    /// Names compare case-insensitively. Neither name nor value is
    /// validated here; the transport rejects malformed headers.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
    }

    /// Removes a header by name, returning its value if present.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let index = self
            .headers
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(index).1)
    }

    /// Returns the value of a header, looked up case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the request headers in insertion order.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Sets basic authentication credentials.
    pub fn set_credentials(&mut self, username: impl Into<String>, password: Option<String>) {
        self.credentials = Some(Credentials {
            username: username.into(),
            password,
        });
    }

    /// Returns the basic authentication credentials, if any.
    #[must_use]
    pub const fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Appends bytes to the body.
    pub fn append_body(&mut self, data: &[u8]) {
        self.body.extend_from_slice(data);
    }

    /// Replaces the body.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.body = body;
    }

    /// Returns the body as it will be handed to the compressor or transport.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Enables or disables body compression before transmission.
    pub const fn set_compress_body(&mut self, compress: bool) {
        self.compress_body = compress;
    }

    /// Returns `true` if the body is compressed before transmission.
    #[must_use]
    pub const fn compress_body(&self) -> bool {
        self.compress_body
    }

    /// Attaches an opaque value carried through unchanged for correlation.
    pub fn set_user_info<T: Any + Send + Sync>(&mut self, info: T) {
        self.user_info = Some(Arc::new(info));
    }

    /// Returns the attached user info if it is of type `T`.
    #[must_use]
    pub fn user_info<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.user_info.as_deref()?.downcast_ref::<T>()
    }

    /// Returns the response status line and headers after success.
    #[must_use]
    pub const fn response(&self) -> Option<&ResponseHead> {
        match &self.outcome {
            Some(Outcome::Success { head, .. }) => Some(head),
            _ => None,
        }
    }

    /// Returns the response status after success.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.response().map(ResponseHead::status)
    }

    /// Returns the response headers after success.
    #[must_use]
    pub fn response_headers(&self) -> Option<&HeaderMap> {
        self.response().map(ResponseHead::headers)
    }

    /// Returns the raw response body after success.
    #[must_use]
    pub fn response_data(&self) -> Option<&[u8]> {
        match &self.outcome {
            Some(Outcome::Success { data, .. }) => Some(data),
            _ => None,
        }
    }

    /// Returns the response body decoded as text after success.
    ///
    /// Empty if the body could not be decoded with its declared charset.
    #[must_use]
    pub fn response_string(&self) -> Option<&str> {
        match &self.outcome {
            Some(Outcome::Success { text, .. }) => Some(text),
            _ => None,
        }
    }

    /// Returns the failure after the connection failed or was cancelled.
    #[must_use]
    pub const fn error(&self) -> Option<&ConnectionError> {
        match &self.outcome {
            Some(Outcome::Failure(error)) => Some(error),
            _ => None,
        }
    }

    /// Returns `true` once a connection has recorded an outcome.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    pub(crate) fn reset_outcome(&mut self) {
        self.outcome = None;
    }

    pub(crate) fn complete(&mut self, head: ResponseHead, data: Vec<u8>) {
        let text = decode_body(head.headers(), &data);
        self.outcome = Some(Outcome::Success { head, data, text });
    }

    pub(crate) fn fail(&mut self, error: ConnectionError) {
        self.outcome = Some(Outcome::Failure(error));
    }

    /// Snapshots the inputs for the transport.
    pub(crate) fn to_outbound(&self, user_agent: Option<String>) -> OutboundRequest {
        OutboundRequest {
            method: self.method.clone(),
            url: self.url.clone(),
            headers: self.headers.clone(),
            body: self.body.clone(),
            credentials: self.credentials.clone(),
            user_agent,
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("credentials", &self.credentials)
            .field("body_len", &self.body.len())
            .field("compress_body", &self.compress_body)
            .field("has_user_info", &self.user_info.is_some())
            .field("outcome", &self.outcome)
            .finish()
    }
}
