//! Production transport implementation using reqwest.

use std::sync::OnceLock;

use http::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use super::{OutboundRequest, ResponseHead, Transport, TransportError, TransportEvents};
use crate::config::{ClientConfig, ConfigError};

/// Production transport using reqwest.
///
/// This is a thin wrapper around `reqwest::Client` that implements the
/// [`Transport`] trait. Response bodies are streamed chunk by chunk into
/// the connection's event sink.
///
/// # Example
///
/// ```no_run
/// use http_connection::{Connection, Request};
/// use http_connection::transport::ReqwestTransport;
///
/// let request = Request::new("https://api.example.com/status")?;
/// let connection = Connection::with_transport(request, ReqwestTransport::new());
/// connection.start_synchronous();
/// # Ok::<(), http_connection::RequestError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with reqwest's default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
        }
    }

    /// Creates a transport from an existing reqwest client.
    ///
    /// Useful when you need custom configuration (proxies, TLS roots, etc.).
    #[must_use]
    pub const fn from_client(client: reqwest::Client) -> Self {
        Self { inner: client }
    }

    /// Creates a transport with the timeouts from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns the validation error if a field of `config` is invalid, or
    /// [`ConfigError::ClientBuild`] if reqwest cannot build the client.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ConfigError::ClientBuild)?;

        Ok(Self::from_client(client))
    }

    /// Returns the transport shared by connections built without an explicit one.
    pub(crate) fn shared() -> Self {
        static SHARED: OnceLock<ReqwestTransport> = OnceLock::new();
        SHARED.get_or_init(Self::new).clone()
    }

    /// Converts the outbound snapshot into a reqwest request.
    fn build(&self, request: OutboundRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let mut headers = HeaderMap::with_capacity(request.headers.len() + 1);

        for (name, value) in &request.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                TransportError::InvalidRequest(format!("header name '{name}': {e}"))
            })?;
            let header_value = HeaderValue::from_str(value).map_err(|e| {
                TransportError::InvalidRequest(format!("header value for '{name}': {e}"))
            })?;
            headers.insert(header_name, header_value);
        }

        if !headers.contains_key(USER_AGENT) {
            if let Some(agent) = &request.user_agent {
                let value = HeaderValue::from_str(agent).map_err(|e| {
                    TransportError::InvalidRequest(format!("default user agent: {e}"))
                })?;
                headers.insert(USER_AGENT, value);
            }
        }

        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(headers);

        if let Some(credentials) = request.credentials {
            builder = builder.basic_auth(credentials.username, credentials.password);
        }

        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        Ok(builder)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a reqwest error onto the transport error taxonomy.
fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else if error.is_body() || error.is_decode() {
        TransportError::Body(Box::new(error))
    } else {
        TransportError::Connection(Box::new(error))
    }
}

impl Transport for ReqwestTransport {
    async fn exchange(&self, request: OutboundRequest, events: TransportEvents) {
        let builder = match self.build(request) {
            Ok(builder) => builder,
            Err(e) => return events.fail(e),
        };

        let mut response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return events.fail(classify(e)),
        };

        let head = ResponseHead::new(response.status(), response.headers().clone());
        if !events.response(head) {
            return;
        }

        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if !events.data(&chunk) {
                        return;
                    }
                }
                Ok(None) => return events.finish(),
                Err(e) => return events.fail(classify(e)),
            }
        }
    }
}
