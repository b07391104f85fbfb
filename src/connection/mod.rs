//! The connection: drives one [`Request`] through a [`Transport`] and
//! delivers the outcome exactly once.
//!
//! This module provides:
//! - The connection itself ([`Connection`]) with asynchronous and blocking starts
//! - Its lifecycle ([`State`])
//! - Completion handlers ([`ConnectionDelegate`], [`Callback`])
//! - The sink transports report into ([`TransportEvents`])
//!
//! # Exactly-once delivery
//!
//! Every transport event and [`Connection::cancel`] goes through the same
//! terminal guard. The first terminal transition wins; everything after it
//! is discarded, so exactly one of the success or failure paths runs.
//!
//! # Dispatch
//!
//! After [`Connection::start`], handlers run on whichever context wins the
//! terminal transition: the exchange task for transport outcomes, the
//! caller of `cancel` for cancellation. After [`Connection::start_synchronous`],
//! transport outcomes are handed to the blocked caller and handlers run on
//! its thread before it returns.

mod callback;
mod events;
mod runtime;
mod state;

#[cfg(test)]
pub(crate) mod test_fixtures;


use std::sync::Arc;

use http::header::CONTENT_ENCODING;
use tokio::runtime::Handle;

use crate::compress::{BodyCompressor, GzipCompressor};
use crate::request::Request;
use crate::transport::{OutboundRequest, ReqwestTransport, Transport, TransportError};
use crate::user_agent::default_user_agent;

pub use callback::{Callback, ConnectionDelegate};
pub use events::TransportEvents;
pub use state::State;

use state::{Dispatch, Shared};

/// Executes one [`Request`] and reports the outcome.
///
/// Clones share the same state, so a clone can [`cancel`](Self::cancel)
/// from another thread while another clone blocks in
/// [`start_synchronous`](Self::start_synchronous).
///
/// # Type Parameters
///
/// - `T`: The transport performing the exchange (defaults to [`ReqwestTransport`])
/// - `C`: The body compressor (defaults to [`GzipCompressor`])
///
/// # Example
///
/// ```no_run
/// use http_connection::{Connection, Request};
///
/// let request = Request::new("https://api.example.com/status")?;
/// let connection = Connection::new(request)
///     .on_success(|request| println!("{:?}", request.response_string()))
///     .on_failure(|request| eprintln!("{:?}", request.error()));
///
/// if connection.start_synchronous() {
///     let request = connection.take_request();
/// }
/// # Ok::<(), http_connection::RequestError>(())
/// ```
pub struct Connection<T = ReqwestTransport, C = GzipCompressor> {
    shared: Arc<Shared>,
    transport: Arc<T>,
    compressor: Arc<C>,
    runtime: Option<Handle>,
}

impl Connection<ReqwestTransport, GzipCompressor> {
    /// Creates a connection using the shared reqwest transport and gzip compression.
    #[must_use]
    pub fn new(request: Request) -> Self {
        Self::with_transport(request, ReqwestTransport::shared())
    }
}

impl<T> Connection<T, GzipCompressor> {
    /// Creates a connection with a custom transport.
    #[must_use]
    pub fn with_transport(request: Request, transport: T) -> Self {
        Self {
            shared: Arc::new(Shared::new(request)),
            transport: Arc::new(transport),
            compressor: Arc::new(GzipCompressor::new()),
            runtime: None,
        }
    }
}

impl<T, C> Connection<T, C> {
    /// Replaces the body compressor.
    #[must_use]
    pub fn with_compressor<C2>(self, compressor: C2) -> Connection<T, C2> {
        Connection {
            shared: self.shared,
            transport: self.transport,
            compressor: Arc::new(compressor),
            runtime: self.runtime,
        }
    }

    /// Runs exchanges on the given runtime instead of the ambient or
    /// background one.
    ///
    /// Do not pass the handle of a current-thread runtime whose only thread
    /// will call [`start_synchronous`](Self::start_synchronous): it would wait on itself.
    #[must_use]
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Registers a delegate notified on completion.
    #[must_use]
    pub fn with_delegate(self, delegate: Arc<dyn ConnectionDelegate>) -> Self {
        self.register(|handlers| handlers.delegate = Some(delegate));
        self
    }

    /// Registers a closure run once if the exchange completes.
    #[must_use]
    pub fn on_success(self, callback: impl FnOnce(&Request) + Send + 'static) -> Self {
        self.register(|handlers| handlers.on_success = Some(Box::new(callback)));
        self
    }

    /// Registers a closure run once if the exchange fails or is cancelled.
    #[must_use]
    pub fn on_failure(self, callback: impl FnOnce(&Request) + Send + 'static) -> Self {
        self.register(|handlers| handlers.on_failure = Some(Box::new(callback)));
        self
    }

    fn register(&self, apply: impl FnOnce(&mut callback::Handlers)) {
        let mut core = self.shared.lock();
        if core.state == State::Idle {
            apply(&mut core.handlers);
        } else {
            tracing::warn!(
                "Ignoring handler registered on a {} connection",
                core.state
            );
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> State {
        self.shared.state()
    }

    /// Returns `true` once a terminal state has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state().is_terminal()
    }

    /// Cancels the connection.
    ///
    /// From `Idle`, `InFlight` or `Receiving` this enters `Cancelled`,
    /// aborts the exchange and runs the failure handlers on the calling
    /// thread before returning. Afterwards it is a no-op, as it is on an
    /// idle connection whose request was taken.
    pub fn cancel(&self) {
        self.shared.cancel();
    }

    /// Hands the request back once its outcome has been delivered.
    ///
    /// Also returns the request of a connection that was never started.
    /// That connection stays `Idle` with nothing to deliver: it can no
    /// longer be started, and cancelling it does nothing. Returns `None` while an
    /// exchange is running or if the request was already taken.
    #[must_use]
    pub fn take_request(&self) -> Option<Request> {
        self.shared.take_request()
    }

    /// Reads the request while it is not owned by a running exchange.
    pub fn with_request<R>(&self, f: impl FnOnce(&Request) -> R) -> Option<R> {
        self.shared.with_request(f)
    }

    /// Returns the transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T, C> Connection<T, C>
where
    T: Transport + 'static,
    C: BodyCompressor + 'static,
{
    /// Starts the exchange without blocking.
    ///
    /// Returns `true` if the exchange was queued. The outcome is delivered
    /// later through the registered handlers. Returns `false`, without
    /// invoking any handler, if the connection was already started or
    /// cancelled, its request was taken, or no runtime is available.
    pub fn start(&self) -> bool {
        let Some(handle) = runtime::for_async(self.runtime.as_ref()) else {
            tracing::error!("Cannot start connection: no runtime available");
            return false;
        };
        self.launch(&handle, Dispatch::Inline)
    }

    /// Starts the exchange and blocks until its outcome has been delivered.
    ///
    /// When this returns `true`, the request's outputs are populated and
    /// the handlers have already run. Transport outcomes are delivered on
    /// the calling thread. Returns `false` under the same conditions as
    /// [`start`](Self::start).
    pub fn start_synchronous(&self) -> bool {
        let Some(handle) = runtime::for_blocking(self.runtime.as_ref()) else {
            tracing::error!("Cannot start connection: no runtime available");
            return false;
        };
        if !self.launch(&handle, Dispatch::Caller) {
            return false;
        }
        self.shared.wait_for_delivery();
        true
    }

    /// Moves `Idle` to `InFlight` and spawns the exchange task.
    fn launch(&self, handle: &Handle, dispatch: Dispatch) -> bool {
        let mut core = self.shared.lock();
        if core.state != State::Idle {
            tracing::warn!("Cannot start connection: already {}", core.state);
            return false;
        }
        let Some(request) = core.request.as_mut() else {
            tracing::warn!("Cannot start connection: request was taken");
            return false;
        };

        request.reset_outcome();
        let compress = request.compress_body();
        let outbound = request.to_outbound(default_user_agent());
        tracing::debug!(
            "Starting {} {} ({} byte body{})",
            outbound.method,
            outbound.url,
            outbound.body.len(),
            if compress { ", compressed" } else { "" }
        );

        core.begin(dispatch);
        let task = handle.spawn(run_exchange(
            Arc::clone(&self.shared),
            Arc::clone(&self.transport),
            Arc::clone(&self.compressor),
            outbound,
            compress,
        ));
        core.abort = Some(task.abort_handle());
        true
    }
}

impl<T, C> Clone for Connection<T, C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            transport: Arc::clone(&self.transport),
            compressor: Arc::clone(&self.compressor),
            runtime: self.runtime.clone(),
        }
    }
}

impl<T, C> std::fmt::Debug for Connection<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Fails the connection if the exchange task ends without a terminal
/// transition: a transport that returns silently, a panicking collaborator,
/// or a runtime dropping the task.
///
/// Aborts after cancellation find the connection already closed.
struct OutcomeGuard {
    events: TransportEvents,
}

impl Drop for OutcomeGuard {
    fn drop(&mut self) {
        if self.events.is_closed() {
            return;
        }
        if std::thread::panicking() {
            tracing::error!("Exchange task panicked before reporting an outcome");
        }
        self.events.fail(TransportError::Protocol(
            "exchange task ended without an outcome".to_string(),
        ));
    }
}

/// Body of the exchange task: compress, then hand over to the transport.
async fn run_exchange<T, C>(
    shared: Arc<Shared>,
    transport: Arc<T>,
    compressor: Arc<C>,
    mut outbound: OutboundRequest,
    compress: bool,
) where
    T: Transport,
    C: BodyCompressor,
{
    let events = TransportEvents::new(Arc::clone(&shared));
    let _guard = OutcomeGuard {
        events: events.clone(),
    };

    if compress {
        match compressor.compress(&outbound.body) {
            Ok(body) => {
                tracing::debug!(
                    "Compressed body {} -> {} byte(s)",
                    outbound.body.len(),
                    body.len()
                );
                outbound.body = body;
                if outbound.header(CONTENT_ENCODING.as_str()).is_none() {
                    outbound.headers.push((
                        CONTENT_ENCODING.as_str().to_string(),
                        compressor.content_encoding().to_string(),
                    ));
                }
            }
            Err(e) => {
                tracing::debug!("Body compression failed: {e}");
                shared.on_compression_failed(e);
                return;
            }
        }
    }

    if events.is_closed() {
        return;
    }

    transport.exchange(outbound, events).await;
}
