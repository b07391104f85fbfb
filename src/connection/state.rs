//! Connection state shared between the caller, the exchange task and
//! [`TransportEvents`](super::TransportEvents).
//!
//! Every transition goes through one mutex. Terminal transitions take the
//! request and the registered handlers out of the shared state while still
//! holding the lock, so whichever event gets there first is the only one
//! that can ever deliver; later events find a terminal state and are
//! discarded.

use std::fmt;
use std::mem;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use tokio::task::AbortHandle;

use super::callback::Handlers;
use crate::error::{ConnectionError, Phase};
use crate::request::Request;
use crate::transport::{ResponseHead, TransportError};

/// Lifecycle of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Constructed, not started.
    Idle,
    /// Exchange launched; no response metadata yet.
    InFlight,
    /// Response metadata received; body bytes arriving.
    Receiving,
    /// Terminal: the exchange completed.
    Completed,
    /// Terminal: compression or the transport failed.
    Failed,
    /// Terminal: the caller cancelled.
    Cancelled,
}

impl State {
    /// Returns `true` for `Completed`, `Failed` and `Cancelled`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::InFlight => "in-flight",
            Self::Receiving => "receiving",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Where terminal callbacks are delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Dispatch {
    /// On whichever context wins the terminal transition.
    Inline,
    /// Transport-driven outcomes are handed to the caller blocked in
    /// `start_synchronous`.
    Caller,
}

/// Which side produced a terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Transport,
    Caller,
}

/// The final result before it is written to the request.
#[derive(Debug)]
enum Verdict {
    Success { head: ResponseHead, data: Vec<u8> },
    Failure(ConnectionError),
}

/// Everything needed to deliver a terminal outcome, taken out of the
/// shared state by the winning transition.
pub(super) struct Settlement {
    request: Request,
    handlers: Handlers,
    verdict: Verdict,
}

pub(super) struct Core {
    pub(super) state: State,
    pub(super) request: Option<Request>,
    pub(super) handlers: Handlers,
    pub(super) dispatch: Dispatch,
    pub(super) abort: Option<AbortHandle>,
    head: Option<ResponseHead>,
    buffer: Vec<u8>,
    pending: Option<Settlement>,
    delivered: bool,
}

impl Core {
    /// Enters `state` unless a terminal state was already reached.
    fn settle(&mut self, state: State, verdict: Verdict) -> Option<Settlement> {
        if self.state.is_terminal() {
            return None;
        }
        let request = self.request.take()?;

        self.state = state;
        if let Some(abort) = self.abort.take() {
            abort.abort();
        }
        self.head = None;
        self.buffer = Vec::new();

        Some(Settlement {
            request,
            handlers: mem::take(&mut self.handlers),
            verdict,
        })
    }

    /// Resets per-exchange bookkeeping when leaving `Idle`.
    pub(super) fn begin(&mut self, dispatch: Dispatch) {
        self.state = State::InFlight;
        self.dispatch = dispatch;
        self.head = None;
        self.buffer.clear();
        self.pending = None;
        self.delivered = false;
    }
}

pub(super) struct Shared {
    core: Mutex<Core>,
    settled: Condvar,
}

impl Shared {
    pub(super) fn new(request: Request) -> Self {
        Self {
            core: Mutex::new(Core {
                state: State::Idle,
                request: Some(request),
                handlers: Handlers::default(),
                dispatch: Dispatch::Inline,
                abort: None,
                head: None,
                buffer: Vec::new(),
                pending: None,
                delivered: false,
            }),
            settled: Condvar::new(),
        }
    }

    pub(super) fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(super) fn state(&self) -> State {
        self.lock().state
    }

    /// Records response metadata; only the first head is kept.
    pub(super) fn on_response(&self, head: ResponseHead) -> bool {
        let mut core = self.lock();
        match core.state {
            State::InFlight => {
                tracing::debug!("Response received: {}", head.status());
                core.head = Some(head);
                core.state = State::Receiving;
                true
            }
            State::Receiving => {
                tracing::warn!("Ignoring duplicate response head ({})", head.status());
                true
            }
            State::Idle => {
                tracing::warn!("Ignoring response head for a connection that was never started");
                false
            }
            State::Completed | State::Failed | State::Cancelled => {
                tracing::debug!("Discarding late response head ({})", core.state);
                false
            }
        }
    }

    /// Appends a body chunk while receiving.
    pub(super) fn on_data(&self, chunk: &[u8]) -> bool {
        let mut core = self.lock();
        match core.state {
            State::Receiving => {
                core.buffer.extend_from_slice(chunk);
                tracing::trace!(
                    "Received {} byte(s), {} total",
                    chunk.len(),
                    core.buffer.len()
                );
                true
            }
            State::InFlight => {
                tracing::warn!(
                    "Ignoring {} body byte(s) received before the response head",
                    chunk.len()
                );
                true
            }
            State::Idle => false,
            State::Completed | State::Failed | State::Cancelled => {
                tracing::debug!("Discarding late body chunk ({})", core.state);
                false
            }
        }
    }

    /// Handles end-of-body from the transport.
    pub(super) fn on_finish(&self) {
        let mut core = self.lock();
        let verdict = match core.state {
            State::Receiving => {
                let Some(head) = core.head.take() else {
                    return;
                };
                let data = mem::take(&mut core.buffer);
                Verdict::Success { head, data }
            }
            State::InFlight => Verdict::Failure(ConnectionError::Transport {
                phase: Phase::Connecting,
                source: TransportError::Protocol(
                    "exchange finished without response metadata".to_string(),
                ),
                response: None,
            }),
            State::Idle | State::Completed | State::Failed | State::Cancelled => {
                tracing::debug!("Discarding late completion ({})", core.state);
                return;
            }
        };

        let state = match verdict {
            Verdict::Success { .. } => State::Completed,
            Verdict::Failure(_) => State::Failed,
        };
        self.conclude(core, state, verdict, Origin::Transport);
    }

    /// Handles a transport failure.
    pub(super) fn on_fail(&self, error: TransportError) {
        let mut core = self.lock();
        let phase = match core.state {
            State::InFlight => Phase::Connecting,
            State::Receiving => Phase::Receiving,
            State::Idle | State::Completed | State::Failed | State::Cancelled => {
                tracing::debug!("Discarding late transport error ({}): {error}", core.state);
                return;
            }
        };

        let verdict = Verdict::Failure(ConnectionError::Transport {
            phase,
            source: error,
            response: core.head.take(),
        });
        self.conclude(core, State::Failed, verdict, Origin::Transport);
    }

    /// Fails the exchange before anything was sent.
    pub(super) fn on_compression_failed(&self, error: crate::compress::CompressionError) {
        let core = self.lock();
        if core.state.is_terminal() {
            return;
        }
        let verdict = Verdict::Failure(ConnectionError::Compression(error));
        self.conclude(core, State::Failed, verdict, Origin::Transport);
    }

    /// Cancels from any non-terminal state; a no-op afterwards, or when the
    /// request was taken before start.
    pub(super) fn cancel(&self) {
        let core = self.lock();
        if core.state.is_terminal() {
            tracing::debug!("Cancel ignored, connection already {}", core.state);
            return;
        }
        if core.request.is_none() {
            tracing::debug!("Cancel ignored, request was taken before start");
            return;
        }
        tracing::debug!("Cancelling connection ({})", core.state);
        let verdict = Verdict::Failure(ConnectionError::Cancelled);
        self.conclude(core, State::Cancelled, verdict, Origin::Caller);
    }

    /// Returns `true` once a terminal state has been entered.
    pub(super) fn is_closed(&self) -> bool {
        self.lock().state.is_terminal()
    }

    /// Performs the terminal transition and routes the delivery.
    fn conclude(
        &self,
        mut core: MutexGuard<'_, Core>,
        state: State,
        verdict: Verdict,
        origin: Origin,
    ) {
        let Some(settlement) = core.settle(state, verdict) else {
            return;
        };
        tracing::debug!("Connection {state}");

        if origin == Origin::Transport && core.dispatch == Dispatch::Caller {
            core.pending = Some(settlement);
            drop(core);
            self.settled.notify_all();
            return;
        }

        drop(core);
        self.deliver(settlement);
    }

    /// Writes the outcome to the request, runs the callbacks, then hands
    /// the request back to the shared state.
    fn deliver(&self, settlement: Settlement) {
        let Settlement {
            mut request,
            handlers,
            verdict,
        } = settlement;

        let succeeded = match verdict {
            Verdict::Success { head, data } => {
                request.complete(head, data);
                true
            }
            Verdict::Failure(error) => {
                request.fail(error);
                false
            }
        };

        handlers.invoke(&request, succeeded);

        let mut core = self.lock();
        core.request = Some(request);
        core.delivered = true;
        drop(core);
        self.settled.notify_all();
    }

    /// Blocks until the outcome has been delivered, delivering it on this
    /// thread if the exchange task handed it over.
    pub(super) fn wait_for_delivery(&self) {
        let mut core = self.lock();
        loop {
            if core.delivered {
                return;
            }
            if let Some(settlement) = core.pending.take() {
                drop(core);
                self.deliver(settlement);
                return;
            }
            core = self
                .settled
                .wait(core)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Returns the request once its outcome has been delivered, or while idle.
    pub(super) fn take_request(&self) -> Option<Request> {
        let mut core = self.lock();
        if core.delivered || core.state == State::Idle {
            core.request.take()
        } else {
            None
        }
    }

    /// Runs `f` against the request when it is not owned by an exchange.
    pub(super) fn with_request<R>(&self, f: impl FnOnce(&Request) -> R) -> Option<R> {
        let core = self.lock();
        if core.delivered || core.state == State::Idle {
            core.request.as_ref().map(f)
        } else {
            None
        }
    }
}
