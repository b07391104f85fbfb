//! The event sink a transport reports into.

use std::fmt;
use std::sync::Arc;

use super::state::Shared;
use crate::transport::{ResponseHead, TransportError};

/// Receives transport progress for one connection.
///
/// Cheap to clone. Events arriving after the connection reached a terminal
/// state (including after cancellation) are discarded.
#[derive(Clone)]
pub struct TransportEvents {
    shared: Arc<Shared>,
}

impl TransportEvents {
    pub(super) const fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Reports response status and headers.
    ///
    /// Returns `false` if the connection no longer accepts events.
    pub fn response(&self, head: ResponseHead) -> bool {
        self.shared.on_response(head)
    }

    /// Reports a chunk of response body.
    ///
    /// Returns `false` if the connection no longer accepts events.
    pub fn data(&self, chunk: &[u8]) -> bool {
        self.shared.on_data(chunk)
    }

    /// Reports the end of the response body.
    pub fn finish(&self) {
        self.shared.on_finish();
    }

    /// Reports a transport failure.
    pub fn fail(&self, error: TransportError) {
        self.shared.on_fail(error);
    }

    /// Returns `true` once the connection reached a terminal state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl fmt::Debug for TransportEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportEvents")
            .field("state", &self.shared.state())
            .finish()
    }
}
