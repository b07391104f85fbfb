//! Completion handlers.
//!
//! Two registration styles are supported side by side: a delegate object
//! implementing [`ConnectionDelegate`], and one-shot closures. Both fire on
//! the same terminal transition when both are registered.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use crate::request::Request;

/// Receives the outcome of a connection.
///
/// Both methods default to doing nothing, so a delegate only interested in
/// failures implements just [`request_failed`](Self::request_failed).
///
/// # Example
///
/// ```
/// use http_connection::{ConnectionDelegate, Request};
///
/// struct Logger;
///
/// impl ConnectionDelegate for Logger {
///     fn request_failed(&self, request: &Request) {
///         eprintln!("{} failed: {:?}", request.url(), request.error());
///     }
/// }
/// ```
pub trait ConnectionDelegate: Send + Sync {
    /// Called once after the exchange completed.
    fn request_succeeded(&self, _request: &Request) {}

    /// Called once after the exchange failed or was cancelled.
    fn request_failed(&self, _request: &Request) {}
}

/// A one-shot completion closure.
pub type Callback = Box<dyn FnOnce(&Request) + Send>;

/// The handlers registered on one connection.
#[derive(Default)]
pub(super) struct Handlers {
    pub(super) delegate: Option<Arc<dyn ConnectionDelegate>>,
    pub(super) on_success: Option<Callback>,
    pub(super) on_failure: Option<Callback>,
}

impl Handlers {
    /// Invokes the handlers for one outcome: delegate first, then the closure.
    ///
    /// A panicking handler is logged and does not prevent the other from running.
    pub(super) fn invoke(self, request: &Request, succeeded: bool) {
        if let Some(delegate) = self.delegate {
            guarded("delegate", || {
                if succeeded {
                    delegate.request_succeeded(request);
                } else {
                    delegate.request_failed(request);
                }
            });
        }

        let closure = if succeeded {
            self.on_success
        } else {
            self.on_failure
        };
        if let Some(closure) = closure {
            guarded("closure", || closure(request));
        }
    }
}

fn guarded(kind: &str, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::error!("Completion {kind} panicked");
    }
}
