//! Fake collaborators for connection tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::{HeaderMap, HeaderValue, StatusCode};
use tokio::sync::{Notify, mpsc};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use super::{Connection, TransportEvents};
use crate::compress::{BodyCompressor, CompressionError};
use crate::request::Request;
use crate::transport::{OutboundRequest, ResponseHead, Transport, TransportError};

/// One scripted transport action.
#[derive(Debug, Clone)]
pub enum Step {
    Head(StatusCode, Vec<(&'static str, &'static str)>),
    Chunk(&'static [u8]),
    Finish,
    Timeout,
    /// Yield to the scheduler so other tasks can interleave.
    Yield,
    /// Never complete; only cancellation ends the exchange.
    Stall,
}

pub fn head(status: StatusCode, headers: &[(&'static str, &'static str)]) -> ResponseHead {
    let mut map = HeaderMap::new();
    for &(name, value) in headers {
        map.insert(name, HeaderValue::from_static(value));
    }
    ResponseHead::new(status, map)
}

/// Plays a fixed script of events and records what it was asked to send.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Vec<Step>,
    requests: Mutex<Vec<OutboundRequest>>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            script,
            ..Self::default()
        }
    }

    /// 200 `text/plain; charset=utf-8` with body `hello`.
    pub fn hello() -> Self {
        Self::new(vec![
            Step::Head(
                StatusCode::OK,
                vec![("content-type", "text/plain; charset=utf-8")],
            ),
            Step::Chunk(b"hello"),
            Step::Finish,
        ])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn captured_requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn exchange(&self, request: OutboundRequest, events: TransportEvents) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        for step in self.script.clone() {
            match step {
                Step::Head(status, headers) => {
                    events.response(head(status, &headers));
                }
                Step::Chunk(bytes) => {
                    events.data(bytes);
                }
                Step::Finish => events.finish(),
                Step::Timeout => events.fail(TransportError::Timeout),
                Step::Yield => tokio::task::yield_now().await,
                Step::Stall => std::future::pending::<()>().await,
            }
        }
    }
}

/// Hands its event sink to the test and then stalls, so the test decides
/// when (and whether) events arrive.
#[derive(Debug, Default)]
pub struct ManualTransport {
    events: Mutex<Option<TransportEvents>>,
    requests: Mutex<Vec<OutboundRequest>>,
    started: Notify,
}

impl ManualTransport {
    /// Waits until an exchange has begun and returns its sink.
    pub async fn wait_for_exchange(&self) -> TransportEvents {
        loop {
            let notified = self.started.notified();
            if let Some(events) = self.events.lock().unwrap().clone() {
                return events;
            }
            tokio::time::timeout(Duration::from_secs(5), notified)
                .await
                .expect("exchange never started");
        }
    }

    /// Blocking variant of [`wait_for_exchange`](Self::wait_for_exchange).
    pub fn wait_for_exchange_blocking(&self) -> TransportEvents {
        for _ in 0..5000 {
            if let Some(events) = self.events.lock().unwrap().clone() {
                return events;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        panic!("exchange never started");
    }

    pub fn captured_requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for ManualTransport {
    async fn exchange(&self, request: OutboundRequest, events: TransportEvents) {
        self.requests.lock().unwrap().push(request);
        *self.events.lock().unwrap() = Some(events);
        self.started.notify_waiters();
        std::future::pending::<()>().await;
    }
}

/// Transport whose exchange panics before reporting anything.
#[derive(Debug, Default)]
pub struct PanickingTransport;

impl Transport for PanickingTransport {
    async fn exchange(&self, _request: OutboundRequest, _events: TransportEvents) {
        panic!("transport bug");
    }
}

/// Compressor that panics on every call.
#[derive(Debug, Default)]
pub struct PanickingCompressor;

impl BodyCompressor for PanickingCompressor {
    fn compress(&self, _body: &[u8]) -> Result<Vec<u8>, CompressionError> {
        panic!("compressor bug");
    }

    fn content_encoding(&self) -> &str {
        "x-panic"
    }
}

/// Compressor that records its inputs and either reverses them or fails.
#[derive(Debug, Default)]
pub struct RecordingCompressor {
    inputs: Mutex<Vec<Vec<u8>>>,
    fail: bool,
}

impl RecordingCompressor {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn inputs(&self) -> Vec<Vec<u8>> {
        self.inputs.lock().unwrap().clone()
    }
}

impl BodyCompressor for RecordingCompressor {
    fn compress(&self, body: &[u8]) -> Result<Vec<u8>, CompressionError> {
        self.inputs.lock().unwrap().push(body.to_vec());
        if self.fail {
            return Err(CompressionError::Rejected("refusing to compress".into()));
        }
        Ok(body.iter().rev().copied().collect())
    }

    fn content_encoding(&self) -> &str {
        "x-reversed"
    }
}

impl BodyCompressor for Arc<RecordingCompressor> {
    fn compress(&self, body: &[u8]) -> Result<Vec<u8>, CompressionError> {
        (**self).compress(body)
    }

    fn content_encoding(&self) -> &str {
        (**self).content_encoding()
    }
}

/// Which completion path fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fired {
    Success,
    Failure,
}

/// Counts handler invocations and signals each one on a channel.
#[derive(Debug)]
pub struct Probe {
    pub successes: Arc<AtomicUsize>,
    pub failures: Arc<AtomicUsize>,
    pub fired: mpsc::UnboundedReceiver<Fired>,
}

impl Probe {
    pub fn total(&self) -> usize {
        self.successes.load(Ordering::SeqCst) + self.failures.load(Ordering::SeqCst)
    }

    /// Waits for the next handler invocation.
    pub async fn next(&mut self) -> Fired {
        tokio::time::timeout(Duration::from_secs(5), self.fired.recv())
            .await
            .expect("no handler fired")
            .expect("probe channel closed")
    }
}

/// Routes connection logs to the test harness; `RUST_LOG` raises the level.
pub fn setup_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::WARN.into())
        .from_env_lossy();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// Registers counting success/failure closures on `connection`.
pub fn probe<T, C>(connection: Connection<T, C>) -> (Connection<T, C>, Probe) {
    setup_tracing();
    let successes = Arc::new(AtomicUsize::new(0));
    let failures = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::unbounded_channel();

    let success_count = Arc::clone(&successes);
    let success_tx = tx.clone();
    let failure_count = Arc::clone(&failures);

    let connection = connection
        .on_success(move |_: &Request| {
            success_count.fetch_add(1, Ordering::SeqCst);
            let _ = success_tx.send(Fired::Success);
        })
        .on_failure(move |_: &Request| {
            failure_count.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(Fired::Failure);
        });

    (
        connection,
        Probe {
            successes,
            failures,
            fired: rx,
        },
    )
}

/// Polls until the connection has delivered its outcome.
pub async fn delivered<T, C>(connection: &Connection<T, C>) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while connection.with_request(Request::is_finished) != Some(true) {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("outcome never delivered");
}

pub fn request(url: &str) -> Request {
    Request::new(url).unwrap()
}
