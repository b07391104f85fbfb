//! HTTP Connection: one request, one outcome.
//!
//! A [`Request`] describes an HTTP exchange (URL, method, headers,
//! credentials, body) and receives its results. A [`Connection`] drives the
//! request through a transport, either without blocking ([`Connection::start`])
//! or on the calling thread ([`Connection::start_synchronous`]), and delivers
//! exactly one success or failure notification, even when cancellation races
//! with completion.

pub mod compress;
pub mod config;
pub mod connection;
pub mod error;
pub mod request;
pub mod text;
pub mod transport;
pub mod user_agent;

pub use connection::{Connection, ConnectionDelegate, State};
pub use error::{ConnectionError, ErrorKind, Phase, RequestError};
pub use request::{Credentials, Request};
pub use user_agent::{clear_default_user_agent, default_user_agent, set_default_user_agent};
