//! Process-wide default `User-Agent`.
//!
//! The value is read each time a connection launches its exchange, so a
//! change affects every connection started afterwards. Requests that set
//! their own `User-Agent` header are left alone.

use std::sync::{PoisonError, RwLock};

static DEFAULT_USER_AGENT: RwLock<Option<String>> = RwLock::new(None);

/// Sets the default `User-Agent` for connections started from now on.
///
/// Last writer wins.
pub fn set_default_user_agent(user_agent: impl Into<String>) {
    *DEFAULT_USER_AGENT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(user_agent.into());
}

/// Removes the default `User-Agent`.
pub fn clear_default_user_agent() {
    *DEFAULT_USER_AGENT
        .write()
        .unwrap_or_else(PoisonError::into_inner) = None;
}

/// Returns the current default `User-Agent`, if one is set.
#[must_use]
pub fn default_user_agent() -> Option<String> {
    DEFAULT_USER_AGENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}
