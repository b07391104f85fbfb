//! Configuration layer for the reqwest transport.
//!
//! This module provides:
//! - TOML configuration file parsing ([`TomlConfig`])
//! - Validated configuration ([`ClientConfig`])
//! - Configuration file generation ([`write_default_config`])
//! - Default values ([`defaults`])
//!
//! # Priority
//!
//! Values are resolved with the following priority (highest to lowest):
//!
//! 1. **Builder calls** - Values set on [`ClientConfig`] after loading
//! 2. **TOML config file** - Values from the `[transport]` section
//! 3. **Built-in defaults** - Hardcoded default values
//!
//! The configured user agent only becomes the process-wide default once
//! [`ClientConfig::apply_default_user_agent`] is called.

pub mod defaults;
mod error;
mod toml;
mod validated;


pub use error::ConfigError;
pub use toml::{TomlConfig, TransportSection, default_config_template};
pub use validated::{ClientConfig, write_default_config};
