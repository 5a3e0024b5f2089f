//! VLESS launcher - turns a `vless://` link into a running local SOCKS proxy
//!
//! This library provides the core functionality for the launcher:
//! - Parsing the connection link into a typed descriptor
//! - Synthesizing the proxy engine configuration
//! - Launcher settings
//! - Running the engine against a scoped config file

pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod synth;

// Re-export commonly used types
pub use crate::config::LauncherConfig;
pub use descriptor::{parse, ConnectionDescriptor, Security, Transport};
pub use engine::{ConfigFile, Engine};
pub use error::ParseError;
pub use synth::{synthesize, ProxyConfig};

/// Result type used throughout the launcher
pub type Result<T> = anyhow::Result<T>;
