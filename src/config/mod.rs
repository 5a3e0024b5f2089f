//! Configuration management for the launcher
//!
//! Settings are layered: built-in defaults, then an optional file, then
//! `VLESS_LAUNCH_*` environment variables. Command-line flags are applied
//! on top by the binary.

use crate::synth::DEFAULT_LOCAL_PORT;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix (`VLESS_LAUNCH_LOCAL_PORT`, `VLESS_LAUNCH_ENGINE`)
pub const ENV_PREFIX: &str = "VLESS_LAUNCH";

/// Engine binary looked up on `PATH` by default
pub const DEFAULT_ENGINE: &str = "xray";

/// Launcher configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// Port of the loopback SOCKS listener
    pub local_port: u16,
    /// Path or name of the engine binary
    pub engine: PathBuf,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            local_port: DEFAULT_LOCAL_PORT,
            engine: PathBuf::from(DEFAULT_ENGINE),
        }
    }
}

impl LauncherConfig {
    /// Load defaults, the optional `file`, then the environment
    pub fn load(file: Option<&Path>) -> crate::Result<Self> {
        let defaults = Self::default();
        let mut builder = ::config::Config::builder()
            .set_default("local_port", i64::from(defaults.local_port))?
            .set_default("engine", defaults.engine.to_string_lossy().into_owned())?;

        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "reading launcher config file");
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let loaded = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to load launcher configuration")?
            .try_deserialize()
            .context("invalid launcher configuration")?;

        Ok(loaded)
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, local_port: Option<u16>, engine: Option<PathBuf>) -> Self {
        if let Some(port) = local_port {
            self.local_port = port;
        }
        if let Some(engine) = engine {
            self.engine = engine;
        }
        self
    }
}
