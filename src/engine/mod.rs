//! Proxy engine launch
//!
//! The engine reads its configuration from a file. [`ConfigFile`] owns a
//! temporary file holding the synthesized config and removes it when dropped,
//! so the file is gone on every exit path of [`Engine::run`].

use crate::synth::ProxyConfig;
use anyhow::Context;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::process::{Child, Command};

/// How long the engine gets to exit after SIGTERM before it is killed
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Engine config written to a temporary `.json` file
pub struct ConfigFile {
    file: NamedTempFile,
}

impl ConfigFile {
    /// Serialize `config` into a fresh temporary file
    pub fn write(config: &ProxyConfig) -> crate::Result<Self> {
        let json = config
            .to_json_pretty()
            .context("failed to serialize engine config")?;

        let mut file = tempfile::Builder::new()
            .prefix("vless-launch-")
            .suffix(".json")
            .tempfile()
            .context("failed to create temporary config file")?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.flush())
            .context("failed to write temporary config file")?;

        tracing::debug!(
            path = %file.path().display(),
            bytes = json.len(),
            "engine config written"
        );

        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// External proxy engine, run as `<binary> run -config <file>`
#[derive(Debug, Clone)]
pub struct Engine {
    binary: PathBuf,
}

impl Engine {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command line for running against `config_path`
    pub fn command(&self, config_path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("run").arg("-config").arg(config_path);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Spawn the engine reading `config`
    pub fn spawn(&self, config: &ConfigFile) -> crate::Result<Child> {
        tracing::info!(
            engine = %self.binary.display(),
            config = %config.path().display(),
            "spawning engine process"
        );

        let child = self.command(config.path()).spawn().map_err(|e| {
            tracing::error!(
                engine = %self.binary.display(),
                error = %e,
                "failed to spawn engine process"
            );
            e
        });
        let child = child
            .with_context(|| format!("failed to start engine {}", self.binary.display()))?;

        tracing::info!(pid = ?child.id(), "engine process spawned");
        Ok(child)
    }

    /// Write `config`, run the engine once and wait for it to exit.
    ///
    /// Ctrl-C while waiting is forwarded to the engine as SIGTERM.
    pub async fn run(&self, config: &ProxyConfig) -> crate::Result<ExitStatus> {
        let file = ConfigFile::write(config)?;
        let child = self.spawn(&file)?;
        let status = wait_forwarding_interrupt(child).await?;

        tracing::info!(status = %status, "engine exited");
        Ok(status)
    }
}

async fn wait_forwarding_interrupt(mut child: Child) -> crate::Result<ExitStatus> {
    let interrupt = tokio::select! {
        status = child.wait() => {
            return Ok(status.context("failed to wait for engine process")?);
        }
        signal = tokio::signal::ctrl_c() => signal,
    };

    interrupt.context("failed to listen for interrupt")?;
    tracing::info!("interrupt received, stopping engine");
    stop(&mut child, STOP_GRACE).await
}

/// SIGTERM, then kill once `grace` runs out
async fn stop(child: &mut Child, grace: Duration) -> crate::Result<ExitStatus> {
    if let Some(pid) = child.id() {
        let pid = Pid::from_raw(i32::try_from(pid).context("engine pid out of range")?);
        if let Err(e) = kill(pid, Signal::SIGTERM) {
            tracing::warn!(error = %e, "failed to signal engine, killing it");
        }
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => Ok(status.context("failed to wait for engine process")?),
        Err(_) => {
            tracing::warn!(
                grace_ms = grace.as_millis() as u64,
                "engine ignored SIGTERM, killing it"
            );
            child.kill().await.context("failed to kill engine process")?;
            Ok(child.wait().await.context("failed to wait for engine process")?)
        }
    }
}
