//! smbd subprocess supervision.
//!
//! [`SmbdServer::start`] bootstraps the state directory, picks a loopback
//! port, launches smbd and hands the child to a background task that
//! relaunches it every time it exits. Nothing that happens after the first
//! launch is reported back to the caller; it is logged and retried.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use tokio::process::Child;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::bootstrap::{self, SmbConf};
use crate::command::SmbdCommand;
use crate::config::{LOOPBACK_HOST, SmbdConfig};
use crate::error::{Error, Result};
use crate::lock::StateLock;
use crate::port::reserve_port;
use crate::restart::RestartPolicy;

/// Timeout for a single readiness probe.
const READY_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Interval between readiness probes.
const READY_CHECK_INTERVAL: Duration = Duration::from_millis(100);

/// State of the smbd subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmbdState {
    /// Supervisor was shut down.
    Stopped,
    /// First launch in progress.
    Starting,
    /// A daemon process is alive.
    Running,
    /// Daemon exited; waiting out the backoff before relaunching.
    Restarting,
    /// Restart budget exhausted. Only reachable with a bounded policy.
    Failed,
}

impl std::fmt::Display for SmbdState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
            Self::Restarting => write!(f, "restarting"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A supervised smbd listening on a loopback port.
///
/// Owns exactly one daemon process at a time through its supervisor task.
/// Dropping the server stops the supervisor and kills the daemon. The state
/// directory stays locked until that daemon has been reaped.
pub struct SmbdServer {
    /// Configuration the server was started with.
    config: SmbdConfig,

    /// Generated smb.conf.
    smb_conf_path: PathBuf,

    /// Loopback port passed to smbd.
    port: u16,

    /// Current state, written only by the supervisor task.
    state: Arc<RwLock<SmbdState>>,

    /// Relaunch attempts so far.
    restart_count: Arc<AtomicU32>,

    /// Signal to stop the supervisor loop.
    shutdown: CancellationToken,

    supervisor: Option<JoinHandle<()>>,
}

impl SmbdServer {
    /// Bootstrap the state directory and launch smbd under supervision.
    ///
    /// Returns as soon as the first launch has been issued. The daemon may
    /// not be accepting connections yet; see [`SmbdServer::wait_for_ready`].
    ///
    /// # Errors
    ///
    /// Any failure up to and including the first launch: state directory or
    /// smb.conf bootstrap, a concurrent supervisor on the same state
    /// directory, port reservation, or spawning the binary.
    pub async fn start(config: SmbdConfig) -> Result<Self> {
        bootstrap::create_state_dir(&config.state_dir).map_err(|source| Error::CreateDir {
            path: config.state_dir.clone(),
            source,
        })?;

        let lock = StateLock::acquire(&config.state_dir)?;

        let smb_conf_path = config.smb_conf_path();
        SmbConf::new(&config.state_dir)
            .with_log_level(config.log_level)
            .ensure(&smb_conf_path)?;

        let port = reserve_port()?;

        let state = Arc::new(RwLock::new(SmbdState::Starting));
        let command = SmbdCommand::new(&config.binary_path, &smb_conf_path, port)
            .with_output(config.output);

        info!(
            binary = %config.binary_path.display(),
            state_dir = %config.state_dir.display(),
            port,
            "Starting smbd"
        );
        let child = command.spawn()?;
        *state.write().await = SmbdState::Running;

        let restart_count = Arc::new(AtomicU32::new(0));
        let shutdown = CancellationToken::new();

        let supervisor = Supervisor {
            command,
            policy: config.restart,
            state: Arc::clone(&state),
            restart_count: Arc::clone(&restart_count),
            shutdown: shutdown.clone(),
            _lock: lock,
        };
        let supervisor = tokio::spawn(supervisor.run(child));

        Ok(Self {
            config,
            smb_conf_path,
            port,
            state,
            restart_count,
            shutdown,
            supervisor: Some(supervisor),
        })
    }

    /// Loopback port smbd was told to listen on.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Address clients connect to.
    #[must_use]
    pub fn connection_address(&self) -> String {
        format!("{LOOPBACK_HOST}:{}", self.port)
    }

    /// Path of the generated smb.conf.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.smb_conf_path
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &SmbdConfig {
        &self.config
    }

    /// Get the current state of the daemon.
    pub async fn state(&self) -> SmbdState {
        *self.state.read().await
    }

    /// Number of relaunch attempts since start.
    #[must_use]
    pub fn restart_count(&self) -> u32 {
        self.restart_count.load(Ordering::SeqCst)
    }

    /// Signal the supervisor to stop and kill the running daemon.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the supervisor loop to finish.
    ///
    /// With the default unbounded policy this only returns after
    /// [`SmbdServer::shutdown`]. Cancel safe: the supervisor can still be
    /// awaited after an abandoned call.
    pub async fn wait(&mut self) {
        let Some(handle) = self.supervisor.as_mut() else {
            return;
        };
        let result = handle.await;
        self.supervisor = None;

        if let Err(e) = result {
            warn!(error = %e, "smbd supervisor task panicked");
        }
    }

    /// Wait until smbd accepts TCP connections on its port.
    ///
    /// # Errors
    ///
    /// [`Error::NotReady`] if `timeout` elapses first, or if the supervisor
    /// gives up or is shut down while waiting.
    pub async fn wait_for_ready(&self, timeout: Duration) -> Result<()> {
        let start = Instant::now();
        let addr = self.connection_address();
        let mut attempts: u32 = 0;

        info!(port = self.port, "Waiting for smbd to accept connections");

        loop {
            attempts = attempts.saturating_add(1);

            match tokio::time::timeout(READY_CHECK_TIMEOUT, tokio::net::TcpStream::connect(&addr))
                .await
            {
                Ok(Ok(_stream)) => {
                    debug!(
                        attempts,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "smbd is ready"
                    );
                    return Ok(());
                }
                Ok(Err(e)) => trace!(attempt = attempts, error = %e, "Connect failed, retrying"),
                Err(_) => trace!(attempt = attempts, "Connect timed out, retrying"),
            }

            let not_ready = Error::NotReady {
                port: self.port,
                timeout,
            };
            if start.elapsed() >= timeout {
                return Err(not_ready);
            }
            if matches!(self.state().await, SmbdState::Failed | SmbdState::Stopped) {
                return Err(not_ready);
            }

            tokio::time::sleep(READY_CHECK_INTERVAL).await;
        }
    }
}

impl Drop for SmbdServer {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// The restart loop. Sole owner of the daemon's [`Child`] and of the state
/// directory lock, which is released only once no daemon is left running.
struct Supervisor {
    command: SmbdCommand,
    policy: RestartPolicy,
    state: Arc<RwLock<SmbdState>>,
    restart_count: Arc<AtomicU32>,
    shutdown: CancellationToken,
    _lock: StateLock,
}

impl Supervisor {
    async fn run(self, first: Child) {
        info!(port = self.command.port(), "Running smbd in a supervisor loop");

        let mut child = Some(first);
        let mut attempts: u32 = 0;

        loop {
            if let Some(running) = child.take()
                && !self.wait_for_exit(running).await
            {
                self.set_state(SmbdState::Stopped).await;
                break;
            }

            if self.policy.is_exhausted(attempts) {
                error!(
                    attempts,
                    max = ?self.policy.max_restarts,
                    "Max restart attempts reached, marking as failed"
                );
                self.set_state(SmbdState::Failed).await;
                break;
            }

            let delay = self.policy.backoff.delay(attempts);
            attempts = attempts.saturating_add(1);
            self.restart_count.store(attempts, Ordering::SeqCst);
            self.set_state(SmbdState::Restarting).await;
            debug!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                "Waiting before restart"
            );

            let cancelled = tokio::select! {
                () = self.shutdown.cancelled() => true,
                () = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                self.set_state(SmbdState::Stopped).await;
                break;
            }

            match self.command.spawn() {
                Ok(relaunched) => {
                    self.set_state(SmbdState::Running).await;
                    child = Some(relaunched);
                }
                Err(e) => {
                    warn!(attempt = attempts, error = %e, "Failed to relaunch smbd, will retry");
                }
            }
        }

        info!("smbd supervisor loop exited");
    }

    /// Block until the daemon exits. Returns `false` if shutdown was
    /// requested instead, after killing the daemon.
    async fn wait_for_exit(&self, mut child: Child) -> bool {
        let exited = tokio::select! {
            () = self.shutdown.cancelled() => None,
            status = child.wait() => Some(status),
        };

        match exited {
            Some(Ok(status)) => {
                warn!(%status, "smbd exited, will restart");
                true
            }
            Some(Err(e)) => {
                error!(error = %e, "Error waiting for smbd, will restart");
                true
            }
            None => {
                info!("Stopping smbd");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill smbd");
                }
                false
            }
        }
    }

    async fn set_state(&self, state: SmbdState) {
        *self.state.write().await = state;
    }
}
