//! loopshare serve command for running smbd under supervision
//!
//! Bootstraps the state directory, starts smbd on a free loopback port and
//! keeps it running until Ctrl-C.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use loopshare_smbd::{SmbdConfig, SmbdServer, run_preflight_checks};
use tracing::{info, warn};

use super::StateDirArgs;
use crate::config::ConfigLoader;
use crate::supervisor::{SupervisorState, clear_supervisor_state, write_supervisor_state};

/// Default time to wait for smbd to accept connections with --wait
pub const DEFAULT_READY_TIMEOUT_SECS: u64 = 30;

/// Arguments for the serve command
#[derive(Debug, Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub state: StateDirArgs,

    /// Path to the smbd binary (overrides config)
    #[arg(long, value_name = "PATH")]
    pub smbd: Option<PathBuf>,

    /// Wait until smbd accepts connections before reporting the port
    #[arg(long)]
    pub wait: bool,

    /// Seconds to wait for smbd with --wait
    #[arg(long, default_value_t = DEFAULT_READY_TIMEOUT_SECS, requires = "wait")]
    pub ready_timeout: u64,
}

impl ServeArgs {
    fn apply(&self, config: SmbdConfig) -> SmbdConfig {
        let config = self.state.apply(config);
        match &self.smbd {
            Some(smbd) => config.with_binary_path(smbd),
            None => config,
        }
    }
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    let config = args.apply(ConfigLoader::load()?.smbd);
    run_preflight_checks(&config)?;

    let server = SmbdServer::start(config)
        .await
        .context("Failed to start smbd")?;

    serve_started(server, &args).await
}

/// Record the running server, supervise it, then stop it and remove the
/// state file whether or not supervision succeeded.
async fn serve_started(mut server: SmbdServer, args: &ServeArgs) -> Result<()> {
    let state_dir = server.config().state_dir.clone();
    if let Err(e) = write_supervisor_state(&state_dir, &SupervisorState::new(server.port())) {
        warn!("Failed to write supervisor state file: {}", e);
    }

    let result = supervise(&mut server, args).await;

    server.shutdown();
    server.wait().await;

    if let Err(e) = clear_supervisor_state(&state_dir) {
        warn!("Failed to clear supervisor state file: {}", e);
    }
    result
}

/// Report the address and block until Ctrl-C or the end of the supervisor.
async fn supervise(server: &mut SmbdServer, args: &ServeArgs) -> Result<()> {
    if args.wait {
        server
            .wait_for_ready(Duration::from_secs(args.ready_timeout))
            .await?;
    }

    info!(
        address = %server.connection_address(),
        config = %server.config_path().display(),
        "smbd supervised"
    );
    println!("smbd listening on {}", server.connection_address());

    let interrupted = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            true
        }
        () = server.wait() => false,
    };

    if interrupted {
        info!("Received Ctrl-C, stopping smbd");
    } else {
        warn!(state = %server.state().await, "smbd supervisor stopped on its own");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn test_serve_args_defaults() {
        let cli = TestCli::parse_from(["test"]);
        assert!(cli.serve.state.state_dir.is_none());
        assert!(cli.serve.smbd.is_none());
        assert!(!cli.serve.wait);
        assert_eq!(cli.serve.ready_timeout, DEFAULT_READY_TIMEOUT_SECS);
    }

    #[test]
    fn test_serve_args_override_config() {
        let cli = TestCli::parse_from([
            "test",
            "--state-dir",
            "/tmp/loopshare-state",
            "--smbd",
            "/opt/samba/sbin/smbd",
        ]);

        let config = cli.serve.apply(SmbdConfig::default().with_log_level(2));

        assert_eq!(config.state_dir, PathBuf::from("/tmp/loopshare-state"));
        assert_eq!(config.binary_path, PathBuf::from("/opt/samba/sbin/smbd"));
        assert_eq!(config.log_level, 2);
    }

    #[test]
    fn test_ready_timeout_requires_wait() {
        let result = TestCli::try_parse_from(["test", "--ready-timeout", "5"]);
        assert!(result.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_wait_still_cleans_up() {
        use crate::supervisor::{read_supervisor_state, state_file_path};
        use loopshare_smbd::SmbdState;
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        // Never listens, so --wait times out.
        let smbd = temp.path().join("smbd");
        std::fs::write(&smbd, "#!/bin/sh\nexec sleep 30\n").unwrap();
        std::fs::set_permissions(&smbd, std::fs::Permissions::from_mode(0o755)).unwrap();
        let state_dir = temp.path().join("state");

        let config = SmbdConfig::default()
            .with_state_dir(&state_dir)
            .with_binary_path(&smbd);
        let server = SmbdServer::start(config).await.unwrap();
        let state = server.config().state_dir.clone();
        let cli = TestCli::parse_from(["test", "--wait", "--ready-timeout", "1"]);

        let result = serve_started(server, &cli.serve).await;

        assert!(result.is_err());
        assert!(read_supervisor_state(&state).is_none());
        assert!(!state_file_path(&state).exists());

        // The state directory lock is free again, so the daemon is gone.
        let again = SmbdServer::start(
            SmbdConfig::default()
                .with_state_dir(&state_dir)
                .with_binary_path(&smbd),
        )
        .await
        .unwrap();
        assert_eq!(again.state().await, SmbdState::Running);
        again.shutdown();
    }
}
