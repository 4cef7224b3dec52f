//! Relaying smbd's stdout and stderr.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::OutputRelay;

/// Which of the daemon's streams is being relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

impl Stream {
    fn name(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Spawn a task draining `pipe` until EOF.
pub(crate) fn spawn<R>(pipe: R, stream: Stream, mode: OutputRelay) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match mode {
            OutputRelay::Passthrough => match stream {
                Stream::Stdout => copy(pipe, tokio::io::stdout(), stream).await,
                Stream::Stderr => copy(pipe, tokio::io::stderr(), stream).await,
            },
            OutputRelay::Tracing => log_lines(pipe, stream).await,
        }
    })
}

async fn copy<R, W>(mut pipe: R, mut out: W, stream: Stream)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    match tokio::io::copy(&mut pipe, &mut out).await {
        Ok(bytes) => debug!(stream = stream.name(), bytes, "smbd output closed"),
        Err(e) => debug!(stream = stream.name(), error = %e, "smbd output relay stopped"),
    }
}

async fn log_lines<R>(pipe: R, stream: Stream)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(pipe).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match classify(&line) {
                Level::Error => error!(target: "smbd", stream = stream.name(), "{}", line),
                Level::Warn => warn!(target: "smbd", stream = stream.name(), "{}", line),
                Level::Debug => debug!(target: "smbd", stream = stream.name(), "{}", line),
            },
            Ok(None) => break,
            Err(e) => {
                debug!(stream = stream.name(), error = %e, "Error reading smbd output");
                break;
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Level {
    Error,
    Warn,
    Debug,
}

/// Pick a log level from level markers at word boundaries, so that prose
/// such as "the error handler" stays at debug.
fn classify(line: &str) -> Level {
    let has_marker = |m: &str| {
        line.starts_with(&format!("{m} "))
            || line.contains(&format!(" {m} "))
            || line.contains(&format!("[{m}]"))
    };

    if has_marker("ERROR") || has_marker("ERR") {
        Level::Error
    } else if has_marker("WARNING") || has_marker("WARN") {
        Level::Warn
    } else {
        Level::Debug
    }
}
