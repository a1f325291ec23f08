//! OS signal bridge. Every termination-style signal ends in a stop request.

use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Terminate,
    Hangup,
    Interrupt,
}

impl ShutdownSignal {
    pub fn name(self) -> &'static str {
        match self {
            Self::Terminate => "SIGTERM",
            Self::Hangup => "SIGHUP",
            Self::Interrupt => "SIGINT",
        }
    }
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Register SIGTERM, SIGHUP and SIGINT and call `on_signal` for each delivery.
///
/// Handlers are installed before this returns, so a registration failure is
/// reported to the caller instead of being lost in the spawned task. Repeated
/// signals invoke `on_signal` again; it must tolerate that.
#[cfg(unix)]
pub fn spawn_bridge<F>(on_signal: F) -> std::io::Result<JoinHandle<()>>
where
    F: Fn(ShutdownSignal) + Send + 'static,
{
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = sigterm.recv() => ShutdownSignal::Terminate,
                Some(()) = sighup.recv() => ShutdownSignal::Hangup,
                Some(()) = sigint.recv() => ShutdownSignal::Interrupt,
                else => break,
            };
            debug!(signal = %received, "signal received");
            on_signal(received);
        }
    }))
}

/// Ctrl+C only.
#[cfg(not(unix))]
pub fn spawn_bridge<F>(on_signal: F) -> std::io::Result<JoinHandle<()>>
where
    F: Fn(ShutdownSignal) + Send + 'static,
{
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            debug!(signal = %ShutdownSignal::Interrupt, "signal received");
            on_signal(ShutdownSignal::Interrupt);
        }
    }))
}
