//! OS signal handling.
//!
//! SIGINT (Ctrl-C) and, on unix, SIGTERM are translated into a single
//! shutdown trigger. The first signal wins; the process is expected to exit
//! once the monitor loop returns.

use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};

/// Wait for the first termination signal.
pub async fn wait_for_signal() -> std::io::Result<ShutdownReason> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate())?;
        tokio::select! {
            res = tokio::signal::ctrl_c() => res.map(|_| ShutdownReason::Interrupt),
            _ = term.recv() => Ok(ShutdownReason::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        Ok(ShutdownReason::Interrupt)
    }
}

/// Spawn a task that triggers `shutdown` on the first signal.
pub fn listen(shutdown: Shutdown) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(reason) => {
                tracing::debug!(reason = ?reason, "Signal received");
                shutdown.trigger(reason);
            }
            Err(e) => tracing::error!("Failed to install signal handlers: {}", e),
        }
    })
}
