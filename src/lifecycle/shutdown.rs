//! Shutdown coordination.

use std::fmt;

use tokio::sync::broadcast;

/// Why the process is stopping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// Ctrl-C / SIGINT.
    Interrupt,
    /// SIGTERM, e.g. pod termination.
    Terminate,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Interrupt => f.write_str("user"),
            ShutdownReason::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Broadcasts a single shutdown request to every long-running task.
///
/// A receiver that subscribed before `trigger` keeps the reason buffered, so
/// a task busy with a cycle still sees it at its next wait point.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<ShutdownReason>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShutdownReason> {
        self.tx.subscribe()
    }

    /// Request shutdown. Returns the number of tasks notified.
    pub fn trigger(&self, reason: ShutdownReason) -> usize {
        self.tx.send(reason).unwrap_or(0)
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
