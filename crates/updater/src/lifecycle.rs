//! Created → Running → Stopped state shared between the supervisory loop,
//! the delivery task and the signal bridge.

use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::watch;

use crate::error::IngestorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum LifecycleState {
    Created = 0,
    Running = 1,
    Stopped = 2,
}

impl LifecycleState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Created,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Stopped is terminal. A stop request is also published on a watch channel
/// so any number of tasks can wait for it without missing the wake-up.
pub struct Lifecycle {
    state: AtomicU8,
    stopped: watch::Sender<bool>,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(LifecycleState::Created as u8),
            stopped: watch::Sender::new(false),
        }
    }

    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_running(&self) -> bool {
        self.state() == LifecycleState::Running
    }

    /// Created → Running.
    pub fn begin(&self) -> Result<(), IngestorError> {
        match self.state.compare_exchange(
            LifecycleState::Created as u8,
            LifecycleState::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => Ok(()),
            Err(current) => match LifecycleState::from_u8(current) {
                LifecycleState::Running => Err(IngestorError::AlreadyRunning),
                _ => Err(IngestorError::Stopped),
            },
        }
    }

    /// Move to Stopped from any state. Returns the previous state.
    pub fn stop(&self) -> LifecycleState {
        let previous = self.state.swap(LifecycleState::Stopped as u8, Ordering::SeqCst);
        self.stopped.send_replace(true);
        LifecycleState::from_u8(previous)
    }

    /// Resolves once [`stop`](Self::stop) has been called (immediately if it already was).
    pub async fn stopped(&self) {
        let mut rx = self.stopped.subscribe();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn created_running_stopped() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.state(), LifecycleState::Created);

        lifecycle.begin().unwrap();
        assert!(lifecycle.is_running());

        assert_eq!(lifecycle.stop(), LifecycleState::Running);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn begin_twice_is_rejected() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin().unwrap();
        assert!(matches!(lifecycle.begin(), Err(IngestorError::AlreadyRunning)));
    }

    #[test]
    fn stopped_is_terminal() {
        let lifecycle = Lifecycle::new();
        assert_eq!(lifecycle.stop(), LifecycleState::Created);
        assert!(matches!(lifecycle.begin(), Err(IngestorError::Stopped)));
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[test]
    fn stop_is_idempotent() {
        let lifecycle = Lifecycle::new();
        lifecycle.begin().unwrap();
        assert_eq!(lifecycle.stop(), LifecycleState::Running);
        assert_eq!(lifecycle.stop(), LifecycleState::Stopped);
        assert_eq!(lifecycle.state(), LifecycleState::Stopped);
    }

    #[tokio::test]
    async fn stopped_resolves_for_late_and_early_waiters() {
        let lifecycle = Arc::new(Lifecycle::new());

        let early = tokio::spawn({
            let lifecycle = lifecycle.clone();
            async move { lifecycle.stopped().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        lifecycle.stop();

        tokio::time::timeout(Duration::from_secs(1), early)
            .await
            .expect("early waiter should wake")
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), lifecycle.stopped())
            .await
            .expect("late waiter should return immediately");
    }
}
