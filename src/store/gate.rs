//! Open/closed gate that suspends producers while a drain is in progress
//!
//! Backed by a `watch` channel carrying the open flag, so a release wakes
//! every suspended waiter at once rather than handing out turns.

use crate::error::ApiError;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

pub struct Gate {
    open: watch::Sender<bool>,
}

impl Gate {
    /// New gate, initially open
    pub fn new() -> Self {
        let (open, _) = watch::channel(true);
        Self { open }
    }

    pub fn is_open(&self) -> bool {
        *self.open.borrow()
    }

    /// Close the gate; subsequent `wait` calls suspend until `release`
    pub fn block(&self) {
        self.open.send_replace(false);
    }

    /// Reopen the gate and wake every waiter
    pub fn release(&self) {
        self.open.send_replace(true);
    }

    /// Suspend until the gate is open, or fail with `Cancelled`
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        let mut rx = self.open.subscribe();
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ApiError::Cancelled),
            changed = rx.wait_for(|open| *open) => {
                // the sender lives as long as the gate, so this cannot be a closed channel
                changed.map(|_| ()).map_err(|_| ApiError::Cancelled)
            }
        }
    }
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Gate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gate").field("open", &self.is_open()).finish()
    }
}
