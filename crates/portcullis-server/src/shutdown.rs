//! Graceful shutdown.
//!
//! [`ShutdownSignal`] is a cloneable latch: once triggered it stays triggered,
//! and every pending or future [`ShutdownSignal::recv`] resolves.
//! [`ConnectionTracker`] counts live connections so the server can wait for
//! them to drain before exiting.
//!
//! ```
//! use portcullis_server::ShutdownSignal;
//!
//! # tokio_test::block_on(async {
//! let shutdown = ShutdownSignal::new();
//! let waiter = shutdown.clone();
//!
//! shutdown.trigger();
//! waiter.recv().await;
//! assert!(waiter.is_shutdown());
//! # });
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tracing::{info, warn};

/// Cloneable shutdown latch.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Creates an untriggered signal.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Creates a signal that triggers on Ctrl+C or, on Unix, `SIGTERM`.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn with_os_signals() -> Self {
        let signal = Self::new();
        let trigger = signal.clone();
        tokio::spawn(async move {
            wait_for_os_signal().await;
            trigger.trigger();
        });
        signal
    }

    /// Triggers shutdown. Returns `false` if it was already triggered.
    pub fn trigger(&self) -> bool {
        let was_triggered = self.sender.send_replace(true);
        if !was_triggered {
            info!("Shutdown requested");
        }
        !was_triggered
    }

    /// Returns `true` once shutdown has been triggered.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.sender.borrow()
    }

    /// Waits until shutdown is triggered.
    pub async fn recv(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

async fn wait_for_os_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    result = tokio::signal::ctrl_c() => log_ctrl_c(result),
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                }
                return;
            }
            Err(error) => warn!(%error, "Cannot listen for SIGTERM, using Ctrl+C only"),
        }
    }

    log_ctrl_c(tokio::signal::ctrl_c().await);
}

fn log_ctrl_c(result: std::io::Result<()>) {
    match result {
        Ok(()) => info!("Received Ctrl+C"),
        Err(error) => warn!(%error, "Ctrl+C listener failed, shutting down"),
    }
}

/// Counts live connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active: Arc<AtomicUsize>,
    drained: Arc<Notify>,
}

impl ConnectionTracker {
    /// Creates a tracker with no connections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection. It is released when the token drops.
    #[must_use]
    pub fn acquire(&self) -> ConnectionToken {
        self.active.fetch_add(1, Ordering::SeqCst);
        ConnectionToken {
            tracker: self.clone(),
        }
    }

    /// Returns the number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits until no connection is live.
    pub async fn wait_until_drained(&self) {
        loop {
            let drained = self.drained.notified();
            if self.active_connections() == 0 {
                return;
            }
            drained.await;
        }
    }
}

/// Keeps a connection counted while alive.
#[derive(Debug)]
pub struct ConnectionToken {
    tracker: ConnectionTracker,
}

impl Drop for ConnectionToken {
    fn drop(&mut self) {
        if self.tracker.active.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.drained.notify_waiters();
        }
    }
}
