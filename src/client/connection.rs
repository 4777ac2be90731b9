//! Client connection manager.
//!
//! Owns the lifecycle of one stream connection: connect, read, dispatch,
//! and retry on failure. Retries use a fixed delay and a bounded attempt
//! count; `disconnect` suppresses any pending retry, and `reconnect` starts
//! over with a fresh attempt counter.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ClientConfig;
use crate::domain::foundation::EventEnvelope;
use crate::ports::{StreamConnector, StreamFrame};

use super::dispatcher::EventDispatcher;

/// Observable connection lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No stream open and no attempt in flight.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// A stream is open and frames are being read.
    Connected,
    /// The retry budget is exhausted; only `reconnect` leaves this state.
    RetriesExhausted,
}

struct ClientInner {
    connector: Arc<dyn StreamConnector>,
    dispatcher: Arc<EventDispatcher>,
    retry_delay: Duration,
    max_retries: u32,
    status: watch::Sender<ConnectionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Manages one long-lived stream connection with bounded retry.
///
/// Cheap to clone; all clones share the same connection.
#[derive(Clone)]
pub struct SyncClient {
    inner: Arc<ClientInner>,
}

impl SyncClient {
    /// Creates a client; no connection is attempted until `connect`.
    pub fn new(
        connector: Arc<dyn StreamConnector>,
        retry_delay: Duration,
        max_retries: u32,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ClientInner {
                connector,
                dispatcher: Arc::new(EventDispatcher::new()),
                retry_delay,
                max_retries,
                status,
                task: Mutex::new(None),
            }),
        }
    }

    /// Creates a client from configuration.
    ///
    /// With `auto_connect` set, the connection loop starts immediately;
    /// call within a tokio runtime.
    pub fn from_config(connector: Arc<dyn StreamConnector>, config: &ClientConfig) -> Self {
        let client = Self::new(
            connector,
            Duration::from_millis(config.reconnect_delay_ms),
            config.max_reconnect_attempts,
        );
        if config.auto_connect {
            client.connect();
        }
        client
    }

    /// The dispatcher receiving every decoded envelope.
    pub fn dispatcher(&self) -> Arc<EventDispatcher> {
        Arc::clone(&self.inner.dispatcher)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.inner.status.borrow()
    }

    /// Subscribes to lifecycle state changes.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.status.subscribe()
    }

    /// Starts (or restarts) the connection loop.
    ///
    /// Any previous loop is cancelled first, so at most one stream is ever
    /// open. The retry counter starts fresh.
    pub fn connect(&self) {
        let mut task = self
            .inner
            .task
            .lock()
            .expect("SyncClient: task lock poisoned");
        if let Some(previous) = task.take() {
            previous.abort();
        }
        let inner = Arc::clone(&self.inner);
        *task = Some(tokio::spawn(run_connection_loop(inner)));
    }

    /// Restarts the connection loop with a fresh retry counter.
    ///
    /// This is the only way out of `RetriesExhausted`.
    pub fn reconnect(&self) {
        self.connect();
    }

    /// Stops the connection loop and suppresses any pending retry.
    ///
    /// Idempotent; the state settles at `Disconnected`.
    pub fn disconnect(&self) {
        let mut task = self
            .inner
            .task
            .lock()
            .expect("SyncClient: task lock poisoned");
        if let Some(previous) = task.take() {
            previous.abort();
        }
        self.inner.status.send_replace(ConnectionState::Disconnected);
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// The connection loop: one iteration per connect attempt.
///
/// `failures` counts consecutive failed attempts since the last successful
/// connection; once it passes the budget the loop parks in
/// `RetriesExhausted` until `reconnect`.
async fn run_connection_loop(inner: Arc<ClientInner>) {
    let mut failures: u32 = 0;
    loop {
        inner.status.send_replace(ConnectionState::Connecting);
        match inner.connector.connect().await {
            Ok(mut stream) => {
                failures = 0;
                inner.status.send_replace(ConnectionState::Connected);
                info!("Stream connected");

                while let Some(item) = stream.next().await {
                    match item {
                        Ok(frame) => dispatch_frame(&inner, frame),
                        Err(e) => {
                            warn!(error = %e, "Stream read failed");
                            break;
                        }
                    }
                }
                info!("Stream closed");
            }
            Err(e) => warn!(error = %e, "Connect attempt failed"),
        }

        if failures >= inner.max_retries {
            error!(
                attempts = failures + 1,
                "Reconnect attempts exhausted, giving up"
            );
            inner.status.send_replace(ConnectionState::RetriesExhausted);
            return;
        }
        failures += 1;
        inner.status.send_replace(ConnectionState::Disconnected);
        debug!(
            attempt = failures,
            delay_ms = inner.retry_delay.as_millis() as u64,
            "Retrying after delay"
        );
        tokio::time::sleep(inner.retry_delay).await;
    }
}

/// Decodes one frame and hands it to the dispatcher.
///
/// A malformed frame is logged and skipped; it never tears the stream down.
fn dispatch_frame(inner: &ClientInner, frame: StreamFrame) {
    match serde_json::from_str::<EventEnvelope>(&frame.data) {
        Ok(envelope) => inner.dispatcher.dispatch(&envelope),
        Err(e) => warn!(
            event = %frame.event,
            error = %e,
            "Dropping malformed frame"
        ),
    }
}
