// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Realtime change notification.
//
// A subscription opens a named channel on the store and spawns a task that
// turns every insert/update/delete into a bare "something changed" call.
// Payloads are never inspected; the only sensible reaction is to recompose
// the affected feeds.  A lagging receiver still produces one call, so no
// change is silently lost.
//
// The returned handle owns the channel.  `unsubscribe` closes it; dropping
// an active handle does the same, so a torn-down screen cannot leave a live
// channel triggering work nobody observes.

use std::sync::Arc;

use souk_core::error::{Result, SoukError};
use souk_core::types::Table;
use souk_store::SubscriptionSource;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Lifecycle of a subscription.  `Active → Closed` only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Closed,
}

/// Opens change subscriptions against a store.
#[derive(Clone)]
pub struct ChangeNotifier {
    source: Arc<dyn SubscriptionSource>,
}

impl ChangeNotifier {
    pub fn new(source: Arc<dyn SubscriptionSource>) -> Self {
        Self { source }
    }

    /// Watch `table` on `channel`, calling `on_change` for every event.
    ///
    /// Must be called from within a tokio runtime.  No reconnection is
    /// attempted if the store drops the channel.
    pub fn subscribe<F>(&self, channel: &str, table: Table, mut on_change: F) -> Result<SubscriptionHandle>
    where
        F: FnMut() + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SoukError::Subscription(format!("no async runtime: {e}")))?;

        let mut events = self.source.open_channel(channel, table)?;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let name = channel.to_string();

        let task = runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    event = events.recv() => match event {
                        Ok(event) => {
                            debug!(channel = %name, ?event, "change received");
                            on_change();
                        }
                        Err(RecvError::Lagged(missed)) => {
                            debug!(channel = %name, missed, "change receiver lagged");
                            on_change();
                        }
                        Err(RecvError::Closed) => {
                            warn!(channel = %name, "change source closed the channel");
                            break;
                        }
                    },
                }
            }
        });

        info!(channel, %table, "subscribed");
        Ok(SubscriptionHandle {
            channel: channel.to_string(),
            source: Arc::clone(&self.source),
            stop: Some(stop_tx),
            task: Some(task),
            state: SubscriptionState::Active,
        })
    }
}

/// Owner of one live channel.
pub struct SubscriptionHandle {
    channel: String,
    source: Arc<dyn SubscriptionSource>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    state: SubscriptionState,
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("channel", &self.channel)
            .field("state", &self.state)
            .finish()
    }
}

impl SubscriptionHandle {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Stop delivering signals and release the channel.  Idempotent.
    pub async fn unsubscribe(&mut self) {
        if let Some(task) = self.release()
            && let Err(e) = task.await
            && !e.is_cancelled()
        {
            warn!(channel = %self.channel, error = %e, "subscription task ended abnormally");
        }
    }

    fn release(&mut self) -> Option<JoinHandle<()>> {
        if self.state == SubscriptionState::Closed {
            return None;
        }
        if let Some(stop) = self.stop.take() {
            // The task may already have exited on a closed source.
            let _ = stop.send(());
        }
        self.source.close_channel(&self.channel);
        self.state = SubscriptionState::Closed;
        info!(channel = %self.channel, "unsubscribed");
        self.task.take()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        if let Some(task) = self.release() {
            task.abort();
        }
    }
}
