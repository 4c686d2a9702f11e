// SPDX-License-Identifier: Apache-2.0

//! Process-wide realtime transport handle.
//!
//! One hub per process, initialized lazily and reused; callers get
//! `Option<&RealtimeHub>` and must degrade gracefully when the transport
//! was never brought up. Events fan out per user id to whatever live
//! sessions are subscribed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;
use tipline_model::UserId;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNotificationEvent {
    pub user_id: UserId,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Default)]
pub struct RealtimeHub {
    subscribers: RwLock<HashMap<UserId, Vec<mpsc::UnboundedSender<NewNotificationEvent>>>>,
}

impl RealtimeHub {
    /// Registers a live session on the user's channel.
    pub async fn subscribe(&self, user_id: UserId) -> mpsc::UnboundedReceiver<NewNotificationEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.write().await.entry(user_id).or_default().push(tx);
        rx
    }

    /// Delivers to every live session of the event's user; dead sessions
    /// are pruned as a side effect. Never fails.
    pub async fn emit(&self, event: NewNotificationEvent) {
        let mut subscribers = self.subscribers.write().await;
        if let Some(senders) = subscribers.get_mut(&event.user_id) {
            senders.retain(|tx| tx.send(event.clone()).is_ok());
            if senders.is_empty() {
                subscribers.remove(&event.user_id);
            }
        }
    }

    pub async fn live_session_count(&self) -> usize {
        self.subscribers.read().await.values().map(Vec::len).sum()
    }
}

static HUB: OnceLock<RealtimeHub> = OnceLock::new();

/// Idempotent: the first call creates the hub, later calls return it.
pub fn init_realtime() -> &'static RealtimeHub {
    let mut created = false;
    let hub = HUB.get_or_init(|| {
        created = true;
        RealtimeHub::default()
    });
    if created {
        info!("realtime hub initialized");
    } else {
        info!("realtime hub already initialized");
    }
    hub
}

/// `None` until [`init_realtime`] ran; callers log and skip.
pub fn realtime() -> Option<&'static RealtimeHub> {
    HUB.get()
}
