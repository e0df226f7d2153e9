// Dashboard notification inbox: newest first, read/unread tracking and a simulated alert feed.

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::models::now_millis;
use crate::simulation::new_rng;

/// Inbox capacity; the oldest notifications are dropped first.
pub const MAX_NOTIFICATIONS: usize = 100;

/// Chance that a feed tick produces a notification.
const FEED_PROBABILITY: f64 = 0.5;

const FEED: [(NotificationKind, &str, &str); 6] = [
    (
        NotificationKind::Info,
        "System Update",
        "Sensor data synchronized successfully",
    ),
    (
        NotificationKind::Success,
        "Leak Prevented",
        "AI detected and prevented potential leak in Zone B",
    ),
    (
        NotificationKind::Warning,
        "High Water Usage",
        "Water consumption 15% above normal in District 3",
    ),
    (
        NotificationKind::Alert,
        "Pressure Alert",
        "Pipeline pressure dropping in Sector 7",
    ),
    (
        NotificationKind::Info,
        "Weather Update",
        "Heavy rainfall expected in next 6 hours",
    ),
    (
        NotificationKind::Success,
        "Optimization Complete",
        "Water distribution optimized, saving 12% resources",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
    Alert,
}

impl NotificationKind {
    /// Error and alert notifications are the ones the dashboard sounds for.
    pub fn is_critical(self) -> bool {
        matches!(self, NotificationKind::Error | NotificationKind::Alert)
    }
}

/// Caller-supplied part of a notification; id, timestamp and read flag are assigned on add.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: u64,
    pub read: bool,
}

struct InboxState {
    rng: StdRng,
    next_seq: u64,
    /// Newest first.
    items: VecDeque<Notification>,
}

pub struct NotificationInbox {
    state: Mutex<InboxState>,
}

impl Default for NotificationInbox {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationInbox {
    pub fn new() -> Self {
        Self::build(None)
    }

    /// Deterministic feed for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::build(Some(seed))
    }

    fn build(seed: Option<u64>) -> Self {
        Self {
            state: Mutex::new(InboxState {
                rng: new_rng(seed),
                next_seq: 0,
                items: VecDeque::with_capacity(MAX_NOTIFICATIONS),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InboxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store as unread at the front of the inbox and return the stored copy.
    pub fn add(&self, new: NewNotification) -> Notification {
        let timestamp = now_millis();
        let mut state = self.lock();
        state.next_seq += 1;
        let notification = Notification {
            id: format!("notif-{}-{}", timestamp, state.next_seq),
            kind: new.kind,
            title: new.title,
            message: new.message,
            timestamp,
            read: false,
        };
        state.items.push_front(notification.clone());
        state.items.truncate(MAX_NOTIFICATIONS);
        if notification.kind.is_critical() {
            debug!(id = %notification.id, title = %notification.title, "Critical notification added");
        }
        notification
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Notification> {
        self.lock().items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unread_count(&self) -> usize {
        self.lock().items.iter().filter(|n| !n.read).count()
    }

    /// False when no notification has this id.
    pub fn mark_as_read(&self, id: &str) -> bool {
        match self.lock().items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    /// Returns how many were unread.
    pub fn mark_all_as_read(&self) -> usize {
        let mut state = self.lock();
        let mut updated = 0;
        for n in state.items.iter_mut().filter(|n| !n.read) {
            n.read = true;
            updated += 1;
        }
        updated
    }

    /// False when no notification has this id.
    pub fn clear(&self, id: &str) -> bool {
        let mut state = self.lock();
        let before = state.items.len();
        state.items.retain(|n| n.id != id);
        state.items.len() != before
    }

    /// Returns how many were removed.
    pub fn clear_all(&self) -> usize {
        let mut state = self.lock();
        let cleared = state.items.len();
        state.items.clear();
        cleared
    }

    /// One feed tick: with even odds, add a random canned notification.
    pub fn simulate_feed_tick(&self) -> Option<Notification> {
        let (kind, title, message) = {
            let mut state = self.lock();
            if !state.rng.gen_bool(FEED_PROBABILITY) {
                return None;
            }
            FEED[state.rng.gen_range(0..FEED.len())]
        };
        Some(self.add(NewNotification {
            kind,
            title: title.into(),
            message: message.into(),
        }))
    }

    pub fn add_welcome(&self) -> Notification {
        self.add(NewNotification {
            kind: NotificationKind::Success,
            title: "System Online".into(),
            message: "All systems operational. Welcome back!".into(),
        })
    }
}
