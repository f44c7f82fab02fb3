//! Session-scoped notification deduplication.
//!
//! The server reports every unread notification on each poll. This state
//! machine decides which of them the user has not been shown yet, without any
//! per-client read tracking on the server:
//!
//! 1. The first successful poll starts the session and becomes the baseline;
//!    nothing is reported as new.
//! 2. Later polls look only at notifications created after the session start.
//!    Whatever exceeds the previously recorded count is new.
//! 3. Dismissing all restarts the session at "now" with a zero count.

use super::model::{Notification, NotificationId};
use crate::clock::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub struct NotificationSession {
    clock: Arc<dyn Clock>,
    session_start: Option<DateTime<Utc>>,
    seen_count: usize,
    notifications: Vec<Notification>,
}

impl NotificationSession {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            session_start: None,
            seen_count: 0,
            notifications: Vec::new(),
        }
    }

    /// `None` until the first successful poll.
    pub fn session_start(&self) -> Option<DateTime<Utc>> {
        self.session_start
    }

    /// Notifications created after the session start that were already
    /// accounted for.
    pub fn seen_count(&self) -> usize {
        self.seen_count
    }

    /// The full unread set from the latest poll, minus local reads.
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Badge count.
    pub fn unread_count(&self) -> usize {
        self.notifications.len()
    }

    /// Records a successful poll and returns the notifications that just
    /// arrived, oldest first.
    pub fn observe(&mut self, unread: Vec<Notification>) -> Vec<Notification> {
        self.notifications = unread;

        let Some(start) = self.session_start else {
            let start = self.clock.now();
            self.session_start = Some(start);
            let baseline = self.created_after(start).len();
            self.seen_count = baseline;
            return Vec::new();
        };

        let fresh = self.created_after(start);
        let total = fresh.len();
        let arrived: Vec<Notification> = fresh
            .into_iter()
            .skip(self.seen_count)
            .cloned()
            .collect();
        self.seen_count = total;
        arrived
    }

    /// Restarts the session so everything currently unread counts as seen.
    pub fn dismiss_all(&mut self) {
        self.session_start = Some(self.clock.now());
        self.seen_count = 0;
    }

    /// Applies a confirmed server-side read of `id`. Returns whether it was
    /// present locally.
    pub fn mark_read(&mut self, id: &NotificationId) -> bool {
        let Some(index) = self.notifications.iter().position(|n| &n.id == id) else {
            return false;
        };
        let removed = self.notifications.remove(index);
        if self.session_start.is_some_and(|start| removed.created_at > start) {
            self.seen_count = self.seen_count.saturating_sub(1);
        }
        true
    }

    /// Applies a confirmed server-side "read all".
    pub fn mark_all_read(&mut self) {
        self.notifications.clear();
        self.seen_count = 0;
    }

    fn created_after(&self, start: DateTime<Utc>) -> Vec<&Notification> {
        let mut fresh: Vec<&Notification> = self
            .notifications
            .iter()
            .filter(|n| n.created_at > start)
            .collect();
        fresh.sort_by_key(|n| n.created_at);
        fresh
    }
}
