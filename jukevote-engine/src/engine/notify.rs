//! DJ notification ring
//!
//! Append-only per-session ring with a fixed capacity; the oldest entry is
//! dropped at insertion time, never by a later cleanup pass.

use std::collections::VecDeque;

use chrono::Utc;
use jukevote_common::model::{DjNotification, NotificationKind};
use uuid::Uuid;

/// Bounded ring of operator notifications
#[derive(Debug)]
pub struct NotificationRing {
    entries: VecDeque<DjNotification>,
    cap: usize,
}

impl NotificationRing {
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(cap),
            cap,
        }
    }

    /// Append a notification, dropping the oldest entry once at capacity
    pub fn push(&mut self, kind: NotificationKind, message: String, amount: Option<f64>) {
        if self.entries.len() == self.cap {
            self.entries.pop_front();
        }
        self.entries.push_back(DjNotification {
            id: Uuid::new_v4(),
            kind,
            message,
            amount,
            timestamp: Utc::now(),
            read: false,
        });
    }

    /// Set the read flag on one entry; false if the id is unknown
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    /// Snapshot oldest-first
    pub fn to_vec(&self) -> Vec<DjNotification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
