//! Per-session state
//!
//! One `SessionState` owns everything a voting event mutates: the request
//! list, its listeners, the payment ledger, the notification ring, and the
//! aggregate counters. The engine wraps each instance in a single async
//! mutex, so every field here is only touched inside that session's
//! critical section.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use jukevote_common::api::{SessionConfig, SessionDescriptor, SessionStats, SessionSummary};
use jukevote_common::model::VotingSettings;
use jukevote_common::{Error, Result};
use serde::Serialize;
use uuid::Uuid;

use super::ledger::PaymentTransaction;
use super::listener::Listener;
use super::notify::NotificationRing;
use super::queue::{self, SongRequest};

/// Derived revenue rates, recomputed by the reconciler metrics sweep
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetrics {
    pub revenue_per_hour: f64,
    pub revenue_per_listener: f64,
    pub updated_at: DateTime<Utc>,
}

/// All mutable state of one voting event
#[derive(Debug)]
pub struct SessionState {
    pub id: Uuid,
    pub event_name: String,
    pub dj_id: String,
    pub dj_name: String,
    pub venue: String,
    pub started_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    duration_minutes: Option<i64>,
    /// The only cancellation signal: once false the session is read-only
    pub active: bool,
    pub settings: VotingSettings,
    pub requests: Vec<SongRequest>,
    pub listeners: HashMap<Uuid, Listener>,
    pub transactions: Vec<PaymentTransaction>,
    pub notifications: NotificationRing,
    pub revenue: f64,
    pub total_votes: u64,
    /// Most recent request the DJ put on air
    pub current_request: Option<Uuid>,
    /// Operator-visible ranked pending ids, refreshed by the resort sweep
    pub upcoming: Vec<Uuid>,
    pub metrics: SessionMetrics,
}

impl SessionState {
    pub fn new(config: &SessionConfig, settings: VotingSettings, notification_cap: usize) -> Self {
        let started_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_name: config.event_name.clone(),
            dj_id: config.dj_id.clone(),
            dj_name: config.dj_name.clone(),
            venue: config.venue.clone(),
            started_at,
            ends_at: config.duration.map(|m| started_at + Duration::minutes(m)),
            duration_minutes: config.duration,
            active: true,
            settings,
            requests: Vec::new(),
            listeners: HashMap::new(),
            transactions: Vec::new(),
            notifications: NotificationRing::new(notification_cap),
            revenue: 0.0,
            total_votes: 0,
            current_request: None,
            upcoming: Vec::new(),
            metrics: SessionMetrics {
                revenue_per_hour: 0.0,
                revenue_per_listener: 0.0,
                updated_at: started_at,
            },
        }
    }

    /// Reject mutation once the session has ended
    pub fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(Error::SessionInactive(self.id))
        }
    }

    pub fn listener(&self, id: Uuid) -> Result<&Listener> {
        self.listeners.get(&id).ok_or(Error::ListenerNotFound(id))
    }

    pub fn listener_mut(&mut self, id: Uuid) -> Result<&mut Listener> {
        self.listeners
            .get_mut(&id)
            .ok_or(Error::ListenerNotFound(id))
    }

    pub fn request_mut(&mut self, id: Uuid) -> Result<&mut SongRequest> {
        self.requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(Error::RequestNotFound(id))
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            total_requests: self.requests.len(),
            total_votes: self.total_votes,
            revenue: self.revenue,
            active_listeners: self.listeners.len(),
        }
    }

    pub fn descriptor(&self) -> SessionDescriptor {
        SessionDescriptor {
            event_name: self.event_name.clone(),
            dj_id: self.dj_id.clone(),
            dj_name: self.dj_name.clone(),
            venue: self.venue.clone(),
            duration: self.duration_minutes,
            settings: self.settings.clone(),
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            event_name: self.event_name.clone(),
            dj_name: self.dj_name.clone(),
            venue: self.venue.clone(),
            settings: self.settings.clone(),
        }
    }

    /// Resort the request list in place and refresh the upcoming view
    pub fn resort_and_refresh(&mut self, upcoming_limit: usize) {
        queue::sort_by_priority(&mut self.requests);
        self.upcoming = queue::upcoming_view(&self.requests, upcoming_limit);
    }

    /// Recompute derived revenue rates from wall-clock elapsed time.
    ///
    /// Pure derivation: reads revenue and listener count, writes only the
    /// metrics block.
    pub fn recompute_metrics(&mut self, now: DateTime<Utc>) {
        let elapsed_secs = (now - self.started_at).num_seconds();
        self.metrics.revenue_per_hour = if elapsed_secs > 0 {
            self.revenue * 3600.0 / elapsed_secs as f64
        } else {
            0.0
        };
        self.metrics.revenue_per_listener = if self.listeners.is_empty() {
            0.0
        } else {
            self.revenue / self.listeners.len() as f64
        };
        self.metrics.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> SessionState {
        let config = SessionConfig {
            event_name: "Test Night".to_string(),
            dj_id: "dj-1".to_string(),
            dj_name: "DJ Test".to_string(),
            venue: "Test Hall".to_string(),
            duration: Some(120),
            settings: None,
        };
        SessionState::new(&config, VotingSettings::default(), 50)
    }

    #[test]
    fn new_session_is_active_with_end_time() {
        let s = session();
        assert!(s.active);
        assert_eq!(s.ends_at, Some(s.started_at + Duration::minutes(120)));
        assert!(s.ensure_active().is_ok());
    }

    #[test]
    fn inactive_session_rejects_mutation() {
        let mut s = session();
        s.active = false;
        assert!(matches!(s.ensure_active(), Err(Error::SessionInactive(_))));
    }

    #[test]
    fn metrics_derive_from_elapsed_time_and_listeners() {
        let mut s = session();
        s.revenue = 90.0;
        s.listeners
            .insert(Uuid::new_v4(), Listener::new("a".to_string(), 50.0, Vec::new()));
        s.listeners
            .insert(Uuid::new_v4(), Listener::new("b".to_string(), 50.0, Vec::new()));

        let now = s.started_at + Duration::minutes(30);
        s.recompute_metrics(now);
        assert_eq!(s.metrics.revenue_per_hour, 180.0);
        assert_eq!(s.metrics.revenue_per_listener, 45.0);
        assert_eq!(s.metrics.updated_at, now);
    }

    #[test]
    fn metrics_are_zero_at_session_start() {
        let mut s = session();
        s.revenue = 10.0;
        let start = s.started_at;
        s.recompute_metrics(start);
        assert_eq!(s.metrics.revenue_per_hour, 0.0);
        assert_eq!(s.metrics.revenue_per_listener, 0.0);
    }
}
