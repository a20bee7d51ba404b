//! Periodic per-session reconciliation sweeps
//!
//! Each session owns two independent interval tasks: a priority resort and
//! a metrics aggregation. Both are aborted when the session ends and also
//! exit on their own the first time they observe an inactive session, so
//! no background work outlives its session.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use jukevote_common::config::EngineConfig;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};
use uuid::Uuid;

use super::session::SessionState;

/// Handles to one session's background sweeps
#[derive(Debug)]
pub struct ReconcilerHandle {
    resort: JoinHandle<()>,
    metrics: JoinHandle<()>,
}

impl ReconcilerHandle {
    pub fn abort(&self) {
        self.resort.abort();
        self.metrics.abort();
    }
}

/// Spawn both sweeps for a freshly created session
pub fn spawn(
    session_id: Uuid,
    state: Arc<Mutex<SessionState>>,
    config: &EngineConfig,
) -> ReconcilerHandle {
    let upcoming_limit = config.upcoming_limit;
    let resort_state = state.clone();
    let resort_secs = config.resort_interval_secs;
    let resort = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(resort_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut session = resort_state.lock().await;
            if !session.active {
                break;
            }
            session.resort_and_refresh(upcoming_limit);
            trace!(
                "Resorted {} requests for session {}",
                session.requests.len(),
                session_id
            );
        }
        debug!("Resort sweep stopped for session {}", session_id);
    });

    let metrics_state = state.clone();
    let metrics_secs = config.metrics_interval_secs;
    let metrics = tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(metrics_secs));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let mut session = metrics_state.lock().await;
            if !session.active {
                break;
            }
            session.recompute_metrics(Utc::now());
            trace!(
                "Recomputed metrics for session {}: {:.2}/h",
                session_id,
                session.metrics.revenue_per_hour
            );
        }
        debug!("Metrics sweep stopped for session {}", session_id);
    });

    ReconcilerHandle { resort, metrics }
}
