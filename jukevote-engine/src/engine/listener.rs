//! Per-listener state

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A participant in one voting session
///
/// A listener record belongs to exactly one session for its lifetime; its
/// wallet and usage counters are only mutated inside that session's
/// critical section.
#[derive(Debug, Clone)]
pub struct Listener {
    pub id: Uuid,
    pub name: String,
    /// Spendable balance; never driven below zero (validate-before-mutate)
    pub wallet_balance: f64,
    pub votes_used: u32,
    pub requests_submitted: u32,
    pub total_spent: f64,
    /// Free-form genre preferences supplied at join time
    pub preferences: Vec<String>,
    pub connected_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Listener {
    pub fn new(name: String, initial_balance: f64, preferences: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            wallet_balance: initial_balance,
            votes_used: 0,
            requests_submitted: 0,
            total_spent: 0.0,
            preferences,
            connected_at: now,
            last_activity: now,
        }
    }

    /// Record listener activity for the last-seen timestamp
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
