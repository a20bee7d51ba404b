//! Core model types shared between the engine and its clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Per-session voting policy
///
/// Resolved from a partial [`SettingsOverride`] at session creation;
/// unspecified fields take the documented defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingSettings {
    /// Whether paid requests are accepted at all
    pub payment_enabled: bool,
    /// Minimum accepted price for a paid request
    pub min_price: f64,
    /// Maximum accepted price for a paid request
    pub max_price: f64,
    /// Carried in the session config but not consumed by the priority
    /// computation (see DESIGN.md); kept for wire compatibility
    pub vote_weight: f64,
    /// Votes each listener may cast in this session
    pub max_votes_per_user: u32,
    /// Requests each listener may submit in this session
    pub max_requests_per_user: u32,
    /// Genres accepted for requests; empty means all genres
    pub allowed_genres: Vec<String>,
    /// Whether explicit tracks may be requested
    pub allow_explicit: bool,
    /// Vote count at which a request is flagged for auto-acceptance
    /// (advisory notification only, the DJ still confirms)
    pub auto_accept_threshold: u32,
}

impl Default for VotingSettings {
    fn default() -> Self {
        Self {
            payment_enabled: true,
            min_price: 5.0,
            max_price: 100.0,
            vote_weight: 0.3,
            max_votes_per_user: 5,
            max_requests_per_user: 3,
            allowed_genres: Vec::new(),
            allow_explicit: true,
            auto_accept_threshold: 20,
        }
    }
}

impl VotingSettings {
    /// Resolve final settings from an optional partial override.
    ///
    /// Rejects overrides that violate the settings invariants
    /// (min price above max price, negative prices or weight).
    pub fn resolve(overrides: Option<&SettingsOverride>) -> Result<Self> {
        let mut settings = Self::default();
        if let Some(o) = overrides {
            if let Some(v) = o.payment_enabled {
                settings.payment_enabled = v;
            }
            if let Some(v) = o.min_price {
                settings.min_price = v;
            }
            if let Some(v) = o.max_price {
                settings.max_price = v;
            }
            if let Some(v) = o.vote_weight {
                settings.vote_weight = v;
            }
            if let Some(v) = o.max_votes_per_user {
                settings.max_votes_per_user = v;
            }
            if let Some(v) = o.max_requests_per_user {
                settings.max_requests_per_user = v;
            }
            if let Some(ref v) = o.allowed_genres {
                settings.allowed_genres = v.clone();
            }
            if let Some(v) = o.allow_explicit {
                settings.allow_explicit = v;
            }
            if let Some(v) = o.auto_accept_threshold {
                settings.auto_accept_threshold = v;
            }
        }
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.min_price < 0.0 || self.max_price < 0.0 {
            return Err(Error::InvalidMessage(
                "settings: prices must be non-negative".to_string(),
            ));
        }
        if self.min_price > self.max_price {
            return Err(Error::InvalidMessage(format!(
                "settings: minPrice {} exceeds maxPrice {}",
                self.min_price, self.max_price
            )));
        }
        if self.vote_weight < 0.0 {
            return Err(Error::InvalidMessage(
                "settings: voteWeight must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Partial settings carried in the `create_session` message
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsOverride {
    pub payment_enabled: Option<bool>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub vote_weight: Option<f64>,
    pub max_votes_per_user: Option<u32>,
    pub max_requests_per_user: Option<u32>,
    pub allowed_genres: Option<Vec<String>>,
    pub allow_explicit: Option<bool>,
    pub auto_accept_threshold: Option<u32>,
}

/// Resolved track metadata snapshot from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub track_id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_secs: u32,
    pub genre: String,
    pub explicit: bool,
}

/// How a song request was backed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    /// Backed by a wallet payment
    Paid,
    /// Backed by listener votes only
    Voted,
}

/// Request lifecycle status
///
/// `Pending -> Playing -> Played` or `Pending -> Rejected`; the DJ `accept`
/// action resets any request to `Pending` (un-reject).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Playing,
    Played,
    Rejected,
}

/// DJ queue actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DjAction {
    Play,
    Accept,
    Reject,
    Complete,
}

/// Notification categories surfaced to the DJ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new paid request arrived
    NewRequest,
    /// A vote-driven event: new voted request or auto-accept threshold
    PopularVote,
}

/// One entry in a session's DJ notification ring
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DjNotification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub message: String,
    pub amount: Option<f64>,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
}
