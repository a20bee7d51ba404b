//! Inbound and outbound message types
//!
//! The transport delivers JSON text frames; each frame decodes to exactly one
//! [`Inbound`] variant and each reply encodes exactly one [`Outbound`]
//! variant. The `type` tag and camelCase payload field names are the
//! compatibility surface and must not change.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{
    DjAction, DjNotification, RequestKind, RequestStatus, SettingsOverride, TrackInfo,
    VotingSettings,
};

/// Session creation parameters carried by `create_session`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub event_name: String,
    pub dj_id: String,
    pub dj_name: String,
    pub venue: String,
    /// Planned session length in minutes; open-ended when absent
    pub duration: Option<i64>,
    pub settings: Option<SettingsOverride>,
}

/// Listener registration data carried by `join_listener`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerData {
    pub name: String,
    pub initial_balance: Option<f64>,
    pub preferences: Option<Vec<String>>,
}

/// Request submission data carried by `submit_request`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestData {
    pub session_id: Uuid,
    pub listener_id: Uuid,
    pub track_id: String,
    pub request_type: RequestKind,
    pub amount: Option<f64>,
}

/// All messages accepted from clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Inbound {
    CreateSession {
        config: SessionConfig,
    },
    JoinListener {
        session_id: Uuid,
        listener_data: ListenerData,
    },
    SubmitRequest {
        request: RequestData,
    },
    VoteSong {
        session_id: Uuid,
        listener_id: Uuid,
        request_id: Uuid,
    },
    GetPlaylist {
        session_id: Uuid,
    },
    DjAction {
        session_id: Uuid,
        action: DjAction,
        request_id: Uuid,
    },
    SearchMusic {
        query: Option<String>,
        genre: Option<String>,
        limit: Option<usize>,
    },
    AddFunds {
        listener_id: Uuid,
        amount: f64,
    },
    EndSession {
        session_id: Uuid,
    },
    GetNotifications {
        session_id: Uuid,
    },
    MarkNotificationRead {
        session_id: Uuid,
        notification_id: Uuid,
    },
}

/// Fully resolved session configuration echoed back on creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDescriptor {
    pub event_name: String,
    pub dj_id: String,
    pub dj_name: String,
    pub venue: String,
    pub duration: Option<i64>,
    pub settings: VotingSettings,
}

/// Session summary shown to a listener on join
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub event_name: String,
    pub dj_name: String,
    pub venue: String,
    pub settings: VotingSettings,
}

/// One ranked request in the `playlist_data` view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub request_id: Uuid,
    pub track: TrackInfo,
    pub requested_by: Uuid,
    pub request_type: RequestKind,
    pub amount: Option<f64>,
    pub votes: u32,
    pub priority: f64,
    pub status: RequestStatus,
    pub note: Option<String>,
}

/// Aggregate counters attached to `playlist_data`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_requests: usize,
    pub total_votes: u64,
    pub revenue: f64,
    pub active_listeners: usize,
}

/// All messages sent back to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Outbound {
    SessionCreated {
        session_id: Uuid,
        config: SessionDescriptor,
    },
    ListenerJoined {
        listener_id: Uuid,
        session: SessionSummary,
    },
    RequestSubmitted {
        request_id: Uuid,
    },
    VoteRecorded {
        request_id: Uuid,
    },
    PlaylistData {
        playlist: Vec<PlaylistEntry>,
        stats: SessionStats,
    },
    DjActionCompleted {
        action: DjAction,
        request_id: Uuid,
    },
    SearchResults {
        results: Vec<TrackInfo>,
        query: Option<String>,
    },
    FundsAdded {
        new_balance: f64,
        amount: f64,
    },
    SessionEnded {
        session_id: Uuid,
    },
    NotificationsData {
        notifications: Vec<DjNotification>,
    },
    NotificationMarked {
        notification_id: Uuid,
    },
    Error {
        message: String,
    },
}

impl Outbound {
    /// Build the error reply shape from any engine failure
    pub fn from_error(err: &crate::Error) -> Self {
        Outbound::Error {
            message: err.to_string(),
        }
    }
}
