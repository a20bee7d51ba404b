//! Song request queue and priority scheduling
//!
//! The priority values are the compatibility surface for queue ordering:
//! paid requests rank by `amount * 10 + votes * 2`, voted requests by
//! `votes * 5`. The session's `voteWeight` setting is deliberately not part
//! of the computation (see DESIGN.md).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jukevote_common::api::PlaylistEntry;
use jukevote_common::model::{RequestKind, RequestStatus, TrackInfo};
use jukevote_common::{Error, Result};
use uuid::Uuid;

/// A queued track nomination, paid or vote-driven
#[derive(Debug, Clone)]
pub struct SongRequest {
    pub id: Uuid,
    /// Catalog metadata snapshot taken at submission time
    pub track: TrackInfo,
    pub requested_by: Uuid,
    pub kind: RequestKind,
    pub amount: Option<f64>,
    /// Always equal to `voters.len()`; derived, never set independently
    pub votes: u32,
    pub voters: HashSet<Uuid>,
    pub priority: f64,
    pub created_at: DateTime<Utc>,
    pub status: RequestStatus,
    pub note: Option<String>,
}

impl SongRequest {
    /// Create a request in its initial state: a voted request starts with
    /// the submitter's own vote, a paid request starts unvoted.
    pub fn new(track: TrackInfo, requested_by: Uuid, kind: RequestKind, amount: Option<f64>) -> Self {
        let mut voters = HashSet::new();
        if kind == RequestKind::Voted {
            voters.insert(requested_by);
        }
        let votes = voters.len() as u32;
        Self {
            id: Uuid::new_v4(),
            track,
            requested_by,
            kind,
            amount,
            votes,
            voters,
            priority: priority_for(kind, amount, votes),
            created_at: Utc::now(),
            status: RequestStatus::Pending,
            note: None,
        }
    }

    /// Register one vote from `voter`.
    ///
    /// The duplicate check, the voter-set insert, the derived vote count,
    /// and the priority recomputation happen together so a request can
    /// never carry a vote count that disagrees with its voter set.
    pub fn add_vote(&mut self, voter: Uuid) -> Result<()> {
        if self.voters.contains(&voter) {
            return Err(Error::AlreadyVoted(self.id));
        }
        self.voters.insert(voter);
        self.votes = self.voters.len() as u32;
        self.priority = priority_for(self.kind, self.amount, self.votes);
        Ok(())
    }
}

/// The dual priority formula
///
/// Payment buys a baseline rank proportional to the amount; votes are a
/// secondary boost on paid entries and the sole driver for voted entries.
pub fn priority_for(kind: RequestKind, amount: Option<f64>, votes: u32) -> f64 {
    match kind {
        RequestKind::Paid => amount.unwrap_or(0.0) * 10.0 + f64::from(votes) * 2.0,
        RequestKind::Voted => f64::from(votes) * 5.0,
    }
}

/// Stable descending sort by priority.
///
/// Stability keeps equal-priority requests in insertion order so ties do
/// not flicker across repeated resorts.
pub fn sort_by_priority(requests: &mut [SongRequest]) {
    requests.sort_by(|a, b| b.priority.total_cmp(&a.priority));
}

/// Ids of the top `limit` pending requests, in ranked order.
///
/// Callers sort first; this only selects.
pub fn upcoming_view(requests: &[SongRequest], limit: usize) -> Vec<Uuid> {
    requests
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .take(limit)
        .map(|r| r.id)
        .collect()
}

/// Ranked snapshot of the top `limit` requests for the playlist response.
///
/// Works on a sorted copy so read paths never reorder session state.
pub fn playlist_view(requests: &[SongRequest], limit: usize) -> Vec<PlaylistEntry> {
    let mut ranked: Vec<&SongRequest> = requests.iter().collect();
    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));
    ranked
        .into_iter()
        .take(limit)
        .map(|r| PlaylistEntry {
            request_id: r.id,
            track: r.track.clone(),
            requested_by: r.requested_by,
            request_type: r.kind,
            amount: r.amount,
            votes: r.votes,
            priority: r.priority,
            status: r.status,
            note: r.note.clone(),
        })
        .collect()
}
