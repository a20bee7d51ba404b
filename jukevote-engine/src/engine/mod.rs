//! The voting engine
//!
//! `VotingEngine` is the session manager: it owns the session registry and
//! the listener index, validates every operation against session policy,
//! and routes mutations through one exclusive lock per session. Every
//! validate-then-mutate sequence runs entirely inside a single lock
//! acquisition, so no operation ever observes or leaves partial state.

pub mod ledger;
pub mod listener;
pub mod notify;
pub mod queue;
pub mod reconciler;
pub mod session;

use std::collections::HashMap;
use std::sync::Arc;

use jukevote_common::api::{
    ListenerData, PlaylistEntry, RequestData, SessionConfig, SessionDescriptor, SessionStats,
    SessionSummary,
};
use jukevote_common::config::EngineConfig;
use jukevote_common::model::{
    DjAction, DjNotification, NotificationKind, RequestKind, RequestStatus, TrackInfo,
    VotingSettings,
};
use jukevote_common::{Error, Result};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{BuiltinCatalog, CatalogLookup};
use listener::Listener;
use queue::SongRequest;
use reconciler::ReconcilerHandle;
use session::SessionState;

/// Results returned without an explicit limit in the message
const DEFAULT_SEARCH_LIMIT: usize = 20;

/// One registry entry: the session's lock plus its background sweeps
struct SessionHandle {
    state: Arc<Mutex<SessionState>>,
    reconciler: ReconcilerHandle,
}

/// Request-admission and prioritization engine for live voting events
pub struct VotingEngine {
    config: EngineConfig,
    catalog: Arc<dyn CatalogLookup>,
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
    /// Listener -> owning session; listeners are scoped to one session
    listener_index: RwLock<HashMap<Uuid, Uuid>>,
}

impl VotingEngine {
    pub fn new(config: EngineConfig, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self {
            config,
            catalog,
            sessions: RwLock::new(HashMap::new()),
            listener_index: RwLock::new(HashMap::new()),
        }
    }

    /// Engine backed by the built-in track table
    pub fn with_builtin_catalog(config: EngineConfig) -> Self {
        Self::new(config, Arc::new(BuiltinCatalog))
    }

    async fn session_arc(&self, session_id: Uuid) -> Result<Arc<Mutex<SessionState>>> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session_id)
            .map(|h| h.state.clone())
            .ok_or(Error::SessionNotFound(session_id))
    }

    /// Create a session with resolved settings and start its reconciler
    pub async fn create_session(
        &self,
        config: SessionConfig,
    ) -> Result<(Uuid, SessionDescriptor)> {
        let settings = VotingSettings::resolve(config.settings.as_ref())?;
        let state = SessionState::new(&config, settings, self.config.notification_cap);
        let session_id = state.id;
        let descriptor = state.descriptor();
        let state = Arc::new(Mutex::new(state));
        let reconciler = reconciler::spawn(session_id, state.clone(), &self.config);
        self.sessions
            .write()
            .await
            .insert(session_id, SessionHandle { state, reconciler });
        info!(
            "Created session {} ({} at {})",
            session_id, descriptor.event_name, descriptor.venue
        );
        Ok((session_id, descriptor))
    }

    /// Register a listener into an active session
    pub async fn join_listener(
        &self,
        session_id: Uuid,
        data: ListenerData,
    ) -> Result<(Uuid, SessionSummary)> {
        let state = self.session_arc(session_id).await?;
        let (listener_id, summary) = {
            let mut session = state.lock().await;
            session.ensure_active()?;
            let balance = data
                .initial_balance
                .unwrap_or(self.config.default_wallet_balance);
            if balance < 0.0 || !balance.is_finite() {
                return Err(Error::InvalidPaymentAmount(format!(
                    "initial balance must be non-negative, got {balance}"
                )));
            }
            let listener = Listener::new(data.name, balance, data.preferences.unwrap_or_default());
            let listener_id = listener.id;
            session.listeners.insert(listener_id, listener);
            (listener_id, session.summary())
        };
        self.listener_index
            .write()
            .await
            .insert(listener_id, session_id);
        debug!("Listener {} joined session {}", listener_id, session_id);
        Ok((listener_id, summary))
    }

    /// End a session: it becomes read-only and its sweeps are stopped
    pub async fn end_session(&self, session_id: Uuid) -> Result<()> {
        let sessions = self.sessions.read().await;
        let handle = sessions
            .get(&session_id)
            .ok_or(Error::SessionNotFound(session_id))?;
        {
            let mut session = handle.state.lock().await;
            session.ensure_active()?;
            session.active = false;
        }
        handle.reconciler.abort();
        info!("Ended session {}", session_id);
        Ok(())
    }

    /// Submit a paid or voted song request.
    ///
    /// Validation order is fixed: session active, listener exists, track
    /// resolves, session policy allows it, request cap, then payment
    /// checks. Nothing mutates until every check has passed; paid requests
    /// settle synchronously before the id is returned.
    pub async fn submit_request(&self, data: RequestData) -> Result<Uuid> {
        let state = self.session_arc(data.session_id).await?;
        let mut session = state.lock().await;
        session.ensure_active()?;

        let requester = session.listener(data.listener_id)?;
        let requests_submitted = requester.requests_submitted;
        let wallet_balance = requester.wallet_balance;
        let requester_name = requester.name.clone();

        let track = self
            .catalog
            .resolve(&data.track_id)
            .ok_or_else(|| Error::TrackNotFound(data.track_id.clone()))?;

        let settings = &session.settings;
        if !settings.allowed_genres.is_empty()
            && !settings
                .allowed_genres
                .iter()
                .any(|g| g.eq_ignore_ascii_case(&track.genre))
        {
            return Err(Error::PolicyRejected(format!(
                "genre \"{}\" is not allowed in this session",
                track.genre
            )));
        }
        if track.explicit && !settings.allow_explicit {
            return Err(Error::PolicyRejected(format!(
                "explicit track \"{}\" is not allowed in this session",
                track.title
            )));
        }
        if requests_submitted >= settings.max_requests_per_user {
            return Err(Error::RequestLimitExceeded(settings.max_requests_per_user));
        }

        let amount = match data.request_type {
            RequestKind::Paid => {
                if !settings.payment_enabled {
                    return Err(Error::InvalidPaymentAmount(
                        "paid requests are disabled for this session".to_string(),
                    ));
                }
                let amount = data.amount.ok_or_else(|| {
                    Error::InvalidPaymentAmount("amount is required for a paid request".to_string())
                })?;
                if !amount.is_finite()
                    || amount < settings.min_price
                    || amount > settings.max_price
                {
                    return Err(Error::InvalidPaymentAmount(format!(
                        "amount {} is outside the allowed range {}..{}",
                        amount, settings.min_price, settings.max_price
                    )));
                }
                if wallet_balance < amount {
                    return Err(Error::InsufficientFunds {
                        balance: wallet_balance,
                        required: amount,
                    });
                }
                Some(amount)
            }
            RequestKind::Voted => None,
        };

        // All checks passed; apply
        let request = SongRequest::new(track.clone(), data.listener_id, data.request_type, amount);
        let request_id = request.id;
        session.requests.push(request);
        {
            let requester = session.listener_mut(data.listener_id)?;
            requester.requests_submitted += 1;
            requester.touch();
        }
        if let Some(amount) = amount {
            ledger::settle(&mut session, data.listener_id, request_id, amount)?;
            session.notifications.push(
                NotificationKind::NewRequest,
                format!(
                    "{requester_name} paid {amount:.2} to request \"{}\"",
                    track.title
                ),
                Some(amount),
            );
        } else {
            session.notifications.push(
                NotificationKind::PopularVote,
                format!("{requester_name} opened voting for \"{}\"", track.title),
                None,
            );
        }
        debug!(
            "Request {} submitted to session {} ({:?})",
            request_id, data.session_id, data.request_type
        );
        Ok(request_id)
    }

    /// Cast one vote for a request.
    ///
    /// The voter-set check and the vote increment are a single step under
    /// the session lock, so concurrent votes from different listeners can
    /// never be lost or double-counted.
    pub async fn vote_for_song(
        &self,
        session_id: Uuid,
        listener_id: Uuid,
        request_id: Uuid,
    ) -> Result<()> {
        let state = self.session_arc(session_id).await?;
        let mut session = state.lock().await;
        session.ensure_active()?;

        let max_votes = session.settings.max_votes_per_user;
        let threshold = session.settings.auto_accept_threshold;
        let voter = session.listener(listener_id)?;
        if voter.votes_used >= max_votes {
            return Err(Error::VoteLimitExceeded(max_votes));
        }

        let request = session.request_mut(request_id)?;
        request.add_vote(listener_id)?;
        let votes = request.votes;
        let title = request.track.title.clone();

        {
            let voter = session.listener_mut(listener_id)?;
            voter.votes_used += 1;
            voter.touch();
        }
        session.total_votes += 1;

        // Advisory only: the request stays pending until an explicit DJ action
        if votes >= threshold {
            session.notifications.push(
                NotificationKind::PopularVote,
                format!("\"{title}\" reached {votes} votes and qualifies for auto-accept"),
                None,
            );
        }
        Ok(())
    }

    /// Apply a DJ queue action to one request
    pub async fn dj_action(
        &self,
        session_id: Uuid,
        action: DjAction,
        request_id: Uuid,
    ) -> Result<()> {
        let state = self.session_arc(session_id).await?;
        let mut session = state.lock().await;
        session.ensure_active()?;

        let request = session.request_mut(request_id)?;
        request.status = match action {
            DjAction::Play => RequestStatus::Playing,
            DjAction::Accept => RequestStatus::Pending,
            DjAction::Reject => RequestStatus::Rejected,
            DjAction::Complete => RequestStatus::Played,
        };
        if action == DjAction::Play {
            // Previous playing request, if any, stays as the operator left
            // it; only the current-track pointer moves
            session.current_request = Some(request_id);
        }
        debug!(
            "DJ action {:?} on request {} in session {}",
            action, request_id, session_id
        );
        Ok(())
    }

    /// Ranked playlist snapshot plus aggregate stats; works on ended
    /// sessions too since it reads without reordering
    pub async fn playlist(
        &self,
        session_id: Uuid,
    ) -> Result<(Vec<PlaylistEntry>, SessionStats)> {
        let state = self.session_arc(session_id).await?;
        let session = state.lock().await;
        Ok((
            queue::playlist_view(&session.requests, self.config.playlist_limit),
            session.stats(),
        ))
    }

    /// Search the catalog; limit defaults to 20
    pub fn search(
        &self,
        query: Option<&str>,
        genre: Option<&str>,
        limit: Option<usize>,
    ) -> Vec<TrackInfo> {
        self.catalog
            .search(query, genre, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
    }

    /// Credit a listener wallet; resolved through the listener index since
    /// the message carries no session id. Allowed after session end (see
    /// DESIGN.md), returns the new balance.
    pub async fn add_funds(&self, listener_id: Uuid, amount: f64) -> Result<f64> {
        let session_id = {
            let index = self.listener_index.read().await;
            index.get(&listener_id).copied()
        }
        .ok_or(Error::ListenerNotFound(listener_id))?;
        let state = self.session_arc(session_id).await?;
        let mut session = state.lock().await;
        ledger::add_funds(&mut session, listener_id, amount)
    }

    /// Snapshot of a session's notification ring, oldest first
    pub async fn notifications(&self, session_id: Uuid) -> Result<Vec<DjNotification>> {
        self.inspect_session(session_id, |s| s.notifications.to_vec())
            .await
    }

    /// Flag one notification as read by the operator client
    pub async fn mark_notification_read(
        &self,
        session_id: Uuid,
        notification_id: Uuid,
    ) -> Result<()> {
        let state = self.session_arc(session_id).await?;
        let mut session = state.lock().await;
        if session.notifications.mark_read(notification_id) {
            Ok(())
        } else {
            Err(Error::InvalidMessage(format!(
                "unknown notification: {notification_id}"
            )))
        }
    }

    /// Run a read-only closure against one session's state
    pub async fn inspect_session<R>(
        &self,
        session_id: Uuid,
        f: impl FnOnce(&SessionState) -> R,
    ) -> Result<R> {
        let state = self.session_arc(session_id).await?;
        let session = state.lock().await;
        Ok(f(&session))
    }
}
