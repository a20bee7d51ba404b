//! Message dispatch
//!
//! Maps each decoded [`Inbound`] message onto one engine call and wraps
//! the outcome in the matching [`Outbound`] shape. Every failure, including
//! an undecodable envelope, becomes the `error` reply; nothing here closes
//! the connection.

use jukevote_common::api::{Inbound, Outbound};
use jukevote_common::{Error, Result};

use crate::engine::VotingEngine;

/// Decode one text frame and dispatch it
pub async fn dispatch_text(engine: &VotingEngine, text: &str) -> Outbound {
    match serde_json::from_str::<Inbound>(text) {
        Ok(msg) => dispatch(engine, msg).await,
        Err(e) => Outbound::from_error(&Error::InvalidMessage(e.to_string())),
    }
}

/// Dispatch a decoded message, turning engine errors into the error reply
pub async fn dispatch(engine: &VotingEngine, msg: Inbound) -> Outbound {
    match handle(engine, msg).await {
        Ok(reply) => reply,
        Err(e) => Outbound::from_error(&e),
    }
}

async fn handle(engine: &VotingEngine, msg: Inbound) -> Result<Outbound> {
    match msg {
        Inbound::CreateSession { config } => {
            let (session_id, config) = engine.create_session(config).await?;
            Ok(Outbound::SessionCreated { session_id, config })
        }
        Inbound::JoinListener {
            session_id,
            listener_data,
        } => {
            let (listener_id, session) = engine.join_listener(session_id, listener_data).await?;
            Ok(Outbound::ListenerJoined {
                listener_id,
                session,
            })
        }
        Inbound::SubmitRequest { request } => {
            let request_id = engine.submit_request(request).await?;
            Ok(Outbound::RequestSubmitted { request_id })
        }
        Inbound::VoteSong {
            session_id,
            listener_id,
            request_id,
        } => {
            engine
                .vote_for_song(session_id, listener_id, request_id)
                .await?;
            Ok(Outbound::VoteRecorded { request_id })
        }
        Inbound::GetPlaylist { session_id } => {
            let (playlist, stats) = engine.playlist(session_id).await?;
            Ok(Outbound::PlaylistData { playlist, stats })
        }
        Inbound::DjAction {
            session_id,
            action,
            request_id,
        } => {
            engine.dj_action(session_id, action, request_id).await?;
            Ok(Outbound::DjActionCompleted { action, request_id })
        }
        Inbound::SearchMusic {
            query,
            genre,
            limit,
        } => {
            let results = engine.search(query.as_deref(), genre.as_deref(), limit);
            Ok(Outbound::SearchResults { results, query })
        }
        Inbound::AddFunds {
            listener_id,
            amount,
        } => {
            let new_balance = engine.add_funds(listener_id, amount).await?;
            Ok(Outbound::FundsAdded {
                new_balance,
                amount,
            })
        }
        Inbound::EndSession { session_id } => {
            engine.end_session(session_id).await?;
            Ok(Outbound::SessionEnded { session_id })
        }
        Inbound::GetNotifications { session_id } => {
            let notifications = engine.notifications(session_id).await?;
            Ok(Outbound::NotificationsData { notifications })
        }
        Inbound::MarkNotificationRead {
            session_id,
            notification_id,
        } => {
            engine
                .mark_notification_read(session_id, notification_id)
                .await?;
            Ok(Outbound::NotificationMarked { notification_id })
        }
    }
}
