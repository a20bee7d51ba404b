//! End-to-end engine tests
//!
//! Exercises the full validate-then-mutate paths through `VotingEngine`,
//! including the fairness limits, payment settlement, ordering, and the
//! dispatch layer's error shape.

use std::sync::Arc;

use jukevote_common::api::{Inbound, ListenerData, Outbound, RequestData, SessionConfig};
use jukevote_common::config::EngineConfig;
use jukevote_common::model::{
    DjAction, NotificationKind, RequestKind, RequestStatus, SettingsOverride,
};
use jukevote_common::Error;
use jukevote_engine::api::dispatch;
use jukevote_engine::engine::{ledger, queue};
use jukevote_engine::VotingEngine;
use uuid::Uuid;

fn engine() -> VotingEngine {
    VotingEngine::with_builtin_catalog(EngineConfig::default())
}

fn session_config(settings: Option<SettingsOverride>) -> SessionConfig {
    SessionConfig {
        event_name: "Saturday Social".to_string(),
        dj_id: "dj-42".to_string(),
        dj_name: "DJ Test".to_string(),
        venue: "The Warehouse".to_string(),
        duration: Some(240),
        settings,
    }
}

async fn new_session(engine: &VotingEngine, settings: Option<SettingsOverride>) -> Uuid {
    let (session_id, _) = engine
        .create_session(session_config(settings))
        .await
        .expect("create session");
    session_id
}

async fn join(
    engine: &VotingEngine,
    session_id: Uuid,
    name: &str,
    balance: Option<f64>,
) -> Uuid {
    let (listener_id, _) = engine
        .join_listener(
            session_id,
            ListenerData {
                name: name.to_string(),
                initial_balance: balance,
                preferences: None,
            },
        )
        .await
        .expect("join listener");
    listener_id
}

fn paid(session_id: Uuid, listener_id: Uuid, track_id: &str, amount: f64) -> RequestData {
    RequestData {
        session_id,
        listener_id,
        track_id: track_id.to_string(),
        request_type: RequestKind::Paid,
        amount: Some(amount),
    }
}

fn voted(session_id: Uuid, listener_id: Uuid, track_id: &str) -> RequestData {
    RequestData {
        session_id,
        listener_id,
        track_id: track_id.to_string(),
        request_type: RequestKind::Voted,
        amount: None,
    }
}

async fn status_of(engine: &VotingEngine, session_id: Uuid, request_id: Uuid) -> RequestStatus {
    engine
        .inspect_session(session_id, |s| {
            s.requests.iter().find(|r| r.id == request_id).unwrap().status
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn paid_request_settles_wallet_and_revenue() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let listener_id = join(&engine, session_id, "alice", Some(50.0)).await;

    let request_id = engine
        .submit_request(paid(session_id, listener_id, "trk-001", 20.0))
        .await
        .unwrap();

    let (wallet, revenue, total_spent) = engine
        .inspect_session(session_id, |s| {
            let l = &s.listeners[&listener_id];
            (l.wallet_balance, s.revenue, l.total_spent)
        })
        .await
        .unwrap();
    assert_eq!(wallet, 30.0);
    assert_eq!(revenue, 20.0);
    assert_eq!(total_spent, 20.0);

    let (playlist, stats) = engine.playlist(session_id).await.unwrap();
    assert_eq!(playlist.len(), 1);
    assert_eq!(playlist[0].request_id, request_id);
    assert_eq!(playlist[0].priority, 200.0);
    assert_eq!(playlist[0].votes, 0);
    assert_eq!(stats.revenue, 20.0);
    assert_eq!(stats.total_requests, 1);

    // A paid request announces itself to the DJ
    let notifications = engine.notifications(session_id).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, NotificationKind::NewRequest);
    assert_eq!(notifications[0].amount, Some(20.0));
}

#[tokio::test]
async fn second_vote_raises_voted_priority() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let bob = join(&engine, session_id, "bob", None).await;

    let request_id = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();
    engine
        .vote_for_song(session_id, bob, request_id)
        .await
        .unwrap();

    let (playlist, stats) = engine.playlist(session_id).await.unwrap();
    assert_eq!(playlist[0].votes, 2);
    assert_eq!(playlist[0].priority, 10.0);
    assert_eq!(stats.total_votes, 1);
}

#[tokio::test]
async fn request_limit_blocks_without_side_effects() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;

    for track in ["trk-001", "trk-002", "trk-004"] {
        engine
            .submit_request(voted(session_id, alice, track))
            .await
            .unwrap();
    }
    let err = engine
        .submit_request(voted(session_id, alice, "trk-005"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequestLimitExceeded(3)));

    engine
        .inspect_session(session_id, |s| {
            assert_eq!(s.requests.len(), 3);
            assert_eq!(s.listeners[&alice].requests_submitted, 3);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_vote_is_rejected_and_counts_hold() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let bob = join(&engine, session_id, "bob", None).await;

    let request_id = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();
    engine
        .vote_for_song(session_id, bob, request_id)
        .await
        .unwrap();
    let err = engine
        .vote_for_song(session_id, bob, request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyVoted(_)));

    engine
        .inspect_session(session_id, |s| {
            let request = s.requests.iter().find(|r| r.id == request_id).unwrap();
            assert_eq!(request.votes, 2);
            assert_eq!(request.voters.len(), 2);
            assert_eq!(s.listeners[&bob].votes_used, 1);
            assert_eq!(s.total_votes, 1);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn vote_limit_is_enforced() {
    let settings = SettingsOverride {
        max_votes_per_user: Some(1),
        ..Default::default()
    };
    let engine = engine();
    let session_id = new_session(&engine, Some(settings)).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let bob = join(&engine, session_id, "bob", None).await;

    let first = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();
    let second = engine
        .submit_request(voted(session_id, alice, "trk-004"))
        .await
        .unwrap();

    engine.vote_for_song(session_id, bob, first).await.unwrap();
    let err = engine
        .vote_for_song(session_id, bob, second)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::VoteLimitExceeded(1)));
}

#[tokio::test]
async fn auto_accept_threshold_is_advisory_only() {
    let settings = SettingsOverride {
        auto_accept_threshold: Some(3),
        ..Default::default()
    };
    let engine = engine();
    let session_id = new_session(&engine, Some(settings)).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let bob = join(&engine, session_id, "bob", None).await;
    let cara = join(&engine, session_id, "cara", None).await;

    let request_id = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();
    engine
        .vote_for_song(session_id, bob, request_id)
        .await
        .unwrap();
    engine
        .vote_for_song(session_id, cara, request_id)
        .await
        .unwrap();

    let notifications = engine.notifications(session_id).await.unwrap();
    let advisory = notifications
        .iter()
        .find(|n| n.message.contains("auto-accept"))
        .expect("threshold notification should exist");
    assert_eq!(advisory.kind, NotificationKind::PopularVote);

    // The request still needs an explicit DJ action
    engine
        .inspect_session(session_id, |s| {
            let request = s.requests.iter().find(|r| r.id == request_id).unwrap();
            assert_eq!(request.status, RequestStatus::Pending);
        })
        .await
        .unwrap();

    engine
        .dj_action(session_id, DjAction::Accept, request_id)
        .await
        .unwrap();
    engine
        .inspect_session(session_id, |s| {
            let request = s.requests.iter().find(|r| r.id == request_id).unwrap();
            assert_eq!(request.status, RequestStatus::Pending);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn play_leaves_previous_playing_request_untouched() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;

    let r1 = engine
        .submit_request(voted(session_id, alice, "trk-001"))
        .await
        .unwrap();
    let r2 = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();

    engine
        .dj_action(session_id, DjAction::Play, r2)
        .await
        .unwrap();
    engine
        .dj_action(session_id, DjAction::Play, r1)
        .await
        .unwrap();

    engine
        .inspect_session(session_id, |s| {
            let status_of = |id| s.requests.iter().find(|r| r.id == id).unwrap().status;
            assert_eq!(status_of(r1), RequestStatus::Playing);
            assert_eq!(status_of(r2), RequestStatus::Playing);
            assert_eq!(s.current_request, Some(r1));
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn dj_actions_drive_the_state_machine() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let request_id = engine
        .submit_request(voted(session_id, alice, "trk-001"))
        .await
        .unwrap();

    engine
        .dj_action(session_id, DjAction::Reject, request_id)
        .await
        .unwrap();
    assert_eq!(
        status_of(&engine, session_id, request_id).await,
        RequestStatus::Rejected
    );

    // accept un-rejects
    engine
        .dj_action(session_id, DjAction::Accept, request_id)
        .await
        .unwrap();
    assert_eq!(
        status_of(&engine, session_id, request_id).await,
        RequestStatus::Pending
    );

    engine
        .dj_action(session_id, DjAction::Play, request_id)
        .await
        .unwrap();
    assert_eq!(
        status_of(&engine, session_id, request_id).await,
        RequestStatus::Playing
    );

    engine
        .dj_action(session_id, DjAction::Complete, request_id)
        .await
        .unwrap();
    assert_eq!(
        status_of(&engine, session_id, request_id).await,
        RequestStatus::Played
    );

    let err = engine
        .dj_action(session_id, DjAction::Play, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::RequestNotFound(_)));
}

#[tokio::test]
async fn insufficient_funds_rejects_without_mutation() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", Some(10.0)).await;

    let err = engine
        .submit_request(paid(session_id, alice, "trk-001", 20.0))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientFunds {
            balance,
            required,
        } if balance == 10.0 && required == 20.0
    ));

    engine
        .inspect_session(session_id, |s| {
            assert_eq!(s.listeners[&alice].wallet_balance, 10.0);
            assert_eq!(s.listeners[&alice].requests_submitted, 0);
            assert!(s.requests.is_empty());
            assert_eq!(s.revenue, 0.0);
            assert!(s.transactions.is_empty());
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn payment_amount_must_be_within_session_range() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", Some(500.0)).await;

    for amount in [3.0, 200.0] {
        let err = engine
            .submit_request(paid(session_id, alice, "trk-001", amount))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPaymentAmount(_)));
    }
}

#[tokio::test]
async fn disabled_payments_reject_paid_requests() {
    let settings = SettingsOverride {
        payment_enabled: Some(false),
        ..Default::default()
    };
    let engine = engine();
    let session_id = new_session(&engine, Some(settings)).await;
    let alice = join(&engine, session_id, "alice", None).await;

    let err = engine
        .submit_request(paid(session_id, alice, "trk-001", 20.0))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPaymentAmount(_)));

    // Voted requests still work
    engine
        .submit_request(voted(session_id, alice, "trk-001"))
        .await
        .unwrap();
}

#[tokio::test]
async fn session_policy_filters_genre_and_explicit() {
    let settings = SettingsOverride {
        allowed_genres: Some(vec!["jazz".to_string()]),
        ..Default::default()
    };
    let engine = engine();
    let session_id = new_session(&engine, Some(settings)).await;
    let alice = join(&engine, session_id, "alice", None).await;

    // trk-001 is electronic
    let err = engine
        .submit_request(voted(session_id, alice, "trk-001"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PolicyRejected(_)));

    // trk-004 is jazz
    engine
        .submit_request(voted(session_id, alice, "trk-004"))
        .await
        .unwrap();

    let strict = SettingsOverride {
        allow_explicit: Some(false),
        ..Default::default()
    };
    let clean_session = new_session(&engine, Some(strict)).await;
    let bob = join(&engine, clean_session, "bob", None).await;
    // trk-003 is flagged explicit
    let err = engine
        .submit_request(voted(clean_session, bob, "trk-003"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::PolicyRejected(_)));
}

#[tokio::test]
async fn ended_session_rejects_mutation_but_stays_readable() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let request_id = engine
        .submit_request(voted(session_id, alice, "trk-001"))
        .await
        .unwrap();

    engine.end_session(session_id).await.unwrap();

    assert!(matches!(
        engine
            .submit_request(voted(session_id, alice, "trk-002"))
            .await,
        Err(Error::SessionInactive(_))
    ));
    assert!(matches!(
        engine.vote_for_song(session_id, alice, request_id).await,
        Err(Error::SessionInactive(_))
    ));
    assert!(matches!(
        engine
            .join_listener(
                session_id,
                ListenerData {
                    name: "late".to_string(),
                    initial_balance: None,
                    preferences: None,
                }
            )
            .await,
        Err(Error::SessionInactive(_))
    ));
    assert!(matches!(
        engine.dj_action(session_id, DjAction::Play, request_id).await,
        Err(Error::SessionInactive(_))
    ));
    assert!(matches!(
        engine.end_session(session_id).await,
        Err(Error::SessionInactive(_))
    ));

    // Read paths still work on the frozen session
    let (playlist, stats) = engine.playlist(session_id).await.unwrap();
    assert_eq!(playlist.len(), 1);
    assert_eq!(stats.total_requests, 1);
}

#[tokio::test]
async fn concurrent_votes_are_not_lost() {
    let engine = Arc::new(engine());
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;
    let bob = join(&engine, session_id, "bob", None).await;
    let cara = join(&engine, session_id, "cara", None).await;

    let request_id = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();

    let e1 = engine.clone();
    let e2 = engine.clone();
    let (a, b) = tokio::join!(
        tokio::spawn(async move { e1.vote_for_song(session_id, bob, request_id).await }),
        tokio::spawn(async move { e2.vote_for_song(session_id, cara, request_id).await }),
    );
    a.unwrap().unwrap();
    b.unwrap().unwrap();

    engine
        .inspect_session(session_id, |s| {
            let request = s.requests.iter().find(|r| r.id == request_id).unwrap();
            assert_eq!(request.votes, 3);
            assert_eq!(request.voters.len(), 3);
            assert_eq!(s.total_votes, 2);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn add_funds_updates_balance_through_owning_session() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", Some(50.0)).await;

    let new_balance = engine.add_funds(alice, 25.0).await.unwrap();
    assert_eq!(new_balance, 75.0);

    assert!(matches!(
        engine.add_funds(Uuid::new_v4(), 25.0).await,
        Err(Error::ListenerNotFound(_))
    ));
    assert!(matches!(
        engine.add_funds(alice, -5.0).await,
        Err(Error::InvalidPaymentAmount(_))
    ));

    // Top-ups remain possible after the event ends
    engine.end_session(session_id).await.unwrap();
    assert_eq!(engine.add_funds(alice, 5.0).await.unwrap(), 80.0);
}

#[tokio::test]
async fn revenue_matches_completed_transactions() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", Some(100.0)).await;
    let bob = join(&engine, session_id, "bob", Some(100.0)).await;

    engine
        .submit_request(paid(session_id, alice, "trk-001", 20.0))
        .await
        .unwrap();
    engine
        .submit_request(paid(session_id, bob, "trk-004", 35.0))
        .await
        .unwrap();

    engine
        .inspect_session(session_id, |s| {
            assert_eq!(s.revenue, 55.0);
            assert_eq!(ledger::settled_total(s), s.revenue);
            assert_eq!(s.transactions.len(), 2);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn priority_is_recomputable_from_stored_fields() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", Some(100.0)).await;
    let bob = join(&engine, session_id, "bob", None).await;

    let p = engine
        .submit_request(paid(session_id, alice, "trk-001", 30.0))
        .await
        .unwrap();
    let v = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();
    engine.vote_for_song(session_id, bob, p).await.unwrap();
    engine.vote_for_song(session_id, bob, v).await.unwrap();

    engine
        .inspect_session(session_id, |s| {
            for request in &s.requests {
                assert_eq!(
                    request.priority,
                    queue::priority_for(request.kind, request.amount, request.votes)
                );
            }
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn resort_sweep_refreshes_upcoming_view() {
    let mut config = EngineConfig::default();
    config.resort_interval_secs = 1;
    let engine = VotingEngine::with_builtin_catalog(config);
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", Some(100.0)).await;

    let low = engine
        .submit_request(voted(session_id, alice, "trk-002"))
        .await
        .unwrap();
    let high = engine
        .submit_request(paid(session_id, alice, "trk-001", 50.0))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    engine
        .inspect_session(session_id, |s| {
            assert_eq!(s.upcoming, vec![high, low]);
            // The in-place resort put the paid request first
            assert_eq!(s.requests[0].id, high);
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn dispatch_maps_failures_to_error_replies() {
    let engine = engine();

    let reply = dispatch::dispatch_text(&engine, "{this is not json").await;
    assert!(matches!(reply, Outbound::Error { .. }));

    let reply = dispatch::dispatch(
        &engine,
        Inbound::GetPlaylist {
            session_id: Uuid::new_v4(),
        },
    )
    .await;
    let Outbound::Error { message } = reply else {
        panic!("expected an error reply");
    };
    assert!(message.contains("Session not found"));
}

#[tokio::test]
async fn dispatch_round_trip_happy_path() {
    let engine = engine();

    let reply = dispatch::dispatch(
        &engine,
        Inbound::CreateSession {
            config: session_config(None),
        },
    )
    .await;
    let Outbound::SessionCreated { session_id, config } = reply else {
        panic!("expected session_created");
    };
    assert_eq!(config.event_name, "Saturday Social");
    assert_eq!(config.settings.max_requests_per_user, 3);

    let reply = dispatch::dispatch(
        &engine,
        Inbound::SearchMusic {
            query: Some("midnight".to_string()),
            genre: None,
            limit: None,
        },
    )
    .await;
    let Outbound::SearchResults { results, query } = reply else {
        panic!("expected search_results");
    };
    assert_eq!(query.as_deref(), Some("midnight"));
    assert!(!results.is_empty());

    let reply = dispatch::dispatch(
        &engine,
        Inbound::EndSession { session_id },
    )
    .await;
    assert!(matches!(reply, Outbound::SessionEnded { session_id: id } if id == session_id));
}

#[tokio::test]
async fn unknown_track_and_listener_are_rejected() {
    let engine = engine();
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;

    assert!(matches!(
        engine
            .submit_request(voted(session_id, alice, "trk-999"))
            .await,
        Err(Error::TrackNotFound(_))
    ));
    assert!(matches!(
        engine
            .submit_request(voted(session_id, Uuid::new_v4(), "trk-001"))
            .await,
        Err(Error::ListenerNotFound(_))
    ));
    assert!(matches!(
        engine
            .submit_request(voted(Uuid::new_v4(), alice, "trk-001"))
            .await,
        Err(Error::SessionNotFound(_))
    ));
}

#[tokio::test]
async fn notifications_ring_caps_and_marks_read() {
    let mut config = EngineConfig::default();
    config.notification_cap = 2;
    let engine = VotingEngine::with_builtin_catalog(config);
    let session_id = new_session(&engine, None).await;
    let alice = join(&engine, session_id, "alice", None).await;

    for track in ["trk-001", "trk-002", "trk-004"] {
        engine
            .submit_request(voted(session_id, alice, track))
            .await
            .unwrap();
    }

    let notifications = engine.notifications(session_id).await.unwrap();
    assert_eq!(notifications.len(), 2);

    engine
        .mark_notification_read(session_id, notifications[0].id)
        .await
        .unwrap();
    let notifications = engine.notifications(session_id).await.unwrap();
    assert!(notifications[0].read);
    assert!(!notifications[1].read);
}
