//! # Jukevote Engine Library
//!
//! Request-admission and prioritization core for live song-request voting:
//! sessions, listeners, the priority-ranked request queue, wallet
//! settlement, DJ notifications, and the periodic reconciler, plus the
//! HTTP/WebSocket control surface.

pub mod api;
pub mod catalog;
pub mod engine;

pub use engine::VotingEngine;
pub use jukevote_common::{Error, Result};
