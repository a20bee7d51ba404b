//! Common error types for jukevote
//!
//! Every variant is a per-request validation failure: handlers map them to
//! an `error` response and the connection stays open. Nothing here is
//! process-fatal.

use thiserror::Error;
use uuid::Uuid;

/// Common result type for jukevote operations
pub type Result<T> = std::result::Result<T, Error>;

/// Validation failures raised by the voting engine
#[derive(Error, Debug)]
pub enum Error {
    /// No session registered under this id
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    /// Session has ended; mutating calls are rejected
    #[error("Session has ended: {0}")]
    SessionInactive(Uuid),

    /// No listener registered under this id
    #[error("Listener not found: {0}")]
    ListenerNotFound(Uuid),

    /// Track id did not resolve against the catalog
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// No request with this id in the session
    #[error("Request not found: {0}")]
    RequestNotFound(Uuid),

    /// Listener hit the per-session request cap
    #[error("Request limit reached: {0} requests per listener")]
    RequestLimitExceeded(u32),

    /// Listener hit the per-session vote cap
    #[error("Vote limit reached: {0} votes per listener")]
    VoteLimitExceeded(u32),

    /// Listener already appears in the request's voter set
    #[error("Already voted for request {0}")]
    AlreadyVoted(Uuid),

    /// Paid amount missing, out of range, or payments disabled
    #[error("Invalid payment amount: {0}")]
    InvalidPaymentAmount(String),

    /// Wallet balance cannot cover the requested amount
    #[error("Insufficient funds: balance {balance:.2}, required {required:.2}")]
    InsufficientFunds { balance: f64, required: f64 },

    /// Track rejected by the session's genre/explicit policy
    #[error("Track not allowed by session policy: {0}")]
    PolicyRejected(String),

    /// Undecodable or ill-formed inbound message
    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
