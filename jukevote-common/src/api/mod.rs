//! Wire protocol types for the jukevote engine

pub mod messages;

pub use messages::{
    Inbound, ListenerData, Outbound, PlaylistEntry, RequestData, SessionConfig,
    SessionDescriptor, SessionStats, SessionSummary,
};
