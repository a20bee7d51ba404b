//! Track catalog lookup
//!
//! The real catalog is an external service; the engine only needs id
//! resolution and a small search surface, so the trait is the seam and the
//! built-in table stands in for the service.

use jukevote_common::model::TrackInfo;
use once_cell::sync::Lazy;

/// Read-only catalog interface consumed by the engine
pub trait CatalogLookup: Send + Sync {
    /// Resolve a track id to its metadata snapshot
    fn resolve(&self, track_id: &str) -> Option<TrackInfo>;

    /// Search by free-text query and/or genre, capped at `limit` results
    fn search(&self, query: Option<&str>, genre: Option<&str>, limit: usize) -> Vec<TrackInfo>;
}

/// In-memory catalog backed by a fixed track table
#[derive(Debug, Default)]
pub struct BuiltinCatalog;

macro_rules! track {
    ($id:expr, $title:expr, $artist:expr, $album:expr, $secs:expr, $genre:expr, $explicit:expr) => {
        TrackInfo {
            track_id: $id.to_string(),
            title: $title.to_string(),
            artist: $artist.to_string(),
            album: Some($album.to_string()),
            duration_secs: $secs,
            genre: $genre.to_string(),
            explicit: $explicit,
        }
    };
}

static TRACKS: Lazy<Vec<TrackInfo>> = Lazy::new(|| {
    vec![
        track!("trk-001", "Midnight Drive", "Neon Harbor", "City Lights", 214, "electronic", false),
        track!("trk-002", "Paper Planes Home", "The Marlowes", "Arrivals", 198, "pop", false),
        track!("trk-003", "Gasoline Heart", "Riot Verandah", "Static Bloom", 247, "rock", true),
        track!("trk-004", "Blue Hour", "Ida Falk Trio", "Northbound", 312, "jazz", false),
        track!("trk-005", "Switchback", "Mara Volt", "Vantablack", 203, "electronic", false),
        track!("trk-006", "No Ceiling", "Crownless", "Street Canon", 186, "hip-hop", true),
        track!("trk-007", "Sal y Limón", "Orquesta Brisa", "Puerto Abierto", 235, "latin", false),
        track!("trk-008", "Harvest Moon Run", "The Marlowes", "Arrivals", 221, "pop", false),
        track!("trk-009", "Copper Wire", "Riot Verandah", "Static Bloom", 264, "rock", false),
        track!("trk-010", "Afterglow Avenue", "Neon Harbor", "City Lights", 229, "electronic", false),
        track!("trk-011", "Double Take", "Crownless", "Street Canon", 194, "hip-hop", false),
        track!("trk-012", "Round Midnight Again", "Ida Falk Trio", "Northbound", 287, "jazz", false),
        track!("trk-013", "Last Ferry Out", "Mara Volt", "Vantablack", 256, "electronic", false),
        track!("trk-014", "Cumbia del Andén", "Orquesta Brisa", "Puerto Abierto", 242, "latin", false),
    ]
});

impl CatalogLookup for BuiltinCatalog {
    fn resolve(&self, track_id: &str) -> Option<TrackInfo> {
        TRACKS.iter().find(|t| t.track_id == track_id).cloned()
    }

    fn search(&self, query: Option<&str>, genre: Option<&str>, limit: usize) -> Vec<TrackInfo> {
        let query = query.map(str::to_lowercase);
        let genre = genre.map(str::to_lowercase);
        TRACKS
            .iter()
            .filter(|t| match &query {
                Some(q) => {
                    t.title.to_lowercase().contains(q) || t.artist.to_lowercase().contains(q)
                }
                None => true,
            })
            .filter(|t| match &genre {
                Some(g) => t.genre.eq_ignore_ascii_case(g),
                None => true,
            })
            .take(limit)
            .cloned()
            .collect()
    }
}
