/// Playlist domain type
use crate::types::PlaylistId;
use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Playlist with its display aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playlist {
    /// Storage-assigned identifier
    pub id: PlaylistId,

    /// Playlist name (not unique)
    pub name: String,

    /// Number of tracks, as maintained by storage
    pub track_count: i64,

    /// Sum of track durations, as maintained by storage.
    ///
    /// Stored as a time of day, so totals of 24 hours or more wrap around.
    pub total_duration: NaiveTime,

    /// Set once when the playlist is created
    pub created_at: NaiveDateTime,
}

impl Playlist {
    /// No tracks yet
    pub fn is_empty(&self) -> bool {
        self.track_count == 0
    }
}
