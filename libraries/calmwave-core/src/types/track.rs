/// Track domain types
use crate::types::PlaylistId;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track belonging to exactly one playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Track title (`nome_musica`)
    pub name: String,

    /// Artist name (`artista`)
    pub artist: String,

    /// Length, stored as a time of day (`duracao`)
    pub duration: NaiveTime,

    /// Release year (`ano`)
    pub year: i32,

    /// Owning playlist (`playlist`)
    pub playlist_id: PlaylistId,
}

impl Track {
    /// Length as elapsed time
    pub fn length(&self) -> Duration {
        time_of_day_to_duration(self.duration)
    }
}

/// Payload for adding a track to a playlist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTrack {
    /// Track title
    pub name: String,
    /// Artist name
    pub artist: String,
    /// Length as a time of day
    pub duration: NaiveTime,
    /// Release year
    pub year: i32,
    /// Playlist the track is added to
    pub playlist_id: PlaylistId,
}

impl NewTrack {
    /// Build a track payload
    pub fn new(
        name: impl Into<String>,
        artist: impl Into<String>,
        duration: NaiveTime,
        year: i32,
        playlist_id: PlaylistId,
    ) -> Self {
        Self {
            name: name.into(),
            artist: artist.into(),
            duration,
            year,
            playlist_id,
        }
    }
}

/// Convert a time-of-day duration column into elapsed time
pub fn time_of_day_to_duration(time: NaiveTime) -> Duration {
    Duration::from_secs(u64::from(time.num_seconds_from_midnight()))
        + Duration::from_nanos(u64::from(time.nanosecond() % 1_000_000_000))
}

/// Convert elapsed time into the time-of-day representation storage expects.
///
/// Returns `None` for lengths of a day or more, which the column cannot hold.
pub fn duration_to_time_of_day(duration: Duration) -> Option<NaiveTime> {
    let secs = u32::try_from(duration.as_secs()).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, duration.subsec_nanos())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_of_day_converts_to_elapsed() {
        let time = NaiveTime::from_hms_opt(0, 3, 30).unwrap();
        assert_eq!(time_of_day_to_duration(time), Duration::from_secs(210));
    }

    #[test]
    fn elapsed_converts_back_within_a_day() {
        let time = duration_to_time_of_day(Duration::from_secs(4 * 60 + 5)).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(0, 4, 5).unwrap());
        assert!(duration_to_time_of_day(Duration::from_secs(86_400)).is_none());
    }

    #[test]
    fn track_length_uses_duration_column() {
        let track = Track {
            name: "Intro".into(),
            artist: "Band".into(),
            duration: NaiveTime::from_hms_opt(0, 2, 15).unwrap(),
            year: 2020,
            playlist_id: PlaylistId::new(1),
        };
        assert_eq!(track.length(), Duration::from_secs(135));
    }
}
