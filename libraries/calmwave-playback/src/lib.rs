//! Calmwave Playback
//!
//! Keeps a seek slider and its `MM:SS / MM:SS` label in step with whatever is playing,
//! and manages the local folder of imported MP3 files.
//!
//! The media backend is supplied through the [`Player`] trait; this crate never decodes
//! audio itself.
//!
//! # Example
//!
//! ```rust
//! use calmwave_playback::{format_time, Player, PositionTracker, Result};
//! use std::time::Duration;
//!
//! struct Silence {
//!     position: Duration,
//! }
//!
//! impl Player for Silence {
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) -> Result<()> { Ok(()) }
//!     fn stop(&mut self) -> Result<()> { self.position = Duration::ZERO; Ok(()) }
//!     fn seek(&mut self, position: Duration) -> Result<()> { self.position = position; Ok(()) }
//!     fn position(&self) -> Duration { self.position }
//!     fn duration(&self) -> Option<Duration> { Some(Duration::from_secs(185)) }
//! }
//!
//! let mut tracker = PositionTracker::new(Silence { position: Duration::ZERO });
//! tracker.on_ready().unwrap();
//!
//! tracker.begin_scrub().unwrap();
//! tracker.scrub_to(62.0).unwrap();
//! tracker.end_scrub().unwrap();
//!
//! assert_eq!(tracker.label(), "01:02 / 03:05");
//! assert_eq!(format_time(Duration::from_secs(3725)), "62:05");
//! ```

pub mod error;
pub mod library;
pub mod position;

pub use error::{PlaybackError, Result};
pub use library::MusicLibrary;
pub use position::{format_time, Player, PositionTracker};
