//! Calmwave Core
//!
//! Domain records, identifiers and error handling shared by every Calmwave crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `User`, `Playlist`, `Track` and their creation payloads
//! - **Outcomes**: `Outcome` separates "nothing matched" from success for writes
//! - **Error Handling**: Unified `CatalogError` and `Result` types
//! - **Secrets**: `Secret` keeps credentials out of logs and debug output
//!
//! # Example
//!
//! ```rust
//! use calmwave_core::types::{NewTrack, NewUser, PlaylistId};
//! use calmwave_core::Secret;
//! use chrono::NaiveTime;
//!
//! let user = NewUser::new("alice", "Alice Doe", "555-0100", "alice@example.com")
//!     .with_credential(Secret::new("hunter2"));
//! assert_eq!(format!("{:?}", user.credential), "Secret(***)");
//!
//! let duration = NaiveTime::from_hms_opt(0, 3, 30).unwrap();
//! let track = NewTrack::new("Intro", "Band", duration, 2021, PlaylistId::new(1));
//! assert_eq!(track.year, 2021);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod outcome;
pub mod secret;
/// Domain records and identifiers
pub mod types;

pub use error::{CatalogError, Result};
pub use outcome::Outcome;
pub use secret::Secret;

pub use types::{NewTrack, NewUser, Playlist, PlaylistId, Track, User, UserId};
