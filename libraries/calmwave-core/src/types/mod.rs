mod ids;
mod playlist;
mod track;
mod user;

pub use ids::{PlaylistId, UserId};
pub use playlist::Playlist;
pub use track::{duration_to_time_of_day, time_of_day_to_duration, NewTrack, Track};
pub use user::{NewUser, User};
