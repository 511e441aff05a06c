//! Slider and label state for the track currently playing

use crate::error::{PlaybackError, Result};
use std::time::Duration;

/// Media backend driven by a [`PositionTracker`]
pub trait Player {
    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    /// Stop and rewind to the start
    fn stop(&mut self) -> Result<()>;

    /// Move the playhead to `position` from the start of the media
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Current playhead
    fn position(&self) -> Duration;

    /// Total length, `None` until the media is ready
    fn duration(&self) -> Option<Duration>;
}

/// Seek slider bound to a [`Player`].
///
/// The slider value is in seconds. While the user holds the slider, time updates from the
/// player are ignored so the thumb does not jump under the pointer.
#[derive(Debug)]
pub struct PositionTracker<P> {
    player: P,
    value: f64,
    max: f64,
    scrubbing: bool,
}

impl<P: Player> PositionTracker<P> {
    pub fn new(player: P) -> Self {
        Self {
            player,
            value: 0.0,
            max: 0.0,
            scrubbing: false,
        }
    }

    /// Media finished loading: size the slider to its duration
    pub fn on_ready(&mut self) -> Result<()> {
        let duration = self.player.duration().ok_or(PlaybackError::NoMedia)?;
        self.max = duration.as_secs_f64();
        self.value = self.value.min(self.max);

        tracing::debug!(duration_secs = self.max, "media ready");
        Ok(())
    }

    /// The player's clock moved
    pub fn on_time_changed(&mut self) {
        if self.scrubbing {
            return;
        }
        self.value = self.clamp(self.player.position().as_secs_f64());
    }

    /// Pointer pressed on the slider
    pub fn begin_scrub(&mut self) -> Result<()> {
        self.scrubbing = true;
        self.player.pause()
    }

    /// Pointer dragged; the value is kept within `[0, max]`
    pub fn scrub_to(&mut self, seconds: f64) -> Result<()> {
        if !seconds.is_finite() {
            return Err(PlaybackError::InvalidSeek(seconds));
        }
        self.value = self.clamp(seconds);
        Ok(())
    }

    /// Pointer released: seek to the slider value and resume
    pub fn end_scrub(&mut self) -> Result<()> {
        self.scrubbing = false;

        let target = Duration::from_secs_f64(self.value);
        tracing::debug!(target_secs = self.value, "seeking");

        self.player.seek(target)?;
        self.player.play()
    }

    pub fn stop(&mut self) -> Result<()> {
        self.player.stop()?;
        self.scrubbing = false;
        self.value = 0.0;
        Ok(())
    }

    /// `"MM:SS / MM:SS"` for the current position and the total length
    pub fn label(&self) -> String {
        let total = self.player.duration().unwrap_or_default();
        let current = if self.scrubbing {
            Duration::from_secs_f64(self.value)
        } else {
            self.player.position()
        };
        format!("{} / {}", format_time(current), format_time(total))
    }

    /// Slider position in seconds
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Slider upper bound in seconds; zero until `on_ready`
    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn into_inner(self) -> P {
        self.player
    }

    fn clamp(&self, seconds: f64) -> f64 {
        seconds.clamp(0.0, self.max)
    }
}

/// `MM:SS`. Minutes keep counting past 59, so a 75-minute mix reads `75:00`.
pub fn format_time(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}
