//! Turns per-frame occupancy verdicts into rate-limited alerts.
//!
//! Two gates apply: a cooldown of `min_upload` after the last alert, during
//! which occupied frames are not even counted, and a confirmation count of
//! consecutive occupied frames once the cooldown has elapsed.

use time::OffsetDateTime;
use tracing::{debug, info};

use crate::config::DebounceSettings;
use crate::models::OccupancyVerdict;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebouncePhase {
    /// No alert is holding back new ones
    Idle,
    /// Within `min_upload` of the last alert
    Cooling,
}

#[derive(Debug, Clone)]
pub struct AlertDebouncer {
    settings: DebounceSettings,
    consecutive_motion_frames: u32,
    last_alert: Option<OffsetDateTime>,
}

impl AlertDebouncer {
    pub fn new(settings: DebounceSettings) -> Self {
        Self {
            settings,
            consecutive_motion_frames: 0,
            last_alert: None,
        }
    }

    pub fn consecutive_motion_frames(&self) -> u32 {
        self.consecutive_motion_frames
    }

    pub fn last_alert(&self) -> Option<OffsetDateTime> {
        self.last_alert
    }

    pub fn phase(&self, now: OffsetDateTime) -> DebouncePhase {
        if self.is_cooling(now) {
            DebouncePhase::Cooling
        } else {
            DebouncePhase::Idle
        }
    }

    fn is_cooling(&self, now: OffsetDateTime) -> bool {
        self.last_alert
            .is_some_and(|last| now - last < self.settings.min_upload)
    }

    /// Feed one verdict. Returns true when an alert should fire for this frame.
    pub fn step(&mut self, verdict: OccupancyVerdict, timestamp: OffsetDateTime) -> bool {
        if !verdict.is_occupied() {
            if self.consecutive_motion_frames > 0 {
                debug!(
                    "Motion streak of {} frame(s) broken",
                    self.consecutive_motion_frames
                );
            }
            self.consecutive_motion_frames = 0;
            return false;
        }

        if self.is_cooling(timestamp) {
            return false;
        }

        self.consecutive_motion_frames += 1;
        if self.consecutive_motion_frames < self.settings.min_motion_frames {
            debug!(
                "Motion frame {}/{}",
                self.consecutive_motion_frames, self.settings.min_motion_frames
            );
            return false;
        }

        info!(
            "Sustained motion over {} frame(s), raising alert",
            self.consecutive_motion_frames
        );
        self.last_alert = Some(timestamp);
        self.consecutive_motion_frames = 0;
        true
    }
}
