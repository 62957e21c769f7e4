use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Surveillance settings, read once at startup from a JSON file.
///
/// Keys of the older configuration layout (`delta_thresh`, `min_area`,
/// `use_dropbox`, `use_twilio`, `dropbox_base_path`, `camera_warmup_time`)
/// are accepted as aliases.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub resolution: (u32, u32),
    pub fps: u32,
    #[serde(default, alias = "camera_warmup_time")]
    pub camera_warmup_seconds: f64,
    #[serde(alias = "delta_thresh")]
    pub delta_threshold: i64,
    #[serde(alias = "min_area")]
    pub min_area_pixels: i64,
    pub min_upload_seconds: i64,
    pub min_motion_frames: i64,
    #[serde(default)]
    pub show_video: bool,
    #[serde(default, alias = "use_dropbox")]
    pub use_dropbox_like_upload: bool,
    #[serde(default, alias = "use_twilio")]
    pub use_sms_alert: bool,
    #[serde(default, alias = "dropbox_base_path")]
    pub upload_base_path: String,

    /// Write uploads under this directory instead of the remote file API
    #[serde(default)]
    pub upload_local_dir: Option<PathBuf>,
    #[serde(default)]
    pub dropbox_access_token: Option<String>,
    #[serde(default)]
    pub sms_from: Option<String>,
    #[serde(default)]
    pub sms_to: Option<String>,
    #[serde(default = "default_alert_message")]
    pub alert_message: String,
    #[serde(default)]
    pub startup_message: Option<String>,

    #[serde(default = "default_process_width")]
    pub process_width: u32,
    #[serde(default = "default_blur_sigma")]
    pub blur_sigma: f32,
    #[serde(default = "default_dilate_iterations")]
    pub dilate_iterations: u8,
}

fn default_alert_message() -> String {
    "Motion detected".to_string()
}

fn default_process_width() -> u32 {
    500
}

// Matches a 21x21 Gaussian kernel
fn default_blur_sigma() -> f32 {
    3.5
}

fn default_dilate_iterations() -> u8 {
    2
}

/// Parameters for preprocessing and region extraction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionSettings {
    pub process_width: u32,
    pub blur_sigma: f32,
    pub delta_threshold: u8,
    pub min_area: u32,
    pub dilate_iterations: u8,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            process_width: default_process_width(),
            blur_sigma: default_blur_sigma(),
            delta_threshold: 25,
            min_area: 5000,
            dilate_iterations: default_dilate_iterations(),
        }
    }
}

/// Parameters for the alert debouncer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebounceSettings {
    pub min_upload: time::Duration,
    pub min_motion_frames: u32,
}

/// Which notification channel the config selects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    Upload,
    Sms,
    Disabled,
}

impl Config {
    /// Load and validate a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate a JSON document
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field once so the frame loop never has to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (width, height) = self.resolution;
        if width == 0 || height == 0 {
            return Err(ConfigError::invalid(
                "resolution",
                format!("{}x{} has a zero dimension", width, height),
            ));
        }
        if self.fps == 0 {
            return Err(ConfigError::invalid("fps", "must be positive"));
        }
        self.camera_warmup()?;
        self.detection_settings()?;
        self.debounce_settings()?;
        self.sink_kind()?;
        Ok(())
    }

    pub fn detection_settings(&self) -> Result<DetectionSettings, ConfigError> {
        let delta_threshold = u8::try_from(self.delta_threshold).map_err(|_| {
            ConfigError::invalid(
                "delta_threshold",
                format!("{} is outside 0-255", self.delta_threshold),
            )
        })?;
        let min_area = u32::try_from(self.min_area_pixels).map_err(|_| {
            ConfigError::invalid(
                "min_area_pixels",
                format!("{} is not a valid pixel count", self.min_area_pixels),
            )
        })?;
        if self.process_width == 0 {
            return Err(ConfigError::invalid("process_width", "must be positive"));
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(ConfigError::invalid("blur_sigma", "must be positive"));
        }

        Ok(DetectionSettings {
            process_width: self.process_width,
            blur_sigma: self.blur_sigma,
            delta_threshold,
            min_area,
            dilate_iterations: self.dilate_iterations,
        })
    }

    pub fn debounce_settings(&self) -> Result<DebounceSettings, ConfigError> {
        if self.min_upload_seconds < 0 {
            return Err(ConfigError::invalid(
                "min_upload_seconds",
                format!("{} is negative", self.min_upload_seconds),
            ));
        }
        let min_motion_frames = u32::try_from(self.min_motion_frames)
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "min_motion_frames",
                    format!("{} must be at least 1", self.min_motion_frames),
                )
            })?;

        Ok(DebounceSettings {
            min_upload: time::Duration::seconds(self.min_upload_seconds),
            min_motion_frames,
        })
    }

    /// Resolve the boolean sink flags into a single choice.
    pub fn sink_kind(&self) -> Result<SinkKind, ConfigError> {
        match (self.use_dropbox_like_upload, self.use_sms_alert) {
            (true, true) => Err(ConfigError::ConflictingSinks),
            (true, false) => Ok(SinkKind::Upload),
            (false, true) => {
                if self.sms_from.is_none() {
                    return Err(ConfigError::Missing("sms_from"));
                }
                if self.sms_to.is_none() {
                    return Err(ConfigError::Missing("sms_to"));
                }
                Ok(SinkKind::Sms)
            }
            (false, false) => Ok(SinkKind::Disabled),
        }
    }

    /// Pause before the first frame; rejects negative, non-finite and overflowing values
    pub fn camera_warmup(&self) -> Result<std::time::Duration, ConfigError> {
        std::time::Duration::try_from_secs_f64(self.camera_warmup_seconds).map_err(|_| {
            ConfigError::invalid(
                "camera_warmup_seconds",
                format!("{} is not a usable number of seconds", self.camera_warmup_seconds),
            )
        })
    }

    /// Interval between frames at the configured frame rate
    pub fn frame_interval(&self) -> time::Duration {
        time::Duration::seconds_f64(1.0 / self.fps as f64)
    }
}
