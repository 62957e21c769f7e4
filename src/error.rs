use std::path::PathBuf;

use thiserror::Error;

/// Invalid or missing configuration. Raised once at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("only one notification sink may be enabled (use_dropbox_like_upload and use_sms_alert are both set)")]
    ConflictingSinks,
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Camera / frame source failure. Ends the surveillance loop.
#[derive(Debug, Error)]
pub enum FrameAcquisitionError {
    #[error("failed to read frame source {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode frame {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("camera disconnected: {0}")]
    Disconnected(String),
}

/// Upload or message delivery failure. Logged and swallowed by the pipeline.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] image::ImageError),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("message send failed: {0}")]
    Send(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("notification queue is full")]
    QueueFull,
}

#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("frame is {got_width}x{got_height} but the background model is {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        got_width: u32,
        got_height: u32,
    },
}

/// Everything that can end a surveillance run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Acquisition(#[from] FrameAcquisitionError),

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error("failed to write debug output: {0}")]
    Debug(String),
}
