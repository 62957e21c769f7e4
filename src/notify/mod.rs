pub mod dispatch;
pub mod sms;
pub mod upload;

use std::io::Cursor;

use image::ImageFormat;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::info;

use crate::config::{Config, SinkKind};
use crate::error::{ConfigError, NotificationError};
use crate::models::AlertEvent;

pub use dispatch::{Dispatch, Notifier};
pub use sms::TwilioSender;
pub use upload::{DirectoryUploader, DropboxUploader};

/// Receipt for a stored file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadAck {
    pub location: String,
}

/// Provider identifier of a sent message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub String);

pub trait FileUploader: Send {
    fn upload_file(&self, contents: &[u8], remote_path: &str) -> Result<UploadAck, NotificationError>;
}

pub trait MessageSender: Send {
    fn send_message(&self, body: &str) -> Result<MessageId, NotificationError>;
}

/// What a delivery attempt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Uploaded(UploadAck),
    Sent(MessageId),
    /// Handed to the background worker
    Queued,
    Skipped,
}

/// The single notification channel chosen at startup
pub enum NotificationSink {
    Upload {
        uploader: Box<dyn FileUploader>,
        base_path: String,
    },
    Sms {
        sender: Box<dyn MessageSender>,
        body: String,
    },
    Disabled,
}

impl std::fmt::Debug for NotificationSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationSink::Upload { base_path, .. } => f
                .debug_struct("Upload")
                .field("base_path", base_path)
                .finish_non_exhaustive(),
            NotificationSink::Sms { body, .. } => f
                .debug_struct("Sms")
                .field("body", body)
                .finish_non_exhaustive(),
            NotificationSink::Disabled => f.write_str("Disabled"),
        }
    }
}

impl NotificationSink {
    /// Build the sink selected by `config`, reading secrets through `env`.
    pub fn from_config<F>(config: &Config, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        match config.sink_kind()? {
            SinkKind::Upload => {
                let uploader: Box<dyn FileUploader> = match &config.upload_local_dir {
                    Some(dir) => Box::new(DirectoryUploader::new(dir)),
                    None => {
                        let token = config
                            .dropbox_access_token
                            .clone()
                            .or_else(|| env("DROPBOX_ACCESS_TOKEN"))
                            .ok_or(ConfigError::Missing("dropbox_access_token"))?;
                        Box::new(DropboxUploader::new(token)?)
                    }
                };
                Ok(NotificationSink::Upload {
                    uploader,
                    base_path: config.upload_base_path.clone(),
                })
            }
            SinkKind::Sms => {
                let account_sid =
                    env("TWILIO_ACCOUNT_SID").ok_or(ConfigError::Missing("TWILIO_ACCOUNT_SID"))?;
                let auth_token =
                    env("TWILIO_AUTH_TOKEN").ok_or(ConfigError::Missing("TWILIO_AUTH_TOKEN"))?;
                let from = config.sms_from.clone().ok_or(ConfigError::Missing("sms_from"))?;
                let to = config.sms_to.clone().ok_or(ConfigError::Missing("sms_to"))?;

                Ok(NotificationSink::Sms {
                    sender: Box::new(TwilioSender::new(account_sid, auth_token, from, to)?),
                    body: config.alert_message.clone(),
                })
            }
            SinkKind::Disabled => Ok(NotificationSink::Disabled),
        }
    }

    pub fn kind(&self) -> SinkKind {
        match self {
            NotificationSink::Upload { .. } => SinkKind::Upload,
            NotificationSink::Sms { .. } => SinkKind::Sms,
            NotificationSink::Disabled => SinkKind::Disabled,
        }
    }

    /// Deliver one alert through the configured channel
    pub fn deliver(&self, event: &AlertEvent) -> Result<Delivery, NotificationError> {
        match self {
            NotificationSink::Upload { uploader, base_path } => {
                let remote_path = remote_path(base_path, event.timestamp);
                let jpeg = encode_snapshot(event)?;
                info!("[UPLOAD] {}", remote_path);
                Ok(Delivery::Uploaded(uploader.upload_file(&jpeg, &remote_path)?))
            }
            NotificationSink::Sms { sender, body } => {
                let id = sender.send_message(body)?;
                info!("[SMS] sent message {}", id.0);
                Ok(Delivery::Sent(id))
            }
            NotificationSink::Disabled => {
                info!("Alert at {} (no notification sink configured)", event.timestamp);
                Ok(Delivery::Skipped)
            }
        }
    }

    /// Send a free-form status message. Only the SMS channel carries these.
    pub fn announce(&self, message: &str) -> Result<Option<MessageId>, NotificationError> {
        match self {
            NotificationSink::Sms { sender, .. } => sender.send_message(message).map(Some),
            _ => Ok(None),
        }
    }
}

/// Remote path for a snapshot: `/{base}/{timestamp}.jpg`
pub fn remote_path(base_path: &str, timestamp: OffsetDateTime) -> String {
    let base = base_path.trim_matches('/');
    let name = snapshot_name(timestamp);
    if base.is_empty() {
        format!("/{}.jpg", name)
    } else {
        format!("/{}/{}.jpg", base, name)
    }
}

fn snapshot_name(timestamp: OffsetDateTime) -> String {
    let format = format_description!("[year]-[month]-[day]_[hour]-[minute]-[second]");
    timestamp
        .format(format)
        .unwrap_or_else(|_| timestamp.unix_timestamp().to_string())
}

fn encode_snapshot(event: &AlertEvent) -> Result<Vec<u8>, NotificationError> {
    let mut buffer = Cursor::new(Vec::new());
    event.snapshot.write_to(&mut buffer, ImageFormat::Jpeg)?;
    Ok(buffer.into_inner())
}
