use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{FileUploader, UploadAck};
use crate::error::{ConfigError, NotificationError};

const DROPBOX_UPLOAD_URL: &str = "https://content.dropboxapi.com/2/files/upload";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stores uploads below a local root directory
#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    root: PathBuf,
}

impl DirectoryUploader {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl FileUploader for DirectoryUploader {
    fn upload_file(&self, contents: &[u8], remote_path: &str) -> Result<UploadAck, NotificationError> {
        let target = self.root.join(remote_path.trim_start_matches('/'));
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, contents)?;
        debug!("Wrote {} bytes to {}", contents.len(), target.display());

        Ok(UploadAck {
            location: target.display().to_string(),
        })
    }
}

/// Uploads through the Dropbox content API
pub struct DropboxUploader {
    client: Client,
    access_token: String,
}

#[derive(Deserialize)]
struct DropboxFileMetadata {
    path_display: Option<String>,
    id: Option<String>,
}

impl DropboxUploader {
    pub fn new(access_token: String) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ConfigError::invalid("dropbox_access_token", e.to_string()))?;
        Ok(Self {
            client,
            access_token,
        })
    }
}

impl FileUploader for DropboxUploader {
    fn upload_file(&self, contents: &[u8], remote_path: &str) -> Result<UploadAck, NotificationError> {
        let api_arg = serde_json::json!({
            "path": remote_path,
            "mode": "add",
            "autorename": true,
        });

        let response = self
            .client
            .post(DROPBOX_UPLOAD_URL)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/octet-stream")
            .header("Dropbox-API-Arg", api_arg.to_string())
            .body(contents.to_vec())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(NotificationError::Upload(format!("{}: {}", status, body)));
        }

        let metadata: DropboxFileMetadata = response.json()?;
        Ok(UploadAck {
            location: metadata
                .path_display
                .or(metadata.id)
                .unwrap_or_else(|| remote_path.to_string()),
        })
    }
}
