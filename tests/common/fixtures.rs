use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use roomwatch::error::NotificationError;
use roomwatch::notify::{FileUploader, MessageId, MessageSender, UploadAck};
use roomwatch::{DebounceSettings, DetectionSettings, RawFrame};
use time::macros::datetime;
use time::{Duration, OffsetDateTime};

/// Frame size that needs no resizing at the default processing width
pub const WIDTH: u32 = 500;
pub const HEIGHT: u32 = 300;

/// Fixed start of the test clock
pub fn t0() -> OffsetDateTime {
    datetime!(2024-03-05 21:15:00 UTC)
}

/// `seconds` after the test clock start
pub fn at(seconds: i64) -> OffsetDateTime {
    t0() + Duration::seconds(seconds)
}

/// Grayscale image filled with `value`
pub fn flat_gray(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// Grayscale image with a filled rectangle of `value` on black
pub fn gray_with_block(width: u32, height: u32, x: u32, y: u32, w: u32, h: u32, value: u8) -> GrayImage {
    GrayImage::from_fn(width, height, |px, py| {
        if px >= x && px < x + w && py >= y && py < y + h {
            Luma([value])
        } else {
            Luma([0])
        }
    })
}

/// Black color frame at `seconds`
pub fn empty_frame(seconds: i64) -> RawFrame {
    RawFrame::new(
        DynamicImage::ImageRgb8(RgbImage::new(WIDTH, HEIGHT)),
        at(seconds),
    )
}

/// Black color frame with a white 24x25 (600 px) block at `x`
pub fn frame_with_block(seconds: i64, x: u32) -> RawFrame {
    let image = RgbImage::from_fn(WIDTH, HEIGHT, |px, py| {
        if px >= x && px < x + 24 && py >= 100 && py < 125 {
            Rgb([255, 255, 255])
        } else {
            Rgb([0, 0, 0])
        }
    });
    RawFrame::new(DynamicImage::ImageRgb8(image), at(seconds))
}

pub fn detection_settings(delta_threshold: u8, min_area: u32) -> DetectionSettings {
    DetectionSettings {
        delta_threshold,
        min_area,
        ..DetectionSettings::default()
    }
}

pub fn debounce_settings(min_upload_seconds: i64, min_motion_frames: u32) -> DebounceSettings {
    DebounceSettings {
        min_upload: Duration::seconds(min_upload_seconds),
        min_motion_frames,
    }
}

/// Uploader that records remote paths instead of sending anything
#[derive(Clone, Default)]
pub struct RecordingUploader {
    pub uploads: Arc<Mutex<Vec<(String, usize)>>>,
}

impl RecordingUploader {
    pub fn paths(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl FileUploader for RecordingUploader {
    fn upload_file(&self, contents: &[u8], remote_path: &str) -> Result<UploadAck, NotificationError> {
        self.uploads
            .lock()
            .unwrap()
            .push((remote_path.to_string(), contents.len()));
        Ok(UploadAck {
            location: remote_path.to_string(),
        })
    }
}

/// Uploader that always fails, counting attempts
#[derive(Clone, Default)]
pub struct FailingUploader {
    pub attempts: Arc<Mutex<u32>>,
}

impl FileUploader for FailingUploader {
    fn upload_file(&self, _contents: &[u8], _remote_path: &str) -> Result<UploadAck, NotificationError> {
        *self.attempts.lock().unwrap() += 1;
        Err(NotificationError::Upload("service unavailable".to_string()))
    }
}

/// Message sender that records message bodies
#[derive(Clone, Default)]
pub struct RecordingSender {
    pub messages: Arc<Mutex<Vec<String>>>,
}

impl MessageSender for RecordingSender {
    fn send_message(&self, body: &str) -> Result<MessageId, NotificationError> {
        let mut messages = self.messages.lock().unwrap();
        messages.push(body.to_string());
        Ok(MessageId(format!("SM{:04}", messages.len())))
    }
}

/// Uploader that holds every upload until the test releases it
pub struct GatedUploader {
    started: Sender<String>,
    release: Mutex<Receiver<()>>,
}

/// Test side of a `GatedUploader`
pub struct UploadGate {
    started: Receiver<String>,
    release: Sender<()>,
}

pub fn gated_uploader() -> (GatedUploader, UploadGate) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    (
        GatedUploader {
            started: started_tx,
            release: Mutex::new(release_rx),
        },
        UploadGate {
            started: started_rx,
            release: release_tx,
        },
    )
}

impl UploadGate {
    /// Remote path of the next upload to begin; panics if none starts in time
    pub fn wait_started(&self) -> String {
        self.started
            .recv_timeout(std::time::Duration::from_secs(5))
            .expect("upload did not start")
    }

    /// Let `count` uploads complete
    pub fn release(&self, count: usize) {
        for _ in 0..count {
            let _ = self.release.send(());
        }
    }

    /// Paths of uploads that began since the last call
    pub fn started_so_far(&self) -> Vec<String> {
        self.started.try_iter().collect()
    }
}

impl FileUploader for GatedUploader {
    fn upload_file(&self, _contents: &[u8], remote_path: &str) -> Result<UploadAck, NotificationError> {
        let _ = self.started.send(remote_path.to_string());
        // A dropped gate lets the upload through
        let _ = self.release.lock().unwrap().recv();
        Ok(UploadAck {
            location: remote_path.to_string(),
        })
    }
}
