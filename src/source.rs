use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::ImageReader;
use image::imageops::FilterType;
use time::OffsetDateTime;
use tracing::debug;

use crate::error::FrameAcquisitionError;
use crate::models::RawFrame;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp"];

/// Blocking, non-restartable source of camera frames.
///
/// `Ok(None)` means the source is exhausted. Errors are fatal to the run.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, FrameAcquisitionError>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, FrameAcquisitionError> {
        (**self).next_frame()
    }
}

/// Frames held in memory, handed out in order
pub struct ReplaySource {
    frames: VecDeque<RawFrame>,
}

impl ReplaySource {
    pub fn new(frames: impl IntoIterator<Item = RawFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for ReplaySource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, FrameAcquisitionError> {
        Ok(self.frames.pop_front())
    }
}

/// Replays the image files of a directory in file name order.
///
/// Timestamps start at the time the source was opened and advance by one
/// frame interval per image. With a capture resolution set, images of any
/// other size are scaled to it, the way a camera delivers at its configured mode.
pub struct ImageDirSource {
    paths: VecDeque<PathBuf>,
    next_timestamp: OffsetDateTime,
    interval: time::Duration,
    resolution: Option<(u32, u32)>,
}

impl ImageDirSource {
    pub fn open<P: AsRef<Path>>(dir: P, interval: time::Duration) -> Result<Self, FrameAcquisitionError> {
        let dir = dir.as_ref();
        let io_err = |source: std::io::Error| FrameAcquisitionError::Io {
            path: dir.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();

        Ok(Self {
            paths: paths.into(),
            next_timestamp: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
            interval,
            resolution: None,
        })
    }

    /// Deliver every frame at `width` x `height`
    pub fn with_resolution(mut self, (width, height): (u32, u32)) -> Self {
        self.resolution = Some((width, height));
        self
    }

    /// Override the timestamp of the first frame
    pub fn starting_at(mut self, start: OffsetDateTime) -> Self {
        self.next_timestamp = start;
        self
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageDirSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, FrameAcquisitionError> {
        let Some(path) = self.paths.pop_front() else {
            return Ok(None);
        };

        let mut image = ImageReader::open(&path)
            .map_err(|source| FrameAcquisitionError::Io {
                path: path.clone(),
                source,
            })?
            .decode()
            .map_err(|source| FrameAcquisitionError::Decode {
                path: path.clone(),
                source,
            })?;

        match self.resolution {
            Some((width, height)) if (image.width(), image.height()) != (width, height) => {
                debug!(
                    "Scaling {} from {}x{} to {}x{}",
                    path.display(),
                    image.width(),
                    image.height(),
                    width,
                    height
                );
                image = image.resize_exact(width, height, FilterType::Triangle);
            }
            _ => {}
        }

        let timestamp = self.next_timestamp;
        self.next_timestamp += self.interval;
        Ok(Some(RawFrame::new(image, timestamp)))
    }
}
