pub mod background;
pub mod classifier;
pub mod contours;
pub mod preprocessing;

use image::GrayImage;
use tracing::debug;

use crate::config::DetectionSettings;
use crate::error::DetectionError;
use crate::models::{Frame, OccupancyVerdict, RawFrame, Region};

pub use background::{BackgroundModel, Observation};
pub use contours::RegionExtractor;

/// Everything computed for a single frame
#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub frame: Frame,
    /// False for the frame that seeded the background
    pub evaluated: bool,
    pub deviation: GrayImage,
    pub mask: GrayImage,
    pub regions: Vec<Region>,
    pub verdict: OccupancyVerdict,
}

/// Preprocessing, background subtraction, region extraction and classification
pub struct MotionDetector {
    settings: DetectionSettings,
    background: BackgroundModel,
    extractor: RegionExtractor,
}

impl MotionDetector {
    pub fn new(settings: DetectionSettings) -> Self {
        Self {
            settings,
            background: BackgroundModel::new(),
            extractor: RegionExtractor::new(settings.dilate_iterations),
        }
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    pub fn background(&self) -> &BackgroundModel {
        &self.background
    }

    /// Run one raw frame through the detector
    pub fn analyze(&mut self, raw: &RawFrame) -> Result<FrameAnalysis, DetectionError> {
        let frame = preprocessing::prepare_frame(raw, self.settings.process_width, self.settings.blur_sigma);
        self.analyze_frame(frame)
    }

    /// Run an already preprocessed frame through the detector
    pub fn analyze_frame(&mut self, frame: Frame) -> Result<FrameAnalysis, DetectionError> {
        let (width, height) = frame.gray.dimensions();
        let observation = self.background.observe(&frame.gray)?;

        if observation.is_warmup() {
            return Ok(FrameAnalysis {
                frame,
                evaluated: false,
                deviation: GrayImage::new(width, height),
                mask: GrayImage::new(width, height),
                regions: Vec::new(),
                verdict: OccupancyVerdict::Empty,
            });
        }

        let deviation = observation.into_deviation(width, height);
        let mask = self
            .extractor
            .motion_mask(&deviation, self.settings.delta_threshold);
        let regions = contours::find_regions(&mask, self.settings.min_area);
        let verdict = classifier::classify(&regions);

        debug!(
            "Frame at {}: {} region(s), {}",
            frame.timestamp,
            regions.len(),
            verdict
        );

        Ok(FrameAnalysis {
            frame,
            evaluated: true,
            deviation,
            mask,
            regions,
            verdict,
        })
    }
}
