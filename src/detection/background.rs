use image::{GrayImage, ImageBuffer, Luma};
use tracing::{debug, info};

use crate::error::DetectionError;

/// Weight of the newest frame in the running average
pub const BACKGROUND_ALPHA: f32 = 0.5;

pub type BackgroundImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Result of feeding one frame to the background model
#[derive(Debug, Clone)]
pub enum Observation {
    /// The frame seeded the background; skip detection for it
    Warmup,
    /// Per-pixel deviation from the updated background
    Deviation(GrayImage),
}

impl Observation {
    /// Deviation map, or an all-zero map of the given size during warmup
    pub fn into_deviation(self, width: u32, height: u32) -> GrayImage {
        match self {
            Observation::Warmup => GrayImage::new(width, height),
            Observation::Deviation(map) => map,
        }
    }

    pub fn is_warmup(&self) -> bool {
        matches!(self, Observation::Warmup)
    }
}

/// Exponentially weighted running average of the scene
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    alpha: f32,
    background: Option<BackgroundImage>,
}

impl BackgroundModel {
    pub fn new() -> Self {
        Self {
            alpha: BACKGROUND_ALPHA,
            background: None,
        }
    }

    pub fn background(&self) -> Option<&BackgroundImage> {
        self.background.as_ref()
    }

    pub fn is_seeded(&self) -> bool {
        self.background.is_some()
    }

    /// Fold `frame` into the background and return how far it deviates.
    ///
    /// The first frame only seeds the model. Later frames must match its
    /// dimensions.
    pub fn observe(&mut self, frame: &GrayImage) -> Result<Observation, DetectionError> {
        let alpha = self.alpha;
        let background = match &mut self.background {
            Some(background) => background,
            slot @ None => {
                info!(
                    "Seeding background from first frame ({}x{})",
                    frame.width(),
                    frame.height()
                );
                *slot = Some(ImageBuffer::from_fn(frame.width(), frame.height(), |x, y| {
                    Luma([frame.get_pixel(x, y)[0] as f32])
                }));
                return Ok(Observation::Warmup);
            }
        };

        if background.dimensions() != frame.dimensions() {
            return Err(DetectionError::DimensionMismatch {
                width: background.width(),
                height: background.height(),
                got_width: frame.width(),
                got_height: frame.height(),
            });
        }

        let mut deviation = GrayImage::new(frame.width(), frame.height());
        let mut total: u64 = 0;

        for ((avg, current), out) in background
            .pixels_mut()
            .zip(frame.pixels())
            .zip(deviation.pixels_mut())
        {
            let value = current[0] as f32;
            avg[0] = avg[0] * (1.0 - alpha) + value * alpha;

            // Halves go to the even neighbour when the average is scaled back to 8 bits
            let reference = avg[0].round_ties_even().clamp(0.0, 255.0) as u8;
            let diff = current[0].abs_diff(reference);
            out[0] = diff;
            total += diff as u64;
        }

        debug!(
            "Background updated, mean deviation {:.2}",
            total as f64 / (frame.width() as f64 * frame.height() as f64).max(1.0)
        );

        Ok(Observation::Deviation(deviation))
    }
}

impl Default for BackgroundModel {
    fn default() -> Self {
        Self::new()
    }
}
