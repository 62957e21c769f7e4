use std::fmt;

use image::{DynamicImage, GrayImage, RgbImage};
use time::OffsetDateTime;

/// A frame as delivered by the camera, before any processing
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub image: DynamicImage,
    pub timestamp: OffsetDateTime,
}

impl RawFrame {
    pub fn new(image: DynamicImage, timestamp: OffsetDateTime) -> Self {
        Self { image, timestamp }
    }
}

/// A preprocessed frame: smoothed grayscale for detection, resized color for annotation
#[derive(Debug, Clone)]
pub struct Frame {
    pub gray: GrayImage,
    pub color: RgbImage,
    pub timestamp: OffsetDateTime,
}

/// Bounding box of an outer contour in the motion mask
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Polygon area enclosed by the contour, rounded down
    pub area: u32,
}

impl Region {
    pub fn from_extent(min_x: u32, min_y: u32, max_x: u32, max_y: u32, area: u32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x + 1,
            height: max_y - min_y + 1,
            area,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupancyVerdict {
    Occupied,
    Empty,
}

impl OccupancyVerdict {
    pub fn is_occupied(self) -> bool {
        self == OccupancyVerdict::Occupied
    }

    /// Text shown in the room status line
    pub fn label(self) -> &'static str {
        match self {
            OccupancyVerdict::Occupied => "Occupied",
            OccupancyVerdict::Empty => "No Intruders",
        }
    }
}

impl fmt::Display for OccupancyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emitted once sustained motion clears the debouncer; handed to the sink exactly once
#[derive(Debug, Clone)]
pub struct AlertEvent {
    pub snapshot: RgbImage,
    pub timestamp: OffsetDateTime,
    pub regions: Vec<Region>,
}
