use image::imageops::replace;
use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::geometry::contour_area;
use imageproc::morphology::dilate;
use imageproc::point::Point;

use crate::models::Region;

pub const FOREGROUND: u8 = 255;

/// Turns a deviation map into filtered motion regions
#[derive(Debug, Clone, Copy)]
pub struct RegionExtractor {
    pub dilate_iterations: u8,
}

impl RegionExtractor {
    pub fn new(dilate_iterations: u8) -> Self {
        Self { dilate_iterations }
    }

    /// Threshold, dilate, trace and area-filter in one pass
    pub fn extract(&self, deviation: &GrayImage, threshold: u8, min_area: u32) -> Vec<Region> {
        let mask = self.motion_mask(deviation, threshold);
        find_regions(&mask, min_area)
    }

    /// Binary mask after thresholding and dilation
    pub fn motion_mask(&self, deviation: &GrayImage, threshold: u8) -> GrayImage {
        dilate_mask(&binarize(deviation, threshold), self.dilate_iterations)
    }
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(2)
    }
}

/// Pixels at or above `threshold` become foreground
pub fn binarize(deviation: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(deviation.width(), deviation.height(), |x, y| {
        if deviation.get_pixel(x, y)[0] >= threshold {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

/// Repeated 3x3 dilation, expressed as a single chessboard-distance dilation
pub fn dilate_mask(mask: &GrayImage, iterations: u8) -> GrayImage {
    if iterations == 0 {
        return mask.clone();
    }
    dilate(mask, Norm::LInf, iterations)
}

/// Outer contours of the foreground, kept when the enclosed polygon area reaches `min_area`
///
/// Area is the shoelace area of the traced border, so a closed outline counts the
/// background it encloses. Contours nested inside a hole are not reported.
pub fn find_regions(mask: &GrayImage, min_area: u32) -> Vec<Region> {
    // Borders touching column 0 are only traced when the image has a background margin
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    replace(&mut padded, mask, 1, 1);

    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| region_from_contour(&contour.points))
        .filter(|r| r.area >= min_area)
        .collect()
}

/// Bounding box and polygon area of a contour traced in the padded mask
fn region_from_contour(points: &[Point<i32>]) -> Option<Region> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let min_y = points.iter().map(|p| p.y).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let max_y = points.iter().map(|p| p.y).max()?;

    // Area of an integer polygon is a multiple of 0.5; flooring keeps `>= min_area` exact
    let area = contour_area(points).floor() as u32;

    Some(Region::from_extent(
        (min_x - 1) as u32,
        (min_y - 1) as u32,
        (max_x - 1) as u32,
        (max_y - 1) as u32,
        area,
    ))
}
