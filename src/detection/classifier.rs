use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::models::{OccupancyVerdict, Region};

const BOX_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const BOX_THICKNESS: u32 = 2;

/// Occupied iff any region survived the area filter
pub fn classify(regions: &[Region]) -> OccupancyVerdict {
    if regions.is_empty() {
        OccupancyVerdict::Empty
    } else {
        OccupancyVerdict::Occupied
    }
}

/// Draw a bounding box around each region
pub fn annotate(frame: &mut RgbImage, regions: &[Region]) {
    for region in regions {
        // Nested rectangles give the outline some thickness
        for inset in 0..BOX_THICKNESS {
            let width = region.width + 2 * inset;
            let height = region.height + 2 * inset;
            let rect = Rect::at(region.x as i32 - inset as i32, region.y as i32 - inset as i32)
                .of_size(width, height);
            draw_hollow_rect_mut(frame, rect, BOX_COLOR);
        }
    }
}
