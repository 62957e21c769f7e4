use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use crate::models::{Frame, RawFrame};

/// Resize to the given width, keeping the aspect ratio
pub fn resize_to_width(img: &DynamicImage, width: u32) -> DynamicImage {
    if img.width() == width || img.width() == 0 {
        return img.clone();
    }
    let scale = width as f64 / img.width() as f64;
    let height = ((img.height() as f64 * scale).round() as u32).max(1);
    img.resize_exact(width, height, FilterType::Triangle)
}

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Apply Gaussian blur to reduce noise
pub fn apply_blur(img: &GrayImage, sigma: f32) -> GrayImage {
    gaussian_blur_f32(img, sigma)
}

/// Resize, convert and smooth a raw camera frame
pub fn prepare_frame(raw: &RawFrame, process_width: u32, blur_sigma: f32) -> Frame {
    let resized = resize_to_width(&raw.image, process_width);
    let gray = apply_blur(&to_grayscale(&resized), blur_sigma);
    let color: RgbImage = resized.to_rgb8();

    Frame {
        gray,
        color,
        timestamp: raw.timestamp,
    }
}
