mod common;

use common::*;
use roomwatch::DetectionError;

#[test]
fn test_first_frame_seeds_background() {
    let mut model = BackgroundModel::new();
    let frame = gray_with_block(40, 30, 5, 5, 10, 10, 200);

    let observation = model.observe(&frame).unwrap();
    assert!(observation.is_warmup());

    let deviation = observation.into_deviation(40, 30);
    assert!(deviation.pixels().all(|p| p[0] == 0));

    let background = model.background().expect("background should be seeded");
    for (x, y, pixel) in frame.enumerate_pixels() {
        assert_eq!(background.get_pixel(x, y)[0], pixel[0] as f32);
    }
}

#[test]
fn test_running_average_uses_half_weight() {
    let mut model = BackgroundModel::new();
    model.observe(&flat_gray(8, 8, 0)).unwrap();

    let Observation::Deviation(deviation) = model.observe(&flat_gray(8, 8, 200)).unwrap() else {
        panic!("second frame should produce a deviation map");
    };

    let background = model.background().unwrap();
    assert_eq!(background.get_pixel(3, 3)[0], 100.0);
    assert_eq!(deviation.get_pixel(3, 3)[0], 100);
}

#[test]
fn test_half_way_average_rounds_to_even() {
    // (seed, next frame) -> expected deviation; the averages land on 0.5, 1.5 and 2.5
    for (seed, next, expected) in [(0u8, 1u8, 1u8), (0, 3, 1), (2, 3, 1)] {
        let mut model = BackgroundModel::new();
        model.observe(&flat_gray(4, 4, seed)).unwrap();

        let deviation = model.observe(&flat_gray(4, 4, next)).unwrap().into_deviation(4, 4);
        assert_eq!(
            deviation.get_pixel(0, 0)[0],
            expected,
            "seed {} then {}",
            seed,
            next
        );
    }
}

#[test]
fn test_constant_input_converges() {
    let mut model = BackgroundModel::new();
    model.observe(&flat_gray(16, 16, 0)).unwrap();

    let frame = flat_gray(16, 16, 180);
    let mut last = None;
    for _ in 0..30 {
        last = Some(model.observe(&frame).unwrap().into_deviation(16, 16));
    }

    let background = model.background().unwrap();
    assert!(background.pixels().all(|p| (p[0] - 180.0).abs() < 0.01));
    assert!(last.unwrap().pixels().all(|p| p[0] == 0));
}

#[test]
fn test_identical_frames_have_no_deviation() {
    let mut model = BackgroundModel::new();
    let frame = gray_with_block(20, 20, 2, 2, 6, 6, 90);
    model.observe(&frame).unwrap();

    let deviation = model.observe(&frame).unwrap().into_deviation(20, 20);
    assert!(deviation.pixels().all(|p| p[0] == 0));
}

#[test]
fn test_dimension_mismatch_is_rejected() {
    let mut model = BackgroundModel::new();
    model.observe(&flat_gray(10, 10, 0)).unwrap();

    let err = model.observe(&flat_gray(12, 10, 0)).unwrap_err();
    match err {
        DetectionError::DimensionMismatch {
            width,
            height,
            got_width,
            got_height,
        } => {
            assert_eq!((width, height), (10, 10));
            assert_eq!((got_width, got_height), (12, 10));
        }
    }
}
