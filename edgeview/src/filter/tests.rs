use super::*;
use crate::common::test_utils::*;
use crate::frame::PixelBuffer;

#[test]
fn canny_preserves_shape() {
    let filter = CannyFilter::default();
    for (w, h) in [(1, 1), (2, 3), (17, 5), (64, 64), (640, 480)] {
        let input = vertical_step(w, h, w / 2, 0, 255);
        let output = filter.apply(&input);
        assert!(output.same_shape(&input), "{w}x{h}");
    }
}

#[test]
fn canny_passes_empty_through() {
    let input = PixelBuffer::new_black(0, 0);
    let output = CannyFilter::default().apply(&input);
    assert!(output.is_empty());
}

#[test]
fn solid_gray_has_no_edges() {
    let output = CannyFilter::default().apply(&solid_gray(64, 64, 128));
    assert_eq!(count_lit(&output), 0);
    assert!(output
        .bytes()
        .chunks_exact(4)
        .all(|px| px == [0, 0, 0, 255]));
}

#[test]
fn vertical_step_gives_single_edge_column() {
    let output = CannyFilter::default().apply(&vertical_step(64, 64, 32, 0, 255));
    assert_eq!(edge_columns(&output), vec![31]);
    for y in 0..64 {
        assert_eq!(output.pixel(31, y), [255, 255, 255, 255]);
    }
}

#[test]
fn horizontal_step_gives_single_edge_row() {
    let output = CannyFilter::default().apply(&horizontal_step(48, 40, 20, 255, 0));
    assert_eq!(edge_rows(&output), vec![19]);
}

#[test]
fn low_contrast_step_has_no_edges() {
    // Gradient 40 stays below the low threshold.
    let output = CannyFilter::default().apply(&vertical_step(32, 32, 16, 100, 110));
    assert_eq!(count_lit(&output), 0);
}

#[test]
fn weak_only_step_has_no_edges() {
    // Gradient 120 lies between the thresholds with no strong seed.
    let output = CannyFilter::default().apply(&vertical_step(32, 32, 16, 100, 130));
    assert_eq!(count_lit(&output), 0);
}

#[test]
fn lower_high_threshold_promotes_step() {
    let filter = CannyFilter::new(CannyConfig {
        low_threshold: 50.0,
        high_threshold: 100.0,
        l2_gradient: false,
    });
    let output = filter.apply(&vertical_step(32, 32, 16, 100, 130));
    assert_eq!(edge_columns(&output), vec![15]);
}

#[test]
fn l2_gradient_detects_step() {
    let filter = CannyFilter::new(CannyConfig {
        l2_gradient: true,
        ..Default::default()
    });
    let output = filter.apply(&vertical_step(32, 16, 8, 255, 0));
    assert_eq!(edge_columns(&output), vec![7]);
}

#[test]
fn luma_matches_reference_points() {
    assert_eq!(luma(0, 0, 0), 0);
    assert_eq!(luma(255, 255, 255), 255);
    assert_eq!(luma(255, 0, 0), 76);
    assert_eq!(luma(0, 255, 0), 150);
    assert_eq!(luma(0, 0, 255), 29);
}

#[test]
fn grayscale_replicates_luma() {
    let mut input = PixelBuffer::new_black(2, 1);
    input.set_pixel(0, 0, [255, 0, 0, 10]);
    input.set_pixel(1, 0, [0, 255, 0, 10]);

    let output = GrayscaleFilter.apply(&input);
    assert_eq!(output.pixel(0, 0), [76, 76, 76, 255]);
    assert_eq!(output.pixel(1, 0), [150, 150, 150, 255]);
}

#[test]
fn passthrough_is_identity() {
    let input = vertical_step(8, 8, 4, 10, 200);
    assert_eq!(PassthroughFilter.apply(&input), input);
}

#[test]
fn closures_are_filters() {
    let invert = |input: &PixelBuffer| {
        let mut out = input.clone();
        for px in out.bytes_mut().chunks_exact_mut(4) {
            px[0] = 255 - px[0];
        }
        out
    };
    let output = invert.apply(&solid_gray(2, 2, 5));
    assert_eq!(output.pixel(1, 1)[0], 250);
    assert_eq!(invert.name(), "closure");
}
