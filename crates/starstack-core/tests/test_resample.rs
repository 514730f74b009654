#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;
use common::{blob_buffer, max_abs_diff, total_intensity};
use starstack_core::resample::{resize, rotate, rotate90ccw, rotate90cw, shift, ResizeMode};

#[test]
fn shift_round_trip_is_bounded() {
    let original = blob_buffer(64, 64, 32.0, 32.0, 6.0, 1.0);
    let there = shift(&original, 3.25, -1.75);
    let back = shift(&there, -3.25, 1.75);

    // Bilinear is lossy but bounded for a smooth image; edges were zeroed
    // going out of bounds, so compare away from the border.
    let mut max_err = 0.0f32;
    for row in 8..56 {
        for col in 8..56 {
            max_err = max_err.max((back.get(col, row, 0) - original.get(col, row, 0)).abs());
        }
    }
    assert!(max_err < 0.02, "round-trip error {max_err}");
}

#[test]
fn shift_zeroes_out_of_bounds_sources() {
    let original = blob_buffer(16, 16, 8.0, 8.0, 3.0, 1.0);
    let shifted = shift(&original, 4.0, 0.0);
    // The rightmost 4 columns sample past the edge.
    for row in 0..16 {
        for col in 12..16 {
            assert_eq!(shifted.get(col, row, 0), 0.0);
        }
    }
}

#[test]
fn area_shrink_conserves_intensity() {
    let original = blob_buffer(64, 64, 30.0, 34.0, 8.0, 1.0);
    let before = total_intensity(&original);

    let half = resize(&original, 0.5, 0.5, ResizeMode::None);
    assert_eq!(half.width(), 32);
    assert_eq!(half.height(), 32);
    assert_relative_eq!(total_intensity(&half), before, max_relative = 1e-4);

    // Non-integer factor too.
    let odd = resize(&original, 0.37, 0.61, ResizeMode::None);
    assert_relative_eq!(total_intensity(&odd), before, max_relative = 1e-4);
}

#[test]
fn shrink_then_grow_restores_dimensions() {
    let original = blob_buffer(64, 64, 32.0, 32.0, 10.0, 1.0);
    let small = resize(&original, 0.5, 0.5, ResizeMode::Bilinear);
    let restored = resize(&small, 2.0, 2.0, ResizeMode::Bilinear);
    assert_eq!(restored.width(), 64);
    assert_eq!(restored.height(), 64);
}

#[test]
fn grow_nearest_replicates_samples() {
    let original = blob_buffer(8, 8, 4.0, 4.0, 3.0, 1.0);
    let grown = resize(&original, 2.0, 2.0, ResizeMode::Nearest);
    assert_eq!(grown.width(), 16);
    // Destination 2 maps back to source 1.
    assert_eq!(grown.get(2, 2, 0), original.get(1, 1, 0));
}

#[test]
fn mixed_axes_shrink_first() {
    let original = blob_buffer(40, 40, 20.0, 20.0, 6.0, 1.0);
    let out = resize(&original, 0.5, 2.0, ResizeMode::Bilinear);
    assert_eq!(out.width(), 20);
    assert_eq!(out.height(), 80);
}

#[test]
fn rotation_by_zero_is_identity() {
    let original = blob_buffer(32, 32, 14.0, 18.0, 4.0, 1.0);
    assert_eq!(max_abs_diff(&rotate(&original, 0.0, true), &original), 0.0);
    assert_eq!(max_abs_diff(&rotate(&original, 360.0, true), &original), 0.0);
    assert_eq!(max_abs_diff(&rotate(&original, -720.0, true), &original), 0.0);
}

#[test]
fn rotation_round_trip_is_bounded() {
    let original = blob_buffer(64, 64, 32.0, 32.0, 8.0, 1.0);
    let there = rotate(&original, 17.0, true);
    let back = rotate(&there, -17.0, true);

    let mut max_err = 0.0f32;
    for row in 12..52 {
        for col in 12..52 {
            max_err = max_err.max((back.get(col, row, 0) - original.get(col, row, 0)).abs());
        }
    }
    assert!(max_err < 0.05, "round-trip error {max_err}");
}

#[test]
fn rotation_output_covers_the_footprint() {
    let original = blob_buffer(40, 20, 20.0, 10.0, 4.0, 1.0);
    let rotated = rotate(&original, 90.0, false);
    // A 40x20 image rotated 90 degrees needs a ~20x40 canvas.
    assert!(rotated.width() >= 20 && rotated.width() <= 22);
    assert!(rotated.height() >= 40 && rotated.height() <= 42);
}

#[test]
fn crop_rotation_of_nonsquare_buffer_keeps_dimensions() {
    // At 90° the 40x20 footprint is 20x40: narrower than the input on x,
    // taller on y. With crop the result must still come back 40x20,
    // zero-padded where the footprint does not reach.
    let original = blob_buffer(40, 20, 20.0, 10.0, 3.0, 1.0);
    let rotated = rotate(&original, 90.0, true);
    assert_eq!(rotated.width(), 40);
    assert_eq!(rotated.height(), 20);

    // The blob stays near the center of the canvas.
    assert!(rotated.get(19, 10, 0) > 0.8, "center {}", rotated.get(19, 10, 0));
    // The side margins outside the rotated footprint are padding.
    assert_eq!(rotated.get(0, 0, 0), 0.0);
    assert_eq!(rotated.get(39, 19, 0), 0.0);
}

#[test]
fn rotate90_pair_is_exact_inverse() {
    let original = blob_buffer(24, 16, 10.0, 7.5, 3.0, 1.0);
    let cw = rotate90cw(&original);
    assert_eq!(cw.width(), 16);
    assert_eq!(cw.height(), 24);

    let back = rotate90ccw(&cw);
    assert_eq!(max_abs_diff(&back, &original), 0.0);
}

#[test]
fn rotate90cw_moves_top_left_to_top_right() {
    let mut original = blob_buffer(4, 4, 2.0, 2.0, 0.5, 0.0);
    original.set(0, 0, 0, 1.0);
    let cw = rotate90cw(&original);
    assert_eq!(cw.get(3, 0, 0), 1.0);
}
