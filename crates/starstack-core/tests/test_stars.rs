#[allow(dead_code)]
mod common;

use approx::assert_relative_eq;
use common::starfield;
use starstack_core::registration::{
    refine_star, refine_stars, rotate_list, rotation_between, shift_between, Star, StarList,
    StarMatchConfig,
};

fn synthetic_list(points: &[(f64, f64)]) -> StarList {
    points
        .iter()
        .map(|&(x, y)| Star {
            x,
            y,
            ..Default::default()
        })
        .collect()
}

#[test]
fn refines_to_subpixel_centroid() {
    let frame = starfield(100, 100, &[(40.3, 60.7)], 2.0, 1.0, 0.0);
    let config = StarMatchConfig::default();

    // Seed a few pixels off; the search box finds the peak, the moment
    // centroid recovers the sub-pixel position.
    let star = refine_star(&frame, (37.0, 63.0), &config);
    assert!((star.x - 40.3).abs() < 0.1, "x {}", star.x);
    assert!((star.y - 60.7).abs() < 0.1, "y {}", star.y);
    assert!(star.fwhm > 0.0);
}

#[test]
fn refinement_preserves_seed_order() {
    let stars = [(20.0, 20.0), (70.0, 30.0), (40.0, 80.0)];
    let frame = starfield(100, 100, &stars, 1.8, 1.0, 0.05);
    let config = StarMatchConfig::default();

    let list = refine_stars(&frame, &stars, &config);
    assert_eq!(list.len(), 3);
    for (star, seed) in list.iter().zip(&stars) {
        assert!((star.x - seed.0).abs() < 0.2);
        assert!((star.y - seed.1).abs() < 0.2);
    }
}

#[test]
fn flat_region_degrades_to_seed() {
    let frame = starfield(50, 50, &[], 1.0, 0.0, 0.1);
    let config = StarMatchConfig::default();
    let star = refine_star(&frame, (25.0, 25.0), &config);
    // No peak anywhere: the star stays near the seed with zero widths.
    assert!((star.x - 25.0).abs() <= (config.searchbox / 2) as f64);
    assert_eq!(star.xwidth, 0.0);
    assert_eq!(star.ywidth, 0.0);
}

#[test]
fn exact_rotation_is_recovered() {
    let reference = synthetic_list(&[(10.0, 10.0), (60.0, 20.0), (30.0, 70.0)]);
    let rotated = rotate_list(&reference, 12.5, 40.0, 40.0);

    let est = rotation_between(&reference, &rotated).unwrap();
    assert_relative_eq!(est.degrees, 12.5, epsilon = 1e-9);
    assert!(est.sigma < 1e-9, "sigma {}", est.sigma);
}

#[test]
fn two_stars_report_zero_sigma() {
    let reference = synthetic_list(&[(10.0, 10.0), (50.0, 40.0)]);
    let rotated = rotate_list(&reference, -5.0, 30.0, 25.0);

    let est = rotation_between(&reference, &rotated).unwrap();
    assert_relative_eq!(est.degrees, -5.0, epsilon = 1e-9);
    assert_eq!(est.sigma, 0.0);
}

#[test]
fn rotation_needs_two_stars() {
    let single = synthetic_list(&[(10.0, 10.0)]);
    assert!(rotation_between(&single, &single).is_err());
}

#[test]
fn rotation_handles_angle_wraparound() {
    // Pair direction almost along +x: raw angles straddle 0/2pi.
    let reference = synthetic_list(&[(10.0, 10.0), (60.0, 9.9)]);
    let rotated = rotate_list(&reference, 0.4, 35.0, 10.0);

    let est = rotation_between(&reference, &rotated).unwrap();
    assert_relative_eq!(est.degrees, 0.4, epsilon = 1e-9);
}

#[test]
fn exact_shift_is_recovered() {
    let reference = synthetic_list(&[(10.0, 10.0), (60.0, 20.0), (30.0, 70.0)]);
    let moved: StarList = reference
        .iter()
        .map(|s| Star {
            x: s.x + 3.25,
            y: s.y - 1.5,
            ..*s
        })
        .collect();

    let est = shift_between(&reference, &moved).unwrap();
    assert_relative_eq!(est.dx, 3.25, epsilon = 1e-12);
    assert_relative_eq!(est.dy, -1.5, epsilon = 1e-12);
    assert!(est.sigma_x < 1e-12);
    assert!(est.sigma_y < 1e-12);
}

#[test]
fn rotate_list_round_trips() {
    let list = synthetic_list(&[(12.0, 34.0), (56.0, 78.0)]);
    let back = rotate_list(&rotate_list(&list, 33.0, 40.0, 40.0), -33.0, 40.0, 40.0);
    for (a, b) in list.iter().zip(&back) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
    }
}
