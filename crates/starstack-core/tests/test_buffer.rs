use approx::assert_relative_eq;
use ndarray::Array2;
use starstack_core::buffer::{PixelBuffer, Rect};

#[test]
fn arithmetic_ops_apply_per_plane() {
    let mut a = PixelBuffer::from_planes(vec![
        Array2::from_elem((2, 2), 1.0),
        Array2::from_elem((2, 2), 2.0),
        Array2::from_elem((2, 2), 3.0),
    ]);
    let b = a.clone();

    a += &b;
    assert_relative_eq!(a.get(0, 0, 0), 2.0);
    assert_relative_eq!(a.get(1, 1, 2), 6.0);

    a -= &b;
    assert_relative_eq!(a.get(0, 0, 1), 2.0);

    a *= 4.0;
    assert_relative_eq!(a.get(0, 0, 0), 4.0);

    a /= 2.0;
    assert_relative_eq!(a.get(0, 0, 2), 6.0);
}

#[test]
fn intensity_sums_channels() {
    let buf = PixelBuffer::from_planes(vec![
        Array2::from_elem((2, 3), 0.25),
        Array2::from_elem((2, 3), 0.5),
        Array2::from_elem((2, 3), 0.125),
    ]);
    assert_relative_eq!(buf.intensity_at(2, 1), 0.875);
    assert_relative_eq!(buf.intensity()[[0, 0]], 0.875);
}

#[test]
fn min_max_spans_all_planes() {
    let mut buf = PixelBuffer::zeros(4, 4, 2);
    buf.set(1, 2, 0, -0.5);
    buf.set(3, 0, 1, 2.5);
    assert_eq!(buf.min_max(), (-0.5, 2.5));
}

#[test]
fn centered_rect_halves_the_margin() {
    let r = Rect::centered(100, 60, 40, 20);
    assert_eq!(r, Rect::new(30, 20, 40, 20));
}

#[test]
fn overlap_preserves_interior_rect() {
    let r = Rect::new(10, 10, 20, 20);
    assert_eq!(r.overlap(100, 100), Some(r));
}
