use std::ops::{AddAssign, DivAssign, MulAssign, SubAssign};

use ndarray::Array2;

/// A multi-channel image: one `f32` plane per channel, row-major,
/// shape = (height, width). Depth 1 = mono, 3 = RGB.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    planes: Vec<Array2<f32>>,
}

impl PixelBuffer {
    pub fn zeros(width: usize, height: usize, depth: usize) -> Self {
        assert!(depth > 0, "buffer depth must be at least 1");
        Self {
            planes: (0..depth).map(|_| Array2::zeros((height, width))).collect(),
        }
    }

    pub fn from_plane(plane: Array2<f32>) -> Self {
        Self {
            planes: vec![plane],
        }
    }

    pub fn from_planes(planes: Vec<Array2<f32>>) -> Self {
        assert!(!planes.is_empty(), "buffer depth must be at least 1");
        let dim = planes[0].dim();
        assert!(
            planes.iter().all(|p| p.dim() == dim),
            "all planes must share dimensions"
        );
        Self { planes }
    }

    pub fn width(&self) -> usize {
        self.planes[0].ncols()
    }

    pub fn height(&self) -> usize {
        self.planes[0].nrows()
    }

    pub fn depth(&self) -> usize {
        self.planes.len()
    }

    pub fn plane(&self, channel: usize) -> &Array2<f32> {
        &self.planes[channel]
    }

    pub fn plane_mut(&mut self, channel: usize) -> &mut Array2<f32> {
        &mut self.planes[channel]
    }

    pub fn planes(&self) -> impl Iterator<Item = &Array2<f32>> {
        self.planes.iter()
    }

    pub fn planes_mut(&mut self) -> impl Iterator<Item = &mut Array2<f32>> {
        self.planes.iter_mut()
    }

    pub fn get(&self, x: usize, y: usize, channel: usize) -> f32 {
        self.planes[channel][[y, x]]
    }

    pub fn set(&mut self, x: usize, y: usize, channel: usize, value: f32) {
        self.planes[channel][[y, x]] = value;
    }

    /// Absolute intensity at a pixel: the sum over all channels.
    /// This is the quantity template matching and star centroids operate on.
    pub fn intensity_at(&self, x: usize, y: usize) -> f32 {
        self.planes.iter().map(|p| p[[y, x]]).sum()
    }

    /// Single-plane intensity image (per-pixel channel sum).
    pub fn intensity(&self) -> Array2<f32> {
        let mut out = self.planes[0].clone();
        for plane in &self.planes[1..] {
            out += plane;
        }
        out
    }

    /// Global (min, max) over every sample in every plane.
    pub fn min_max(&self) -> (f32, f32) {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        for plane in &self.planes {
            for &v in plane.iter() {
                min = min.min(v);
                max = max.max(v);
            }
        }
        (min, max)
    }

    pub fn is_compatible_with(&self, other: &PixelBuffer) -> bool {
        self.width() == other.width()
            && self.height() == other.height()
            && self.depth() == other.depth()
    }

    fn assert_compatible(&self, other: &PixelBuffer) {
        assert!(
            self.is_compatible_with(other),
            "incompatible buffers: {}x{}x{} vs {}x{}x{}",
            self.width(),
            self.height(),
            self.depth(),
            other.width(),
            other.height(),
            other.depth()
        );
    }
}

impl AddAssign<&PixelBuffer> for PixelBuffer {
    fn add_assign(&mut self, rhs: &PixelBuffer) {
        self.assert_compatible(rhs);
        for (dst, src) in self.planes.iter_mut().zip(&rhs.planes) {
            *dst += src;
        }
    }
}

impl SubAssign<&PixelBuffer> for PixelBuffer {
    fn sub_assign(&mut self, rhs: &PixelBuffer) {
        self.assert_compatible(rhs);
        for (dst, src) in self.planes.iter_mut().zip(&rhs.planes) {
            *dst -= src;
        }
    }
}

impl MulAssign<f32> for PixelBuffer {
    fn mul_assign(&mut self, rhs: f32) {
        for plane in &mut self.planes {
            plane.mapv_inplace(|v| v * rhs);
        }
    }
}

impl DivAssign<f32> for PixelBuffer {
    fn div_assign(&mut self, rhs: f32) {
        for plane in &mut self.planes {
            plane.mapv_inplace(|v| v / rhs);
        }
    }
}

impl AddAssign<f32> for PixelBuffer {
    fn add_assign(&mut self, rhs: f32) {
        for plane in &mut self.planes {
            plane.mapv_inplace(|v| v + rhs);
        }
    }
}

impl SubAssign<f32> for PixelBuffer {
    fn sub_assign(&mut self, rhs: f32) {
        for plane in &mut self.planes {
            plane.mapv_inplace(|v| v - rhs);
        }
    }
}

/// Integer pixel region. The origin may be negative (a region partly off the
/// image); `overlap` clips it to valid pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: i64, y: i64, width: usize, height: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn empty() -> Self {
        Self {
            x: 0,
            y: 0,
            width: 0,
            height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// A region of `width`x`height` centered in an image of the given size.
    pub fn centered(img_width: usize, img_height: usize, width: usize, height: usize) -> Self {
        Self {
            x: (img_width as i64 - width as i64) / 2,
            y: (img_height as i64 - height as i64) / 2,
            width,
            height,
        }
    }

    /// Clip to the pixel range of an `img_width`x`img_height` image.
    /// `None` means no usable region survives.
    pub fn overlap(&self, img_width: usize, img_height: usize) -> Option<Rect> {
        if self.is_empty() {
            return None;
        }
        let x0 = self.x.max(0);
        let y0 = self.y.max(0);
        let x1 = (self.x + self.width as i64).min(img_width as i64);
        let y1 = (self.y + self.height as i64).min(img_height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(Rect {
            x: x0,
            y: y0,
            width: (x1 - x0) as usize,
            height: (y1 - y0) as usize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_clips_to_bounds() {
        let r = Rect::new(-10, -10, 50, 50);
        let clipped = r.overlap(100, 100).unwrap();
        assert_eq!(clipped, Rect::new(0, 0, 40, 40));
    }

    #[test]
    fn overlap_outside_is_none() {
        assert!(Rect::new(200, 0, 10, 10).overlap(100, 100).is_none());
        assert!(Rect::empty().overlap(100, 100).is_none());
    }

    #[test]
    #[should_panic(expected = "incompatible buffers")]
    fn add_assign_requires_compatible_buffers() {
        let mut a = PixelBuffer::zeros(4, 4, 1);
        let b = PixelBuffer::zeros(5, 4, 1);
        a += &b;
    }
}
