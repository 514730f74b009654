use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb};
use ndarray::Array2;

use crate::buffer::PixelBuffer;
use crate::error::Result;

use super::{FrameLoader, FrameWriter};

/// `image`-crate backed loader: one decoded frame per file, mono files as
/// depth-1 buffers, everything else as RGB. Samples are scaled to [0, 1].
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileLoader;

impl FrameLoader for ImageFileLoader {
    fn load(&self, path: &Path) -> Result<Vec<PixelBuffer>> {
        let img = image::open(path)?;
        Ok(vec![decode(img)])
    }
}

fn decode(img: DynamicImage) -> PixelBuffer {
    match img {
        DynamicImage::ImageLuma8(gray) => {
            let (w, h) = gray.dimensions();
            let mut plane = Array2::<f32>::zeros((h as usize, w as usize));
            for (x, y, Luma([v])) in gray.enumerate_pixels() {
                plane[[y as usize, x as usize]] = *v as f32 / 255.0;
            }
            PixelBuffer::from_plane(plane)
        }
        DynamicImage::ImageLuma16(gray) => {
            let (w, h) = gray.dimensions();
            let mut plane = Array2::<f32>::zeros((h as usize, w as usize));
            for (x, y, Luma([v])) in gray.enumerate_pixels() {
                plane[[y as usize, x as usize]] = *v as f32 / 65535.0;
            }
            PixelBuffer::from_plane(plane)
        }
        other => {
            let rgb = other.to_rgb16();
            let (w, h) = rgb.dimensions();
            let mut planes: Vec<Array2<f32>> = (0..3)
                .map(|_| Array2::zeros((h as usize, w as usize)))
                .collect();
            for (x, y, Rgb(p)) in rgb.enumerate_pixels() {
                for (channel, plane) in planes.iter_mut().enumerate() {
                    plane[[y as usize, x as usize]] = p[channel] as f32 / 65535.0;
                }
            }
            PixelBuffer::from_planes(planes)
        }
    }
}

/// `image`-crate backed writer. PNG is written 8-bit, TIFF (and anything
/// unrecognized) 16-bit; samples are clamped to [0, 1] on encode.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageFileWriter;

impl FrameWriter for ImageFileWriter {
    fn write(&self, path: &Path, buffer: &PixelBuffer) -> Result<()> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("png") => save_png(buffer, path),
            _ => save_tiff(buffer, path),
        }
    }
}

/// Save as 16-bit TIFF (grayscale or RGB by buffer depth).
pub fn save_tiff(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let w = buffer.width();
    let h = buffer.height();

    if buffer.depth() >= 3 {
        let mut pixels: Vec<u16> = Vec::with_capacity(h * w * 3);
        for row in 0..h {
            for col in 0..w {
                for channel in 0..3 {
                    pixels.push(encode16(buffer.get(col, row, channel)));
                }
            }
        }
        let img = image::ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
            .expect("buffer size matches dimensions");
        img.save(path)?;
    } else {
        let mut pixels: Vec<u16> = Vec::with_capacity(h * w);
        for row in 0..h {
            for col in 0..w {
                pixels.push(encode16(buffer.get(col, row, 0)));
            }
        }
        let img = image::ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(w as u32, h as u32, pixels)
            .expect("buffer size matches dimensions");
        img.save(path)?;
    }
    Ok(())
}

/// Save as 8-bit PNG (grayscale or RGB by buffer depth).
pub fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let w = buffer.width();
    let h = buffer.height();

    if buffer.depth() >= 3 {
        let mut img = image::RgbImage::new(w as u32, h as u32);
        for row in 0..h {
            for col in 0..w {
                let px = Rgb([
                    encode8(buffer.get(col, row, 0)),
                    encode8(buffer.get(col, row, 1)),
                    encode8(buffer.get(col, row, 2)),
                ]);
                img.put_pixel(col as u32, row as u32, px);
            }
        }
        img.save_with_format(path, ImageFormat::Png)?;
    } else {
        let mut img = GrayImage::new(w as u32, h as u32);
        for row in 0..h {
            for col in 0..w {
                img.put_pixel(col as u32, row as u32, Luma([encode8(buffer.get(col, row, 0))]));
            }
        }
        img.save_with_format(path, ImageFormat::Png)?;
    }
    Ok(())
}

fn encode16(v: f32) -> u16 {
    (v.clamp(0.0, 1.0) * 65535.0) as u16
}

fn encode8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}
