//! Delegated raster crop.
//!
//! The engine never touches pixels itself. At commit time it hands a
//! [`PixelRect`] to whatever owns the image data through [`RasterCrop`].

use crate::error::{EngineError, EngineResult};
use crate::resolve::{CropDescriptor, PixelRect};
use image::{imageops, DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};

/// A raster that can produce a cropped copy of itself.
pub trait RasterCrop {
    type Output;

    /// Pixel dimensions as `(width, height)`.
    fn dimensions(&self) -> (u32, u32);

    /// Copy out `rect`. The rectangle must lie inside the raster.
    fn crop(&self, rect: PixelRect) -> EngineResult<Self::Output>;
}

fn check_rect(rect: PixelRect, width: u32, height: u32) -> EngineResult<()> {
    let fits_x = rect.x.checked_add(rect.width).is_some_and(|r| r <= width);
    let fits_y = rect.y.checked_add(rect.height).is_some_and(|b| b <= height);
    if rect.width == 0 || rect.height == 0 || !fits_x || !fits_y {
        return Err(EngineError::Raster(format!(
            "{}x{} at ({}, {}) outside {width}x{height} raster",
            rect.width, rect.height, rect.x, rect.y
        )));
    }
    Ok(())
}

impl RasterCrop for RgbImage {
    type Output = RgbImage;

    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn crop(&self, rect: PixelRect) -> EngineResult<RgbImage> {
        check_rect(rect, self.width(), self.height())?;
        Ok(imageops::crop_imm(self, rect.x, rect.y, rect.width, rect.height).to_image())
    }
}

impl RasterCrop for DynamicImage {
    type Output = DynamicImage;

    fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn crop(&self, rect: PixelRect) -> EngineResult<DynamicImage> {
        check_rect(rect, self.width(), self.height())?;
        Ok(self.crop_imm(rect.x, rect.y, rect.width, rect.height))
    }
}

/// Packed RGB pixel data as handed over from JavaScript.
///
/// Pixel data is stored in row-major order, 3 bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RgbPixels {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl RgbPixels {
    /// Wrap a pixel buffer, checking that its length matches the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> EngineResult<Self> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || pixels.len() != expected {
            return Err(EngineError::Raster(format!(
                "{} bytes do not describe a {width}x{height} RGB image",
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

impl RasterCrop for RgbPixels {
    type Output = RgbPixels;

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn crop(&self, rect: PixelRect) -> EngineResult<RgbPixels> {
        check_rect(rect, self.width, self.height)?;
        let row_bytes = self.width as usize * 3;
        let out_row_bytes = rect.width as usize * 3;
        let mut pixels = Vec::with_capacity(out_row_bytes * rect.height as usize);

        for y in rect.y..rect.y + rect.height {
            let start = y as usize * row_bytes + rect.x as usize * 3;
            pixels.extend_from_slice(&self.pixels[start..start + out_row_bytes]);
        }

        Ok(RgbPixels {
            width: rect.width,
            height: rect.height,
            pixels,
        })
    }
}

/// Crop `raster` to the region recorded in `descriptor`.
///
/// The descriptor is rescaled when the raster's resolution differs from the
/// one it was resolved against, so a crop chosen on a preview applies to the
/// full-size original.
pub fn crop_to_descriptor<R: RasterCrop>(
    raster: &R,
    descriptor: &CropDescriptor,
) -> EngineResult<R::Output> {
    let (width, height) = raster.dimensions();
    let sx = width as f64 / descriptor.natural_width;
    let sy = height as f64 / descriptor.natural_height;
    let scaled = CropDescriptor {
        x: descriptor.x * sx,
        y: descriptor.y * sy,
        width: descriptor.width * sx,
        height: descriptor.height * sy,
        natural_width: width as f64,
        natural_height: height as f64,
        ..*descriptor
    };
    let rect = scaled.pixel_rect()?;
    tracing::debug!(?rect, "cropping raster");
    raster.crop(rect)
}
