//! Screen capture service

use anyhow::{Context, Result};
use image::{DynamicImage, RgbImage, RgbaImage};
use screenshots::Screen;
use serde::{Deserialize, Serialize};

/// Rectangle in screen pixel coordinates. Width and height are never zero
/// for a region built through [`CaptureRegion::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        (width > 0 && height > 0).then_some(Self { x, y, width, height })
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Screen coordinates of a buffer-local pixel
    pub fn to_screen(&self, local_x: u32, local_y: u32) -> (i32, i32) {
        (self.x + local_x as i32, self.y + local_y as i32)
    }
}

/// RGB pixels of one captured region
#[derive(Debug, Clone)]
pub struct PixelBuffer {
    image: RgbImage,
}

impl PixelBuffer {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Drop the alpha channel of a captured frame
    pub fn from_rgba(image: RgbaImage) -> Self {
        Self::new(DynamicImage::ImageRgba8(image).to_rgb8())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Packed RGB bytes of row `y`
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.image.width() as usize * 3;
        let start = y as usize * stride;
        &self.image.as_raw()[start..start + stride]
    }

    /// Copy of a sub-rectangle, clamped to the buffer bounds
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> PixelBuffer {
        Self::new(image::imageops::crop_imm(&self.image, x, y, width, height).to_image())
    }
}

/// Anything that can grab a screen region on demand
pub trait FrameSource {
    fn grab(&mut self, region: CaptureRegion) -> Result<PixelBuffer>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn grab(&mut self, region: CaptureRegion) -> Result<PixelBuffer> {
        (**self).grab(region)
    }
}

/// Captures from the monitor that contains the region's top-left corner
#[derive(Debug, Default)]
pub struct ScreenService;

impl ScreenService {
    pub fn new() -> Self {
        Self
    }

    fn capture(&self, region: CaptureRegion) -> Result<PixelBuffer> {
        if !region.is_valid() {
            anyhow::bail!("Invalid capture region {:?}", region);
        }

        let screen = Screen::from_point(region.x, region.y)
            .with_context(|| format!("No screen contains ({}, {})", region.x, region.y))?;
        let info = screen.display_info;

        let image = screen
            .capture_area(region.x - info.x, region.y - info.y, region.width, region.height)
            .context("Failed to capture area")?;

        // Rebuild through raw bytes so the buffer type comes from our image crate
        let rgba_image = RgbaImage::from_raw(image.width(), image.height(), image.to_vec())
            .context("Failed to create image from raw data")?;

        Ok(PixelBuffer::from_rgba(rgba_image))
    }
}

impl FrameSource for ScreenService {
    fn grab(&mut self, region: CaptureRegion) -> Result<PixelBuffer> {
        self.capture(region)
    }
}
