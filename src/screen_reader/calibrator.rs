//! Per-tick calibration of the playable band ("real area")

use super::color_scanner::{find_vertical_extent, DARK_COLOR};
use super::screen_service::{CaptureRegion, PixelBuffer};

/// Tightens the coarse capture region to the band bounded by the bar's
/// endpoints horizontally and by the dark band borders vertically.
///
/// `left` and `right` are buffer-local columns of the bar endpoints found on
/// the same row. Returns `None` when no dark row exists inside that slice.
pub fn calibrate_real_area(
    frame: &PixelBuffer,
    coarse: CaptureRegion,
    left: u32,
    right: u32,
) -> Option<CaptureRegion> {
    if right < left || right >= frame.width() {
        return None;
    }
    let width = right - left + 1;
    let slice = frame.crop(left, 0, width, frame.height());
    let extent = find_vertical_extent(&slice, DARK_COLOR)?;

    let (x, y) = coarse.to_screen(left, extent.top);
    CaptureRegion::new(x, y, width, extent.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_calibrate_uses_slice_only() {
        let mut img = RgbImage::from_pixel(30, 40, Rgb([0, 0, 0]));
        // dark pixels outside the slice must be ignored
        img.put_pixel(1, 2, DARK_COLOR);
        img.put_pixel(12, 8, DARK_COLOR);
        img.put_pixel(15, 30, DARK_COLOR);
        let frame = PixelBuffer::new(img);
        let coarse = CaptureRegion::new(100, 200, 30, 40).unwrap();

        let real = calibrate_real_area(&frame, coarse, 10, 19).unwrap();
        assert_eq!(real, CaptureRegion::new(110, 208, 10, 23).unwrap());
    }

    #[test]
    fn test_calibrate_unresolved_without_dark() {
        let frame = PixelBuffer::new(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        let coarse = CaptureRegion::new(0, 0, 10, 10).unwrap();
        assert_eq!(calibrate_real_area(&frame, coarse, 2, 6), None);
        assert_eq!(calibrate_real_area(&frame, coarse, 6, 2), None);
    }
}
