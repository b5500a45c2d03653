//! Exact-color scans over captured frames
//!
//! Every scan compares full RGB triples for equality; there is no tolerance.
//! Scan orders are part of the contract because the first match wins.

use image::Rgb;

use super::screen_service::PixelBuffer;

/// Endpoints of the minigame bar
pub const TARGET_COLOR: Rgb<u8> = Rgb([85, 170, 255]);
/// Band borders and the fish marker
pub const DARK_COLOR: Rgb<u8> = Rgb([25, 25, 25]);
/// Reference marker inside the band
pub const WHITE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// Horizontal direction used within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrder {
    /// Left to right
    Forward,
    /// Right to left
    Reverse,
}

/// First and last rows containing a color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerticalExtent {
    pub top: u32,
    pub bottom: u32,
}

impl VerticalExtent {
    pub fn height(&self) -> u32 {
        self.bottom - self.top + 1
    }
}

/// Gap-tolerant vertical run of a color, in buffer-local rows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DarkSection {
    pub start_y: u32,
    pub end_y: u32,
    pub middle_y: u32,
    pub size: u32,
}

impl DarkSection {
    fn new(start_y: u32, end_y: u32) -> Self {
        Self {
            start_y,
            end_y,
            middle_y: (start_y + end_y) / 2,
            size: end_y - start_y + 1,
        }
    }
}

fn is_color(pixel: &[u8], color: Rgb<u8>) -> bool {
    pixel == color.0.as_slice()
}

fn row_has(buffer: &PixelBuffer, y: u32, color: Rgb<u8>) -> bool {
    buffer.row(y).chunks_exact(3).any(|p| is_color(p, color))
}

/// Column of the first `color` pixel on row `y` in the given order
pub fn find_in_row(buffer: &PixelBuffer, y: u32, color: Rgb<u8>, order: ScanOrder) -> Option<u32> {
    if y >= buffer.height() {
        return None;
    }
    let mut pixels = buffer.row(y).chunks_exact(3);
    let col = match order {
        ScanOrder::Forward => pixels.position(|p| is_color(p, color)),
        ScanOrder::Reverse => pixels.rposition(|p| is_color(p, color)),
    };
    col.map(|c| c as u32)
}

/// First `color` pixel scanning rows top-down, `order` within each row.
/// Returns buffer-local `(x, y)`.
pub fn find_first(buffer: &PixelBuffer, color: Rgb<u8>, order: ScanOrder) -> Option<(u32, u32)> {
    (0..buffer.height()).find_map(|y| find_in_row(buffer, y, color, order).map(|x| (x, y)))
}

/// First row containing `color` from the top and from the bottom
pub fn find_vertical_extent(buffer: &PixelBuffer, color: Rgb<u8>) -> Option<VerticalExtent> {
    let top = (0..buffer.height()).find(|&y| row_has(buffer, y, color))?;
    let bottom = (0..buffer.height()).rev().find(|&y| row_has(buffer, y, color))?;
    Some(VerticalExtent { top, bottom })
}

/// Vertical runs of rows containing `color`.
///
/// A run survives up to `max_gap` consecutive rows without the color and is
/// closed on the row that pushes the gap past `max_gap`. The closed run ends on
/// the last row that had the color.
pub fn extract_runs(buffer: &PixelBuffer, color: Rgb<u8>, max_gap: u32) -> Vec<DarkSection> {
    let mut sections = Vec::new();
    let mut current_start: Option<u32> = None;
    let mut gap = 0u32;

    for y in 0..buffer.height() {
        if row_has(buffer, y, color) {
            gap = 0;
            current_start.get_or_insert(y);
        } else if let Some(start) = current_start {
            gap += 1;
            if gap > max_gap {
                sections.push(DarkSection::new(start, y - gap));
                current_start = None;
                gap = 0;
            }
        }
    }

    if let Some(start) = current_start {
        sections.push(DarkSection::new(start, buffer.height() - 1 - gap));
    }

    sections
}

/// Largest section; the earliest one wins a tie
pub fn largest_section(sections: &[DarkSection]) -> Option<DarkSection> {
    sections.iter().copied().fold(None, |best, s| match best {
        Some(b) if b.size >= s.size => Some(b),
        _ => Some(s),
    })
}
