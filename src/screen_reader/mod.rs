//! Screen reader module: capture, color scans and band calibration

pub mod base;
pub mod calibrator;
pub mod color_scanner;
pub mod screen_service;

pub use base::{AppConfig, PurchasePoints, ScreenPoint};
pub use calibrator::calibrate_real_area;
pub use color_scanner::{DarkSection, ScanOrder, VerticalExtent};
pub use screen_service::{CaptureRegion, FrameSource, PixelBuffer, ScreenService};
