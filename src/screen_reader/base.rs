//! Settings consumed by the fishing loop

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::screen_service::CaptureRegion;
use crate::error::ConfigError;
use crate::utils::keybinds::{resolve_key, Hotkeys};
use crate::window::dpi_scale;

/// Overlay size at 100% scaling
const BASE_OVERLAY_WIDTH: f64 = 172.0;
const BASE_OVERLAY_HEIGHT: f64 = 495.0;
const BASE_OVERLAY_OFFSET: f64 = 100.0;

/// Screen coordinate, stored as `[x, y]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

/// Purchase click targets 1..=4
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Option<[i32; 2]>>", into = "BTreeMap<String, Option<[i32; 2]>>")]
pub struct PurchasePoints([Option<ScreenPoint>; 4]);

impl PurchasePoints {
    pub fn get(&self, index: u8) -> Option<ScreenPoint> {
        match index {
            1..=4 => self.0[usize::from(index - 1)],
            _ => None,
        }
    }

    pub fn set(&mut self, index: u8, point: Option<ScreenPoint>) {
        if let 1..=4 = index {
            self.0[usize::from(index - 1)] = point;
        }
    }

    /// Indices of points that are not configured
    pub fn missing(&self) -> Vec<u8> {
        (1..=4).filter(|&i| self.get(i).is_none()).collect()
    }
}

impl TryFrom<BTreeMap<String, Option<[i32; 2]>>> for PurchasePoints {
    type Error = String;

    fn try_from(map: BTreeMap<String, Option<[i32; 2]>>) -> Result<Self, Self::Error> {
        let mut points = PurchasePoints::default();
        for (key, value) in map {
            let index: u8 = key
                .parse()
                .ok()
                .filter(|i| (1..=4).contains(i))
                .ok_or_else(|| format!("point index must be 1-4, got '{}'", key))?;
            points.set(index, value.map(|[x, y]| ScreenPoint { x, y }));
        }
        Ok(points)
    }
}

impl From<PurchasePoints> for BTreeMap<String, Option<[i32; 2]>> {
    fn from(points: PurchasePoints) -> Self {
        (1..=4u8)
            .map(|i| (i.to_string(), points.get(i).map(|p| [p.x, p.y])))
            .collect()
    }
}

/// Settings structure, every field optional in the file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub overlay_area: CaptureRegion,
    pub kp: f64,
    pub kd: f64,
    pub scan_timeout: f64,
    pub wait_after_loss: f64,
    pub auto_purchase_enabled: bool,
    pub auto_purchase_amount: u32,
    pub loops_per_purchase: u32,
    pub point_coords: PurchasePoints,
    pub purchase_key: String,
    pub purchase_delay_after_key: f64,
    pub purchase_click_delay: f64,
    pub purchase_after_type_delay: f64,
    pub hotkeys: Hotkeys,
}

impl Default for AppConfig {
    fn default() -> Self {
        let scale = dpi_scale();
        Self {
            overlay_area: CaptureRegion {
                x: (BASE_OVERLAY_OFFSET * scale) as i32,
                y: (BASE_OVERLAY_OFFSET * scale) as i32,
                width: (BASE_OVERLAY_WIDTH * scale) as u32,
                height: (BASE_OVERLAY_HEIGHT * scale) as u32,
            },
            kp: 0.1,
            kd: 0.5,
            scan_timeout: 15.0,
            wait_after_loss: 1.0,
            auto_purchase_enabled: false,
            auto_purchase_amount: 10,
            loops_per_purchase: 10,
            point_coords: PurchasePoints::default(),
            purchase_key: "e".to_string(),
            purchase_delay_after_key: 2.0,
            purchase_click_delay: 1.0,
            purchase_after_type_delay: 1.0,
            hotkeys: Hotkeys::default(),
        }
    }
}

impl AppConfig {
    /// Load and validate a settings file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load settings, falling back to defaults when the file is missing or bad
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("[CONFIG] No settings at {:?}, using defaults", path);
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                tracing::info!("[CONFIG] Loaded settings from {:?}", path);
                config
            }
            Err(e) => {
                tracing::warn!("[CONFIG] {}; using defaults", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.overlay_area.is_valid() {
            return Err(ConfigError::Invalid {
                field: "overlay_area",
                reason: "width and height must be greater than 0".to_string(),
            });
        }
        for (field, value) in [("kp", self.kp), ("kd", self.kd)] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a finite number, got {}", value),
                });
            }
        }
        for (field, value) in [
            ("scan_timeout", self.scan_timeout),
            ("wait_after_loss", self.wait_after_loss),
            ("purchase_delay_after_key", self.purchase_delay_after_key),
            ("purchase_click_delay", self.purchase_click_delay),
            ("purchase_after_type_delay", self.purchase_after_type_delay),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number of seconds, got {}", value),
                });
            }
        }
        if self.loops_per_purchase == 0 {
            return Err(ConfigError::Invalid {
                field: "loops_per_purchase",
                reason: "must be at least 1".to_string(),
            });
        }
        if resolve_key(&self.purchase_key).is_none() {
            return Err(ConfigError::Invalid {
                field: "purchase_key",
                reason: format!("unknown key '{}'", self.purchase_key),
            });
        }
        Ok(())
    }
}
