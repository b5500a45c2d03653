//! Shared bot state for communication between the hotkey thread and the fishing worker

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use crate::screen_reader::CaptureRegion;

/// Cross-thread boolean with acquire/release ordering.
///
/// The loop's liveness flag is the only state written by the controlling
/// thread and read by the worker.
#[derive(Debug, Clone, Default)]
pub struct SharedFlag(Arc<AtomicBool>);

impl SharedFlag {
    pub fn new(value: bool) -> Self {
        Self(Arc::new(AtomicBool::new(value)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fishing loop phase
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Default)]
pub enum LoopState {
    /// Not running
    #[default]
    Idle,
    Casting,
    Detecting,
    Lost,
}

impl LoopState {
    /// Get human-readable description of the phase
    pub fn description(&self) -> &'static str {
        match self {
            LoopState::Idle => "Idle",
            LoopState::Casting => "Casting line, waiting for a bite...",
            LoopState::Detecting => "Tracking fish",
            LoopState::Lost => "Fish lost, recasting...",
        }
    }
}

/// Notifications the fishing worker sends outward
pub trait LoopEvents {
    fn on_state_change(&self, _state: LoopState) {}
    fn on_fish_caught(&self);
    fn on_purchase_completed(&self, amount: &str);
}

impl<T: LoopEvents + ?Sized> LoopEvents for Arc<T> {
    fn on_state_change(&self, state: LoopState) {
        (**self).on_state_change(state)
    }

    fn on_fish_caught(&self) {
        (**self).on_fish_caught()
    }

    fn on_purchase_completed(&self, amount: &str) {
        (**self).on_purchase_completed(amount)
    }
}

/// Session statistics shared with the status display
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStats {
    pub fish_caught: u32,
    pub purchases: u32,
    pub started_at: Option<DateTime<Utc>>,
}

/// State shared between the controlling thread and the worker
pub struct SharedBotState {
    active: SharedFlag,
    activity: RwLock<LoopState>,
    stats: RwLock<SessionStats>,
    detail_message: RwLock<String>,
    overlay: RwLock<CaptureRegion>,
}

impl SharedBotState {
    pub fn new(overlay: CaptureRegion) -> Self {
        Self {
            active: SharedFlag::new(false),
            activity: RwLock::new(LoopState::Idle),
            stats: RwLock::new(SessionStats::default()),
            detail_message: RwLock::new(String::new()),
            overlay: RwLock::new(overlay),
        }
    }

    /// Handle to the liveness flag, cloned into the worker
    pub fn active_flag(&self) -> SharedFlag {
        self.active.clone()
    }

    pub fn is_running(&self) -> bool {
        self.active.is_set()
    }

    pub fn get_activity(&self) -> LoopState {
        *self.activity.read()
    }

    pub fn set_activity(&self, activity: LoopState) {
        *self.activity.write() = activity;
    }

    pub fn get_detail_message(&self) -> String {
        self.detail_message.read().clone()
    }

    pub fn set_detail_message(&self, message: impl Into<String>) {
        *self.detail_message.write() = message.into();
    }

    pub fn get_stats(&self) -> SessionStats {
        self.stats.read().clone()
    }

    /// Reset stats for new session
    pub fn reset_stats(&self) {
        *self.stats.write() = SessionStats {
            started_at: Some(Utc::now()),
            ..SessionStats::default()
        };
    }

    /// Capture region for the next activation
    pub fn get_overlay_region(&self) -> CaptureRegion {
        *self.overlay.read()
    }

    pub fn set_overlay_region(&self, region: CaptureRegion) {
        *self.overlay.write() = region;
    }

    /// Get status as JSON string for display
    pub fn to_json(&self) -> String {
        let stats = self.get_stats();
        serde_json::json!({
            "running": self.is_running(),
            "activity": self.get_activity().description(),
            "detail": self.get_detail_message(),
            "stats": {
                "fish": stats.fish_caught,
                "purchases": stats.purchases,
                "started_at": stats.started_at.map(|t| t.to_rfc3339()),
            }
        })
        .to_string()
    }
}

impl LoopEvents for SharedBotState {
    fn on_state_change(&self, state: LoopState) {
        self.set_activity(state);
    }

    fn on_fish_caught(&self) {
        let count = {
            let mut stats = self.stats.write();
            stats.fish_caught += 1;
            stats.fish_caught
        };
        tracing::info!("[STATS] Fish caught: {}", count);
        self.set_detail_message(format!("Fish: {}", count));
    }

    fn on_purchase_completed(&self, amount: &str) {
        self.stats.write().purchases += 1;
        tracing::info!("[STATS] Auto purchase completed ({} bait)", amount);
        self.set_detail_message(format!("Purchased {} bait", amount));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> CaptureRegion {
        CaptureRegion::new(0, 0, 10, 10).unwrap()
    }

    #[test]
    fn test_shared_flag_visible_across_clones() {
        let flag = SharedFlag::new(false);
        let other = flag.clone();
        flag.set();
        assert!(other.is_set());
        other.clear();
        assert!(!flag.is_set());
    }

    #[test]
    fn test_fish_counter_and_reset() {
        let state = SharedBotState::new(region());
        state.on_fish_caught();
        state.on_fish_caught();
        state.on_purchase_completed("10");
        let stats = state.get_stats();
        assert_eq!(stats.fish_caught, 2);
        assert_eq!(stats.purchases, 1);

        state.reset_stats();
        let stats = state.get_stats();
        assert_eq!(stats.fish_caught, 0);
        assert!(stats.started_at.is_some());
    }

    #[test]
    fn test_status_json() {
        let state = SharedBotState::new(region());
        state.on_state_change(LoopState::Detecting);
        let json: serde_json::Value = serde_json::from_str(&state.to_json()).unwrap();
        assert_eq!(json["running"], false);
        assert_eq!(json["activity"], "Tracking fish");
        assert_eq!(json["stats"]["fish"], 0);
    }
}
