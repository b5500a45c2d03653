//! The perception-to-actuation loop and its cast/detect/loss state machine

use std::time::{Duration, Instant};

use crate::fish::controller::{PdController, PdGains};
use crate::fish::purchase::PurchaseSequencer;
use crate::input::{ActuationDriver, InputBackend};
use crate::screen_reader::calibrator::calibrate_real_area;
use crate::screen_reader::color_scanner::{
    extract_runs, find_first, find_in_row, find_vertical_extent, largest_section, DARK_COLOR,
    TARGET_COLOR, WHITE_COLOR,
};
use crate::screen_reader::{AppConfig, CaptureRegion, FrameSource, ScanOrder};
use crate::utils::bot_state::{LoopEvents, LoopState, SharedFlag};
use crate::utils::clock::{secs, Clock};

/// Sleep between ticks
pub const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Per-activation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSettings {
    pub region: CaptureRegion,
    pub gains: PdGains,
    pub scan_timeout: Duration,
    pub wait_after_loss: Duration,
}

impl LoopSettings {
    pub fn from_config(config: &AppConfig, region: CaptureRegion) -> Self {
        Self {
            region,
            gains: PdGains {
                kp: config.kp,
                kd: config.kd,
            },
            scan_timeout: secs(config.scan_timeout),
            wait_after_loss: secs(config.wait_after_loss),
        }
    }
}

/// Everything the worker mutates between ticks
#[derive(Debug, Clone)]
pub struct LoopRuntimeState {
    pub phase: LoopState,
    pub cast_time: Instant,
    /// The bar was seen at least once since the last cast
    pub detected_since_cast: bool,
    pub controller: PdController,
    pub purchase_counter: u32,
}

impl LoopRuntimeState {
    pub fn new(now: Instant) -> Self {
        Self {
            phase: LoopState::Casting,
            cast_time: now,
            detected_since_cast: false,
            controller: PdController::new(),
            purchase_counter: 0,
        }
    }
}

/// Why a tick ended without touching the actuator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    CaptureFailed,
    NoRightBound,
    BandUnresolved,
    MarkersMissing,
}

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Tracked {
        output: f64,
        holding: bool,
        new_catch: bool,
    },
    Skipped(SkipReason),
    /// Nothing on screen, still within the scan timeout
    Waiting,
    /// Nothing seen since the cast for longer than the scan timeout
    Recast,
    /// Lost a tracked fish, ran the purchase check and recast
    Lost,
    Stopped,
}

pub struct FishingLoop<F, B, C, E> {
    frames: F,
    driver: ActuationDriver<B>,
    clock: C,
    events: E,
    purchase: PurchaseSequencer,
    settings: LoopSettings,
    active: SharedFlag,
}

impl<F, B, C, E> FishingLoop<F, B, C, E>
where
    F: FrameSource,
    B: InputBackend,
    C: Clock,
    E: LoopEvents,
{
    pub fn new(
        frames: F,
        backend: B,
        clock: C,
        events: E,
        purchase: PurchaseSequencer,
        settings: LoopSettings,
        active: SharedFlag,
    ) -> Self {
        Self {
            frames,
            driver: ActuationDriver::new(backend),
            clock,
            events,
            purchase,
            settings,
            active,
        }
    }

    pub fn driver(&self) -> &ActuationDriver<B> {
        &self.driver
    }

    /// Run until the liveness flag is cleared
    pub fn run(&mut self) {
        tracing::info!("[LOOP] Main loop started, region {:?}", self.settings.region);
        let mut state = self.start();
        while self.active.is_set() {
            let outcome = self.tick(&mut state);
            tracing::trace!("[LOOP] tick -> {:?}", outcome);
        }
        self.shutdown(&mut state);
        tracing::info!("[LOOP] Main loop stopped");
    }

    /// Activation: optional purchase, then the first cast
    pub fn start(&mut self) -> LoopRuntimeState {
        let mut state = LoopRuntimeState::new(self.clock.now());
        self.events.on_state_change(LoopState::Casting);

        if self.purchase.is_enabled() {
            self.purchase
                .run(&mut self.driver, &self.clock, &self.active, &self.events);
        }
        if self.active.is_set() {
            self.cast(&mut state);
        }
        state
    }

    /// Release the button and clear controller history
    pub fn shutdown(&mut self, state: &mut LoopRuntimeState) {
        self.driver.release();
        state.controller.reset();
        self.set_phase(state, LoopState::Idle);
    }

    pub fn tick(&mut self, state: &mut LoopRuntimeState) -> TickOutcome {
        if !self.active.is_set() {
            return TickOutcome::Stopped;
        }

        let region = self.settings.region;
        let frame = match self.frames.grab(region) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("[LOOP] Capture failed: {:#}", e);
                return self.pause(TickOutcome::Skipped(SkipReason::CaptureFailed));
            }
        };

        let Some((left, row)) = find_first(&frame, TARGET_COLOR, ScanOrder::Forward) else {
            return self.no_detect(state);
        };
        state.detected_since_cast = true;

        let Some(right) = find_in_row(&frame, row, TARGET_COLOR, ScanOrder::Reverse) else {
            return self.pause(TickOutcome::Skipped(SkipReason::NoRightBound));
        };
        let Some(real_area) = calibrate_real_area(&frame, region, left, right) else {
            return self.pause(TickOutcome::Skipped(SkipReason::BandUnresolved));
        };
        drop(frame);

        if !self.active.is_set() {
            return TickOutcome::Stopped;
        }
        let band = match self.frames.grab(real_area) {
            Ok(band) => band,
            Err(e) => {
                tracing::warn!("[LOOP] Band capture failed: {:#}", e);
                return self.pause(TickOutcome::Skipped(SkipReason::CaptureFailed));
            }
        };

        let white = find_vertical_extent(&band, WHITE_COLOR);
        let sections = white
            .map(|w| extract_runs(&band, DARK_COLOR, w.height() * 2))
            .unwrap_or_default();
        let (Some(white), Some(marker)) = (white, largest_section(&sections)) else {
            return self.pause(TickOutcome::Skipped(SkipReason::MarkersMissing));
        };

        let new_catch = state.phase != LoopState::Detecting;
        if new_catch {
            tracing::info!("[LOOP] Fish on the line");
            self.events.on_fish_caught();
        }
        self.set_phase(state, LoopState::Detecting);

        tracing::trace!(
            "[LOOP] white top y={}, marker middle y={}",
            real_area.y + white.top as i32,
            real_area.y + marker.middle_y as i32
        );
        let output = state.controller.step(
            i64::from(marker.middle_y),
            i64::from(white.top),
            real_area.height,
            self.settings.gains,
        );
        self.driver.apply(output);

        self.pause(TickOutcome::Tracked {
            output,
            holding: self.driver.is_holding(),
            new_catch,
        })
    }

    /// Bar not on screen: scan timeout first, then loss recovery
    fn no_detect(&mut self, state: &mut LoopRuntimeState) -> TickOutcome {
        let elapsed = self.clock.now().saturating_duration_since(state.cast_time);
        if !state.detected_since_cast && elapsed > self.settings.scan_timeout {
            tracing::info!(
                "[LOOP] Cast timeout after {:.1}s, recasting...",
                self.settings.scan_timeout.as_secs_f64()
            );
            self.cast(state);
            return self.pause(TickOutcome::Recast);
        }

        if state.phase == LoopState::Detecting {
            tracing::info!("[LOOP] Lost detection, waiting...");
            self.set_phase(state, LoopState::Lost);
            self.clock.sleep(self.settings.wait_after_loss);
            if !self.active.is_set() {
                return TickOutcome::Stopped;
            }

            self.purchase.check_and_purchase(
                &mut state.purchase_counter,
                &mut self.driver,
                &self.clock,
                &self.active,
                &self.events,
            );
            if !self.active.is_set() {
                return TickOutcome::Stopped;
            }

            self.cast(state);
            return self.pause(TickOutcome::Lost);
        }

        self.pause(TickOutcome::Waiting)
    }

    fn cast(&mut self, state: &mut LoopRuntimeState) {
        self.set_phase(state, LoopState::Casting);
        self.driver.cast(&self.clock);
        state.cast_time = self.clock.now();
        state.detected_since_cast = false;
    }

    fn set_phase(&self, state: &mut LoopRuntimeState, phase: LoopState) {
        if state.phase != phase {
            tracing::debug!("[LOOP] {:?} -> {:?}", state.phase, phase);
            state.phase = phase;
            self.events.on_state_change(phase);
        }
    }

    fn pause(&self, outcome: TickOutcome) -> TickOutcome {
        self.clock.sleep(TICK_INTERVAL);
        outcome
    }
}
