//! Scripted bait purchase macro

use std::time::Duration;

use crate::input::{ActuationDriver, InputBackend};
use crate::screen_reader::{AppConfig, PurchasePoints};
use crate::utils::bot_state::{LoopEvents, SharedFlag};
use crate::utils::clock::{secs, Clock};

/// One action of the purchase script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStep {
    PressKey,
    Click(u8),
    TypeAmount,
    RightClick(u8),
}

/// Open the shop, pick the bait, enter the amount, confirm, close the menu
pub const PURCHASE_SEQUENCE: [PurchaseStep; 8] = [
    PurchaseStep::PressKey,
    PurchaseStep::Click(1),
    PurchaseStep::Click(2),
    PurchaseStep::TypeAmount,
    PurchaseStep::Click(1),
    PurchaseStep::Click(3),
    PurchaseStep::Click(2),
    PurchaseStep::RightClick(4),
];

/// Result of one purchase attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchaseOutcome {
    Completed,
    /// Nothing was done because these points are unset
    PointsMissing(Vec<u8>),
    /// The loop was stopped after `steps_done` steps
    Aborted { steps_done: usize },
}

/// Purchase-related settings, snapshotted at loop activation
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseSettings {
    pub enabled: bool,
    pub amount: String,
    pub loops_per_purchase: u32,
    pub key: String,
    pub points: PurchasePoints,
    pub delay_after_key: Duration,
    pub click_delay: Duration,
    pub after_type_delay: Duration,
}

impl From<&AppConfig> for PurchaseSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            enabled: config.auto_purchase_enabled,
            amount: config.auto_purchase_amount.to_string(),
            loops_per_purchase: config.loops_per_purchase,
            key: config.purchase_key.clone(),
            points: config.point_coords.clone(),
            delay_after_key: secs(config.purchase_delay_after_key),
            click_delay: secs(config.purchase_click_delay),
            after_type_delay: secs(config.purchase_after_type_delay),
        }
    }
}

pub struct PurchaseSequencer {
    settings: PurchaseSettings,
}

impl PurchaseSequencer {
    pub fn new(settings: PurchaseSettings) -> Self {
        Self { settings }
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn delay_after(&self, step: PurchaseStep) -> Duration {
        match step {
            PurchaseStep::PressKey => self.settings.delay_after_key,
            PurchaseStep::TypeAmount => self.settings.after_type_delay,
            PurchaseStep::Click(_) | PurchaseStep::RightClick(_) => self.settings.click_delay,
        }
    }

    /// Run the full script.
    ///
    /// Does nothing unless points 1-4 are all set. The liveness flag is checked
    /// before every step; clearing it stops the script where it is.
    pub fn run<B: InputBackend>(
        &self,
        driver: &mut ActuationDriver<B>,
        clock: &impl Clock,
        active: &SharedFlag,
        events: &impl LoopEvents,
    ) -> PurchaseOutcome {
        let missing = self.settings.points.missing();
        if !missing.is_empty() {
            tracing::warn!("[PURCHASE] Aborted: point(s) {:?} not set", missing);
            return PurchaseOutcome::PointsMissing(missing);
        }

        for (done, step) in PURCHASE_SEQUENCE.iter().copied().enumerate() {
            if !active.is_set() {
                tracing::info!("[PURCHASE] Aborted after {} step(s): loop stopped", done);
                return PurchaseOutcome::Aborted { steps_done: done };
            }
            self.perform(step, driver);
            clock.sleep(self.delay_after(step));
        }

        tracing::info!("[PURCHASE] Bought {} bait", self.settings.amount);
        events.on_purchase_completed(&self.settings.amount);
        PurchaseOutcome::Completed
    }

    fn perform<B: InputBackend>(&self, step: PurchaseStep, driver: &mut ActuationDriver<B>) {
        let points = &self.settings.points;
        match step {
            PurchaseStep::PressKey => {
                tracing::debug!("[PURCHASE] Pressing '{}'", self.settings.key);
                driver.press_key(&self.settings.key);
            }
            PurchaseStep::TypeAmount => {
                tracing::debug!("[PURCHASE] Typing amount {}", self.settings.amount);
                driver.type_text(&self.settings.amount);
            }
            PurchaseStep::Click(index) => {
                if let Some(point) = points.get(index) {
                    tracing::debug!("[PURCHASE] Clicking point {}: ({}, {})", index, point.x, point.y);
                    driver.click(point);
                }
            }
            PurchaseStep::RightClick(index) => {
                if let Some(point) = points.get(index) {
                    tracing::debug!("[PURCHASE] Right-clicking point {}: ({}, {})", index, point.x, point.y);
                    driver.right_click(point);
                }
            }
        }
    }

    /// Count one loss event and run the script every `loops_per_purchase`
    /// events. The counter resets once the script has fired.
    pub fn check_and_purchase<B: InputBackend>(
        &self,
        counter: &mut u32,
        driver: &mut ActuationDriver<B>,
        clock: &impl Clock,
        active: &SharedFlag,
        events: &impl LoopEvents,
    ) -> Option<PurchaseOutcome> {
        if !self.settings.enabled {
            return None;
        }
        *counter += 1;
        let needed = self.settings.loops_per_purchase.max(1);
        tracing::info!("[PURCHASE] Purchase counter: {}/{}", counter, needed);
        if *counter < needed {
            return None;
        }
        let outcome = self.run(driver, clock, active, events);
        *counter = 0;
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ActuationError;
    use crate::input::MouseButton;
    use crate::screen_reader::ScreenPoint;
    use std::cell::{Cell, RefCell};
    use std::time::Instant;

    #[derive(Default)]
    struct Recorder {
        actions: Vec<String>,
    }

    impl InputBackend for Recorder {
        fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), ActuationError> {
            self.actions.push(format!("move {} {}", x, y));
            Ok(())
        }
        fn nudge_cursor(&mut self) -> Result<(), ActuationError> {
            Ok(())
        }
        fn button_down(&mut self, button: MouseButton) -> Result<(), ActuationError> {
            self.actions.push(format!("down {:?}", button));
            Ok(())
        }
        fn button_up(&mut self, button: MouseButton) -> Result<(), ActuationError> {
            self.actions.push(format!("up {:?}", button));
            Ok(())
        }
        fn press_key(&mut self, key: &str) -> Result<(), ActuationError> {
            self.actions.push(format!("key {}", key));
            Ok(())
        }
        fn type_text(&mut self, text: &str) -> Result<(), ActuationError> {
            self.actions.push(format!("type {}", text));
            Ok(())
        }
        fn click_at(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), ActuationError> {
            self.actions.push(format!("click {:?} {} {}", button, x, y));
            Ok(())
        }
    }

    /// Sleeps advance a counter and may clear the flag after N sleeps
    struct TestClock<'a> {
        slept: Cell<Duration>,
        sleeps: Cell<usize>,
        stop_after: Option<(usize, &'a SharedFlag)>,
    }

    impl<'a> TestClock<'a> {
        fn new(stop_after: Option<(usize, &'a SharedFlag)>) -> Self {
            Self {
                slept: Cell::new(Duration::ZERO),
                sleeps: Cell::new(0),
                stop_after,
            }
        }
    }

    impl Clock for TestClock<'_> {
        fn now(&self) -> Instant {
            Instant::now()
        }
        fn sleep(&self, duration: Duration) {
            self.slept.set(self.slept.get() + duration);
            self.sleeps.set(self.sleeps.get() + 1);
            if let Some((n, flag)) = self.stop_after {
                if self.sleeps.get() == n {
                    flag.clear();
                }
            }
        }
    }

    #[derive(Default)]
    struct Events {
        purchases: RefCell<Vec<String>>,
    }

    impl LoopEvents for Events {
        fn on_fish_caught(&self) {}
        fn on_purchase_completed(&self, amount: &str) {
            self.purchases.borrow_mut().push(amount.to_string());
        }
    }

    fn settings(points: &[(u8, i32, i32)]) -> PurchaseSettings {
        let mut config = AppConfig {
            auto_purchase_enabled: true,
            auto_purchase_amount: 25,
            loops_per_purchase: 3,
            ..AppConfig::default()
        };
        for &(i, x, y) in points {
            config.point_coords.set(i, Some(ScreenPoint { x, y }));
        }
        PurchaseSettings::from(&config)
    }

    const ALL_POINTS: [(u8, i32, i32); 4] = [(1, 10, 11), (2, 20, 21), (3, 30, 31), (4, 40, 41)];

    #[test]
    fn test_full_sequence_order_and_delays() {
        let sequencer = PurchaseSequencer::new(settings(&ALL_POINTS));
        let mut driver = ActuationDriver::new(Recorder::default());
        let active = SharedFlag::new(true);
        let clock = TestClock::new(None);
        let events = Events::default();

        let outcome = sequencer.run(&mut driver, &clock, &active, &events);

        assert_eq!(outcome, PurchaseOutcome::Completed);
        assert_eq!(
            driver.backend().actions,
            vec![
                "key e",
                "click Left 10 11",
                "click Left 20 21",
                "type 25",
                "click Left 10 11",
                "click Left 30 31",
                "click Left 20 21",
                "click Right 40 41",
            ]
        );
        // 2s after key, 1s after type, 6 x 1s after clicks
        assert_eq!(clock.slept.get(), Duration::from_secs(9));
        assert_eq!(*events.purchases.borrow(), vec!["25".to_string()]);
    }

    #[test]
    fn test_missing_point_does_nothing() {
        let sequencer = PurchaseSequencer::new(settings(&ALL_POINTS[..3]));
        let mut driver = ActuationDriver::new(Recorder::default());
        let active = SharedFlag::new(true);
        let clock = TestClock::new(None);
        let events = Events::default();

        let outcome = sequencer.run(&mut driver, &clock, &active, &events);

        assert_eq!(outcome, PurchaseOutcome::PointsMissing(vec![4]));
        assert!(driver.backend().actions.is_empty());
        assert_eq!(clock.sleeps.get(), 0);
        assert!(events.purchases.borrow().is_empty());
    }

    #[test]
    fn test_stop_mid_sequence_aborts() {
        let sequencer = PurchaseSequencer::new(settings(&ALL_POINTS));
        let mut driver = ActuationDriver::new(Recorder::default());
        let active = SharedFlag::new(true);
        let clock = TestClock::new(Some((3, &active)));
        let events = Events::default();

        let outcome = sequencer.run(&mut driver, &clock, &active, &events);

        assert_eq!(outcome, PurchaseOutcome::Aborted { steps_done: 3 });
        assert_eq!(driver.backend().actions.len(), 3);
        assert!(events.purchases.borrow().is_empty());
    }

    #[test]
    fn test_inactive_loop_aborts_before_first_step() {
        let sequencer = PurchaseSequencer::new(settings(&ALL_POINTS));
        let mut driver = ActuationDriver::new(Recorder::default());
        let active = SharedFlag::new(false);
        let outcome = sequencer.run(&mut driver, &TestClock::new(None), &active, &Events::default());
        assert_eq!(outcome, PurchaseOutcome::Aborted { steps_done: 0 });
        assert!(driver.backend().actions.is_empty());
    }

    #[test]
    fn test_counter_fires_every_nth_loss() {
        let sequencer = PurchaseSequencer::new(settings(&ALL_POINTS));
        let mut driver = ActuationDriver::new(Recorder::default());
        let active = SharedFlag::new(true);
        let clock = TestClock::new(None);
        let events = Events::default();
        let mut counter = 0;

        let mut fired = Vec::new();
        for _ in 0..7 {
            fired.push(
                sequencer
                    .check_and_purchase(&mut counter, &mut driver, &clock, &active, &events)
                    .is_some(),
            );
        }

        assert_eq!(fired, vec![false, false, true, false, false, true, false]);
        assert_eq!(counter, 1);
        assert_eq!(events.purchases.borrow().len(), 2);
    }

    #[test]
    fn test_disabled_purchase_never_counts() {
        let mut s = settings(&ALL_POINTS);
        s.enabled = false;
        let sequencer = PurchaseSequencer::new(s);
        let mut driver = ActuationDriver::new(Recorder::default());
        let mut counter = 0;
        let result = sequencer.check_and_purchase(
            &mut counter,
            &mut driver,
            &TestClock::new(None),
            &SharedFlag::new(true),
            &Events::default(),
        );
        assert_eq!(result, None);
        assert_eq!(counter, 0);
    }
}
