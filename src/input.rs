//! Input simulation module for mouse and keyboard control

use std::thread;
use std::time::Duration;

#[cfg(windows)]
use enigo::{Button, Coordinate, Direction, Enigo, Key, Keyboard, Mouse, Settings};

use crate::error::ActuationError;
use crate::screen_reader::ScreenPoint;
use crate::utils::clock::Clock;

/// How long the cast holds the left button
pub const CAST_HOLD: Duration = Duration::from_secs(1);

/// Pause between the phases of a synthesized click
const CLICK_PHASE_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// OS-level input primitives
pub trait InputBackend {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), ActuationError>;

    /// Relative one-pixel move; some games ignore clicks without motion
    fn nudge_cursor(&mut self) -> Result<(), ActuationError>;

    fn button_down(&mut self, button: MouseButton) -> Result<(), ActuationError>;

    fn button_up(&mut self, button: MouseButton) -> Result<(), ActuationError>;

    /// Press and release a named key
    fn press_key(&mut self, key: &str) -> Result<(), ActuationError>;

    fn type_text(&mut self, text: &str) -> Result<(), ActuationError>;

    /// Move, nudge, then press and release `button` with short pauses
    fn click_at(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), ActuationError> {
        self.move_cursor(x, y)?;
        self.nudge_cursor()?;
        thread::sleep(CLICK_PHASE_DELAY);
        self.button_down(button)?;
        thread::sleep(CLICK_PHASE_DELAY);
        self.button_up(button)
    }
}

impl<T: InputBackend + ?Sized> InputBackend for Box<T> {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), ActuationError> {
        (**self).move_cursor(x, y)
    }

    fn nudge_cursor(&mut self) -> Result<(), ActuationError> {
        (**self).nudge_cursor()
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), ActuationError> {
        (**self).button_down(button)
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), ActuationError> {
        (**self).button_up(button)
    }

    fn press_key(&mut self, key: &str) -> Result<(), ActuationError> {
        (**self).press_key(key)
    }

    fn type_text(&mut self, text: &str) -> Result<(), ActuationError> {
        (**self).type_text(text)
    }

    fn click_at(&mut self, x: i32, y: i32, button: MouseButton) -> Result<(), ActuationError> {
        (**self).click_at(x, y, button)
    }
}

/// Backend for platforms without input simulation
#[derive(Debug, Default)]
pub struct UnsupportedBackend;

impl InputBackend for UnsupportedBackend {
    fn move_cursor(&mut self, _x: i32, _y: i32) -> Result<(), ActuationError> {
        Err(ActuationError::Unsupported)
    }

    fn nudge_cursor(&mut self) -> Result<(), ActuationError> {
        Err(ActuationError::Unsupported)
    }

    fn button_down(&mut self, _button: MouseButton) -> Result<(), ActuationError> {
        Err(ActuationError::Unsupported)
    }

    fn button_up(&mut self, _button: MouseButton) -> Result<(), ActuationError> {
        Err(ActuationError::Unsupported)
    }

    fn press_key(&mut self, _key: &str) -> Result<(), ActuationError> {
        Err(ActuationError::Unsupported)
    }

    fn type_text(&mut self, _text: &str) -> Result<(), ActuationError> {
        Err(ActuationError::Unsupported)
    }
}

/// Mouse and keyboard through enigo
#[cfg(windows)]
pub struct EnigoBackend {
    enigo: Enigo,
}

#[cfg(windows)]
impl EnigoBackend {
    pub fn new() -> Result<Self, ActuationError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ActuationError::Unavailable(format!("{:?}", e)))?;
        Ok(Self { enigo })
    }
}

#[cfg(windows)]
fn rejected(e: enigo::InputError) -> ActuationError {
    ActuationError::Rejected(format!("{:?}", e))
}

#[cfg(windows)]
fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
    }
}

#[cfg(windows)]
impl InputBackend for EnigoBackend {
    fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), ActuationError> {
        self.enigo.move_mouse(x, y, Coordinate::Abs).map_err(rejected)
    }

    fn nudge_cursor(&mut self) -> Result<(), ActuationError> {
        self.enigo.move_mouse(0, 1, Coordinate::Rel).map_err(rejected)
    }

    fn button_down(&mut self, button: MouseButton) -> Result<(), ActuationError> {
        self.enigo
            .button(to_enigo_button(button), Direction::Press)
            .map_err(rejected)
    }

    fn button_up(&mut self, button: MouseButton) -> Result<(), ActuationError> {
        self.enigo
            .button(to_enigo_button(button), Direction::Release)
            .map_err(rejected)
    }

    fn press_key(&mut self, key: &str) -> Result<(), ActuationError> {
        let enigo_key =
            string_to_enigo_key(key).ok_or_else(|| ActuationError::UnknownKey(key.to_string()))?;
        self.enigo.key(enigo_key, Direction::Click).map_err(rejected)
    }

    fn type_text(&mut self, text: &str) -> Result<(), ActuationError> {
        self.enigo.text(text).map_err(rejected)
    }
}

/// Convert string key name to enigo Key
#[cfg(windows)]
fn string_to_enigo_key(key: &str) -> Option<Key> {
    let key = key.trim().to_lowercase();
    // Lowercase characters avoid keyboard layout mapping issues
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(Key::Unicode(c));
    }

    match key.as_str() {
        "f1" => Some(Key::F1),
        "f2" => Some(Key::F2),
        "f3" => Some(Key::F3),
        "f4" => Some(Key::F4),
        "f5" => Some(Key::F5),
        "f6" => Some(Key::F6),
        "f7" => Some(Key::F7),
        "f8" => Some(Key::F8),
        "f9" => Some(Key::F9),
        "f10" => Some(Key::F10),
        "f11" => Some(Key::F11),
        "f12" => Some(Key::F12),
        "esc" | "escape" => Some(Key::Escape),
        "enter" | "return" => Some(Key::Return),
        "space" => Some(Key::Space),
        "tab" => Some(Key::Tab),
        "backspace" => Some(Key::Backspace),
        "up" => Some(Key::UpArrow),
        "down" => Some(Key::DownArrow),
        "left" => Some(Key::LeftArrow),
        "right" => Some(Key::RightArrow),
        "home" => Some(Key::Home),
        "end" => Some(Key::End),
        "page_up" => Some(Key::PageUp),
        "page_down" => Some(Key::PageDown),
        "insert" => Some(Key::Insert),
        "delete" => Some(Key::Delete),
        _ => None,
    }
}

/// Input backend for the current platform
pub fn default_backend() -> Box<dyn InputBackend> {
    #[cfg(windows)]
    {
        match EnigoBackend::new() {
            Ok(backend) => return Box::new(backend),
            Err(e) => tracing::warn!("[INPUT] {}", e),
        }
    }
    tracing::warn!("[INPUT] Input simulation unavailable; actions will be logged only");
    Box::new(UnsupportedBackend)
}

/// Tracks the logical state of the held left button on top of a backend.
///
/// Failed OS calls are logged and leave `is_holding` untouched.
pub struct ActuationDriver<B> {
    backend: B,
    holding: bool,
}

impl<B: InputBackend> ActuationDriver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            holding: false,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.holding
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Press the left button unless already held
    pub fn hold(&mut self) {
        if self.holding {
            return;
        }
        match self.backend.button_down(MouseButton::Left) {
            Ok(()) => self.holding = true,
            Err(e) => tracing::warn!("[INPUT] Failed to press mouse button: {}", e),
        }
    }

    /// Release the left button if held
    pub fn release(&mut self) {
        if !self.holding {
            return;
        }
        match self.backend.button_up(MouseButton::Left) {
            Ok(()) => self.holding = false,
            Err(e) => tracing::warn!("[INPUT] Failed to release mouse button: {}", e),
        }
    }

    /// Bang-bang decision on a control output: hold when positive
    pub fn apply(&mut self, output: f64) {
        if output > 0.0 {
            self.hold();
        } else {
            self.release();
        }
    }

    /// Hold the left button for [`CAST_HOLD`], then let go
    pub fn cast(&mut self, clock: &impl Clock) {
        tracing::info!("[INPUT] Casting line...");
        if let Err(e) = self.backend.button_down(MouseButton::Left) {
            tracing::warn!("[INPUT] Cast press failed: {}", e);
        }
        clock.sleep(CAST_HOLD);
        if let Err(e) = self.backend.button_up(MouseButton::Left) {
            tracing::warn!("[INPUT] Cast release failed: {}", e);
        }
        self.holding = false;
    }

    pub fn click(&mut self, point: ScreenPoint) -> bool {
        self.click_with(point, MouseButton::Left)
    }

    pub fn right_click(&mut self, point: ScreenPoint) -> bool {
        self.click_with(point, MouseButton::Right)
    }

    fn click_with(&mut self, point: ScreenPoint, button: MouseButton) -> bool {
        match self.backend.click_at(point.x, point.y, button) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[INPUT] {:?} click at ({}, {}) failed: {}", button, point.x, point.y, e);
                false
            }
        }
    }

    pub fn press_key(&mut self, key: &str) -> bool {
        match self.backend.press_key(key) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[INPUT] Failed to press key '{}': {}", key, e);
                false
            }
        }
    }

    pub fn type_text(&mut self, text: &str) -> bool {
        match self.backend.type_text(text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("[INPUT] Failed to type '{}': {}", text, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Instant;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        fail: bool,
    }

    impl Recorder {
        fn result(&mut self, entry: String) -> Result<(), ActuationError> {
            if self.fail {
                return Err(ActuationError::Rejected("denied".to_string()));
            }
            self.log.push(entry);
            Ok(())
        }
    }

    impl InputBackend for Recorder {
        fn move_cursor(&mut self, x: i32, y: i32) -> Result<(), ActuationError> {
            self.result(format!("move {} {}", x, y))
        }
        fn nudge_cursor(&mut self) -> Result<(), ActuationError> {
            self.result("nudge".to_string())
        }
        fn button_down(&mut self, button: MouseButton) -> Result<(), ActuationError> {
            self.result(format!("down {:?}", button))
        }
        fn button_up(&mut self, button: MouseButton) -> Result<(), ActuationError> {
            self.result(format!("up {:?}", button))
        }
        fn press_key(&mut self, key: &str) -> Result<(), ActuationError> {
            self.result(format!("key {}", key))
        }
        fn type_text(&mut self, text: &str) -> Result<(), ActuationError> {
            self.result(format!("type {}", text))
        }
    }

    struct CountingClock(Cell<Duration>);

    impl Clock for CountingClock {
        fn now(&self) -> Instant {
            Instant::now()
        }
        fn sleep(&self, duration: Duration) {
            self.0.set(self.0.get() + duration);
        }
    }

    #[test]
    fn test_hold_and_release_are_idempotent() {
        let mut driver = ActuationDriver::new(Recorder::default());
        driver.apply(0.06);
        driver.apply(0.2);
        assert!(driver.is_holding());
        driver.apply(0.0);
        driver.apply(-0.09);
        assert!(!driver.is_holding());
        assert_eq!(driver.backend().log, vec!["down Left", "up Left"]);
    }

    #[test]
    fn test_failed_press_keeps_logical_state() {
        let mut driver = ActuationDriver::new(Recorder {
            fail: true,
            ..Recorder::default()
        });
        driver.hold();
        assert!(!driver.is_holding());
    }

    #[test]
    fn test_failed_release_keeps_holding() {
        let mut driver = ActuationDriver::new(Recorder::default());
        driver.hold();
        driver.backend_mut().fail = true;
        driver.release();
        assert!(driver.is_holding());
    }

    #[test]
    fn test_cast_holds_for_one_second_and_clears_flag() {
        let mut driver = ActuationDriver::new(Recorder::default());
        driver.hold();
        let clock = CountingClock(Cell::new(Duration::ZERO));
        driver.cast(&clock);
        assert!(!driver.is_holding());
        assert_eq!(clock.0.get(), CAST_HOLD);
        assert_eq!(driver.backend().log, vec!["down Left", "down Left", "up Left"]);
    }

    #[test]
    fn test_default_click_sequence() {
        let mut driver = ActuationDriver::new(Recorder::default());
        assert!(driver.right_click(ScreenPoint { x: 4, y: 5 }));
        assert_eq!(
            driver.backend().log,
            vec!["move 4 5", "nudge", "down Right", "up Right"]
        );
    }

    #[test]
    fn test_unsupported_backend_reports_errors() {
        let mut driver = ActuationDriver::new(UnsupportedBackend);
        assert!(!driver.press_key("e"));
        assert!(!driver.type_text("10"));
        assert!(!driver.click(ScreenPoint { x: 0, y: 0 }));
    }

    #[test]
    #[cfg(windows)]
    fn test_string_to_enigo_key() {
        assert!(string_to_enigo_key("E").is_some());
        assert!(string_to_enigo_key("f9").is_some());
        assert!(string_to_enigo_key("esc").is_some());
        assert!(string_to_enigo_key("invalid_key_name").is_none());
    }

    #[test]
    #[cfg(windows)]
    fn test_every_accepted_key_can_be_pressed() {
        use crate::utils::keybinds::{resolve_key, SPECIAL_KEYS};

        for name in SPECIAL_KEYS {
            assert!(resolve_key(name).is_some());
            assert!(string_to_enigo_key(name).is_some(), "no enigo key for '{}'", name);
        }
        assert!(matches!(string_to_enigo_key("insert"), Some(Key::Insert)));
    }
}
