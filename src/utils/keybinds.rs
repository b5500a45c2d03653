//! Hotkey bindings and blocking input-event waits

use std::collections::HashMap;
use std::time::{Duration, Instant};

use global_hotkey::hotkey::{Code, HotKey};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use super::bot_state::SharedFlag;

/// Default key bindings
pub static DEFAULT_KEYS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("toggle_loop", "f1");
    m.insert("toggle_overlay", "f2");
    m.insert("exit", "f3");
    m
});

/// Action bound to a global hotkey
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyAction {
    ToggleLoop,
    ToggleOverlay,
    Exit,
}

impl HotkeyAction {
    pub fn name(&self) -> &'static str {
        match self {
            HotkeyAction::ToggleLoop => "toggle_loop",
            HotkeyAction::ToggleOverlay => "toggle_overlay",
            HotkeyAction::Exit => "exit",
        }
    }
}

/// Configured key names, stored lowercase as in the settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hotkeys {
    pub toggle_loop: String,
    pub toggle_overlay: String,
    pub exit: String,
}

impl Default for Hotkeys {
    fn default() -> Self {
        Self {
            toggle_loop: DEFAULT_KEYS["toggle_loop"].to_string(),
            toggle_overlay: DEFAULT_KEYS["toggle_overlay"].to_string(),
            exit: DEFAULT_KEYS["exit"].to_string(),
        }
    }
}

impl Hotkeys {
    /// Key name for an action, falling back to the default binding when the
    /// configured one does not resolve
    pub fn key_for(&self, action: HotkeyAction) -> String {
        let configured = match action {
            HotkeyAction::ToggleLoop => &self.toggle_loop,
            HotkeyAction::ToggleOverlay => &self.toggle_overlay,
            HotkeyAction::Exit => &self.exit,
        };
        match resolve_key(configured) {
            Some(key) => key,
            None => {
                tracing::warn!(
                    "[KEYS] Invalid key '{}' for {}, using default",
                    configured,
                    action.name()
                );
                DEFAULT_KEYS[action.name()].to_string()
            }
        }
    }

    /// Global hotkey for an action, if its key maps to a scan code
    pub fn hotkey_for(&self, action: HotkeyAction) -> Option<HotKey> {
        string_to_code(&self.key_for(action)).map(|code| HotKey::new(None, code))
    }
}

/// Named keys accepted besides single letters and digits
pub const SPECIAL_KEYS: [&str; 29] = [
    "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
    "esc", "escape", "enter", "return", "space", "tab", "backspace",
    "up", "down", "left", "right", "home", "end", "page_up", "page_down",
    "insert", "delete",
];

/// Resolve a key name string to a validated lowercase key string
pub fn resolve_key(key_name: &str) -> Option<String> {
    let key = key_name.trim().to_lowercase();
    if key.is_empty() {
        return None;
    }

    if SPECIAL_KEYS.contains(&key.as_str()) {
        return Some(key);
    }

    let mut chars = key.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(key),
        _ => None,
    }
}

/// Convert key string to global_hotkey Code
pub fn string_to_code(key: &str) -> Option<Code> {
    let key = key.trim().to_lowercase();
    let code = match key.as_str() {
        "f1" => Code::F1,
        "f2" => Code::F2,
        "f3" => Code::F3,
        "f4" => Code::F4,
        "f5" => Code::F5,
        "f6" => Code::F6,
        "f7" => Code::F7,
        "f8" => Code::F8,
        "f9" => Code::F9,
        "f10" => Code::F10,
        "f11" => Code::F11,
        "f12" => Code::F12,
        "esc" | "escape" => Code::Escape,
        "enter" | "return" => Code::Enter,
        "space" => Code::Space,
        "tab" => Code::Tab,
        "backspace" => Code::Backspace,
        "up" => Code::ArrowUp,
        "down" => Code::ArrowDown,
        "left" => Code::ArrowLeft,
        "right" => Code::ArrowRight,
        "home" => Code::Home,
        "end" => Code::End,
        "page_up" => Code::PageUp,
        "page_down" => Code::PageDown,
        "insert" => Code::Insert,
        "delete" => Code::Delete,
        "a" => Code::KeyA,
        "b" => Code::KeyB,
        "c" => Code::KeyC,
        "d" => Code::KeyD,
        "e" => Code::KeyE,
        "f" => Code::KeyF,
        "g" => Code::KeyG,
        "h" => Code::KeyH,
        "i" => Code::KeyI,
        "j" => Code::KeyJ,
        "k" => Code::KeyK,
        "l" => Code::KeyL,
        "m" => Code::KeyM,
        "n" => Code::KeyN,
        "o" => Code::KeyO,
        "p" => Code::KeyP,
        "q" => Code::KeyQ,
        "r" => Code::KeyR,
        "s" => Code::KeyS,
        "t" => Code::KeyT,
        "u" => Code::KeyU,
        "v" => Code::KeyV,
        "w" => Code::KeyW,
        "x" => Code::KeyX,
        "y" => Code::KeyY,
        "z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        _ => return None,
    };
    Some(code)
}

/// Block until `recv` yields an event accepted by `matches`.
///
/// `recv` is polled in slices of at most `poll` so that `cancel` is noticed
/// promptly. Returns `None` once `timeout` elapses or `cancel` is set.
pub fn await_event<T>(
    mut recv: impl FnMut(Duration) -> Option<T>,
    matches: impl Fn(&T) -> bool,
    timeout: Option<Duration>,
    poll: Duration,
    cancel: &SharedFlag,
) -> Option<T> {
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
        if cancel.is_set() {
            return None;
        }
        let slice = match deadline {
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return None;
                }
                remaining.min(poll)
            }
            None => poll,
        };
        if let Some(event) = recv(slice) {
            if matches(&event) {
                return Some(event);
            }
        }
    }
}
