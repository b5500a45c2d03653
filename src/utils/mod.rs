//! Shared utilities: data paths, hotkeys, timing and cross-thread state

pub mod bot_state;
pub mod clock;
pub mod keybinds;
pub mod path;
