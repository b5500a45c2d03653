//! GPO Autofish - Auto fishing bot for the Grand Piece Online fishing minigame
//!
//! Watches a screen region for the fishing bar, tracks the marker against the
//! band with a PD controller and drives the mouse button to keep it aligned.
//! An optional scripted purchase macro restocks bait between catches.

pub mod error;
pub mod fish;
pub mod input;
pub mod log_main;
pub mod screen_reader;
pub mod utils;
pub mod window;

// Re-exports for convenience
pub use error::{ActuationError, ConfigError, StartError};
pub use fish::{FishingLoop, LoopRunner, PdController, PurchaseSequencer};
pub use screen_reader::{AppConfig, CaptureRegion, PixelBuffer, ScreenService};
pub use utils::{bot_state, keybinds, path::get_data_dir};
