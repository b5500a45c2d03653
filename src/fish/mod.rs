//! Fishing minigame: control law, purchase macro, loop and its runner

pub mod controller;
pub mod fishing_loop;
pub mod purchase;
pub mod runner;

pub use controller::{PdController, PdGains};
pub use fishing_loop::{FishingLoop, LoopRuntimeState, LoopSettings, SkipReason, TickOutcome};
pub use purchase::{PurchaseOutcome, PurchaseSequencer, PurchaseSettings};
pub use runner::LoopRunner;
