//! Owns the worker thread that runs the fishing loop

use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use chrono::Utc;

use crate::error::StartError;
use crate::fish::fishing_loop::{FishingLoop, LoopSettings};
use crate::fish::purchase::{PurchaseSequencer, PurchaseSettings};
use crate::input::default_backend;
use crate::log_main::{append_session, SessionRecord};
use crate::screen_reader::{AppConfig, ScreenService};
use crate::utils::bot_state::SharedBotState;
use crate::utils::clock::SystemClock;

/// Starts and stops the background fishing thread.
///
/// The controlling thread only flips the shared liveness flag; the worker
/// owns all loop state.
pub struct LoopRunner {
    state: Arc<SharedBotState>,
    worker: Option<JoinHandle<()>>,
    sessions_file: Option<PathBuf>,
}

impl LoopRunner {
    pub fn new(state: Arc<SharedBotState>) -> Self {
        Self {
            state,
            worker: None,
            sessions_file: None,
        }
    }

    /// Append a record of every stopped session to `path`
    pub fn with_session_log(mut self, path: PathBuf) -> Self {
        self.sessions_file = Some(path);
        self
    }

    pub fn state(&self) -> &Arc<SharedBotState> {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn start(&mut self, config: &AppConfig) -> Result<(), StartError> {
        if self.is_running() {
            return Err(StartError::AlreadyRunning);
        }
        // a worker that stopped on its own still needs joining
        self.join_worker();

        if config.auto_purchase_enabled {
            let missing = config.point_coords.missing();
            if !missing.is_empty() {
                tracing::warn!(
                    "[RUNNER] Auto purchase enabled but points {:?} are not set",
                    missing
                );
                return Err(StartError::PurchasePointsMissing(missing));
            }
        }

        let region = self.state.get_overlay_region();
        let settings = LoopSettings::from_config(config, region);
        let purchase = PurchaseSettings::from(config);

        self.state.reset_stats();
        self.state.set_detail_message("Fishing started");
        let active = self.state.active_flag();
        active.set();

        let worker_flag = active.clone();
        let events = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name("fishing-loop".to_string())
            .spawn(move || {
                let mut fishing = FishingLoop::new(
                    ScreenService::new(),
                    default_backend(),
                    SystemClock,
                    events,
                    PurchaseSequencer::new(purchase),
                    settings,
                    worker_flag,
                );
                fishing.run();
            });

        match spawned {
            Ok(handle) => {
                tracing::info!("[RUNNER] Fishing loop started on region {:?}", region);
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                active.clear();
                tracing::error!("[RUNNER] Failed to spawn fishing thread: {}", e);
                Err(StartError::Spawn(e.to_string()))
            }
        }
    }

    /// Clear the flag and wait for the worker to release input and exit.
    ///
    /// Returns the finished session, or `None` when nothing was running.
    pub fn stop(&mut self) -> Option<SessionRecord> {
        let was_running = self.is_running() || self.worker.is_some();
        self.state.active_flag().clear();
        self.join_worker();
        if !was_running {
            return None;
        }

        let stats = self.state.get_stats();
        let record = SessionRecord {
            start: stats.started_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            stop: Some(Utc::now().to_rfc3339()),
            fish_caught: stats.fish_caught,
            purchases: stats.purchases,
        };
        tracing::info!(
            "[RUNNER] Fishing loop stopped: {} fish, {} purchases",
            record.fish_caught,
            record.purchases
        );
        self.state.set_detail_message("Fishing stopped");

        if let Some(path) = &self.sessions_file {
            if let Err(e) = append_session(path, &record) {
                tracing::warn!("[RUNNER] Failed to write session log: {:#}", e);
            }
        }
        Some(record)
    }

    /// Start when idle, stop when running. Returns whether the loop now runs.
    pub fn toggle(&mut self, config: &AppConfig) -> Result<bool, StartError> {
        if self.is_running() {
            self.stop();
            Ok(false)
        } else {
            self.start(config).map(|()| true)
        }
    }

    fn join_worker(&mut self) {
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::error!("[RUNNER] Fishing thread panicked");
            }
        }
    }
}

impl Drop for LoopRunner {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}
