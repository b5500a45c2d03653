//! GPO Autofish - Auto fishing bot for the Grand Piece Online fishing minigame
//!
//! Features:
//! - Color-based detection of the fishing bar and its marker
//! - PD-controlled mouse holding to keep the marker on target
//! - Automatic recasting after timeouts and lost fish
//! - Optional bait purchase macro every N catches
//! - Global hotkeys and a per-session log

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use parking_lot::Mutex;

use gpo_autofish::fish::LoopRunner;
use gpo_autofish::screen_reader::AppConfig;
use gpo_autofish::utils::bot_state::{SharedBotState, SharedFlag};
use gpo_autofish::utils::keybinds::{await_event, HotkeyAction};
use gpo_autofish::utils::path::{debug_log_dir, sessions_path, settings_path};
use gpo_autofish::window;

const HOTKEY_POLL: Duration = Duration::from_millis(100);

fn init_logging() {
    let log_dir = debug_log_dir();
    let _ = std::fs::create_dir_all(&log_dir);

    // Create a file appender for debug logs
    let log_file_path = log_dir.join("debug.log");
    let file_result = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file_path);

    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    const LOG_FILTER: &str = "info,gpo_autofish=info";

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(LOG_FILTER));

    match file_result {
        Ok(file) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .with_span_events(FmtSpan::CLOSE);

            let stdout_layer = tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(file_layer)
                .with(stdout_layer)
                .init();

            tracing::info!("[INIT] Logging initialized, file: {:?}", log_file_path);
        }
        Err(e) => {
            // Fallback: stdout-only logging with same filter
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::new(LOG_FILTER))
                .init();
            eprintln!(
                "[INIT] Failed to create debug log file at {:?}: {}",
                log_file_path, e
            );
        }
    }
}

/// Handle toggle key press
fn handle_toggle_key(runner: &Mutex<LoopRunner>) {
    let mut runner = runner.lock();
    if runner.is_running() {
        runner.stop();
        println!("Fishing stopped.");
        return;
    }

    // Settings are re-read so edits apply on the next start
    let config = AppConfig::load_or_default(&settings_path());
    runner.state().set_overlay_region(config.overlay_area);
    match runner.start(&config) {
        Ok(()) => println!("Fishing started."),
        Err(e) => {
            println!("Cannot start: {}", e);
            runner.state().set_detail_message(e.to_string());
        }
    }
}

fn hotkey_listener(
    bindings: Vec<(u32, HotkeyAction)>,
    runner: Arc<Mutex<LoopRunner>>,
    shutdown: SharedFlag,
) {
    let receiver = GlobalHotKeyEvent::receiver();

    while let Some(event) = await_event(
        |timeout| receiver.recv_timeout(timeout).ok(),
        |event: &GlobalHotKeyEvent| event.state == HotKeyState::Pressed,
        None,
        HOTKEY_POLL,
        &shutdown,
    ) {
        let Some(action) = bindings
            .iter()
            .find(|(id, _)| *id == event.id)
            .map(|(_, action)| *action)
        else {
            continue;
        };
        tracing::debug!("[HOTKEY] {} pressed", action.name());

        match action {
            HotkeyAction::ToggleLoop => handle_toggle_key(&runner),
            HotkeyAction::ToggleOverlay => {
                let runner = runner.lock();
                println!("Status: {}", runner.state().to_json());
                println!("Capture region: {:?}", runner.state().get_overlay_region());
            }
            HotkeyAction::Exit => {
                runner.lock().stop();
                shutdown.set();
            }
        }
    }
}

fn run() -> anyhow::Result<()> {
    window::enable_dpi_awareness();

    println!("GPO Autofish {}", env!("CARGO_PKG_VERSION"));
    println!("================================");

    let config = AppConfig::load_or_default(&settings_path());
    let state = Arc::new(SharedBotState::new(config.overlay_area));
    state.set_detail_message("Ready");

    let runner = Arc::new(Mutex::new(
        LoopRunner::new(Arc::clone(&state)).with_session_log(sessions_path()),
    ));

    // Set up hotkey manager
    let manager = GlobalHotKeyManager::new().context("failed to create hotkey manager")?;
    let mut bindings = Vec::new();
    for action in [
        HotkeyAction::ToggleLoop,
        HotkeyAction::ToggleOverlay,
        HotkeyAction::Exit,
    ] {
        let Some(hotkey) = config.hotkeys.hotkey_for(action) else {
            tracing::warn!("[INIT] No usable key for {}", action.name());
            continue;
        };
        let id = hotkey.id();
        match manager.register(hotkey) {
            Ok(()) => {
                println!(
                    "Hotkey {} = {}",
                    action.name(),
                    config.hotkeys.key_for(action).to_uppercase()
                );
                bindings.push((id, action));
            }
            Err(e) => tracing::warn!("[INIT] Failed to register {} hotkey: {}", action.name(), e),
        }
    }

    let shutdown = SharedFlag::new(false);
    let listener = {
        let runner = Arc::clone(&runner);
        let shutdown = shutdown.clone();
        thread::Builder::new()
            .name("hotkeys".to_string())
            .spawn(move || hotkey_listener(bindings, runner, shutdown))
            .context("failed to spawn hotkey thread")?
    };

    // Hotkey messages arrive on this thread's queue
    window::pump_messages_until(&shutdown);

    // Cleanup
    println!("App is closing, cleaning up...");
    runner.lock().stop();
    if listener.join().is_err() {
        tracing::error!("[EXIT] Hotkey thread panicked");
    }
    Ok(())
}

fn main() {
    init_logging();
    if let Err(e) = run() {
        tracing::error!("[EXIT] {:#}", e);
        std::process::exit(1);
    }
}
