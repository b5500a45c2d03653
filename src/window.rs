//! Process-level window plumbing using the Windows API

use std::thread;
use std::time::Duration;

use crate::utils::bot_state::SharedFlag;

#[cfg(windows)]
use windows::Win32::Foundation::HWND;
#[cfg(windows)]
use windows::Win32::UI::HiDpi::{GetDpiForSystem, SetProcessDpiAwareness, PROCESS_SYSTEM_DPI_AWARE};
#[cfg(windows)]
use windows::Win32::UI::WindowsAndMessaging::{DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE};

/// DPI that Windows treats as 100% scaling
#[cfg(windows)]
const BASE_DPI: f64 = 96.0;

/// How often the idle message pump checks for shutdown
const PUMP_INTERVAL: Duration = Duration::from_millis(10);

/// Mark the process as system-DPI-aware so captures use physical pixels
#[cfg(windows)]
pub fn enable_dpi_awareness() {
    unsafe {
        if let Err(e) = SetProcessDpiAwareness(PROCESS_SYSTEM_DPI_AWARE) {
            tracing::debug!("[WINDOW] SetProcessDpiAwareness failed: {}", e);
        }
    }
}

#[cfg(not(windows))]
pub fn enable_dpi_awareness() {}

/// System scaling factor (1.0 at 96 DPI)
#[cfg(windows)]
pub fn dpi_scale() -> f64 {
    let dpi = unsafe { GetDpiForSystem() };
    if dpi == 0 {
        1.0
    } else {
        f64::from(dpi) / BASE_DPI
    }
}

#[cfg(not(windows))]
pub fn dpi_scale() -> f64 {
    1.0
}

/// Run the thread's message queue until `shutdown` is set.
///
/// Global hotkeys are delivered as window messages on Windows, so the thread
/// that created the hotkey manager has to keep dispatching.
#[cfg(windows)]
pub fn pump_messages_until(shutdown: &SharedFlag) {
    let mut msg = MSG::default();
    while !shutdown.is_set() {
        unsafe {
            while PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        thread::sleep(PUMP_INTERVAL);
    }
}

#[cfg(not(windows))]
pub fn pump_messages_until(shutdown: &SharedFlag) {
    while !shutdown.is_set() {
        thread::sleep(PUMP_INTERVAL);
    }
}
