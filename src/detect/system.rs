use std::{
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use log::error;
use sysinfo::{ProcessesToUpdate, System};

use super::{Detector, WindowInfo};

#[cfg(target_os = "linux")]
const LOCK_PROCESSES: &[&str] = &[
    "i3lock",
    "swaylock",
    "xsecurelock",
    "slock",
    "hyprlock",
    "gtklock",
];
#[cfg(target_os = "windows")]
const LOCK_PROCESSES: &[&str] = &["LockApp.exe"];
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
const LOCK_PROCESSES: &[&str] = &[];

/// Cross-platform probe implementation: the foreground window comes from
/// the window system, idle time from a global input listener, and lock
/// state from a scan for the platform's lock-screen process.
pub struct SystemDetector {
    last_input: Arc<Mutex<Instant>>,
    system: System,
}

impl SystemDetector {
    /// Starts the global input listener and returns the detector. The
    /// listener thread runs for the lifetime of the process; it has no
    /// shutdown channel, so `close` leaves it detached.
    pub fn spawn() -> Result<Self> {
        let last_input = Arc::new(Mutex::new(Instant::now()));
        let shared = Arc::clone(&last_input);

        thread::Builder::new()
            .name("tally-input".into())
            .spawn(move || {
                let result = rdev::listen(move |_event| {
                    if let Ok(mut guard) = shared.lock() {
                        *guard = Instant::now();
                    }
                });
                if let Err(err) = result {
                    error!("input listener stopped: {err:?}");
                }
            })
            .context("failed to spawn input listener thread")?;

        Ok(Self {
            last_input,
            system: System::new(),
        })
    }
}

impl Detector for SystemDetector {
    fn active_window(&mut self) -> Result<WindowInfo> {
        let window = active_win_pos_rs::get_active_window()
            .map_err(|_| anyhow!("no active window available"))?;

        Ok(WindowInfo {
            app_name: sanitize_app_name(&window.app_name),
            window_title: window.title,
            pid: window.process_id as i32,
        })
    }

    fn idle_duration(&mut self) -> Result<Duration> {
        let guard = self
            .last_input
            .lock()
            .map_err(|_| anyhow!("input listener state poisoned"))?;
        Ok(guard.elapsed())
    }

    fn screen_locked(&mut self) -> Result<bool> {
        if LOCK_PROCESSES.is_empty() {
            return Ok(false);
        }

        self.system.refresh_processes(ProcessesToUpdate::All);
        let locked = self.system.processes().values().any(|process| {
            let name = process.name().to_string_lossy();
            LOCK_PROCESSES
                .iter()
                .any(|candidate| name.eq_ignore_ascii_case(candidate))
        });

        Ok(locked)
    }

    fn close(&mut self) {}
}

/// Window systems occasionally report app names with embedded control
/// characters; strip them before they reach storage.
fn sanitize_app_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_control_characters() {
        assert_eq!(sanitize_app_name("Spo\u{8}tify"), "Spotify");
        assert_eq!(sanitize_app_name("  Editor\n"), "Editor");
        assert_eq!(sanitize_app_name("Browser"), "Browser");
    }
}
