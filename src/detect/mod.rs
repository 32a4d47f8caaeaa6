#[cfg(feature = "probes")]
mod system;

#[cfg(feature = "probes")]
pub use system::SystemDetector;

use std::time::Duration;

use anyhow::Result;

/// What the platform reported about the foreground window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInfo {
    pub app_name: String,
    pub window_title: String,
    pub pid: i32,
}

/// Platform probe capability consumed by the sampling loop. Each probe can
/// fail independently on any tick; a failure skips that tick without
/// touching tracker state.
pub trait Detector: Send {
    fn active_window(&mut self) -> Result<WindowInfo>;

    /// Time since the last user input.
    fn idle_duration(&mut self) -> Result<Duration>;

    fn screen_locked(&mut self) -> Result<bool>;

    /// Releases any platform resources. Called once during shutdown.
    fn close(&mut self);
}
