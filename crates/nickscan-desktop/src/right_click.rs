use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use nickscan_core::ActivationListener;
use nickscan_types::WindowEvent;
use parking_lot::Mutex;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Decides from a window title whether a right-click is worth analysing
pub type TitleFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Polls the right mouse button and reports each press over a window.
///
/// Polling pauses while the detector is inactive. Clicks on windows the title
/// filter rejects are dropped before anything is captured. Events go to the
/// sink given to [`RightClickHook::start`], normally the app's event bus.
pub struct RightClickHook {
    active: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    accepts: TitleFilter,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl RightClickHook {
    pub fn new(active: bool) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(active)),
            running: Arc::new(AtomicBool::new(false)),
            accepts: Arc::new(|_: &str| true),
            worker: Mutex::new(None),
        }
    }

    pub fn with_title_filter<F>(mut self, accepts: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.accepts = Arc::new(accepts);
        self
    }

    /// Accept windows whose title contains any of `fragments`, ignoring case.
    /// No fragments keeps every window.
    pub fn with_title_fragments(self, fragments: &[String]) -> Self {
        let fragments: Vec<String> = fragments
            .iter()
            .map(|f| f.trim().to_lowercase())
            .filter(|f| !f.is_empty())
            .collect();
        if fragments.is_empty() {
            return self;
        }
        self.with_title_filter(move |title| {
            let title = title.to_lowercase();
            fragments.iter().any(|f| title.contains(f.as_str()))
        })
    }

    pub fn accepts(&self, title: &str) -> bool {
        (self.accepts)(title)
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Start polling; a no-op if already running
    pub fn start<F>(&self, sink: F) -> Result<()>
    where
        F: Fn(WindowEvent) + Send + Sync + 'static,
    {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Ok(());
        }

        if !cfg!(windows) {
            tracing::warn!("right-click capture is only available on Windows");
            return Ok(());
        }

        self.running.store(true, Ordering::Release);
        let active = Arc::clone(&self.active);
        let running = Arc::clone(&self.running);
        let accepts = Arc::clone(&self.accepts);
        let handle = thread::Builder::new()
            .name("nickscan-right-click".into())
            .spawn(move || poll_loop(&active, &running, accepts.as_ref(), &sink))
            .context("Failed to spawn right-click thread")?;

        *worker = Some(handle);
        tracing::info!("right-click capture started");
        Ok(())
    }

    /// Stop polling and wait for the thread to exit
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                tracing::error!("right-click thread panicked");
            }
            tracing::info!("right-click capture stopped");
        }
    }
}

impl ActivationListener for RightClickHook {
    fn set_detector_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
        tracing::debug!(active, "right-click capture toggled");
    }
}

impl Drop for RightClickHook {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(
    active: &AtomicBool,
    running: &AtomicBool,
    accepts: &(dyn Fn(&str) -> bool + Send + Sync),
    sink: &dyn Fn(WindowEvent),
) {
    let mut was_down = false;

    while running.load(Ordering::Acquire) {
        if active.load(Ordering::Acquire) {
            let down = button_down();
            // Fire on the press edge only
            if down
                && !was_down
                && let Some(event) = window_event()
            {
                if accepts(&event.title) {
                    tracing::debug!(
                        handle = %event.handle,
                        x = event.x,
                        y = event.y,
                        "right-click captured"
                    );
                    sink(event);
                } else {
                    tracing::trace!("right-click on '{}' ignored", event.title);
                }
            }
            was_down = down;
        } else {
            was_down = false;
        }

        thread::sleep(POLL_INTERVAL);
    }
}

#[cfg(windows)]
fn button_down() -> bool {
    crate::win32::right_button_down()
}

#[cfg(windows)]
fn window_event() -> Option<WindowEvent> {
    crate::win32::window_under_cursor().map(|target| WindowEvent {
        handle: target.handle,
        x: target.client.x,
        y: target.client.y,
        title: target.title,
    })
}

#[cfg(not(windows))]
fn button_down() -> bool {
    false
}

#[cfg(not(windows))]
fn window_event() -> Option<WindowEvent> {
    None
}
