//! Borderless window fullscreen as a [`FullscreenPlatform`]

use app_core::{AppError, ContainerId, FullscreenPlatform, FullscreenSignal};
use parking_lot::Mutex;
use std::sync::Arc;
use winit::window::{Fullscreen, Window};

/// Stands in for the whole window when fullscreen was entered from outside
pub const WINDOW_CONTAINER: ContainerId = ContainerId(0);

/// What the platform needs from a window
pub trait FullscreenWindow: Send + Sync {
    fn is_fullscreen(&self) -> bool;
    fn set_fullscreen(&self, on: bool);
}

impl FullscreenWindow for Window {
    fn is_fullscreen(&self) -> bool {
        self.fullscreen().is_some()
    }

    fn set_fullscreen(&self, on: bool) {
        Window::set_fullscreen(self, on.then_some(Fullscreen::Borderless(None)));
    }
}

/// Window-backed fullscreen.
///
/// Requests go straight to the window; the window applies them
/// asynchronously. [`sync`](Self::sync) is called after resize events and
/// once per event loop iteration, and raises a change notification whenever
/// the observed window state differs from the last one reported.
pub struct WindowFullscreen<W: FullscreenWindow + ?Sized = Window> {
    window: Arc<W>,
    /// Container that asked for the pending or current fullscreen
    requester: Mutex<Option<ContainerId>>,
    /// Element as last reported to listeners
    element: Mutex<Option<ContainerId>>,
    signal: FullscreenSignal,
}

impl<W: FullscreenWindow + ?Sized> WindowFullscreen<W> {
    pub fn new(window: Arc<W>) -> Self {
        let element = window.is_fullscreen().then_some(WINDOW_CONTAINER);
        Self {
            window,
            requester: Mutex::new(None),
            element: Mutex::new(element),
            signal: FullscreenSignal::new(),
        }
    }

    /// Reconcile with the window. Returns true if a change was reported.
    pub fn sync(&self) -> bool {
        let on = self.window.is_fullscreen();
        let observed = on.then(|| self.requester.lock().unwrap_or(WINDOW_CONTAINER));

        let mut element = self.element.lock();
        if *element == observed {
            return false;
        }
        *element = observed;
        drop(element);

        if !on {
            *self.requester.lock() = None;
        }

        tracing::info!(?observed, "window fullscreen changed");
        self.signal.notify(observed);
        true
    }
}

impl<W: FullscreenWindow + ?Sized> FullscreenPlatform for WindowFullscreen<W> {
    fn fullscreen_element(&self) -> Option<ContainerId> {
        *self.element.lock()
    }

    fn request_fullscreen(&self, target: ContainerId) -> Result<(), AppError> {
        if let Some(holder) = self.fullscreen_element() {
            return Err(AppError::FullscreenRejected(format!("{:?} already fullscreen", holder)));
        }
        *self.requester.lock() = Some(target);
        self.window.set_fullscreen(true);
        Ok(())
    }

    fn exit_fullscreen(&self) -> Result<(), AppError> {
        if self.window.is_fullscreen() {
            self.window.set_fullscreen(false);
        }
        Ok(())
    }

    fn withdraw_request(&self, container: ContainerId) {
        let mut requester = self.requester.lock();
        if *requester != Some(container) || self.fullscreen_element() == Some(container) {
            return;
        }
        *requester = None;
        drop(requester);

        tracing::debug!(?container, "pending fullscreen request withdrawn");
        self.window.set_fullscreen(false);
    }

    fn signal(&self) -> &FullscreenSignal {
        &self.signal
    }
}

/// Window double whose fullscreen requests apply only on `settle`
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    pub struct FakeWindow {
        pub on: AtomicBool,
        wanted: Mutex<Option<bool>>,
    }

    impl FakeWindow {
        pub fn settle(&self) {
            if let Some(on) = self.wanted.lock().take() {
                self.on.store(on, Ordering::SeqCst);
            }
        }
    }

    impl FullscreenWindow for FakeWindow {
        fn is_fullscreen(&self) -> bool {
            self.on.load(Ordering::SeqCst)
        }

        fn set_fullscreen(&self, on: bool) {
            *self.wanted.lock() = Some(on);
        }
    }

    pub fn platform() -> (Arc<FakeWindow>, Arc<WindowFullscreen<FakeWindow>>) {
        let window = Arc::new(FakeWindow::default());
        let platform = Arc::new(WindowFullscreen::new(window.clone()));
        (window, platform)
    }
}
