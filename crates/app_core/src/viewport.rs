//! Fullscreen ownership for viewer containers
//!
//! The platform is the single source of truth for which container is
//! fullscreen. A [`ViewportSession`] only mirrors it, and only by draining
//! change notifications from the platform's [`FullscreenSignal`].

use crate::AppError;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Identifies a viewer container (the rectangle a viewer draws into)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u64);

impl ContainerId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Delivered after the platform finished a fullscreen transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FullscreenChange {
    pub element: Option<ContainerId>,
}

type ListenerMap = HashMap<u64, Sender<FullscreenChange>>;

/// Document-level fullscreen change notification
#[derive(Default)]
pub struct FullscreenSignal {
    listeners: Arc<Mutex<ListenerMap>>,
    next_id: AtomicU64,
}

impl FullscreenSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it is removed when the subscription drops
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = crossbeam_channel::unbounded();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, tx);

        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
            rx,
        }
    }

    /// Broadcast a completed transition to every listener
    pub fn notify(&self, element: Option<ContainerId>) {
        let change = FullscreenChange { element };
        let listeners = self.listeners.lock();
        tracing::debug!(?element, listeners = listeners.len(), "fullscreen change");
        for tx in listeners.values() {
            let _ = tx.send(change);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// A registered fullscreen-change listener
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<ListenerMap>>,
    rx: Receiver<FullscreenChange>,
}

impl Subscription {
    /// Pending notifications, oldest first
    pub fn drain(&self) -> impl Iterator<Item = FullscreenChange> + '_ {
        self.rx.try_iter()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().remove(&self.id);
        }
    }
}

/// Platform fullscreen capability
pub trait FullscreenPlatform: Send + Sync {
    /// Container currently holding fullscreen, as the platform reports it
    fn fullscreen_element(&self) -> Option<ContainerId>;

    /// Ask the platform to make `target` fullscreen; completion is signalled later
    fn request_fullscreen(&self, target: ContainerId) -> Result<(), AppError>;

    /// Ask the platform to leave fullscreen; completion is signalled later
    fn exit_fullscreen(&self) -> Result<(), AppError>;

    /// `container` is going away: drop its request if it has not taken effect yet
    fn withdraw_request(&self, _container: ContainerId) {}

    /// Change notifications for this platform
    fn signal(&self) -> &FullscreenSignal;
}

/// Fullscreen state for one mounted viewer
pub struct ViewportSession {
    platform: Arc<dyn FullscreenPlatform>,
    container: ContainerId,
    subscription: Subscription,
    is_fullscreen: bool,
}

impl ViewportSession {
    /// Install the change listener and reconcile with the platform
    pub fn mount(platform: Arc<dyn FullscreenPlatform>, container: ContainerId) -> Self {
        let subscription = platform.signal().subscribe();
        let is_fullscreen = platform.fullscreen_element().is_some();
        tracing::debug!(?container, is_fullscreen, "viewport session mounted");

        Self {
            platform,
            container,
            subscription,
            is_fullscreen,
        }
    }

    pub fn container(&self) -> ContainerId {
        self.container
    }

    /// Cached flag; refreshed only by [`poll`](Self::poll)
    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    /// Does this session's container hold fullscreen right now?
    pub fn owns_fullscreen(&self) -> bool {
        self.is_fullscreen && self.platform.fullscreen_element() == Some(self.container)
    }

    /// Apply pending change notifications. Returns true if the flag changed.
    pub fn poll(&mut self) -> bool {
        let before = self.is_fullscreen;
        for change in self.subscription.drain() {
            self.is_fullscreen = change.element.is_some();
        }
        before != self.is_fullscreen
    }

    pub fn enter_fullscreen(&self) {
        if let Some(holder) = self.platform.fullscreen_element() {
            tracing::debug!(?holder, "fullscreen already held, enter ignored");
            return;
        }
        if let Err(e) = self.platform.request_fullscreen(self.container) {
            tracing::warn!("{}", e);
        }
    }

    pub fn exit_fullscreen(&self) {
        if self.platform.fullscreen_element().is_none() {
            return;
        }
        if let Err(e) = self.platform.exit_fullscreen() {
            tracing::warn!("{}", e);
        }
    }

    /// Enter or exit based on the platform's current element
    pub fn toggle(&self) {
        if self.platform.fullscreen_element().is_none() {
            self.enter_fullscreen();
        } else {
            self.exit_fullscreen();
        }
    }
}

impl Drop for ViewportSession {
    fn drop(&mut self) {
        self.platform.withdraw_request(self.container);
        tracing::debug!(container = ?self.container, "viewport session unmounted");
    }
}

/// In-memory platform whose transitions complete only when told to
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Default)]
    pub struct ScriptedPlatform {
        element: Mutex<Option<ContainerId>>,
        pending: Mutex<Option<Option<ContainerId>>>,
        pub reject_requests: Mutex<bool>,
        signal: FullscreenSignal,
    }

    impl ScriptedPlatform {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Finish the requested transition and notify listeners
        pub fn complete_transition(&self) {
            if let Some(next) = self.pending.lock().take() {
                *self.element.lock() = next;
                self.signal.notify(next);
            }
        }

        /// Leave fullscreen by a means outside any session (Esc key)
        pub fn external_exit(&self) {
            *self.element.lock() = None;
            self.signal.notify(None);
        }
    }

    impl FullscreenPlatform for ScriptedPlatform {
        fn fullscreen_element(&self) -> Option<ContainerId> {
            *self.element.lock()
        }

        fn request_fullscreen(&self, target: ContainerId) -> Result<(), AppError> {
            if *self.reject_requests.lock() {
                return Err(AppError::FullscreenRejected("no user gesture".into()));
            }
            *self.pending.lock() = Some(Some(target));
            Ok(())
        }

        fn exit_fullscreen(&self) -> Result<(), AppError> {
            *self.pending.lock() = Some(None);
            Ok(())
        }

        fn withdraw_request(&self, container: ContainerId) {
            let mut pending = self.pending.lock();
            if *pending == Some(Some(container)) {
                *pending = None;
            }
        }

        fn signal(&self) -> &FullscreenSignal {
            &self.signal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedPlatform;
    use super::*;

    fn session(platform: &Arc<ScriptedPlatform>) -> ViewportSession {
        ViewportSession::mount(platform.clone(), ContainerId::next())
    }

    #[test]
    fn test_toggle_twice_returns_to_windowed() {
        let platform = ScriptedPlatform::new();
        let mut s = session(&platform);
        assert!(!s.is_fullscreen());

        s.toggle();
        // Flag never leads the platform
        assert!(!s.is_fullscreen());
        platform.complete_transition();
        assert!(s.poll());
        assert!(s.is_fullscreen());
        assert!(s.owns_fullscreen());

        s.toggle();
        platform.complete_transition();
        s.poll();
        assert!(!s.is_fullscreen());
        assert_eq!(platform.fullscreen_element(), None);
    }

    #[test]
    fn test_external_exit_is_reconciled() {
        let platform = ScriptedPlatform::new();
        let mut s = session(&platform);

        s.enter_fullscreen();
        platform.complete_transition();
        s.poll();
        assert!(s.is_fullscreen());

        platform.external_exit();
        s.poll();
        assert!(!s.is_fullscreen());
        assert_eq!(s.is_fullscreen(), platform.fullscreen_element().is_some());
    }

    #[test]
    fn test_rejected_request_is_noop() {
        let platform = ScriptedPlatform::new();
        *platform.reject_requests.lock() = true;
        let mut s = session(&platform);

        s.toggle();
        platform.complete_transition();
        assert!(!s.poll());
        assert!(!s.is_fullscreen());
    }

    #[test]
    fn test_enter_ignored_while_other_container_holds_fullscreen() {
        let platform = ScriptedPlatform::new();
        let first = session(&platform);
        first.enter_fullscreen();
        platform.complete_transition();
        let holder = platform.fullscreen_element();

        let second = session(&platform);
        second.enter_fullscreen();
        platform.complete_transition();
        assert_eq!(platform.fullscreen_element(), holder);
    }

    #[test]
    fn test_mount_reconciles_inherited_fullscreen() {
        let platform = ScriptedPlatform::new();
        {
            let s = session(&platform);
            s.enter_fullscreen();
            platform.complete_transition();
        }

        // A prior viewer left fullscreen on; the new one must see it
        let s = session(&platform);
        assert!(s.is_fullscreen());
        assert!(!s.owns_fullscreen());
    }

    #[test]
    fn test_pending_request_withdrawn_on_drop() {
        let platform = ScriptedPlatform::new();
        let s = session(&platform);
        s.enter_fullscreen();
        drop(s);

        platform.complete_transition();
        assert_eq!(platform.fullscreen_element(), None);

        let mut next = session(&platform);
        assert!(!next.poll());
        assert!(!next.is_fullscreen());
    }

    #[test]
    fn test_listener_released_on_drop() {
        let platform = ScriptedPlatform::new();
        assert_eq!(platform.signal().listener_count(), 0);

        for _ in 0..3 {
            let _s = session(&platform);
            assert_eq!(platform.signal().listener_count(), 1);
        }
        assert_eq!(platform.signal().listener_count(), 0);
    }

    #[test]
    fn test_exit_without_fullscreen_is_noop() {
        let platform = ScriptedPlatform::new();
        let mut s = session(&platform);
        s.exit_fullscreen();
        platform.complete_transition();
        assert!(!s.poll());
    }
}
