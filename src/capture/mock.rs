//! Hook backends for testing.
//!
//! [`ManualHook`] lets tests inject synthetic events without an OS listener;
//! [`DeniedHook`] behaves like a platform that refuses the monitoring
//! entitlement.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use super::{
    CaptureError, EventSink, HookBackend, HookHandle, KeyCode, MouseButton, MouseEventKind,
    NativeEvent, PressState,
};

/// A hook whose events are injected by the test.
#[derive(Clone, Default)]
pub struct ManualHook {
    sink: Arc<Mutex<Option<EventSink>>>,
    installs: Arc<AtomicUsize>,
}

impl ManualHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_installed(&self) -> bool {
        self.sink.lock().is_some()
    }

    pub fn install_count(&self) -> usize {
        self.installs.load(Ordering::SeqCst)
    }

    /// Deliver an event as if the OS had observed it now.
    ///
    /// Panics if the engine has not installed this hook yet.
    pub fn emit(&self, event: NativeEvent) {
        self.emit_at(SystemTime::now(), event);
    }

    pub fn emit_at(&self, time: SystemTime, event: NativeEvent) {
        let guard = self.sink.lock();
        match guard.as_ref() {
            Some(sink) => sink.deliver(time, event),
            None => panic!("ManualHook::emit called before the hook was installed"),
        }
    }

    pub fn key(&self, key: KeyCode, state: PressState) {
        self.emit(NativeEvent::key(key, state));
    }

    /// Press and release `key`.
    pub fn tap(&self, key: KeyCode) {
        self.key(key.clone(), PressState::Press);
        self.key(key, PressState::Release);
    }

    pub fn mouse_move(&self, x: i32, y: i32) {
        self.emit(NativeEvent::mouse(MouseEventKind::Move { x, y }));
    }

    pub fn mouse_button(&self, button: MouseButton, state: PressState) {
        self.emit(NativeEvent::mouse(MouseEventKind::Button { button, state }));
    }
}

impl HookBackend for ManualHook {
    fn install(&self, sink: EventSink) -> Result<HookHandle, CaptureError> {
        *self.sink.lock() = Some(sink);
        self.installs.fetch_add(1, Ordering::SeqCst);
        Ok(HookHandle::detached())
    }
}

/// A hook that always fails with [`CaptureError::PermissionDenied`].
#[derive(Clone, Default)]
pub struct DeniedHook {
    attempts: Arc<AtomicUsize>,
}

impl DeniedHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of installation attempts made so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl HookBackend for DeniedHook {
    fn install(&self, _sink: EventSink) -> Result<HookHandle, CaptureError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(CaptureError::PermissionDenied(
            "input monitoring has not been granted to this process".to_string(),
        ))
    }
}
