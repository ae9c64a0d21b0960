//! Event capture engine
//!
//! A single OS-level listener observes global keyboard and mouse activity on
//! its own thread and appends every event to the log of its device class.
//! Request handling only ever reads those logs through cursors.
//!
//! # Testability
//!
//! The [`HookBackend`] trait separates the engine from the OS listener, so
//! tests can drive the logs with [`mock::ManualHook`] or simulate a missing
//! permission with [`mock::DeniedHook`].

pub mod event;
pub mod log;
pub mod mock;
mod rdev_hook;

pub use event::{
    DeviceClass, KeyCode, KeyboardEvent, MouseButton, MouseEvent, MouseEventKind, NativeEvent,
    PressState,
};
pub use log::{Batch, Captured, EventLog};
pub use rdev_hook::RdevHook;

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("monitor permission denied: {0}")]
    PermissionDenied(String),
    #[error("monitor hook stopped: {0}")]
    HookStopped(String),
    #[error("failed to start monitor thread: {0}")]
    Spawn(String),
}

/// Installs the process-wide listener for keyboard and mouse activity.
pub trait HookBackend: Send + Sync {
    /// Start delivering every observed event to `sink`.
    ///
    /// Must return within a bounded time, reporting a missing OS permission
    /// as [`CaptureError::PermissionDenied`].
    fn install(&self, sink: EventSink) -> Result<HookHandle, CaptureError>;
}

/// Tracks a running listener so the engine can notice when it dies.
pub struct HookHandle {
    exit: Option<Receiver<Result<(), CaptureError>>>,
}

impl HookHandle {
    /// A listener whose lifetime is not observable (test hooks).
    pub fn detached() -> Self {
        Self { exit: None }
    }

    /// A listener that reports its exit status on `exit`.
    pub fn watching(exit: Receiver<Result<(), CaptureError>>) -> Self {
        Self { exit: Some(exit) }
    }

    fn poll_exit(&mut self) -> Option<CaptureError> {
        let exit = self.exit.as_ref()?;
        match exit.try_recv() {
            Err(TryRecvError::Empty) => None,
            Ok(Err(error)) => Some(error),
            Ok(Ok(())) => Some(CaptureError::HookStopped("listener returned".to_string())),
            Err(TryRecvError::Disconnected) => Some(CaptureError::HookStopped(
                "listener thread exited".to_string(),
            )),
        }
    }
}

struct Shared {
    keyboard: EventLog<KeyboardEvent>,
    mouse: EventLog<MouseEvent>,
    keyboard_enabled: AtomicBool,
    mouse_enabled: AtomicBool,
}

impl Shared {
    fn flag(&self, class: DeviceClass) -> &AtomicBool {
        match class {
            DeviceClass::Keyboard => &self.keyboard_enabled,
            DeviceClass::Mouse => &self.mouse_enabled,
        }
    }
}

/// The write side of the logs, owned by the hook callback.
#[derive(Clone)]
pub struct EventSink {
    shared: Arc<Shared>,
}

impl EventSink {
    /// Record one observed event. Events of a device class whose hook has not
    /// been installed are ignored.
    pub fn deliver(&self, time: SystemTime, event: NativeEvent) {
        if !self
            .shared
            .flag(event.device_class())
            .load(Ordering::Acquire)
        {
            return;
        }

        let micros = log::micros_since_epoch(time);
        match event {
            NativeEvent::Keyboard(event) => {
                self.shared.keyboard.append(micros, event);
            }
            NativeEvent::Mouse(event) => {
                self.shared.mouse.append(micros, event);
            }
        }
    }
}

enum HookState {
    Idle,
    Active(HookHandle),
    Failed { error: CaptureError, at: Instant },
    Shutdown,
}

pub struct CaptureEngine {
    shared: Arc<Shared>,
    backend: Box<dyn HookBackend>,
    state: Mutex<HookState>,
    permission_retry: Duration,
}

impl CaptureEngine {
    pub fn new(backend: Box<dyn HookBackend>, permission_retry: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                keyboard: EventLog::new(),
                mouse: EventLog::new(),
                keyboard_enabled: AtomicBool::new(false),
                mouse_enabled: AtomicBool::new(false),
            }),
            backend,
            state: Mutex::new(HookState::Idle),
            permission_retry,
        }
    }

    /// Ensure the OS listener runs and events of `class` are recorded.
    ///
    /// Idempotent. A failed installation is cached and returned to every
    /// caller until `permission_retry` has elapsed, then attempted again.
    pub fn install_hook(&self, class: DeviceClass) -> Result<(), CaptureError> {
        let mut state = self.state.lock();
        self.ensure_listener(&mut state)?;

        if !self.shared.flag(class).swap(true, Ordering::AcqRel) {
            tracing::info!("{} monitoring enabled", class);
        }
        Ok(())
    }

    fn ensure_listener(&self, state: &mut HookState) -> Result<(), CaptureError> {
        let died = match state {
            HookState::Active(handle) => match handle.poll_exit() {
                None => return Ok(()),
                Some(error) => Some(error),
            },
            HookState::Failed { error, at } if at.elapsed() < self.permission_retry => {
                return Err(error.clone());
            }
            HookState::Shutdown => {
                return Err(CaptureError::HookStopped(
                    "capture engine shut down".to_string(),
                ));
            }
            HookState::Idle | HookState::Failed { .. } => None,
        };

        if let Some(error) = died {
            tracing::warn!("Input listener died: {}", error);
            *state = HookState::Failed {
                error: error.clone(),
                at: Instant::now(),
            };
            return Err(error);
        }

        let sink = EventSink {
            shared: Arc::clone(&self.shared),
        };
        match self.backend.install(sink) {
            Ok(handle) => {
                tracing::info!("Input listener installed");
                *state = HookState::Active(handle);
                Ok(())
            }
            Err(error) => {
                tracing::warn!("Failed to install input listener: {}", error);
                *state = HookState::Failed {
                    error: error.clone(),
                    at: Instant::now(),
                };
                Err(error)
            }
        }
    }

    /// Keyboard events after `cursor`, installing the hook on first use.
    pub fn read_keyboard(&self, cursor: u64) -> Result<Batch<KeyboardEvent>, CaptureError> {
        self.install_hook(DeviceClass::Keyboard)?;
        Ok(self.shared.keyboard.read(cursor))
    }

    /// Mouse events after `cursor`, installing the hook on first use.
    pub fn read_mouse(&self, cursor: u64) -> Result<Batch<MouseEvent>, CaptureError> {
        self.install_hook(DeviceClass::Mouse)?;
        Ok(self.shared.mouse.read(cursor))
    }

    pub fn is_enabled(&self, class: DeviceClass) -> bool {
        self.shared.flag(class).load(Ordering::Acquire)
    }

    /// Stop recording and release the listener handle. Further reads fail.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();
        if matches!(*state, HookState::Shutdown) {
            return;
        }
        for class in DeviceClass::ALL {
            self.shared.flag(class).store(false, Ordering::Release);
        }
        *state = HookState::Shutdown;
        tracing::info!("Capture engine shut down");
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{DeniedHook, ManualHook};
    use super::*;

    fn engine_with(hook: &ManualHook) -> CaptureEngine {
        CaptureEngine::new(Box::new(hook.clone()), Duration::from_secs(60))
    }

    #[test]
    fn first_read_installs_hook_once() {
        let hook = ManualHook::new();
        let engine = engine_with(&hook);

        assert!(!hook.is_installed());
        engine.read_keyboard(0).unwrap();
        engine.read_mouse(0).unwrap();
        engine.read_keyboard(0).unwrap();

        assert!(hook.is_installed());
        assert_eq!(hook.install_count(), 1);
    }

    #[test]
    fn events_for_uninstalled_class_are_not_recorded() {
        let hook = ManualHook::new();
        let engine = engine_with(&hook);
        engine.install_hook(DeviceClass::Keyboard).unwrap();

        hook.mouse_move(10, 20);
        hook.key(KeyCode::Char('q'), PressState::Press);

        assert_eq!(engine.read_keyboard(0).unwrap().events.len(), 1);
        assert!(engine.read_mouse(0).unwrap().events.is_empty());
    }

    #[test]
    fn logs_are_independent_per_class() {
        let hook = ManualHook::new();
        let engine = engine_with(&hook);
        engine.install_hook(DeviceClass::Keyboard).unwrap();
        engine.install_hook(DeviceClass::Mouse).unwrap();

        hook.key(KeyCode::Char('a'), PressState::Press);
        hook.mouse_move(1, 1);
        hook.key(KeyCode::Char('a'), PressState::Release);

        let keys = engine.read_keyboard(0).unwrap();
        let mouse = engine.read_mouse(0).unwrap();
        assert_eq!(keys.next_cursor, 2);
        assert_eq!(mouse.next_cursor, 1);
        assert_eq!(mouse.events[0].sequence, 1);
    }

    #[test]
    fn permission_failure_is_reported_on_every_read() {
        let hook = DeniedHook::new();
        let engine = CaptureEngine::new(Box::new(hook.clone()), Duration::from_secs(60));

        for _ in 0..3 {
            assert!(matches!(
                engine.read_keyboard(0),
                Err(CaptureError::PermissionDenied(_))
            ));
            assert!(matches!(
                engine.read_mouse(0),
                Err(CaptureError::PermissionDenied(_))
            ));
        }
        assert_eq!(hook.attempts(), 1, "failure is cached within the retry window");
    }

    #[test]
    fn permission_failure_is_retried_after_interval() {
        let hook = DeniedHook::new();
        let engine = CaptureEngine::new(Box::new(hook.clone()), Duration::ZERO);

        assert!(engine.read_keyboard(0).is_err());
        assert!(engine.read_keyboard(0).is_err());

        assert_eq!(hook.attempts(), 2);
    }

    #[test]
    fn dead_listener_is_reported() {
        struct ExitingHook;
        impl HookBackend for ExitingHook {
            fn install(&self, _sink: EventSink) -> Result<HookHandle, CaptureError> {
                let (tx, rx) = std::sync::mpsc::channel();
                tx.send(Err(CaptureError::PermissionDenied("revoked".to_string())))
                    .unwrap();
                Ok(HookHandle::watching(rx))
            }
        }

        let engine = CaptureEngine::new(Box::new(ExitingHook), Duration::from_secs(60));
        engine.install_hook(DeviceClass::Mouse).unwrap();

        assert_eq!(
            engine.read_mouse(0),
            Err(CaptureError::PermissionDenied("revoked".to_string()))
        );
    }

    #[test]
    fn shutdown_stops_recording() {
        let hook = ManualHook::new();
        let engine = engine_with(&hook);
        engine.install_hook(DeviceClass::Keyboard).unwrap();

        engine.shutdown();
        hook.key(KeyCode::Char('x'), PressState::Press);

        assert!(!engine.is_enabled(DeviceClass::Keyboard));
        assert!(matches!(
            engine.read_keyboard(0),
            Err(CaptureError::HookStopped(_))
        ));
    }
}
