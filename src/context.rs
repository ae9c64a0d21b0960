//! The explicitly owned server context
//!
//! Holds the capture engine with its logs, the input synthesizer and the
//! screen grabber. Built once at startup and passed to the dispatcher.

use crate::capture::{CaptureEngine, DeviceClass, HookBackend, RdevHook};
use crate::config::Config;
use crate::input::{EnigoDriver, InputDriver, InputSynthesizer};
use crate::screen::{ScreenGrabber, XcapGrabber};

pub struct Context {
    pub capture: CaptureEngine,
    pub input: InputSynthesizer,
    pub screen: Box<dyn ScreenGrabber>,
}

impl Context {
    /// A context wired to the real OS backends.
    pub fn new(config: &Config) -> Self {
        Self::with_backends(
            Box::new(RdevHook::new(config.hook_probe)),
            Box::new(EnigoDriver),
            Box::new(XcapGrabber),
            config,
        )
    }

    pub fn with_backends(
        hook: Box<dyn HookBackend>,
        input: Box<dyn InputDriver>,
        screen: Box<dyn ScreenGrabber>,
        config: &Config,
    ) -> Self {
        let context = Self {
            capture: CaptureEngine::new(hook, config.permission_retry),
            input: InputSynthesizer::new(input),
            screen,
        };

        if config.eager_hooks {
            for class in DeviceClass::ALL {
                if let Err(e) = context.capture.install_hook(class) {
                    tracing::warn!("{} monitoring unavailable at startup: {}", class, e);
                }
            }
        }

        context
    }

    /// Stop recording. Safe to call more than once.
    pub fn shutdown(&self) {
        self.capture.shutdown();
    }
}
