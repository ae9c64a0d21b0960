//! OS listener backed by `rdev`
//!
//! `rdev::listen` blocks its thread for the lifetime of the process, so the
//! listener runs on a dedicated thread and reports its exit status through a
//! channel. Installation waits a bounded probe interval for an immediate
//! failure (missing permission, no display) before treating the hook as live.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use rdev::{Button, EventType, Key};

use super::{
    CaptureError, EventSink, HookBackend, HookHandle, KeyCode, MouseButton, MouseEventKind,
    NativeEvent, PressState,
};

pub struct RdevHook {
    probe: Duration,
}

impl RdevHook {
    pub fn new(probe: Duration) -> Self {
        Self { probe }
    }
}

impl HookBackend for RdevHook {
    fn install(&self, sink: EventSink) -> Result<HookHandle, CaptureError> {
        let (exit_tx, exit_rx) = mpsc::channel();

        thread::Builder::new()
            .name("input-hook".to_string())
            .spawn(move || {
                let result = rdev::listen(move |event| {
                    let time = event.time;
                    sink.deliver(time, translate(event.event_type));
                });

                let status = result.map_err(|error| {
                    tracing::error!("Input listener failed: {:?}", error);
                    CaptureError::PermissionDenied(format!("{:?}", error))
                });
                let _ = exit_tx.send(status);
            })
            .map_err(|e| CaptureError::Spawn(e.to_string()))?;

        match exit_rx.recv_timeout(self.probe) {
            Err(RecvTimeoutError::Timeout) => Ok(HookHandle::watching(exit_rx)),
            Ok(Err(error)) => Err(error),
            Ok(Ok(())) => Err(CaptureError::HookStopped(
                "listener returned immediately".to_string(),
            )),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::HookStopped(
                "listener thread exited".to_string(),
            )),
        }
    }
}

fn translate(event_type: EventType) -> NativeEvent {
    match event_type {
        EventType::KeyPress(key) => NativeEvent::key(key_code(key), PressState::Press),
        EventType::KeyRelease(key) => NativeEvent::key(key_code(key), PressState::Release),
        EventType::ButtonPress(button) => NativeEvent::mouse(MouseEventKind::Button {
            button: mouse_button(button),
            state: PressState::Press,
        }),
        EventType::ButtonRelease(button) => NativeEvent::mouse(MouseEventKind::Button {
            button: mouse_button(button),
            state: PressState::Release,
        }),
        EventType::MouseMove { x, y } => NativeEvent::mouse(MouseEventKind::Move {
            x: x.round() as i32,
            y: y.round() as i32,
        }),
        EventType::Wheel { delta_x, delta_y } => {
            NativeEvent::mouse(MouseEventKind::Scroll { delta_x, delta_y })
        }
    }
}

fn mouse_button(button: Button) -> MouseButton {
    match button {
        Button::Left => MouseButton::Left,
        Button::Right => MouseButton::Right,
        Button::Middle => MouseButton::Middle,
        Button::Unknown(n) => MouseButton::Other(n),
    }
}

fn key_code(key: Key) -> KeyCode {
    if let Key::Unknown(code) = key {
        return KeyCode::ScanCode(code);
    }
    if let Some(c) = key_char(key) {
        return KeyCode::Char(c);
    }

    let name = match key {
        Key::Alt => "Alt",
        Key::AltGr => "AltGr",
        Key::Backspace => "Backspace",
        Key::CapsLock => "CapsLock",
        Key::ControlLeft => "LeftControl",
        Key::ControlRight => "RightControl",
        Key::Delete => "Delete",
        Key::DownArrow => "Down",
        Key::End => "End",
        Key::Escape => "Escape",
        Key::F1 => "F1",
        Key::F2 => "F2",
        Key::F3 => "F3",
        Key::F4 => "F4",
        Key::F5 => "F5",
        Key::F6 => "F6",
        Key::F7 => "F7",
        Key::F8 => "F8",
        Key::F9 => "F9",
        Key::F10 => "F10",
        Key::F11 => "F11",
        Key::F12 => "F12",
        Key::Home => "Home",
        Key::LeftArrow => "Left",
        Key::MetaLeft => "LeftMeta",
        Key::MetaRight => "RightMeta",
        Key::PageDown => "PageDown",
        Key::PageUp => "PageUp",
        Key::Return => "Enter",
        Key::RightArrow => "Right",
        Key::ShiftLeft => "LeftShift",
        Key::ShiftRight => "RightShift",
        Key::Space => "Space",
        Key::Tab => "Tab",
        Key::UpArrow => "Up",
        Key::PrintScreen => "PrintScreen",
        Key::ScrollLock => "ScrollLock",
        Key::Pause => "Pause",
        Key::NumLock => "NumLock",
        Key::Insert => "Insert",
        Key::KpReturn => "NumpadEnter",
        Key::KpMinus => "NumpadSubtract",
        Key::KpPlus => "NumpadAdd",
        Key::KpMultiply => "NumpadMultiply",
        Key::KpDivide => "NumpadDivide",
        Key::KpDelete => "NumpadDelete",
        Key::Function => "Function",
        other => return KeyCode::Named(format!("{:?}", other)),
    };
    KeyCode::named(name)
}

/// The unshifted character a key produces on a US layout.
fn key_char(key: Key) -> Option<char> {
    let c = match key {
        Key::KeyA => 'a',
        Key::KeyB => 'b',
        Key::KeyC => 'c',
        Key::KeyD => 'd',
        Key::KeyE => 'e',
        Key::KeyF => 'f',
        Key::KeyG => 'g',
        Key::KeyH => 'h',
        Key::KeyI => 'i',
        Key::KeyJ => 'j',
        Key::KeyK => 'k',
        Key::KeyL => 'l',
        Key::KeyM => 'm',
        Key::KeyN => 'n',
        Key::KeyO => 'o',
        Key::KeyP => 'p',
        Key::KeyQ => 'q',
        Key::KeyR => 'r',
        Key::KeyS => 's',
        Key::KeyT => 't',
        Key::KeyU => 'u',
        Key::KeyV => 'v',
        Key::KeyW => 'w',
        Key::KeyX => 'x',
        Key::KeyY => 'y',
        Key::KeyZ => 'z',
        Key::Num0 | Key::Kp0 => '0',
        Key::Num1 | Key::Kp1 => '1',
        Key::Num2 | Key::Kp2 => '2',
        Key::Num3 | Key::Kp3 => '3',
        Key::Num4 | Key::Kp4 => '4',
        Key::Num5 | Key::Kp5 => '5',
        Key::Num6 | Key::Kp6 => '6',
        Key::Num7 | Key::Kp7 => '7',
        Key::Num8 | Key::Kp8 => '8',
        Key::Num9 | Key::Kp9 => '9',
        Key::BackQuote => '`',
        Key::Minus => '-',
        Key::Equal => '=',
        Key::LeftBracket => '[',
        Key::RightBracket => ']',
        Key::BackSlash | Key::IntlBackslash => '\\',
        Key::SemiColon => ';',
        Key::Quote => '\'',
        Key::Comma => ',',
        Key::Dot => '.',
        Key::Slash => '/',
        _ => return None,
    };
    Some(c)
}
