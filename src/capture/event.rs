//! Keyboard and mouse events as recorded in the capture logs

use serde::{Serialize, Serializer};
use std::fmt;

/// The two independently logged device classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Keyboard,
    Mouse,
}

impl DeviceClass {
    pub const ALL: [DeviceClass; 2] = [DeviceClass::Keyboard, DeviceClass::Mouse];

    pub fn as_str(self) -> &'static str {
        match self {
            DeviceClass::Keyboard => "keyboard",
            DeviceClass::Mouse => "mouse",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PressState {
    Press,
    Release,
}

/// Identity of a key as observed by the OS hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum KeyCode {
    /// A key that produces a character, in its unshifted form
    Char(char),
    /// A non-printing key such as `Enter` or `LeftShift`
    Named(String),
    /// A key the hook could not identify
    #[serde(rename = "scancode")]
    ScanCode(u32),
}

impl KeyCode {
    pub fn named(name: impl Into<String>) -> Self {
        KeyCode::Named(name.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardEvent {
    pub key: KeyCode,
    pub state: PressState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Other(u8),
}

impl Serialize for MouseButton {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MouseButton::Left => serializer.serialize_str("left"),
            MouseButton::Middle => serializer.serialize_str("middle"),
            MouseButton::Right => serializer.serialize_str("right"),
            MouseButton::Other(n) => serializer.serialize_str(&format!("other_{}", n)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MouseEventKind {
    Move { x: i32, y: i32 },
    Button { button: MouseButton, state: PressState },
    Scroll { delta_x: i64, delta_y: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
}

/// An event handed to the capture engine by a hook backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeEvent {
    Keyboard(KeyboardEvent),
    Mouse(MouseEvent),
}

impl NativeEvent {
    pub fn key(key: KeyCode, state: PressState) -> Self {
        NativeEvent::Keyboard(KeyboardEvent { key, state })
    }

    pub fn mouse(kind: MouseEventKind) -> Self {
        NativeEvent::Mouse(MouseEvent { kind })
    }

    pub fn device_class(&self) -> DeviceClass {
        match self {
            NativeEvent::Keyboard(_) => DeviceClass::Keyboard,
            NativeEvent::Mouse(_) => DeviceClass::Mouse,
        }
    }
}
