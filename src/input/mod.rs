//! Input synthesis
//!
//! Pointer motion, clicks, scrolling and typing against the live OS input
//! state. Every operation opens a fresh [`InputSession`] from the configured
//! [`InputDriver`] and drops it before returning, so no device handle outlives
//! a tool call.

mod enigo_driver;
pub mod mock;

pub use enigo_driver::EnigoDriver;

use serde::Deserialize;
use std::fmt;
use std::thread;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("character {character:?} at index {index} cannot be typed")]
    Unencodable { character: char, index: usize },
    #[error("unknown key: {0}")]
    UnknownKey(String),
    #[error("input device unavailable: {0}")]
    Unavailable(String),
    #[error("input operation failed: {0}")]
    Os(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl PointerButton {
    pub fn as_str(self) -> &'static str {
        match self {
            PointerButton::Left => "left",
            PointerButton::Right => "right",
            PointerButton::Middle => "middle",
        }
    }
}

impl fmt::Display for PointerButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Press,
    Release,
    /// Press immediately followed by release
    Click,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Press => "press",
            Direction::Release => "release",
            Direction::Click => "click",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAxis {
    Horizontal,
    Vertical,
}

/// A key the synthesizer can press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthKey {
    Char(char),
    Return,
    Tab,
    Escape,
    Backspace,
    Delete,
    Space,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Shift,
    Control,
    Alt,
    Meta,
    CapsLock,
    /// F1 through F12
    Function(u8),
}

impl SynthKey {
    /// Parse a key name (case-insensitive) or a single character.
    pub fn parse(name: &str) -> Result<Self, InputError> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(match c {
                ' ' => SynthKey::Space,
                '\t' => SynthKey::Tab,
                '\n' | '\r' => SynthKey::Return,
                c if c.is_control() => return Err(InputError::UnknownKey(name.to_string())),
                c => SynthKey::Char(c),
            });
        }

        let lower = name.trim().to_lowercase();
        let key = match lower.as_str() {
            "return" | "enter" => SynthKey::Return,
            "tab" => SynthKey::Tab,
            "escape" | "esc" => SynthKey::Escape,
            "backspace" => SynthKey::Backspace,
            "delete" | "del" => SynthKey::Delete,
            "space" => SynthKey::Space,
            "up" | "uparrow" => SynthKey::Up,
            "down" | "downarrow" => SynthKey::Down,
            "left" | "leftarrow" => SynthKey::Left,
            "right" | "rightarrow" => SynthKey::Right,
            "home" => SynthKey::Home,
            "end" => SynthKey::End,
            "pageup" | "pgup" => SynthKey::PageUp,
            "pagedown" | "pgdn" => SynthKey::PageDown,
            "shift" => SynthKey::Shift,
            "control" | "ctrl" => SynthKey::Control,
            "alt" | "option" => SynthKey::Alt,
            "meta" | "command" | "cmd" | "super" | "win" => SynthKey::Meta,
            "capslock" => SynthKey::CapsLock,
            other => match other.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => SynthKey::Function(n),
                _ => return Err(InputError::UnknownKey(name.to_string())),
            },
        };
        Ok(key)
    }
}

/// Editing shortcuts sent as the platform modifier plus a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemCommand {
    Copy,
    Paste,
    Cut,
    Undo,
    Save,
    SelectAll,
}

impl SystemCommand {
    pub fn as_str(self) -> &'static str {
        match self {
            SystemCommand::Copy => "copy",
            SystemCommand::Paste => "paste",
            SystemCommand::Cut => "cut",
            SystemCommand::Undo => "undo",
            SystemCommand::Save => "save",
            SystemCommand::SelectAll => "select_all",
        }
    }

    pub fn letter(self) -> char {
        match self {
            SystemCommand::Copy => 'c',
            SystemCommand::Paste => 'v',
            SystemCommand::Cut => 'x',
            SystemCommand::Undo => 'z',
            SystemCommand::Save => 's',
            SystemCommand::SelectAll => 'a',
        }
    }

    /// Command on macOS, Control everywhere else.
    pub fn modifier() -> SynthKey {
        if cfg!(target_os = "macos") {
            SynthKey::Meta
        } else {
            SynthKey::Control
        }
    }
}

/// Opens sessions against an input device.
pub trait InputDriver: Send + Sync {
    fn open(&self) -> Result<Box<dyn InputSession>, InputError>;
}

/// A live connection to the OS input system, held for one operation.
pub trait InputSession {
    fn move_pointer(&mut self, x: i32, y: i32) -> Result<(), InputError>;
    fn pointer_location(&self) -> Result<(i32, i32), InputError>;
    fn button(&mut self, button: PointerButton, direction: Direction) -> Result<(), InputError>;
    fn scroll(&mut self, amount: i32, axis: ScrollAxis) -> Result<(), InputError>;
    fn key(&mut self, key: SynthKey, direction: Direction) -> Result<(), InputError>;
}

pub struct InputSynthesizer {
    driver: Box<dyn InputDriver>,
}

impl InputSynthesizer {
    pub fn new(driver: Box<dyn InputDriver>) -> Self {
        Self { driver }
    }

    pub fn mouse_move(&self, x: i32, y: i32) -> Result<(), InputError> {
        self.driver.open()?.move_pointer(x, y)
    }

    /// Move to `(x, y)`, then press and release `button` there.
    pub fn mouse_click(&self, x: i32, y: i32, button: PointerButton) -> Result<(), InputError> {
        let mut session = self.driver.open()?;
        session.move_pointer(x, y)?;
        session.button(button, Direction::Press)?;
        session.button(button, Direction::Release)
    }

    pub fn mouse_double_click(
        &self,
        x: i32,
        y: i32,
        button: PointerButton,
    ) -> Result<(), InputError> {
        let mut session = self.driver.open()?;
        session.move_pointer(x, y)?;
        for _ in 0..2 {
            session.button(button, Direction::Press)?;
            session.button(button, Direction::Release)?;
        }
        Ok(())
    }

    /// Horizontal first, then vertical. A zero amount skips its axis.
    pub fn mouse_scroll(&self, lines_x: i32, lines_y: i32) -> Result<(), InputError> {
        let mut session = self.driver.open()?;
        if lines_x != 0 {
            session.scroll(lines_x, ScrollAxis::Horizontal)?;
        }
        if lines_y != 0 {
            session.scroll(lines_y, ScrollAxis::Vertical)?;
        }
        Ok(())
    }

    pub fn mouse_position(&self) -> Result<(i32, i32), InputError> {
        self.driver.open()?.pointer_location()
    }

    /// Press at the current position, move to the target and release.
    ///
    /// The button is released even when the move fails.
    pub fn mouse_drag(
        &self,
        target_x: i32,
        target_y: i32,
        button: PointerButton,
    ) -> Result<(), InputError> {
        let mut session = self.driver.open()?;
        session.button(button, Direction::Press)?;
        let moved = session.move_pointer(target_x, target_y);
        let released = session.button(button, Direction::Release);
        moved.and(released)
    }

    /// Act on `button` at the current position without moving the pointer.
    pub fn mouse_button_control(
        &self,
        button: PointerButton,
        direction: Direction,
    ) -> Result<(), InputError> {
        self.driver.open()?.button(button, direction)
    }

    /// Visit each point in order, pausing `pause` between consecutive moves.
    ///
    /// Stops at the first failed move; the points before it were visited.
    pub fn mouse_move_path(
        &self,
        points: &[(i32, i32)],
        pause: Duration,
    ) -> Result<(), InputError> {
        let mut session = self.driver.open()?;
        for (index, &(x, y)) in points.iter().enumerate() {
            if index > 0 && !pause.is_zero() {
                thread::sleep(pause);
            }
            session.move_pointer(x, y)?;
        }
        Ok(())
    }

    pub fn key_control(&self, key: SynthKey, direction: Direction) -> Result<(), InputError> {
        self.driver.open()?.key(key, direction)
    }

    /// The modifier is released even when the letter fails.
    pub fn system_command(&self, command: SystemCommand) -> Result<(), InputError> {
        let modifier = SystemCommand::modifier();
        let mut session = self.driver.open()?;

        session.key(modifier, Direction::Press)?;
        let letter = session.key(SynthKey::Char(command.letter()), Direction::Click);
        let released = session.key(modifier, Direction::Release);
        letter.and(released)
    }

    /// Type `text` as one press/release pair per key, in order.
    ///
    /// The whole text is validated before the first key goes out, so an
    /// unencodable character fails the call without typing anything. Returns
    /// the number of keys typed.
    pub fn type_text(&self, text: &str) -> Result<usize, InputError> {
        let keys = encode_text(text)?;
        let mut session = self.driver.open()?;

        for key in &keys {
            session.key(*key, Direction::Press)?;
            session.key(*key, Direction::Release)?;
        }
        Ok(keys.len())
    }
}

/// Map text onto keys. Line breaks become `Return` (`\r\n` counts once) and
/// tabs become `Tab`; any other control character is rejected.
pub fn encode_text(text: &str) -> Result<Vec<SynthKey>, InputError> {
    let mut keys = Vec::with_capacity(text.len());
    let mut chars = text.chars().enumerate().peekable();

    while let Some((index, c)) = chars.next() {
        let key = match c {
            '\r' => {
                chars.next_if(|&(_, next)| next == '\n');
                SynthKey::Return
            }
            '\n' => SynthKey::Return,
            '\t' => SynthKey::Tab,
            c if c.is_control() => {
                return Err(InputError::Unencodable {
                    character: c,
                    index,
                })
            }
            c => SynthKey::Char(c),
        };
        keys.push(key);
    }
    Ok(keys)
}
