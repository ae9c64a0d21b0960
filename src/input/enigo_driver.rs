//! Input driver backed by `enigo`

use enigo::{Axis, Button, Coordinate, Enigo, Key, Keyboard, Mouse, Settings};

use super::{Direction, InputDriver, InputError, InputSession, PointerButton, ScrollAxis, SynthKey};

#[derive(Debug, Default)]
pub struct EnigoDriver;

impl InputDriver for EnigoDriver {
    fn open(&self) -> Result<Box<dyn InputSession>, InputError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InputError::Unavailable(format!("{:?}", e)))?;
        Ok(Box::new(EnigoSession { enigo }))
    }
}

struct EnigoSession {
    enigo: Enigo,
}

impl InputSession for EnigoSession {
    fn move_pointer(&mut self, x: i32, y: i32) -> Result<(), InputError> {
        self.enigo
            .move_mouse(x, y, Coordinate::Abs)
            .map_err(os_error)
    }

    fn pointer_location(&self) -> Result<(i32, i32), InputError> {
        self.enigo.location().map_err(os_error)
    }

    fn button(&mut self, button: PointerButton, direction: Direction) -> Result<(), InputError> {
        let button = match button {
            PointerButton::Left => Button::Left,
            PointerButton::Right => Button::Right,
            PointerButton::Middle => Button::Middle,
        };
        self.enigo
            .button(button, to_enigo_direction(direction))
            .map_err(os_error)
    }

    fn scroll(&mut self, amount: i32, axis: ScrollAxis) -> Result<(), InputError> {
        let axis = match axis {
            ScrollAxis::Horizontal => Axis::Horizontal,
            ScrollAxis::Vertical => Axis::Vertical,
        };
        self.enigo.scroll(amount, axis).map_err(os_error)
    }

    fn key(&mut self, key: SynthKey, direction: Direction) -> Result<(), InputError> {
        self.enigo
            .key(to_enigo_key(key), to_enigo_direction(direction))
            .map_err(os_error)
    }
}

fn os_error(error: enigo::InputError) -> InputError {
    InputError::Os(format!("{:?}", error))
}

fn to_enigo_direction(direction: Direction) -> enigo::Direction {
    match direction {
        Direction::Press => enigo::Direction::Press,
        Direction::Release => enigo::Direction::Release,
        Direction::Click => enigo::Direction::Click,
    }
}

fn to_enigo_key(key: SynthKey) -> Key {
    match key {
        SynthKey::Char(c) => Key::Unicode(c),
        SynthKey::Return => Key::Return,
        SynthKey::Tab => Key::Tab,
        SynthKey::Escape => Key::Escape,
        SynthKey::Backspace => Key::Backspace,
        SynthKey::Delete => Key::Delete,
        SynthKey::Space => Key::Space,
        SynthKey::Up => Key::UpArrow,
        SynthKey::Down => Key::DownArrow,
        SynthKey::Left => Key::LeftArrow,
        SynthKey::Right => Key::RightArrow,
        SynthKey::Home => Key::Home,
        SynthKey::End => Key::End,
        SynthKey::PageUp => Key::PageUp,
        SynthKey::PageDown => Key::PageDown,
        SynthKey::Shift => Key::Shift,
        SynthKey::Control => Key::Control,
        SynthKey::Alt => Key::Alt,
        SynthKey::Meta => Key::Meta,
        SynthKey::CapsLock => Key::CapsLock,
        SynthKey::Function(n) => match n {
            1 => Key::F1,
            2 => Key::F2,
            3 => Key::F3,
            4 => Key::F4,
            5 => Key::F5,
            6 => Key::F6,
            7 => Key::F7,
            8 => Key::F8,
            9 => Key::F9,
            10 => Key::F10,
            11 => Key::F11,
            _ => Key::F12,
        },
    }
}
