//! An input driver that records what it was asked to do instead of touching
//! the OS.

use parking_lot::Mutex;
use std::sync::Arc;

use super::{Direction, InputDriver, InputError, InputSession, PointerButton, ScrollAxis, SynthKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Move { x: i32, y: i32 },
    Button(PointerButton, Direction),
    Scroll(i32, ScrollAxis),
    Key(SynthKey, Direction),
}

#[derive(Default)]
struct Recorded {
    actions: Vec<Action>,
    position: (i32, i32),
    key_actions: usize,
}

#[derive(Clone, Default)]
pub struct RecordingDriver {
    recorded: Arc<Mutex<Recorded>>,
    fail_moves: bool,
    fail_keys_after: Option<usize>,
    unavailable: bool,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pointer move fails with [`InputError::Os`].
    pub fn fail_moves(mut self) -> Self {
        self.fail_moves = true;
        self
    }

    /// The first `n` key actions (presses and releases) succeed, every later
    /// one fails with [`InputError::Os`].
    pub fn fail_keys_after(mut self, n: usize) -> Self {
        self.fail_keys_after = Some(n);
        self
    }

    /// Opening a session fails with [`InputError::Unavailable`].
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn actions(&self) -> Vec<Action> {
        self.recorded.lock().actions.clone()
    }

    /// Keys that were pressed, in order.
    pub fn typed(&self) -> Vec<SynthKey> {
        self.recorded
            .lock()
            .actions
            .iter()
            .filter_map(|action| match action {
                Action::Key(key, Direction::Press | Direction::Click) => Some(*key),
                _ => None,
            })
            .collect()
    }

    /// Where the pointer was last moved to.
    pub fn position(&self) -> (i32, i32) {
        self.recorded.lock().position
    }
}

impl InputDriver for RecordingDriver {
    fn open(&self) -> Result<Box<dyn InputSession>, InputError> {
        if self.unavailable {
            return Err(InputError::Unavailable("no input device".to_string()));
        }
        Ok(Box::new(RecordingSession {
            recorded: Arc::clone(&self.recorded),
            fail_moves: self.fail_moves,
            fail_keys_after: self.fail_keys_after,
        }))
    }
}

struct RecordingSession {
    recorded: Arc<Mutex<Recorded>>,
    fail_moves: bool,
    fail_keys_after: Option<usize>,
}

impl RecordingSession {
    fn push(&self, action: Action) {
        self.recorded.lock().actions.push(action);
    }
}

impl InputSession for RecordingSession {
    fn move_pointer(&mut self, x: i32, y: i32) -> Result<(), InputError> {
        if self.fail_moves {
            return Err(InputError::Os("pointer move rejected".to_string()));
        }
        let mut recorded = self.recorded.lock();
        recorded.actions.push(Action::Move { x, y });
        recorded.position = (x, y);
        Ok(())
    }

    fn pointer_location(&self) -> Result<(i32, i32), InputError> {
        Ok(self.recorded.lock().position)
    }

    fn button(&mut self, button: PointerButton, direction: Direction) -> Result<(), InputError> {
        self.push(Action::Button(button, direction));
        Ok(())
    }

    fn scroll(&mut self, amount: i32, axis: ScrollAxis) -> Result<(), InputError> {
        self.push(Action::Scroll(amount, axis));
        Ok(())
    }

    fn key(&mut self, key: SynthKey, direction: Direction) -> Result<(), InputError> {
        let mut recorded = self.recorded.lock();
        if self
            .fail_keys_after
            .is_some_and(|limit| recorded.key_actions >= limit)
        {
            return Err(InputError::Os("key event rejected".to_string()));
        }
        recorded.key_actions += 1;
        recorded.actions.push(Action::Key(key, direction));
        Ok(())
    }
}
