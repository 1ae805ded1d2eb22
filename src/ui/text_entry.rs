//! Single-line text entry driven by per-tick input

use crate::platform::{Key, TickInput};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    Idle,
    Editing { buffer: String },
    Committed(String),
}

/// What one tick of input did to the entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryEvent {
    None,
    Changed,
    Committed(String),
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct TextEntry {
    state: EntryState,
    max_len: usize,
    accept: fn(char) -> bool,
}

impl TextEntry {
    pub fn new(max_len: usize, accept: fn(char) -> bool) -> Self {
        Self {
            state: EntryState::Idle,
            max_len,
            accept,
        }
    }

    /// Entry that takes decimal digits (seeds)
    pub fn digits(max_len: usize) -> Self {
        Self::new(max_len, |c| c.is_ascii_digit())
    }

    pub fn state(&self) -> &EntryState {
        &self.state
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, EntryState::Editing { .. })
    }

    /// Current text, whatever the state
    pub fn text(&self) -> &str {
        match &self.state {
            EntryState::Idle => "",
            EntryState::Editing { buffer } => buffer.as_str(),
            EntryState::Committed(text) => text.as_str(),
        }
    }

    /// Start editing, keeping committed text as the starting buffer
    pub fn begin(&mut self) {
        let buffer = self.text().to_string();
        self.state = EntryState::Editing { buffer };
    }

    pub fn reset(&mut self) {
        self.state = EntryState::Idle;
    }

    pub fn update(&mut self, input: &TickInput) -> EntryEvent {
        let EntryState::Editing { buffer } = &mut self.state else {
            return EntryEvent::None;
        };

        let mut changed = false;
        for &c in &input.typed {
            if buffer.chars().count() < self.max_len && (self.accept)(c) {
                buffer.push(c);
                changed = true;
            }
        }
        for &key in &input.pressed {
            match key {
                Key::Backspace => changed |= buffer.pop().is_some(),
                Key::Confirm => {
                    let text = std::mem::take(buffer);
                    self.state = EntryState::Committed(text.clone());
                    return EntryEvent::Committed(text);
                }
                Key::Cancel => {
                    self.state = EntryState::Idle;
                    return EntryEvent::Cancelled;
                }
                _ => {}
            }
        }
        if changed { EntryEvent::Changed } else { EntryEvent::None }
    }
}
