//! Input-driven widgets used by the places

pub mod text_entry;

pub use text_entry::{EntryEvent, EntryState, TextEntry};
