//! Keyboard shortcuts for the canvas
//!
//! Maps key chords delivered by the host to editor commands. `ctrl` stands
//! for Cmd on macOS; the host folds the two together.

use serde::{Deserialize, Serialize};

/// A key relevant to the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    Char(char),
    Delete,
    Backspace,
    Escape,
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
    pub shift: bool,
}

impl KeyChord {
    /// Key without modifiers
    pub fn plain(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            shift: false,
        }
    }

    /// Ctrl (Cmd) + character
    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
            shift: false,
        }
    }

    /// Ctrl (Cmd) + Shift + character
    pub fn ctrl_shift(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
            shift: true,
        }
    }
}

/// Editor command reachable from the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorCommand {
    Copy,
    Paste,
    Undo,
    Redo,
    SelectAll,
    DeleteSelected,
    /// Cancel a staged candidate, otherwise clear the selection
    Escape,
}

/// Look up the command bound to a chord
pub fn command_for(chord: &KeyChord) -> Option<EditorCommand> {
    match (chord.key, chord.ctrl, chord.shift) {
        (Key::Escape, _, _) => Some(EditorCommand::Escape),
        (Key::Delete | Key::Backspace, false, _) => Some(EditorCommand::DeleteSelected),
        (Key::Char(c), true, shift) => match (c.to_ascii_lowercase(), shift) {
            ('c', false) => Some(EditorCommand::Copy),
            ('v', false) => Some(EditorCommand::Paste),
            ('a', false) => Some(EditorCommand::SelectAll),
            ('z', false) => Some(EditorCommand::Undo),
            ('z', true) | ('y', false) => Some(EditorCommand::Redo),
            _ => None,
        },
        _ => None,
    }
}
