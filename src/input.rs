//! Key bindings: arrows and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use sandconnect::Intent;

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Pause,
    Quit,
    /// Any other key; starts or restarts a game from the menu screens.
    Other,
    None,
}

impl Action {
    /// The simulation intent this action maps to while playing.
    pub fn intent(self) -> Option<Intent> {
        match self {
            Self::MoveLeft => Some(Intent::MoveLeft),
            Self::MoveRight => Some(Intent::MoveRight),
            Self::SoftDrop => Some(Intent::SoftDrop),
            Self::Pause => Some(Intent::TogglePause),
            Self::Quit | Self::Other | Self::None => None,
        }
    }
}

/// Map key event to game action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        _ => Action::Other,
    }
}
