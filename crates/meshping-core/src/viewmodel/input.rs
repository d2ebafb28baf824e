//! Keyboard routing for the search field
//!
//! Ctrl+F focuses the search field, Escape blurs and clears it. Routing only
//! decides which action applies; the view model performs it.

/// A key as seen by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
}

/// A key press with its modifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyPress {
    /// A key pressed without modifiers
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    /// A key pressed with Ctrl held
    pub fn ctrl(key: Key) -> Self {
        Self { key, ctrl: true }
    }
}

/// What a routed key press asks the view model to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Move focus to the search field
    FocusSearch,
    /// Leave the search field and reset the search to empty
    ClearSearch,
}

/// Map a key press to a search-field action
pub fn route(press: KeyPress) -> Option<InputAction> {
    match press.key {
        Key::Char('f') if press.ctrl => Some(InputAction::FocusSearch),
        Key::Escape => Some(InputAction::ClearSearch),
        _ => None,
    }
}
