//! Input Module - crossterm event conversion and polling.
//!
//! # API
//!
//! - `convert_event` - Convert a crossterm event to an [`InputEvent`]
//! - `poll_event` - Non-blocking event check with timeout
//! - `enable_mouse` / `disable_mouse` - Control mouse capture

use std::io::stdout;
use std::time::Duration;

use crossterm::event::{
    poll, read, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, KeyCode,
    KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;

// =============================================================================
// INPUT EVENT ENUM
// =============================================================================

/// The events the run loop cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Left button pressed at a cell.
    Click { x: u16, y: u16 },
    /// `q`, `Esc` or Ctrl+C.
    Quit,
    /// Any other key press, named the way the DOM names keys.
    Key(String),
    /// Terminal resized to (width, height).
    Resize(u16, u16),
    /// Ignored event.
    None,
}

// =============================================================================
// CONVERSION
// =============================================================================

pub fn convert_event(event: CrosstermEvent) -> InputEvent {
    match event {
        CrosstermEvent::Mouse(mouse) => convert_mouse_event(mouse),
        CrosstermEvent::Key(key) => convert_key_event(key),
        CrosstermEvent::Resize(width, height) => InputEvent::Resize(width, height),
        _ => InputEvent::None,
    }
}

fn convert_mouse_event(event: MouseEvent) -> InputEvent {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => InputEvent::Click {
            x: event.column,
            y: event.row,
        },
        _ => InputEvent::None,
    }
}

fn convert_key_event(event: KeyEvent) -> InputEvent {
    if event.kind != KeyEventKind::Press {
        return InputEvent::None;
    }
    match event.code {
        KeyCode::Char('c') if event.modifiers.contains(KeyModifiers::CONTROL) => InputEvent::Quit,
        KeyCode::Char('q') | KeyCode::Esc => InputEvent::Quit,
        KeyCode::Char(c) => InputEvent::Key(c.to_string()),
        KeyCode::Enter => InputEvent::Key("Enter".to_string()),
        KeyCode::Tab => InputEvent::Key("Tab".to_string()),
        KeyCode::Backspace => InputEvent::Key("Backspace".to_string()),
        KeyCode::Up => InputEvent::Key("ArrowUp".to_string()),
        KeyCode::Down => InputEvent::Key("ArrowDown".to_string()),
        KeyCode::Left => InputEvent::Key("ArrowLeft".to_string()),
        KeyCode::Right => InputEvent::Key("ArrowRight".to_string()),
        KeyCode::F(n) => InputEvent::Key(format!("F{n}")),
        _ => InputEvent::None,
    }
}

// =============================================================================
// EVENT POLLING
// =============================================================================

/// Poll for an event with timeout. Returns `None` if nothing arrived.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<InputEvent>> {
    if poll(timeout)? {
        Ok(Some(convert_event(read()?)))
    } else {
        Ok(None)
    }
}

// =============================================================================
// MOUSE CAPTURE
// =============================================================================

pub fn enable_mouse() -> std::io::Result<()> {
    execute!(stdout(), EnableMouseCapture)
}

pub fn disable_mouse() -> std::io::Result<()> {
    execute!(stdout(), DisableMouseCapture)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> CrosstermEvent {
        CrosstermEvent::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn key(code: KeyCode, modifiers: KeyModifiers, kind: KeyEventKind) -> CrosstermEvent {
        CrosstermEvent::Key(KeyEvent {
            code,
            modifiers,
            kind,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn test_left_press_is_click() {
        let event = convert_event(mouse(MouseEventKind::Down(MouseButton::Left), 7, 2));
        assert_eq!(event, InputEvent::Click { x: 7, y: 2 });
    }

    #[test]
    fn test_other_mouse_events_ignored() {
        assert_eq!(convert_event(mouse(MouseEventKind::Down(MouseButton::Right), 0, 0)), InputEvent::None);
        assert_eq!(convert_event(mouse(MouseEventKind::Moved, 0, 0)), InputEvent::None);
        assert_eq!(convert_event(mouse(MouseEventKind::Up(MouseButton::Left), 0, 0)), InputEvent::None);
    }

    #[test]
    fn test_quit_keys() {
        let press = KeyEventKind::Press;
        assert_eq!(convert_event(key(KeyCode::Char('q'), KeyModifiers::NONE, press)), InputEvent::Quit);
        assert_eq!(convert_event(key(KeyCode::Esc, KeyModifiers::NONE, press)), InputEvent::Quit);
        assert_eq!(convert_event(key(KeyCode::Char('c'), KeyModifiers::CONTROL, press)), InputEvent::Quit);
        assert_eq!(
            convert_event(key(KeyCode::Char('c'), KeyModifiers::NONE, press)),
            InputEvent::Key("c".to_string())
        );
    }

    #[test]
    fn test_key_release_ignored() {
        let event = convert_event(key(KeyCode::Char('q'), KeyModifiers::NONE, KeyEventKind::Release));
        assert_eq!(event, InputEvent::None);
    }

    #[test]
    fn test_resize() {
        assert_eq!(convert_event(CrosstermEvent::Resize(100, 30)), InputEvent::Resize(100, 30));
    }
}
