//! Keyboard and mouse input handling.
//!
//! Maps terminal events to [`App`] actions.  Mouse drags on the top card
//! become pointer samples for its animation controller; the arrow keys fling
//! the card without a drag.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist).
//! 2. Add a `KeyCode` match arm in [`handle_key_event`] that calls it.
//! 3. Update the help text in [`crate::ui`]'s status bar.

use std::time::Instant;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::App;
use crate::gesture::Decision;

pub fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(key) => handle_key_event(app, key),
        Event::Mouse(mouse) => handle_mouse_event(app, mouse, Instant::now()),
        _ => {}
    }
}

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.confirm_reset {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => app.confirm_reset(),
            KeyCode::Char('n') | KeyCode::Esc => app.cancel_reset(),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Right | KeyCode::Char('l') => app.swipe(Decision::Like),
        KeyCode::Left | KeyCode::Char('h') => app.swipe(Decision::Reject),
        KeyCode::Char('r') => app.request_reset(),
        KeyCode::Char('L') => app.logout(),
        _ => {}
    }
}

pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, now: Instant) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => app.pointer_down(mouse.column, mouse.row, now),
        MouseEventKind::Drag(MouseButton::Left) => app.pointer_drag(mouse.column, now),
        MouseEventKind::Up(MouseButton::Left) => app.pointer_up(now),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::{KeyEventState, KeyModifiers};

    use super::*;
    use crate::coordinator::DEFAULT_REFILL_DEBOUNCE;
    use crate::engine::FeedEngine;
    use crate::gesture::Thresholds;
    use crate::session::TokenSession;
    use crate::source::mock::MockFeedService;

    fn app() -> App {
        let engine = FeedEngine::new(
            MockFeedService::new(),
            Arc::new(TokenSession::new("t")),
            DEFAULT_REFILL_DEBOUNCE,
        );
        App::new(engine, Thresholds::default(), 12.0)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn q_quits() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(app.quit);
    }

    #[test]
    fn key_release_is_ignored() {
        let mut app = app();
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        handle_key_event(&mut app, release);
        assert!(!app.quit);
    }

    #[test]
    fn dialog_captures_keys_until_dismissed() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Char('r')));
        assert!(app.confirm_reset);

        // q does not quit while the dialog is open
        handle_key_event(&mut app, press(KeyCode::Char('q')));
        assert!(!app.quit);

        handle_key_event(&mut app, press(KeyCode::Esc));
        assert!(!app.confirm_reset);
        assert!(!app.quit);
    }

    #[test]
    fn shift_l_logs_out() {
        let mut app = app();
        handle_key_event(&mut app, press(KeyCode::Char('L')));
        assert!(app.quit);
        assert!(!app.engine.session_active());
    }
}
