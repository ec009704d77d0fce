//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};

use bookdesk_core::BookingStatus;

use crate::app::{App, AppState, ReviewTab, PAGE_SCROLL_SIZE};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    // The confirmation prompt blocks everything else while it is open
    if app.gate.is_visible() {
        handle_confirmation_input(app, key);
        return Ok(false);
    }

    // Handle help overlay
    if matches!(app.state, AppState::ShowingHelp) {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            app.state = AppState::Normal;
        }
        return Ok(false);
    }

    // Handle quit confirmation
    if matches!(app.state, AppState::ConfirmingQuit) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.state = AppState::Quitting;
                return Ok(true);
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
            }
            _ => {}
        }
        return Ok(false);
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => app.switch_tab(ReviewTab::Pending),
        KeyCode::Char('2') => app.switch_tab(ReviewTab::Approved),
        KeyCode::Char('3') => app.switch_tab(ReviewTab::Declined),
        KeyCode::Char('4') => app.switch_tab(ReviewTab::Availability),
        KeyCode::Left => app.switch_tab(app.current_tab.prev()),
        KeyCode::Right | KeyCode::Tab => app.switch_tab(app.current_tab.next()),
        KeyCode::Char('r') => app.refresh(),
        _ => handle_queue_input(app, key),
    }

    Ok(false)
}

fn handle_confirmation_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm(),
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.cancel(),
        _ => {}
    }
}

/// Keys that act on the booking list.
fn handle_queue_input(app: &mut App, key: KeyEvent) {
    if app.current_tab == ReviewTab::Availability {
        return;
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(1),
        KeyCode::PageUp => app.move_cursor(-(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => app.move_cursor(PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => app.cursor_to_start(),
        KeyCode::End => app.cursor_to_end(),
        KeyCode::Enter => app.open_detail(),
        KeyCode::Char(' ') => app.toggle_cursor_selection(),
        KeyCode::Char('a') => app.select_all(),
        KeyCode::Char('c') | KeyCode::Esc => app.clear_selection(),
        KeyCode::Char('A') => app.request_transition(BookingStatus::Approved),
        KeyCode::Char('D') => app.request_transition(BookingStatus::Declined),
        KeyCode::Char('P') => app.request_transition(BookingStatus::Pending),
        _ => {}
    }
}
