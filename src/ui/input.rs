//! Input handling for the TUI.
//!
//! Keys map onto engine commands; a left-button mouse drag becomes a swipe.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tokio::time::Instant;

use crate::app::{App, NUDGE_PX};
use crate::engine::{ActionKind, GestureOutcome, LoadState};

use super::Action;

/// Rows moved by one `j`/`k` press.
const SCROLL_STEP: i64 = 2;

pub(super) fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    now: Instant,
) -> Result<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        return Ok(Action::Quit);
    }

    match code {
        KeyCode::Char('q') => return Ok(Action::Quit),
        KeyCode::Right | KeyCode::Char('c') => app.dispatch(ActionKind::Connect, now),
        KeyCode::Left | KeyCode::Char('x') => app.dispatch(ActionKind::Pass, now),
        KeyCode::Char('l') => app.dispatch(ActionKind::Like, now),
        KeyCode::Char('s') => app.dispatch(ActionKind::Share, now),
        KeyCode::Char(' ') => {
            if let Some(playback) = app.engine.toggle_playback() {
                tracing::debug!(?playback, "Toggled playback");
            }
        }
        KeyCode::Char('m') => {
            let muted = app.engine.toggle_mute();
            app.set_status(if muted { "Muted" } else { "Unmuted" });
        }
        KeyCode::Char('j') | KeyCode::Down => app.scroll_by(SCROLL_STEP),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_by(-SCROLL_STEP),
        KeyCode::Char('>') => app.nudge(NUDGE_PX, now),
        KeyCode::Char('<') => app.nudge(-NUDGE_PX, now),
        KeyCode::Enter => report_release(app, now),
        KeyCode::Esc => {
            app.cancel_drag(now);
            app.resume_snap();
        }
        KeyCode::Char('r') => refresh(app),
        _ => {}
    }
    Ok(Action::Continue)
}

pub(super) fn handle_mouse(app: &mut App, event: MouseEvent, now: Instant) {
    match event.kind {
        MouseEventKind::Down(MouseButton::Left) => app.begin_mouse_drag(event.column, now),
        MouseEventKind::Drag(MouseButton::Left) => app.mouse_drag_to(event.column, now),
        MouseEventKind::Up(MouseButton::Left) => {
            if app.drag_origin.is_some() {
                report_release(app, now);
            }
        }
        MouseEventKind::ScrollDown => app.scroll_by(SCROLL_STEP),
        MouseEventKind::ScrollUp => app.scroll_by(-SCROLL_STEP),
        _ => {}
    }
}

fn report_release(app: &mut App, now: Instant) {
    match app.end_drag(now) {
        GestureOutcome::Committed { direction, .. } => {
            tracing::debug!(?direction, "Swipe committed");
        }
        GestureOutcome::SnapBack => tracing::debug!("Swipe below threshold, snapping back"),
        GestureOutcome::Dragging | GestureOutcome::Ignored => {}
    }
}

fn refresh(app: &mut App) {
    if matches!(app.engine.load_state(), LoadState::Loading) {
        app.set_status("Already loading...");
        return;
    }
    app.set_status("Refreshing feed...");
    app.resume_snap();
    app.engine.refresh();
}
