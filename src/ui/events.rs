//! Engine event handling.
//!
//! Completions of spawned service calls and due timers are applied to the
//! engine here, then any user-facing error is surfaced on the status line.

use tokio::time::Instant;

use crate::app::App;
use crate::engine::{EngineEvent, LoadState};

/// Number of frames in the loading spinner animation.
pub(super) const SPINNER_FRAMES: usize = 10;

pub(super) fn handle_engine_event(app: &mut App, event: EngineEvent, now: Instant) {
    let was_loading = matches!(app.engine.load_state(), LoadState::Loading);
    app.engine.handle_event(event, now);
    if was_loading && matches!(app.engine.load_state(), LoadState::Ready) {
        let count = app.engine.cursor().len();
        app.set_status(format!("Loaded {count} pitches"));
    }
    app.collect_engine_error();
}

/// Fire every engine timer due at `now`.
pub(super) fn handle_deadline(app: &mut App, now: Instant) {
    app.engine.fire_due(now);
    app.collect_engine_error();
}

/// Per-frame work: scroll animation, visibility sampling, spinner.
pub(super) fn handle_tick(app: &mut App, now: Instant) {
    if app.step_scroll() {
        app.needs_redraw = true;
    }
    app.sync_visibility(now);

    if matches!(app.engine.load_state(), LoadState::Loading) {
        app.spinner_frame = (app.spinner_frame + 1) % SPINNER_FRAMES;
        app.needs_redraw = true;
    }
}
