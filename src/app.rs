//! Terminal host state around the [`FeedEngine`].
//!
//! The host owns layout: cards are stacked vertically, one viewport tall,
//! and the viewport snap-scrolls toward the active card. Every frame the
//! mounted cards' geometry is fed to the engine's visibility tracker.

use std::borrow::Cow;
use tokio::time::Instant;

use crate::engine::{
    ActionKind, DragInput, EngineError, FeedEngine, GestureOutcome, ItemExtent, ShareCapability,
    SharePayload, Viewport,
};
use crate::util::validate_url_for_open;

/// Horizontal pixels represented by one terminal column during a drag.
pub const PX_PER_COLUMN: f64 = 8.0;

/// Displacement added by one `<`/`>` key press.
pub const NUDGE_PX: f64 = 40.0;

/// Card height before the first frame reports the real viewport.
const INITIAL_CARD_HEIGHT: u16 = 8;

/// Cards kept mounted before and after the active one.
const MOUNT_BEHIND: usize = 1;
const MOUNT_AHEAD: usize = 2;

/// How long a status message stays up.
const STATUS_SECS: u64 = 3;

/// Share capability for the terminal: opens the link in the system browser.
pub struct BrowserShare;

impl ShareCapability for BrowserShare {
    fn share(&self, payload: &SharePayload) -> Result<(), EngineError> {
        let url = validate_url_for_open(&payload.url).map_err(|e| {
            tracing::warn!(url = %payload.url, error = %e, "Refusing to open share link");
            EngineError::CapabilityUnavailable
        })?;
        open::that(url.as_str()).map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Failed to open share link");
            EngineError::CapabilityUnavailable
        })
    }
}

pub struct App {
    pub engine: FeedEngine,

    /// Viewport top in strip rows. Card `i` starts at `i * card_height`.
    pub scroll_offset: i64,
    pub card_height: u16,
    pub viewport_height: u16,
    /// Set by manual scrolling; cleared when the active card changes.
    manual_scroll: bool,
    last_position: usize,

    /// Column where the current mouse drag started.
    pub drag_origin: Option<u16>,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub spinner_frame: usize,
    pub needs_redraw: bool,
}

impl App {
    pub fn new(engine: FeedEngine) -> Self {
        Self {
            engine,
            scroll_offset: 0,
            card_height: INITIAL_CARD_HEIGHT,
            viewport_height: INITIAL_CARD_HEIGHT,
            manual_scroll: false,
            last_position: 0,
            drag_origin: None,
            status_message: None,
            spinner_frame: 0,
            needs_redraw: true,
        }
    }

    // ------------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------------

    /// Record the strip area's height. Cards are exactly one viewport tall,
    /// so the active card can always reach full occupancy.
    pub fn set_viewport_height(&mut self, height: u16) {
        if height != self.viewport_height {
            let position = self.engine.cursor().position() as i64;
            self.viewport_height = height;
            self.card_height = height.max(1);
            if !self.manual_scroll {
                self.scroll_offset = position * i64::from(self.card_height);
            }
        }
    }

    pub fn viewport(&self) -> Viewport {
        Viewport {
            top: self.scroll_offset,
            height: u32::from(self.viewport_height),
        }
    }

    /// Index range of cards currently mounted in the strip.
    pub fn mounted_range(&self) -> std::ops::Range<usize> {
        let cursor = self.engine.cursor();
        let start = cursor.position().saturating_sub(MOUNT_BEHIND);
        let end = (cursor.position() + MOUNT_AHEAD + 1).min(cursor.len());
        start.min(end)..end
    }

    pub fn card_top(&self, index: usize) -> i64 {
        index as i64 * i64::from(self.card_height)
    }

    pub fn mounted_extents(&self) -> Vec<ItemExtent> {
        let items = self.engine.cursor().items();
        self.mounted_range()
            .map(|i| ItemExtent {
                item_id: items[i].id.clone(),
                top: self.card_top(i),
                height: u32::from(self.card_height),
            })
            .collect()
    }

    /// Feed the current geometry through the visibility tracker.
    pub fn sync_visibility(&mut self, now: Instant) {
        let extents = self.mounted_extents();
        let viewport = self.viewport();
        self.engine.observe(&extents, viewport, now);
    }

    fn snap_target(&self) -> i64 {
        self.card_top(self.engine.cursor().position())
    }

    /// Move one animation step toward the active card. Returns true if the
    /// viewport moved.
    pub fn step_scroll(&mut self) -> bool {
        let position = self.engine.cursor().position();
        if position != self.last_position {
            self.last_position = position;
            self.manual_scroll = false;
        }
        if self.manual_scroll {
            return false;
        }
        let distance = self.snap_target() - self.scroll_offset;
        if distance == 0 {
            return false;
        }
        let step = (distance.abs() / 3).max(1);
        self.scroll_offset += step * distance.signum();
        true
    }

    /// Scroll by hand, e.g. to peek at the next card.
    pub fn scroll_by(&mut self, rows: i64) {
        let max = self.card_top(self.engine.cursor().len().saturating_sub(1));
        self.scroll_offset = (self.scroll_offset + rows).clamp(0, max.max(0));
        self.manual_scroll = true;
    }

    /// Drop back to the active card after a manual scroll.
    pub fn resume_snap(&mut self) {
        self.manual_scroll = false;
    }

    // ------------------------------------------------------------------------
    // Gestures
    // ------------------------------------------------------------------------

    pub fn begin_mouse_drag(&mut self, column: u16, now: Instant) {
        let Some(id) = self.engine.cursor().current_id().cloned() else {
            return;
        };
        if self.engine.drag(DragInput::Start(id), now) == GestureOutcome::Dragging {
            self.drag_origin = Some(column);
        }
    }

    pub fn mouse_drag_to(&mut self, column: u16, now: Instant) {
        if let Some(origin) = self.drag_origin {
            let dx = (f64::from(column) - f64::from(origin)) * PX_PER_COLUMN;
            self.engine.drag(DragInput::MoveTo(dx), now);
        }
    }

    pub fn end_drag(&mut self, now: Instant) -> GestureOutcome {
        self.drag_origin = None;
        self.engine.drag(DragInput::Release, now)
    }

    pub fn cancel_drag(&mut self, now: Instant) {
        self.drag_origin = None;
        self.engine.drag(DragInput::Cancel, now);
    }

    /// Keyboard drag: starts a drag on the active card if none is running.
    pub fn nudge(&mut self, dx: f64, now: Instant) {
        if self.engine.drag_presentation().is_none() {
            let Some(id) = self.engine.cursor().current_id().cloned() else {
                return;
            };
            if self.engine.drag(DragInput::Start(id), now) != GestureOutcome::Dragging {
                return;
            }
        }
        self.engine.drag(DragInput::MoveBy(dx), now);
    }

    pub fn dispatch(&mut self, action: ActionKind, now: Instant) {
        self.resume_snap();
        if !self.engine.dispatch(action, now) {
            tracing::debug!(%action, "Action not dispatched");
        }
    }

    // ------------------------------------------------------------------------
    // Status line
    // ------------------------------------------------------------------------

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Move the engine's latest user-facing error into the status line.
    pub fn collect_engine_error(&mut self) {
        if let Some(err) = self.engine.take_error() {
            if err.is_user_facing() {
                self.set_status(err.to_string());
            }
        }
    }
}
