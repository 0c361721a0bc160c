//! Visibility tracking for mounted item renderers.
//!
//! The tracker turns geometry samples into raw `Enter`/`Exit` transitions. It
//! never debounces; that is the view-commit scheduler's job. Playback follows
//! visibility: an item starts playing on `Enter` and pauses on `Exit`.

use std::collections::{HashMap, HashSet};

use super::model::ItemId;

/// Default fraction of an item that must be inside the viewport.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisibilityChange {
    Enter,
    Exit,
}

/// A raw visibility transition for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityEvent {
    pub item_id: ItemId,
    pub change: VisibilityChange,
}

impl VisibilityEvent {
    pub fn enter(item_id: ItemId) -> Self {
        Self {
            item_id,
            change: VisibilityChange::Enter,
        }
    }

    pub fn exit(item_id: ItemId) -> Self {
        Self {
            item_id,
            change: VisibilityChange::Exit,
        }
    }
}

/// Vertical span of the scroll viewport, in the host's length unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub top: i64,
    pub height: u32,
}

/// Vertical span of one mounted item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemExtent {
    pub item_id: ItemId,
    pub top: i64,
    pub height: u32,
}

impl ItemExtent {
    /// Fraction of this item inside the viewport, in `[0, 1]`.
    pub fn occupancy(&self, viewport: Viewport) -> f64 {
        if self.height == 0 {
            return 0.0;
        }
        let start = self.top.max(viewport.top);
        let end = (self.top + i64::from(self.height)).min(viewport.top + i64::from(viewport.height));
        let overlap = (end - start).max(0);
        overlap as f64 / f64::from(self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Playback {
    Playing,
    Paused,
}

pub struct VisibilityTracker {
    threshold: f64,
    visible: HashSet<ItemId>,
    /// Only mounted items have an entry; unmounting drops it.
    playback: HashMap<ItemId, Playback>,
}

impl VisibilityTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            visible: HashSet::new(),
            playback: HashMap::new(),
        }
    }

    /// Evaluate a geometry sample and return the transitions since the last one.
    ///
    /// `extents` is the full set of currently mounted items. Items that were
    /// mounted before and are missing now are torn down: an `Exit` is emitted
    /// if they were visible and their playback state is dropped.
    ///
    /// Exits are reported before enters, each in mount order.
    pub fn observe(&mut self, extents: &[ItemExtent], viewport: Viewport) -> Vec<VisibilityEvent> {
        let mut now_visible = HashSet::with_capacity(self.visible.len() + 1);
        let mut entering = Vec::new();
        for extent in extents {
            if extent.occupancy(viewport) >= self.threshold {
                if !self.visible.contains(&extent.item_id) {
                    entering.push(extent.item_id.clone());
                }
                now_visible.insert(extent.item_id.clone());
            }
        }

        let mut events = Vec::new();

        // Keep exit order stable: mounted items in mount order, then unmounted ones
        let mut exiting: Vec<ItemId> = extents
            .iter()
            .filter(|e| self.visible.contains(&e.item_id) && !now_visible.contains(&e.item_id))
            .map(|e| e.item_id.clone())
            .collect();
        let mounted: HashSet<&ItemId> = extents.iter().map(|e| &e.item_id).collect();
        let mut unmounted: Vec<ItemId> = self
            .visible
            .iter()
            .filter(|id| !mounted.contains(id))
            .cloned()
            .collect();
        unmounted.sort();
        exiting.extend(unmounted);

        for id in exiting {
            self.visible.remove(&id);
            if let Some(state) = self.playback.get_mut(&id) {
                *state = Playback::Paused;
            }
            tracing::debug!(item_id = %id, "Item left viewport");
            events.push(VisibilityEvent::exit(id));
        }

        for id in entering {
            self.visible.insert(id.clone());
            self.playback.insert(id.clone(), Playback::Playing);
            tracing::debug!(item_id = %id, "Item entered viewport");
            events.push(VisibilityEvent::enter(id));
        }

        self.playback.retain(|id, _| mounted.contains(id));
        events
    }

    /// Tear down everything. Returns an `Exit` for each visible item.
    pub fn reset(&mut self) -> Vec<VisibilityEvent> {
        let mut ids: Vec<ItemId> = self.visible.drain().collect();
        ids.sort();
        self.playback.clear();
        ids.into_iter().map(VisibilityEvent::exit).collect()
    }

    pub fn is_visible(&self, id: &ItemId) -> bool {
        self.visible.contains(id)
    }

    pub fn playback(&self, id: &ItemId) -> Playback {
        self.playback.get(id).copied().unwrap_or(Playback::Paused)
    }

    /// Viewer-initiated play/pause. Only visible items can be resumed.
    pub fn toggle_playback(&mut self, id: &ItemId) -> Playback {
        let next = match self.playback(id) {
            Playback::Playing => Playback::Paused,
            Playback::Paused if self.visible.contains(id) => Playback::Playing,
            Playback::Paused => Playback::Paused,
        };
        if self.visible.contains(id) || self.playback.contains_key(id) {
            self.playback.insert(id.clone(), next);
        }
        next
    }
}

impl Default for VisibilityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_VISIBILITY_THRESHOLD)
    }
}
