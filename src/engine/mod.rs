//! Feed interaction engine.
//!
//! [`FeedEngine`] owns the cursor, visibility tracker, view-commit scheduler,
//! gesture classifier and feedback machine, and is driven from a single task:
//!
//! - host input: [`FeedEngine::drag`], [`FeedEngine::dispatch`],
//!   [`FeedEngine::observe`] / [`FeedEngine::handle_visibility`]
//! - completions of spawned remote calls: [`FeedEngine::handle_event`]
//! - timers: the host sleeps until [`FeedEngine::next_deadline`] and then
//!   calls [`FeedEngine::fire_due`]
//!
//! Remote calls never touch engine state directly. They run in spawned tasks
//! and report back through the `EngineEvent` channel, so every mutation
//! happens on the thread that owns the engine.

mod cursor;
mod dispatcher;
mod error;
mod feedback;
mod gesture;
mod model;
mod services;
mod visibility;
mod views;

pub use cursor::{FeedCursor, Progress};
pub use dispatcher::{share_payload, ActionKind};
pub use error::{EngineError, ServiceError};
pub use feedback::{AfterFeedback, FeedbackMachine, FeedbackState, Ticket};
pub use gesture::{
    classify, DragInput, DragPresentation, GestureClassifier, GestureOutcome, SwipeDirection,
    DEFAULT_SWIPE_THRESHOLD,
};
pub use model::{
    ContentItem, ItemCategory, ItemId, LikeOutcome, Profile, UserId, UserType,
};
pub use services::{
    ConnectionService, FeedSource, LikeService, ProfileResolver, Services, ShareCapability,
    SharePayload, ViewRecorder,
};
pub use visibility::{
    ItemExtent, Playback, Viewport, VisibilityChange, VisibilityEvent, VisibilityTracker,
    DEFAULT_VISIBILITY_THRESHOLD,
};
pub use views::{ViewCommitScheduler, DEFAULT_VIEW_COMMIT_DELAY};

use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Owner profiles resolved concurrently per load.
const PROFILE_CONCURRENCY: usize = 8;

// ============================================================================
// Settings
// ============================================================================

/// Tunables for the engine. Built from [`crate::config::Config`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub visibility_threshold: f64,
    pub view_commit_delay: Duration,
    pub swipe_threshold: f64,
    /// Display time of `connect`/`pass` before the cursor advances.
    pub action_display_delay: Duration,
    pub connect_error_delay: Duration,
    pub like_feedback_delay: Duration,
    pub share_base_url: String,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            visibility_threshold: DEFAULT_VISIBILITY_THRESHOLD,
            view_commit_delay: DEFAULT_VIEW_COMMIT_DELAY,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD,
            action_display_delay: Duration::from_millis(800),
            connect_error_delay: Duration::from_millis(1500),
            like_feedback_delay: Duration::from_millis(1000),
            share_base_url: "https://pitchswipe.app".to_string(),
        }
    }
}

// ============================================================================
// Events and State
// ============================================================================

/// Completion of a spawned remote call.
#[derive(Debug)]
pub enum EngineEvent {
    /// Candidate list (with decorated owners) arrived.
    ///
    /// `generation` identifies the refresh that spawned the load; results of
    /// superseded refreshes are dropped.
    FeedLoaded {
        generation: u64,
        result: Result<Vec<ContentItem>, ServiceError>,
    },
    ConnectFinished {
        item_id: ItemId,
        ticket: Ticket,
        result: Result<(), ServiceError>,
    },
    LikeFinished {
        item_id: ItemId,
        ticket: Ticket,
        result: Result<LikeOutcome, ServiceError>,
    },
    ViewRecorded {
        item_id: ItemId,
        result: Result<(), ServiceError>,
    },
}

/// Feed loading state, for the host's loading and retry screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(EngineError),
}

pub struct FeedEngine {
    pub(crate) viewer: UserId,
    pub(crate) settings: EngineSettings,
    pub(crate) services: Services,
    pub(crate) event_tx: mpsc::Sender<EngineEvent>,

    pub(crate) cursor: FeedCursor,
    pub(crate) visibility: VisibilityTracker,
    pub(crate) views: ViewCommitScheduler,
    pub(crate) gestures: GestureClassifier,
    pub(crate) feedback: FeedbackMachine,

    load_state: LoadState,
    load_generation: u64,
    muted: bool,
    /// Most recent user-facing error, taken by the host for its status line.
    pub(crate) last_error: Option<EngineError>,
}

impl FeedEngine {
    pub fn new(
        viewer: UserId,
        settings: EngineSettings,
        services: Services,
        event_tx: mpsc::Sender<EngineEvent>,
    ) -> Self {
        Self {
            visibility: VisibilityTracker::new(settings.visibility_threshold),
            views: ViewCommitScheduler::new(viewer.clone(), settings.view_commit_delay),
            gestures: GestureClassifier::new(settings.swipe_threshold),
            feedback: FeedbackMachine::new(),
            cursor: FeedCursor::new(),
            load_state: LoadState::Idle,
            load_generation: 0,
            muted: false,
            last_error: None,
            viewer,
            settings,
            services,
            event_tx,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn viewer(&self) -> &UserId {
        &self.viewer
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn cursor(&self) -> &FeedCursor {
        &self.cursor
    }

    pub fn current(&self) -> Option<&ContentItem> {
        self.cursor.current()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn views(&self) -> &ViewCommitScheduler {
        &self.views
    }

    pub fn visibility(&self) -> &VisibilityTracker {
        &self.visibility
    }

    /// Feedback to render on `item`; idle unless `item` is the active item.
    pub fn feedback_for(&self, item: &ItemId) -> FeedbackState {
        if self.cursor.is_active(item) {
            self.feedback.state_for(item)
        } else {
            FeedbackState::Idle
        }
    }

    pub fn drag_presentation(&self) -> Option<DragPresentation> {
        self.gestures.presentation()
    }

    pub fn playback(&self, item: &ItemId) -> Playback {
        self.visibility.playback(item)
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn take_error(&mut self) -> Option<EngineError> {
        self.last_error.take()
    }

    // ------------------------------------------------------------------------
    // Feed lifecycle
    // ------------------------------------------------------------------------

    /// Refetch the feed. Tears down every per-item timer, drag and feedback
    /// immediately; the sequence itself is replaced only once the new list
    /// has fully loaded.
    pub fn refresh(&mut self) {
        self.load_generation = self.load_generation.wrapping_add(1);
        let generation = self.load_generation;
        self.load_state = LoadState::Loading;
        self.teardown();

        let services = self.services.clone();
        let viewer = self.viewer.clone();
        tracing::info!(viewer = %viewer, generation, "Loading feed");
        self.spawn(
            "feed_load",
            async move {
                let result = load_feed(&services, &viewer).await;
                EngineEvent::FeedLoaded { generation, result }
            },
            move |error| EngineEvent::FeedLoaded {
                generation,
                result: Err(error),
            },
        );
    }

    /// Replace the sequence directly (cursor back to the first item).
    pub fn load(&mut self, items: Vec<ContentItem>) {
        self.teardown();
        tracing::info!(items = items.len(), "Feed loaded");
        self.cursor.load(items);
        self.load_state = LoadState::Ready;
    }

    fn teardown(&mut self) {
        let unmounted = self.visibility.reset();
        tracing::debug!(items = unmounted.len(), "Tearing down mounted items");
        self.views.teardown_all();
        self.feedback.reset();
        self.gestures.retain_for(None);
    }

    /// Move to the next item; drags on the old item are dropped.
    pub(crate) fn advance(&mut self) {
        self.cursor.advance();
        self.gestures.retain_for(self.cursor.current_id());
        match self.cursor.current_id() {
            Some(id) => tracing::debug!(item_id = %id, position = self.cursor.position(), "Advanced"),
            None => tracing::info!("Feed exhausted"),
        }
    }

    // ------------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------------

    /// Feed a geometry sample through the tracker and act on the transitions.
    pub fn observe(&mut self, extents: &[ItemExtent], viewport: Viewport, now: Instant) {
        let events = self.visibility.observe(extents, viewport);
        for event in events {
            self.handle_visibility(&event, now);
        }
    }

    /// Act on one raw visibility transition. Transitions for the same item
    /// must arrive in order.
    pub fn handle_visibility(&mut self, event: &VisibilityEvent, now: Instant) {
        match event.change {
            VisibilityChange::Enter => {
                if self.views.on_enter(&event.item_id, now) {
                    tracing::debug!(item_id = %event.item_id, "View timer started");
                }
            }
            VisibilityChange::Exit => {
                self.views.on_exit(&event.item_id);
            }
        }
    }

    pub fn toggle_playback(&mut self) -> Option<Playback> {
        let id = self.cursor.current_id()?.clone();
        Some(self.visibility.toggle_playback(&id))
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    // ------------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------------

    /// Earliest instant at which [`FeedEngine::fire_due`] has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.views.next_deadline(), self.feedback.next_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Fire every timer due at `now`: view commits, then feedback expiry.
    pub fn fire_due(&mut self, now: Instant) {
        for item_id in self.views.take_due(now) {
            self.spawn_record_view(item_id);
        }

        if let Some(expired) = self.feedback.expire(now) {
            tracing::debug!(item_id = %expired.item_id, state = ?expired.state, "Feedback cleared");
            if expired.then == AfterFeedback::ClearAndAdvance
                && self.cursor.is_active(&expired.item_id)
            {
                self.advance();
            }
        }
    }

    fn spawn_record_view(&self, item_id: ItemId) {
        let views = self.services.views.clone();
        let viewer = self.viewer.clone();
        tracing::debug!(item_id = %item_id, "Recording durable view");
        let fallback_id = item_id.clone();
        self.spawn(
            "record_view",
            async move {
                let result = views.record_view(&item_id, &viewer).await;
                EngineEvent::ViewRecorded { item_id, result }
            },
            move |error| EngineEvent::ViewRecorded {
                item_id: fallback_id,
                result: Err(error),
            },
        );
    }

    // ------------------------------------------------------------------------
    // Completions
    // ------------------------------------------------------------------------

    pub fn handle_event(&mut self, event: EngineEvent, now: Instant) {
        match event {
            EngineEvent::FeedLoaded { generation, result } => {
                self.handle_feed_loaded(generation, result);
            }
            EngineEvent::ConnectFinished {
                item_id,
                ticket,
                result,
            } => self.handle_connect_finished(item_id, ticket, result, now),
            EngineEvent::LikeFinished {
                item_id,
                ticket,
                result,
            } => self.handle_like_finished(item_id, ticket, result, now),
            EngineEvent::ViewRecorded { item_id, result } => match result {
                Ok(()) => tracing::info!(item_id = %item_id, "View recorded"),
                Err(e) => {
                    let err = EngineError::Recording(e);
                    tracing::warn!(item_id = %item_id, error = %err, "View not recorded");
                }
            },
        }
    }

    fn handle_feed_loaded(&mut self, generation: u64, result: Result<Vec<ContentItem>, ServiceError>) {
        if generation != self.load_generation {
            tracing::debug!(generation, current = self.load_generation, "Discarding stale feed load");
            return;
        }
        match result {
            Ok(items) => self.load(items),
            Err(e) => {
                let err = EngineError::FeedLoad(e);
                tracing::error!(error = %err, "Feed load failed");
                self.load_state = LoadState::Failed(err.clone());
                self.last_error = Some(err);
            }
        }
    }

    /// Run `fut` on the runtime and deliver its event. A panic is reported
    /// as the event `on_panic` builds, so the caller's state still settles.
    pub(crate) fn spawn<F, P>(&self, task: &'static str, fut: F, on_panic: P)
    where
        F: std::future::Future<Output = EngineEvent> + Send + 'static,
        P: FnOnce(ServiceError) -> EngineEvent + Send + 'static,
    {
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(event) => event,
                Err(panic) => {
                    let message = if let Some(s) = panic.downcast_ref::<&'static str>() {
                        s.to_string()
                    } else if let Some(s) = panic.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "unknown panic".to_string()
                    };
                    tracing::error!(task, error = %message, "Background task panicked");
                    on_panic(ServiceError::Unavailable(format!("{task} panicked: {message}")))
                }
            };
            if let Err(e) = tx.send(event).await {
                tracing::warn!(task, error = %e, "Channel send failed (receiver dropped)");
            }
        });
    }
}

/// Fetch candidates and decorate each with its owner's profile. Any failure
/// fails the whole load.
async fn load_feed(services: &Services, viewer: &UserId) -> Result<Vec<ContentItem>, ServiceError> {
    let candidates = services.feed.list_candidates(viewer).await?;
    let profiles = services.profiles.clone();

    stream::iter(candidates)
        .filter(|item| std::future::ready(&item.owner_id != viewer))
        .map(|mut item| {
            let profiles = profiles.clone();
            async move {
                let owner = profiles.get_profile(&item.owner_id).await?;
                item.owner = owner.unwrap_or_else(|| Profile::placeholder(item.owner_id.clone()));
                Ok::<_, ServiceError>(item)
            }
        })
        .buffered(PROFILE_CONCURRENCY)
        .try_collect()
        .await
}
