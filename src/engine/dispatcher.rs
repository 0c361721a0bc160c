//! Action dispatch: the single entry point for connect, pass, like and share.
//!
//! Swipes and explicit commands both arrive here. Remote calls run in spawned
//! tasks; their completions come back through `FeedEngine::handle_event` and
//! are reconciled against the feedback ticket taken when the action started.

use std::fmt;
use tokio::time::Instant;
use url::Url;

use super::error::{EngineError, ServiceError};
use super::feedback::{AfterFeedback, FeedbackState, Ticket};
use super::gesture::{DragInput, GestureOutcome};
use super::model::{ContentItem, ItemId, LikeOutcome, Profile};
use super::services::SharePayload;
use super::{EngineEvent, FeedEngine};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Connect,
    Pass,
    Like,
    Share,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActionKind::Connect => "connect",
            ActionKind::Pass => "pass",
            ActionKind::Like => "like",
            ActionKind::Share => "share",
        })
    }
}

/// Build the share sheet contents for an item.
pub fn share_payload(item: &ContentItem, base_url: &str) -> SharePayload {
    SharePayload {
        title: item
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Check out this pitch".to_string()),
        text: format!("Watch {}'s pitch", item.owner.display_name),
        url: share_url(base_url, &item.id),
    }
}

fn share_url(base: &str, item: &ItemId) -> String {
    match Url::parse(base) {
        Ok(mut url) if !url.cannot_be_a_base() => {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push("pitch").push(item.as_str());
            }
            url.to_string()
        }
        _ => format!("{}/pitch/{}", base.trim_end_matches('/'), item),
    }
}

impl FeedEngine {
    /// Feed one pointer input to the gesture classifier. A committed swipe
    /// on the active item is dispatched as connect or pass.
    pub fn drag(&mut self, input: DragInput, now: Instant) -> GestureOutcome {
        if let DragInput::Start(ref id) = input {
            if !self.cursor.is_active(id) {
                tracing::debug!(item_id = %id, "Ignoring drag on inactive item");
                return GestureOutcome::Ignored;
            }
        }
        let outcome = self.gestures.apply(input);
        if let GestureOutcome::Committed {
            ref item_id,
            direction,
        } = outcome
        {
            if self.cursor.is_active(item_id) {
                self.dispatch(direction.action(), now);
            }
        }
        outcome
    }

    /// Run `action` against the active item. Returns false if the action was
    /// ignored (no active item, or a connect/pass already outstanding).
    pub fn dispatch(&mut self, action: ActionKind, now: Instant) -> bool {
        let Some(item) = self.cursor.current() else {
            tracing::debug!(%action, "No active item, ignoring action");
            return false;
        };
        let item_id = item.id.clone();

        if action != ActionKind::Share && self.feedback.is_advancing(&item_id) {
            tracing::debug!(%action, item_id = %item_id, "Action already in progress, ignoring");
            return false;
        }

        match action {
            ActionKind::Connect => self.start_connect(item_id),
            ActionKind::Pass => self.start_pass(item_id, now),
            ActionKind::Like => self.start_like(item_id),
            ActionKind::Share => self.share(),
        }
        true
    }

    fn start_connect(&mut self, item_id: ItemId) {
        let Some(owner_id) = self.cursor.get(&item_id).map(|i| i.owner_id.clone()) else {
            return;
        };
        let ticket = self.feedback.show(item_id.clone(), FeedbackState::Connect);
        let profiles = self.services.profiles.clone();
        let connections = self.services.connections.clone();
        let viewer = self.viewer.clone();

        tracing::info!(item_id = %item_id, to = %owner_id, "Sending connection request");
        let fallback_id = item_id.clone();
        self.spawn(
            "connect",
            async move {
                let result = async {
                    let profile = profiles
                        .get_profile(&viewer)
                        .await?
                        .unwrap_or_else(|| Profile::placeholder(viewer.clone()));
                    connections
                        .request_connection(&viewer, &owner_id, &profile)
                        .await
                }
                .await;
                EngineEvent::ConnectFinished {
                    item_id,
                    ticket,
                    result,
                }
            },
            move |error| EngineEvent::ConnectFinished {
                item_id: fallback_id,
                ticket,
                result: Err(error),
            },
        );
    }

    fn start_pass(&mut self, item_id: ItemId, now: Instant) {
        tracing::info!(item_id = %item_id, "Passing");
        self.feedback.show_for(
            item_id,
            FeedbackState::Pass,
            self.settings.action_display_delay,
            now,
            AfterFeedback::ClearAndAdvance,
        );
    }

    fn start_like(&mut self, item_id: ItemId) {
        let ticket = self.feedback.show(item_id.clone(), FeedbackState::Like);
        let likes = self.services.likes.clone();
        let viewer = self.viewer.clone();

        tracing::debug!(item_id = %item_id, "Toggling like");
        let fallback_id = item_id.clone();
        self.spawn(
            "like",
            async move {
                let result = likes.toggle_like(&item_id, &viewer).await;
                EngineEvent::LikeFinished {
                    item_id,
                    ticket,
                    result,
                }
            },
            move |error| EngineEvent::LikeFinished {
                item_id: fallback_id,
                ticket,
                result: Err(error),
            },
        );
    }

    fn share(&self) {
        let Some(item) = self.cursor.current() else {
            return;
        };
        let Some(share) = self.services.share.as_ref() else {
            tracing::debug!(error = %EngineError::CapabilityUnavailable, "Share skipped");
            return;
        };
        let payload = share_payload(item, &self.settings.share_base_url);
        match share.share(&payload) {
            Ok(()) => tracing::info!(item_id = %item.id, url = %payload.url, "Shared"),
            Err(e) => tracing::debug!(item_id = %item.id, error = %e, "Share failed"),
        }
    }

    pub(super) fn handle_connect_finished(
        &mut self,
        item_id: ItemId,
        ticket: Ticket,
        result: Result<(), ServiceError>,
        now: Instant,
    ) {
        if !self.feedback.is_current(ticket) {
            // Feed was reset while the request was in flight
            tracing::debug!(item_id = %item_id, ok = result.is_ok(), "Stale connect completion");
            return;
        }
        match result {
            Ok(()) => {
                tracing::info!(item_id = %item_id, "Connection request sent");
                self.feedback.arm(
                    ticket,
                    FeedbackState::Connect,
                    self.settings.action_display_delay,
                    now,
                    AfterFeedback::ClearAndAdvance,
                );
            }
            Err(source) => {
                let err = EngineError::Action {
                    action: ActionKind::Connect,
                    source,
                };
                tracing::error!(item_id = %item_id, error = %err, "Connection request failed");
                self.feedback.arm(
                    ticket,
                    FeedbackState::ConnectError,
                    self.settings.connect_error_delay,
                    now,
                    AfterFeedback::Clear,
                );
                self.last_error = Some(err);
            }
        }
    }

    pub(super) fn handle_like_finished(
        &mut self,
        item_id: ItemId,
        ticket: Ticket,
        result: Result<LikeOutcome, ServiceError>,
        now: Instant,
    ) {
        match result {
            Ok(outcome) => {
                // Server truth replaces local counters even if the feedback is stale
                if let Some(item) = self.cursor.get_mut(&item_id) {
                    item.apply_like(outcome);
                }
                tracing::debug!(
                    item_id = %item_id,
                    likes = outcome.like_count,
                    liked = outcome.liked_by_viewer,
                    "Like toggled"
                );
            }
            Err(source) => {
                let err = EngineError::Action {
                    action: ActionKind::Like,
                    source,
                };
                tracing::error!(item_id = %item_id, error = %err, "Like failed");
                self.last_error = Some(err);
            }
        }
        self.feedback.arm(
            ticket,
            FeedbackState::Like,
            self.settings.like_feedback_delay,
            now,
            AfterFeedback::Clear,
        );
    }
}
