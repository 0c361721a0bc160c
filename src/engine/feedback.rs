//! Transient per-item feedback overlay.
//!
//! At most one feedback state is live, bound to the item that was active when
//! it was shown. Every update carries the [`Ticket`] handed out by `show`; a
//! stale ticket (superseded by a newer feedback or a reset) is ignored, so a
//! late completion or timer can never touch another item's overlay.

use std::time::Duration;
use tokio::time::Instant;

use super::model::ItemId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedbackState {
    #[default]
    Idle,
    Like,
    Connect,
    ConnectError,
    Pass,
}

/// What happens when a feedback state times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterFeedback {
    Clear,
    ClearAndAdvance,
}

/// Generation number identifying one shown feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

#[derive(Debug)]
struct Live {
    ticket: Ticket,
    item_id: ItemId,
    state: FeedbackState,
    /// `None` while waiting on a remote call.
    deadline: Option<Instant>,
    then: AfterFeedback,
}

/// A feedback state that reached its deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired {
    pub item_id: ItemId,
    pub state: FeedbackState,
    pub then: AfterFeedback,
}

#[derive(Debug, Default)]
pub struct FeedbackMachine {
    live: Option<Live>,
    generation: u64,
}

impl FeedbackMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `state` on `item` with no deadline yet, superseding anything live.
    pub fn show(&mut self, item: ItemId, state: FeedbackState) -> Ticket {
        self.generation = self.generation.wrapping_add(1);
        let ticket = Ticket(self.generation);
        self.live = Some(Live {
            ticket,
            item_id: item,
            state,
            deadline: None,
            then: AfterFeedback::Clear,
        });
        ticket
    }

    /// Show `state` on `item` and arm its auto-clear in one step.
    pub fn show_for(
        &mut self,
        item: ItemId,
        state: FeedbackState,
        delay: Duration,
        now: Instant,
        then: AfterFeedback,
    ) -> Ticket {
        let ticket = self.show(item, state);
        self.arm(ticket, state, delay, now, then);
        ticket
    }

    /// Set the state and deadline of a live feedback. Returns false if the
    /// ticket is stale.
    pub fn arm(
        &mut self,
        ticket: Ticket,
        state: FeedbackState,
        delay: Duration,
        now: Instant,
        then: AfterFeedback,
    ) -> bool {
        match self.live.as_mut() {
            Some(live) if live.ticket == ticket => {
                live.state = state;
                live.deadline = Some(now + delay);
                live.then = then;
                true
            }
            _ => false,
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.live.as_ref().is_some_and(|l| l.ticket == ticket)
    }

    /// Feedback visible on `item`. Any item other than the one the feedback
    /// was shown on reads as idle.
    pub fn state_for(&self, item: &ItemId) -> FeedbackState {
        match &self.live {
            Some(live) if &live.item_id == item => live.state,
            _ => FeedbackState::Idle,
        }
    }

    /// Whether an advancing action (connect or pass) is outstanding on `item`.
    pub fn is_advancing(&self, item: &ItemId) -> bool {
        matches!(
            &self.live,
            Some(Live { item_id, state: FeedbackState::Connect | FeedbackState::Pass, .. })
                if item_id == item
        )
    }

    /// Pop the live feedback if its deadline has passed.
    pub fn expire(&mut self, now: Instant) -> Option<Expired> {
        let due = self
            .live
            .as_ref()
            .and_then(|l| l.deadline)
            .is_some_and(|deadline| deadline <= now);
        if !due {
            return None;
        }
        self.live.take().map(|live| Expired {
            item_id: live.item_id,
            state: live.state,
            then: live.then,
        })
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.live.as_ref().and_then(|l| l.deadline)
    }

    /// Drop any live feedback. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        if let Some(live) = self.live.take() {
            tracing::debug!(item_id = %live.item_id, state = ?live.state, "Feedback reset");
        }
        self.generation = self.generation.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_starts_idle() {
        let fb = FeedbackMachine::new();
        assert_eq!(fb.state_for(&ItemId::new("a")), FeedbackState::Idle);
        assert!(fb.next_deadline().is_none());
    }

    #[test]
    fn test_auto_clears_exactly_at_deadline() {
        let mut fb = FeedbackMachine::new();
        let a = ItemId::new("a");
        let t0 = Instant::now();
        fb.show_for(a.clone(), FeedbackState::Like, ms(1000), t0, AfterFeedback::Clear);

        assert!(fb.expire(t0 + ms(999)).is_none());
        assert_eq!(fb.state_for(&a), FeedbackState::Like);

        let expired = fb.expire(t0 + ms(1000));
        assert_eq!(
            expired,
            Some(Expired {
                item_id: a.clone(),
                state: FeedbackState::Like,
                then: AfterFeedback::Clear
            })
        );
        assert_eq!(fb.state_for(&a), FeedbackState::Idle);
    }

    #[test]
    fn test_pending_remote_has_no_deadline() {
        let mut fb = FeedbackMachine::new();
        let a = ItemId::new("a");
        let ticket = fb.show(a.clone(), FeedbackState::Connect);
        assert!(fb.next_deadline().is_none());
        assert!(fb.is_advancing(&a));

        let t0 = Instant::now();
        assert!(fb.arm(ticket, FeedbackState::ConnectError, ms(1500), t0, AfterFeedback::Clear));
        assert_eq!(fb.state_for(&a), FeedbackState::ConnectError);
        assert!(!fb.is_advancing(&a));
        assert_eq!(fb.next_deadline(), Some(t0 + ms(1500)));
    }

    #[test]
    fn test_newer_feedback_makes_old_ticket_stale() {
        let mut fb = FeedbackMachine::new();
        let a = ItemId::new("a");
        let t0 = Instant::now();
        let first = fb.show(a.clone(), FeedbackState::Like);
        let second = fb.show(a.clone(), FeedbackState::Like);

        assert!(!fb.is_current(first));
        assert!(!fb.arm(first, FeedbackState::Like, ms(1000), t0, AfterFeedback::Clear));
        assert!(fb.is_current(second));
        assert!(fb.next_deadline().is_none());
    }

    #[test]
    fn test_feedback_never_renders_on_other_item() {
        let mut fb = FeedbackMachine::new();
        fb.show(ItemId::new("a"), FeedbackState::Pass);
        assert_eq!(fb.state_for(&ItemId::new("b")), FeedbackState::Idle);
    }

    #[test]
    fn test_reset_invalidates_tickets() {
        let mut fb = FeedbackMachine::new();
        let ticket = fb.show(ItemId::new("a"), FeedbackState::Connect);
        fb.reset();
        assert!(!fb.is_current(ticket));
        assert_eq!(fb.state_for(&ItemId::new("a")), FeedbackState::Idle);

        // A fresh show after reset never reuses the stale ticket
        let fresh = fb.show(ItemId::new("a"), FeedbackState::Connect);
        assert_ne!(fresh, ticket);
    }
}
