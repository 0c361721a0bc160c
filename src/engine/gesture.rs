//! Drag gesture classification.
//!
//! A drag is reduced over horizontal displacement only; everything shown while
//! dragging is a pure function of the current displacement, and the committed
//! outcome is a pure function of the displacement at release.

use super::dispatcher::ActionKind;
use super::model::ItemId;

/// Default displacement (device-independent pixels) needed to commit a swipe.
pub const DEFAULT_SWIPE_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    /// Connect with the item's owner.
    Right,
    /// Pass on the item.
    Left,
}

impl SwipeDirection {
    pub fn action(self) -> ActionKind {
        match self {
            SwipeDirection::Right => ActionKind::Connect,
            SwipeDirection::Left => ActionKind::Pass,
        }
    }
}

/// Classify a release displacement. `None` means snap back with no action.
pub fn classify(displacement: f64, threshold: f64) -> Option<SwipeDirection> {
    if displacement.is_nan() || displacement.abs() < threshold {
        None
    } else if displacement > 0.0 {
        Some(SwipeDirection::Right)
    } else {
        Some(SwipeDirection::Left)
    }
}

// ============================================================================
// Presentation
// ============================================================================

/// Piecewise-linear map of `x` through `(input, output)` stops, clamped at
/// both ends. `input` must be ascending and the same length as `output`.
fn interpolate(x: f64, input: &[f64], output: &[f64]) -> f64 {
    debug_assert_eq!(input.len(), output.len());
    let (Some(&first_in), Some(&last_in)) = (input.first(), input.last()) else {
        return 0.0;
    };
    if x <= first_in {
        return output[0];
    }
    if x >= last_in {
        return output[output.len() - 1];
    }
    for i in 1..input.len() {
        if x <= input[i] {
            let span = input[i] - input[i - 1];
            let t = if span == 0.0 { 1.0 } else { (x - input[i - 1]) / span };
            return output[i - 1] + t * (output[i] - output[i - 1]);
        }
    }
    output[output.len() - 1]
}

/// Tilt of the card in degrees.
pub fn rotation(displacement: f64) -> f64 {
    interpolate(displacement, &[-200.0, 200.0], &[-15.0, 15.0])
}

/// Card opacity: fully opaque within one threshold, fading beyond it.
pub fn opacity(displacement: f64) -> f64 {
    interpolate(
        displacement,
        &[-200.0, -100.0, 0.0, 100.0, 200.0],
        &[0.5, 1.0, 1.0, 1.0, 0.5],
    )
}

/// Opacity of the "CONNECT" label shown while dragging right.
pub fn connect_label_opacity(displacement: f64) -> f64 {
    interpolate(displacement, &[50.0, 200.0], &[0.0, 1.0])
}

/// Opacity of the "PASS" label shown while dragging left.
pub fn pass_label_opacity(displacement: f64) -> f64 {
    interpolate(displacement, &[-200.0, -50.0], &[1.0, 0.0])
}

/// Everything a renderer needs to draw an in-progress drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPresentation {
    pub displacement: f64,
    pub rotation: f64,
    pub opacity: f64,
    pub connect_label: f64,
    pub pass_label: f64,
    pub direction: Option<SwipeDirection>,
}

impl DragPresentation {
    pub fn at(displacement: f64, threshold: f64) -> Self {
        Self {
            displacement,
            rotation: rotation(displacement),
            opacity: opacity(displacement),
            connect_label: connect_label_opacity(displacement),
            pass_label: pass_label_opacity(displacement),
            direction: classify(displacement, threshold),
        }
    }
}

// ============================================================================
// Drag Reducer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum DragInput {
    /// Pointer went down on an item.
    Start(ItemId),
    /// Total displacement from the start point.
    MoveTo(f64),
    /// Relative nudge, for keyboard-driven drags.
    MoveBy(f64),
    /// Pointer released.
    Release,
    /// Drag aborted (item changed, escape pressed).
    Cancel,
}

/// Transient drag state. Only exists while a drag is in progress.
#[derive(Debug, Clone, PartialEq)]
pub struct Drag {
    pub item_id: ItemId,
    pub displacement: f64,
}

/// Result of feeding one input to the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureOutcome {
    /// Nothing decided yet.
    Dragging,
    /// Released past the threshold.
    Committed {
        item_id: ItemId,
        direction: SwipeDirection,
    },
    /// Released short of the threshold, or cancelled.
    SnapBack,
    /// Input arrived with no drag in progress.
    Ignored,
}

pub struct GestureClassifier {
    threshold: f64,
    drag: Option<Drag>,
}

impl GestureClassifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            drag: None,
        }
    }

    pub fn drag(&self) -> Option<&Drag> {
        self.drag.as_ref()
    }

    pub fn presentation(&self) -> Option<DragPresentation> {
        self.drag
            .as_ref()
            .map(|d| DragPresentation::at(d.displacement, self.threshold))
    }

    /// Feed one pointer input. Starting a drag replaces any drag in progress.
    pub fn apply(&mut self, input: DragInput) -> GestureOutcome {
        match (input, self.drag.take()) {
            (DragInput::Start(item_id), _) => {
                self.drag = Some(Drag {
                    item_id,
                    displacement: 0.0,
                });
                GestureOutcome::Dragging
            }
            (DragInput::MoveTo(d), Some(drag)) => {
                self.drag = Some(Drag {
                    displacement: d,
                    ..drag
                });
                GestureOutcome::Dragging
            }
            (DragInput::MoveBy(dx), Some(drag)) => {
                self.drag = Some(Drag {
                    displacement: drag.displacement + dx,
                    ..drag
                });
                GestureOutcome::Dragging
            }
            (DragInput::Release, Some(drag)) => match classify(drag.displacement, self.threshold) {
                Some(direction) => GestureOutcome::Committed {
                    item_id: drag.item_id,
                    direction,
                },
                None => GestureOutcome::SnapBack,
            },
            (DragInput::Cancel, Some(_)) => GestureOutcome::SnapBack,
            (_, None) => GestureOutcome::Ignored,
        }
    }

    /// Drop the drag if it belongs to an item other than `active`.
    pub fn retain_for(&mut self, active: Option<&ItemId>) {
        if self.drag.as_ref().map(|d| &d.item_id) != active {
            self.drag = None;
        }
    }
}

impl Default for GestureClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SWIPE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_classify_boundaries() {
        let t = DEFAULT_SWIPE_THRESHOLD;
        assert_eq!(classify(100.0, t), Some(SwipeDirection::Right));
        assert_eq!(classify(99.0, t), None);
        assert_eq!(classify(99.999, t), None);
        assert_eq!(classify(-100.0, t), Some(SwipeDirection::Left));
        assert_eq!(classify(-99.0, t), None);
        assert_eq!(classify(0.0, t), None);
        assert_eq!(classify(f64::NAN, t), None);
    }

    #[test]
    fn test_direction_maps_to_action() {
        assert_eq!(SwipeDirection::Right.action(), ActionKind::Connect);
        assert_eq!(SwipeDirection::Left.action(), ActionKind::Pass);
    }

    #[test]
    fn test_presentation_stops() {
        assert_eq!(rotation(0.0), 0.0);
        assert_eq!(rotation(200.0), 15.0);
        assert_eq!(rotation(-400.0), -15.0);
        assert_eq!(rotation(100.0), 7.5);

        assert_eq!(opacity(50.0), 1.0);
        assert_eq!(opacity(150.0), 0.75);
        assert_eq!(opacity(-300.0), 0.5);

        assert_eq!(connect_label_opacity(50.0), 0.0);
        assert_eq!(connect_label_opacity(125.0), 0.5);
        assert_eq!(connect_label_opacity(-100.0), 0.0);
        assert_eq!(pass_label_opacity(-50.0), 0.0);
        assert_eq!(pass_label_opacity(-200.0), 1.0);
        assert_eq!(pass_label_opacity(100.0), 0.0);
    }

    #[test]
    fn test_drag_release_past_threshold_commits() {
        let mut g = GestureClassifier::default();
        let a = ItemId::new("a");
        assert_eq!(g.apply(DragInput::Start(a.clone())), GestureOutcome::Dragging);
        g.apply(DragInput::MoveTo(40.0));
        g.apply(DragInput::MoveTo(130.0));
        assert_eq!(
            g.apply(DragInput::Release),
            GestureOutcome::Committed {
                item_id: a,
                direction: SwipeDirection::Right
            }
        );
        assert!(g.drag().is_none());
    }

    #[test]
    fn test_drag_classified_by_final_displacement_only() {
        let mut g = GestureClassifier::default();
        g.apply(DragInput::Start(ItemId::new("a")));
        g.apply(DragInput::MoveTo(-250.0));
        g.apply(DragInput::MoveTo(-20.0));
        assert_eq!(g.apply(DragInput::Release), GestureOutcome::SnapBack);
    }

    #[test]
    fn test_keyboard_nudges_accumulate() {
        let mut g = GestureClassifier::default();
        g.apply(DragInput::Start(ItemId::new("a")));
        for _ in 0..4 {
            g.apply(DragInput::MoveBy(-25.0));
        }
        assert_eq!(g.presentation().map(|p| p.direction), Some(Some(SwipeDirection::Left)));
        assert!(matches!(
            g.apply(DragInput::Release),
            GestureOutcome::Committed {
                direction: SwipeDirection::Left,
                ..
            }
        ));
    }

    #[test]
    fn test_input_without_drag_is_ignored() {
        let mut g = GestureClassifier::default();
        assert_eq!(g.apply(DragInput::MoveTo(300.0)), GestureOutcome::Ignored);
        assert_eq!(g.apply(DragInput::Release), GestureOutcome::Ignored);
    }

    #[test]
    fn test_cancel_snaps_back() {
        let mut g = GestureClassifier::default();
        g.apply(DragInput::Start(ItemId::new("a")));
        g.apply(DragInput::MoveTo(300.0));
        assert_eq!(g.apply(DragInput::Cancel), GestureOutcome::SnapBack);
        assert!(g.presentation().is_none());
    }

    #[test]
    fn test_retain_for_drops_foreign_drag() {
        let mut g = GestureClassifier::default();
        g.apply(DragInput::Start(ItemId::new("a")));
        g.retain_for(Some(&ItemId::new("a")));
        assert!(g.drag().is_some());
        g.retain_for(Some(&ItemId::new("b")));
        assert!(g.drag().is_none());
    }

    proptest! {
        #[test]
        fn prop_classify_matches_threshold(d in -1000.0f64..1000.0) {
            let out = classify(d, DEFAULT_SWIPE_THRESHOLD);
            if d >= 100.0 {
                prop_assert_eq!(out, Some(SwipeDirection::Right));
            } else if d <= -100.0 {
                prop_assert_eq!(out, Some(SwipeDirection::Left));
            } else {
                prop_assert_eq!(out, None);
            }
        }

        #[test]
        fn prop_release_depends_only_on_final_displacement(
            path in proptest::collection::vec(-500.0f64..500.0, 0..20),
            last in -500.0f64..500.0,
        ) {
            let mut g = GestureClassifier::default();
            g.apply(DragInput::Start(ItemId::new("a")));
            for d in path {
                g.apply(DragInput::MoveTo(d));
            }
            g.apply(DragInput::MoveTo(last));
            let outcome = g.apply(DragInput::Release);
            match classify(last, DEFAULT_SWIPE_THRESHOLD) {
                Some(direction) => prop_assert_eq!(
                    outcome,
                    GestureOutcome::Committed { item_id: ItemId::new("a"), direction }
                ),
                None => prop_assert_eq!(outcome, GestureOutcome::SnapBack),
            }
        }

        #[test]
        fn prop_presentation_is_bounded(d in -10_000.0f64..10_000.0) {
            let p = DragPresentation::at(d, DEFAULT_SWIPE_THRESHOLD);
            prop_assert!((-15.0..=15.0).contains(&p.rotation));
            prop_assert!((0.5..=1.0).contains(&p.opacity));
            prop_assert!((0.0..=1.0).contains(&p.connect_label));
            prop_assert!((0.0..=1.0).contains(&p.pass_label));
            prop_assert!(p.connect_label == 0.0 || p.pass_label == 0.0);
        }
    }
}
