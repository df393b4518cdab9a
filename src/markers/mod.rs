//! Marker interaction layer.
//!
//! Places pins on screen from the current transform and tracks which marker
//! has its popup open, which one has the details panel, and which one is
//! being dragged.
//!
//! Selection rules:
//! - at most one popup is visible; selecting another marker replaces it
//! - while the details panel is open, marker and background clicks do not
//!   change the selection
//! - opening the details panel closes the popup

mod coords;
mod drag;

pub use coords::{Projection, to_percent, to_screen};
pub use drag::{DragEnd, DragSession, DragStep, finish, step};

use serde::{Deserialize, Serialize};

use crate::constants::{CLICK_TOLERANCE, DRAG_THRESHOLD, MARKER_HIT_RADIUS};
use crate::message::{ModifierKey, PointerId};
use crate::model::{PercentPoint, Pin, PinId};
use crate::zoom_math::Point;

/// Tunables for marker interaction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSettings {
    /// Screen pixels a marker press must travel to become a drag
    pub drag_threshold: f64,
    /// Screen radius around a marker that counts as a hit
    pub hit_radius: f64,
    /// Screen pixels a background press may travel and still be a click
    pub click_tolerance: f64,
    /// Key that turns an edit-mode background click into a placement
    pub placement_modifier: ModifierKey,
}

impl Default for MarkerSettings {
    fn default() -> Self {
        Self {
            drag_threshold: DRAG_THRESHOLD,
            hit_radius: MARKER_HIT_RADIUS,
            click_tolerance: CLICK_TOLERANCE,
            placement_modifier: ModifierKey::default(),
        }
    }
}

/// A marker ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerView {
    pub id: PinId,
    /// Anchor position in container space
    pub screen: Point,
    /// Popup is open
    pub selected: bool,
    /// Details panel is open
    pub open: bool,
    pub dragging: bool,
}

/// Selection, popup and drag state for the markers on one map.
#[derive(Debug, Clone, Default)]
pub struct MarkerLayer {
    settings: MarkerSettings,
    selected: Option<PinId>,
    details: Option<PinId>,
    drag: Option<DragSession>,
}

impl MarkerLayer {
    pub fn new(settings: MarkerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &MarkerSettings {
        &self.settings
    }

    /// Marker whose popup is open.
    pub fn selected(&self) -> Option<&PinId> {
        self.selected.as_ref()
    }

    /// Marker whose details panel is open.
    pub fn details(&self) -> Option<&PinId> {
        self.details.as_ref()
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn is_dragging(&self, pin_id: &PinId) -> bool {
        self.drag.as_ref().is_some_and(|s| &s.pin_id == pin_id)
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Open the popup for a marker. Returns false while the details panel is open.
    pub fn select(&mut self, pin_id: &PinId) -> bool {
        if self.details.is_some() {
            log::debug!("Selection of {} suppressed: details panel open", pin_id);
            return false;
        }
        if self.selected.as_ref() != Some(pin_id) {
            log::debug!("Selected pin {}", pin_id);
            self.selected = Some(pin_id.clone());
        }
        true
    }

    /// Handle a click on empty map. Returns true if the selection was cleared.
    pub fn background_click(&mut self) -> bool {
        if self.details.is_some() {
            return false;
        }
        self.selected.take().is_some()
    }

    /// Open the details panel for a marker, closing its popup.
    pub fn open_details(&mut self, pin_id: &PinId) {
        self.selected = None;
        self.details = Some(pin_id.clone());
    }

    pub fn close_details(&mut self) {
        self.details = None;
    }

    /// Drop every reference to a pin that no longer exists.
    pub fn forget(&mut self, pin_id: &PinId) {
        if self.selected.as_ref() == Some(pin_id) {
            self.selected = None;
        }
        if self.details.as_ref() == Some(pin_id) {
            self.details = None;
        }
        if self.is_dragging(pin_id) {
            self.drag = None;
        }
    }

    // ========================================================================
    // Hit testing / overlay
    // ========================================================================

    /// Topmost marker within the hit radius of `screen`.
    pub fn hit_test<'a, I>(&self, pins: I, screen: Point, projection: &Projection) -> Option<PinId>
    where
        I: IntoIterator<Item = &'a Pin>,
        I::IntoIter: DoubleEndedIterator,
    {
        let radius = self.settings.hit_radius;
        pins.into_iter()
            .rev()
            .find(|pin| projection.project(pin.position()).distance_to(screen) <= radius)
            .map(|pin| pin.id.clone())
    }

    /// Screen placement of every pin, in draw order.
    pub fn overlay<'a, I>(&self, pins: I, projection: &Projection) -> Vec<MarkerView>
    where
        I: IntoIterator<Item = &'a Pin>,
    {
        pins.into_iter()
            .map(|pin| MarkerView {
                id: pin.id.clone(),
                screen: projection.project(pin.position()),
                selected: self.selected.as_ref() == Some(&pin.id),
                open: self.details.as_ref() == Some(&pin.id),
                dragging: self.is_dragging(&pin.id),
            })
            .collect()
    }

    // ========================================================================
    // Dragging
    // ========================================================================

    /// Start a drag session on `pin`. Replaces any existing session.
    pub fn begin_drag(&mut self, pin: &Pin, pointer_id: PointerId, screen: Point) {
        if let Some(previous) = &self.drag {
            log::warn!(
                "Starting drag on {} while {} still active - dropping it",
                pin.id,
                previous.pin_id
            );
        }
        self.drag = Some(DragSession::new(pin.id.clone(), pointer_id, screen, pin.position()));
        log::debug!("Potential drag on pin {}", pin.id);
    }

    /// Feed a pointer move. Returns the live position once past the threshold.
    pub fn drag_move(
        &mut self,
        pointer_id: PointerId,
        pointer: Point,
        projection: &Projection,
    ) -> Option<(PinId, PercentPoint)> {
        let threshold = self.settings.drag_threshold;
        let session = self.drag.as_mut()?;
        match step(session, pointer_id, pointer, projection, threshold) {
            DragStep::Moved(position) => {
                if !session.crossed_threshold {
                    log::debug!("Starting marker drag on pin {}", session.pin_id);
                }
                session.record(position);
                Some((session.pin_id.clone(), position))
            }
            DragStep::Holding | DragStep::Ignored => None,
        }
    }

    /// End the session on pointer-up (`Some`) or pointer-cancel (`None`).
    ///
    /// A release under the threshold counts as a click on the marker and
    /// goes through the selection rules.
    pub fn end_drag(
        &mut self,
        pointer_id: PointerId,
        pointer: Option<Point>,
        projection: &Projection,
    ) -> DragEnd {
        let Some(session) = &self.drag else {
            return DragEnd::Ignored;
        };
        let end = finish(session, pointer_id, pointer, projection, self.settings.drag_threshold);
        match &end {
            DragEnd::Ignored => return end,
            DragEnd::Click(pin_id) => {
                let pin_id = pin_id.clone();
                self.select(&pin_id);
            }
            DragEnd::Commit { pin_id, position } => {
                log::info!(
                    "Finished dragging pin {} to ({:.2}%, {:.2}%)",
                    pin_id,
                    position.x,
                    position.y
                );
            }
            DragEnd::Abandoned(_) => {}
        }
        self.drag = None;
        end
    }

    /// End any session as if its pointer were cancelled.
    pub fn cancel_drag(&mut self, projection: &Projection) -> DragEnd {
        match self.drag.as_ref().map(|s| s.pointer_id) {
            Some(pointer_id) => self.end_drag(pointer_id, None, projection),
            None => DragEnd::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zoom_math::{Size, Transform};

    const POINTER: PointerId = PointerId(1);

    fn projection() -> Projection {
        Projection::new(Transform::identity(), Size::new(1000.0, 1000.0))
    }

    fn pins() -> Vec<Pin> {
        vec![
            Pin::new(PinId::new("a"), PercentPoint::new(10.0, 10.0), "A", "plant"),
            Pin::new(PinId::new("b"), PercentPoint::new(10.5, 10.0), "B", "plant"),
            Pin::new(PinId::new("c"), PercentPoint::new(80.0, 80.0), "C", "plant"),
        ]
    }

    fn id(s: &str) -> PinId {
        PinId::new(s)
    }

    #[test]
    fn test_select_replaces_previous() {
        let mut layer = MarkerLayer::default();
        assert!(layer.select(&id("a")));
        assert!(layer.select(&id("b")));
        assert_eq!(layer.selected(), Some(&id("b")));
    }

    #[test]
    fn test_details_panel_suppresses_selection() {
        let mut layer = MarkerLayer::default();
        layer.select(&id("a"));
        layer.open_details(&id("a"));
        assert_eq!(layer.selected(), None);

        assert!(!layer.select(&id("b")));
        assert_eq!(layer.selected(), None);
        assert!(!layer.background_click());
        assert_eq!(layer.details(), Some(&id("a")));

        layer.close_details();
        assert!(layer.select(&id("b")));
    }

    #[test]
    fn test_background_click_deselects() {
        let mut layer = MarkerLayer::default();
        layer.select(&id("c"));
        assert!(layer.background_click());
        assert_eq!(layer.selected(), None);
        assert!(!layer.background_click());
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let layer = MarkerLayer::default();
        let pins = pins();
        // a at (100,100), b at (105,100): both in range, b drawn last
        assert_eq!(layer.hit_test(&pins, Point::new(102.0, 100.0), &projection()), Some(id("b")));
        assert_eq!(layer.hit_test(&pins, Point::new(800.0, 810.0), &projection()), Some(id("c")));
        assert_eq!(layer.hit_test(&pins, Point::new(500.0, 500.0), &projection()), None);
    }

    #[test]
    fn test_overlay_flags() {
        let mut layer = MarkerLayer::default();
        let pins = pins();
        layer.select(&id("a"));
        layer.begin_drag(&pins[2], POINTER, Point::new(800.0, 800.0));

        let views = layer.overlay(&pins, &projection());
        assert_eq!(views.len(), 3);
        assert_eq!(views[0].screen, Point::new(100.0, 100.0));
        assert!(views[0].selected && !views[0].dragging);
        assert!(views[2].dragging && !views[2].selected);
    }

    #[test]
    fn test_click_on_marker_selects() {
        let mut layer = MarkerLayer::default();
        let pins = pins();
        layer.begin_drag(&pins[2], POINTER, Point::new(800.0, 800.0));
        assert_eq!(layer.drag_move(POINTER, Point::new(801.0, 801.0), &projection()), None);

        let end = layer.end_drag(POINTER, Some(Point::new(801.0, 801.0)), &projection());
        assert_eq!(end, DragEnd::Click(id("c")));
        assert_eq!(layer.selected(), Some(&id("c")));
        assert!(layer.drag_session().is_none());
    }

    #[test]
    fn test_drag_emits_live_positions_then_commits() {
        let mut layer = MarkerLayer::default();
        let pins = pins();
        layer.begin_drag(&pins[2], POINTER, Point::new(800.0, 800.0));

        let live = layer.drag_move(POINTER, Point::new(810.0, 800.0), &projection());
        assert_eq!(live, Some((id("c"), PercentPoint::new(81.0, 80.0))));
        let (_, live) = layer
            .drag_move(POINTER, Point::new(811.0, 800.0), &projection())
            .expect("still dragging");
        assert!((live.x - 81.1).abs() < 1e-9);

        let end = layer.end_drag(POINTER, Some(Point::new(820.0, 790.0)), &projection());
        assert_eq!(
            end,
            DragEnd::Commit {
                pin_id: id("c"),
                position: PercentPoint::new(82.0, 79.0),
            }
        );
        assert_eq!(layer.selected(), None);
        assert!(layer.drag_session().is_none());
    }

    #[test]
    fn test_cancel_drag() {
        let mut layer = MarkerLayer::default();
        let pins = pins();
        assert_eq!(layer.cancel_drag(&projection()), DragEnd::Ignored);

        layer.begin_drag(&pins[0], POINTER, Point::new(100.0, 100.0));
        layer.drag_move(POINTER, Point::new(150.0, 100.0), &projection());
        let end = layer.cancel_drag(&projection());
        assert_eq!(
            end,
            DragEnd::Commit {
                pin_id: id("a"),
                position: PercentPoint::new(15.0, 10.0),
            }
        );
    }

    #[test]
    fn test_forget_clears_everything() {
        let mut layer = MarkerLayer::default();
        let pins = pins();
        layer.select(&id("a"));
        layer.begin_drag(&pins[0], POINTER, Point::new(100.0, 100.0));
        layer.forget(&id("a"));
        assert_eq!(layer.selected(), None);
        assert!(layer.drag_session().is_none());

        layer.open_details(&id("b"));
        layer.forget(&id("b"));
        assert_eq!(layer.details(), None);
    }
}
