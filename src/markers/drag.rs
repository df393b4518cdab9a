//! Marker drag sessions.
//!
//! A press on a marker starts a session in the pending phase. Nothing is
//! emitted until the pointer has travelled `threshold` screen pixels from
//! where it went down; after that every move yields a live position. The
//! session ends with one commit if the threshold was ever crossed, or with
//! a click if it was not.
//!
//! [`step`] and [`finish`] are pure: they read the session and the event
//! and report what should happen. The caller owns the session.

use super::coords::Projection;
use crate::message::PointerId;
use crate::model::{PercentPoint, PinId};
use crate::zoom_math::Point;

/// An in-progress marker reposition.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub pin_id: PinId,
    pub pointer_id: PointerId,
    /// Where the pointer went down, in container space
    pub start: Point,
    /// Last live position, in percentage space
    pub last_position: PercentPoint,
    pub crossed_threshold: bool,
}

impl DragSession {
    pub fn new(pin_id: PinId, pointer_id: PointerId, start: Point, position: PercentPoint) -> Self {
        Self {
            pin_id,
            pointer_id,
            start,
            last_position: position,
            crossed_threshold: false,
        }
    }

    /// Record a live position. Marks the threshold as crossed.
    pub fn record(&mut self, position: PercentPoint) {
        self.last_position = position;
        self.crossed_threshold = true;
    }

    fn reaches(&self, pointer: Point, threshold: f64) -> bool {
        self.crossed_threshold || self.start.distance_to(pointer) >= threshold
    }
}

/// Result of a pointer move during a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragStep {
    /// The event belongs to another pointer
    Ignored,
    /// Still under the threshold; nothing to emit
    Holding,
    /// Live position for the marker
    Moved(PercentPoint),
}

/// Result of the pointer leaving a session.
#[derive(Debug, Clone, PartialEq)]
pub enum DragEnd {
    /// The event belongs to another pointer; the session continues
    Ignored,
    /// Released under the threshold
    Click(PinId),
    /// Cancelled under the threshold
    Abandoned(PinId),
    /// The final position to persist
    Commit { pin_id: PinId, position: PercentPoint },
}

/// Interpret a pointer move.
pub fn step(
    session: &DragSession,
    pointer_id: PointerId,
    pointer: Point,
    projection: &Projection,
    threshold: f64,
) -> DragStep {
    if pointer_id != session.pointer_id {
        return DragStep::Ignored;
    }
    if !session.reaches(pointer, threshold) {
        return DragStep::Holding;
    }
    DragStep::Moved(projection.unproject(pointer))
}

/// Interpret pointer-up (`Some(position)`) or pointer-cancel (`None`).
pub fn finish(
    session: &DragSession,
    pointer_id: PointerId,
    pointer: Option<Point>,
    projection: &Projection,
    threshold: f64,
) -> DragEnd {
    if pointer_id != session.pointer_id {
        return DragEnd::Ignored;
    }
    let pin_id = session.pin_id.clone();
    match pointer {
        Some(p) if session.reaches(p, threshold) => DragEnd::Commit {
            pin_id,
            position: projection.unproject(p),
        },
        Some(_) => DragEnd::Click(pin_id),
        None if session.crossed_threshold => DragEnd::Commit {
            pin_id,
            position: session.last_position,
        },
        None => DragEnd::Abandoned(pin_id),
    }
}
