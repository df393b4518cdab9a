//! Input events delivered to the map.
//!
//! Everything the map reacts to arrives as an [`InputEvent`], in arrival
//! order, on one thread.

use serde::{Deserialize, Serialize};

use crate::zoom_math::{Point, Size};

/// Identifies one pointer (mouse, pen or touch contact).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PointerId(pub u32);

/// Modifier keys held during a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
        meta: false,
    };

    /// Whether `key` is held.
    pub fn has(&self, key: ModifierKey) -> bool {
        match key {
            ModifierKey::Shift => self.shift,
            ModifierKey::Alt => self.alt,
            ModifierKey::Ctrl => self.ctrl,
            ModifierKey::Meta => self.meta,
        }
    }

    pub fn with(mut self, key: ModifierKey) -> Self {
        match key {
            ModifierKey::Shift => self.shift = true,
            ModifierKey::Alt => self.alt = true,
            ModifierKey::Ctrl => self.ctrl = true,
            ModifierKey::Meta => self.meta = true,
        }
        self
    }
}

/// A single modifier key, used to configure placement clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModifierKey {
    Shift,
    #[default]
    Alt,
    Ctrl,
    Meta,
}

/// A pointer event in container coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub pointer_id: PointerId,
    pub position: Point,
    pub modifiers: Modifiers,
}

impl PointerInput {
    pub fn new(pointer_id: PointerId, position: Point) -> Self {
        Self {
            pointer_id,
            position,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// Events the map reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// Background image metadata arrived
    ImageLoaded(Size),
    /// Container was resized
    Resized(Size),
    PointerDown(PointerInput),
    PointerMove(PointerInput),
    PointerUp(PointerInput),
    /// The platform took the pointer away (no position)
    PointerCancel(PointerId),
    /// Wheel scroll; positive delta zooms out
    Wheel { delta: f64, position: Point },
    /// Animation frame callback
    Frame,
    /// Window lost focus
    Blur,
}
