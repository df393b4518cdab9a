//! Viewport engine: owns the image transform and evolves it in response to
//! load, resize, pan and wheel-zoom input.
//!
//! Invariants kept after every operation:
//! - `min_scale <= scale <= min_scale * max_zoom_factor`
//! - each offset axis stays in `[min(0, container - scaled_image), 0]`
//!
//! Until both the natural image size and the container size are known,
//! every operation is a no-op.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ZOOM_FACTOR, ZOOM_EASING, ZOOM_INTENSITY, ZOOM_SNAP_EPSILON};
use crate::zoom_math::{self, Point, Size, Transform};

/// Tunables for pan and zoom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportSettings {
    /// Scale change per unit of wheel delta
    pub zoom_intensity: f64,
    /// Maximum scale as a multiple of the cover-fit scale
    pub max_zoom_factor: f64,
    /// Fraction of the remaining distance covered per frame
    pub easing: f64,
    /// Distance below which the animation snaps to its target
    pub snap_epsilon: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            zoom_intensity: ZOOM_INTENSITY,
            max_zoom_factor: MAX_ZOOM_FACTOR,
            easing: ZOOM_EASING,
            snap_epsilon: ZOOM_SNAP_EPSILON,
        }
    }
}

/// Screen point held stationary while zooming.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomAnchor {
    /// Pointer position in container space
    pub screen: Point,
    /// Fractional position of the pointer within the image, each axis in [0, 1]
    pub relative: Point,
}

/// Wheel-zoom animation state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ZoomAnimation {
    #[default]
    Idle,
    /// Easing the rendered scale toward the engine's target scale
    Animating { anchor: ZoomAnchor },
}

impl ZoomAnimation {
    pub fn is_animating(&self) -> bool {
        matches!(self, ZoomAnimation::Animating { .. })
    }
}

/// Pan drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum PanDragState {
    #[default]
    Idle,
    /// Dragging; `anchor` is the pointer position minus the offset at drag start
    Dragging { anchor: Point },
}

impl PanDragState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, PanDragState::Dragging { .. })
    }
}

/// What observers receive on every transform change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportChange {
    pub transform: Transform,
    pub natural_size: Size,
    pub container_size: Size,
}

/// Handle returned by [`ViewportEngine::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&ViewportChange)>;

/// Single owner of the map transform.
pub struct ViewportEngine {
    settings: ViewportSettings,
    natural: Option<Size>,
    container: Option<Size>,
    min_scale: f64,
    transform: Transform,
    target_scale: f64,
    zoom: ZoomAnimation,
    pan: PanDragState,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    /// Set by every change, cleared by `take_redraw`
    redraw: bool,
}

impl std::fmt::Debug for ViewportEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewportEngine")
            .field("natural", &self.natural)
            .field("container", &self.container)
            .field("transform", &self.transform)
            .field("target_scale", &self.target_scale)
            .field("zoom", &self.zoom)
            .field("pan", &self.pan)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for ViewportEngine {
    fn default() -> Self {
        Self::new(ViewportSettings::default())
    }
}

impl ViewportEngine {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            settings,
            natural: None,
            container: None,
            min_scale: 1.0,
            transform: Transform::identity(),
            target_scale: 1.0,
            zoom: ZoomAnimation::Idle,
            pan: PanDragState::Idle,
            observers: Vec::new(),
            next_subscription: 0,
            redraw: false,
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register a callback run after every transform change.
    pub fn subscribe<F>(&mut self, f: F) -> SubscriptionId
    where
        F: FnMut(&ViewportChange) + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(f)));
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self) {
        self.redraw = true;
        let (Some(natural_size), Some(container_size)) = (self.natural, self.container) else {
            return;
        };
        let change = ViewportChange {
            transform: self.transform,
            natural_size,
            container_size,
        };
        for (_, observer) in &mut self.observers {
            observer(&change);
        }
    }

    /// Returns true once per batch of changes since the last call.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn natural_size(&self) -> Option<Size> {
        self.natural
    }

    pub fn container_size(&self) -> Option<Size> {
        self.container
    }

    /// Both sizes are known and non-zero.
    pub fn is_ready(&self) -> bool {
        self.sizes().is_some()
    }

    /// Cover-fit scale; meaningful only when ready.
    pub fn min_scale(&self) -> f64 {
        self.min_scale
    }

    pub fn max_scale(&self) -> f64 {
        self.min_scale * self.settings.max_zoom_factor
    }

    pub fn target_scale(&self) -> f64 {
        self.target_scale
    }

    pub fn zoom_state(&self) -> ZoomAnimation {
        self.zoom
    }

    pub fn is_animating(&self) -> bool {
        self.zoom.is_animating()
    }

    pub fn is_panning(&self) -> bool {
        self.pan.is_dragging()
    }

    fn sizes(&self) -> Option<(Size, Size)> {
        match (self.natural, self.container) {
            (Some(n), Some(c)) if n.is_usable() && c.is_usable() => Some((n, c)),
            _ => None,
        }
    }

    // ========================================================================
    // Load / resize
    // ========================================================================

    /// The background image finished loading.
    pub fn set_natural_size(&mut self, size: Size) {
        if !size.is_usable() {
            log::debug!("Ignoring unusable natural size {:?}", size);
            return;
        }
        self.natural = Some(size);
        self.fit();
    }

    /// The container was resized. Resets to the cover fit.
    pub fn resize(&mut self, size: Size) {
        self.container = Some(size);
        self.fit();
    }

    /// Reset to the cover-fit scale, centered.
    pub fn fit(&mut self) {
        let Some((natural, container)) = self.sizes() else {
            log::trace!("Viewport fit skipped: sizes not known yet");
            return;
        };
        let scale = zoom_math::cover_scale(container, natural);
        self.min_scale = scale;
        self.target_scale = scale;
        self.zoom = ZoomAnimation::Idle;
        self.pan = PanDragState::Idle;
        let offset = zoom_math::centered_offset(container, natural, scale);
        self.transform = Transform::new(scale, offset);
        log::debug!(
            "Viewport fit: scale {:.4}, offset ({:.1}, {:.1})",
            scale,
            self.transform.offset.x,
            self.transform.offset.y
        );
        self.notify();
    }

    fn clamped(&self, offset: Point, scale: f64) -> Option<Point> {
        let (natural, container) = self.sizes()?;
        Some(zoom_math::clamp_offset(offset, container, natural, scale))
    }

    // ========================================================================
    // Pan
    // ========================================================================

    /// Start a pan drag at `pointer`. Stops any zoom animation where it is.
    pub fn begin_pan(&mut self, pointer: Point) {
        if !self.is_ready() {
            return;
        }
        self.cancel_animation();
        let offset = self.transform.offset;
        self.pan = PanDragState::Dragging {
            anchor: Point::new(pointer.x - offset.x, pointer.y - offset.y),
        };
        log::trace!("Pan started at ({:.1}, {:.1})", pointer.x, pointer.y);
    }

    /// Move the pan drag. Returns false if no pan is in progress.
    pub fn pan_to(&mut self, pointer: Point) -> bool {
        let PanDragState::Dragging { anchor } = self.pan else {
            return false;
        };
        let candidate = Point::new(pointer.x - anchor.x, pointer.y - anchor.y);
        let Some(offset) = self.clamped(candidate, self.transform.scale) else {
            return false;
        };
        self.transform.offset = offset;
        self.notify();
        true
    }

    pub fn end_pan(&mut self) {
        if self.pan.is_dragging() {
            log::trace!("Pan ended");
        }
        self.pan = PanDragState::Idle;
    }

    // ========================================================================
    // Zoom
    // ========================================================================

    /// Retarget the zoom animation from a wheel event at `pointer`.
    ///
    /// Positive `delta` zooms out, negative zooms in. The image point under
    /// the pointer stays under it while the animation runs.
    pub fn wheel(&mut self, delta: f64, pointer: Point) {
        let Some((natural, _)) = self.sizes() else {
            return;
        };
        self.target_scale = (self.target_scale - delta * self.settings.zoom_intensity)
            .clamp(self.min_scale, self.max_scale());
        let anchor = ZoomAnchor {
            screen: pointer,
            relative: zoom_math::relative_position(pointer, &self.transform, natural),
        };
        self.zoom = ZoomAnimation::Animating { anchor };
        log::trace!(
            "Zoom target {:.4} at ({:.1}, {:.1})",
            self.target_scale,
            pointer.x,
            pointer.y
        );
    }

    /// Advance the zoom animation by one frame.
    ///
    /// Returns true while another frame is needed.
    pub fn tick(&mut self) -> bool {
        let ZoomAnimation::Animating { anchor } = self.zoom else {
            return false;
        };
        let Some((natural, _)) = self.sizes() else {
            self.zoom = ZoomAnimation::Idle;
            return false;
        };

        let remaining = self.target_scale - self.transform.scale;
        let (scale, done) = if remaining.abs() < self.settings.snap_epsilon {
            (self.target_scale, true)
        } else {
            (self.transform.scale + remaining * self.settings.easing, false)
        };

        let offset = zoom_math::anchored_offset(anchor.screen, anchor.relative, natural, scale);
        if let Some(offset) = self.clamped(offset, scale) {
            self.transform = Transform::new(scale, offset);
        }
        if done {
            self.zoom = ZoomAnimation::Idle;
            log::debug!("Zoom settled at {:.4}", scale);
        }
        self.notify();
        !done
    }

    /// Stop the zoom animation at the currently rendered scale.
    pub fn cancel_animation(&mut self) {
        if self.zoom.is_animating() {
            log::trace!("Zoom animation cancelled at {:.4}", self.transform.scale);
        }
        self.zoom = ZoomAnimation::Idle;
        self.target_scale = self.transform.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    const EPSILON: f64 = 1e-6;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn ready_engine() -> ViewportEngine {
        let mut engine = ViewportEngine::default();
        engine.resize(Size::new(800.0, 600.0));
        engine.set_natural_size(Size::new(1600.0, 900.0));
        engine
    }

    fn assert_offset_in_bounds(engine: &ViewportEngine) {
        let t = engine.transform();
        let natural = engine.natural_size().unwrap();
        let container = engine.container_size().unwrap();
        let scaled = natural.scaled(t.scale);
        let min_x = (container.width - scaled.width).min(0.0);
        let min_y = (container.height - scaled.height).min(0.0);
        assert!(t.offset.x <= EPSILON && t.offset.x >= min_x - EPSILON, "x {}", t.offset.x);
        assert!(t.offset.y <= EPSILON && t.offset.y >= min_y - EPSILON, "y {}", t.offset.y);
    }

    fn run_animation(engine: &mut ViewportEngine) -> usize {
        let mut frames = 0;
        while engine.tick() {
            frames += 1;
            assert_offset_in_bounds(engine);
            assert!(frames < 1000, "animation never settled");
        }
        frames
    }

    #[test]
    fn test_noop_until_sizes_known() {
        let mut engine = ViewportEngine::default();
        engine.begin_pan(Point::new(10.0, 10.0));
        assert!(!engine.pan_to(Point::new(50.0, 50.0)));
        engine.wheel(-100.0, Point::new(10.0, 10.0));
        assert!(!engine.tick());
        assert_eq!(engine.transform(), Transform::identity());

        engine.resize(Size::new(800.0, 600.0));
        assert!(!engine.is_ready());
        engine.set_natural_size(Size::new(0.0, 900.0));
        assert!(!engine.is_ready());
    }

    #[test]
    fn test_initial_cover_fit() {
        let engine = ready_engine();
        let t = engine.transform();
        let expected = (800.0_f64 / 1600.0).max(600.0 / 900.0);

        assert!(approx_eq(engine.min_scale(), expected));
        assert!(approx_eq(t.scale, expected));
        assert!(approx_eq(t.offset.y, 0.0));
        assert!(approx_eq(t.offset.x, (800.0 - 1600.0 * expected) / 2.0));
        assert!(approx_eq(engine.max_scale(), expected * 5.0));
    }

    #[test]
    fn test_resize_refits() {
        let mut engine = ready_engine();
        engine.wheel(-500.0, Point::new(400.0, 300.0));
        run_animation(&mut engine);

        engine.resize(Size::new(1600.0, 1800.0));
        assert!(approx_eq(engine.transform().scale, 2.0));
        assert!(approx_eq(engine.target_scale(), 2.0));
        assert!(!engine.is_animating());
        assert_offset_in_bounds(&engine);
    }

    #[test]
    fn test_pan_follows_pointer_within_bounds() {
        let mut engine = ready_engine();
        let start = engine.transform().offset;

        engine.begin_pan(Point::new(400.0, 300.0));
        assert!(engine.pan_to(Point::new(450.0, 300.0)));
        assert!(approx_eq(engine.transform().offset.x, start.x + 50.0));

        // Dragging far right pins the left edge to the container edge
        engine.pan_to(Point::new(2000.0, 300.0));
        assert!(approx_eq(engine.transform().offset.x, 0.0));

        // Vertical axis exactly fills the container, so it never moves
        engine.pan_to(Point::new(0.0, -400.0));
        assert!(approx_eq(engine.transform().offset.y, 0.0));
        assert_offset_in_bounds(&engine);

        engine.end_pan();
        assert!(!engine.pan_to(Point::new(10.0, 10.0)));
    }

    #[test]
    fn test_wheel_target_is_clamped() {
        let mut engine = ready_engine();
        let min = engine.min_scale();

        engine.wheel(1_000_000.0, Point::new(400.0, 300.0));
        assert!(approx_eq(engine.target_scale(), min));

        engine.wheel(-1_000_000.0, Point::new(400.0, 300.0));
        assert!(approx_eq(engine.target_scale(), min * 5.0));

        run_animation(&mut engine);
        assert!(approx_eq(engine.transform().scale, min * 5.0));
    }

    #[test]
    fn test_zoom_eases_and_snaps() {
        let mut engine = ready_engine();
        let start = engine.transform().scale;
        engine.wheel(-200.0, Point::new(400.0, 300.0));
        let target = engine.target_scale();
        assert!(approx_eq(target, start + 0.2));

        assert!(engine.tick());
        assert!(approx_eq(engine.transform().scale, start + 0.2 * 0.25));

        run_animation(&mut engine);
        assert_eq!(engine.transform().scale, target);
        assert!(!engine.is_animating());
    }

    #[test]
    fn test_zoom_keeps_point_under_cursor() {
        let mut engine = ready_engine();
        let cursor = Point::new(420.0, 280.0);
        let image_before = engine.transform().screen_to_image(cursor);

        engine.wheel(-300.0, cursor);
        while engine.tick() {
            let image_now = engine.transform().screen_to_image(cursor);
            assert!(approx_eq(image_now.x, image_before.x));
            assert!(approx_eq(image_now.y, image_before.y));
        }
    }

    #[test]
    fn test_zoom_out_clamps_offset() {
        let mut engine = ready_engine();
        engine.wheel(-1000.0, Point::new(0.0, 0.0));
        run_animation(&mut engine);

        // Zooming back out anchored at the far corner must not expose empty space
        engine.wheel(1000.0, Point::new(800.0, 600.0));
        run_animation(&mut engine);
        assert!(approx_eq(engine.transform().scale, engine.min_scale()));
        assert_offset_in_bounds(&engine);
    }

    #[test]
    fn test_new_wheel_retargets_single_animation() {
        let mut engine = ready_engine();
        engine.wheel(-100.0, Point::new(100.0, 100.0));
        engine.tick();
        engine.wheel(-100.0, Point::new(600.0, 500.0));

        let ZoomAnimation::Animating { anchor } = engine.zoom_state() else {
            panic!("expected animation");
        };
        assert_eq!(anchor.screen, Point::new(600.0, 500.0));
        assert!(approx_eq(engine.target_scale(), engine.min_scale() + 0.2));
    }

    #[test]
    fn test_cancel_animation_stops_in_place() {
        let mut engine = ready_engine();
        engine.wheel(-400.0, Point::new(400.0, 300.0));
        engine.tick();
        let scale = engine.transform().scale;

        engine.cancel_animation();
        assert!(!engine.tick());
        assert_eq!(engine.transform().scale, scale);
        assert_eq!(engine.target_scale(), scale);
    }

    #[test]
    fn test_begin_pan_cancels_zoom() {
        let mut engine = ready_engine();
        engine.wheel(-400.0, Point::new(400.0, 300.0));
        engine.tick();
        engine.begin_pan(Point::new(400.0, 300.0));
        assert!(!engine.is_animating());
        assert!(engine.is_panning());
    }

    #[test]
    fn test_observers_and_redraw() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut engine = ViewportEngine::default();
        let sink = Rc::clone(&seen);
        let id = engine.subscribe(move |change| sink.borrow_mut().push(change.transform));

        engine.resize(Size::new(800.0, 600.0));
        assert!(seen.borrow().is_empty());
        engine.set_natural_size(Size::new(1600.0, 900.0));
        assert_eq!(seen.borrow().len(), 1);

        engine.begin_pan(Point::new(0.0, 0.0));
        engine.pan_to(Point::new(-10.0, 0.0));
        engine.pan_to(Point::new(-20.0, 0.0));
        assert_eq!(seen.borrow().len(), 3);
        assert_eq!(*seen.borrow().last().unwrap(), engine.transform());

        // Three changes, one redraw
        assert!(engine.take_redraw());
        assert!(!engine.take_redraw());

        assert!(engine.unsubscribe(id));
        engine.pan_to(Point::new(-30.0, 0.0));
        assert_eq!(seen.borrow().len(), 3);
        assert!(!engine.unsubscribe(id));
    }

    #[test]
    fn test_custom_settings() {
        let mut engine = ViewportEngine::new(ViewportSettings {
            max_zoom_factor: 2.0,
            easing: 1.0,
            ..ViewportSettings::default()
        });
        engine.resize(Size::new(100.0, 100.0));
        engine.set_natural_size(Size::new(100.0, 100.0));
        engine.wheel(-10_000.0, Point::new(50.0, 50.0));
        assert!(approx_eq(engine.target_scale(), 2.0));

        // Easing of 1.0 reaches the target in one frame, then snaps
        engine.tick();
        assert!(approx_eq(engine.transform().scale, 2.0));
        assert!(!engine.tick());
    }
}
