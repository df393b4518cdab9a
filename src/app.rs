//! pinmap application core.
//!
//! [`MapApp`] routes input events to the viewport engine and the marker
//! layer, turns finished interactions into [`StoreRequest`]s, and applies
//! the [`Completion`]s the driver hands back. It never awaits anything
//! itself, so the map keeps reacting while requests are in flight.

use crate::board::{PinBoard, SyncState};
use crate::config::AppConfig;
use crate::markers::{DragEnd, MarkerLayer, MarkerView, Projection};
use crate::message::{InputEvent, Modifiers, PointerId, PointerInput};
use crate::model::{
    MapId, NewPin, PercentPoint, PinDefaults, PinForm, PinId, PinPatch, Timestamp, ValidationErrors,
    WateringSettings,
};
use crate::store::{Completion, RequestId, StoreError, StoreOp, StoreReply, StoreRequest};
use crate::viewport::ViewportEngine;
use crate::zoom_math::{Point, Size};

/// Interaction mode of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Pan, zoom and select only
    #[default]
    View,
    /// Markers can be dragged and placed
    Edit,
}

/// A pointer that went down and has not come up yet.
#[derive(Debug, Clone)]
struct Press {
    pointer_id: PointerId,
    start: Point,
    modifiers: Modifiers,
    /// Marker under the pointer at press time
    on_marker: Option<PinId>,
}

/// The interactive map.
#[derive(Debug)]
pub struct MapApp {
    map_id: MapId,
    mode: Mode,
    viewport: ViewportEngine,
    markers: MarkerLayer,
    board: PinBoard,
    new_pin: PinDefaults,
    watering: WateringSettings,
    press: Option<Press>,
    next_request: u64,
    /// Marker or board state changed since the last redraw
    dirty: bool,
}

impl MapApp {
    pub fn new(map_id: MapId, config: &AppConfig) -> Self {
        Self {
            map_id,
            mode: Mode::default(),
            viewport: ViewportEngine::new(config.viewport),
            markers: MarkerLayer::new(config.markers),
            board: PinBoard::new(),
            new_pin: config.new_pin.clone(),
            watering: config.watering.clone(),
            press: None,
            next_request: 0,
            dirty: false,
        }
    }

    /// Request the initial pin list.
    pub fn start(&mut self) -> StoreRequest {
        let generation = self.board.begin_load();
        log::info!("Loading pins for map {}", self.map_id);
        self.request(StoreOp::List {
            map_id: self.map_id.clone(),
            generation,
        })
    }

    /// Stop accepting the pending load. Late list replies are dropped.
    pub fn teardown(&mut self) {
        log::info!("Tearing down map {}", self.map_id);
        self.board.teardown();
        self.viewport.cancel_animation();
        self.viewport.end_pan();
        self.press = None;
    }

    fn request(&mut self, op: StoreOp) -> StoreRequest {
        self.next_request += 1;
        StoreRequest {
            id: RequestId(self.next_request),
            op,
        }
    }

    fn pin_request(&mut self, op: StoreOp) -> StoreRequest {
        if let Some(pin_id) = op.pin_id() {
            let pin_id = pin_id.clone();
            self.board.mark_pending(&pin_id);
        }
        self.dirty = true;
        self.request(op)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn map_id(&self) -> &MapId {
        &self.map_id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            log::debug!("Mode changed to {:?}", mode);
            self.mode = mode;
        }
    }

    pub fn viewport(&self) -> &ViewportEngine {
        &self.viewport
    }

    /// Mutable access for registering transform observers.
    pub fn viewport_mut(&mut self) -> &mut ViewportEngine {
        &mut self.viewport
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn board(&self) -> &PinBoard {
        &self.board
    }

    /// Current projection, once the image and container sizes are known.
    pub fn projection(&self) -> Option<Projection> {
        if !self.viewport.is_ready() {
            return None;
        }
        let natural = self.viewport.natural_size()?;
        Some(Projection::new(self.viewport.transform(), natural))
    }

    /// Markers to draw, in draw order. Empty until the viewport is ready.
    pub fn overlay(&self) -> Vec<MarkerView> {
        match self.projection() {
            Some(projection) => self.markers.overlay(self.board.pins(), &projection),
            None => Vec::new(),
        }
    }

    /// "Last watered" label for a pin.
    pub fn watering_label(&self, pin_id: &PinId, now: Timestamp) -> Option<String> {
        let pin = self.board.get(pin_id)?;
        Some(self.watering.format_last_watered(pin.last_watered_timestamp, now))
    }

    /// Whether the host should schedule another animation frame.
    pub fn wants_frame(&self) -> bool {
        self.viewport.is_animating()
    }

    /// Returns true once per batch of visible changes.
    pub fn take_redraw(&mut self) -> bool {
        let viewport = self.viewport.take_redraw();
        std::mem::take(&mut self.dirty) || viewport
    }

    // ========================================================================
    // Input
    // ========================================================================

    /// Handle one input event. Returns a store request when the event
    /// finishes an interaction that must be persisted.
    pub fn update(&mut self, event: InputEvent) -> Option<StoreRequest> {
        match event {
            InputEvent::ImageLoaded(size) => {
                self.viewport.set_natural_size(size);
                None
            }
            InputEvent::Resized(size) => {
                self.viewport.resize(size);
                None
            }
            InputEvent::PointerDown(input) => {
                self.pointer_down(input);
                None
            }
            InputEvent::PointerMove(input) => {
                self.pointer_move(input);
                None
            }
            InputEvent::PointerUp(input) => self.pointer_up(input),
            InputEvent::PointerCancel(pointer_id) => self.pointer_cancel(pointer_id),
            InputEvent::Wheel { delta, position } => {
                self.viewport.wheel(delta, position);
                None
            }
            InputEvent::Frame => {
                self.viewport.tick();
                None
            }
            InputEvent::Blur => self.blur(),
        }
    }

    fn pointer_down(&mut self, input: PointerInput) {
        if let Some(press) = &self.press {
            log::trace!(
                "Ignoring pointer {:?}: {:?} already down",
                input.pointer_id,
                press.pointer_id
            );
            return;
        }
        let Some(projection) = self.projection() else {
            return;
        };

        let on_marker = self.markers.hit_test(self.board.pins(), input.position, &projection);
        let dragged = match (&on_marker, self.mode) {
            (Some(pin_id), Mode::Edit) => self.board.get(pin_id),
            _ => None,
        };
        match dragged {
            Some(pin) => self.markers.begin_drag(pin, input.pointer_id, input.position),
            None => self.viewport.begin_pan(input.position),
        }

        self.press = Some(Press {
            pointer_id: input.pointer_id,
            start: input.position,
            modifiers: input.modifiers,
            on_marker,
        });
    }

    fn owns_pointer(&self, pointer_id: PointerId) -> bool {
        self.press.as_ref().is_some_and(|p| p.pointer_id == pointer_id)
    }

    fn pointer_move(&mut self, input: PointerInput) {
        if !self.owns_pointer(input.pointer_id) {
            return;
        }
        if self.markers.drag_session().is_some() {
            let Some(projection) = self.projection() else {
                return;
            };
            let moved = self
                .markers
                .drag_move(input.pointer_id, input.position, &projection);
            if let Some((pin_id, position)) = moved {
                self.board.set_position(&pin_id, position);
                self.dirty = true;
            }
        } else {
            self.viewport.pan_to(input.position);
        }
    }

    fn pointer_up(&mut self, input: PointerInput) -> Option<StoreRequest> {
        if !self.owns_pointer(input.pointer_id) {
            return None;
        }
        let press = self.press.take()?;

        if self.markers.drag_session().is_some() {
            let end = self.end_drag(input.pointer_id, Some(input.position));
            return self.finish_drag(end);
        }

        self.viewport.end_pan();
        if press.start.distance_to(input.position) > self.markers.settings().click_tolerance {
            return None;
        }
        self.click(&press, input.position)
    }

    fn pointer_cancel(&mut self, pointer_id: PointerId) -> Option<StoreRequest> {
        if !self.owns_pointer(pointer_id) {
            return None;
        }
        self.press = None;
        self.viewport.end_pan();
        if self.markers.drag_session().is_some() {
            let end = self.end_drag(pointer_id, None);
            return self.finish_drag(end);
        }
        None
    }

    /// Window lost focus: stop the zoom animation and end any gesture.
    fn blur(&mut self) -> Option<StoreRequest> {
        self.viewport.cancel_animation();
        self.viewport.end_pan();
        self.press = None;
        // Cancelling never reads the pointer, so a detached projection is enough
        let projection = self.projection().unwrap_or_else(|| self.detached_projection());
        let end = self.markers.cancel_drag(&projection);
        self.finish_drag(end)
    }

    /// Projection for ending a drag while the viewport has no usable size.
    fn detached_projection(&self) -> Projection {
        Projection::new(self.viewport.transform(), Size::default())
    }

    fn end_drag(&mut self, pointer_id: PointerId, pointer: Option<Point>) -> DragEnd {
        match self.projection() {
            Some(projection) => self.markers.end_drag(pointer_id, pointer, &projection),
            // Without a transform the release point means nothing; keep the last live position
            None => {
                let projection = self.detached_projection();
                self.markers.end_drag(pointer_id, None, &projection)
            }
        }
    }

    fn finish_drag(&mut self, end: DragEnd) -> Option<StoreRequest> {
        match end {
            DragEnd::Commit { pin_id, position } => Some(self.commit_move(pin_id, position)),
            DragEnd::Click(_) | DragEnd::Abandoned(_) => {
                self.dirty = true;
                None
            }
            DragEnd::Ignored => None,
        }
    }

    fn commit_move(&mut self, pin_id: PinId, position: PercentPoint) -> StoreRequest {
        self.board.set_position(&pin_id, position);
        self.pin_request(StoreOp::Patch {
            pin_id,
            patch: PinPatch::position(position),
        })
    }

    fn click(&mut self, press: &Press, position: Point) -> Option<StoreRequest> {
        if let Some(pin_id) = &press.on_marker {
            // The pin may have been deleted while the pointer was down
            if self.board.contains(pin_id) && self.markers.select(pin_id) {
                self.dirty = true;
            }
            return None;
        }

        let placement = self.markers.settings().placement_modifier;
        if self.mode == Mode::Edit && press.modifiers.has(placement) {
            return self.create_at(position);
        }
        if self.markers.background_click() {
            self.dirty = true;
        }
        None
    }

    fn create_at(&mut self, screen: Point) -> Option<StoreRequest> {
        let position = self.projection()?.unproject(screen);
        log::info!("Placing new pin at ({:.2}%, {:.2}%)", position.x, position.y);
        let pin = NewPin::at(position, &self.new_pin);
        Some(self.request(StoreOp::Create {
            map_id: self.map_id.clone(),
            pin,
        }))
    }

    // ========================================================================
    // Presentation actions
    // ========================================================================

    /// Open the details panel for a pin. Returns false if it is unknown.
    pub fn open_details(&mut self, pin_id: &PinId) -> bool {
        if !self.board.contains(pin_id) {
            return false;
        }
        self.markers.open_details(pin_id);
        self.dirty = true;
        true
    }

    pub fn close_details(&mut self) {
        self.markers.close_details();
        self.dirty = true;
    }

    /// Validate a details form and save it.
    ///
    /// Nothing is sent when validation fails. Returns `Ok(None)` if the pin
    /// is unknown.
    pub fn update_pin(
        &mut self,
        pin_id: &PinId,
        form: &PinForm,
    ) -> Result<Option<StoreRequest>, ValidationErrors> {
        let patch = form.validate()?;
        if !self.board.apply_patch(pin_id, &patch) {
            log::debug!("Edit for unknown pin {} dropped", pin_id);
            return Ok(None);
        }
        Ok(Some(self.pin_request(StoreOp::Patch {
            pin_id: pin_id.clone(),
            patch,
        })))
    }

    /// Record a watering now. The store's timestamp replaces the local one.
    pub fn mark_watered(&mut self, pin_id: &PinId) -> Option<StoreRequest> {
        if !self.board.touch_watered(pin_id, Timestamp::now()) {
            return None;
        }
        Some(self.pin_request(StoreOp::Water { pin_id: pin_id.clone() }))
    }

    /// Ask the store to delete a pin. The marker stays until it confirms.
    pub fn delete_pin(&mut self, pin_id: &PinId) -> Option<StoreRequest> {
        if !self.board.contains(pin_id) {
            return None;
        }
        Some(self.pin_request(StoreOp::Delete { pin_id: pin_id.clone() }))
    }

    /// Retry a pin whose last request failed by sending its full local copy.
    pub fn resync(&mut self, pin_id: &PinId) -> Option<StoreRequest> {
        let entry = self.board.entry(pin_id)?;
        if !matches!(entry.sync(), SyncState::Failed(_)) {
            return None;
        }
        let patch = PinPatch::full(&entry.pin);
        log::info!("Retrying sync for pin {}", pin_id);
        Some(self.pin_request(StoreOp::Patch {
            pin_id: pin_id.clone(),
            patch,
        }))
    }

    // ========================================================================
    // Completions
    // ========================================================================

    /// Apply a finished store request.
    ///
    /// Failures are logged, recorded on the pin and returned. Optimistic
    /// local state is left in place.
    pub fn apply(&mut self, completion: Completion) -> Result<(), StoreError> {
        let Completion { request, outcome } = completion;
        self.dirty = true;
        match (request.op, outcome) {
            (StoreOp::List { generation, .. }, Ok(StoreReply::Pins(pins))) => {
                self.board.apply_loaded(generation, pins);
                Ok(())
            }
            (StoreOp::Create { .. }, Ok(StoreReply::Pin(pin))) => {
                log::info!("Created pin {}", pin.id);
                self.board.insert(pin);
                Ok(())
            }
            (StoreOp::Patch { .. } | StoreOp::Water { .. }, Ok(StoreReply::Pin(pin))) => {
                let dragging = self.markers.drag_session().map(|s| s.pin_id.clone());
                self.board.reconcile(pin, dragging.as_ref());
                Ok(())
            }
            (StoreOp::Delete { pin_id }, Ok(StoreReply::Deleted)) => {
                log::info!("Deleted pin {}", pin_id);
                self.board.remove(&pin_id);
                self.markers.forget(&pin_id);
                Ok(())
            }
            (op, Ok(reply)) => {
                let error =
                    StoreError::server(format!("unexpected reply to {}: {:?}", op.name(), reply));
                Err(self.fail(&op, error))
            }
            (op, Err(error)) => Err(self.fail(&op, error)),
        }
    }

    fn fail(&mut self, op: &StoreOp, error: StoreError) -> StoreError {
        match op {
            StoreOp::List { .. } if self.board.is_torn_down() => {
                log::debug!("List failed after teardown: {}", error);
            }
            _ => log::warn!("Store {} failed: {}", op.name(), error),
        }
        if let Some(pin_id) = op.pin_id() {
            self.board.mark_failed(pin_id, error.clone());
        }
        error
    }
}
