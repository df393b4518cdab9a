//! In-memory pin store.
//!
//! Behaves like a backend for a single session: it assigns ids, stamps
//! watering times with its own clock, and records every call. Failures can
//! be queued to exercise error paths.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::{Future, ready};

use super::{PinStore, StoreError};
use crate::model::{MapId, NewPin, Pin, PinId, PinPatch, Timestamp};

/// A call received by [`MemoryPinStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    List(MapId),
    Create(MapId, NewPin),
    Patch(PinId, PinPatch),
    Water(PinId),
    Delete(PinId),
}

/// Single-threaded store keeping pins per map in insertion order.
#[derive(Debug, Default)]
pub struct MemoryPinStore {
    pins: RefCell<Vec<(MapId, Pin)>>,
    next_id: Cell<u64>,
    /// Fixed clock for deterministic watering times
    clock: Cell<Option<Timestamp>>,
    failures: RefCell<VecDeque<StoreError>>,
    calls: RefCell<Vec<StoreCall>>,
}

impl MemoryPinStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing pins.
    pub fn with_pins(map_id: &MapId, pins: impl IntoIterator<Item = Pin>) -> Self {
        let store = Self::new();
        store
            .pins
            .borrow_mut()
            .extend(pins.into_iter().map(|p| (map_id.clone(), p)));
        store
    }

    /// Use a fixed time for watering instead of the wall clock.
    pub fn set_clock(&self, now: Timestamp) {
        self.clock.set(Some(now));
    }

    /// Make the next call fail with `error`. Queued failures apply in order.
    pub fn fail_next(&self, error: StoreError) {
        self.failures.borrow_mut().push_back(error);
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    /// Number of patch calls received.
    pub fn patch_count(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| matches!(c, StoreCall::Patch(..)))
            .count()
    }

    /// Current copy of a stored pin.
    pub fn get(&self, pin_id: &PinId) -> Option<Pin> {
        self.pins
            .borrow()
            .iter()
            .find(|(_, p)| &p.id == pin_id)
            .map(|(_, p)| p.clone())
    }

    pub fn len(&self) -> usize {
        self.pins.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.borrow().is_empty()
    }

    fn record(&self, call: StoreCall) -> Result<(), StoreError> {
        self.calls.borrow_mut().push(call);
        match self.failures.borrow_mut().pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn now(&self) -> Timestamp {
        self.clock.get().unwrap_or_else(Timestamp::now)
    }

    fn update<F>(&self, pin_id: &PinId, f: F) -> Result<Pin, StoreError>
    where
        F: FnOnce(&mut Pin),
    {
        let mut pins = self.pins.borrow_mut();
        let (_, pin) = pins
            .iter_mut()
            .find(|(_, p)| &p.id == pin_id)
            .ok_or_else(|| StoreError::not_found(format!("pin {pin_id} does not exist")))?;
        f(pin);
        Ok(pin.clone())
    }

    fn list(&self, map_id: &MapId) -> Result<Vec<Pin>, StoreError> {
        self.record(StoreCall::List(map_id.clone()))?;
        Ok(self
            .pins
            .borrow()
            .iter()
            .filter(|(m, _)| m == map_id)
            .map(|(_, p)| p.clone())
            .collect())
    }

    fn create(&self, map_id: &MapId, new_pin: NewPin) -> Result<Pin, StoreError> {
        self.record(StoreCall::Create(map_id.clone(), new_pin.clone()))?;
        if new_pin.name.trim().is_empty() {
            return Err(StoreError::validation("name must not be empty"));
        }
        if new_pin.watering_interval_days == Some(0) {
            return Err(StoreError::validation("wateringIntervalDays must be at least 1"));
        }
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        let pin = new_pin.into_pin(PinId::new(format!("pin-{n}")));
        self.pins.borrow_mut().push((map_id.clone(), pin.clone()));
        log::trace!("Memory store created {}", pin.id);
        Ok(pin)
    }

    fn patch(&self, pin_id: &PinId, patch: PinPatch) -> Result<Pin, StoreError> {
        self.record(StoreCall::Patch(pin_id.clone(), patch.clone()))?;
        if matches!(patch.name.as_deref(), Some(name) if name.trim().is_empty()) {
            return Err(StoreError::validation("name must not be empty"));
        }
        if patch.watering_interval_days == Some(Some(0)) {
            return Err(StoreError::validation("wateringIntervalDays must be at least 1"));
        }
        self.update(pin_id, |pin| pin.apply_patch(&patch))
    }

    fn water(&self, pin_id: &PinId) -> Result<Pin, StoreError> {
        self.record(StoreCall::Water(pin_id.clone()))?;
        let now = self.now();
        self.update(pin_id, |pin| pin.last_watered_timestamp = Some(now))
    }

    fn delete(&self, pin_id: &PinId) -> Result<(), StoreError> {
        self.record(StoreCall::Delete(pin_id.clone()))?;
        let mut pins = self.pins.borrow_mut();
        let before = pins.len();
        pins.retain(|(_, p)| &p.id != pin_id);
        if pins.len() == before {
            return Err(StoreError::not_found(format!("pin {pin_id} does not exist")));
        }
        Ok(())
    }
}

impl PinStore for MemoryPinStore {
    fn list_pins(&self, map_id: &MapId) -> impl Future<Output = Result<Vec<Pin>, StoreError>> {
        ready(self.list(map_id))
    }

    fn create_pin(
        &self,
        map_id: &MapId,
        pin: NewPin,
    ) -> impl Future<Output = Result<Pin, StoreError>> {
        ready(self.create(map_id, pin))
    }

    fn patch_pin(
        &self,
        pin_id: &PinId,
        patch: PinPatch,
    ) -> impl Future<Output = Result<Pin, StoreError>> {
        ready(self.patch(pin_id, patch))
    }

    fn water_pin(&self, pin_id: &PinId) -> impl Future<Output = Result<Pin, StoreError>> {
        ready(self.water(pin_id))
    }

    fn delete_pin(&self, pin_id: &PinId) -> impl Future<Output = Result<(), StoreError>> {
        ready(self.delete(pin_id))
    }
}
