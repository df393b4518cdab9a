//! Local cache of the pins on a map.
//!
//! Every pin carries a sync state next to it. Moves, edits and waterings
//! are applied here first and reconciled with the store's reply later.

use crate::model::{PercentPoint, Pin, PinId, PinPatch, Timestamp};
use crate::store::StoreError;

/// Where a cached pin stands relative to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncState {
    Synced,
    /// Requests still in flight
    Pending(u32),
    /// The last reply for this pin was a failure
    Failed(StoreError),
}

/// A cached pin and its bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct PinEntry {
    pub pin: Pin,
    in_flight: u32,
    error: Option<StoreError>,
}

impl PinEntry {
    fn new(mut pin: Pin) -> Self {
        pin.normalize();
        Self {
            pin,
            in_flight: 0,
            error: None,
        }
    }

    pub fn sync(&self) -> SyncState {
        match (&self.error, self.in_flight) {
            (Some(e), _) => SyncState::Failed(e.clone()),
            (None, 0) => SyncState::Synced,
            (None, n) => SyncState::Pending(n),
        }
    }

    fn settle(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// Pins of one map in draw order.
#[derive(Debug, Default)]
pub struct PinBoard {
    entries: Vec<PinEntry>,
    load_generation: u64,
    loaded: bool,
    torn_down: bool,
}

impl PinBoard {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Start a new load. Replies tagged with an older generation are dropped.
    pub fn begin_load(&mut self) -> u64 {
        self.load_generation += 1;
        self.load_generation
    }

    /// Replace the cache with a list reply.
    ///
    /// Returns false if the reply is stale or the board was torn down.
    pub fn apply_loaded(&mut self, generation: u64, pins: Vec<Pin>) -> bool {
        if self.torn_down {
            log::debug!("Dropping list reply after teardown");
            return false;
        }
        if generation != self.load_generation {
            log::debug!(
                "Dropping stale list reply (generation {}, current {})",
                generation,
                self.load_generation
            );
            return false;
        }
        log::info!("Loaded {} pins", pins.len());
        self.entries = pins.into_iter().map(PinEntry::new).collect();
        self.loaded = true;
        true
    }

    /// Stop accepting load replies.
    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, pin_id: &PinId) -> bool {
        self.entry(pin_id).is_some()
    }

    pub fn get(&self, pin_id: &PinId) -> Option<&Pin> {
        self.entry(pin_id).map(|e| &e.pin)
    }

    pub fn entry(&self, pin_id: &PinId) -> Option<&PinEntry> {
        self.entries.iter().find(|e| &e.pin.id == pin_id)
    }

    fn entry_mut(&mut self, pin_id: &PinId) -> Option<&mut PinEntry> {
        self.entries.iter_mut().find(|e| &e.pin.id == pin_id)
    }

    /// Pins in draw order; later pins are drawn on top.
    pub fn pins(&self) -> impl DoubleEndedIterator<Item = &Pin> + ExactSizeIterator {
        self.entries.iter().map(|e| &e.pin)
    }

    pub fn entries(&self) -> &[PinEntry] {
        &self.entries
    }

    /// Pins whose last request failed.
    pub fn failed(&self) -> impl Iterator<Item = &PinEntry> {
        self.entries.iter().filter(|e| e.error.is_some())
    }

    // ========================================================================
    // Optimistic updates
    // ========================================================================

    /// Move a pin locally. Returns false if it is unknown.
    pub fn set_position(&mut self, pin_id: &PinId, position: PercentPoint) -> bool {
        match self.entry_mut(pin_id) {
            Some(entry) => {
                entry.pin.set_position(position);
                true
            }
            None => false,
        }
    }

    pub fn apply_patch(&mut self, pin_id: &PinId, patch: &PinPatch) -> bool {
        match self.entry_mut(pin_id) {
            Some(entry) => {
                entry.pin.apply_patch(patch);
                true
            }
            None => false,
        }
    }

    /// Record a watering at `now` before the store confirms it.
    pub fn touch_watered(&mut self, pin_id: &PinId, now: Timestamp) -> bool {
        match self.entry_mut(pin_id) {
            Some(entry) => {
                entry.pin.last_watered_timestamp = Some(now);
                true
            }
            None => false,
        }
    }

    // ========================================================================
    // Sync bookkeeping
    // ========================================================================

    /// A request for the pin was issued. Clears any earlier failure.
    pub fn mark_pending(&mut self, pin_id: &PinId) {
        if let Some(entry) = self.entry_mut(pin_id) {
            entry.in_flight += 1;
            entry.error = None;
        }
    }

    /// A request for the pin failed. Local state is left as is.
    pub fn mark_failed(&mut self, pin_id: &PinId, error: StoreError) {
        if let Some(entry) = self.entry_mut(pin_id) {
            entry.settle();
            entry.error = Some(error);
        }
    }

    /// Take the store's copy of a pin as the truth.
    ///
    /// If the pin is being dragged (`dragging`), its live position is kept so
    /// the marker does not jump under the pointer. Returns false if the pin
    /// is no longer cached.
    pub fn reconcile(&mut self, pin: Pin, dragging: Option<&PinId>) -> bool {
        let keep_position = dragging == Some(&pin.id);
        let Some(entry) = self.entry_mut(&pin.id) else {
            log::debug!("Ignoring reply for unknown pin {}", pin.id);
            return false;
        };
        let live = entry.pin.position();
        entry.pin = pin;
        entry.pin.normalize();
        if keep_position {
            entry.pin.set_position(live);
        }
        entry.settle();
        entry.error = None;
        true
    }

    /// Add a pin created by the store. An existing copy is replaced in place.
    pub fn insert(&mut self, pin: Pin) {
        let entry = PinEntry::new(pin);
        match self.entry_mut(&entry.pin.id) {
            Some(existing) => existing.pin = entry.pin,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, pin_id: &PinId) -> Option<Pin> {
        let index = self.entries.iter().position(|e| &e.pin.id == pin_id)?;
        Some(self.entries.remove(index).pin)
    }
}
