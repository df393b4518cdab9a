//! Pin data model.
//!
//! Pins are stored in percentage space: each axis runs from 0 to 100 across
//! the natural image, so a pin stays valid for any zoom, pan or image size.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::watering::Timestamp;
use crate::zoom_math::{Point, Size};

/// Opaque pin identifier assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinId(pub String);

impl PinId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the map a pin belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub String);

impl MapId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clamp a percentage coordinate into [0, 100]. NaN maps to 0.
pub fn clamp_percent(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// A position in percentage space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PercentPoint {
    pub x: f64,
    pub y: f64,
}

impl PercentPoint {
    /// Create a point, clamping both axes into [0, 100].
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: clamp_percent(x),
            y: clamp_percent(y),
        }
    }

    /// Convert to natural image pixels.
    pub fn to_image(self, natural: Size) -> Point {
        Point::new(self.x * natural.width / 100.0, self.y * natural.height / 100.0)
    }

    /// Convert from natural image pixels, clamping to the image.
    pub fn from_image(image: Point, natural: Size) -> Self {
        Self::new(image.x * 100.0 / natural.width, image.y * 100.0 / natural.height)
    }
}

/// A location marker with care-tracking metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: PinId,
    #[serde(deserialize_with = "wire::percent")]
    pub x_percent: f64,
    #[serde(deserialize_with = "wire::percent")]
    pub y_percent: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, deserialize_with = "wire::interval")]
    pub watering_interval_days: Option<u32>,
    #[serde(default)]
    pub last_watered_timestamp: Option<Timestamp>,
}

impl Pin {
    /// Create a pin at the given position. Coordinates are clamped.
    pub fn new(
        id: PinId,
        position: PercentPoint,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            id,
            x_percent: position.x,
            y_percent: position.y,
            name: name.into(),
            kind: kind.into(),
            watering_interval_days: None,
            last_watered_timestamp: None,
        }
    }

    pub fn with_watering_interval(mut self, days: Option<u32>) -> Self {
        self.watering_interval_days = days;
        self
    }

    pub fn position(&self) -> PercentPoint {
        PercentPoint::new(self.x_percent, self.y_percent)
    }

    pub fn set_position(&mut self, position: PercentPoint) {
        self.x_percent = clamp_percent(position.x);
        self.y_percent = clamp_percent(position.y);
    }

    /// Pull coordinates into [0, 100] and drop a zero-day schedule.
    pub fn normalize(&mut self) {
        self.set_position(PercentPoint {
            x: self.x_percent,
            y: self.y_percent,
        });
        self.watering_interval_days = self.watering_interval_days.filter(|&days| days > 0);
    }

    /// Apply the fields present in a patch. Coordinates are clamped.
    pub fn apply_patch(&mut self, patch: &PinPatch) {
        if let Some(x) = patch.x_percent {
            self.x_percent = clamp_percent(x);
        }
        if let Some(y) = patch.y_percent {
            self.y_percent = clamp_percent(y);
        }
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(kind) = &patch.kind {
            self.kind = kind.clone();
        }
        if let Some(interval) = patch.watering_interval_days {
            self.watering_interval_days = interval;
        }
    }

    /// Whether the watering interval has elapsed.
    ///
    /// Returns `None` for pins without a schedule. A pin that has never been
    /// watered is always due.
    pub fn watering_due(&self, now: Timestamp) -> Option<bool> {
        let interval = self.watering_interval_days?;
        Some(match self.last_watered_timestamp {
            Some(last) => now.days_since(last) >= i64::from(interval),
            None => true,
        })
    }
}

/// Payload for creating a pin. The store assigns the identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPin {
    pub x_percent: f64,
    pub y_percent: f64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub watering_interval_days: Option<u32>,
}

impl NewPin {
    /// Build a create payload at `position` using the given defaults.
    pub fn at(position: PercentPoint, defaults: &PinDefaults) -> Self {
        Self {
            x_percent: position.x,
            y_percent: position.y,
            name: defaults.name.clone(),
            kind: defaults.kind.clone(),
            watering_interval_days: defaults.watering_interval_days,
        }
    }

    /// Materialize the pin under a store-assigned id.
    pub fn into_pin(self, id: PinId) -> Pin {
        Pin::new(id, PercentPoint::new(self.x_percent, self.y_percent), self.name, self.kind)
            .with_watering_interval(self.watering_interval_days)
    }
}

/// Partial update. Only the fields that are `Some` change.
///
/// `watering_interval_days` is doubly optional: `Some(None)` clears the
/// schedule while `None` leaves it untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "nullable_field"
    )]
    pub watering_interval_days: Option<Option<u32>>,
}

impl PinPatch {
    /// A patch that moves a pin.
    pub fn position(position: PercentPoint) -> Self {
        Self {
            x_percent: Some(position.x),
            y_percent: Some(position.y),
            ..Self::default()
        }
    }

    /// A patch carrying every editable field of `pin`.
    pub fn full(pin: &Pin) -> Self {
        Self {
            x_percent: Some(pin.x_percent),
            y_percent: Some(pin.y_percent),
            name: Some(pin.name.clone()),
            kind: Some(pin.kind.clone()),
            watering_interval_days: Some(pin.watering_interval_days),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Serde helper so a present `null` deserializes to `Some(None)`.
mod nullable_field {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Option<u32>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Option<u32>>, D::Error> {
        Option::<u32>::deserialize(deserializer).map(Some)
    }
}

/// Lenient readers for pins coming from a store.
mod wire {
    use serde::{Deserialize, Deserializer};

    pub fn percent<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        f64::deserialize(deserializer).map(super::clamp_percent)
    }

    /// A zero-day interval means no schedule.
    pub fn interval<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        Option::<u32>::deserialize(deserializer).map(|days| days.filter(|&d| d > 0))
    }
}

/// Attributes given to pins placed by clicking the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinDefaults {
    pub name: String,
    pub kind: String,
    pub watering_interval_days: Option<u32>,
}

impl Default for PinDefaults {
    fn default() -> Self {
        Self {
            name: crate::constants::DEFAULT_PIN_NAME.to_string(),
            kind: crate::constants::DEFAULT_PIN_KIND.to_string(),
            watering_interval_days: Some(crate::constants::DEFAULT_WATERING_INTERVAL_DAYS),
        }
    }
}
