//! Data models for pinmap.

mod form;
mod pin;
mod watering;

pub use form::{Field, FieldError, PinForm, ValidationErrors};
pub use pin::{MapId, NewPin, PercentPoint, Pin, PinDefaults, PinId, PinPatch, clamp_percent};
pub use watering::{Timestamp, WateringSettings, format_last_watered};
