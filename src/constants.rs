//! Default values for the viewport, marker and watering settings.
//!
//! These are only defaults. Components receive their values through the
//! settings structs so tests and config files can override them.

/// Scale change per unit of wheel delta
pub const ZOOM_INTENSITY: f64 = 0.001;

/// Maximum zoom relative to the cover-fit scale
pub const MAX_ZOOM_FACTOR: f64 = 5.0;

/// Fraction of the remaining scale distance covered per animation frame
pub const ZOOM_EASING: f64 = 0.25;

/// Remaining scale distance below which the animation snaps to its target
pub const ZOOM_SNAP_EPSILON: f64 = 0.001;

/// Screen pixels a marker must travel before a press becomes a drag
pub const DRAG_THRESHOLD: f64 = 4.0;

/// Screen radius around a marker's anchor that counts as a hit
pub const MARKER_HIT_RADIUS: f64 = 14.0;

/// Screen pixels a background press may travel and still count as a click
pub const CLICK_TOLERANCE: f64 = 4.0;

/// Label shown when a pin has never been watered
pub const NEVER_WATERED_LABEL: &str = "Probably";

/// Name given to pins placed on the map
pub const DEFAULT_PIN_NAME: &str = "New plant";

/// Type given to pins placed on the map
pub const DEFAULT_PIN_KIND: &str = "plant";

/// Watering interval given to pins placed on the map
pub const DEFAULT_WATERING_INTERVAL_DAYS: u32 = 7;

/// Map used when the config does not name one
pub const DEFAULT_MAP_ID: &str = "default";

/// Milliseconds in one day
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
