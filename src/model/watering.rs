//! Watering timestamps and their display labels.

use serde::{Deserialize, Serialize};
use web_time::{SystemTime, UNIX_EPOCH};

use crate::constants::{MS_PER_DAY, NEVER_WATERED_LABEL};

/// Milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    /// Current wall-clock time. Clocks before the epoch read as 0.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0);
        Self(millis)
    }

    /// Whole days elapsed since `earlier`, rounded down. Negative if
    /// `earlier` is in the future. Saturates instead of overflowing.
    pub fn days_since(&self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0).div_euclid(MS_PER_DAY)
    }
}

/// Labels used when describing the last watering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WateringSettings {
    /// Shown when the pin has no recorded watering
    pub never_watered_label: String,
}

impl Default for WateringSettings {
    fn default() -> Self {
        Self {
            never_watered_label: NEVER_WATERED_LABEL.to_string(),
        }
    }
}

impl WateringSettings {
    /// Describe how long ago a pin was watered.
    ///
    /// Today and future timestamps read "Today"; older ones read "1 day ago"
    /// or "N days ago".
    pub fn format_last_watered(&self, last: Option<Timestamp>, now: Timestamp) -> String {
        let Some(last) = last else {
            return self.never_watered_label.clone();
        };
        match now.days_since(last) {
            days if days <= 0 => "Today".to_string(),
            1 => "1 day ago".to_string(),
            days => format!("{days} days ago"),
        }
    }
}

/// [`WateringSettings::format_last_watered`] with the default labels.
pub fn format_last_watered(last: Option<Timestamp>, now: Timestamp) -> String {
    WateringSettings::default().format_last_watered(last, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn days_ago(days: i64) -> Option<Timestamp> {
        Some(Timestamp::from_millis(NOW - days * MS_PER_DAY))
    }

    #[test]
    fn test_never_watered() {
        assert_eq!(format_last_watered(None, Timestamp::from_millis(NOW)), "Probably");
    }

    #[test]
    fn test_day_labels() {
        let now = Timestamp::from_millis(NOW);
        assert_eq!(format_last_watered(days_ago(0), now), "Today");
        assert_eq!(format_last_watered(days_ago(1), now), "1 day ago");
        assert_eq!(format_last_watered(days_ago(5), now), "5 days ago");
    }

    #[test]
    fn test_partial_day_rounds_down() {
        let now = Timestamp::from_millis(NOW);
        let last = Some(Timestamp::from_millis(NOW - MS_PER_DAY + 1));
        assert_eq!(format_last_watered(last, now), "Today");
    }

    #[test]
    fn test_future_timestamp_is_today() {
        let now = Timestamp::from_millis(NOW);
        assert_eq!(format_last_watered(days_ago(-3), now), "Today");
    }

    #[test]
    fn test_extreme_timestamps_saturate() {
        let earliest = Timestamp::from_millis(i64::MIN);
        let latest = Timestamp::from_millis(i64::MAX);
        assert_eq!(latest.days_since(earliest), i64::MAX / MS_PER_DAY);
        assert!(earliest.days_since(latest) < 0);
        assert_eq!(format_last_watered(Some(latest), earliest), "Today");
        assert_eq!(
            format_last_watered(Some(earliest), latest),
            format!("{} days ago", i64::MAX / MS_PER_DAY)
        );
    }

    #[test]
    fn test_custom_fallback_label() {
        let settings = WateringSettings {
            never_watered_label: "Never".into(),
        };
        assert_eq!(settings.format_last_watered(None, Timestamp::from_millis(NOW)), "Never");
    }

    #[test]
    fn test_now_is_after_epoch() {
        assert!(Timestamp::now().as_millis() > 0);
    }
}
