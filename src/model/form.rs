//! Details-form validation.
//!
//! The presentation layer edits raw text. Nothing reaches the store until
//! the text validates into a [`PinPatch`].

use std::fmt;
use thiserror::Error;

use super::pin::{Pin, PinPatch};

/// Editable fields of the details form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Kind,
    WateringInterval,
}

impl Field {
    /// Get the display name for this field.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Kind => "Type",
            Field::WateringInterval => "Watering interval",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rejected field with a message fit for display next to it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: Field,
    pub message: String,
}

/// All field errors found in one validation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} invalid field(s): {}", .0.len(), summary(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn summary(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// Message for a given field, if it was rejected.
    pub fn for_field(&self, field: Field) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }
}

/// Raw text of the details form.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PinForm {
    pub name: String,
    pub kind: String,
    /// Days between waterings; empty means no schedule
    pub watering_interval: String,
}

impl PinForm {
    /// Prefill the form from a pin.
    pub fn from_pin(pin: &Pin) -> Self {
        Self {
            name: pin.name.clone(),
            kind: pin.kind.clone(),
            watering_interval: pin
                .watering_interval_days
                .map(|d| d.to_string())
                .unwrap_or_default(),
        }
    }

    /// Validate every field and build the attribute patch.
    pub fn validate(&self) -> Result<PinPatch, ValidationErrors> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError {
                field: Field::Name,
                message: "Name is required".to_string(),
            });
        }

        let kind = self.kind.trim();
        if kind.is_empty() {
            errors.push(FieldError {
                field: Field::Kind,
                message: "Type is required".to_string(),
            });
        }

        let interval = match parse_interval(&self.watering_interval) {
            Ok(interval) => interval,
            Err(message) => {
                errors.push(FieldError {
                    field: Field::WateringInterval,
                    message,
                });
                None
            }
        };

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        Ok(PinPatch {
            name: Some(name.to_string()),
            kind: Some(kind.to_string()),
            watering_interval_days: Some(interval),
            ..PinPatch::default()
        })
    }
}

fn parse_interval(text: &str) -> Result<Option<u32>, String> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    match text.parse::<u32>() {
        Ok(0) => Err("Watering interval must be at least 1 day".to_string()),
        Ok(days) => Ok(Some(days)),
        Err(_) => Err("Watering interval must be a whole number of days".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PercentPoint, PinId};

    fn form(name: &str, kind: &str, interval: &str) -> PinForm {
        PinForm {
            name: name.into(),
            kind: kind.into(),
            watering_interval: interval.into(),
        }
    }

    #[test]
    fn test_valid_form_builds_patch() {
        let patch = form("  Basil ", "herb", " 3 ").validate().unwrap();
        assert_eq!(patch.name.as_deref(), Some("Basil"));
        assert_eq!(patch.kind.as_deref(), Some("herb"));
        assert_eq!(patch.watering_interval_days, Some(Some(3)));
        assert_eq!(patch.x_percent, None);
    }

    #[test]
    fn test_empty_interval_clears_schedule() {
        let patch = form("Basil", "herb", "").validate().unwrap();
        assert_eq!(patch.watering_interval_days, Some(None));
    }

    #[test]
    fn test_rejects_each_bad_field() {
        let errors = form(" ", "", "often").validate().unwrap_err();
        assert_eq!(errors.0.len(), 3);
        assert_eq!(errors.for_field(Field::Name), Some("Name is required"));
        assert_eq!(errors.for_field(Field::Kind), Some("Type is required"));
        assert!(errors.for_field(Field::WateringInterval).is_some());
    }

    #[test]
    fn test_rejects_zero_and_negative_interval() {
        let zero = form("a", "b", "0").validate().unwrap_err();
        assert_eq!(
            zero.for_field(Field::WateringInterval),
            Some("Watering interval must be at least 1 day")
        );
        assert!(form("a", "b", "-2").validate().is_err());
        assert!(form("a", "b", "1.5").validate().is_err());
    }

    #[test]
    fn test_roundtrip_from_pin() {
        let pin = Pin::new(PinId::new("x"), PercentPoint::new(1.0, 1.0), "Rose", "shrub")
            .with_watering_interval(Some(4));
        let f = PinForm::from_pin(&pin);
        assert_eq!(f, form("Rose", "shrub", "4"));
    }

    #[test]
    fn test_error_display() {
        let errors = form("", "tree", "").validate().unwrap_err();
        assert_eq!(errors.to_string(), "1 invalid field(s): Name: Name is required");
    }
}
