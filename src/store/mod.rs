//! Persistence contract for pins.
//!
//! The map never talks to a backend directly. Interactions produce
//! [`StoreRequest`]s; whoever drives the event loop runs them with
//! [`execute`] and hands the resulting [`Completion`] back to the app.
//! Replies may arrive in any order.

mod memory;

pub use memory::{MemoryPinStore, StoreCall};

use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::model::{MapId, NewPin, Pin, PinId, PinPatch};

/// Broad classification of a failed store call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStatus {
    /// The request never got a reply (network down, timeout)
    Transport,
    /// The backend rejected the payload
    Validation,
    /// The pin or map does not exist
    NotFound,
    /// The backend failed while handling a valid request
    Server,
}

impl ErrorStatus {
    /// Classify an HTTP status code.
    pub fn from_http(code: u16) -> Self {
        match code {
            404 | 410 => ErrorStatus::NotFound,
            400 | 409 | 422 => ErrorStatus::Validation,
            500..=599 => ErrorStatus::Server,
            _ => ErrorStatus::Transport,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorStatus::Transport => "transport",
            ErrorStatus::Validation => "validation",
            ErrorStatus::NotFound => "not found",
            ErrorStatus::Server => "server",
        }
    }
}

impl fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed store call with a human-readable message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{status} error: {message}")]
pub struct StoreError {
    pub status: ErrorStatus,
    pub message: String,
}

impl StoreError {
    pub fn new(status: ErrorStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::Transport, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::NotFound, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorStatus::Server, message)
    }
}

/// Backend holding the pins of a map.
///
/// Calls are asynchronous and never retried by the caller.
pub trait PinStore {
    /// Fetch all markers for a map.
    fn list_pins(&self, map_id: &MapId) -> impl Future<Output = Result<Vec<Pin>, StoreError>>;

    /// Create a pin; the store assigns its identifier.
    fn create_pin(
        &self,
        map_id: &MapId,
        pin: NewPin,
    ) -> impl Future<Output = Result<Pin, StoreError>>;

    /// Change only the fields present in `patch`.
    fn patch_pin(
        &self,
        pin_id: &PinId,
        patch: PinPatch,
    ) -> impl Future<Output = Result<Pin, StoreError>>;

    /// Set the last-watered timestamp to the store's current time.
    fn water_pin(&self, pin_id: &PinId) -> impl Future<Output = Result<Pin, StoreError>>;

    fn delete_pin(&self, pin_id: &PinId) -> impl Future<Output = Result<(), StoreError>>;
}

/// Identifier pairing a request with its completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// One store operation.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// Initial load; `generation` lets stale replies be dropped
    List { map_id: MapId, generation: u64 },
    Create { map_id: MapId, pin: NewPin },
    Patch { pin_id: PinId, patch: PinPatch },
    Water { pin_id: PinId },
    Delete { pin_id: PinId },
}

impl StoreOp {
    /// The pin this operation targets, if any.
    pub fn pin_id(&self) -> Option<&PinId> {
        match self {
            StoreOp::Patch { pin_id, .. }
            | StoreOp::Water { pin_id }
            | StoreOp::Delete { pin_id } => Some(pin_id),
            StoreOp::List { .. } | StoreOp::Create { .. } => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StoreOp::List { .. } => "list",
            StoreOp::Create { .. } => "create",
            StoreOp::Patch { .. } => "patch",
            StoreOp::Water { .. } => "water",
            StoreOp::Delete { .. } => "delete",
        }
    }
}

/// A store operation tagged with its request id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRequest {
    pub id: RequestId,
    pub op: StoreOp,
}

/// Successful reply payload.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreReply {
    Pins(Vec<Pin>),
    Pin(Pin),
    Deleted,
}

/// A finished request with its outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub request: StoreRequest,
    pub outcome: Result<StoreReply, StoreError>,
}

/// Run one request against a store.
pub async fn execute<S: PinStore>(store: &S, request: StoreRequest) -> Completion {
    let outcome = match &request.op {
        StoreOp::List { map_id, .. } => store.list_pins(map_id).await.map(StoreReply::Pins),
        StoreOp::Create { map_id, pin } => {
            store.create_pin(map_id, pin.clone()).await.map(StoreReply::Pin)
        }
        StoreOp::Patch { pin_id, patch } => {
            store.patch_pin(pin_id, patch.clone()).await.map(StoreReply::Pin)
        }
        StoreOp::Water { pin_id } => store.water_pin(pin_id).await.map(StoreReply::Pin),
        StoreOp::Delete { pin_id } => store.delete_pin(pin_id).await.map(|()| StoreReply::Deleted),
    };
    if let Err(e) = &outcome {
        log::debug!("Store {} request {:?} failed: {}", request.op.name(), request.id, e);
    }
    Completion { request, outcome }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_http() {
        assert_eq!(ErrorStatus::from_http(404), ErrorStatus::NotFound);
        assert_eq!(ErrorStatus::from_http(422), ErrorStatus::Validation);
        assert_eq!(ErrorStatus::from_http(503), ErrorStatus::Server);
        assert_eq!(ErrorStatus::from_http(0), ErrorStatus::Transport);
    }

    #[test]
    fn test_error_display() {
        let e = StoreError::not_found("pin 7 does not exist");
        assert_eq!(e.to_string(), "not found error: pin 7 does not exist");
    }

    #[test]
    fn test_op_pin_id() {
        let id = PinId::new("a");
        assert_eq!(StoreOp::Water { pin_id: id.clone() }.pin_id(), Some(&id));
        let list = StoreOp::List {
            map_id: MapId::new("m"),
            generation: 1,
        };
        assert_eq!(list.pin_id(), None);
    }
}
