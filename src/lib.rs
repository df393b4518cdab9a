//! pinmap - interactive map viewer core
//!
//! A headless library for a pannable, zoomable background image with
//! location pins on top. Pins are stored in percentage space and can be
//! placed, selected, dragged and annotated with watering metadata.
//!
//! - [`viewport`]: the transform engine (cover fit, pan, animated wheel zoom)
//! - [`markers`]: pin placement on screen, selection and drag sessions
//! - [`board`]: the local pin cache with optimistic updates
//! - [`store`]: the persistence contract and an in-memory implementation
//! - [`app`]: the event loop tying it all together
//!
//! Rendering is left to the host: it draws [`app::MapApp::overlay`] on top
//! of the image using [`viewport::ViewportEngine::transform`].

pub mod app;
pub mod board;
pub mod config;
pub mod constants;
pub mod markers;
pub mod message;
pub mod model;
pub mod store;
pub mod viewport;
pub mod zoom_math;

pub use app::{MapApp, Mode};
pub use board::{PinBoard, SyncState};
pub use config::{AppConfig, ConfigError, LogLevel};
pub use markers::{MarkerLayer, MarkerSettings, MarkerView};
pub use message::InputEvent;
pub use model::{MapId, PercentPoint, Pin, PinId, PinPatch, Timestamp, format_last_watered};
pub use store::{Completion, MemoryPinStore, PinStore, StoreError, StoreRequest, execute};
pub use viewport::{ViewportEngine, ViewportSettings};
pub use zoom_math::{Point, Size, Transform};
