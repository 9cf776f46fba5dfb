//! Multi-modal gaze activation engine for hands-free page turning.
//!
//! Converts a noisy gaze stream (plus blink and head-roll signals) into
//! reliable, debounced activations of on-screen targets. Six interaction
//! modes — touch, dwell, double blink, head tilt, gaze+tilt, smooth
//! pursuit — feed independent detector state machines; an arbitration
//! layer guarantees a single owner for each exclusive gesture slot.
//!
//! The host delivers `SensorSample`s and frame ticks, supplies live
//! target bounds through the registry surface, and reacts to
//! `EngineEvent::Activated`. The engine never touches layout, rendering,
//! or the camera pipeline.

pub mod blink;
pub mod dwell;
pub mod engine;
pub mod events;
pub mod geometry;
pub mod pursuit;
pub mod registry;
pub mod sensor;
pub mod tilt;

pub use engine::{InteractionEngine, InteractionMode};
pub use events::{ActivationEvent, EngineEvent, Modality};
pub use geometry::{Point, Rect};
pub use pursuit::{PursuitDirection, PursuitMotion};
pub use registry::TargetId;
pub use sensor::SensorSample;
pub use tilt::TiltDirection;
