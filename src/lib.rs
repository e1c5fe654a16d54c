//! scrolly-rs: scroll-driven narrative engine for the parole interview
//! visualization.
//!
//! Records are normalized and aggregated once, scales are derived from the
//! aggregates and the viewport, and an ordered list of scroll-bound stages
//! animates a retained scene through a [`render::SceneAdapter`].

pub mod animation;
pub mod api;
pub mod core;
pub mod error;
pub mod render;
pub mod sequencer;
pub mod telemetry;

pub use api::{ScrollyConfig, ScrollyEngine};
pub use error::{ScrollyError, ScrollyResult};
