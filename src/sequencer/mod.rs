//! Scroll-bound stage sequencing and hand-off between stages.

mod engine;
mod stage;
mod trigger;

pub use engine::{Edge, Playback, SequencePhase, SequencerStep, StageSequencer};
pub use stage::{BoundaryEvent, HookList, Stage, StageHook, StageHooks};
pub use trigger::{
    AnchorPoint, ScrollLayout, ScrollRegion, SectionBox, TriggerAnchor, TriggerMode,
    TriggerRegionSpec,
};
