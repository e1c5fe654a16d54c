//! Stage timelines: easing, tween declarations, and compiled playback.

mod ease;
mod timeline;

pub use ease::Ease;
pub use timeline::{
    CompiledTimeline, PropertySlot, PropertyTarget, SceneState, TargetValue, TimelineSpec, Tween,
    TweenPosition,
};
