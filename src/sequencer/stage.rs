use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::animation::TimelineSpec;
use crate::core::density::DensityFilter;
use crate::error::ScrollyResult;
use crate::sequencer::trigger::{TriggerMode, TriggerRegionSpec};

/// Data-side effect run when a stage boundary is crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "hook", content = "filter", rename_all = "snake_case")]
pub enum StageHook {
    SetDensityFilter(DensityFilter),
    SetNormalOverlay(DensityFilter),
}

/// Region boundary crossing that fires hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryEvent {
    /// Start crossed while scrolling forward.
    Enter,
    /// End crossed while scrolling forward.
    Leave,
    /// End crossed while scrolling backward.
    EnterBack,
    /// Start crossed while scrolling backward.
    LeaveBack,
}

pub type HookList = SmallVec<[StageHook; 2]>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageHooks {
    #[serde(default)]
    pub on_enter: HookList,
    #[serde(default)]
    pub on_leave: HookList,
    #[serde(default)]
    pub on_enter_back: HookList,
    #[serde(default)]
    pub on_leave_back: HookList,
}

impl StageHooks {
    #[must_use]
    pub fn for_event(&self, event: BoundaryEvent) -> &[StageHook] {
        match event {
            BoundaryEvent::Enter => &self.on_enter,
            BoundaryEvent::Leave => &self.on_leave,
            BoundaryEvent::EnterBack => &self.on_enter_back,
            BoundaryEvent::LeaveBack => &self.on_leave_back,
        }
    }
}

/// One scroll-bound transition from the previous resting state to this
/// stage's resting state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: String,
    pub region: TriggerRegionSpec,
    pub mode: TriggerMode,
    #[serde(default)]
    pub timeline: TimelineSpec,
    #[serde(default)]
    pub hooks: StageHooks,
}

impl Stage {
    #[must_use]
    pub fn new(id: impl Into<String>, region: TriggerRegionSpec, mode: TriggerMode) -> Self {
        Self {
            id: id.into(),
            region,
            mode,
            timeline: TimelineSpec::default(),
            hooks: StageHooks::default(),
        }
    }

    /// Stage bound to `section` with the usual `"top center"` to
    /// `"center center"` region.
    pub fn in_section(
        id: impl Into<String>,
        section: impl Into<String>,
        mode: TriggerMode,
    ) -> ScrollyResult<Self> {
        Ok(Self::new(
            id,
            TriggerRegionSpec::new(section, "top center", "center center")?,
            mode,
        ))
    }

    #[must_use]
    pub fn with_timeline(mut self, timeline: TimelineSpec) -> Self {
        self.timeline = timeline;
        self
    }

    #[must_use]
    pub fn on_enter(mut self, hook: StageHook) -> Self {
        self.hooks.on_enter.push(hook);
        self
    }

    #[must_use]
    pub fn on_leave(mut self, hook: StageHook) -> Self {
        self.hooks.on_leave.push(hook);
        self
    }

    #[must_use]
    pub fn on_enter_back(mut self, hook: StageHook) -> Self {
        self.hooks.on_enter_back.push(hook);
        self
    }

    #[must_use]
    pub fn on_leave_back(mut self, hook: StageHook) -> Self {
        self.hooks.on_leave_back.push(hook);
        self
    }
}
