use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::animation::PropertySlot;
use crate::error::ScrollyResult;
use crate::render::SceneAdapter;
use crate::sequencer::{Edge, ScrollLayout, StageSequencer};

use super::step_executor::StepExecutor;
use super::{FilterController, RenderContext, ScrollyConfig};

/// Outcome of the last load attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum LoadState {
    #[default]
    Empty,
    Ready,
    Failed(String),
}

/// Main orchestration facade consumed by host pages.
///
/// `ScrollyEngine` owns the derived data, the stage sequencer, and the density
/// filter state, and pushes every resolved property value into the scene.
pub struct ScrollyEngine<S: SceneAdapter> {
    pub(super) scene: S,
    pub(super) config: ScrollyConfig,
    pub(super) layout: ScrollLayout,
    pub(super) load_state: LoadState,
    pub(super) context: Option<RenderContext>,
    pub(super) sequencer: Option<StageSequencer>,
    pub(super) filter: FilterController,
    /// Stage currently holding each slot while in flight.
    pub(super) owners: HashMap<PropertySlot, usize>,
}

impl<S: SceneAdapter> ScrollyEngine<S> {
    /// Feeds a new scroll offset. Ignored until records are loaded.
    pub fn scroll_to(&mut self, y: f64) -> ScrollyResult<()> {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return Ok(());
        };
        let steps = sequencer.scroll_to(y)?;
        StepExecutor::execute(self, steps)
    }

    /// Advances discrete stage playback by `dt` seconds of frame time.
    pub fn tick(&mut self, dt: f64) -> ScrollyResult<()> {
        let scale = self.config.discrete_time_scale;
        let Some(sequencer) = self.sequencer.as_mut() else {
            return Ok(());
        };
        let steps = sequencer.tick(dt / scale);
        StepExecutor::execute(self, steps)
    }

    /// Completes every playing stage immediately.
    pub fn finish_playback(&mut self) -> ScrollyResult<()> {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return Ok(());
        };
        let steps = sequencer.finish_playback();
        StepExecutor::execute(self, steps)
    }

    /// Snaps one stage to `edge` and releases its elements.
    pub fn complete_and_yield(&mut self, stage_id: &str, edge: Edge) -> ScrollyResult<()> {
        let Some(sequencer) = self.sequencer.as_mut() else {
            return Ok(());
        };
        let index = sequencer.stage_index(stage_id)?;
        let steps = sequencer.complete_and_yield(index, edge)?;
        StepExecutor::execute(self, steps)
    }

    /// Density button entry point. Ignored until records are loaded.
    pub fn click_filter(&mut self, button_id: &str) -> ScrollyResult<()> {
        let Some(context) = self.context.as_ref() else {
            return Ok(());
        };
        self.filter.click(button_id, context, &mut self.scene)
    }

    #[must_use]
    pub fn scene(&self) -> &S {
        &self.scene
    }

    #[must_use]
    pub fn into_scene(self) -> S {
        self.scene
    }
}
