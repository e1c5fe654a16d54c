use tracing::debug;

use crate::core::{Aggregates, Viewport};
use crate::error::ScrollyResult;
use crate::render::SceneAdapter;
use crate::sequencer::{ScrollLayout, StageSequencer};

use super::{
    DensityFilter, LoadState, Narrative, RenderContext, ScaleRegistry, ScrollyConfig,
    ScrollyEngine,
};

impl<S: SceneAdapter> ScrollyEngine<S> {
    #[must_use]
    pub fn config(&self) -> &ScrollyConfig {
        &self.config
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.load_state == LoadState::Ready
    }

    #[must_use]
    pub fn context(&self) -> Option<&RenderContext> {
        self.context.as_ref()
    }

    #[must_use]
    pub fn aggregates(&self) -> Option<&Aggregates> {
        self.context.as_ref().map(|context| &context.aggregates)
    }

    #[must_use]
    pub fn scales(&self) -> Option<&ScaleRegistry> {
        self.context.as_ref().map(|context| &context.scales)
    }

    #[must_use]
    pub fn sequencer(&self) -> Option<&StageSequencer> {
        self.sequencer.as_ref()
    }

    #[must_use]
    pub fn layout(&self) -> &ScrollLayout {
        &self.layout
    }

    #[must_use]
    pub fn scroll_y(&self) -> Option<f64> {
        self.sequencer.as_ref().and_then(StageSequencer::scroll_y)
    }

    #[must_use]
    pub fn density_filter(&self) -> DensityFilter {
        self.filter.density_filter()
    }

    #[must_use]
    pub fn normal_overlay(&self) -> DensityFilter {
        self.filter.normal_overlay()
    }

    /// Replaces measured section offsets. Stage progress is kept; the next
    /// scroll position is resolved against the new regions.
    pub fn set_layout(&mut self, layout: ScrollLayout) -> ScrollyResult<()> {
        if let Some(sequencer) = self.sequencer.as_mut() {
            sequencer.relayout(&layout)?;
        }
        self.layout = layout;
        Ok(())
    }

    /// Applies a new viewport and section layout.
    ///
    /// Scales, stage targets, and resting states all depend on the canvas
    /// size, so the narrative is rebuilt, the scene reset to baseline, and
    /// the previous scroll position replayed to completion. Nothing on the
    /// engine changes unless every rebuild step succeeds.
    pub fn resize(&mut self, viewport: Viewport, layout: ScrollLayout) -> ScrollyResult<()> {
        let mut config = self.config.clone();
        config.viewport = viewport;
        config.validate()?;

        let Some(current) = self.context.as_ref() else {
            self.config = config;
            self.layout = layout;
            return Ok(());
        };
        let context = current.relayout(config.clone())?;
        let narrative = Narrative::build(&context)?;
        let sequencer =
            StageSequencer::build(narrative.stages, narrative.blueprint.baseline(), &layout)?;

        for (id, kind) in narrative.blueprint.elements() {
            if !self.scene.has_element(id) {
                self.scene.create_element(id, kind)?;
            }
        }
        for (slot, value) in narrative.blueprint.baseline().iter() {
            self.scene.set_property(&slot.0, slot.1, value.clone())?;
        }

        let replay_y = self.scroll_y();
        self.config = config;
        self.layout = layout;
        self.context = Some(context);
        self.sequencer = Some(sequencer);
        self.owners.clear();

        if let Some(y) = replay_y {
            self.scroll_to(y)?;
            self.finish_playback()?;
        }
        if let Some(context) = self.context.as_ref() {
            self.filter.redraw(context, &mut self.scene)?;
        }

        debug!(
            width = viewport.width,
            height = viewport.height,
            replay_y,
            "resized scrolly engine"
        );
        Ok(())
    }
}
