use crate::error::{ScrollyError, ScrollyResult};
use crate::render::SceneAdapter;

use super::{EngineSnapshot, ScrollyEngine, StageSnapshot};

impl<S: SceneAdapter> ScrollyEngine<S> {
    /// Builds a deterministic snapshot useful for regression tests.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        let stages = self
            .sequencer
            .as_ref()
            .map(|sequencer| {
                sequencer
                    .stages()
                    .iter()
                    .enumerate()
                    .map(|(index, stage)| StageSnapshot {
                        id: stage.id.clone(),
                        progress: sequencer.progress(index).unwrap_or(0.0),
                        playback: sequencer.playback(index).unwrap_or_default(),
                        in_flight: sequencer.is_in_flight(index),
                    })
                    .collect()
            })
            .unwrap_or_default();

        EngineSnapshot {
            viewport: self.config.viewport,
            load_state: self.load_state.clone(),
            scroll_y: self.scroll_y(),
            phase: self.sequencer.as_ref().map(|sequencer| sequencer.phase()),
            stages,
            density_filter: self.filter.density_filter(),
            normal_overlay: self.filter.normal_overlay(),
            headline: self.aggregates().map(|aggregates| aggregates.headline),
        }
    }

    /// Serializes snapshot as pretty JSON for fixture-based regression checks.
    pub fn snapshot_json_pretty(&self) -> ScrollyResult<String> {
        serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| ScrollyError::InvalidData(format!("failed to serialize snapshot: {e}")))
    }
}
