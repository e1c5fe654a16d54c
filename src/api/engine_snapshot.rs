use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::core::aggregate::HeadlineCounts;
use crate::sequencer::{Playback, SequencePhase};

use super::{DensityFilter, LoadState};

/// Per-stage playback state at snapshot time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageSnapshot {
    pub id: String,
    pub progress: f64,
    pub playback: Playback,
    pub in_flight: bool,
}

/// Serializable deterministic state snapshot used by regression tests and
/// debugging tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub viewport: Viewport,
    pub load_state: LoadState,
    pub scroll_y: Option<f64>,
    pub phase: Option<SequencePhase>,
    pub stages: Vec<StageSnapshot>,
    pub density_filter: DensityFilter,
    pub normal_overlay: DensityFilter,
    pub headline: Option<HeadlineCounts>,
}
